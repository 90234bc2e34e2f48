use std::sync::Arc;

use clap::Parser;

use spa_webserver::config::{AppState, Config};
use spa_webserver::handler::static_files;
use spa_webserver::logger;
use spa_webserver::server::{self, SignalHandler};

/// Serve a single-page application with client-side routing fallback
#[derive(Debug, Parser)]
#[command(name = "spa-server", version, about)]
struct Cli {
    /// Configuration file (extension optional; missing file means defaults)
    #[arg(short, long, default_value = "config")]
    config: String,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(short, long)]
    port: Option<u16>,

    /// Override `spa.static_dir`
    #[arg(long)]
    static_dir: Option<String>,
}

impl Cli {
    fn load_config(&self) -> spa_webserver::Result<Config> {
        let mut cfg = Config::load_from(&self.config)?;
        if let Some(host) = &self.host {
            cfg.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(dir) = &self.static_dir {
            cfg.spa.static_dir.clone_from(dir);
        }
        Ok(cfg)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = cli.load_config()?;
    let _log_guard = logger::init(&cfg.logging)?;

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    // One-shot SPA fallback registration happens here
    let state = Arc::new(AppState::new(cfg)?);
    let listener = server::create_reusable_listener(addr)?;

    let spa = &state.config.spa;
    if !static_files::index_available(&spa.static_dir, &spa.index_file).await {
        tracing::warn!(
            "{}/{} not found; client routes will return 404 until it exists",
            spa.static_dir,
            spa.index_file
        );
    }
    logger::log_server_start(&addr, &state.config);

    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));
    server::start_server_loop(listener, state, signals).await?;

    tracing::info!("Server stopped");
    Ok(())
}
