//! HTTP protocol layer module
//!
//! Protocol helpers shared by the static asset and SPA fallback handlers.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use response::{
    apply_common_headers, build_304_response, build_400_response, build_404_response,
    build_405_response, build_413_response, build_416_response, build_api_not_found_response,
    build_file_response, build_health_response, build_json_response, build_options_response,
    FileBody, HttpResponse,
};
