//! HTTP protocol layer module
//!
//! Response builders shared by the student API and the documentation pages.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_400_response, build_404_response, build_413_response, build_empty_response,
    build_html_response, build_no_route_response, build_options_response, build_text_response,
};
