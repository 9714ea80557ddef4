// API documentation module
// Swagger UI page plus the OpenAPI document it renders

pub mod openapi;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::api::json_response;
use crate::http;

/// Mount point of the documentation UI
pub const DOCS_PATH: &str = "/api-docs";

/// Where the UI fetches the OpenAPI document from
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Serve the Swagger UI HTML page
pub fn serve_docs_page() -> Response<Full<Bytes>> {
    http::build_html_response(include_str!("swagger.html"))
}

/// Serve the OpenAPI document as JSON
pub fn serve_openapi() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &openapi::build_document())
}
