// API module entry
// Routes student CRUD requests and the documentation pages

mod body;
mod handlers;
mod response;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppState, HttpConfig};
use crate::docs::{self, DOCS_PATH, OPENAPI_PATH};
use crate::http;
use crate::logger::{self, AccessLogEntry};

// Re-export public types
pub use response::json_response;

/// Resolved request target
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Root,
    Docs,
    OpenApi,
    Students,
    Student(&'a str),
    Unknown,
}

const STUDENTS_PREFIX: &str = "/students/";

/// Map a request path to a route
///
/// Matching ignores ASCII case and tolerates one trailing slash. The id
/// segment is handed on raw, still percent-encoded.
fn resolve_route(path: &str) -> Route<'_> {
    let trimmed = if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    };
    let lower = trimmed.to_ascii_lowercase();

    match lower.as_str() {
        "/" => Route::Root,
        DOCS_PATH => Route::Docs,
        OPENAPI_PATH => Route::OpenApi,
        "/students" => Route::Students,
        _ if lower.starts_with(STUDENTS_PREFIX) => {
            let id = &trimmed[STUDENTS_PREFIX.len()..];
            if id.is_empty() || id.contains('/') {
                Route::Unknown
            } else {
                Route::Student(id)
            }
        }
        _ => Route::Unknown,
    }
}

/// Main entry point for HTTP request handling
///
/// Dispatches by method and path, decorates the response with the
/// configured headers, and writes an access log line when enabled.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let entry = state.config.logging.access_log.then(|| access_log_entry(&req, peer_addr));

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = dispatch(req, &state, &method, &path).await;
    decorate_response(&mut response, &state.config.http);

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(
    req: Request<B>,
    state: &AppState,
    method: &Method,
    path: &str,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let is_read = *method == Method::GET || *method == Method::HEAD;

    match (resolve_route(path), method) {
        (_, &Method::OPTIONS) => http::build_options_response(state.config.http.enable_cors),
        (Route::Root, _) if is_read => handlers::welcome(),
        (Route::Docs, _) if is_read => docs::serve_docs_page(),
        (Route::OpenApi, _) if is_read => docs::serve_openapi(),
        (Route::Students, &Method::POST) => handlers::create_student(req, state).await,
        (Route::Students, _) if is_read => handlers::list_students(state).await,
        (Route::Student(id), _) if is_read => handlers::get_student(state, id).await,
        (Route::Student(id), &Method::PUT) => handlers::update_student(req, state, id).await,
        (Route::Student(id), &Method::DELETE) => handlers::delete_student(state, id).await,
        _ => {
            logger::log_debug(&format!("No route for {method} {path}"));
            http::build_no_route_response(method.as_str(), path)
        }
    }
}

/// Add the `Server` header and, when enabled, the CORS origin header
fn decorate_response(response: &mut Response<Full<Bytes>>, http_config: &HttpConfig) {
    let headers = response.headers_mut();
    match HeaderValue::from_str(&http_config.server_name) {
        Ok(value) => {
            headers.insert(SERVER, value);
        }
        Err(_) => logger::log_warning(&format!(
            "Invalid server_name '{}', Server header omitted",
            http_config.server_name
        )),
    }
    if http_config.enable_cors {
        headers.insert(
            "Access-Control-Allow-Origin",
            HeaderValue::from_static("*"),
        );
    }
}

fn access_log_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use serde_json::{json, Value};

    fn test_state() -> Arc<AppState> {
        let mut cfg = Config::defaults().unwrap();
        cfg.logging.access_log = false;
        Arc::new(AppState::new(&cfg))
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Response<Full<Bytes>>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let bytes = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Bytes::from(v.to_string())
            }
            None => Bytes::new(),
        };
        let req = builder.body(Full::new(bytes)).unwrap();
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let resp = handle_request(req, Arc::clone(state), peer).await.unwrap();
        (resp.status(), resp)
    }

    async fn body_text(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(resp: Response<Full<Bytes>>) -> Value {
        serde_json::from_str(&body_text(resp).await).unwrap()
    }

    #[test]
    fn test_resolve_route() {
        assert_eq!(resolve_route("/"), Route::Root);
        assert_eq!(resolve_route("/api-docs"), Route::Docs);
        assert_eq!(resolve_route("/api-docs/"), Route::Docs);
        assert_eq!(resolve_route("/api-docs/openapi.json"), Route::OpenApi);
        assert_eq!(resolve_route("/students"), Route::Students);
        assert_eq!(resolve_route("/students/"), Route::Students);
        assert_eq!(resolve_route("/students/7"), Route::Student("7"));
        assert_eq!(resolve_route("/students/7/"), Route::Student("7"));
        assert_eq!(resolve_route("/students/7/grades"), Route::Unknown);
        assert_eq!(resolve_route("/courses"), Route::Unknown);
        assert_eq!(resolve_route("/Students"), Route::Students);
        assert_eq!(resolve_route("/STUDENTS/%31"), Route::Student("%31"));
        assert_eq!(resolve_route("/API-Docs"), Route::Docs);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let state = test_state();

        let (status, resp) = send(
            &state,
            Method::POST,
            "/students",
            Some(json!({"name": "Alice", "age": 20})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body_text(resp).await, r#"{"id":1,"name":"Alice","age":20}"#);

        let (status, resp) = send(
            &state,
            Method::POST,
            "/students",
            Some(json!({"name": "Bob", "age": 22})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body_json(resp).await, json!({"id": 2, "name": "Bob", "age": 22}));

        let (status, resp) = send(&state, Method::GET, "/students", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!([
                {"id": 1, "name": "Alice", "age": 20},
                {"id": 2, "name": "Bob", "age": 22}
            ])
        );

        let (status, resp) = send(
            &state,
            Method::PUT,
            "/students/1",
            Some(json!({"name": "Alicia"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"id": 1, "name": "Alicia"}));

        let (status, resp) = send(&state, Method::DELETE, "/students/2", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body_text(resp).await.is_empty());

        let (status, resp) = send(&state, Method::GET, "/students/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body_text(resp).await, "Not Found");
    }

    #[tokio::test]
    async fn test_list_empty_is_array() {
        let state = test_state();
        let (status, resp) = send(&state, Method::GET, "/students", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_text(resp).await, "[]");
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let state = test_state();
        send(&state, Method::POST, "/students", Some(json!({"name": "Alice"}))).await;

        let (status, resp) = send(&state, Method::GET, "/students/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"id": 1, "name": "Alice"}));
    }

    #[tokio::test]
    async fn test_invalid_id_is_not_found() {
        let state = test_state();
        send(&state, Method::POST, "/students", Some(json!({"name": "Alice"}))).await;

        let (status, resp) = send(&state, Method::GET, "/students/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body_text(resp).await, "Not Found");

        let (status, _) = send(
            &state,
            Method::PUT,
            "/students/abc",
            Some(json!({"name": "X"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, Method::DELETE, "/students/abc", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.store.count().await, 1);
    }

    #[tokio::test]
    async fn test_encoded_id_and_mixed_case_path() {
        let state = test_state();
        send(&state, Method::POST, "/Students", Some(json!({"name": "Alice"}))).await;

        let (status, resp) = send(&state, Method::GET, "/students/%31", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"id": 1, "name": "Alice"}));

        let (status, resp) = send(&state, Method::GET, "/STUDENTS", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(resp).await, json!([{"id": 1, "name": "Alice"}]));

        let (status, _) = send(&state, Method::DELETE, "/Students/%31", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.store.count().await, 0);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let state = test_state();
        let (status, resp) = send(
            &state,
            Method::PUT,
            "/students/999",
            Some(json!({"name": "Ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body_text(resp).await, "Not Found");
        assert_eq!(state.store.count().await, 0);
    }

    #[tokio::test]
    async fn test_update_ignores_body_id() {
        let state = test_state();
        send(&state, Method::POST, "/students", Some(json!({"name": "Bob"}))).await;

        let (_, resp) = send(
            &state,
            Method::PUT,
            "/students/1",
            Some(json!({"id": 77, "name": "Bobby"})),
        )
        .await;
        assert_eq!(body_json(resp).await, json!({"id": 1, "name": "Bobby"}));
    }

    #[tokio::test]
    async fn test_delete_twice_is_idempotent() {
        let state = test_state();
        send(&state, Method::POST, "/students", Some(json!({"name": "A"}))).await;

        let (first, _) = send(&state, Method::DELETE, "/students/1", None).await;
        let (second, _) = send(&state, Method::DELETE, "/students/1", None).await;
        assert_eq!(first, StatusCode::NO_CONTENT);
        assert_eq!(second, StatusCode::NO_CONTENT);
        assert_eq!(state.store.count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/students")
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from_static(b"{not json")))
            .unwrap();
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let resp = handle_request(req, Arc::clone(&state), peer).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.store.count().await, 0);
    }

    #[tokio::test]
    async fn test_create_without_json_body_stores_id_only() {
        let state = test_state();
        let (status, resp) = send(&state, Method::POST, "/students", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body_json(resp).await, json!({"id": 1}));
    }

    #[tokio::test]
    async fn test_welcome_and_docs() {
        let state = test_state();

        let (status, resp) = send(&state, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body_text(resp).await.contains("/api-docs"));

        let (status, resp) = send(&state, Method::GET, "/api-docs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body_text(resp).await.contains("swagger-ui"));

        let (status, resp) = send(&state, Method::GET, "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        let doc = body_json(resp).await;
        assert_eq!(doc["info"]["title"], "Student CRUD API");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let state = test_state();
        let (status, resp) = send(&state, Method::PATCH, "/students/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body_text(resp).await, "Cannot PATCH /students/1");
    }

    #[tokio::test]
    async fn test_server_and_cors_headers() {
        let mut cfg = Config::defaults().unwrap();
        cfg.logging.access_log = false;
        cfg.http.enable_cors = true;
        let state = Arc::new(AppState::new(&cfg));

        let (_, resp) = send(&state, Method::GET, "/students", None).await;
        assert_eq!(resp.headers()["Server"], "student-crud-api");
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");

        let (status, resp) = send(&state, Method::OPTIONS, "/students", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(resp.headers().contains_key("Access-Control-Allow-Methods"));
    }
}
