// Student endpoint handlers module
// Each handler translates one HTTP call into one store operation

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};

use super::body::{read_fields, BodyError};
use super::response::json_response;
use crate::config::AppState;
use crate::http;
use crate::logger;
use crate::store::{parse_id, StoreError};

pub const WELCOME_MESSAGE: &str =
    "Welcome to the Student CRUD API! Visit /api-docs for Swagger documentation.";

/// GET /
pub fn welcome() -> Response<Full<Bytes>> {
    http::build_text_response(StatusCode::OK, WELCOME_MESSAGE)
}

/// POST /students
pub async fn create_student<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let fields = match read_fields(req, state.config.http.max_body_size).await {
        Ok(f) => f,
        Err(e) => return body_error_response(&e),
    };

    let student = state.store.create(fields).await;
    logger::log_debug(&format!("Created student {}", student.id));
    json_response(StatusCode::CREATED, &student)
}

/// GET /students
pub async fn list_students(state: &AppState) -> Response<Full<Bytes>> {
    let students = state.store.list_all().await;
    json_response(StatusCode::OK, &students)
}

/// GET /students/{id}
pub async fn get_student(state: &AppState, id_segment: &str) -> Response<Full<Bytes>> {
    let Some(id) = parse_id(id_segment) else {
        return http::build_404_response();
    };

    match state.store.get_by_id(id).await {
        Ok(student) => json_response(StatusCode::OK, &student),
        Err(e) => store_error_response(&e),
    }
}

/// PUT /students/{id}
pub async fn update_student<B>(
    req: Request<B>,
    state: &AppState,
    id_segment: &str,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let fields = match read_fields(req, state.config.http.max_body_size).await {
        Ok(f) => f,
        Err(e) => return body_error_response(&e),
    };

    let Some(id) = parse_id(id_segment) else {
        return http::build_404_response();
    };

    match state.store.update_by_id(id, fields).await {
        Ok(student) => {
            logger::log_debug(&format!("Replaced student {id}"));
            json_response(StatusCode::OK, &student)
        }
        Err(e) => store_error_response(&e),
    }
}

/// DELETE /students/{id}
///
/// Always 204, whether or not anything was removed.
pub async fn delete_student(state: &AppState, id_segment: &str) -> Response<Full<Bytes>> {
    if let Some(id) = parse_id(id_segment) {
        let removed = state.store.delete_by_id(id).await;
        let remaining = state.store.count().await;
        logger::log_debug(&format!(
            "Deleted student {id} ({removed} removed, {remaining} remaining)"
        ));
    }
    http::build_empty_response(StatusCode::NO_CONTENT)
}

fn store_error_response(error: &StoreError) -> Response<Full<Bytes>> {
    match error {
        StoreError::NotFound(_) => http::build_404_response(),
    }
}

fn body_error_response(error: &BodyError) -> Response<Full<Bytes>> {
    logger::log_warning(&format!("Rejected request body: {error}"));
    match error {
        BodyError::TooLarge(_) => http::build_413_response(),
        BodyError::Read(_) | BodyError::Invalid(_) | BodyError::NotAnObject => {
            http::build_400_response()
        }
    }
}
