// Request body module
// Turns a JSON request body into the field mapping stored on a record

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{HeaderMap, Request};
use serde_json::Value;
use thiserror::Error;

use crate::store::Fields;

/// Why a request body could not be turned into fields
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {0} bytes")]
    TooLarge(u64),
    #[error("failed to read request body: {0}")]
    Read(String),
    #[error("invalid JSON: {0}")]
    Invalid(String),
    #[error("JSON body must be an object or an array")]
    NotAnObject,
}

/// Read the body of a JSON request as record fields
///
/// Non-JSON content types and empty bodies yield no fields. Arrays are
/// spread by index, so `["a","b"]` becomes `{"0":"a","1":"b"}`.
pub async fn read_fields<B>(req: Request<B>, max_body_size: u64) -> Result<Fields, BodyError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    check_content_length(req.headers(), max_body_size)?;

    if !is_json(req.headers()) {
        return Ok(Fields::new());
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(BodyError::TooLarge(max_body_size));
        }
        Err(e) => return Err(BodyError::Read(e.to_string())),
    };

    parse_fields(&bytes)
}

/// Parse raw JSON bytes into fields
pub fn parse_fields(bytes: &[u8]) -> Result<Fields, BodyError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }

    match serde_json::from_slice::<Value>(bytes).map_err(|e| BodyError::Invalid(e.to_string()))? {
        Value::Object(map) => Ok(map),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect()),
        _ => Err(BodyError::NotAnObject),
    }
}

/// Reject early when the declared length is already over the limit
fn check_content_length(headers: &HeaderMap, max_body_size: u64) -> Result<(), BodyError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());

    match declared {
        Some(size) if size > max_body_size => Err(BodyError::TooLarge(max_body_size)),
        _ => Ok(()),
    }
}

/// `application/json` only, parameters ignored
fn is_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
}
