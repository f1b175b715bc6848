use std::convert::Infallible;

use log::debug;
use serde::Serialize;
use thiserror::Error;
use warp::{http::StatusCode, reject::Reject, Rejection, Reply};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Problem not found")]
    ProblemNotFound,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),
}

impl Reject for ApiError {}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::ProblemNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

fn error_reply(rejection: &Rejection) -> impl Reply {
    let (status, detail) = if let Some(e) = rejection.find::<ApiError>() {
        (e.status(), e.to_string())
    } else if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = rejection.find::<warp::filters::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, e.to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else {
        debug!("unhandled rejection: {rejection:?}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
    };

    let body = warp::reply::json(&ErrorBody { detail });
    warp::reply::with_status(body, status)
}

/// Answers errors raised by the JSON API so they pass back through its CORS
/// layer. Plain misses are handed on to the routes after it.
pub async fn recover_api(rejection: Rejection) -> Result<impl Reply, Rejection> {
    if rejection.is_not_found() {
        return Err(rejection);
    }
    Ok(error_reply(&rejection))
}

/// Turns whatever is left into `{"detail": ...}` JSON responses.
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    Ok(error_reply(&rejection))
}
