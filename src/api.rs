use std::convert::Infallible;

use futures::{Stream, TryStreamExt};
use log::{debug, info};
use warp::{http::StatusCode, reject, Buf, Rejection, Reply};

use crate::{
    catalog::{CodeSubmission, ExecutionResult},
    error::ApiError,
    GlobalState,
};

pub fn list_problems(state: GlobalState) -> impl Reply {
    warp::reply::json(&state.catalog.all())
}

pub async fn get_problem(id: String, state: GlobalState) -> Result<impl Reply, Rejection> {
    match state.catalog.get(&id) {
        Some(problem) => Ok(warp::reply::json(problem)),
        None => Err(reject::custom(ApiError::ProblemNotFound)),
    }
}

/// Collects a JSON submission body of at most `limit` bytes. Works for
/// chunked bodies as well as ones with a `content-length`.
pub async fn read_submission<S, B>(body: S, limit: usize) -> Result<CodeSubmission, Rejection>
where
    S: Stream<Item = Result<B, warp::Error>>,
    B: Buf,
{
    let mut body = Box::pin(body);
    let mut bytes = Vec::new();
    while let Some(mut chunk) = body
        .try_next()
        .await
        .map_err(|e| reject::custom(ApiError::InvalidBody(e.to_string())))?
    {
        if bytes.len() + chunk.remaining() > limit {
            return Err(reject::custom(ApiError::BodyTooLarge(limit)));
        }
        while chunk.has_remaining() {
            let part = chunk.chunk();
            let len = part.len();
            bytes.extend_from_slice(part);
            chunk.advance(len);
        }
    }
    serde_json::from_slice(&bytes).map_err(|e| reject::custom(ApiError::InvalidBody(e.to_string())))
}

pub async fn submit(submission: CodeSubmission) -> Result<impl Reply, Infallible> {
    info!(
        "received {} submission ({} bytes)",
        submission.language,
        submission.code.len()
    );
    Ok(warp::reply::json(&ExecutionResult::acknowledged()))
}

pub fn health(state: GlobalState) -> impl Reply {
    debug!("{} live rooms", state.registry.room_count());
    warp::reply::with_status("OK", StatusCode::OK)
}
