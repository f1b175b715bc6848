use std::{convert::Infallible, sync::Arc};

use tokio::sync::broadcast;
use warp::{reply::Reply, Filter, Rejection};

pub mod api;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod room;

use catalog::Catalog;
use config::Config;
use room::Registry;

const MAX_SUBMISSION_BYTES: usize = 256 * 1024;

#[derive(Clone)]
pub struct GlobalState {
    pub registry: Arc<Registry>,
    pub catalog: Arc<Catalog>,
    pub shutdown: broadcast::Sender<()>,
}

impl GlobalState {
    pub fn new() -> Self {
        Self {
            registry: Default::default(),
            catalog: Default::default(),
            shutdown: broadcast::channel(1).0,
        }
    }
}

impl Default for GlobalState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn routes(
    state: GlobalState,
    config: &Config,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let ws = warp::path!("ws" / String)
        .and(warp::ws())
        .and(with_state.clone())
        .and_then(handler::socket_handler);

    let problems = warp::path!("problems")
        .and(warp::get())
        .and(with_state.clone())
        .map(api::list_problems);

    let problem = warp::path!("problems" / String)
        .and(warp::get())
        .and(with_state.clone())
        .and_then(api::get_problem);

    let submit = warp::path!("submit")
        .and(warp::post())
        .and(warp::body::stream())
        .and_then(|body| api::read_submission(body, MAX_SUBMISSION_BYTES))
        .and_then(api::submit);

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state)
        .map(api::health);

    let assets = warp::get().and(warp::fs::dir(config.static_dir.clone()));

    let cors = warp::cors()
        .allow_origin(config.cors_origin.as_str())
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"])
        .allow_credentials(true);

    let api = problems
        .or(problem)
        .or(submit)
        .or(health)
        .recover(error::recover_api);

    // Same-origin callers (the bundled frontend) skip the CORS check; the
    // websocket and static routes never go through it.
    let api = same_origin(true)
        .and(api.clone())
        .or(same_origin(false).and(api.with(cors)));

    ws.or(api).or(assets).recover(error::handle_rejection)
}

/// Passes only if "`Origin` names this server's own `Host`" is `expected`;
/// rejects as not found otherwise.
fn same_origin(expected: bool) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("origin")
        .and(warp::header::optional::<String>("host"))
        .and_then(move |origin: Option<String>, host: Option<String>| async move {
            let same = match (origin, host) {
                (Some(origin), Some(host)) => origin
                    .split_once("://")
                    .is_some_and(|(_, authority)| authority == host),
                _ => false,
            };
            if same == expected {
                Ok(())
            } else {
                Err(warp::reject::not_found())
            }
        })
        .untuple_one()
}
