use anyhow::Result;
use clap::Parser;
use log::info;

use pair_relay::{config::Config, routes, GlobalState};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    config.validate()?;
    let addr = config.addr()?;

    let state = GlobalState::new();
    let shutdown = state.shutdown.clone();

    let (bound, server) = warp::serve(routes(state, &config)).try_bind_with_graceful_shutdown(
        addr,
        async move {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown requested");
            shutdown.send(()).ok();
        },
    )?;
    info!("relay listening on {bound}");

    server.await;
    info!("relay stopped");
    Ok(())
}
