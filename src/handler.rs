use std::convert::Infallible;

use log::debug;
use warp::{filters::ws::Ws, reply::Reply};

use crate::{connection::Connection, GlobalState};

pub async fn socket_handler(
    room_id: String,
    ws: Ws,
    state: GlobalState,
) -> Result<impl Reply, Infallible> {
    debug!("upgrade requested for room {room_id}");

    let shutdown = state.shutdown.subscribe();
    Ok(ws.on_upgrade(move |socket| async move {
        let connection = Connection::join(state.registry.clone(), room_id);
        connection.run(socket, shutdown).await
    }))
}
