use std::time::Duration;

use clap::Parser;
use pair_relay::{config::Config, routes, GlobalState};
use tokio::time::{sleep, timeout};
use warp::{test::WsClient, ws::Message};

fn config() -> Config {
    Config::parse_from(["pair-relay"])
}

async fn connect(state: &GlobalState, room: &str) -> WsClient {
    warp::test::ws()
        .path(&format!("/ws/{room}"))
        .handshake(routes(state.clone(), &config()))
        .await
        .expect("handshake")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

async fn recv_text(client: &mut WsClient) -> String {
    let message = timeout(Duration::from_secs(1), client.recv())
        .await
        .expect("message in time")
        .expect("message");
    message.to_str().expect("text frame").to_string()
}

async fn assert_silent(client: &mut WsClient) {
    assert!(
        timeout(Duration::from_millis(100), client.recv()).await.is_err(),
        "unexpected delivery"
    );
}

#[tokio::test]
async fn ping_reaches_sibling_and_room_is_removed_when_empty() {
    let state = GlobalState::new();
    let registry = state.registry.clone();

    let mut x = connect(&state, "7").await;
    wait_until(|| registry.member_count("7") == 1).await;
    let mut y = connect(&state, "7").await;
    wait_until(|| registry.member_count("7") == 2).await;

    x.send_text("ping").await;
    assert_eq!(recv_text(&mut y).await, "ping");
    assert_silent(&mut x).await;

    drop(y);
    wait_until(|| registry.member_count("7") == 1).await;

    x.send_text("ping2").await;
    assert_silent(&mut x).await;

    drop(x);
    wait_until(|| !registry.contains_room("7")).await;
    assert_eq!(registry.room_count(), 0);
}

#[tokio::test]
async fn broadcast_stays_inside_its_room() {
    let state = GlobalState::new();
    let registry = state.registry.clone();

    let (mut a1, mut a2, mut b) = tokio::join!(
        connect(&state, "alpha"),
        connect(&state, "alpha"),
        connect(&state, "beta"),
    );
    wait_until(|| registry.member_count("alpha") == 2 && registry.member_count("beta") == 1).await;

    a1.send_text("alpha only").await;
    assert_eq!(recv_text(&mut a2).await, "alpha only");
    assert_silent(&mut b).await;
    assert_silent(&mut a1).await;
}

#[tokio::test]
async fn messages_from_one_sender_arrive_in_order() {
    let state = GlobalState::new();
    let registry = state.registry.clone();

    let mut sender = connect(&state, "order").await;
    let mut receiver = connect(&state, "order").await;
    wait_until(|| registry.member_count("order") == 2).await;

    for n in 0..50 {
        sender.send_text(format!("edit {n}")).await;
    }
    for n in 0..50 {
        assert_eq!(recv_text(&mut receiver).await, format!("edit {n}"));
    }
}

#[tokio::test]
async fn payload_is_relayed_verbatim() {
    let state = GlobalState::new();
    let registry = state.registry.clone();

    let mut a = connect(&state, "1").await;
    let mut b = connect(&state, "1").await;
    wait_until(|| registry.member_count("1") == 2).await;

    let editor_state = "{\"code\":\"def two_sum(nums, target):\\n    pass\",\"cursor\":[1, 4]}";
    a.send_text(editor_state).await;
    assert_eq!(recv_text(&mut b).await, editor_state);
}

#[tokio::test]
async fn any_room_id_is_accepted() {
    let state = GlobalState::new();
    let registry = state.registry.clone();

    let _client = connect(&state, "not-a-problem").await;
    wait_until(|| registry.contains_room("not-a-problem")).await;
}

#[tokio::test]
async fn shutdown_closes_connections_and_clears_rooms() {
    let state = GlobalState::new();
    let registry = state.registry.clone();
    let shutdown = state.shutdown.clone();

    let _a = connect(&state, "alpha").await;
    let _b = connect(&state, "beta").await;
    wait_until(|| registry.room_count() == 2).await;

    shutdown.send(()).unwrap();
    wait_until(|| registry.room_count() == 0).await;
}

#[tokio::test]
async fn any_origin_can_join_a_room() {
    let state = GlobalState::new();
    let registry = state.registry.clone();

    let mut own_frontend = warp::test::ws()
        .path("/ws/7")
        .header("origin", "http://localhost:8000")
        .handshake(routes(state.clone(), &config()))
        .await
        .expect("handshake from the bundled frontend");
    let mut elsewhere = warp::test::ws()
        .path("/ws/7")
        .header("origin", "http://elsewhere.test")
        .handshake(routes(state.clone(), &config()))
        .await
        .expect("handshake from a foreign origin");
    wait_until(|| registry.member_count("7") == 2).await;

    elsewhere.send_text("hello").await;
    assert_eq!(recv_text(&mut own_frontend).await, "hello");
}

#[tokio::test]
async fn close_frame_leaves_the_room() {
    let state = GlobalState::new();
    let registry = state.registry.clone();

    let mut client = connect(&state, "closing").await;
    wait_until(|| registry.member_count("closing") == 1).await;

    client.send(Message::close()).await;
    wait_until(|| registry.member_count("closing") == 0).await;
    assert!(!registry.contains_room("closing"));
}

#[tokio::test]
async fn abrupt_disconnect_does_not_disturb_siblings() {
    let state = GlobalState::new();
    let registry = state.registry.clone();

    let mut sender = connect(&state, "r").await;
    let gone = connect(&state, "r").await;
    let mut stays = connect(&state, "r").await;
    wait_until(|| registry.member_count("r") == 3).await;

    sender.send_text("before").await;
    assert_eq!(recv_text(&mut stays).await, "before");

    drop(gone);
    sender.send_text("during").await;
    assert_eq!(recv_text(&mut stays).await, "during");

    wait_until(|| registry.member_count("r") == 2).await;
    sender.send_text("after").await;
    assert_eq!(recv_text(&mut stays).await, "after");
}
