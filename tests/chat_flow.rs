//! End-to-end tests against a broker bound to an ephemeral local port.
//!
//! Every wait is bounded so a missing frame fails the test instead of
//! hanging it.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use chat_broker::frame::DEFAULT_MAX_PAYLOAD;
use chat_broker::{
    connect, connect_with_max, ChatReceiver, ChatServer, ClientRegistry, ServerConfig,
    ServerEvent,
};

const WAIT: Duration = Duration::from_secs(5);

async fn start_server() -> (SocketAddr, Arc<ClientRegistry>) {
    start_server_with(ServerConfig::with_addr("127.0.0.1:0")).await
}

async fn start_server_with(config: ServerConfig) -> (SocketAddr, Arc<ClientRegistry>) {
    let server = ChatServer::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();
    tokio::spawn(server.run());
    (addr, registry)
}

async fn recv(receiver: &mut ChatReceiver) -> ServerEvent {
    timeout(WAIT, receiver.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection failed")
}

async fn recv_line(receiver: &mut ChatReceiver) -> String {
    match recv(receiver).await {
        ServerEvent::Line(line) => line,
        other => panic!("expected a chat line, got {other:?}"),
    }
}

async fn recv_roster(receiver: &mut ChatReceiver) -> HashSet<String> {
    match recv(receiver).await {
        ServerEvent::Roster(names) => names.into_iter().collect(),
        other => panic!("expected a roster, got {other:?}"),
    }
}

fn names(list: &[&str]) -> HashSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_join_chat_and_disconnect_scenario() {
    let (addr, registry) = start_server().await;

    let (mut alice_tx, mut alice_rx) = connect(addr, "alice").await.unwrap();
    assert_eq!(recv_roster(&mut alice_rx).await, names(&["alice"]));

    let (bob_tx, mut bob_rx) = connect(addr, "bob").await.unwrap();
    assert_eq!(
        recv_line(&mut alice_rx).await,
        "[Server] User bob joined the chat."
    );
    assert_eq!(recv_roster(&mut alice_rx).await, names(&["alice", "bob"]));
    assert_eq!(recv_roster(&mut bob_rx).await, names(&["alice", "bob"]));

    alice_tx.send_chat("hello").await.unwrap();
    assert_eq!(recv_line(&mut bob_rx).await, "[alice] hello");

    bob_tx.disconnect().await.unwrap();

    // Alice's next frames are the departure, not her own echo
    assert_eq!(
        recv_line(&mut alice_rx).await,
        "[Server] User bob left the chat."
    );
    assert_eq!(recv_roster(&mut alice_rx).await, names(&["alice"]));
    assert_eq!(registry.snapshot_names().await, vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_abrupt_close_is_cleaned_up() {
    let (addr, registry) = start_server().await;

    let (_carol_tx, mut carol_rx) = connect(addr, "carol").await.unwrap();
    recv_roster(&mut carol_rx).await;

    let (dave_tx, mut dave_rx) = connect(addr, "dave").await.unwrap();
    recv_line(&mut carol_rx).await;
    assert_eq!(recv_roster(&mut carol_rx).await, names(&["carol", "dave"]));
    recv_roster(&mut dave_rx).await;

    drop(dave_tx);
    drop(dave_rx);

    assert_eq!(
        recv_line(&mut carol_rx).await,
        "[Server] User dave left the chat."
    );
    assert_eq!(recv_roster(&mut carol_rx).await, names(&["carol"]));
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_chat_reaches_every_other_client() {
    let (addr, _registry) = start_server().await;

    let (mut a_tx, mut a_rx) = connect(addr, "a").await.unwrap();
    recv_roster(&mut a_rx).await;
    let (_b_tx, mut b_rx) = connect(addr, "b").await.unwrap();
    recv_line(&mut a_rx).await;
    recv_roster(&mut a_rx).await;
    recv_roster(&mut b_rx).await;
    let (_c_tx, mut c_rx) = connect(addr, "c").await.unwrap();
    recv_line(&mut a_rx).await;
    recv_roster(&mut a_rx).await;
    recv_line(&mut b_rx).await;
    recv_roster(&mut b_rx).await;
    assert_eq!(recv_roster(&mut c_rx).await, names(&["a", "b", "c"]));

    a_tx.send_chat("ünïcode ✓").await.unwrap();
    assert_eq!(recv_line(&mut b_rx).await, "[a] ünïcode ✓");
    assert_eq!(recv_line(&mut c_rx).await, "[a] ünïcode ✓");
}

#[tokio::test]
async fn test_malformed_peer_does_not_disturb_others() {
    let (addr, registry) = start_server().await;

    let (_erin_tx, mut erin_rx) = connect(addr, "erin").await.unwrap();
    recv_roster(&mut erin_rx).await;

    let mut rogue = TcpStream::connect(addr).await.unwrap();
    let mut header = b"garbage".to_vec();
    header.resize(chat_broker::HEADER_SIZE, b' ');
    rogue.write_all(&header).await.unwrap();

    // Server closes the rogue socket without registering it
    let mut buf = [0u8; 1];
    let read = timeout(WAIT, rogue.read(&mut buf)).await.unwrap();
    assert!(matches!(read, Ok(0) | Err(_)));
    assert_eq!(registry.snapshot_names().await, vec!["erin".to_string()]);

    let (_frank_tx, _frank_rx) = connect(addr, "frank").await.unwrap();
    assert_eq!(
        recv_line(&mut erin_rx).await,
        "[Server] User frank joined the chat."
    );
}

#[tokio::test]
async fn test_raw_wire_format() {
    let (addr, _registry) = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let payload = b"USERNAME:alice";
    let mut frame = payload.len().to_string().into_bytes();
    frame.resize(64, b' ');
    frame.extend_from_slice(payload);
    stream.write_all(&frame).await.unwrap();

    let mut header = [0u8; 64];
    timeout(WAIT, stream.read_exact(&mut header))
        .await
        .unwrap()
        .unwrap();
    let header = std::str::from_utf8(&header).unwrap();
    let length: usize = header.trim_end_matches(' ').parse().unwrap();

    let mut body = vec![0u8; length];
    stream.read_exact(&mut body).await.unwrap();
    assert_eq!(body, br#"!USERLIST:["alice"]"#);
}

#[tokio::test]
async fn test_chat_at_payload_limit_keeps_recipients_connected() {
    let (addr, _registry) = start_server().await;

    let (mut alice_tx, mut alice_rx) = connect(addr, "alice").await.unwrap();
    recv_roster(&mut alice_rx).await;
    let (_bob_tx, mut bob_rx) = connect(addr, "bob").await.unwrap();
    recv_roster(&mut bob_rx).await;

    // Fits inbound, but not once "[alice] " is prepended
    alice_tx
        .send_chat(&"x".repeat(DEFAULT_MAX_PAYLOAD))
        .await
        .unwrap();
    alice_tx.send_chat("after").await.unwrap();

    assert_eq!(recv_line(&mut bob_rx).await, "[alice] after");
}

#[tokio::test]
async fn test_chat_filling_payload_limit_is_relayed() {
    let config = ServerConfig {
        max_payload: 256,
        ..ServerConfig::with_addr("127.0.0.1:0")
    };
    let (addr, _registry) = start_server_with(config).await;

    let (mut alice_tx, mut alice_rx) = connect_with_max(addr, "alice", 256).await.unwrap();
    recv_roster(&mut alice_rx).await;
    let (_bob_tx, mut bob_rx) = connect_with_max(addr, "bob", 256).await.unwrap();
    recv_roster(&mut bob_rx).await;

    let exact = "y".repeat(256 - "[alice] ".len());
    alice_tx.send_chat(&exact).await.unwrap();
    alice_tx.send_chat(&format!("{exact}z")).await.unwrap();
    alice_tx.send_chat("done").await.unwrap();

    assert_eq!(recv_line(&mut bob_rx).await, format!("[alice] {exact}"));
    assert_eq!(recv_line(&mut bob_rx).await, "[alice] done");
}

#[tokio::test]
async fn test_silent_peer_does_not_block_joins() {
    let (addr, registry) = start_server().await;

    // Connects but never sends a username frame
    let _silent = TcpStream::connect(addr).await.unwrap();

    let (_gina_tx, mut gina_rx) = connect(addr, "gina").await.unwrap();
    assert_eq!(recv_roster(&mut gina_rx).await, names(&["gina"]));
    assert_eq!(registry.snapshot_names().await, vec!["gina".to_string()]);
}

#[tokio::test]
async fn test_zero_outbox_capacity_does_not_panic() {
    let config = ServerConfig {
        outbox_capacity: 0,
        ..ServerConfig::with_addr("127.0.0.1:0")
    };
    let (addr, _registry) = start_server_with(config).await;

    let (mut hana_tx, mut hana_rx) = connect(addr, "hana").await.unwrap();
    assert_eq!(recv_roster(&mut hana_rx).await, names(&["hana"]));
    let (_ivan_tx, mut ivan_rx) = connect(addr, "ivan").await.unwrap();
    recv_roster(&mut ivan_rx).await;

    hana_tx.send_chat("hi").await.unwrap();
    assert_eq!(recv_line(&mut ivan_rx).await, "[hana] hi");
}
