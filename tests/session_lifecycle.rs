//! Integration tests for the session lifecycle: login, displacement, teardown.

mod common;

use common::client::{Received, TestClient};
use common::TestServer;
use std::time::Duration;

#[tokio::test]
async fn bad_credentials_get_policy_close() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    server.create_user("alice", "secret").await.unwrap();

    let mut client = server.connect("alice", "wrong").await.unwrap();
    assert_eq!(
        client.recv().await.unwrap(),
        Received::Close {
            code: 1008,
            reason: "Invalid username or password".into()
        }
    );

    let mut ghost = server.connect("ghost", "secret").await.unwrap();
    assert_eq!(
        ghost.recv().await.unwrap(),
        Received::Close {
            code: 1008,
            reason: "Invalid username or password".into()
        }
    );
    assert!(server.hub().registry.is_empty());
}

#[tokio::test]
async fn missing_credentials_are_refused() {
    let server = TestServer::spawn().await.unwrap();
    let mut client = TestClient::connect(&server.ws_url("/ws", "")).await.unwrap();
    assert!(matches!(client.recv().await.unwrap(), Received::Close { code: 1008, .. }));
}

#[tokio::test]
async fn unknown_path_is_rejected_at_handshake() {
    let server = TestServer::spawn().await.unwrap();
    let result = TestClient::connect(&server.ws_url("/elsewhere", "username=a&password=b")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn disconnect_removes_session() {
    let server = TestServer::spawn().await.unwrap();
    server.create_user("alice", "pw").await.unwrap();

    let mut alice = server.login("alice", "pw").await.unwrap();
    assert_eq!(server.hub().registry.len(), 1);

    alice.close().await.unwrap();
    server.wait_offline("alice").await.unwrap();
    assert!(server.hub().registry.is_empty());
}

#[tokio::test]
async fn second_login_force_closes_first() {
    let server = TestServer::spawn().await.unwrap();
    server.create_user("alice", "pw").await.unwrap();
    server.create_user("bob", "pw").await.unwrap();

    let mut first = server.login("alice", "pw").await.unwrap();
    let first_id = server.hub().registry.lookup("alice").unwrap().id();

    let mut second = server.connect("alice", "pw").await.unwrap();

    assert_eq!(
        first.recv().await.unwrap(),
        Received::Close {
            code: 1008,
            reason: "Logged in from another location".into()
        }
    );

    // Exactly one session remains and it is the newer one.
    let current = server.hub().registry.lookup("alice").unwrap();
    assert_ne!(current.id(), first_id);
    assert_eq!(server.hub().registry.len(), 1);

    // Traffic now goes to the second connection.
    let mut bob = server.login("bob", "pw").await.unwrap();
    bob.message("alice", "which one?").await.unwrap();
    assert!(second.recv_text().await.unwrap().contains("which one?"));
    second.expect_silence(Duration::from_millis(50)).await.unwrap();
}

#[tokio::test]
async fn relogin_after_disconnect_works() {
    let server = TestServer::spawn().await.unwrap();
    server.create_user("alice", "pw").await.unwrap();
    server.create_user("bob", "pw").await.unwrap();

    let mut alice = server.login("alice", "pw").await.unwrap();
    alice.close().await.unwrap();
    server.wait_offline("alice").await.unwrap();

    let mut alice = server.login("alice", "pw").await.unwrap();
    let mut bob = server.login("bob", "pw").await.unwrap();
    bob.message("alice", "welcome back").await.unwrap();
    assert!(alice.recv_text().await.unwrap().contains("welcome back"));
}
