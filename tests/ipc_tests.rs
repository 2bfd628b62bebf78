//! Registration endpoint over the Unix socket transport
#![cfg(unix)]

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use nodes_observer::ipc::protocol::{decode, encode, IpcMessage, RequestMessage, UNKNOWN_CORRELATION_ID};
use nodes_observer::ipc::{PingClient, PingServer};
use nodes_observer::RegistrationEndpoint;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::net::UnixStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

mod common;
use common::*;

struct ServerFixture {
    _dir: TempDir,
    socket_path: PathBuf,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), nodes_observer::ObserverError>>,
}

fn start_server(obs: &TestObserver) -> ServerFixture {
    let dir = TempDir::new().unwrap();
    let socket_path = dir.path().join("sockets").join("ping.sock");

    let server = PingServer::new(&socket_path, RegistrationEndpoint::new(obs.tracker.clone()));
    let listener = server.bind().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(server.serve(listener, shutdown_rx));

    ServerFixture {
        _dir: dir,
        socket_path,
        shutdown_tx,
        handle,
    }
}

#[tokio::test]
async fn test_ping_over_socket() {
    let obs = TestObserver::new(&["A"], &[], &["A", "/client"]);
    let server = start_server(&obs);

    let mut client = PingClient::connect(&server.socket_path).await.unwrap();
    client.ping("/client", true).await.unwrap();

    assert!(obs.tracker.has_active_clients().await);
    assert_eq!(obs.notifier.count(), 1);

    let status = client.status().await.unwrap();
    assert!(status.has_active_clients);
    assert_eq!(status.active_clients, names(&["/client"]));

    client.ping("/client", false).await.unwrap();
    assert!(!obs.tracker.has_active_clients().await);
    assert_eq!(obs.notifier.count(), 2);
}

#[tokio::test]
async fn test_filtered_ping_is_acknowledged() {
    let obs = TestObserver::new(&[], &[], &[]);
    let server = start_server(&obs);

    let mut client = PingClient::connect(&server.socket_path).await.unwrap();
    client.ping("", true).await.unwrap();

    assert!(!obs.tracker.has_active_clients().await);
    assert_eq!(obs.notifier.count(), 0);
}

#[tokio::test]
async fn test_several_clients_share_the_endpoint() {
    let obs = TestObserver::new(&[], &[], &[]);
    let server = start_server(&obs);

    let mut first = PingClient::connect(&server.socket_path).await.unwrap();
    let mut second = PingClient::connect(&server.socket_path).await.unwrap();
    first.ping("/first", true).await.unwrap();
    second.ping("/second", true).await.unwrap();

    assert_eq!(
        obs.tracker.active_clients().await,
        names(&["/first", "/second"])
    );
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let obs = TestObserver::new(&[], &[], &[]);
    let server = start_server(&obs);

    let stream = UnixStream::connect(&server.socket_path).await.unwrap();
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

    framed
        .send(Bytes::from_static(&[0xff, 0xff, 0xff, 0xff, 0x01]))
        .await
        .unwrap();
    let reply = framed.next().await.unwrap().unwrap();
    match decode(&reply).unwrap() {
        IpcMessage::Response(response) => {
            assert!(!response.success);
            assert_eq!(response.correlation_id, UNKNOWN_CORRELATION_ID);
            assert!(response.error.is_some());
        }
        other => panic!("unexpected message {:?}", other),
    }

    let ping = encode(&IpcMessage::Request(RequestMessage::ping(9, "/late", true))).unwrap();
    framed.send(ping).await.unwrap();
    let reply = framed.next().await.unwrap().unwrap();
    match decode(&reply).unwrap() {
        IpcMessage::Response(response) => {
            assert!(response.success);
            assert_eq!(response.correlation_id, 9);
        }
        other => panic!("unexpected message {:?}", other),
    }
    assert!(obs.tracker.has_active_clients().await);
}

#[tokio::test]
async fn test_shutdown_removes_socket() {
    let obs = TestObserver::new(&[], &[], &[]);
    let server = start_server(&obs);
    assert!(server.socket_path.exists());

    server.shutdown_tx.send(true).unwrap();
    server.handle.await.unwrap().unwrap();
    assert!(!server.socket_path.exists());
}

#[tokio::test]
async fn test_stale_socket_file_is_replaced() {
    let obs = TestObserver::new(&[], &[], &[]);
    let dir = TempDir::new().unwrap();
    let socket_path = dir.path().join("ping.sock");
    std::fs::write(&socket_path, b"stale").unwrap();

    let server = PingServer::new(&socket_path, RegistrationEndpoint::new(obs.tracker.clone()));
    let listener = server.bind().unwrap();
    let (_tx, rx) = watch::channel(false);
    tokio::spawn(server.serve(listener, rx));

    let mut client = PingClient::connect(&socket_path).await.unwrap();
    client.ping("/client", true).await.unwrap();
    assert!(obs.tracker.has_active_clients().await);
}
