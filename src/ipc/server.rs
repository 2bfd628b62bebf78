//! IPC server for the registration endpoint
//!
//! Each connection is served in its own task; a client may send any number
//! of requests on one connection.

use futures::{SinkExt, StreamExt};
use std::path::{Path, PathBuf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, error, info, warn};

use crate::ipc::protocol::{
    decode, encode, IpcMessage, RequestMessage, RequestPayload, ResponseMessage, ResponsePayload,
    UNKNOWN_CORRELATION_ID,
};
use crate::observer::endpoint::RegistrationEndpoint;
use crate::observer::traits::ObserverError;

/// Unix socket server in front of a [`RegistrationEndpoint`]
pub struct PingServer {
    socket_path: PathBuf,
    endpoint: RegistrationEndpoint,
}

impl PingServer {
    pub fn new<P: AsRef<Path>>(socket_path: P, endpoint: RegistrationEndpoint) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            endpoint,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket, replacing a stale socket file
    pub fn bind(&self) -> Result<UnixListener, ObserverError> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .map_err(|e| ObserverError::Ipc(format!("Failed to remove old socket: {}", e)))?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ObserverError::Ipc(format!("Failed to create socket directory: {}", e))
            })?;
        }

        UnixListener::bind(&self.socket_path)
            .map_err(|e| ObserverError::Ipc(format!("Failed to bind socket: {}", e)))
    }

    /// Accept connections until `shutdown` turns true or its sender is dropped
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), ObserverError> {
        let listener = self.bind()?;
        self.serve(listener, shutdown).await
    }

    /// Serve an already bound listener
    pub async fn serve(
        self,
        listener: UnixListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ObserverError> {
        info!("Registration endpoint listening on {:?}", self.socket_path);

        while !*shutdown.borrow() {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        debug!("New client connection");
                        let endpoint = self.endpoint.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, endpoint).await {
                                warn!("Client connection closed with error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept client connection: {}", e);
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Registration endpoint stopped");
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            debug!("Could not remove socket {:?}: {}", self.socket_path, e);
        }
        Ok(())
    }
}

async fn handle_connection(
    stream: UnixStream,
    endpoint: RegistrationEndpoint,
) -> Result<(), ObserverError> {
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

    while let Some(frame) = framed.next().await {
        let bytes = frame.map_err(|e| ObserverError::Ipc(format!("Failed to read frame: {}", e)))?;

        let response = match decode(bytes.as_ref()) {
            Ok(IpcMessage::Request(request)) => process_request(&endpoint, request).await,
            Ok(IpcMessage::Response(response)) => {
                warn!("Received response from client (unexpected)");
                ResponseMessage::error(
                    response.correlation_id,
                    "responses are not accepted by the observer".to_string(),
                )
            }
            Err(e) => {
                warn!("Malformed frame from client: {}", e);
                ResponseMessage::error(UNKNOWN_CORRELATION_ID, format!("malformed request: {}", e))
            }
        };

        framed
            .send(encode(&IpcMessage::Response(response))?)
            .await
            .map_err(|e| ObserverError::Ipc(format!("Failed to send response: {}", e)))?;
    }

    debug!("Client disconnected");
    Ok(())
}

async fn process_request(
    endpoint: &RegistrationEndpoint,
    request: RequestMessage,
) -> ResponseMessage {
    match request.payload {
        RequestPayload::Ping(ping) => {
            endpoint.ping(ping).await;
            ResponseMessage::success(request.correlation_id, ResponsePayload::Ack)
        }
        RequestPayload::GetStatus => ResponseMessage::success(
            request.correlation_id,
            ResponsePayload::Status(endpoint.status().await),
        ),
    }
}
