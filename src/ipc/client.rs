//! IPC client used by client processes to announce themselves

use futures::{SinkExt, StreamExt};
use std::path::Path;
use tokio::net::UnixStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::debug;

use crate::ipc::protocol::{
    decode, encode, CorrelationId, IpcMessage, RequestMessage, ResponseMessage, ResponsePayload,
};
use crate::observer::endpoint::PingAck;
use crate::observer::status::NodesStatus;
use crate::observer::traits::ObserverError;

/// Connection to the observer's registration endpoint
pub struct PingClient {
    framed: Framed<UnixStream, LengthDelimitedCodec>,
    next_correlation_id: CorrelationId,
}

impl PingClient {
    /// Connect to the observer socket
    pub async fn connect<P: AsRef<Path>>(socket_path: P) -> Result<Self, ObserverError> {
        let stream = UnixStream::connect(socket_path.as_ref())
            .await
            .map_err(|e| ObserverError::Ipc(format!("Failed to connect to socket: {}", e)))?;

        debug!("Connected to observer socket {:?}", socket_path.as_ref());

        Ok(Self {
            framed: Framed::new(stream, LengthDelimitedCodec::new()),
            next_correlation_id: 1,
        })
    }

    /// Announce that `name` is up (`state = true`) or going away
    pub async fn ping(&mut self, name: &str, state: bool) -> Result<PingAck, ObserverError> {
        let id = self.next_correlation_id();
        match self.request(RequestMessage::ping(id, name, state)).await? {
            ResponsePayload::Ack => Ok(PingAck),
            other => Err(unexpected(other)),
        }
    }

    /// Fetch the aggregate status
    pub async fn status(&mut self) -> Result<NodesStatus, ObserverError> {
        let id = self.next_correlation_id();
        match self.request(RequestMessage::get_status(id)).await? {
            ResponsePayload::Status(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    /// Send a request and wait for its response payload
    pub async fn request(
        &mut self,
        request: RequestMessage,
    ) -> Result<ResponsePayload, ObserverError> {
        let correlation_id = request.correlation_id;

        self.framed
            .send(encode(&IpcMessage::Request(request))?)
            .await
            .map_err(|e| ObserverError::Ipc(format!("Failed to send request: {}", e)))?;

        let bytes = self
            .framed
            .next()
            .await
            .ok_or_else(|| {
                ObserverError::Ipc("Connection closed while waiting for response".to_string())
            })?
            .map_err(|e| ObserverError::Ipc(format!("Failed to read response: {}", e)))?;

        let response = match decode(bytes.as_ref())? {
            IpcMessage::Response(response) => response,
            IpcMessage::Request(_) => {
                return Err(ObserverError::Ipc(
                    "Received unexpected message type".to_string(),
                ))
            }
        };

        check_response(correlation_id, response)
    }

    fn next_correlation_id(&mut self) -> CorrelationId {
        let id = self.next_correlation_id;
        self.next_correlation_id = self.next_correlation_id.wrapping_add(1).max(1);
        id
    }
}

fn check_response(
    correlation_id: CorrelationId,
    response: ResponseMessage,
) -> Result<ResponsePayload, ObserverError> {
    if response.correlation_id != correlation_id {
        return Err(ObserverError::Ipc(format!(
            "Correlation ID mismatch: expected {}, got {}",
            correlation_id, response.correlation_id
        )));
    }

    if !response.success {
        return Err(ObserverError::Ipc(
            response
                .error
                .unwrap_or_else(|| "request failed".to_string()),
        ));
    }

    response
        .payload
        .ok_or_else(|| ObserverError::Ipc("Response without payload".to_string()))
}

fn unexpected(payload: ResponsePayload) -> ObserverError {
    ObserverError::Ipc(format!("Unexpected response payload: {:?}", payload))
}
