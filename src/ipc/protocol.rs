//! IPC message protocol
//!
//! Every request carries a correlation id echoed by its response.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::observer::endpoint::PingRequest;
use crate::observer::status::NodesStatus;
use crate::observer::traits::ObserverError;

/// Correlation ID for matching requests with responses
pub type CorrelationId = u64;

/// Correlation id used when answering a frame that could not be decoded
pub const UNKNOWN_CORRELATION_ID: CorrelationId = 0;

/// Main IPC message wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IpcMessage {
    /// Request from a client to the observer
    Request(RequestMessage),
    /// Response from the observer
    Response(ResponseMessage),
}

/// Request message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    pub correlation_id: CorrelationId,
    pub payload: RequestPayload,
}

/// Request payload types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RequestPayload {
    /// Client announces it is up or going away
    Ping(PingRequest),
    /// Query the aggregate status
    GetStatus,
}

/// Response message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub correlation_id: CorrelationId,
    pub success: bool,
    pub payload: Option<ResponsePayload>,
    pub error: Option<String>,
}

/// Response payload types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResponsePayload {
    /// Ping acknowledgement
    Ack,
    /// Aggregate status
    Status(NodesStatus),
}

impl RequestMessage {
    pub fn ping(correlation_id: CorrelationId, name: impl Into<String>, state: bool) -> Self {
        Self {
            correlation_id,
            payload: RequestPayload::Ping(PingRequest::new(name, state)),
        }
    }

    pub fn get_status(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            payload: RequestPayload::GetStatus,
        }
    }
}

impl ResponseMessage {
    pub fn success(correlation_id: CorrelationId, payload: ResponsePayload) -> Self {
        Self {
            correlation_id,
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn error(correlation_id: CorrelationId, error: String) -> Self {
        Self {
            correlation_id,
            success: false,
            payload: None,
            error: Some(error),
        }
    }
}

/// Serialize a message into one frame
pub fn encode(message: &IpcMessage) -> Result<Bytes, ObserverError> {
    Ok(Bytes::from(bincode::serialize(message)?))
}

/// Deserialize one frame
pub fn decode(bytes: &[u8]) -> Result<IpcMessage, ObserverError> {
    Ok(bincode::deserialize(bytes)?)
}
