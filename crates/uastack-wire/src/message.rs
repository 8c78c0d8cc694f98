//! Discovery message framing.
//!
//! Discovery requests travel as JSON frames over TCP. Each frame is prefixed
//! with a 4-byte big-endian length header.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use uastack_types::discovery::{GetEndpointsRequest, GetEndpointsResponse};
use uastack_types::{StatusCode, UaError};

/// Errors from the framing layer.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: u32, max: u32 },
    #[error("Remote error {code}: {message}")]
    Remote { code: StatusCode, message: String },
    #[error("Unexpected response to request {0}")]
    UnexpectedResponse(String),
    #[error(transparent)]
    Ua(#[from] UaError),
}

impl WireError {
    /// The status code reported to the remote side for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WireError::MessageTooLarge { .. } => StatusCode::BAD_TCP_MESSAGE_TOO_LARGE,
            WireError::Json(_) => StatusCode::BAD_DECODING_ERROR,
            WireError::Remote { code, .. } => *code,
            WireError::Ua(e) => e.status_code(),
            _ => StatusCode::BAD_COMMUNICATION_ERROR,
        }
    }
}

/// A framed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Correlates a response with its request.
    pub id: String,
    #[serde(flatten)]
    pub kind: WireMessageKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessageKind {
    #[serde(rename = "request")]
    Request(WireRequest),
    #[serde(rename = "response")]
    Response(WireResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum WireRequest {
    #[serde(rename = "get_endpoints")]
    GetEndpoints(GetEndpointsRequest),
    #[serde(rename = "ping")]
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum WireResponse {
    #[serde(rename = "get_endpoints_result")]
    GetEndpoints(GetEndpointsResponse),
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "error")]
    Error { code: StatusCode, message: String },
}

impl WireMessage {
    pub fn request(request: WireRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: WireMessageKind::Request(request),
        }
    }

    /// A response carrying the id of `self`.
    pub fn reply(&self, response: WireResponse) -> Self {
        Self {
            id: self.id.clone(),
            kind: WireMessageKind::Response(response),
        }
    }
}

/// Encode a message to bytes (4-byte big-endian length + JSON).
pub fn encode_message(msg: &WireMessage) -> Result<Vec<u8>, serde_json::Error> {
    let json = serde_json::to_vec(msg)?;
    let len = json.len() as u32;
    let mut bytes = Vec::with_capacity(4 + json.len());
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(&json);
    Ok(bytes)
}

/// Decode the length prefix from a 4-byte header.
pub fn decode_length(header: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*header)
}

/// Parse a JSON body into a WireMessage.
pub fn decode_message(body: &[u8]) -> Result<WireMessage, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Write a framed message, refusing frames larger than `max_size`.
pub async fn write_message<W>(writer: &mut W, msg: &WireMessage, max_size: u32) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode_message(msg)?;
    let size = (bytes.len() - 4) as u32;
    if size > max_size {
        return Err(WireError::MessageTooLarge { size, max: max_size });
    }
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a framed message, rejecting frames larger than `max_size`.
pub async fn read_message<R>(reader: &mut R, max_size: u32) -> Result<WireMessage, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(WireError::ConnectionClosed);
        }
        Err(e) => return Err(WireError::Io(e)),
    }

    let len = decode_length(&header);
    if len > max_size {
        return Err(WireError::MessageTooLarge {
            size: len,
            max: max_size,
        });
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;

    let msg = decode_message(&body)?;
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let msg = WireMessage::request(WireRequest::Ping);
        let bytes = encode_message(&msg).unwrap();
        let len = decode_length(&[bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(len as usize, bytes.len() - 4);
        let decoded = decode_message(&bytes[4..]).unwrap();
        assert_eq!(decoded.id, msg.id);
    }

    #[test]
    fn test_get_endpoints_serialization() {
        let msg = WireMessage::request(WireRequest::GetEndpoints(GetEndpointsRequest::new(
            "opc.tcp://plant:4840",
        )));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("get_endpoints"));
        assert!(json.contains("opc.tcp://plant:4840"));
        let decoded: WireMessage = serde_json::from_str(&json).unwrap();
        match decoded.kind {
            WireMessageKind::Request(WireRequest::GetEndpoints(req)) => {
                assert_eq!(req.endpoint_url, "opc.tcp://plant:4840");
            }
            other => panic!("Expected GetEndpoints, got {other:?}"),
        }
    }

    #[test]
    fn test_error_response() {
        let request = WireMessage::request(WireRequest::Ping);
        let msg = request.reply(WireResponse::Error {
            code: StatusCode::BAD_SERVICE_UNSUPPORTED,
            message: "nope".to_string(),
        });
        let json = serde_json::to_string(&msg).unwrap();
        let decoded: WireMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, request.id);
        match decoded.kind {
            WireMessageKind::Response(WireResponse::Error { code, message }) => {
                assert_eq!(code, StatusCode::BAD_SERVICE_UNSUPPORTED);
                assert_eq!(message, "nope");
            }
            other => panic!("Expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_rejects_oversized_frame() {
        let msg = WireMessage::request(WireRequest::Ping);
        let bytes = encode_message(&msg).unwrap();
        let mut reader = &bytes[..];
        let result = read_message(&mut reader, 4).await;
        assert!(matches!(result, Err(WireError::MessageTooLarge { max: 4, .. })));
    }

    #[tokio::test]
    async fn test_read_eof_is_connection_closed() {
        let mut reader: &[u8] = &[];
        assert!(matches!(
            read_message(&mut reader, 1024).await,
            Err(WireError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let msg = WireMessage::request(WireRequest::Ping);
        let mut buf = Vec::new();
        write_message(&mut buf, &msg, 1024).await.unwrap();
        let mut reader = &buf[..];
        let back = read_message(&mut reader, 1024).await.unwrap();
        assert_eq!(back.id, msg.id);
    }
}
