//! Endpoint discovery client.

use std::net::SocketAddr;
use tokio::net::TcpStream;
use tracing::debug;

use uastack_types::discovery::{GetEndpointsRequest, GetEndpointsResponse};
use uastack_types::endpoint::EndpointConfiguration;

use crate::message::{
    read_message, write_message, WireError, WireMessage, WireMessageKind, WireRequest,
    WireResponse,
};

/// Connect to `addr`, send one GetEndpoints request and return the answer.
pub async fn discover_endpoints(
    addr: SocketAddr,
    request: GetEndpointsRequest,
) -> Result<GetEndpointsResponse, WireError> {
    let max_size = EndpointConfiguration::defaults().max_message_size;
    let stream = TcpStream::connect(addr).await?;
    let (mut reader, mut writer) = stream.into_split();

    let msg = WireMessage::request(WireRequest::GetEndpoints(request));
    write_message(&mut writer, &msg, max_size).await?;
    let reply = read_message(&mut reader, max_size).await?;
    if reply.id != msg.id {
        return Err(WireError::UnexpectedResponse(msg.id));
    }

    match reply.kind {
        WireMessageKind::Response(WireResponse::GetEndpoints(response)) => {
            debug!(%addr, endpoints = response.endpoints.len(), "Discovered endpoints");
            Ok(response)
        }
        WireMessageKind::Response(WireResponse::Error { code, message }) => {
            Err(WireError::Remote { code, message })
        }
        _ => Err(WireError::UnexpectedResponse(msg.id)),
    }
}
