//! Endpoint servers: one listener per transport scheme.
//!
//! A server is built from a [`ServerContext`] by an [`EndpointServerFactory`].
//! The bundled [`ListenerServer`] binds a TCP listener and answers endpoint
//! discovery and ping requests over the framed protocol in [`crate::message`].

use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use uastack_security::{EndpointNegotiator, Identity, TransportSecurity};
use uastack_types::config::SecurityOffer;
use uastack_types::discovery::{GetEndpointsResponse, ResponseHeader};
use uastack_types::endpoint::{
    ApplicationDescription, EndpointConfiguration, EndpointDescription, UserTokenPolicy,
};
use uastack_types::security::{EngineFlag, MessageSecurityMode, SecurityPolicy, TransportKind};
use uastack_types::{StatusCode, UaError, UaResult};

use crate::message::{
    read_message, write_message, WireError, WireMessage, WireMessageKind, WireRequest,
    WireResponse,
};

/// Everything a factory needs to build the server for one transport.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub kind: TransportKind,
    /// `host:port` to bind.
    pub listen_addr: String,
    /// Host placed in advertised endpoint URLs.
    pub host_name: String,
    pub application: ApplicationDescription,
    pub security: TransportSecurity,
    pub offers: Vec<SecurityOffer>,
    pub user_token_policies: Vec<UserTokenPolicy>,
    pub limits: EndpointConfiguration,
}

impl ServerContext {
    pub fn identity(&self) -> Option<&Identity> {
        self.security.identity()
    }

    /// The endpoints advertised when listening on `port`, one per offer.
    ///
    /// The advertised server certificate is the identity's certificate
    /// followed by its trusted chain, DER blobs concatenated.
    ///
    /// Fails with [`UaError::UnexpectedConfiguration`] when an endpoint needs
    /// a certificate, by its offer or by the user tokens it accepts, and the
    /// transport has no identity.
    pub fn endpoints(&self, port: u16) -> UaResult<Vec<EndpointDescription>> {
        let url = format!("{}://{}:{}", self.kind.scheme(), self.host_name, port);
        let certificate = self.identity().map(|identity| {
            let mut der = identity.certificate().der().to_vec();
            for cert in self.security.trusted_chain() {
                der.extend_from_slice(cert.der());
            }
            der
        });
        let tokens: Vec<_> = self.user_token_policies.iter().cloned().map(Some).collect();
        let negotiator = EndpointNegotiator::new();

        self.offers
            .iter()
            .map(|offer| {
                let endpoint = EndpointDescription {
                    endpoint_url: url.clone(),
                    server: self.application.clone(),
                    server_certificate: certificate.clone(),
                    security_mode: offer.mode,
                    security_policy_uri: Some(offer.policy.uri().to_string()),
                    user_identity_tokens: tokens.clone(),
                    transport_profile_uri: self.kind.transport_profile_uri().to_string(),
                    security_level: security_level(offer),
                };
                let secured = offer.mode != MessageSecurityMode::None
                    || offer.policy != SecurityPolicy::None
                    || negotiator.requires_certificate(&endpoint);
                if secured && certificate.is_none() {
                    return Err(UaError::UnexpectedConfiguration(format!(
                        "{:?}/{} on {url} needs an application instance certificate",
                        offer.mode,
                        offer.policy.name()
                    )));
                }
                Ok(endpoint)
            })
            .collect()
    }
}

/// Relative strength of an offer; higher is stronger.
fn security_level(offer: &SecurityOffer) -> u8 {
    let mode = match offer.mode {
        MessageSecurityMode::Invalid | MessageSecurityMode::None => 0,
        MessageSecurityMode::Sign => 1,
        MessageSecurityMode::SignAndEncrypt => 2,
    };
    let policy = SecurityPolicy::ALL
        .iter()
        .position(|p| *p == offer.policy)
        .unwrap_or(0) as u8;
    mode * 10 + policy
}

/// A running transport server.
pub trait EndpointServer: Send + Sync + fmt::Debug {
    fn kind(&self) -> TransportKind;

    fn local_addr(&self) -> SocketAddr;

    fn endpoints(&self) -> Vec<EndpointDescription>;

    /// Stop accepting connections. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Builds the server for a transport.
#[async_trait]
pub trait EndpointServerFactory: Send + Sync {
    async fn create(&self, ctx: ServerContext) -> UaResult<Arc<dyn EndpointServer>>;
}

/// Builds [`ListenerServer`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerServerFactory;

#[async_trait]
impl EndpointServerFactory for ListenerServerFactory {
    async fn create(&self, ctx: ServerContext) -> UaResult<Arc<dyn EndpointServer>> {
        let server = ListenerServer::bind(ctx).await?;
        Ok(server as Arc<dyn EndpointServer>)
    }
}

struct ConnectionState {
    endpoints: Vec<EndpointDescription>,
    max_message_size: u32,
}

pub struct ListenerServer {
    kind: TransportKind,
    local_addr: SocketAddr,
    endpoints: Vec<EndpointDescription>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ListenerServer {
    /// Bind the listener and start the accept loop.
    pub async fn bind(ctx: ServerContext) -> UaResult<Arc<Self>> {
        let addr: SocketAddr = ctx.listen_addr.parse().map_err(|e| {
            UaError::UnexpectedConfiguration(format!("listen address {}: {e}", ctx.listen_addr))
        })?;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        if ctx.security.has_flag(EngineFlag::ReuseAddress) {
            socket.set_reuseaddr(true)?;
        }
        socket.bind(addr)?;
        let listener = socket.listen(1024)?;
        let local_addr = listener.local_addr()?;

        let endpoints = ctx.endpoints(local_addr.port())?;
        info!(
            scheme = ctx.kind.scheme(),
            %local_addr,
            endpoints = endpoints.len(),
            "Endpoint server listening"
        );

        let state = Arc::new(ConnectionState {
            endpoints: endpoints.clone(),
            max_message_size: ctx.limits.max_message_size,
        });
        let multi_thread = ctx.security.has_flag(EngineFlag::MultiThread);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(listener, state, multi_thread, shutdown_rx));

        Ok(Arc::new(Self {
            kind: ctx.kind,
            local_addr,
            endpoints,
            shutdown,
            task: Mutex::new(Some(task)),
            closed: AtomicBool::new(false),
        }))
    }
}

impl EndpointServer for ListenerServer {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn endpoints(&self) -> Vec<EndpointDescription> {
        self.endpoints.clone()
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
        info!(scheme = self.kind.scheme(), local_addr = %self.local_addr, "Endpoint server closed");
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for ListenerServer {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ListenerServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerServer")
            .field("kind", &self.kind)
            .field("local_addr", &self.local_addr)
            .field("endpoints", &self.endpoints.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<ConnectionState>,
    multi_thread: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("Accept loop stopping");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!(%addr, "Accepted connection");
                    if multi_thread {
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &state).await {
                                debug!(%addr, error = %e, "Connection ended");
                            }
                        });
                    } else if let Err(e) = handle_connection(stream, &state).await {
                        debug!(%addr, error = %e, "Connection ended");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Accept error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, state: &ConnectionState) -> Result<(), WireError> {
    let (mut reader, mut writer) = stream.into_split();
    loop {
        let msg = match read_message(&mut reader, state.max_message_size).await {
            Ok(m) => m,
            Err(WireError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        let response = handle_request(&msg, state);
        write_message(&mut writer, &response, state.max_message_size).await?;
    }
}

fn handle_request(msg: &WireMessage, state: &ConnectionState) -> WireMessage {
    let response = match &msg.kind {
        WireMessageKind::Request(WireRequest::GetEndpoints(request)) => {
            let endpoints = EndpointNegotiator::filter_endpoints(&state.endpoints, request);
            debug!(
                endpoint_url = %request.endpoint_url,
                returned = endpoints.len(),
                "GetEndpoints"
            );
            WireResponse::GetEndpoints(GetEndpointsResponse {
                response_header: ResponseHeader::for_request(
                    &request.request_header,
                    StatusCode::GOOD,
                ),
                endpoints,
            })
        }
        WireMessageKind::Request(WireRequest::Ping) => WireResponse::Pong,
        WireMessageKind::Response(_) => {
            warn!(id = %msg.id, "Unexpected response message");
            WireResponse::Error {
                code: StatusCode::BAD_SERVICE_UNSUPPORTED,
                message: "Responses are not accepted by the server".to_string(),
            }
        }
    };
    msg.reply(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uastack_types::endpoint::UserTokenPolicy;

    fn context(offers: Vec<SecurityOffer>) -> ServerContext {
        ServerContext {
            kind: TransportKind::OpcTcp,
            listen_addr: "127.0.0.1:0".to_string(),
            host_name: "plant".to_string(),
            application: ApplicationDescription::default(),
            security: TransportSecurity::tcp(),
            offers,
            user_token_policies: vec![UserTokenPolicy::anonymous()],
            limits: EndpointConfiguration::defaults(),
        }
    }

    #[test]
    fn test_plain_endpoints_need_no_identity() {
        let endpoints = context(vec![SecurityOffer::NONE]).endpoints(4840).unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].endpoint_url, "opc.tcp://plant:4840");
        assert_eq!(endpoints[0].security_level, 0);
        assert!(endpoints[0].server_certificate.is_none());
    }

    #[test]
    fn test_secured_offer_without_identity_fails() {
        let ctx = context(vec![SecurityOffer {
            mode: MessageSecurityMode::SignAndEncrypt,
            policy: SecurityPolicy::Basic256Sha256,
        }]);
        assert!(matches!(
            ctx.endpoints(4840),
            Err(UaError::UnexpectedConfiguration(_))
        ));
    }

    #[test]
    fn test_secure_token_without_identity_fails() {
        for policy in [
            UserTokenPolicy::secure_certificate(),
            UserTokenPolicy::secure_username_password(),
        ] {
            let mut ctx = context(vec![SecurityOffer::NONE]);
            ctx.user_token_policies = vec![UserTokenPolicy::anonymous(), policy];
            assert!(matches!(
                ctx.endpoints(4840),
                Err(UaError::UnexpectedConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_security_level_orders_offers() {
        let sign = SecurityOffer {
            mode: MessageSecurityMode::Sign,
            policy: SecurityPolicy::Basic256Sha256,
        };
        let encrypt = SecurityOffer {
            mode: MessageSecurityMode::SignAndEncrypt,
            policy: SecurityPolicy::Basic128Rsa15,
        };
        assert!(security_level(&SecurityOffer::NONE) < security_level(&sign));
        assert!(security_level(&sign) < security_level(&encrypt));
    }

    #[tokio::test]
    async fn test_bind_and_close() {
        let server = ListenerServer::bind(context(vec![SecurityOffer::NONE]))
            .await
            .unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert_eq!(server.endpoints().len(), 1);
        assert!(!server.is_closed());
        server.close();
        server.close();
        assert!(server.is_closed());
    }
}
