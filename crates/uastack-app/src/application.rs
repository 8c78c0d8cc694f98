//! Application: identities, transport security, metadata and servers.

use futures::FutureExt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use uastack_security::{Certificate, Credentials, Identity, TransportSecurity, TrustList};
use uastack_types::config::{ApplicationConfig, SecurityOffer, TransportConfig};
use uastack_types::endpoint::{
    ApplicationDescription, ApplicationType, EndpointConfiguration, SignedSoftwareCertificate,
    UserTokenPolicy,
};
use uastack_types::locale::{Locale, LocalizedText};
use uastack_types::namespace::{NamespaceTable, ServerTable};
use uastack_types::security::TransportKind;
use uastack_types::{UaError, UaResult};
use uastack_wire::{
    EncoderContext, EndpointServer, EndpointServerFactory, ListenerServerFactory, ServerContext,
    TypeRegistry,
};

use crate::error::{AppError, AppResult};
use crate::slot::ServerSlot;
use crate::snapshot::SnapshotList;

/// Where and how one transport listens.
#[derive(Debug, Clone)]
struct TransportSettings {
    listen_addr: String,
    host_name: String,
    offers: Vec<SecurityOffer>,
    user_token_policies: Vec<UserTokenPolicy>,
}

impl TransportSettings {
    fn from_config(kind: TransportKind, cfg: &TransportConfig) -> Self {
        let user_token_policies = cfg
            .user_token_policies
            .iter()
            .filter_map(|id| {
                let policy = UserTokenPolicy::well_known_by_id(id);
                if policy.is_none() {
                    warn!(transport = %kind, policy_id = %id, "Unknown user token policy ignored");
                }
                policy
            })
            .collect();
        Self {
            listen_addr: cfg.listen_addr_for(kind),
            host_name: cfg.host_name.clone().unwrap_or_else(local_host_name),
            offers: cfg.security.clone(),
            user_token_policies,
        }
    }
}

/// An OPC UA application: the owner of identities, transport security and
/// the per-scheme endpoint servers.
///
/// All methods take `&self`; an `Application` is meant to be shared behind an
/// `Arc`. Collections are copy-on-write, so readers iterate snapshots that
/// later writes do not disturb.
pub struct Application {
    application_uri: String,
    product_uri: String,
    application_name: RwLock<LocalizedText>,
    identities: SnapshotList<Identity>,
    software_certificates: SnapshotList<SignedSoftwareCertificate>,
    locales: SnapshotList<Locale>,
    tcp_security: RwLock<TransportSecurity>,
    https_security: RwLock<TransportSecurity>,
    tcp_settings: TransportSettings,
    https_settings: TransportSettings,
    limits: EndpointConfiguration,
    encoder: RwLock<Arc<EncoderContext>>,
    factory: Arc<dyn EndpointServerFactory>,
    tcp_server: ServerSlot,
    https_server: ServerSlot,
}

impl Application {
    /// An application with default settings, a generated URI and the
    /// built-in listener servers.
    pub fn new() -> Self {
        Self::assemble(
            &ApplicationConfig::default(),
            Arc::new(ListenerServerFactory),
            TransportSecurity::tcp(),
            TransportSecurity::https(),
        )
    }

    /// Build from configuration, loading identity and trust files eagerly.
    pub fn from_config(config: &ApplicationConfig) -> AppResult<Self> {
        Self::from_config_with_factory(config, Arc::new(ListenerServerFactory))
    }

    /// Like [`from_config`](Self::from_config), with servers built by `factory`.
    pub fn from_config_with_factory(
        config: &ApplicationConfig,
        factory: Arc<dyn EndpointServerFactory>,
    ) -> AppResult<Self> {
        for id in &config.locales {
            id.parse::<Locale>()
                .map_err(|e| AppError::Config(format!("locale '{id}': {e}")))?;
        }
        for (kind, cfg) in [
            (TransportKind::OpcTcp, &config.tcp),
            (TransportKind::Https, &config.https),
        ] {
            if let Some(id) = cfg
                .user_token_policies
                .iter()
                .find(|id| UserTokenPolicy::well_known_by_id(id).is_none())
            {
                return Err(AppError::Config(format!(
                    "{kind} transport: unknown user token policy '{id}'"
                )));
            }
        }

        let tcp = security_from_config(TransportKind::OpcTcp, &config.tcp)?;
        let https = security_from_config(TransportKind::Https, &config.https)?;
        let app = Self::assemble(config, factory, tcp, https);

        if let Some(identity) = &config.identity {
            let identity = Identity::load_files(&identity.certificate, &identity.private_key)?;
            app.add_application_instance_certificate(identity);
        }
        Ok(app)
    }

    fn assemble(
        config: &ApplicationConfig,
        factory: Arc<dyn EndpointServerFactory>,
        tcp_security: TransportSecurity,
        https_security: TransportSecurity,
    ) -> Self {
        let application_uri = config
            .application_uri
            .clone()
            .unwrap_or_else(generate_application_uri);
        let locales: SnapshotList<Locale> = config
            .locales
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect();
        let encoder = EncoderContext::new(
            NamespaceTable::new(),
            ServerTable::new(application_uri.clone()),
            Arc::new(TypeRegistry::standard()),
        )
        .with_limits(&config.limits);

        info!(application_uri = %application_uri, "Application created");
        Self {
            application_name: RwLock::new(LocalizedText::invariant(&config.application_name)),
            product_uri: config.product_uri.clone(),
            application_uri,
            identities: SnapshotList::new(),
            software_certificates: SnapshotList::new(),
            locales,
            tcp_security: RwLock::new(tcp_security),
            https_security: RwLock::new(https_security),
            tcp_settings: TransportSettings::from_config(TransportKind::OpcTcp, &config.tcp),
            https_settings: TransportSettings::from_config(TransportKind::Https, &config.https),
            limits: config.limits.clone(),
            encoder: RwLock::new(Arc::new(encoder)),
            factory,
            tcp_server: ServerSlot::new(TransportKind::OpcTcp),
            https_server: ServerSlot::new(TransportKind::Https),
        }
    }

    // -- Metadata ------------------------------------------------------------

    pub fn application_uri(&self) -> &str {
        &self.application_uri
    }

    pub fn product_uri(&self) -> &str {
        &self.product_uri
    }

    pub fn application_name(&self) -> LocalizedText {
        self.application_name
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_application_name(&self, name: LocalizedText) {
        *self
            .application_name
            .write()
            .unwrap_or_else(|e| e.into_inner()) = name;
    }

    pub fn application_description(&self) -> ApplicationDescription {
        ApplicationDescription {
            application_uri: self.application_uri.clone(),
            product_uri: self.product_uri.clone(),
            application_name: self.application_name(),
            application_type: ApplicationType::Server,
            ..Default::default()
        }
    }

    pub fn limits(&self) -> &EndpointConfiguration {
        &self.limits
    }

    // -- Application instance certificates -----------------------------------

    /// Append an identity; the most recently added one is current.
    pub fn add_application_instance_certificate(&self, identity: Identity) {
        debug!(thumbprint = %identity.thumbprint(), "Application instance certificate added");
        self.identities.push(identity);
    }

    /// Remove the first identity equal to `identity`.
    pub fn remove_application_instance_certificate(&self, identity: &Identity) -> bool {
        let removed = self.identities.remove_first(|i| i == identity).is_some();
        if removed {
            debug!(thumbprint = %identity.thumbprint(), "Application instance certificate removed");
        }
        removed
    }

    /// The most recently added identity still present.
    pub fn current_application_instance_certificate(&self) -> Option<Identity> {
        self.identities.last()
    }

    /// The identity whose thumbprint is `thumbprint`; `None` for `None`.
    pub fn application_instance_certificate(&self, thumbprint: Option<&[u8]>) -> Option<Identity> {
        let thumbprint = thumbprint?;
        self.identities.find(|i| i.matches(thumbprint))
    }

    pub fn application_instance_certificates(&self) -> Arc<Vec<Identity>> {
        self.identities.snapshot()
    }

    // -- Software certificates -----------------------------------------------

    pub fn add_software_certificate(&self, certificate: SignedSoftwareCertificate) {
        self.software_certificates.push(certificate);
    }

    pub fn remove_software_certificate(&self, certificate: &SignedSoftwareCertificate) -> bool {
        self.software_certificates
            .remove_first(|c| c == certificate)
            .is_some()
    }

    pub fn software_certificates(&self) -> Arc<Vec<SignedSoftwareCertificate>> {
        self.software_certificates.snapshot()
    }

    // -- Locales -------------------------------------------------------------

    pub fn add_locale(&self, locale: Locale) {
        self.locales.push(locale);
    }

    pub fn remove_locale(&self, locale: &Locale) -> bool {
        self.locales.remove_first(|l| l == locale).is_some()
    }

    pub fn locales(&self) -> Arc<Vec<Locale>> {
        self.locales.snapshot()
    }

    /// Locale ids in `language[-COUNTRY]` form, in insertion order.
    pub fn locale_ids(&self) -> Vec<String> {
        self.locales.snapshot().iter().map(Locale::to_locale_id).collect()
    }

    // -- Transport security --------------------------------------------------

    /// A copy of the security configuration of `kind`.
    pub fn transport_security(&self, kind: TransportKind) -> TransportSecurity {
        self.security_lock(kind)
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the configuration of `security.kind()`. Servers already built
    /// keep the configuration they were built with.
    pub fn set_transport_security(&self, security: TransportSecurity) {
        let kind = security.kind();
        *self
            .security_lock(kind)
            .write()
            .unwrap_or_else(|e| e.into_inner()) = security;
    }

    /// Overlay the set fields of `overlay` onto the configuration of its kind.
    pub fn overlay_transport_security(&self, overlay: &TransportSecurity) {
        self.security_lock(overlay.kind())
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .read_from(overlay);
    }

    fn security_lock(&self, kind: TransportKind) -> &RwLock<TransportSecurity> {
        match kind {
            TransportKind::OpcTcp => &self.tcp_security,
            TransportKind::Https => &self.https_security,
        }
    }

    // -- Encoder context -----------------------------------------------------

    pub fn encoder_context(&self) -> Arc<EncoderContext> {
        Arc::clone(&self.encoder.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Modify the encoder context; readers holding the previous context keep it.
    pub fn update_encoder_context(&self, f: impl FnOnce(&mut EncoderContext)) {
        let mut guard = self.encoder.write().unwrap_or_else(|e| e.into_inner());
        f(Arc::make_mut(&mut guard));
    }

    // -- Servers -------------------------------------------------------------

    /// The server for a URL scheme: `opc.tcp`, `http` or `https`.
    ///
    /// The first call for a transport builds its server; concurrent callers
    /// share that one attempt and its outcome. A failed attempt is retried by
    /// the next call.
    pub async fn server_for(&self, scheme: &str) -> AppResult<Arc<dyn EndpointServer>> {
        let kind = TransportKind::from_scheme(scheme).ok_or_else(|| {
            UaError::UnexpectedConfiguration(format!("no server for scheme '{scheme}'"))
        })?;
        self.server(kind).await
    }

    /// The server for the scheme of `url`.
    pub async fn server_for_url(&self, url: &str) -> AppResult<Arc<dyn EndpointServer>> {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme).ok_or_else(|| {
            UaError::UnexpectedConfiguration(format!("no scheme in endpoint url '{url}'"))
        })?;
        self.server_for(scheme).await
    }

    pub async fn server(&self, kind: TransportKind) -> AppResult<Arc<dyn EndpointServer>> {
        self.slot(kind)
            .get_or_create(|| {
                let ctx = self.server_context(kind);
                let factory = Arc::clone(&self.factory);
                async move {
                    info!(scheme = kind.scheme(), listen_addr = %ctx.listen_addr, "Creating endpoint server");
                    factory.create(ctx).await.map_err(Arc::new)
                }
                .boxed()
            })
            .await
    }

    /// The server of `kind` if it has been built and not closed.
    pub fn current_server(&self, kind: TransportKind) -> Option<Arc<dyn EndpointServer>> {
        self.slot(kind).get()
    }

    /// What a factory receives when building the server of `kind`. A
    /// transport without its own identity presents the current application
    /// instance certificate.
    pub fn server_context(&self, kind: TransportKind) -> ServerContext {
        let mut security = self.transport_security(kind);
        if security.identity().is_none() {
            if let Some(identity) = self.current_application_instance_certificate() {
                security.set_identity(identity, Vec::new());
            }
        }
        let settings = match kind {
            TransportKind::OpcTcp => &self.tcp_settings,
            TransportKind::Https => &self.https_settings,
        };
        ServerContext {
            kind,
            listen_addr: settings.listen_addr.clone(),
            host_name: settings.host_name.clone(),
            application: self.application_description(),
            security,
            offers: settings.offers.clone(),
            user_token_policies: settings.user_token_policies.clone(),
            limits: self.limits.clone(),
        }
    }

    /// Close both servers and forget them. Safe to call repeatedly, and when
    /// no server was ever built.
    pub fn close(&self) {
        let tcp = self.tcp_server.close();
        let https = self.https_server.close();
        if tcp || https {
            info!(application_uri = %self.application_uri, "Application servers closed");
        }
    }

    fn slot(&self, kind: TransportKind) -> &ServerSlot {
        match kind {
            TransportKind::OpcTcp => &self.tcp_server,
            TransportKind::Https => &self.https_server,
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("application_uri", &self.application_uri)
            .field("identities", &self.identities.len())
            .field("tcp_server", &self.tcp_server)
            .field("https_server", &self.https_server)
            .finish()
    }
}

fn security_from_config(kind: TransportKind, cfg: &TransportConfig) -> AppResult<TransportSecurity> {
    let mut security = TransportSecurity::new(kind);
    if !cfg.flags.is_empty() {
        security.set_flags(cfg.flags.iter().copied());
    }
    if let (Some(username), Some(password)) = (&cfg.username, &cfg.password) {
        security.set_credentials(Credentials::new(username, password));
    }
    if !cfg.trusted_certificates.is_empty() {
        let trusted = cfg
            .trusted_certificates
            .iter()
            .map(Certificate::load_file)
            .collect::<UaResult<Vec<_>>>()?;
        debug!(transport = %kind, count = trusted.len(), "Loaded trusted certificates");
        security.set_trust_policy(Arc::new(TrustList::from_certificates(&trusted)));
    }
    match kind {
        TransportKind::Https => {
            if let Some(mode) = cfg.hostname_verification {
                security.set_hostname_verification(mode)?;
            }
            if !cfg.https_policies.is_empty() {
                security.set_https_policies(cfg.https_policies.clone())?;
            }
        }
        TransportKind::OpcTcp => {
            if cfg.hostname_verification.is_some() || !cfg.https_policies.is_empty() {
                warn!("HTTPS-only settings in [tcp] are ignored");
            }
        }
    }
    Ok(security)
}

fn local_host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

/// `urn:<hostname>:<uuid>`.
fn generate_application_uri() -> String {
    format!("urn:{}:{}", local_host_name(), uuid::Uuid::new_v4())
}
