//! Per-transport security configuration.
//!
//! A [`TransportSecurity`] bundles everything one transport (native TCP or
//! HTTPS) needs to secure its connections: the identity it presents, the
//! policy used to judge peer certificates, optional username/password
//! credentials and engine flags. Every field is optional so that a partial
//! configuration can be overlaid onto a complete one with
//! [`TransportSecurity::read_from`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

use uastack_types::security::{
    EngineFlag, HostnameVerification, HttpsSecurityPolicy, TransportKind,
};
use uastack_types::{UaError, UaResult};

use crate::cert::Certificate;
use crate::identity::Identity;
use crate::key::PrivateKey;
use crate::trust::{AllowAll, CertificateValidator};

/// Identities a transport may present plus the extra chain certificates it
/// trusts but does not own. The last identity is the active one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityMaterial {
    pub identities: Vec<Identity>,
    pub trusted_chain: Vec<Certificate>,
}

impl IdentityMaterial {
    pub fn active(&self) -> Option<&Identity> {
        self.identities.last()
    }
}

/// A username/password pair. The password is wiped on drop.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct TransportSecurity {
    kind: TransportKind,
    identity: Option<IdentityMaterial>,
    trust: Option<Arc<dyn CertificateValidator>>,
    username: Option<String>,
    password: Option<Zeroizing<String>>,
    flags: Option<BTreeSet<EngineFlag>>,
    hostname_verification: Option<HostnameVerification>,
    https_policies: Option<Vec<HttpsSecurityPolicy>>,
}

impl TransportSecurity {
    /// An empty configuration: every field unset.
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            identity: None,
            trust: None,
            username: None,
            password: None,
            flags: None,
            hostname_verification: None,
            https_policies: None,
        }
    }

    pub fn tcp() -> Self {
        Self::new(TransportKind::OpcTcp)
    }

    pub fn https() -> Self {
        Self::new(TransportKind::Https)
    }

    /// A copy of `other` that shares nothing mutable with it.
    pub fn new_instance_from(other: &Self) -> Self {
        other.clone()
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Replace the identity material with `identity`, trusting the extra
    /// `chain` certificates without owning them.
    pub fn set_identity(
        &mut self,
        identity: Identity,
        chain: impl IntoIterator<Item = Certificate>,
    ) {
        debug!(
            transport = %self.kind,
            thumbprint = %identity.thumbprint(),
            "Transport identity set"
        );
        self.identity = Some(IdentityMaterial {
            identities: vec![identity],
            trusted_chain: chain.into_iter().collect(),
        });
    }

    /// Set the identity from a certificate and its key. A missing key is a
    /// configuration error: no identity is installed without one.
    pub fn set_identity_from_parts(
        &mut self,
        certificate: Certificate,
        key: Option<PrivateKey>,
    ) -> UaResult<()> {
        let key = key.ok_or_else(|| {
            UaError::UnexpectedConfiguration(format!(
                "no private key for certificate {}",
                certificate.subject()
            ))
        })?;
        self.set_identity(Identity::new(certificate, key)?, []);
        Ok(())
    }

    /// Install several identities at once; the last is the active one.
    pub fn set_identities(
        &mut self,
        identities: Vec<Identity>,
        chain: impl IntoIterator<Item = Certificate>,
    ) -> UaResult<()> {
        if identities.is_empty() {
            return Err(UaError::UnexpectedConfiguration(format!(
                "{} transport: at least one identity is required",
                self.kind
            )));
        }
        self.identity = Some(IdentityMaterial {
            identities,
            trusted_chain: chain.into_iter().collect(),
        });
        Ok(())
    }

    pub fn clear_identity(&mut self) {
        self.identity = None;
    }

    pub fn identity_material(&self) -> Option<&IdentityMaterial> {
        self.identity.as_ref()
    }

    /// The active identity, if one is set.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref().and_then(IdentityMaterial::active)
    }

    /// Certificates that vouch for the active identity. Listeners advertise
    /// them after the identity's own certificate.
    pub fn trusted_chain(&self) -> &[Certificate] {
        self.identity
            .as_ref()
            .map(|m| m.trusted_chain.as_slice())
            .unwrap_or_default()
    }

    pub fn set_trust_policy(&mut self, validator: Arc<dyn CertificateValidator>) {
        self.trust = Some(validator);
    }

    /// The configured trust policy, allow-all when unset.
    pub fn trust_policy(&self) -> Arc<dyn CertificateValidator> {
        self.trust
            .clone()
            .unwrap_or_else(|| Arc::new(AllowAll))
    }

    /// Check a peer certificate against the trust policy.
    ///
    /// Discovery runs before any peer presents a certificate, so nothing in
    /// this workspace calls this; the secure-channel handshake that owns
    /// this configuration does.
    pub fn validate_peer(&self, certificate: &Certificate) -> UaResult<()> {
        match &self.trust {
            Some(validator) => validator.validate(certificate),
            None => Ok(()),
        }
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(Zeroizing::new(password.into()));
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.username = Some(credentials.username);
        self.password = Some(credentials.password);
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// `(username, password)` when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    pub fn set_flags(&mut self, flags: impl IntoIterator<Item = EngineFlag>) {
        self.flags = Some(flags.into_iter().collect());
    }

    /// The configured flags; empty when unset.
    pub fn flags(&self) -> BTreeSet<EngineFlag> {
        self.flags.clone().unwrap_or_default()
    }

    pub fn has_flag(&self, flag: EngineFlag) -> bool {
        self.flags.as_ref().map_or(false, |f| f.contains(&flag))
    }

    pub fn set_hostname_verification(&mut self, mode: HostnameVerification) -> UaResult<()> {
        self.require_https("hostname verification")?;
        self.hostname_verification = Some(mode);
        Ok(())
    }

    pub fn hostname_verification(&self) -> HostnameVerification {
        self.hostname_verification.unwrap_or_default()
    }

    pub fn set_https_policies(&mut self, policies: Vec<HttpsSecurityPolicy>) -> UaResult<()> {
        self.require_https("HTTPS security policies")?;
        self.https_policies = Some(policies);
        Ok(())
    }

    /// Allowed HTTPS policies; `None` means no restriction was configured.
    pub fn https_policies(&self) -> Option<&[HttpsSecurityPolicy]> {
        self.https_policies.as_deref()
    }

    fn require_https(&self, what: &str) -> UaResult<()> {
        if self.kind != TransportKind::Https {
            return Err(UaError::UnexpectedConfiguration(format!(
                "{what} only applies to the HTTPS transport"
            )));
        }
        Ok(())
    }

    /// Overlay every field that is set in `other` onto `self`.
    ///
    /// Set fields replace the current value as a whole; unset fields of
    /// `other` leave `self` untouched. Credentials are taken only when
    /// `other` has both a username and a password.
    pub fn read_from(&mut self, other: &TransportSecurity) {
        if let Some(identity) = &other.identity {
            self.identity = Some(identity.clone());
        }
        if let Some(trust) = &other.trust {
            self.trust = Some(Arc::clone(trust));
        }
        if let (Some(user), Some(pass)) = (&other.username, &other.password) {
            self.username = Some(user.clone());
            self.password = Some(pass.clone());
        }
        if let Some(flags) = &other.flags {
            self.flags = Some(flags.clone());
        }
        if let Some(mode) = other.hostname_verification {
            self.hostname_verification = Some(mode);
        }
        if let Some(policies) = &other.https_policies {
            self.https_policies = Some(policies.clone());
        }
    }
}

impl fmt::Debug for TransportSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSecurity")
            .field("kind", &self.kind)
            .field("identity", &self.identity)
            .field("trust", &self.trust)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("flags", &self.flags)
            .field("hostname_verification", &self.hostname_verification)
            .field("https_policies", &self.https_policies)
            .finish()
    }
}
