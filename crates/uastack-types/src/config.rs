//! Application configuration types.
//!
//! Every section is optional in the TOML file; missing fields take the
//! values of the corresponding `Default` impl.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::endpoint::{EndpointConfiguration, ANONYMOUS_POLICY_ID};
use crate::security::{
    EngineFlag, HostnameVerification, HttpsSecurityPolicy, MessageSecurityMode, SecurityPolicy,
    TransportKind,
};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Generated as `urn:<hostname>:<uuid>` when absent.
    pub application_uri: Option<String>,
    pub product_uri: String,
    pub application_name: String,
    /// Locale ids such as `en-US`.
    pub locales: Vec<String>,
    pub identity: Option<IdentityConfig>,
    pub tcp: TransportConfig,
    pub https: TransportConfig,
    pub limits: EndpointConfiguration,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            application_uri: None,
            product_uri: "urn:uastack".to_string(),
            application_name: "uastack".to_string(),
            locales: vec!["en".to_string()],
            identity: None,
            tcp: TransportConfig::default(),
            https: TransportConfig::default(),
            limits: EndpointConfiguration::defaults(),
        }
    }
}

impl ApplicationConfig {
    pub fn transport(&self, kind: TransportKind) -> &TransportConfig {
        match kind {
            TransportKind::OpcTcp => &self.tcp,
            TransportKind::Https => &self.https,
        }
    }
}

/// Certificate and private key files of the application instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// DER or PEM certificate.
    pub certificate: PathBuf,
    /// PKCS#8 key, DER or PEM.
    pub private_key: PathBuf,
}

/// One advertised security mode / policy pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityOffer {
    pub mode: MessageSecurityMode,
    pub policy: SecurityPolicy,
}

impl SecurityOffer {
    pub const NONE: SecurityOffer = SecurityOffer {
        mode: MessageSecurityMode::None,
        policy: SecurityPolicy::None,
    };
}

/// Settings of one transport binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// `host:port`; defaults per transport when absent.
    pub listen_addr: Option<String>,
    /// Host name placed in advertised endpoint URLs.
    pub host_name: Option<String>,
    pub flags: BTreeSet<EngineFlag>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security: Vec<SecurityOffer>,
    /// Well-known user token policy ids.
    pub user_token_policies: Vec<String>,
    /// Certificates accepted from peers. Empty trusts everyone.
    pub trusted_certificates: Vec<PathBuf>,
    pub hostname_verification: Option<HostnameVerification>,
    pub https_policies: Vec<HttpsSecurityPolicy>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen_addr: None,
            host_name: None,
            flags: BTreeSet::new(),
            username: None,
            password: None,
            security: vec![SecurityOffer::NONE],
            user_token_policies: vec![ANONYMOUS_POLICY_ID.to_string()],
            trusted_certificates: Vec::new(),
            hostname_verification: None,
            https_policies: Vec::new(),
        }
    }
}

impl TransportConfig {
    pub fn listen_addr_for(&self, kind: TransportKind) -> String {
        self.listen_addr
            .clone()
            .unwrap_or_else(|| default_listen_addr(kind).to_string())
    }
}

pub fn default_listen_addr(kind: TransportKind) -> &'static str {
    match kind {
        TransportKind::OpcTcp => "0.0.0.0:4840",
        TransportKind::Https => "0.0.0.0:4843",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: ApplicationConfig = toml::from_str("").unwrap();
        assert_eq!(config, ApplicationConfig::default());
        assert_eq!(config.tcp.listen_addr_for(TransportKind::OpcTcp), "0.0.0.0:4840");
        assert_eq!(config.https.listen_addr_for(TransportKind::Https), "0.0.0.0:4843");
        assert_eq!(config.tcp.security, vec![SecurityOffer::NONE]);
    }

    #[test]
    fn test_partial_sections() {
        let config: ApplicationConfig = toml::from_str(
            r#"
            application_name = "Boiler"
            locales = ["en-US", "fi-FI"]

            [identity]
            certificate = "pki/own/cert.der"
            private_key = "pki/own/key.pem"

            [tcp]
            listen_addr = "127.0.0.1:0"
            flags = ["multi_thread", "reuse_address"]
            user_token_policies = ["anonymous", "username_basic256"]

            [[tcp.security]]
            mode = "SignAndEncrypt"
            policy = "Basic256Sha256"

            [https]
            username = "operator"
            https_policies = ["TLS_1_2"]
            "#,
        )
        .unwrap();

        assert_eq!(config.application_name, "Boiler");
        assert!(config.identity.is_some());
        assert!(config.tcp.flags.contains(&EngineFlag::MultiThread));
        assert_eq!(config.tcp.security.len(), 1);
        assert_eq!(config.tcp.security[0].policy, SecurityPolicy::Basic256Sha256);
        assert_eq!(config.https.username.as_deref(), Some("operator"));
        assert_eq!(config.https.user_token_policies, vec!["anonymous"]);
        assert_eq!(config.limits, EndpointConfiguration::defaults());
    }
}
