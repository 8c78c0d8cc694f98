//! Security enums: message security modes, security policies, user token
//! types, HTTPS policies, and transport selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{UaError, UaResult};

/// Whether messages on a channel are signed, signed and encrypted, or neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSecurityMode {
    Invalid = 0,
    #[default]
    None = 1,
    Sign = 2,
    SignAndEncrypt = 3,
}

impl MessageSecurityMode {
    pub fn has_signing(self) -> bool {
        matches!(self, Self::Sign | Self::SignAndEncrypt)
    }

    pub fn has_encryption(self) -> bool {
        matches!(self, Self::SignAndEncrypt)
    }
}

const POLICY_PREFIX: &str = "http://opcfoundation.org/UA/SecurityPolicy#";

/// Security policies this stack knows by URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SecurityPolicy {
    None,
    Basic128Rsa15,
    Basic256,
    Basic256Sha256,
    Aes128Sha256RsaOaep,
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    pub const ALL: [SecurityPolicy; 6] = [
        SecurityPolicy::None,
        SecurityPolicy::Basic128Rsa15,
        SecurityPolicy::Basic256,
        SecurityPolicy::Basic256Sha256,
        SecurityPolicy::Aes128Sha256RsaOaep,
        SecurityPolicy::Aes256Sha256RsaPss,
    ];

    pub fn uri(self) -> &'static str {
        match self {
            Self::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            Self::Basic128Rsa15 => "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15",
            Self::Basic256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256",
            Self::Basic256Sha256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256",
            Self::Aes128Sha256RsaOaep => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep"
            }
            Self::Aes256Sha256RsaPss => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss"
            }
        }
    }

    /// Look up a policy by URI.
    pub fn from_uri(uri: &str) -> UaResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.uri() == uri)
            .ok_or_else(|| UaError::UnsupportedSecurityPolicy(uri.to_string()))
    }

    /// Like [`from_uri`](Self::from_uri), but an absent or empty URI means
    /// [`SecurityPolicy::None`].
    pub fn from_optional_uri(uri: Option<&str>) -> UaResult<Self> {
        match uri {
            None | Some("") => Ok(Self::None),
            Some(uri) => Self::from_uri(uri),
        }
    }

    /// Short name, the URI fragment after `#`.
    pub fn name(self) -> &'static str {
        &self.uri()[POLICY_PREFIX.len()..]
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityPolicy {
    type Err = UaError;

    /// Accepts either the full URI or the short name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with(POLICY_PREFIX) {
            return Self::from_uri(s);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UaError::UnsupportedSecurityPolicy(s.to_string()))
    }
}

impl TryFrom<String> for SecurityPolicy {
    type Error = UaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SecurityPolicy> for String {
    fn from(policy: SecurityPolicy) -> Self {
        policy.uri().to_string()
    }
}

/// Kinds of user authentication a token policy can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserTokenType {
    Anonymous = 0,
    UserName = 1,
    Certificate = 2,
    IssuedToken = 3,
}

/// TLS profiles an HTTPS endpoint may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpsSecurityPolicy {
    #[serde(rename = "TLS_1_0")]
    Tls10,
    #[serde(rename = "TLS_1_1")]
    Tls11,
    #[serde(rename = "TLS_1_2")]
    Tls12,
    #[serde(rename = "TLS_1_2_PFS")]
    Tls12Pfs,
}

/// How an HTTPS client checks the server host name against its certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostnameVerification {
    #[default]
    Strict,
    AllowAll,
}

/// Engine-specific knobs of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineFlag {
    /// Handle connections concurrently instead of one after another.
    MultiThread,
    /// Set `SO_REUSEADDR` on the listening socket.
    ReuseAddress,
}

pub const SCHEME_OPC_TCP: &str = "opc.tcp";
pub const SCHEME_HTTP: &str = "http";
pub const SCHEME_HTTPS: &str = "https";

pub const TRANSPORT_PROFILE_UATCP: &str =
    "http://opcfoundation.org/UA-Profile/Transport/uatcp-uasc-uabinary";
pub const TRANSPORT_PROFILE_HTTPS: &str =
    "http://opcfoundation.org/UA-Profile/Transport/https-uabinary";

/// The two transports an application can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    OpcTcp,
    Https,
}

impl TransportKind {
    /// Map a URL scheme to its transport. `http` and `https` share one.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            SCHEME_OPC_TCP => Some(Self::OpcTcp),
            SCHEME_HTTP | SCHEME_HTTPS => Some(Self::Https),
            _ => None,
        }
    }

    /// The scheme used in advertised endpoint URLs.
    pub fn scheme(self) -> &'static str {
        match self {
            Self::OpcTcp => SCHEME_OPC_TCP,
            Self::Https => SCHEME_HTTPS,
        }
    }

    pub fn transport_profile_uri(self) -> &'static str {
        match self {
            Self::OpcTcp => TRANSPORT_PROFILE_UATCP,
            Self::Https => TRANSPORT_PROFILE_HTTPS,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}
