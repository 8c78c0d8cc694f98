//! User token policies, endpoint and application descriptions.

use serde::{Deserialize, Serialize};

use crate::error::UaResult;
use crate::identifiers as id;
use crate::locale::LocalizedText;
use crate::security::{MessageSecurityMode, SecurityPolicy, UserTokenType};
use crate::structure::base_structure;

pub const ANONYMOUS_POLICY_ID: &str = "anonymous";
pub const USERNAME_BASIC128_POLICY_ID: &str = "username_basic128";
pub const USERNAME_BASIC256_POLICY_ID: &str = "username_basic256";
pub const CERTIFICATE_BASIC128_POLICY_ID: &str = "certificate_basic128";
pub const CERTIFICATE_BASIC256_POLICY_ID: &str = "certificate_basic256";

/// A declared way for a user to authenticate against an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserTokenPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    pub token_type: UserTokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_endpoint_url: Option<String>,
    /// Security policy the token must be protected with. Absent means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_policy_uri: Option<String>,
}

impl UserTokenPolicy {
    pub fn new(
        policy_id: impl Into<String>,
        token_type: UserTokenType,
        security_policy: Option<SecurityPolicy>,
    ) -> Self {
        Self {
            policy_id: Some(policy_id.into()),
            token_type,
            issued_token_type: None,
            issuer_endpoint_url: None,
            security_policy_uri: security_policy.map(|p| p.uri().to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_POLICY_ID, UserTokenType::Anonymous, None)
    }

    pub fn secure_username_password() -> Self {
        Self::new(
            USERNAME_BASIC128_POLICY_ID,
            UserTokenType::UserName,
            Some(SecurityPolicy::Basic128Rsa15),
        )
    }

    pub fn secure_username_password_basic256() -> Self {
        Self::new(
            USERNAME_BASIC256_POLICY_ID,
            UserTokenType::UserName,
            Some(SecurityPolicy::Basic256),
        )
    }

    pub fn secure_certificate() -> Self {
        Self::new(
            CERTIFICATE_BASIC128_POLICY_ID,
            UserTokenType::Certificate,
            Some(SecurityPolicy::Basic128Rsa15),
        )
    }

    pub fn secure_certificate_basic256() -> Self {
        Self::new(
            CERTIFICATE_BASIC256_POLICY_ID,
            UserTokenType::Certificate,
            Some(SecurityPolicy::Basic256),
        )
    }

    /// The five well-known policies, in a stable order.
    pub fn well_known() -> [UserTokenPolicy; 5] {
        [
            Self::anonymous(),
            Self::secure_username_password(),
            Self::secure_username_password_basic256(),
            Self::secure_certificate(),
            Self::secure_certificate_basic256(),
        ]
    }

    pub fn well_known_by_id(policy_id: &str) -> Option<UserTokenPolicy> {
        Self::well_known()
            .into_iter()
            .find(|p| p.policy_id.as_deref() == Some(policy_id))
    }

    /// Resolve the bound security policy; absent or empty means `None`.
    pub fn security_policy(&self) -> UaResult<SecurityPolicy> {
        SecurityPolicy::from_optional_uri(self.security_policy_uri.as_deref())
    }
}

base_structure!(
    UserTokenPolicy,
    id::USER_TOKEN_POLICY,
    id::USER_TOKEN_POLICY_ENCODING_BINARY,
    id::USER_TOKEN_POLICY_ENCODING_XML
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationType {
    #[default]
    Server,
    Client,
    ClientAndServer,
    DiscoveryServer,
}

/// How an application describes itself to peers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDescription {
    pub application_uri: String,
    pub product_uri: String,
    pub application_name: LocalizedText,
    pub application_type: ApplicationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_server_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_profile_uri: Option<String>,
    pub discovery_urls: Vec<String>,
}

base_structure!(
    ApplicationDescription,
    id::APPLICATION_DESCRIPTION,
    id::APPLICATION_DESCRIPTION_ENCODING_BINARY,
    id::APPLICATION_DESCRIPTION_ENCODING_XML
);

/// A server-advertised combination of address, security and accepted
/// user authentication methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointDescription {
    pub endpoint_url: String,
    pub server: ApplicationDescription,
    /// DER bytes of the server's application instance certificate.
    #[serde(
        with = "crate::bytes::opt_base64_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_certificate: Option<Vec<u8>>,
    pub security_mode: MessageSecurityMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_policy_uri: Option<String>,
    /// Accepted user token policies. Entries may be absent.
    pub user_identity_tokens: Vec<Option<UserTokenPolicy>>,
    pub transport_profile_uri: String,
    pub security_level: u8,
}

impl EndpointDescription {
    /// Resolve the endpoint's own security policy; absent means `None`.
    pub fn security_policy(&self) -> UaResult<SecurityPolicy> {
        SecurityPolicy::from_optional_uri(self.security_policy_uri.as_deref())
    }

    /// The present token policies, in order.
    pub fn token_policies(&self) -> impl Iterator<Item = &UserTokenPolicy> {
        self.user_identity_tokens.iter().flatten()
    }
}

base_structure!(
    EndpointDescription,
    id::ENDPOINT_DESCRIPTION,
    id::ENDPOINT_DESCRIPTION_ENCODING_BINARY,
    id::ENDPOINT_DESCRIPTION_ENCODING_XML
);

/// Transport and encoding limits an endpoint is operated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfiguration {
    /// Milliseconds.
    pub operation_timeout: i32,
    pub use_binary_encoding: bool,
    pub max_array_length: u32,
    pub max_byte_string_length: u32,
    pub max_message_size: u32,
    pub max_string_length: u32,
    pub max_buffer_size: u32,
    /// Milliseconds.
    pub channel_lifetime: u32,
    /// Milliseconds.
    pub security_token_lifetime: u32,
}

impl EndpointConfiguration {
    pub fn defaults() -> Self {
        Self {
            operation_timeout: 120_000,
            use_binary_encoding: true,
            max_array_length: 65_535,
            max_byte_string_length: 65_535 * 16,
            max_message_size: 65_535 * 64,
            max_string_length: 65_535,
            max_buffer_size: 65_535,
            channel_lifetime: 120_000,
            security_token_lifetime: 3_600_000,
        }
    }
}

impl Default for EndpointConfiguration {
    fn default() -> Self {
        Self::defaults()
    }
}

base_structure!(
    EndpointConfiguration,
    id::ENDPOINT_CONFIGURATION,
    id::ENDPOINT_CONFIGURATION_ENCODING_BINARY,
    id::ENDPOINT_CONFIGURATION_ENCODING_XML
);

/// A software certificate together with its issuer's signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedSoftwareCertificate {
    #[serde(with = "crate::bytes::base64_bytes")]
    pub certificate_data: Vec<u8>,
    #[serde(with = "crate::bytes::base64_bytes")]
    pub signature: Vec<u8>,
}

base_structure!(
    SignedSoftwareCertificate,
    id::SIGNED_SOFTWARE_CERTIFICATE,
    id::SIGNED_SOFTWARE_CERTIFICATE_ENCODING_BINARY,
    id::SIGNED_SOFTWARE_CERTIFICATE_ENCODING_XML
);
