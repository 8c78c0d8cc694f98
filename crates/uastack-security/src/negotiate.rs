//! Endpoint security negotiation.
//!
//! Pure decisions over an endpoint's security mode and accepted user token
//! policies: which policy a client should use for a credential type, whether
//! a certificate is needed at all, and which endpoints answer a discovery
//! request. Nothing here locks or allocates shared state.

use std::collections::BTreeSet;
use tracing::debug;

use uastack_types::discovery::GetEndpointsRequest;
use uastack_types::endpoint::{EndpointDescription, UserTokenPolicy};
use uastack_types::security::{SecurityPolicy, UserTokenType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointNegotiator {
    disabled: BTreeSet<SecurityPolicy>,
}

impl EndpointNegotiator {
    /// A negotiator that accepts every security policy this stack knows.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disabled(policies: impl IntoIterator<Item = SecurityPolicy>) -> Self {
        Self {
            disabled: policies.into_iter().collect(),
        }
    }

    pub fn disable(&mut self, policy: SecurityPolicy) {
        self.disabled.insert(policy);
    }

    pub fn is_enabled(&self, policy: SecurityPolicy) -> bool {
        !self.disabled.contains(&policy)
    }

    /// Whether this stack can protect a token under `policy`'s security
    /// policy. Unknown and disabled URIs are both unusable.
    fn can_use(&self, policy: &UserTokenPolicy) -> bool {
        match policy.security_policy() {
            Ok(resolved) if self.is_enabled(resolved) => true,
            Ok(resolved) => {
                debug!(policy_id = ?policy.policy_id, %resolved, "Skipping disabled security policy");
                false
            }
            Err(e) => {
                debug!(policy_id = ?policy.policy_id, error = %e, "Skipping unknown security policy");
                false
            }
        }
    }

    /// First token policy of `token_type` whose security policy is usable.
    pub fn find_policy_for<'a>(
        &self,
        endpoint: &'a EndpointDescription,
        token_type: UserTokenType,
    ) -> Option<&'a UserTokenPolicy> {
        endpoint
            .token_policies()
            .filter(|p| self.can_use(p))
            .find(|p| p.token_type == token_type)
    }

    pub fn supports(&self, endpoint: &EndpointDescription, token_type: UserTokenType) -> bool {
        self.find_policy_for(endpoint, token_type).is_some()
    }

    /// True when the endpoint signs messages or accepts any token that needs
    /// transport or message security.
    pub fn requires_certificate(&self, endpoint: &EndpointDescription) -> bool {
        endpoint.security_mode.has_signing() || endpoint.token_policies().any(is_secure_token_policy)
    }

    /// Exact policy id match; the first match wins and absent entries are skipped.
    pub fn find_policy_by_id<'a>(
        &self,
        endpoint: &'a EndpointDescription,
        policy_id: &str,
    ) -> Option<&'a UserTokenPolicy> {
        endpoint
            .token_policies()
            .find(|p| p.policy_id.as_deref() == Some(policy_id))
    }

    /// Whether `endpoint` answers a discovery request. An empty profile list
    /// matches every transport.
    pub fn matches_request(endpoint: &EndpointDescription, request: &GetEndpointsRequest) -> bool {
        request.profile_uris.is_empty()
            || request
                .profile_uris
                .iter()
                .any(|uri| *uri == endpoint.transport_profile_uri)
    }

    pub fn filter_endpoints(
        endpoints: &[EndpointDescription],
        request: &GetEndpointsRequest,
    ) -> Vec<EndpointDescription> {
        endpoints
            .iter()
            .filter(|e| Self::matches_request(e, request))
            .cloned()
            .collect()
    }
}

/// A `Certificate` token, or any token bound to a security policy other than `None`.
fn is_secure_token_policy(policy: &UserTokenPolicy) -> bool {
    if policy.token_type == UserTokenType::Certificate {
        return true;
    }
    match policy.security_policy_uri.as_deref() {
        None | Some("") => false,
        Some(uri) => uri != SecurityPolicy::None.uri(),
    }
}

/// Negotiation queries on an endpoint, using a negotiator with every known
/// policy enabled.
pub trait EndpointExt {
    fn supports_user_token_type(&self, token_type: UserTokenType) -> bool;
    fn find_user_token_policy(&self, token_type: UserTokenType) -> Option<&UserTokenPolicy>;
    fn find_user_token_policy_by_id(&self, policy_id: &str) -> Option<&UserTokenPolicy>;
    fn needs_certificate(&self) -> bool;
}

impl EndpointExt for EndpointDescription {
    fn supports_user_token_type(&self, token_type: UserTokenType) -> bool {
        EndpointNegotiator::new().supports(self, token_type)
    }

    fn find_user_token_policy(&self, token_type: UserTokenType) -> Option<&UserTokenPolicy> {
        EndpointNegotiator::new().find_policy_for(self, token_type)
    }

    fn find_user_token_policy_by_id(&self, policy_id: &str) -> Option<&UserTokenPolicy> {
        EndpointNegotiator::new().find_policy_by_id(self, policy_id)
    }

    fn needs_certificate(&self) -> bool {
        EndpointNegotiator::new().requires_certificate(self)
    }
}
