//! Endpoint negotiation against realistic endpoint descriptions.

use uastack_security::{EndpointExt, EndpointNegotiator};
use uastack_types::endpoint::{EndpointDescription, UserTokenPolicy};
use uastack_types::security::{MessageSecurityMode, SecurityPolicy, UserTokenType};

fn secured_endpoint() -> EndpointDescription {
    EndpointDescription {
        endpoint_url: "opc.tcp://plant:4840".into(),
        security_mode: MessageSecurityMode::SignAndEncrypt,
        security_policy_uri: Some(SecurityPolicy::Basic256Sha256.uri().into()),
        user_identity_tokens: vec![
            Some(UserTokenPolicy {
                policy_id: Some("cert_future".into()),
                token_type: UserTokenType::Certificate,
                issued_token_type: None,
                issuer_endpoint_url: None,
                security_policy_uri: Some(
                    "http://opcfoundation.org/UA/SecurityPolicy#FuturePolicy".into(),
                ),
            }),
            Some(UserTokenPolicy::secure_username_password_basic256()),
            Some(UserTokenPolicy::secure_certificate_basic256()),
        ],
        ..Default::default()
    }
}

#[test]
fn test_skip_and_continue_finds_later_entry() {
    let endpoint = secured_endpoint();
    let user = endpoint
        .find_user_token_policy(UserTokenType::UserName)
        .unwrap();
    assert_eq!(user.policy_id.as_deref(), Some("username_basic256"));

    let cert = endpoint
        .find_user_token_policy(UserTokenType::Certificate)
        .unwrap();
    assert_eq!(cert.policy_id.as_deref(), Some("certificate_basic256"));
}

#[test]
fn test_disabling_policy_removes_options() {
    let endpoint = secured_endpoint();
    let negotiator = EndpointNegotiator::with_disabled([SecurityPolicy::Basic256]);
    assert!(!negotiator.supports(&endpoint, UserTokenType::UserName));
    assert!(!negotiator.supports(&endpoint, UserTokenType::Certificate));
    assert!(negotiator.requires_certificate(&endpoint));
}

#[test]
fn test_anonymous_plain_endpoint_needs_no_certificate() {
    let endpoint = EndpointDescription {
        security_mode: MessageSecurityMode::None,
        user_identity_tokens: vec![Some(UserTokenPolicy::anonymous())],
        ..Default::default()
    };
    assert!(!endpoint.needs_certificate());
    assert!(endpoint.supports_user_token_type(UserTokenType::Anonymous));
    assert!(!endpoint.supports_user_token_type(UserTokenType::IssuedToken));
}

#[test]
fn test_negotiator_is_shareable_across_threads() {
    let negotiator = std::sync::Arc::new(EndpointNegotiator::new());
    let endpoint = std::sync::Arc::new(secured_endpoint());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let negotiator = negotiator.clone();
            let endpoint = endpoint.clone();
            std::thread::spawn(move || negotiator.supports(&endpoint, UserTokenType::UserName))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
