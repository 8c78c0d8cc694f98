//! Integration tests for identities and transport security.
//!
//! Certificates are minted with rcgen for each test, so nothing here depends
//! on fixture files.

use rcgen::{CertificateParams, KeyPair};
use std::sync::Arc;
use uastack_security::{
    Certificate, Identity, PrivateKey, Thumbprint, TransportSecurity, TrustList,
};
use uastack_types::security::EngineFlag;
use uastack_types::UaError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Minted {
    cert_der: Vec<u8>,
    cert_pem: String,
    key_der: Vec<u8>,
    key_pem: String,
}

fn mint(common_name: &str) -> Minted {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![common_name.to_string()]).unwrap();
    params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    params.not_after = rcgen::date_time_ymd(2090, 1, 1);
    let cert = params.self_signed(&key).unwrap();
    Minted {
        cert_der: cert.der().to_vec(),
        cert_pem: cert.pem(),
        key_der: key.serialize_der(),
        key_pem: key.serialize_pem(),
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[test]
fn test_load_thumbprint_is_hash_of_bytes() {
    let m = mint("server");
    let identity = Identity::load(&m.cert_der, &m.key_der).unwrap();
    assert_eq!(identity.thumbprint(), Thumbprint::of(&m.cert_der));
    assert!(identity.matches(Thumbprint::of(&m.cert_der).as_bytes()));
    assert!(!identity.matches(Thumbprint::of(b"other").as_bytes()));
}

#[test]
fn test_pem_inputs_produce_same_identity() {
    let m = mint("server");
    let from_der = Identity::load(&m.cert_der, &m.key_der).unwrap();
    let from_pem = Identity::load(m.cert_pem.as_bytes(), m.key_pem.as_bytes()).unwrap();
    assert_eq!(from_der, from_pem);
}

#[test]
fn test_foreign_key_rejected() {
    let a = mint("a");
    let b = mint("b");
    let result = Identity::new(
        Certificate::load(&a.cert_der).unwrap(),
        PrivateKey::load(&b.key_der).unwrap(),
    );
    assert!(matches!(result, Err(UaError::UnexpectedConfiguration(_))));
}

#[test]
fn test_malformed_certificate_rejected() {
    let m = mint("server");
    let mut broken = m.cert_der.clone();
    broken.truncate(broken.len() / 2);
    assert!(matches!(
        Identity::load(&broken, &m.key_der),
        Err(UaError::CertificateInvalid(_))
    ));
}

#[test]
fn test_save_and_load_files() {
    let m = mint("server");
    let identity = Identity::load(&m.cert_der, &m.key_der).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("cert.der");
    let key_path = dir.path().join("key.der");
    identity.save(&cert_path, &key_path).unwrap();

    let reloaded = Identity::load_files(&cert_path, &key_path).unwrap();
    assert_eq!(reloaded, identity);
    assert_eq!(reloaded.thumbprint(), identity.thumbprint());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Identity::load_files(dir.path().join("nope.der"), dir.path().join("nope.key"));
    assert!(matches!(result, Err(UaError::Io(_))));
}

// ---------------------------------------------------------------------------
// Transport security
// ---------------------------------------------------------------------------

#[test]
fn test_overlay_identity_and_trust() {
    let m = mint("client");
    let identity = Identity::load(&m.cert_der, &m.key_der).unwrap();
    let peer = Certificate::load(&mint("peer").cert_der).unwrap();

    let mut base = TransportSecurity::tcp();
    base.set_flags([EngineFlag::MultiThread]);

    let mut overlay = TransportSecurity::tcp();
    overlay.set_identity(identity.clone(), [peer.clone()]);
    overlay.set_trust_policy(Arc::new(TrustList::from_certificates([&peer])));

    base.read_from(&overlay);
    assert_eq!(base.identity(), Some(&identity));
    assert_eq!(base.trusted_chain(), &[peer.clone()]);
    assert!(base.validate_peer(&peer).is_ok());
    assert!(base.has_flag(EngineFlag::MultiThread));

    let stranger = Certificate::load(&mint("stranger").cert_der).unwrap();
    assert!(matches!(
        base.validate_peer(&stranger),
        Err(UaError::CertificateUntrusted(_))
    ));
}

#[test]
fn test_new_instance_is_independent() {
    let mut original = TransportSecurity::https();
    original.set_flags([EngineFlag::ReuseAddress]);

    let mut copy = TransportSecurity::new_instance_from(&original);
    copy.set_flags([EngineFlag::MultiThread]);

    assert!(original.has_flag(EngineFlag::ReuseAddress));
    assert!(!original.has_flag(EngineFlag::MultiThread));
    assert_eq!(copy.kind(), original.kind());
}
