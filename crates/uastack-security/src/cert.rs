//! X.509 certificates.
//!
//! Parsing is delegated to `x509-parser`; this module only keeps the pieces
//! the stack needs: the encoded bytes, the thumbprint, the subject, the
//! validity window and the subject public key.

use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use uastack_types::{UaError, UaResult};

use crate::thumbprint::Thumbprint;

/// Maximum accepted certificate size.
pub const MAX_CERT_SIZE: usize = 64 * 1024;

const PEM_LABEL: &str = "CERTIFICATE";

/// A decoded certificate. Cheap to clone.
#[derive(Clone)]
pub struct Certificate {
    der: Arc<[u8]>,
    thumbprint: Thumbprint,
    subject: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    public_key: Arc<[u8]>,
    key_bits: usize,
}

impl Certificate {
    /// Structural decode of a DER or PEM certificate. The validity window is
    /// not checked; see [`load`](Self::load).
    pub fn decode(bytes: &[u8]) -> UaResult<Self> {
        if bytes.len() > MAX_CERT_SIZE {
            return Err(UaError::CertificateInvalid(format!(
                "certificate too large: {} bytes (max {MAX_CERT_SIZE})",
                bytes.len()
            )));
        }
        if is_pem(bytes) {
            let (_, pem) = parse_x509_pem(bytes)
                .map_err(|e| UaError::CertificateInvalid(format!("bad PEM: {e:?}")))?;
            if pem.label != PEM_LABEL {
                return Err(UaError::CertificateInvalid(format!(
                    "expected a {PEM_LABEL} PEM block, found {}",
                    pem.label
                )));
            }
            return Self::decode_der(&pem.contents);
        }
        Self::decode_der(bytes)
    }

    fn decode_der(bytes: &[u8]) -> UaResult<Self> {
        let (rest, cert) = X509Certificate::from_der(bytes)
            .map_err(|e| UaError::CertificateInvalid(format!("{e:?}")))?;
        let der = &bytes[..bytes.len() - rest.len()];

        let validity = cert.validity();
        let not_before = to_utc(validity.not_before.timestamp())?;
        let not_after = to_utc(validity.not_after.timestamp())?;
        let spki = cert.public_key();
        let key_bits = match spki.parsed() {
            Ok(PublicKey::RSA(rsa)) => rsa.key_size(),
            Ok(PublicKey::EC(ec)) => ec.key_size(),
            _ => 0,
        };

        Ok(Self {
            der: Arc::from(der),
            thumbprint: Thumbprint::of(der),
            subject: cert.subject().to_string(),
            not_before,
            not_after,
            public_key: Arc::from(&spki.subject_public_key.data[..]),
            key_bits,
        })
    }

    /// Decode and require the validity window to include the current time.
    pub fn load(bytes: &[u8]) -> UaResult<Self> {
        let cert = Self::decode(bytes)?;
        cert.check_validity_at(Utc::now())?;
        Ok(cert)
    }

    pub fn load_file(path: impl AsRef<Path>) -> UaResult<Self> {
        Self::load(&std::fs::read(path)?)
    }

    /// Structural decode of a certificate file, without the time check.
    pub fn decode_file(path: impl AsRef<Path>) -> UaResult<Self> {
        Self::decode(&std::fs::read(path)?)
    }

    pub fn check_validity_at(&self, now: DateTime<Utc>) -> UaResult<()> {
        if now < self.not_before {
            return Err(UaError::CertificateTimeInvalid(format!(
                "{} is not valid before {}",
                self.subject, self.not_before
            )));
        }
        if now > self.not_after {
            return Err(UaError::CertificateTimeInvalid(format!(
                "{} expired at {}",
                self.subject, self.not_after
            )));
        }
        Ok(())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.check_validity_at(now).is_ok()
    }

    /// The DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn thumbprint(&self) -> Thumbprint {
        self.thumbprint
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Raw subject public key (the contents of the SPKI bit string).
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Public key size in bits, 0 if the algorithm is not recognised.
    pub fn key_bits(&self) -> usize {
        self.key_bits
    }

    /// PEM armoring with LF line endings.
    pub fn to_pem(&self) -> String {
        let block = ::pem::Pem::new(PEM_LABEL, self.der.to_vec());
        ::pem::encode_config(
            &block,
            ::pem::EncodeConfig::new().set_line_ending(::pem::LineEnding::LF),
        )
    }

    /// Write the DER encoding to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> UaResult<()> {
        std::fs::write(path, &self.der)?;
        Ok(())
    }

    pub fn save_pem(&self, path: impl AsRef<Path>) -> UaResult<()> {
        std::fs::write(path, self.to_pem())?;
        Ok(())
    }
}

fn is_pem(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(b"-----BEGIN")
}

fn to_utc(timestamp: i64) -> UaResult<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        UaError::CertificateInvalid(format!("validity timestamp {timestamp} out of range"))
    })
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.thumbprint.hash(state);
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("thumbprint", &self.thumbprint)
            .field("not_after", &self.not_after)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, KeyPair};

    fn self_signed(not_before: (i32, u8, u8), not_after: (i32, u8, u8)) -> Vec<u8> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        params.not_before = rcgen::date_time_ymd(not_before.0, not_before.1, not_before.2);
        params.not_after = rcgen::date_time_ymd(not_after.0, not_after.1, not_after.2);
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn test_thumbprint_is_hash_of_der() {
        let der = self_signed((2020, 1, 1), (2090, 1, 1));
        let cert = Certificate::load(&der).unwrap();
        assert_eq!(cert.thumbprint(), Thumbprint::of(&der));
        assert_eq!(cert.der(), &der[..]);
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            Certificate::decode(b"not a certificate"),
            Err(UaError::CertificateInvalid(_))
        ));
        assert!(matches!(
            Certificate::decode(&vec![0u8; MAX_CERT_SIZE + 1]),
            Err(UaError::CertificateInvalid(_))
        ));
    }

    #[test]
    fn test_expired_is_time_invalid_but_decodes() {
        let der = self_signed((2000, 1, 1), (2001, 1, 1));
        assert!(matches!(
            Certificate::load(&der),
            Err(UaError::CertificateTimeInvalid(_))
        ));
        let cert = Certificate::decode(&der).unwrap();
        assert!(!cert.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_not_yet_valid() {
        let der = self_signed((2090, 1, 1), (2095, 1, 1));
        assert!(matches!(
            Certificate::load(&der),
            Err(UaError::CertificateTimeInvalid(_))
        ));
    }

    #[test]
    fn test_pem_and_der_agree() {
        let der = self_signed((2020, 1, 1), (2090, 1, 1));
        let cert = Certificate::load(&der).unwrap();
        let from_pem = Certificate::load(cert.to_pem().as_bytes()).unwrap();
        assert_eq!(cert, from_pem);
        assert!(cert.key_bits() > 0);
    }

    #[test]
    fn test_pem_matches_rcgen_armoring() {
        let key = KeyPair::generate().unwrap();
        let params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        let generated = params.self_signed(&key).unwrap();
        let cert = Certificate::decode(generated.der()).unwrap();

        let ours = cert.to_pem();
        assert!(!ours.contains('\r'));
        assert!(ours.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(ours.ends_with("-----END CERTIFICATE-----\n"));
        assert!(ours.lines().all(|line| line.len() <= 64));
        assert_eq!(ours, generated.pem().replace("\r\n", "\n"));
    }
}
