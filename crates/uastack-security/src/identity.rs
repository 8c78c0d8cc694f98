//! Application identities: a certificate with its matching private key.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use uastack_types::{UaError, UaResult};

use crate::cert::Certificate;
use crate::key::PrivateKey;
use crate::thumbprint::Thumbprint;

/// An immutable certificate + private key pair.
///
/// The key always matches the certificate's public key; an identity with a
/// foreign key cannot be constructed. Two identities are equal when their
/// certificates have the same encoding.
#[derive(Clone)]
pub struct Identity {
    certificate: Certificate,
    private_key: Arc<PrivateKey>,
}

impl Identity {
    pub fn new(certificate: Certificate, private_key: PrivateKey) -> UaResult<Self> {
        if certificate.public_key() != private_key.public_key() {
            return Err(UaError::UnexpectedConfiguration(format!(
                "private key does not match certificate {}",
                certificate.subject()
            )));
        }
        debug!(
            thumbprint = %certificate.thumbprint(),
            subject = %certificate.subject(),
            "Identity created"
        );
        Ok(Self {
            certificate,
            private_key: Arc::new(private_key),
        })
    }

    /// Build from raw certificate bytes (DER or PEM) and key bytes.
    pub fn load(cert_bytes: &[u8], key_bytes: &[u8]) -> UaResult<Self> {
        Self::new(Certificate::load(cert_bytes)?, PrivateKey::load(key_bytes)?)
    }

    pub fn load_files(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> UaResult<Self> {
        Self::new(
            Certificate::load_file(cert_path)?,
            PrivateKey::load_file(key_path)?,
        )
    }

    /// Write the certificate (DER) and key (PKCS#8 DER).
    pub fn save(&self, cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> UaResult<()> {
        self.certificate.save(cert_path)?;
        self.private_key.save(key_path)
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn thumbprint(&self) -> Thumbprint {
        self.certificate.thumbprint()
    }

    pub fn matches(&self, thumbprint: &[u8]) -> bool {
        self.certificate.thumbprint().matches(thumbprint)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.certificate == other.certificate
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.certificate.hash(state);
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("certificate", &self.certificate)
            .finish_non_exhaustive()
    }
}
