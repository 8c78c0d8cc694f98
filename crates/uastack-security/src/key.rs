//! Private keys.

use rcgen::KeyPair;
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

use uastack_types::{UaError, UaResult};

/// A PKCS#8 private key. The key bytes are wiped on drop and never printed.
#[derive(Clone)]
pub struct PrivateKey {
    pkcs8: Zeroizing<Vec<u8>>,
    public_key: Vec<u8>,
}

impl PrivateKey {
    pub fn from_pkcs8_der(der: &[u8]) -> UaResult<Self> {
        let pair = KeyPair::try_from(der)
            .map_err(|e| UaError::UnexpectedConfiguration(format!("bad private key: {e}")))?;
        Ok(Self::from_key_pair(&pair))
    }

    pub fn from_pem(pem: &str) -> UaResult<Self> {
        let pair = KeyPair::from_pem(pem)
            .map_err(|e| UaError::UnexpectedConfiguration(format!("bad private key: {e}")))?;
        Ok(Self::from_key_pair(&pair))
    }

    pub fn from_key_pair(pair: &KeyPair) -> Self {
        Self {
            pkcs8: Zeroizing::new(pair.serialize_der()),
            public_key: pair.public_key_raw().to_vec(),
        }
    }

    /// PKCS#8 DER or PEM.
    pub fn load(bytes: &[u8]) -> UaResult<Self> {
        match std::str::from_utf8(bytes) {
            Ok(text) if text.trim_start().starts_with("-----BEGIN") => Self::from_pem(text),
            _ => Self::from_pkcs8_der(bytes),
        }
    }

    pub fn load_file(path: impl AsRef<Path>) -> UaResult<Self> {
        let bytes = Zeroizing::new(std::fs::read(path)?);
        Self::load(&bytes)
    }

    /// Write the PKCS#8 DER encoding to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> UaResult<()> {
        std::fs::write(path, self.pkcs8.as_slice())?;
        Ok(())
    }

    pub fn pkcs8_der(&self) -> &[u8] {
        &self.pkcs8
    }

    /// Raw public half, comparable with [`Certificate::public_key`](crate::Certificate::public_key).
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Rebuild the signing key pair.
    pub fn key_pair(&self) -> UaResult<KeyPair> {
        KeyPair::try_from(self.pkcs8.as_slice())
            .map_err(|e| UaError::UnexpectedConfiguration(format!("bad private key: {e}")))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pkcs8", &"<redacted>")
            .field("public_key_len", &self.public_key.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_der_and_pem_agree() {
        let pair = KeyPair::generate().unwrap();
        let from_der = PrivateKey::load(&pair.serialize_der()).unwrap();
        let from_pem = PrivateKey::load(pair.serialize_pem().as_bytes()).unwrap();
        assert_eq!(from_der.public_key(), from_pem.public_key());
        assert_eq!(from_der.public_key(), pair.public_key_raw());
    }

    #[test]
    fn test_debug_redacts_key() {
        let pair = KeyPair::generate().unwrap();
        let key = PrivateKey::from_key_pair(&pair);
        let printed = format!("{key:?}");
        assert!(printed.contains("redacted"));
        assert!(!printed.contains(&format!("{:?}", key.pkcs8_der())));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            PrivateKey::load(b"definitely not a key"),
            Err(UaError::UnexpectedConfiguration(_))
        ));
    }
}
