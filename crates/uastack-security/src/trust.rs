//! Trust policies for peer certificates.

use chrono::Utc;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

use uastack_types::{UaError, UaResult};

use crate::cert::Certificate;
use crate::thumbprint::Thumbprint;

/// Decides whether a peer certificate is acceptable.
pub trait CertificateValidator: Send + Sync + fmt::Debug {
    fn validate(&self, certificate: &Certificate) -> UaResult<()>;
}

/// Accepts every certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CertificateValidator for AllowAll {
    fn validate(&self, _certificate: &Certificate) -> UaResult<()> {
        Ok(())
    }
}

/// Accepts only certificates whose thumbprint is on the list.
#[derive(Debug, Clone, Default)]
pub struct TrustList {
    trusted: BTreeSet<Thumbprint>,
    check_time: bool,
}

impl TrustList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_certificates<'a>(certificates: impl IntoIterator<Item = &'a Certificate>) -> Self {
        let mut list = Self::new();
        for cert in certificates {
            list.trust(cert.thumbprint());
        }
        list
    }

    pub fn trust(&mut self, thumbprint: Thumbprint) {
        self.trusted.insert(thumbprint);
    }

    pub fn revoke(&mut self, thumbprint: &Thumbprint) -> bool {
        self.trusted.remove(thumbprint)
    }

    /// Also reject certificates outside their validity window.
    pub fn with_time_check(mut self, enabled: bool) -> Self {
        self.check_time = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.trusted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trusted.is_empty()
    }
}

impl CertificateValidator for TrustList {
    fn validate(&self, certificate: &Certificate) -> UaResult<()> {
        let thumbprint = certificate.thumbprint();
        if !self.trusted.contains(&thumbprint) {
            warn!(%thumbprint, subject = %certificate.subject(), "Rejected untrusted certificate");
            return Err(UaError::CertificateUntrusted(format!(
                "{} ({thumbprint}) is not on the trust list",
                certificate.subject()
            )));
        }
        if self.check_time {
            certificate.check_validity_at(Utc::now())?;
        }
        debug!(%thumbprint, "Certificate trusted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, KeyPair};

    fn cert(not_after_year: i32) -> Certificate {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["peer".to_string()]).unwrap();
        params.not_before = rcgen::date_time_ymd(2000, 1, 1);
        params.not_after = rcgen::date_time_ymd(not_after_year, 1, 1);
        Certificate::decode(params.self_signed(&key).unwrap().der()).unwrap()
    }

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.validate(&cert(2090)).is_ok());
    }

    #[test]
    fn test_trust_list_membership() {
        let known = cert(2090);
        let stranger = cert(2090);
        let mut list = TrustList::from_certificates([&known]);
        assert!(list.validate(&known).is_ok());
        assert!(matches!(
            list.validate(&stranger),
            Err(UaError::CertificateUntrusted(_))
        ));
        assert!(list.revoke(&known.thumbprint()));
        assert!(list.validate(&known).is_err());
    }

    #[test]
    fn test_trust_list_time_check() {
        let expired = cert(2001);
        let lenient = TrustList::from_certificates([&expired]);
        assert!(lenient.validate(&expired).is_ok());
        let strict = lenient.with_time_check(true);
        assert!(matches!(
            strict.validate(&expired),
            Err(UaError::CertificateTimeInvalid(_))
        ));
    }
}
