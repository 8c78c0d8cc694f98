//! Shared error types for the uastack layers.

use crate::status::StatusCode;
use thiserror::Error;

/// Top-level error type for identity, negotiation and decoding.
#[derive(Error, Debug)]
pub enum UaError {
    /// A certificate could not be decoded.
    #[error("Certificate invalid: {0}")]
    CertificateInvalid(String),

    /// A certificate's validity window does not include the current time.
    #[error("Certificate time invalid: {0}")]
    CertificateTimeInvalid(String),

    /// A certificate was rejected by a trust policy.
    #[error("Certificate untrusted: {0}")]
    CertificateUntrusted(String),

    /// Local programmer or deployment error (unknown scheme, identity without key, ...).
    #[error("Unexpected configuration: {0}")]
    UnexpectedConfiguration(String),

    /// A node id could not be mapped to or from a namespace.
    #[error("Unresolved namespace: {0}")]
    UnresolvedNamespace(String),

    /// A payload type id is not known to the type registry.
    #[error("Unknown payload type: {0}")]
    UnknownPayloadType(String),

    /// A security policy URI is not recognized by this stack.
    #[error("Unsupported security policy: {0}")]
    UnsupportedSecurityPolicy(String),

    /// A value could not be encoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A value could not be decoded.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UaError {
    /// The status code reported to remote peers for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UaError::CertificateInvalid(_) => StatusCode::BAD_CERTIFICATE_INVALID,
            UaError::CertificateTimeInvalid(_) => StatusCode::BAD_CERTIFICATE_TIME_INVALID,
            UaError::CertificateUntrusted(_) => StatusCode::BAD_CERTIFICATE_UNTRUSTED,
            UaError::UnexpectedConfiguration(_) => StatusCode::BAD_UNEXPECTED_ERROR,
            UaError::UnresolvedNamespace(_) => StatusCode::BAD_NOT_FOUND,
            UaError::UnknownPayloadType(_) => StatusCode::BAD_DATA_TYPE_ID_UNKNOWN,
            UaError::UnsupportedSecurityPolicy(_) => StatusCode::BAD_SECURITY_POLICY_REJECTED,
            UaError::Encoding(_) => StatusCode::BAD_ENCODING_ERROR,
            UaError::Decoding(_) => StatusCode::BAD_DECODING_ERROR,
            UaError::Io(_) => StatusCode::BAD_COMMUNICATION_ERROR,
        }
    }
}

/// Alias for Result with UaError.
pub type UaResult<T> = Result<T, UaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_errors_map_to_distinct_codes() {
        let invalid = UaError::CertificateInvalid("garbage".into());
        let expired = UaError::CertificateTimeInvalid("expired".into());
        assert_ne!(invalid.status_code(), expired.status_code());
        assert_eq!(invalid.status_code(), StatusCode::BAD_CERTIFICATE_INVALID);
    }

    #[test]
    fn test_display_includes_detail() {
        let err = UaError::UnexpectedConfiguration("no server for scheme ftp".into());
        assert!(err.to_string().contains("ftp"));
    }
}
