//! Status codes reported on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-bit status code. The top two bits carry the severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x8001_0000);
    pub const BAD_COMMUNICATION_ERROR: StatusCode = StatusCode(0x8005_0000);
    pub const BAD_ENCODING_ERROR: StatusCode = StatusCode(0x8006_0000);
    pub const BAD_DECODING_ERROR: StatusCode = StatusCode(0x8007_0000);
    pub const BAD_SERVICE_UNSUPPORTED: StatusCode = StatusCode(0x800B_0000);
    pub const BAD_DATA_TYPE_ID_UNKNOWN: StatusCode = StatusCode(0x8011_0000);
    pub const BAD_CERTIFICATE_INVALID: StatusCode = StatusCode(0x8012_0000);
    pub const BAD_CERTIFICATE_TIME_INVALID: StatusCode = StatusCode(0x8014_0000);
    pub const BAD_CERTIFICATE_UNTRUSTED: StatusCode = StatusCode(0x801A_0000);
    pub const BAD_NOT_FOUND: StatusCode = StatusCode(0x803E_0000);
    pub const BAD_SECURITY_POLICY_REJECTED: StatusCode = StatusCode(0x8055_0000);
    pub const BAD_TCP_MESSAGE_TOO_LARGE: StatusCode = StatusCode(0x8080_0000);
    pub const BAD_CONFIGURATION_ERROR: StatusCode = StatusCode(0x8089_0000);

    /// True when the severity bits say "good".
    pub fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// True when the severity bits say "bad".
    pub fn is_bad(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Symbolic name for the codes this stack produces.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::GOOD => "Good",
            Self::BAD_UNEXPECTED_ERROR => "Bad_UnexpectedError",
            Self::BAD_COMMUNICATION_ERROR => "Bad_CommunicationError",
            Self::BAD_ENCODING_ERROR => "Bad_EncodingError",
            Self::BAD_DECODING_ERROR => "Bad_DecodingError",
            Self::BAD_SERVICE_UNSUPPORTED => "Bad_ServiceUnsupported",
            Self::BAD_DATA_TYPE_ID_UNKNOWN => "Bad_DataTypeIdUnknown",
            Self::BAD_CERTIFICATE_INVALID => "Bad_CertificateInvalid",
            Self::BAD_CERTIFICATE_TIME_INVALID => "Bad_CertificateTimeInvalid",
            Self::BAD_CERTIFICATE_UNTRUSTED => "Bad_CertificateUntrusted",
            Self::BAD_NOT_FOUND => "Bad_NotFound",
            Self::BAD_SECURITY_POLICY_REJECTED => "Bad_SecurityPolicyRejected",
            Self::BAD_TCP_MESSAGE_TOO_LARGE => "Bad_TcpMessageTooLarge",
            Self::BAD_CONFIGURATION_ERROR => "Bad_ConfigurationError",
            _ => return None,
        };
        Some(name)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::GOOD
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:08X})", self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bits() {
        assert!(StatusCode::GOOD.is_good());
        assert!(StatusCode::BAD_NOT_FOUND.is_bad());
        assert!(!StatusCode::BAD_NOT_FOUND.is_good());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StatusCode::BAD_CERTIFICATE_INVALID.to_string(),
            "Bad_CertificateInvalid (0x80120000)"
        );
        assert_eq!(StatusCode(0x8123_0000).to_string(), "0x81230000");
    }
}
