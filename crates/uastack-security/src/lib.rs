//! Identity, trust, and endpoint negotiation.
//!
//! - [`Certificate`], [`PrivateKey`] and [`Identity`]: a certificate with its
//!   matching key, addressable by [`Thumbprint`].
//! - [`CertificateValidator`] trust policies.
//! - [`TransportSecurity`]: the per-transport security bundle with overlay
//!   merging.
//! - [`EndpointNegotiator`]: pure decisions over an endpoint's security mode
//!   and accepted user token policies.

pub mod cert;
pub mod identity;
pub mod key;
pub mod negotiate;
pub mod thumbprint;
pub mod transport;
pub mod trust;

pub use cert::Certificate;
pub use identity::Identity;
pub use key::PrivateKey;
pub use negotiate::{EndpointExt, EndpointNegotiator};
pub use thumbprint::Thumbprint;
pub use transport::{Credentials, IdentityMaterial, TransportSecurity};
pub use trust::{AllowAll, CertificateValidator, TrustList};
