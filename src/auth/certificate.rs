//! Client certificate model and resolution
//!
//! Transport setup and certificate issuance live outside this layer; what
//! remains is the identifying material the handler needs: the thumbprint,
//! the public key, and the validity window.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The identifying material of an X.509 client certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCertificate {
    /// Fixed-length fingerprint uniquely identifying the certificate.
    pub thumbprint: String,
    pub subject: String,
    /// Hex-encoded public key, used to confirm that a presented certificate
    /// matches the one on record.
    pub public_key: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl ClientCertificate {
    /// True when the certificate's validity window covers the instant.
    pub fn is_valid_at(&self, instant: DateTime<Utc>) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }
}

/// Resolves a certificate from the configured certificate source by
/// thumbprint, independent of the certificate the caller presented, so that
/// revocation and rotation are detected.
///
/// The second argument mirrors the `enforce_local_certificate_validation`
/// configuration toggle: when `true`, the source only returns certificates it
/// considers valid. Injected as a strategy so tests can substitute it.
pub type CertificateResolver = Arc<dyn Fn(&str, bool) -> Option<ClientCertificate> + Send + Sync>;

/// A resolver that never finds a certificate; the default when no certificate
/// source is configured.
pub fn unavailable_resolver() -> CertificateResolver {
    Arc::new(|_, _| None)
}
