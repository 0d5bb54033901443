//! Client-certificate authentication
//!
//! Callers are identified by the certificate presented during the TLS
//! handshake. The thumbprint is looked up in a configured claims map, the
//! certificate is re-resolved from the configured source so revocation and
//! rotation are detected, and its validity window is checked against an
//! injected clock.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use super::{
    AuthenticationHandler, AuthenticationStrength, AuthenticationType, CertificateResolver,
    Challenge, ClientCertificate, ClientCertificateClaimsMap,
};
use crate::clock::Clock;
use crate::config::{ClientCertificateConfig, ConfigError};
use crate::context::{AuthenticationContext, ChallengeContext};
use crate::headers::CredentialTokens;
use crate::principal::{claim_types, Claim, Identity, IdentityType, Principal};

/// Handler responsible for authenticating entities using client certificates
/// as credentials.
pub struct ClientCertificateHandler {
    configuration: ClientCertificateConfig,
    clock: Arc<dyn Clock>,
    resolver: CertificateResolver,
    /// Built on first use and cached for the handler's lifetime.
    claims_map: OnceLock<ClientCertificateClaimsMap>,
    /// Resolved certificates keyed by thumbprint, including negative results.
    certificates: DashMap<String, Option<ClientCertificate>>,
}

impl ClientCertificateHandler {
    /// Create the handler.
    ///
    /// A populated claims mapping must parse; that is verified here so an
    /// invalid mapping prevents the process from serving traffic, while the
    /// map itself is still built lazily on first use.
    pub fn new(
        configuration: ClientCertificateConfig,
        clock: Arc<dyn Clock>,
        resolver: CertificateResolver,
    ) -> Result<Self, ConfigError> {
        if let Some(serialized) = configuration
            .serialized_certificate_claims_mapping
            .as_deref()
        {
            ClientCertificateClaimsMap::deserialize(serialized).map_err(|error| {
                ConfigError::ValidationError(format!(
                    "Invalid serialized_certificate_claims_mapping: {error}"
                ))
            })?;
        }

        Ok(Self {
            configuration,
            clock,
            resolver,
            claims_map: OnceLock::new(),
            certificates: DashMap::new(),
        })
    }

    /// The rehydrated claims map; construction is safe to race, every winner
    /// produces an equivalent value.
    fn claims_map(&self) -> &ClientCertificateClaimsMap {
        self.claims_map.get_or_init(|| {
            self.configuration
                .serialized_certificate_claims_mapping
                .as_deref()
                .map(|serialized| {
                    ClientCertificateClaimsMap::deserialize(serialized).unwrap_or_default()
                })
                .unwrap_or_default()
        })
    }

    /// Resolve a certificate from the configured source, caching the result
    /// by thumbprint for the handler's lifetime.
    fn resolve_certificate(&self, thumbprint: &str) -> Option<ClientCertificate> {
        self.certificates
            .entry(thumbprint.to_string())
            .or_insert_with(|| {
                (self.resolver)(
                    thumbprint,
                    self.configuration.enforce_local_certificate_validation,
                )
            })
            .clone()
    }
}

#[async_trait]
impl AuthenticationHandler for ClientCertificateHandler {
    fn handler_type(&self) -> AuthenticationType {
        AuthenticationType::ClientCertificate
    }

    fn strength(&self) -> AuthenticationStrength {
        AuthenticationStrength::Stronger
    }

    fn enabled(&self) -> bool {
        self.configuration.enabled
    }

    fn can_generate_challenge(&self) -> bool {
        false
    }

    async fn authenticate(
        &self,
        _tokens: &CredentialTokens,
        context: &AuthenticationContext,
    ) -> Option<Principal> {
        let request = &context.request;
        let presented = request.client_certificate.as_ref()?;
        let correlation_id = request.correlation_id().unwrap_or_default();

        if !self.claims_map().contains_thumbprint(&presented.thumbprint) {
            info!(
                correlation_id,
                thumbprint = %presented.thumbprint,
                route = %request.uri,
                headers = %request.headers,
                "An unknown client certificate thumbprint was received"
            );
            return None;
        }

        let Some(known) = self.resolve_certificate(&presented.thumbprint) else {
            info!(
                correlation_id,
                thumbprint = %presented.thumbprint,
                route = %request.uri,
                headers = %request.headers,
                "A client certificate was received, but no corresponding certificate was found at the configured source"
            );
            return None;
        };

        // The resolved certificate must be the one that was presented and
        // must be inside its validity window at the current instant.
        let now = self.clock.now();

        let valid = known.thumbprint.eq_ignore_ascii_case(&presented.thumbprint)
            && known.public_key == presented.public_key
            && known.is_valid_at(now);

        if !valid {
            info!(
                correlation_id,
                thumbprint = %presented.thumbprint,
                route = %request.uri,
                headers = %request.headers,
                "A client certificate was received, but the corresponding certificate match was unsuccessful"
            );
            return None;
        }

        // The caller certificate has been accepted; map it to a claims-bearing
        // identity, starting with the well-known claims for any certificate.
        let mut identity = Identity::authenticated(AuthenticationType::ClientCertificate);
        identity.add_claim(Claim::new(claim_types::THUMBPRINT, &presented.thumbprint));
        identity.add_claim(Claim::new(
            claim_types::IDENTITY_TYPE,
            IdentityType::Service.to_string(),
        ));

        if let Some(mapped) = self.claims_map().get(&presented.thumbprint) {
            for (kind, value) in mapped {
                identity.add_claim(Claim::new(kind, value));
            }
        }

        Some(Principal::new(identity))
    }

    fn generate_challenge(
        &self,
        _tokens: &CredentialTokens,
        _context: &ChallengeContext,
    ) -> Option<Challenge> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::certificate::unavailable_resolver;
    use crate::clock::FixedClock;
    use crate::context::RequestDescriptor;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const THUMBPRINT: &str = "AA11BB22CC33";

    fn certificate() -> ClientCertificate {
        let now = Utc::now();
        ClientCertificate {
            thumbprint: THUMBPRINT.into(),
            subject: "CN=squire.example.com".into(),
            public_key: "0402AB".into(),
            not_before: now - Duration::days(30),
            not_after: now + Duration::days(30),
        }
    }

    fn serialized_mapping() -> String {
        let mut map = ClientCertificateClaimsMap::new();
        let claims: HashMap<String, String> =
            [(claim_types::PARTNER.to_string(), "SQUIRE".to_string())]
                .into_iter()
                .collect();
        map.add_certificate(THUMBPRINT, Some(claims)).unwrap();
        map.serialize().unwrap()
    }

    fn config() -> ClientCertificateConfig {
        ClientCertificateConfig {
            enabled: true,
            enforce_local_certificate_validation: true,
            serialized_certificate_claims_mapping: Some(serialized_mapping()),
        }
    }

    fn resolver_for(certificate: ClientCertificate) -> CertificateResolver {
        Arc::new(move |thumbprint, _| {
            certificate
                .thumbprint
                .eq_ignore_ascii_case(thumbprint)
                .then(|| certificate.clone())
        })
    }

    fn context_with_certificate(certificate: Option<ClientCertificate>) -> AuthenticationContext {
        let mut request =
            RequestDescriptor::new("POST", "https://api.example.com/orders".parse().unwrap());
        request.client_certificate = certificate;
        AuthenticationContext::new(request)
    }

    fn handler_at(instant: chrono::DateTime<Utc>) -> ClientCertificateHandler {
        ClientCertificateHandler::new(
            config(),
            Arc::new(FixedClock::new(instant)),
            resolver_for(certificate()),
        )
        .unwrap()
    }

    #[test]
    fn test_malformed_mapping_fails_fast() {
        let mut config = config();
        config.serialized_certificate_claims_mapping = Some("{not json".into());

        let result = ClientCertificateHandler::new(
            config,
            Arc::new(FixedClock::new(Utc::now())),
            unavailable_resolver(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_certificate_is_not_authenticated() {
        let handler = handler_at(Utc::now());
        let context = context_with_certificate(None);

        assert!(handler
            .authenticate(&CredentialTokens::empty(), &context)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unmapped_thumbprint_is_not_authenticated() {
        let handler = handler_at(Utc::now());
        let mut unknown = certificate();
        unknown.thumbprint = "FFEEDDCCBBAA".into();
        let context = context_with_certificate(Some(unknown));

        assert!(handler
            .authenticate(&CredentialTokens::empty(), &context)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unresolvable_certificate_is_not_authenticated() {
        let handler = ClientCertificateHandler::new(
            config(),
            Arc::new(FixedClock::new(Utc::now())),
            unavailable_resolver(),
        )
        .unwrap();
        let context = context_with_certificate(Some(certificate()));

        assert!(handler
            .authenticate(&CredentialTokens::empty(), &context)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_certificate_is_not_authenticated() {
        let handler = handler_at(certificate().not_after + Duration::days(1));
        let context = context_with_certificate(Some(certificate()));

        assert!(handler
            .authenticate(&CredentialTokens::empty(), &context)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_not_yet_valid_certificate_is_not_authenticated() {
        let handler = handler_at(certificate().not_before - Duration::days(1));
        let context = context_with_certificate(Some(certificate()));

        assert!(handler
            .authenticate(&CredentialTokens::empty(), &context)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_public_key_mismatch_is_not_authenticated() {
        let handler = handler_at(Utc::now());
        let mut presented = certificate();
        presented.public_key = "DEADBEEF".into();
        let context = context_with_certificate(Some(presented));

        assert!(handler
            .authenticate(&CredentialTokens::empty(), &context)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_valid_certificate_yields_mapped_claims() {
        let handler = handler_at(Utc::now());
        let context = context_with_certificate(Some(certificate()));

        let principal = handler
            .authenticate(&CredentialTokens::empty(), &context)
            .await
            .unwrap();
        assert!(principal.is_authenticated());

        let identity = principal.identity().unwrap();
        assert_eq!(
            identity.authentication_type(),
            AuthenticationType::ClientCertificate
        );
        assert_eq!(
            identity.find_first(claim_types::THUMBPRINT),
            Some(THUMBPRINT)
        );
        assert_eq!(
            identity.find_first(claim_types::IDENTITY_TYPE),
            Some("Service")
        );
        assert_eq!(identity.find_first(claim_types::PARTNER), Some("SQUIRE"));
    }

    #[tokio::test]
    async fn test_resolution_is_cached_per_thumbprint() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = Arc::clone(&calls);
            let certificate = certificate();
            let resolver: CertificateResolver = Arc::new(move |thumbprint, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                certificate
                    .thumbprint
                    .eq_ignore_ascii_case(thumbprint)
                    .then(|| certificate.clone())
            });
            resolver
        };

        let handler = ClientCertificateHandler::new(
            config(),
            Arc::new(FixedClock::new(Utc::now())),
            counted,
        )
        .unwrap();

        let context = context_with_certificate(Some(certificate()));
        for _ in 0..3 {
            assert!(handler
                .authenticate(&CredentialTokens::empty(), &context)
                .await
                .is_some());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_certificate_handler_never_challenges() {
        let handler = handler_at(Utc::now());
        let request =
            RequestDescriptor::new("GET", "https://api.example.com/orders".parse().unwrap());
        let context = ChallengeContext::new(request);

        assert!(handler
            .generate_challenge(&CredentialTokens::empty(), &context)
            .is_none());
        assert!(!handler.can_generate_challenge());
    }
}
