//! Shared-secret authentication
//!
//! Callers present an application key and secret in dedicated headers; the
//! pair is compared against a configured primary pair and, when populated, a
//! secondary pair kept for rotation.

use async_trait::async_trait;

use super::{
    AuthenticationHandler, AuthenticationStrength, AuthenticationType, Challenge,
};
use crate::config::{ConfigError, SharedSecretConfig};
use crate::context::{AuthenticationContext, ChallengeContext};
use crate::headers::{self, CredentialTokens};
use crate::principal::{Identity, Principal};

/// Handler responsible for authenticating entities using the shared-secret
/// scheme.
#[derive(Debug)]
pub struct SharedSecretHandler {
    configuration: SharedSecretConfig,
}

impl SharedSecretHandler {
    /// Create the handler, failing fast when enabled without a usable primary
    /// pair. Validation is skipped entirely when the handler is disabled.
    pub fn new(configuration: SharedSecretConfig) -> Result<Self, ConfigError> {
        if configuration.enabled
            && configuration.primary_key.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConfigError::ValidationError(
                "The primary key must be configured in primary_key".into(),
            ));
        }

        if configuration.enabled
            && configuration
                .primary_secret
                .as_deref()
                .unwrap_or("")
                .trim()
                .is_empty()
        {
            return Err(ConfigError::ValidationError(
                "The primary secret must be configured in primary_secret".into(),
            ));
        }

        Ok(Self { configuration })
    }

    fn pair_matches(configured_key: Option<&str>, configured_secret: Option<&str>, key: &str, secret: &str) -> bool {
        // Both halves of a pair must match; cross-pair mixing is never
        // accepted. The comparison is intentionally case-sensitive.
        match (configured_key, configured_secret) {
            (Some(expected_key), Some(expected_secret)) => {
                expected_key == key && expected_secret == secret
            }
            _ => false,
        }
    }
}

#[async_trait]
impl AuthenticationHandler for SharedSecretHandler {
    fn handler_type(&self) -> AuthenticationType {
        AuthenticationType::SharedSecret
    }

    fn strength(&self) -> AuthenticationStrength {
        AuthenticationStrength::Weak
    }

    fn enabled(&self) -> bool {
        self.configuration.enabled
    }

    fn can_generate_challenge(&self) -> bool {
        true
    }

    async fn authenticate(
        &self,
        _tokens: &CredentialTokens,
        context: &AuthenticationContext,
    ) -> Option<Principal> {
        let request_headers = &context.request.headers;

        // Without both headers, authentication cannot be performed.
        let key = request_headers.get(headers::APPLICATION_KEY)?;
        let secret = request_headers.get(headers::APPLICATION_SECRET)?;

        let mut authenticated = Self::pair_matches(
            self.configuration.primary_key.as_deref(),
            self.configuration.primary_secret.as_deref(),
            key,
            secret,
        );

        // Fall back to the secondary pair only when it is fully populated.
        if !authenticated
            && !self
                .configuration
                .secondary_key
                .as_deref()
                .unwrap_or("")
                .trim()
                .is_empty()
            && !self
                .configuration
                .secondary_secret
                .as_deref()
                .unwrap_or("")
                .trim()
                .is_empty()
        {
            authenticated = Self::pair_matches(
                self.configuration.secondary_key.as_deref(),
                self.configuration.secondary_secret.as_deref(),
                key,
                secret,
            );
        }

        if !authenticated {
            return None;
        }

        Some(Principal::new(Identity::authenticated(
            AuthenticationType::SharedSecret,
        )))
    }

    fn generate_challenge(
        &self,
        _tokens: &CredentialTokens,
        _context: &ChallengeContext,
    ) -> Option<Challenge> {
        Some(Challenge::new(self.handler_type().to_string()))
    }
}
