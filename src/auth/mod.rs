//! Authentication module
//!
//! Callers authenticate via one of several interchangeable schemes; each
//! scheme is an [`AuthenticationHandler`] registered with the
//! [`AuthenticationDispatcher`](dispatcher::AuthenticationDispatcher), which
//! selects a handler by the scheme named in the credential header (or by the
//! presence of a client certificate) and negotiates a challenge on failure.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{AuthenticationContext, ChallengeContext};
use crate::headers::CredentialTokens;
use crate::principal::Principal;

pub mod certificate;
pub mod claims_map;
pub mod client_certificate;
pub mod dispatcher;
pub mod shared_secret;

pub use certificate::{CertificateResolver, ClientCertificate};
pub use claims_map::{ClaimsMapError, ClientCertificateClaimsMap};
pub use client_certificate::ClientCertificateHandler;
pub use dispatcher::AuthenticationDispatcher;
pub use shared_secret::SharedSecretHandler;

/// The set of authentication schemes understood by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticationType {
    /// The scheme is unknown and, therefore, invalid.
    Unknown,
    /// No credentials are required; anyone may access the resource.
    Anonymous,
    /// Callers provide a key/secret pair shared among all callers.
    SharedSecret,
    /// Callers provide a trusted client certificate.
    ClientCertificate,
    /// Callers provide a token.
    Token,
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthenticationType::Unknown => "Unknown",
            AuthenticationType::Anonymous => "Anonymous",
            AuthenticationType::SharedSecret => "SharedSecret",
            AuthenticationType::ClientCertificate => "ClientCertificate",
            AuthenticationType::Token => "Token",
        };
        f.write_str(name)
    }
}

impl FromStr for AuthenticationType {
    type Err = ();

    /// Scheme names match exactly; an unrecognized scheme is an error rather
    /// than `Unknown`, so dispatch can distinguish "no such scheme" from a
    /// header that literally said "Unknown".
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Anonymous" => Ok(AuthenticationType::Anonymous),
            "SharedSecret" => Ok(AuthenticationType::SharedSecret),
            "ClientCertificate" => Ok(AuthenticationType::ClientCertificate),
            "Token" => Ok(AuthenticationType::Token),
            _ => Err(()),
        }
    }
}

/// The relative strength of an authentication scheme, used to pick a default
/// challenge issuer when the request names no scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuthenticationStrength {
    Unknown,
    Weak,
    Medium,
    Strong,
    Stronger,
    Strongest,
}

/// A challenge echoed in a `401` response telling the caller which credential
/// scheme to retry with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub scheme: String,
    pub parameter: Option<String>,
}

impl Challenge {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            parameter: None,
        }
    }

    /// The value to place in the WWW-Authenticate response header.
    pub fn header_value(&self) -> String {
        match &self.parameter {
            Some(parameter) => format!("{} {}", self.scheme, parameter),
            None => self.scheme.clone(),
        }
    }
}

/// A handler for one authentication scheme.
///
/// Handlers are constructed once at process start from configuration and are
/// stateless per request, except for lazily-built immutable internal state
/// cached for the handler's lifetime.
#[async_trait]
pub trait AuthenticationHandler: Send + Sync {
    /// The scheme this handler can authenticate.
    fn handler_type(&self) -> AuthenticationType;

    /// The relative strength of the scheme, used as a tie-break.
    fn strength(&self) -> AuthenticationStrength;

    /// Whether the handler participates in dispatch.
    fn enabled(&self) -> bool;

    /// Whether the handler may be selected as a challenge issuer.
    fn can_generate_challenge(&self) -> bool;

    /// Attempt to authenticate the entity specified in the request.
    ///
    /// Returns a principal on success; `None` means "not authenticated" and
    /// is never an error.
    async fn authenticate(
        &self,
        tokens: &CredentialTokens,
        context: &AuthenticationContext,
    ) -> Option<Principal>;

    /// Generate the challenge to return to callers when authorization was
    /// unsuccessful, if the scheme supports one.
    fn generate_challenge(
        &self,
        tokens: &CredentialTokens,
        context: &ChallengeContext,
    ) -> Option<Challenge>;
}

/// The source of registered authentication handlers, resolved per request.
pub trait HandlerRegistry: Send + Sync {
    fn handlers(&self) -> Vec<Arc<dyn AuthenticationHandler>>;
}

/// A fixed handler set registered once at process configuration time.
#[derive(Default)]
pub struct StaticHandlerRegistry {
    handlers: Vec<Arc<dyn AuthenticationHandler>>,
}

impl StaticHandlerRegistry {
    pub fn new(handlers: Vec<Arc<dyn AuthenticationHandler>>) -> Self {
        Self { handlers }
    }
}

impl HandlerRegistry for StaticHandlerRegistry {
    fn handlers(&self) -> Vec<Arc<dyn AuthenticationHandler>> {
        self.handlers.clone()
    }
}
