//! Authentication dispatch and challenge negotiation
//!
//! The dispatcher owns scheme detection: a client certificate takes
//! precedence over any credential header; otherwise the scheme named by the
//! credential header picks the handler. On failure, the challenge stage
//! selects an issuer for the `401` challenge, falling back to the strongest
//! challenge-capable handler when the request named no usable scheme.

use std::sync::Arc;

use http::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{AuthenticationHandler, AuthenticationType, HandlerRegistry};
use crate::context::{
    AuthenticationContext, ChallengeContext, ChallengeResult, RequestDescriptor,
};
use crate::headers::{self, CredentialTokens};

/// Assigns a principal to inbound requests and issues challenges when
/// authentication was unsuccessful.
pub struct AuthenticationDispatcher {
    registry: Arc<dyn HandlerRegistry>,
}

impl AuthenticationDispatcher {
    pub fn new(registry: Arc<dyn HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Attempt to authenticate the request, setting `context.principal` on
    /// success.
    ///
    /// Failures never surface as errors: when no handler resolves or the
    /// selected handler produces no principal, the principal is left unset
    /// and a single informational entry is logged. Nothing is touched once
    /// cancellation has been requested.
    pub async fn authenticate(
        &self,
        context: &mut AuthenticationContext,
        cancellation: &CancellationToken,
    ) {
        if cancellation.is_cancelled() {
            return;
        }

        let request = &context.request;
        let correlation_id = request.correlation_id().unwrap_or_default().to_string();

        let Some((handler, tokens)) = self.select_for_request(request, false) else {
            info!(
                %correlation_id,
                route = %request.uri,
                headers = %request.headers,
                client_certificate = ?request.certificate_thumbprint(),
                "Authentication is not possible; no authentication handler was available"
            );
            return;
        };

        match handler.authenticate(&tokens, context).await {
            Some(principal) => {
                context.principal = Some(principal);
            }
            None => {
                let request = &context.request;
                info!(
                    %correlation_id,
                    route = %request.uri,
                    headers = %request.headers,
                    client_certificate = ?request.certificate_thumbprint(),
                    "Unable to authenticate the caller"
                );
            }
        }
    }

    /// Issue a challenge for the request when, and only when, the outcome so
    /// far calls for one.
    ///
    /// An existing principal, an existing challenge result, or any response
    /// other than `401 Unauthorized` stands unmodified; a fresh challenge
    /// replaces a `401` (or absent) response with a `401` carrying exactly
    /// one challenge.
    pub async fn challenge(
        &self,
        context: &mut ChallengeContext,
        cancellation: &CancellationToken,
    ) {
        if cancellation.is_cancelled()
            || context.principal.is_some()
            || !Self::should_override_response(context)
        {
            return;
        }

        let selection = self.select_for_request(&context.request, true).or_else(|| {
            self.select_default_challenge_handler()
                .map(|handler| (handler, CredentialTokens::empty()))
        });

        // With no challenge-capable handler available, authentication is not
        // possible; make no alterations to the current response.
        let Some((handler, tokens)) = selection else {
            return;
        };

        let Some(challenge) = handler.generate_challenge(&tokens, context) else {
            return;
        };

        context.response = None;
        context.result = Some(ChallengeResult {
            status: StatusCode::UNAUTHORIZED,
            challenge,
        });

        let request = &context.request;
        info!(
            correlation_id = request.correlation_id().unwrap_or_default(),
            response = %StatusCode::UNAUTHORIZED,
            route = %request.uri,
            headers = %request.headers,
            "Authentication is needed; a challenge was issued"
        );
    }

    /// Select the handler and parsed credential tokens for a request.
    ///
    /// A client certificate takes precedence over any credential header, even
    /// if one is present; certificate-based identity is never overridden by a
    /// shared-secret header on the same request. Certificate precedence does
    /// not apply during challenge selection, where an issuer is wanted for
    /// the scheme the caller attempted.
    fn select_for_request(
        &self,
        request: &RequestDescriptor,
        challenge_generation_required: bool,
    ) -> Option<(Arc<dyn AuthenticationHandler>, CredentialTokens)> {
        if !challenge_generation_required && request.client_certificate.is_some() {
            if let Some(handler) = self.select_handler(
                AuthenticationType::ClientCertificate,
                challenge_generation_required,
            ) {
                return Some((handler, CredentialTokens::empty()));
            }
        }

        let header_value = request.headers.get(headers::AUTHORIZATION)?;
        let tokens = headers::parse_credential_header(header_value);
        let scheme: AuthenticationType = tokens.scheme().parse().ok()?;

        let handler = self.select_handler(scheme, challenge_generation_required)?;
        Some((handler, tokens))
    }

    /// Select the enabled handler for a scheme, preferring the strongest when
    /// several are registered for it. Disabled handlers are never selected.
    fn select_handler(
        &self,
        scheme: AuthenticationType,
        challenge_generation_required: bool,
    ) -> Option<Arc<dyn AuthenticationHandler>> {
        Self::strongest(self.registry.handlers().into_iter().filter(|candidate| {
            candidate.enabled()
                && candidate.handler_type() == scheme
                && (candidate.can_generate_challenge() || !challenge_generation_required)
        }))
    }

    /// Select the strongest enabled, challenge-capable handler to issue the
    /// default challenge.
    fn select_default_challenge_handler(&self) -> Option<Arc<dyn AuthenticationHandler>> {
        Self::strongest(
            self.registry
                .handlers()
                .into_iter()
                .filter(|candidate| candidate.enabled() && candidate.can_generate_challenge()),
        )
    }

    /// The strongest candidate; registration order breaks ties.
    fn strongest(
        candidates: impl Iterator<Item = Arc<dyn AuthenticationHandler>>,
    ) -> Option<Arc<dyn AuthenticationHandler>> {
        let mut best: Option<Arc<dyn AuthenticationHandler>> = None;

        for candidate in candidates {
            let stronger = best
                .as_ref()
                .map(|current| candidate.strength() > current.strength())
                .unwrap_or(true);

            if stronger {
                best = Some(candidate);
            }
        }

        best
    }

    /// Whether the existing outcome may be replaced by a fresh challenge.
    /// `401 Unauthorized` is the only response status eligible to be
    /// overridden.
    fn should_override_response(context: &ChallengeContext) -> bool {
        if context.result.is_some() {
            return false;
        }

        match context.response {
            None => true,
            Some(status) => status == StatusCode::UNAUTHORIZED,
        }
    }
}
