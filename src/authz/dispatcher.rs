//! Authorization dispatch
//!
//! Evaluates registered policies in descending priority order against the
//! authenticated request, short-circuiting on the first failure.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{AuthorizationPolicy, PolicyKind, PolicyRegistry};
use crate::context::ActionContext;

/// Evaluates authorization policies for an action, writing a response status
/// to the context only when a policy fails.
pub struct AuthorizationDispatcher {
    registry: Arc<dyn PolicyRegistry>,
    /// Policies to enforce; an empty set means "evaluate everything
    /// registered," not "no policies."
    active_policies: HashSet<PolicyKind>,
}

impl AuthorizationDispatcher {
    /// Create a dispatcher enforcing only the named policies. An empty
    /// selector ignores the caller-supplied list and evaluates every
    /// registered policy.
    pub fn new(registry: Arc<dyn PolicyRegistry>, policies: &[PolicyKind]) -> Self {
        Self {
            registry,
            active_policies: policies.iter().copied().collect(),
        }
    }

    /// Create a dispatcher enforcing all registered policies.
    pub fn all_policies(registry: Arc<dyn PolicyRegistry>) -> Self {
        Self::new(registry, &[])
    }

    /// Evaluate the active policies against the context.
    ///
    /// Policies are additive: for a request to proceed, every enabled policy
    /// must be satisfied. The first policy to return a status code becomes
    /// the response and stops evaluation; when all are satisfied, no response
    /// is set and the absence of a response means "continue processing."
    pub async fn on_authorization(
        &self,
        context: &mut ActionContext,
        cancellation: &CancellationToken,
    ) {
        if cancellation.is_cancelled() {
            return;
        }

        // A failure response set by an earlier stage is respected as-is.
        let has_failure_response = context
            .response
            .map(|status| !status.is_success())
            .unwrap_or(false);

        if has_failure_response {
            return;
        }

        let mut policies: Vec<Arc<dyn AuthorizationPolicy>> = self
            .registry
            .policies()
            .into_iter()
            .filter(|policy| {
                policy.enabled()
                    && (self.active_policies.is_empty()
                        || self.active_policies.contains(&policy.policy()))
            })
            .collect();

        // Stable sort; registration order breaks priority ties.
        policies.sort_by(|a, b| b.priority().cmp(&a.priority()));

        for policy in policies {
            if cancellation.is_cancelled() {
                return;
            }

            let Some(status) = policy.evaluate(context) else {
                continue;
            };

            context.response = Some(status);

            let request = &context.request;
            info!(
                correlation_id = request.correlation_id().unwrap_or_default(),
                policy = %policy.policy(),
                response = %status,
                route = %request.uri,
                headers = %request.headers,
                "An authorization policy was not satisfied"
            );
            return;
        }
    }
}
