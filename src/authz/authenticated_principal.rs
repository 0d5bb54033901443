//! Authenticated-principal policy
//!
//! Enforces that requests to the endpoint carry a principal that has been
//! authenticated, unless the route explicitly allows anonymous access.

use http::StatusCode;

use super::{AuthorizationPolicy, PolicyKind, Priority};
use crate::config::PolicyToggle;
use crate::context::ActionContext;

pub struct AuthenticatedPrincipalPolicy {
    configuration: PolicyToggle,
}

impl AuthenticatedPrincipalPolicy {
    pub fn new(configuration: PolicyToggle) -> Self {
        Self { configuration }
    }
}

impl AuthorizationPolicy for AuthenticatedPrincipalPolicy {
    fn policy(&self) -> PolicyKind {
        PolicyKind::AuthenticatedPrincipal
    }

    fn enabled(&self) -> bool {
        self.configuration.enabled
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn evaluate(&self, context: &ActionContext) -> Option<StatusCode> {
        if !self.enabled() || context.action.allow_anonymous {
            return None;
        }

        let authenticated = context
            .principal
            .as_ref()
            .map(|principal| principal.is_authenticated())
            .unwrap_or(false);

        if authenticated {
            None
        } else {
            Some(StatusCode::UNAUTHORIZED)
        }
    }
}
