//! Privileged-operation policy
//!
//! Only principals holding the privileged-operations claim may reach the
//! endpoint.

use http::StatusCode;

use super::{AuthorizationPolicy, PolicyKind, Priority};
use crate::config::PolicyToggle;
use crate::context::ActionContext;
use crate::principal::claim_types;

pub struct PrivilegedOperationPolicy {
    configuration: PolicyToggle,
}

impl PrivilegedOperationPolicy {
    pub fn new(configuration: PolicyToggle) -> Self {
        Self { configuration }
    }
}

impl AuthorizationPolicy for PrivilegedOperationPolicy {
    fn policy(&self) -> PolicyKind {
        PolicyKind::RequireSudo
    }

    fn enabled(&self) -> bool {
        self.configuration.enabled
    }

    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn evaluate(&self, context: &ActionContext) -> Option<StatusCode> {
        if !self.enabled() {
            return None;
        }

        // The claim type comparison is intentionally case-sensitive; while no
        // standard enforces this, it is the common expectation.
        let holds_claim = context
            .principal
            .as_ref()
            .and_then(|principal| principal.identity())
            .map(|identity| {
                identity.has_claim(|claim| claim.kind == claim_types::PRIVILEGED_OPERATIONS)
            })
            .unwrap_or(false);

        if holds_claim {
            None
        } else {
            Some(StatusCode::FORBIDDEN)
        }
    }
}
