//! Partner policy
//!
//! Enforces that a principal's partner claim, if present, matches the partner
//! of the requested resource. A principal with no partner claim is assumed to
//! be authorized to work with any partner.

use http::StatusCode;

use super::{AuthorizationPolicy, PolicyKind, Priority};
use crate::config::PolicyToggle;
use crate::context::ActionContext;
use crate::principal::claim_types;

pub struct PartnerPolicy {
    configuration: PolicyToggle,
}

impl PartnerPolicy {
    pub fn new(configuration: PolicyToggle) -> Self {
        Self { configuration }
    }
}

impl AuthorizationPolicy for PartnerPolicy {
    fn policy(&self) -> PolicyKind {
        PolicyKind::EnforcePartner
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

        // Without an authenticated principal or a partner in the route, there
        // is no restriction to apply.
        let partner = context.request.partner().unwrap_or_default();
        let principal = match &context.principal {
            Some(principal) if !partner.is_empty() => principal,
            _ => return None,
        };

        // An absent or empty partner claim places no restriction on the
        // caller; a populated one must match the requested partner.
        match principal.find_first(claim_types::PARTNER) {
            None | Some("") => None,
            Some(claimed) if claimed.eq_ignore_ascii_case(partner) => None,
            Some(_) => Some(StatusCode::FORBIDDEN),
        }
    }
}
