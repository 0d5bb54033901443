//! Transport-security policy
//!
//! Enforces that requests arrive over a secure scheme, with an optional
//! configured exception for loopback (local) calls.

use http::StatusCode;

use super::{AuthorizationPolicy, PolicyKind, Priority};
use crate::config::RequireSslPolicyConfig;
use crate::context::ActionContext;

pub struct RequireSslPolicy {
    configuration: RequireSslPolicyConfig,
}

impl RequireSslPolicy {
    pub fn new(configuration: RequireSslPolicyConfig) -> Self {
        Self { configuration }
    }
}

impl AuthorizationPolicy for RequireSslPolicy {
    fn policy(&self) -> PolicyKind {
        PolicyKind::RequireSsl
    }

    fn enabled(&self) -> bool {
        self.configuration.enabled
    }

    fn priority(&self) -> Priority {
        Priority::Highest
    }

    fn evaluate(&self, context: &ActionContext) -> Option<StatusCode> {
        if !self.enabled() {
            return None;
        }

        let request = &context.request;

        if request.is_secure()
            || (self.configuration.allow_loopback_exception && request.is_loopback())
        {
            return None;
        }

        Some(StatusCode::FORBIDDEN)
    }
}
