//! Authorization module
//!
//! Authenticated requests are evaluated against an ordered set of
//! [`AuthorizationPolicy`] implementations by the
//! [`AuthorizationDispatcher`](dispatcher::AuthorizationDispatcher). Policies
//! are additive: all enabled policies must be satisfied, and the first
//! failure short-circuits the rest.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::context::ActionContext;

pub mod authenticated_principal;
pub mod dispatcher;
pub mod partner;
pub mod privileged_operation;
pub mod require_ssl;

pub use authenticated_principal::AuthenticatedPrincipalPolicy;
pub use dispatcher::AuthorizationDispatcher;
pub use partner::PartnerPolicy;
pub use privileged_operation::PrivilegedOperationPolicy;
pub use require_ssl::RequireSslPolicy;

/// The set of authorization policies that can be applied to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Any authenticated principal is allowed; an anonymous-access marker on
    /// the action takes precedence and is honored.
    AuthenticatedPrincipal,
    /// Transport security is required unless an exception is enabled for
    /// loopback (local) calls.
    RequireSsl,
    /// If the principal has a partner claim, endpoint usage is restricted to
    /// that partner.
    EnforcePartner,
    /// Only principals holding the privileged-operations claim are allowed.
    RequireSudo,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::AuthenticatedPrincipal => "AuthenticatedPrincipal",
            PolicyKind::RequireSsl => "RequireSsl",
            PolicyKind::EnforcePartner => "EnforcePartner",
            PolicyKind::RequireSudo => "RequireSudo",
        };
        f.write_str(name)
    }
}

/// A generic priority level; higher priorities are evaluated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Lowest,
    Low,
    BelowNormal,
    Normal,
    AboveNormal,
    High,
    Highest,
}

/// One authorization policy.
///
/// Policies are constructed once from configuration and are stateless;
/// `evaluate` must be free of side effects.
pub trait AuthorizationPolicy: Send + Sync {
    /// The specific policy represented.
    fn policy(&self) -> PolicyKind;

    /// Whether the policy is evaluated at all.
    fn enabled(&self) -> bool;

    /// Evaluation order among policies; higher runs first and can
    /// short-circuit lower ones.
    fn priority(&self) -> Priority;

    /// Evaluate the policy against the context.
    ///
    /// Returns `None` when the policy is satisfied; otherwise the
    /// recommended status code to respond with.
    fn evaluate(&self, context: &ActionContext) -> Option<StatusCode>;
}

/// The source of registered authorization policies, resolved per request.
pub trait PolicyRegistry: Send + Sync {
    fn policies(&self) -> Vec<Arc<dyn AuthorizationPolicy>>;
}

/// A fixed policy set registered once at process configuration time.
#[derive(Default)]
pub struct StaticPolicyRegistry {
    policies: Vec<Arc<dyn AuthorizationPolicy>>,
}

impl StaticPolicyRegistry {
    pub fn new(policies: Vec<Arc<dyn AuthorizationPolicy>>) -> Self {
        Self { policies }
    }
}

impl PolicyRegistry for StaticPolicyRegistry {
    fn policies(&self) -> Vec<Arc<dyn AuthorizationPolicy>> {
        self.policies.clone()
    }
}
