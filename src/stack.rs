//! Security stack assembly
//!
//! Wires configuration into the concrete handlers, policies, and dispatchers.
//! Handlers and policies are registered here once, at process configuration
//! time, and treated as read-only for the remainder of the process lifetime.

use std::sync::Arc;

use crate::auth::{
    AuthenticationDispatcher, AuthenticationHandler, CertificateResolver,
    ClientCertificateHandler, SharedSecretHandler, StaticHandlerRegistry,
};
use crate::authz::{
    AuthenticatedPrincipalPolicy, AuthorizationDispatcher, AuthorizationPolicy, PartnerPolicy,
    PolicyKind, PrivilegedOperationPolicy, RequireSslPolicy, StaticPolicyRegistry,
};
use crate::clock::Clock;
use crate::config::{ConfigError, SecurityConfig};

/// The assembled authentication and authorization dispatchers for the
/// process.
pub struct SecurityStack {
    pub authentication: AuthenticationDispatcher,
    pub authorization: AuthorizationDispatcher,
    handlers: Vec<Arc<dyn AuthenticationHandler>>,
    policies: Vec<Arc<dyn AuthorizationPolicy>>,
}

impl SecurityStack {
    /// Build the stack from configuration, failing fast when any handler is
    /// enabled with an invalid configuration.
    pub fn build(
        configuration: &SecurityConfig,
        clock: Arc<dyn Clock>,
        certificate_resolver: CertificateResolver,
    ) -> Result<Self, ConfigError> {
        let handlers: Vec<Arc<dyn AuthenticationHandler>> = vec![
            Arc::new(SharedSecretHandler::new(configuration.shared_secret.clone())?),
            Arc::new(ClientCertificateHandler::new(
                configuration.client_certificate.clone(),
                clock,
                certificate_resolver,
            )?),
        ];

        let policies: Vec<Arc<dyn AuthorizationPolicy>> = vec![
            Arc::new(RequireSslPolicy::new(configuration.policies.require_ssl)),
            Arc::new(AuthenticatedPrincipalPolicy::new(
                configuration.policies.authenticated_principal,
            )),
            Arc::new(PartnerPolicy::new(configuration.policies.partner)),
            Arc::new(PrivilegedOperationPolicy::new(
                configuration.policies.privileged_operation,
            )),
        ];

        let handler_registry = Arc::new(StaticHandlerRegistry::new(handlers.clone()));
        let policy_registry = Arc::new(StaticPolicyRegistry::new(policies.clone()));

        Ok(Self {
            authentication: AuthenticationDispatcher::new(handler_registry),
            authorization: AuthorizationDispatcher::all_policies(policy_registry),
            handlers,
            policies,
        })
    }

    /// The registered handlers, in registration order.
    pub fn handlers(&self) -> &[Arc<dyn AuthenticationHandler>] {
        &self.handlers
    }

    /// The registered policies, in registration order.
    pub fn policies(&self) -> &[Arc<dyn AuthorizationPolicy>] {
        &self.policies
    }

    /// The kinds of policies currently enabled.
    pub fn enabled_policies(&self) -> Vec<PolicyKind> {
        self.policies
            .iter()
            .filter(|policy| policy.enabled())
            .map(|policy| policy.policy())
            .collect()
    }
}
