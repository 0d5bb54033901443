//! End-to-end authorization tests
//!
//! Runs the real policy set through the authorization dispatcher, as assembled
//! by the security stack, and verifies priority ordering, short-circuiting,
//! and the per-policy access rules.

use std::sync::Arc;

use chrono::Utc;
use http::StatusCode;
use tokio_util::sync::CancellationToken;

use ordergate::auth::certificate::unavailable_resolver;
use ordergate::auth::AuthenticationType;
use ordergate::clock::FixedClock;
use ordergate::config::SecurityConfig;
use ordergate::context::{
    ActionContext, ActionDescriptor, RequestDescriptor, PARTNER_ROUTE_VALUE,
};
use ordergate::principal::{claim_types, Identity, Principal};
use ordergate::SecurityStack;

fn stack_with(configuration: &SecurityConfig) -> SecurityStack {
    SecurityStack::build(
        configuration,
        Arc::new(FixedClock::new(Utc::now())),
        unavailable_resolver(),
    )
    .unwrap()
}

fn stack() -> SecurityStack {
    stack_with(&SecurityConfig::default())
}

fn context(uri: &str) -> ActionContext {
    ActionContext::new(
        RequestDescriptor::new("GET", uri.parse().unwrap()),
        ActionDescriptor::new("get_orders"),
    )
}

fn service_principal(partner: &str) -> Principal {
    Principal::new(
        Identity::authenticated(AuthenticationType::ClientCertificate)
            .with_claim(claim_types::PARTNER, partner),
    )
}

async fn authorize(stack: &SecurityStack, context: &mut ActionContext) {
    stack
        .authorization
        .on_authorization(context, &CancellationToken::new())
        .await;
}

#[tokio::test]
async fn test_authenticated_secure_request_is_allowed() {
    let stack = stack();
    let mut context = context("https://api.example.com/orders");
    context.principal = Some(service_principal("SQUIRE"));

    authorize(&stack, &mut context).await;

    assert!(context.response.is_none());
}

#[tokio::test]
async fn test_unauthenticated_secure_request_is_unauthorized() {
    let stack = stack();
    let mut context = context("https://api.example.com/orders");

    authorize(&stack, &mut context).await;

    assert_eq!(context.response, Some(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn test_transport_security_outranks_the_principal_requirement() {
    // The request is both insecure and unauthenticated; the higher-priority
    // transport policy decides the response.
    let stack = stack();
    let mut context = context("http://api.example.com/orders");

    authorize(&stack, &mut context).await;

    assert_eq!(context.response, Some(StatusCode::FORBIDDEN));
}

#[tokio::test]
async fn test_anonymous_actions_skip_the_principal_requirement() {
    let stack = stack();
    let mut context = context("https://api.example.com/health");
    context.action = ActionDescriptor::new("health").with_allow_anonymous(true);

    authorize(&stack, &mut context).await;

    assert!(context.response.is_none());
}

#[tokio::test]
async fn test_loopback_exception_permits_insecure_local_calls() {
    let mut configuration = SecurityConfig::default();
    configuration.policies.require_ssl.allow_loopback_exception = true;
    let stack = stack_with(&configuration);

    let mut context = context("http://localhost:8080/orders");
    context.principal = Some(service_principal("SQUIRE"));

    authorize(&stack, &mut context).await;

    assert!(context.response.is_none());
}

#[tokio::test]
async fn test_partner_match_ignores_case() {
    let stack = stack();
    let mut context = context("https://api.example.com/squire/orders");
    context
        .request
        .route_values
        .insert(PARTNER_ROUTE_VALUE.into(), "squire".into());
    context.principal = Some(service_principal("SQUIRE"));

    authorize(&stack, &mut context).await;

    assert!(context.response.is_none());
}

#[tokio::test]
async fn test_partner_mismatch_is_forbidden() {
    let stack = stack();
    let mut context = context("https://api.example.com/knight/orders");
    context
        .request
        .route_values
        .insert(PARTNER_ROUTE_VALUE.into(), "KNIGHT".into());
    context.principal = Some(service_principal("SQUIRE"));

    authorize(&stack, &mut context).await;

    assert_eq!(context.response, Some(StatusCode::FORBIDDEN));
}

#[tokio::test]
async fn test_privileged_operations_require_the_sudo_claim() {
    let mut configuration = SecurityConfig::default();
    configuration.policies.privileged_operation.enabled = true;
    let stack = stack_with(&configuration);

    let mut context = context("https://api.example.com/orders/replay");
    context.principal = Some(service_principal("SQUIRE"));

    authorize(&stack, &mut context).await;
    assert_eq!(context.response, Some(StatusCode::FORBIDDEN));

    let mut context = context_with_sudo();
    authorize(&stack, &mut context).await;
    assert!(context.response.is_none());
}

fn context_with_sudo() -> ActionContext {
    let mut context = context("https://api.example.com/orders/replay");
    context.principal = Some(Principal::new(
        Identity::authenticated(AuthenticationType::ClientCertificate)
            .with_claim(claim_types::PARTNER, "SQUIRE")
            .with_claim(claim_types::PRIVILEGED_OPERATIONS, "true"),
    ));
    context
}

#[tokio::test]
async fn test_disabled_policies_never_decide_the_response() {
    let mut configuration = SecurityConfig::default();
    configuration.policies.require_ssl.enabled = false;
    configuration.policies.authenticated_principal.enabled = false;
    configuration.policies.partner.enabled = false;
    let stack = stack_with(&configuration);

    // Insecure, unauthenticated, and mismatched on partner; with every policy
    // disabled the request still proceeds.
    let mut context = context("http://api.example.com/knight/orders");
    context
        .request
        .route_values
        .insert(PARTNER_ROUTE_VALUE.into(), "KNIGHT".into());

    authorize(&stack, &mut context).await;

    assert!(context.response.is_none());
}
