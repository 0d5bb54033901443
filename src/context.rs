//! Per-request context types
//!
//! These are created per inbound request by the hosting pipeline, handed to
//! the dispatchers, and destroyed at request completion; nothing here is ever
//! persisted.

use std::collections::HashMap;

use http::{StatusCode, Uri};

use crate::auth::{Challenge, ClientCertificate};
use crate::headers::{self, Headers};
use crate::principal::Principal;

/// The route value that names the partner a request targets.
pub const PARTNER_ROUTE_VALUE: &str = "partner";

/// The credential material and routing facts of an inbound request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: String,
    pub uri: Uri,
    pub headers: Headers,
    /// The client certificate presented during the TLS handshake, if any.
    pub client_certificate: Option<ClientCertificate>,
    /// Values bound from the matched route (e.g. the partner slug).
    pub route_values: HashMap<String, String>,
}

impl RequestDescriptor {
    pub fn new(method: impl Into<String>, uri: Uri) -> Self {
        Self {
            method: method.into(),
            uri,
            headers: Headers::new(),
            client_certificate: None,
            route_values: HashMap::new(),
        }
    }

    /// The correlation identifier supplied by the caller, if present.
    pub fn correlation_id(&self) -> Option<&str> {
        self.headers.get(headers::CORRELATION_ID)
    }

    /// True when the request arrived over a secure transport scheme.
    pub fn is_secure(&self) -> bool {
        self.uri.scheme_str() == Some("https")
    }

    /// True when the request targets the local host.
    pub fn is_loopback(&self) -> bool {
        match self.uri.host() {
            Some(host) => {
                let host = host.trim_start_matches('[').trim_end_matches(']');
                host.eq_ignore_ascii_case("localhost")
                    || host == "::1"
                    || host
                        .parse::<std::net::IpAddr>()
                        .map(|address| address.is_loopback())
                        .unwrap_or(false)
            }
            None => false,
        }
    }

    /// The partner named by the matched route, if one was supplied.
    pub fn partner(&self) -> Option<&str> {
        self.route_values
            .get(PARTNER_ROUTE_VALUE)
            .map(String::as_str)
    }

    /// The thumbprint of the presented client certificate, if any.
    pub fn certificate_thumbprint(&self) -> Option<&str> {
        self.client_certificate
            .as_ref()
            .map(|certificate| certificate.thumbprint.as_str())
    }
}

/// Route/action metadata for the endpoint a request resolved to.
///
/// `allow_anonymous` replaces the original attribute-driven marker: it is set
/// by route configuration when either the action or its controller permits
/// unauthenticated access.
#[derive(Debug, Clone, Default)]
pub struct ActionDescriptor {
    pub name: String,
    pub allow_anonymous: bool,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allow_anonymous: false,
        }
    }

    #[must_use]
    pub fn with_allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }
}

/// Context for the authentication stage; the dispatcher assigns the principal.
#[derive(Debug, Clone)]
pub struct AuthenticationContext {
    pub request: RequestDescriptor,
    pub principal: Option<Principal>,
}

impl AuthenticationContext {
    pub fn new(request: RequestDescriptor) -> Self {
        Self {
            request,
            principal: None,
        }
    }
}

/// The outcome of challenge generation: a status carrying exactly one
/// challenge to echo back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeResult {
    pub status: StatusCode,
    pub challenge: Challenge,
}

/// Context for the challenge stage, carrying whatever outcome earlier stages
/// already decided.
#[derive(Debug, Clone)]
pub struct ChallengeContext {
    pub request: RequestDescriptor,
    pub principal: Option<Principal>,
    /// The response status an earlier stage set on the action, if any.
    pub response: Option<StatusCode>,
    /// The challenge result, set only by the challenge dispatcher.
    pub result: Option<ChallengeResult>,
}

impl ChallengeContext {
    pub fn new(request: RequestDescriptor) -> Self {
        Self {
            request,
            principal: None,
            response: None,
            result: None,
        }
    }
}

/// Context for the authorization stage.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub request: RequestDescriptor,
    pub action: ActionDescriptor,
    pub principal: Option<Principal>,
    /// Set by the dispatcher only when a policy fails; absence means
    /// "continue processing."
    pub response: Option<StatusCode>,
}

impl ActionContext {
    pub fn new(request: RequestDescriptor, action: ActionDescriptor) -> Self {
        Self {
            request,
            action,
            principal: None,
            response: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> RequestDescriptor {
        RequestDescriptor::new("GET", uri.parse().unwrap())
    }

    #[test]
    fn test_https_is_secure() {
        assert!(request("https://api.example.com/orders").is_secure());
        assert!(!request("http://api.example.com/orders").is_secure());
    }

    #[test]
    fn test_loopback_detection() {
        assert!(request("http://localhost/orders").is_loopback());
        assert!(request("http://127.0.0.1:8080/orders").is_loopback());
        assert!(request("http://[::1]/orders").is_loopback());
        assert!(!request("http://api.example.com/orders").is_loopback());
    }

    #[test]
    fn test_partner_route_value() {
        let mut descriptor = request("https://api.example.com/SQUIRE/orders");
        assert_eq!(descriptor.partner(), None);

        descriptor
            .route_values
            .insert(PARTNER_ROUTE_VALUE.into(), "SQUIRE".into());
        assert_eq!(descriptor.partner(), Some("SQUIRE"));
    }

    #[test]
    fn test_correlation_id_from_header() {
        let mut descriptor = request("https://api.example.com/orders");
        assert_eq!(descriptor.correlation_id(), None);

        descriptor.headers.insert("ORD-Correlation", "abc-123");
        assert_eq!(descriptor.correlation_id(), Some("abc-123"));
    }
}
