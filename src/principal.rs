//! Principals, identities, and claims
//!
//! An authenticated caller is represented as a [`Principal`] wrapping at most
//! one [`Identity`]; the identity carries the authentication scheme that
//! produced it and a set of claims.

use std::fmt;

use crate::auth::AuthenticationType;

/// Friendly names for the custom claim URIs that may appear on an
/// authenticated principal.
pub mod claim_types {
    /// The type of identity associated with the principal.
    pub const IDENTITY_TYPE: &str = "urn:ordering:security:identity-type";

    /// Presence of this claim indicates the principal may perform privileged
    /// operations.
    pub const PRIVILEGED_OPERATIONS: &str = "urn:ordering:security:privilege:sudo";

    /// An association between the principal and a partner.
    pub const PARTNER: &str = "urn:ordering:partner";

    /// The thumbprint of the certificate that identified the principal.
    pub const THUMBPRINT: &str = "urn:ordering:security:thumbprint";
}

/// The type of identity associated with a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityType {
    Unknown,
    /// An individual user of the system; a person behind the keyboard.
    User,
    /// A service acting on its own behalf.
    Service,
    /// A service acting on behalf of a specific user.
    ServiceOnBehalfOf,
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentityType::Unknown => "Unknown",
            IdentityType::User => "User",
            IdentityType::Service => "Service",
            IdentityType::ServiceOnBehalfOf => "ServiceOnBehalfOf",
        };
        f.write_str(name)
    }
}

/// A named attribute attached to an authenticated identity.
///
/// Duplicate kinds are allowed for multi-valued claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub kind: String,
    pub value: String,
}

impl Claim {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// An identity produced by an authentication handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    authentication_type: AuthenticationType,
    authenticated: bool,
    claims: Vec<Claim>,
}

impl Identity {
    /// Create an identity that was produced by a successful handler.
    pub fn authenticated(authentication_type: AuthenticationType) -> Self {
        Self {
            authentication_type,
            authenticated: true,
            claims: Vec::new(),
        }
    }

    /// Create an identity for a caller that presented no valid credentials.
    pub fn anonymous() -> Self {
        Self {
            authentication_type: AuthenticationType::Anonymous,
            authenticated: false,
            claims: Vec::new(),
        }
    }

    pub fn authentication_type(&self) -> AuthenticationType {
        self.authentication_type
    }

    /// True only when the identity was produced by a successful handler.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    #[must_use]
    pub fn with_claim(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_claim(Claim::new(kind, value));
        self
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// The value of the first claim of the given kind. The kind comparison is
    /// intentionally case-sensitive; while no standard enforces this, it is
    /// the common expectation.
    pub fn find_first(&self, kind: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| claim.kind == kind)
            .map(|claim| claim.value.as_str())
    }

    pub fn has_claim(&self, predicate: impl Fn(&Claim) -> bool) -> bool {
        self.claims.iter().any(predicate)
    }
}

/// A principal wrapping zero-or-one identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Principal {
    identity: Option<Identity>,
}

impl Principal {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// A principal with no identity at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// True when an identity is present and it was produced by a successful
    /// handler.
    pub fn is_authenticated(&self) -> bool {
        self.identity
            .as_ref()
            .map(Identity::is_authenticated)
            .unwrap_or(false)
    }

    /// The value of the first claim of the given kind on the wrapped
    /// identity, if any.
    pub fn find_first(&self, kind: &str) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|identity| identity.find_first(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticated_identity() {
        let identity = Identity::authenticated(AuthenticationType::SharedSecret);
        assert!(identity.is_authenticated());
        assert_eq!(
            identity.authentication_type(),
            AuthenticationType::SharedSecret
        );
    }

    #[test]
    fn test_anonymous_identity_is_not_authenticated() {
        let principal = Principal::new(Identity::anonymous());
        assert!(!principal.is_authenticated());
    }

    #[test]
    fn test_empty_principal_is_not_authenticated() {
        assert!(!Principal::empty().is_authenticated());
    }

    #[test]
    fn test_claim_kind_lookup_is_case_sensitive() {
        let identity = Identity::authenticated(AuthenticationType::ClientCertificate)
            .with_claim(claim_types::PARTNER, "SQUIRE");

        assert_eq!(identity.find_first(claim_types::PARTNER), Some("SQUIRE"));
        assert_eq!(identity.find_first("URN:ORDERING:PARTNER"), None);
    }

    #[test]
    fn test_multi_valued_claims_keep_first() {
        let identity = Identity::authenticated(AuthenticationType::Token)
            .with_claim("role", "reader")
            .with_claim("role", "writer");

        assert_eq!(identity.find_first("role"), Some("reader"));
        assert_eq!(identity.claims().len(), 2);
    }
}
