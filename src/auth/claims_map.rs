//! Certificate thumbprint to identity claims mapping
//!
//! The map is stored in configuration as a compact JSON string of the form
//! `{"<thumbprint>": {"<claim>": "<value>", ...}, ...}` and rehydrated on
//! first use by the client-certificate handler.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims map errors
#[derive(Error, Debug)]
pub enum ClaimsMapError {
    #[error("The thumbprint '{0}' already exists in the map")]
    DuplicateThumbprint(String),

    #[error("Failed to parse claims map: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A mapping of certificate thumbprints to the identity claims granted to
/// callers presenting that certificate.
///
/// Thumbprints are compared case-insensitively and each thumbprint holds at
/// most one claim set. Looking up an absent thumbprint yields `None`, never
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientCertificateClaimsMap {
    mappings: HashMap<String, HashMap<String, String>>,
}

impl ClientCertificateClaimsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The claim set associated with the thumbprint, if it is known.
    pub fn get(&self, thumbprint: &str) -> Option<&HashMap<String, String>> {
        self.mappings
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(thumbprint))
            .map(|(_, claims)| claims)
    }

    pub fn contains_thumbprint(&self, thumbprint: &str) -> bool {
        self.get(thumbprint).is_some()
    }

    /// The set of known certificate thumbprints; no guarantee is made on
    /// whether each is associated with a populated claim set.
    pub fn thumbprints(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Register a certificate and its claims. A thumbprint may be registered
    /// once; re-registration under any casing is rejected.
    pub fn add_certificate(
        &mut self,
        thumbprint: impl Into<String>,
        claims: Option<HashMap<String, String>>,
    ) -> Result<(), ClaimsMapError> {
        let thumbprint = thumbprint.into();

        if self.contains_thumbprint(&thumbprint) {
            return Err(ClaimsMapError::DuplicateThumbprint(thumbprint));
        }

        self.mappings.insert(thumbprint, claims.unwrap_or_default());
        Ok(())
    }

    /// Serialize the map to its compact JSON configuration form.
    pub fn serialize(&self) -> Result<String, ClaimsMapError> {
        Ok(serde_json::to_string(&self.mappings)?)
    }

    /// Rehydrate a map from its serialized configuration form.
    ///
    /// An empty or absent value yields an empty map rather than a failure, so
    /// a deployment with no mapped certificates needs no placeholder value.
    pub fn deserialize(serialized: &str) -> Result<Self, ClaimsMapError> {
        if serialized.trim().is_empty() {
            return Ok(Self::new());
        }

        Ok(serde_json::from_str(serialized)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut map = ClientCertificateClaimsMap::new();
        map.add_certificate("AA11BB22", Some(claims(&[("urn:ordering:partner", "SQUIRE")])))
            .unwrap();

        assert!(map.contains_thumbprint("aa11bb22"));
        assert_eq!(
            map.get("aa11BB22").and_then(|c| c.get("urn:ordering:partner")),
            Some(&"SQUIRE".to_string())
        );
    }

    #[test]
    fn test_absent_thumbprint_yields_none() {
        let map = ClientCertificateClaimsMap::new();
        assert!(map.get("AA11BB22").is_none());
        assert!(!map.contains_thumbprint("AA11BB22"));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut map = ClientCertificateClaimsMap::new();
        map.add_certificate("AA11BB22", None).unwrap();

        let result = map.add_certificate("aa11bb22", None);
        assert!(matches!(
            result,
            Err(ClaimsMapError::DuplicateThumbprint(_))
        ));
    }

    #[test]
    fn test_registration_without_claims_yields_empty_set() {
        let mut map = ClientCertificateClaimsMap::new();
        map.add_certificate("AA11BB22", None).unwrap();
        assert!(map.get("AA11BB22").map(HashMap::is_empty).unwrap_or(false));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut map = ClientCertificateClaimsMap::new();
        map.add_certificate(
            "AA11BB22",
            Some(claims(&[
                ("urn:ordering:partner", "SQUIRE"),
                ("urn:ordering:security:privilege:sudo", "true"),
            ])),
        )
        .unwrap();
        map.add_certificate("CC33DD44", None).unwrap();

        let serialized = map.serialize().unwrap();
        let restored = ClientCertificateClaimsMap::deserialize(&serialized).unwrap();
        assert_eq!(restored, map);
    }

    #[test]
    fn test_deserialize_empty_yields_empty_map() {
        assert!(ClientCertificateClaimsMap::deserialize("").unwrap().is_empty());
        assert!(ClientCertificateClaimsMap::deserialize("  ").unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_malformed_fails() {
        assert!(ClientCertificateClaimsMap::deserialize("{not json").is_err());
    }
}
