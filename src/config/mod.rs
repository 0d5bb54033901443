//! Configuration module for ordergate
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and comprehensive validation. Secrets are
//! expected to arrive via `${VAR}` expansion rather than committed values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::auth::ClientCertificateClaimsMap;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
fn expand_env_vars(s: &str) -> String {
    // Regex to capture ${VAR} or ${VAR:-default}
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0).unwrap();
        let var_name = cap.get(1).unwrap().as_str();

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                if let Some(default) = cap.get(2) {
                    default.as_str().to_string()
                } else {
                    // No env var and no default. Keep the original placeholder.
                    full_match.as_str().to_string()
                }
            }
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.security.validate()
    }
}

/// Security (authentication + authorization) configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub shared_secret: SharedSecretConfig,
    #[serde(default)]
    pub client_certificate: ClientCertificateConfig,
    #[serde(default)]
    pub policies: PoliciesConfig,
}

impl SecurityConfig {
    /// Validate the security configuration.
    ///
    /// The same invariants are re-enforced by the handler constructors, so a
    /// handler can never exist in an invalid state even when built from an
    /// unvalidated configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared_secret.enabled {
            if self
                .shared_secret
                .primary_key
                .as_deref()
                .unwrap_or("")
                .is_empty()
            {
                return Err(ConfigError::ValidationError(
                    "The primary key must be configured in primary_key when the shared-secret handler is enabled".into(),
                ));
            }

            if self
                .shared_secret
                .primary_secret
                .as_deref()
                .unwrap_or("")
                .trim()
                .is_empty()
            {
                return Err(ConfigError::ValidationError(
                    "The primary secret must be configured in primary_secret when the shared-secret handler is enabled".into(),
                ));
            }
        }

        if let Some(serialized) = self
            .client_certificate
            .serialized_certificate_claims_mapping
            .as_deref()
        {
            ClientCertificateClaimsMap::deserialize(serialized).map_err(|error| {
                ConfigError::ValidationError(format!(
                    "Invalid serialized_certificate_claims_mapping: {error}"
                ))
            })?;
        }

        Ok(())
    }
}

/// Shared-secret authentication handler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedSecretConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Required when the handler is enabled.
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Required when the handler is enabled.
    #[serde(default)]
    pub primary_secret: Option<String>,
    /// Optional rotation pair; both key and secret must be present to be
    /// considered during authentication.
    #[serde(default)]
    pub secondary_key: Option<String>,
    #[serde(default)]
    pub secondary_secret: Option<String>,
}

/// Client-certificate authentication handler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCertificateConfig {
    #[serde(default)]
    pub enabled: bool,
    /// When true, the certificate source only resolves certificates it
    /// considers valid.
    #[serde(default = "default_enforce_local_validation")]
    pub enforce_local_certificate_validation: bool,
    /// JSON mapping of certificate thumbprints to identity claims; parsed
    /// lazily on first use by the handler.
    #[serde(default)]
    pub serialized_certificate_claims_mapping: Option<String>,
}

impl Default for ClientCertificateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            enforce_local_certificate_validation: default_enforce_local_validation(),
            serialized_certificate_claims_mapping: None,
        }
    }
}

fn default_enforce_local_validation() -> bool {
    true
}

/// Authorization policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoliciesConfig {
    #[serde(default = "default_enabled_toggle")]
    pub authenticated_principal: PolicyToggle,
    #[serde(default)]
    pub require_ssl: RequireSslPolicyConfig,
    #[serde(default = "default_enabled_toggle")]
    pub partner: PolicyToggle,
    #[serde(default)]
    pub privileged_operation: PolicyToggle,
}

impl Default for PoliciesConfig {
    fn default() -> Self {
        Self {
            authenticated_principal: default_enabled_toggle(),
            require_ssl: RequireSslPolicyConfig::default(),
            partner: default_enabled_toggle(),
            privileged_operation: PolicyToggle::default(),
        }
    }
}

/// An enable/disable switch for a policy with no other knobs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PolicyToggle {
    #[serde(default)]
    pub enabled: bool,
}

fn default_enabled_toggle() -> PolicyToggle {
    PolicyToggle { enabled: true }
}

/// Transport-security policy configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequireSslPolicyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// When true, insecure requests that target loopback are permitted.
    #[serde(default)]
    pub allow_loopback_exception: bool,
}

impl Default for RequireSslPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            allow_loopback_exception: false,
        }
    }
}

fn default_true() -> bool {
    true
}
