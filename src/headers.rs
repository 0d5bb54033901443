//! Well-known HTTP headers and credential header parsing
//!
//! Custom headers specific to order fulfillment use the "ORD-" prefix to
//! group them and disambiguate their origin. The "X-" prefix is avoided per
//! RFC 6648 (https://tools.ietf.org/html/rfc6648).

use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;

/// The header that carries proof of authentication/authorization.
pub const AUTHORIZATION: &str = "Authorization";

/// The header carrying an application key for shared-secret authentication.
pub const APPLICATION_KEY: &str = "ORD-AppKey";

/// The header carrying an application secret for shared-secret authentication.
pub const APPLICATION_SECRET: &str = "ORD-AppSecret";

/// The header carrying the request's correlation identifier; used in both
/// request and response messages.
pub const CORRELATION_ID: &str = "ORD-Correlation";

/// An ordered collection of HTTP headers with case-insensitive name lookup.
///
/// Insertion order is preserved so that logged header sets read the way they
/// arrived on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header. Repeated names are kept; `get` returns the first.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Get the first value for a header name, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// The parsed form of a credential header: the requested scheme plus the
/// `key="value"` tokens that followed it, in presentation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialTokens {
    scheme: String,
    tokens: Vec<(String, String)>,
}

impl CredentialTokens {
    /// An empty token set with no scheme; "no credential presented."
    pub fn empty() -> Self {
        Self::default()
    }

    /// The credential scheme named by the header; empty when none was parsed.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// First value for a token key, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(token, _)| token.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Parse a credential header of the form `Scheme key1="v1", key2="v2"`.
///
/// The first whitespace-delimited token is the scheme; the remainder is
/// parsed as `key="value"` pairs separated by whitespace and/or commas, with
/// surrounding double quotes trimmed. Parsing attempts to adhere to RFC 7235
/// (https://tools.ietf.org/html/rfc7235); malformed headers are parsed
/// loosely rather than rejected.
///
/// Malformed or empty input yields an empty scheme and an empty token set;
/// callers must treat "no scheme" as "no credential presented."
pub fn parse_credential_header(value: &str) -> CredentialTokens {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return CredentialTokens::empty();
    }

    let (scheme, remainder) = match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, rest),
        None => (trimmed, ""),
    };

    // A scheme is a bare token; an '=' in the first position means the header
    // skipped the scheme entirely and cannot be attributed to one.
    if scheme.is_empty() || scheme.contains('=') {
        return CredentialTokens::empty();
    }

    // Compiled once; this sits on the path of every authenticate/challenge.
    static PAIR_EXPRESSION: OnceLock<Regex> = OnceLock::new();
    let pair_expression = PAIR_EXPRESSION
        .get_or_init(|| Regex::new(r#"([\w-]+)="?([^",\s]*)"?"#).unwrap());

    let tokens = pair_expression
        .captures_iter(remainder)
        .map(|capture| (capture[1].to_string(), capture[2].to_string()))
        .collect();

    CredentialTokens {
        scheme: scheme.to_string(),
        tokens,
    }
}
