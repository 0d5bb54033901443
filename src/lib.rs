//! Ordergate Library
//!
//! Authentication and authorization layer fronting a partner-facing
//! order-fulfillment API.
//!
//! # Features
//!
//! - **Interchangeable Schemes**: Shared-secret and client-certificate
//!   authentication behind one handler interface
//! - **Challenge Negotiation**: Strength-ranked `401` challenge selection
//! - **Certificate Claims**: Thumbprint-to-claims mapping with time-bounded
//!   validity
//! - **Ordered Policies**: Priority-ordered authorization with
//!   first-failure short-circuiting
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ordergate::auth::certificate::unavailable_resolver;
//! use ordergate::clock::SystemClock;
//! use ordergate::{Config, SecurityStack};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load("config.yaml")?;
//! let stack = SecurityStack::build(
//!     &config.security,
//!     Arc::new(SystemClock),
//!     unavailable_resolver(),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod authz;
pub mod clock;
pub mod config;
pub mod context;
pub mod headers;
pub mod principal;
pub mod stack;

// Re-export commonly used types
pub use config::Config;
pub use stack::SecurityStack;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
