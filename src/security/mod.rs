//! # Security Module
//!
//! URL-based access-control policies for deployed applications.
//!
//! ## Overview
//!
//! An application declares secured URL configs, each pairing a URL pattern
//! with an authentication policy descriptor:
//!
//! ```yaml
//! security:
//!   - url-pattern: /admin/*
//!     auth:
//!       auth-type: basic
//!       realm: Administration
//!       users:
//!         admin: 8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918
//! ```
//!
//! The servlet locator compiles these into a secured route table and attaches
//! the matching [`AuthConfig`] to every resolution it returns. The connection
//! service then asks an [`Authenticator`] to validate the request before the
//! servlet runs.
//!
//! ## Authenticators
//!
//! [`BasicAuthenticator`] implements HTTP Basic authentication against the
//! `users` table of the policy, where each value is the lowercase hex SHA-256
//! digest of the user's password.

mod basic;

use crate::server::ServletRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use basic::{password_digest, BasicAuthenticator};

/// One entry of an application's security configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuredUrlConfig {
    #[serde(rename = "url-pattern")]
    pub url_pattern: String,
    pub auth: AuthConfig,
}

impl SecuredUrlConfig {
    pub fn new(url_pattern: impl Into<String>, auth: AuthConfig) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            auth,
        }
    }
}

/// Authentication scheme required by a policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    #[serde(alias = "Basic")]
    Basic,
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthType::Basic => write!(f, "Basic"),
        }
    }
}

/// Policy descriptor attached to a resolution by the secured route table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthConfig {
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub realm: String,
    /// User name -> lowercase hex SHA-256 of the password
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

impl AuthConfig {
    /// Basic-auth policy for `realm` with no users.
    pub fn basic(realm: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::Basic,
            realm: realm.into(),
            users: BTreeMap::new(),
        }
    }

    /// Add a user, hashing the clear-text password.
    #[must_use]
    pub fn with_user(mut self, name: impl Into<String>, password: &str) -> Self {
        self.users.insert(name.into(), password_digest(password));
        self
    }

    /// Value for the `WWW-Authenticate` challenge header.
    #[must_use]
    pub fn challenge(&self) -> String {
        format!("{} realm=\"{}\"", self.auth_type, self.realm.replace('"', "'"))
    }
}

/// Trait for validating a request against a policy descriptor.
pub trait Authenticator: Send + Sync {
    /// `true` if the request carries credentials accepted by `config`.
    fn authenticate(&self, config: &AuthConfig, request: &dyn ServletRequest) -> bool;
}
