//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the base branch must be a valid branch name).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_content_root() -> String {
    "docs".to_string()
}

/// Top-level configuration.
///
/// # Example
///
/// ```toml
/// [repository]
/// owner = "myorg"
/// name = "handbook"
/// base_branch = "main"
/// content_root = "docs"
///
/// [auth]
/// mode = "domain_restricted"
/// domain = "example.com"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Target repository identification and layout.
    pub repository: RepositoryConfig,

    /// Authentication mode for the embedding request layer.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::ParseError` if it is not valid TOML, and
    /// `ConfigError::InvalidValue` if any value fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.repository.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

/// Repository identification and content layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub name: String,

    /// The stable branch drafts are proposed against and merged into.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Directory under which all published documents live.
    #[serde(default = "default_content_root")]
    pub content_root: String,

    /// API base URL override (for GitHub Enterprise).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl RepositoryConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_empty() {
            return Err(ConfigError::InvalidValue(
                "repository.owner cannot be empty".into(),
            ));
        }
        if self.name.is_empty() {
            return Err(ConfigError::InvalidValue(
                "repository.name cannot be empty".into(),
            ));
        }
        BranchName::new(&self.base_branch).map_err(|e| {
            ConfigError::InvalidValue(format!("repository.base_branch: {e}"))
        })?;
        if self.content_root.starts_with('/') || self.content_root.ends_with('/') {
            return Err(ConfigError::InvalidValue(
                "repository.content_root must be a bare relative path".into(),
            ));
        }
        Ok(())
    }
}

/// Authentication mode, resolved to a concrete strategy at startup.
///
/// The variants are a closed set: the embedding layer maps each one to a
/// strategy implementation behind a single authenticator interface, and
/// this crate never needs to know which variant is active. All a strategy
/// produces is a `{id, email, role}` principal; drafts accept anonymous
/// authorship, so `Public` is a valid production mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication; contributors are anonymous.
    #[default]
    Public,

    /// Email-domain-restricted sign-in.
    DomainRestricted {
        /// The email domain allowed to sign in.
        domain: String,
    },

    /// OAuth sign-in against an external identity provider.
    Oauth {
        /// OAuth client identifier.
        client_id: String,
    },
}

impl AuthConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            AuthConfig::Public => Ok(()),
            AuthConfig::DomainRestricted { domain } => {
                if domain.is_empty() || !domain.contains('.') {
                    return Err(ConfigError::InvalidValue(format!(
                        "auth.domain '{domain}' is not a valid email domain"
                    )));
                }
                Ok(())
            }
            AuthConfig::Oauth { client_id } => {
                if client_id.is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "auth.client_id cannot be empty".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}
