//! forge::factory
//!
//! Forge selection and creation.
//!
//! # Design
//!
//! This module provides a central location for forge selection logic.
//! The lifecycle engine holds an `Arc<dyn Forge>` built here instead of
//! importing specific forge implementations directly, keeping the
//! adapter boundary in one place.

use std::sync::Arc;

use super::github::GitHubForge;
use super::retry::RetryPolicy;
use super::traits::Forge;
use crate::core::config::RepositoryConfig;

/// Supported forge providers.
///
/// GitHub is the only production provider today; the enum exists so
/// configuration can name a provider and additional hosts can slot in
/// without touching call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForgeProvider {
    /// GitHub (always available)
    #[default]
    GitHub,
}

impl ForgeProvider {
    /// Get the provider name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ForgeProvider::GitHub => "github",
        }
    }

    /// Parse a provider from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(ForgeProvider::GitHub),
            _ => None,
        }
    }
}

impl std::fmt::Display for ForgeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Create a forge for the configured repository.
///
/// The token is a personal access token with write scope on the target
/// repository, supplied out of band.
///
/// # Example
///
/// ```
/// use draftforge::core::config::RepositoryConfig;
/// use draftforge::forge::{create_forge, Forge, ForgeProvider};
///
/// let config = RepositoryConfig {
///     owner: "myorg".into(),
///     name: "handbook".into(),
///     base_branch: "main".into(),
///     content_root: "docs".into(),
///     api_base: None,
/// };
/// let forge = create_forge(ForgeProvider::GitHub, &config, "ghp_token");
/// assert_eq!(forge.name(), "github");
/// ```
pub fn create_forge(
    provider: ForgeProvider,
    config: &RepositoryConfig,
    token: impl Into<String>,
) -> Arc<dyn Forge> {
    match provider {
        ForgeProvider::GitHub => Arc::new(
            GitHubForge::from_config(config, token).with_retry_policy(RetryPolicy::default()),
        ),
    }
}
