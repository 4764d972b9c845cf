//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Configuration is an explicit value: it is loaded once at process start
//! and passed by reference into the [`DraftService`] and forge
//! constructors. There is no module-level cache and no global singleton,
//! so tests can construct as many configurations as they need.
//!
//! Credentials are deliberately absent from the schema. The access token
//! for the hosting API is supplied out of band (environment or secret
//! store) by the embedding process and handed to the forge factory
//! directly.
//!
//! # Example
//!
//! ```no_run
//! use draftforge::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("draftforge.toml")).unwrap();
//! println!("Publishing into {}/{}", config.repository.owner, config.repository.name);
//! ```
//!
//! [`DraftService`]: crate::drafts::DraftService

pub mod schema;

pub use schema::{AuthConfig, Config, RepositoryConfig};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}
