//! forge
//!
//! Repository adapter for remote hosting services.
//!
//! # Architecture
//!
//! The `Forge` trait translates draft lifecycle intents into remote
//! branch/commit/pull-request primitives. The lifecycle engine uses the
//! [`create_forge`] factory function rather than importing specific
//! implementations directly.
//!
//! - Forge operations are invoked only after local invariants are checked
//! - Forge failures are surfaced typed and never corrupt local records
//! - Every network call runs through the retry layer in [`retry`]
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait, error taxonomy, request/response types
//! - [`retry`]: Retry/backoff/rate-limit resilience layer
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: In-memory implementation for deterministic testing
//! - `factory`: Forge selection and creation

mod factory;
pub mod github;
pub mod mock;
pub mod retry;
mod traits;

pub use factory::{create_forge, ForgeProvider};
pub use retry::{with_retry, RetryPolicy};
pub use traits::*;
