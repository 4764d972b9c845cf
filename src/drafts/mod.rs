//! drafts
//!
//! The draft lifecycle engine and its record types.
//!
//! # Modules
//!
//! - [`model`] - `Draft`, `Comment`, `DraftStatus`, `Author`
//! - [`service`] - `DraftService`: the create/update/approve/reject state
//!   machine over the record store and the forge

pub mod model;
pub mod service;

pub use model::{Author, Comment, Draft, DraftStatus};
pub use service::{DraftError, DraftService};
