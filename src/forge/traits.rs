//! forge::traits
//!
//! Forge trait definition for interacting with remote hosting services.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! All methods return `Result` to handle API errors gracefully.
//!
//! A forge instance is scoped to one configured repository (owner, name,
//! base branch, content root). The lifecycle engine holds a `dyn Forge` and
//! translates draft intents into these primitives; it never sees HTTP.
//!
//! # Example
//!
//! ```ignore
//! use draftforge::forge::Forge;
//! use draftforge::core::naming::draft_branch_name;
//!
//! async fn stage_edit(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let branch = draft_branch_name("guides/intro.md")?;
//!     forge.create_branch(&branch).await?;
//!     forge
//!         .commit_file(&branch, "guides/intro.md", "# Intro", "Update intro", None)
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{BranchName, Fingerprint};

/// Page size cap for file history listings.
pub const HISTORY_PAGE_SIZE: usize = 50;

/// Errors from forge operations.
///
/// These error types map to the failure modes of remote hosting APIs.
/// The retry layer consumes this classification directly: `Client` is
/// never retried, `RateLimited` waits for the reset when one is known,
/// and `Transient` is retried with bounded exponential backoff.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// The requested resource (path, ref, or pull request) was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency conflict: the content changed since it was
    /// read. Carries HTTP semantics of a 409.
    #[error("conflict on '{path}': {message}")]
    Conflict {
        /// Path whose write was aborted.
        path: String,
        /// What mismatched.
        message: String,
    },

    /// Non-retryable client error (4xx other than 429), carrying the
    /// original status. Repeating the call will not change the outcome.
    #[error("API client error: {status} - {message}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limit exceeded. `retry_in` is the wait until quota resets,
    /// when the API reported one.
    #[error("rate limited")]
    RateLimited {
        /// Wait until the quota resets, if the API said.
        retry_in: Option<Duration>,
    },

    /// Transient failure: 5xx or a transport error. Retryable; surfaced
    /// once the retry budget is exhausted.
    #[error("transient error: {message}")]
    Transient {
        /// Description of the underlying failure.
        message: String,
    },
}

impl ForgeError {
    /// Whether the retry layer may repeat the failed call.
    pub fn is_transient(&self) -> bool {
        matches!(self, ForgeError::Transient { .. })
    }
}

/// A tree entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file (blob).
    File,
    /// A directory (tree).
    Dir,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Dir => write!(f, "dir"),
        }
    }
}

/// One entry of the content tree, path relative to the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path with the content root prefix stripped.
    pub path: String,
    /// Whether the entry is a file or a directory.
    pub kind: EntryKind,
}

/// A decoded text file read from the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Decoded UTF-8 content.
    pub content: String,
    /// Current fingerprint of the stored content. Callers hold on to this
    /// for conflict-aware commits and re-read it after a `Conflict`.
    pub fingerprint: Fingerprint,
}

/// A binary file read from the remote. No text decoding is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFile {
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// Current fingerprint of the stored content.
    pub fingerprint: Fingerprint,
}

/// Pull request information returned from the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number.
    pub number: u64,
    /// PR URL (web URL for viewing).
    pub url: String,
}

/// One revision in a file's history, most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRevision {
    /// Commit identifier of the revision.
    pub revision_id: String,
    /// Commit message.
    pub message: String,
    /// Commit timestamp, seconds since the epoch.
    pub timestamp: i64,
    /// Author name, when the remote reported one.
    pub author: Option<String>,
}

/// The Forge trait for interacting with remote hosting services.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Network-bound operations
/// are already wrapped by the retry layer inside each implementation;
/// what reaches the caller is the final classified error.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github", "mock").
    fn name(&self) -> &'static str;

    /// List all paths under the content root on the base branch.
    ///
    /// Paths are returned with the content root prefix stripped, each
    /// tagged as file or directory.
    async fn list_tree(&self) -> Result<Vec<TreeEntry>, ForgeError>;

    /// Read the decoded text content of `path` at `git_ref`.
    ///
    /// `git_ref` defaults to the base branch when `None`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the path does not exist at that ref
    async fn read_file(&self, path: &str, git_ref: Option<&str>) -> Result<RemoteFile, ForgeError>;

    /// Create a new branch pointing at the current head of the base branch.
    ///
    /// # Returns
    ///
    /// The commit identifier the new branch points at.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the base branch vanished
    /// - `Client` if the ref already exists (not retried)
    async fn create_branch(&self, name: &BranchName) -> Result<String, ForgeError>;

    /// Commit `content` to `path` on `branch` with conflict detection.
    ///
    /// If `expected_fingerprint` is supplied and differs from the current
    /// stored fingerprint for the path, the write is aborted with
    /// `Conflict` instead of being performed. Absence of the file is not
    /// an error; it simply means the commit creates it. Without an
    /// expected fingerprint the write proceeds unconditionally
    /// (last-writer-wins, by the caller's choice).
    ///
    /// # Returns
    ///
    /// The fingerprint of the newly stored content.
    async fn commit_file(
        &self,
        branch: &BranchName,
        path: &str,
        content: &str,
        message: &str,
        expected_fingerprint: Option<&Fingerprint>,
    ) -> Result<Fingerprint, ForgeError>;

    /// Open a pull request from `branch` into the base branch.
    async fn open_pull_request(
        &self,
        branch: &BranchName,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, ForgeError>;

    /// Merge a pull request with squash semantics.
    ///
    /// An "already merged" answer from the remote is surfaced unchanged
    /// (as the `Client` error the API produced); deciding that it counts
    /// as success belongs to the caller layer, not here.
    async fn merge_pull_request(&self, number: u64) -> Result<(), ForgeError>;

    /// Delete a branch ref.
    ///
    /// A missing ref (404) is treated as success: a prior partial failure
    /// may have already removed it.
    async fn delete_branch(&self, name: &BranchName) -> Result<(), ForgeError>;

    /// List the commit history touching `path` on the base branch,
    /// most recent first, capped at [`HISTORY_PAGE_SIZE`] entries.
    async fn list_file_history(&self, path: &str) -> Result<Vec<FileRevision>, ForgeError>;

    /// Commit raw bytes to `path`, with the same conflict-free,
    /// last-writer-wins semantics as `commit_file` without an expected
    /// fingerprint.
    ///
    /// `branch` defaults to the base branch when `None`.
    async fn upload_binary(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        branch: Option<&BranchName>,
    ) -> Result<Fingerprint, ForgeError>;

    /// Read raw bytes of `path` at `git_ref` (default base branch).
    /// No text decoding is applied.
    async fn read_binary(&self, path: &str, git_ref: Option<&str>)
        -> Result<BinaryFile, ForgeError>;
}
