//! drafts::service
//!
//! The draft lifecycle engine.
//!
//! # State Machine
//!
//! A draft starts `pending` and ends `approved` or `rejected`; terminal
//! states are never left. `update` requires `pending`. Status checks are
//! read-then-act: the check and the following remote mutation are not
//! atomic, so an approve racing an in-flight edit is possible. That
//! window is an accepted property of the single-admin review workflow;
//! conflicting *edits* are ordered by the fingerprint check in the
//! forge, not by any lock here.
//!
//! # Failure Ordering
//!
//! Remote effects come first, the record write last:
//!
//! - `create`: branch, record, then the optional initial commit. A
//!   branch-creation failure persists nothing; a failed initial commit
//!   still leaves a valid empty-content draft behind.
//! - `approve`: open PR, merge, delete branch, then the status write. A
//!   merge failure leaves the draft pending with its branch intact for
//!   retry.
//! - `reject`/`delete`: branch deletion tolerates an already-gone ref,
//!   so a retried rejection converges.

use std::sync::Arc;

use thiserror::Error;

use super::model::{Author, Comment, Draft, DraftStatus};
use crate::core::naming::draft_branch_name;
use crate::core::types::{DraftId, Fingerprint, TypeError};
use crate::forge::{FileRevision, Forge, ForgeError, RemoteFile, TreeEntry};
use crate::store::{DraftStore, StoreError};

/// Errors from draft lifecycle operations.
///
/// Forge and store errors pass through unmodified in meaning; the
/// variants added here cover local invariant violations only.
#[derive(Debug, Error)]
pub enum DraftError {
    /// The referenced draft does not exist.
    #[error("draft not found: {0}")]
    NotFound(String),

    /// The operation requires a pending draft.
    #[error("draft {id} is {status}; operation requires a pending draft")]
    InvalidState {
        /// The draft id.
        id: String,
        /// The status that blocked the operation.
        status: DraftStatus,
    },

    /// A derived branch name failed validation.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// A remote operation failed.
    #[error(transparent)]
    Forge(#[from] ForgeError),

    /// A record store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The draft lifecycle engine.
///
/// Orchestrates the record store and the repository adapter to implement
/// create/update/approve/reject, plus comments and content reads. The
/// engine performs no authorization; callers check permission before
/// invoking.
///
/// # Example
///
/// ```ignore
/// let service = DraftService::new(forge, store);
/// let draft = service
///     .create_draft("guides/intro.md", "Rework intro", Some("# Intro"), Author::anonymous())
///     .await?;
/// service.approve_draft(&draft.id).await?;
/// ```
pub struct DraftService {
    forge: Arc<dyn Forge>,
    store: DraftStore,
}

impl DraftService {
    /// Create a new lifecycle engine over a forge and a record store.
    pub fn new(forge: Arc<dyn Forge>, store: DraftStore) -> Self {
        Self { forge, store }
    }

    /// Fetch a draft, failing with `NotFound` when absent.
    async fn require_draft(&self, id: &DraftId) -> Result<Draft, DraftError> {
        self.store
            .get_draft(id)
            .await?
            .ok_or_else(|| DraftError::NotFound(id.as_str().to_string()))
    }

    /// Fetch a draft and require it to be pending.
    async fn require_pending(&self, id: &DraftId) -> Result<Draft, DraftError> {
        let draft = self.require_draft(id).await?;
        if draft.status != DraftStatus::Pending {
            return Err(DraftError::InvalidState {
                id: id.as_str().to_string(),
                status: draft.status,
            });
        }
        Ok(draft)
    }

    /// Create a new draft for a document path.
    ///
    /// Creates a uniquely named branch off the base branch head, persists
    /// the pending record, and commits `initial_content` when supplied.
    /// If branch creation fails nothing is persisted; if the initial
    /// commit fails the record already exists as a valid empty-content
    /// draft and the commit error propagates.
    pub async fn create_draft(
        &self,
        doc_path: &str,
        title: &str,
        initial_content: Option<&str>,
        author: Author,
    ) -> Result<Draft, DraftError> {
        let branch = draft_branch_name(doc_path)?;

        self.forge.create_branch(&branch).await?;

        let draft = Draft::new(doc_path, title, branch.clone(), author);
        self.store.insert_draft(&draft).await?;

        tracing::info!(draft_id = %draft.id, branch = %branch, doc_path, "created draft");

        if let Some(content) = initial_content {
            self.forge
                .commit_file(
                    &branch,
                    doc_path,
                    content,
                    &format!("Draft: {title}"),
                    None,
                )
                .await?;
        }

        Ok(draft)
    }

    /// Commit new content to a pending draft.
    ///
    /// `expected_fingerprint` enables the conflict check: a concurrent
    /// editor who committed since the caller last read fails this call
    /// with `ForgeError::Conflict`, and the caller re-reads to reconcile.
    pub async fn update_draft(
        &self,
        id: &DraftId,
        content: &str,
        expected_fingerprint: Option<&Fingerprint>,
    ) -> Result<Draft, DraftError> {
        let mut draft = self.require_pending(id).await?;

        self.forge
            .commit_file(
                &draft.branch_name,
                &draft.doc_path,
                content,
                &format!("Update {}", draft.doc_path),
                expected_fingerprint,
            )
            .await?;

        draft.touch();
        self.store.update_draft(&draft).await?;

        tracing::debug!(draft_id = %draft.id, "updated draft content");
        Ok(draft)
    }

    /// Publish a pending draft: open a PR, squash-merge it, delete the
    /// branch, and mark the draft approved.
    ///
    /// A merge failure (for example a conflicting change on the base
    /// branch) propagates without touching the record: the draft stays
    /// pending with its branch intact so approval can be retried. The
    /// status write is deliberately the last step; a crash after branch
    /// deletion but before it leaves a pending draft without a backing
    /// branch, surfaced on the next operation as a remote `NotFound`.
    pub async fn approve_draft(&self, id: &DraftId) -> Result<Draft, DraftError> {
        let mut draft = self.require_pending(id).await?;

        let pr = self
            .forge
            .open_pull_request(
                &draft.branch_name,
                &format!("Publish: {}", draft.title),
                &format!("Publishes draft changes to `{}`.", draft.doc_path),
            )
            .await?;

        match self.forge.merge_pull_request(pr.number).await {
            Ok(()) => {}
            // GitHub answers 405 when the pull request was already
            // merged; a retried approval treats that as done.
            Err(ForgeError::Client { status: 405, .. }) => {}
            Err(e) => return Err(e.into()),
        }

        self.forge.delete_branch(&draft.branch_name).await?;

        draft.status = DraftStatus::Approved;
        draft.touch();
        self.store.update_draft(&draft).await?;

        tracing::info!(draft_id = %draft.id, pr = pr.number, "approved draft");
        Ok(draft)
    }

    /// Decline a pending draft: delete its branch, optionally record the
    /// reason as a comment, and mark the draft rejected.
    ///
    /// An already-deleted branch counts as success - a prior partial
    /// failure may have removed it.
    pub async fn reject_draft(
        &self,
        id: &DraftId,
        reason: Option<&str>,
    ) -> Result<Draft, DraftError> {
        let mut draft = self.require_pending(id).await?;

        self.forge.delete_branch(&draft.branch_name).await?;

        if let Some(reason) = reason {
            let comment = Comment::new(draft.id.clone(), reason, Author::anonymous());
            self.store.insert_comment(&comment).await?;
        }

        draft.status = DraftStatus::Rejected;
        draft.touch();
        self.store.update_draft(&draft).await?;

        tracing::info!(draft_id = %draft.id, "rejected draft");
        Ok(draft)
    }

    /// Remove a draft in any status: best-effort branch deletion, then
    /// the record and its comments.
    pub async fn delete_draft(&self, id: &DraftId) -> Result<(), DraftError> {
        let draft = self.require_draft(id).await?;

        self.forge.delete_branch(&draft.branch_name).await?;
        self.store.delete_draft(id).await?;

        tracing::info!(draft_id = %id, "deleted draft");
        Ok(())
    }

    /// Add a comment to a draft in any status.
    ///
    /// Does not bump the draft's `updated_at`: commentary is not a
    /// content mutation.
    pub async fn add_comment(
        &self,
        id: &DraftId,
        content: &str,
        author: Author,
    ) -> Result<Comment, DraftError> {
        let draft = self.require_draft(id).await?;

        let comment = Comment::new(draft.id, content, author);
        self.store.insert_comment(&comment).await?;
        Ok(comment)
    }

    /// List drafts, optionally filtered by status.
    pub async fn list_drafts(
        &self,
        status: Option<DraftStatus>,
    ) -> Result<Vec<Draft>, DraftError> {
        Ok(self.store.list_drafts(status).await?)
    }

    /// Get a draft by id.
    pub async fn get_draft(&self, id: &DraftId) -> Result<Draft, DraftError> {
        self.require_draft(id).await
    }

    /// List a draft's comments in creation order.
    pub async fn list_comments(&self, id: &DraftId) -> Result<Vec<Comment>, DraftError> {
        self.require_draft(id).await?;
        Ok(self.store.list_comments(id).await?)
    }

    /// List the published content tree.
    pub async fn get_tree(&self) -> Result<Vec<TreeEntry>, DraftError> {
        Ok(self.forge.list_tree().await?)
    }

    /// Read document content at a ref (default: the base branch).
    pub async fn get_content(
        &self,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<RemoteFile, DraftError> {
        Ok(self.forge.read_file(path, git_ref).await?)
    }

    /// List the published history of a document.
    pub async fn get_history(&self, path: &str) -> Result<Vec<FileRevision>, DraftError> {
        Ok(self.forge.list_file_history(path).await?)
    }
}
