//! drafts::model
//!
//! Draft and comment record types.
//!
//! # Invariants
//!
//! - A draft's `id`, `doc_path`, and `branch_name` are immutable after
//!   creation.
//! - `status` is monotonic: once a draft reaches a terminal status it
//!   never leaves it. The lifecycle engine enforces this; the types here
//!   only express it.
//! - Comments are immutable once created and always belong to exactly
//!   one draft.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::types::{BranchName, DraftId};

/// Lifecycle status of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    /// Under edit and review; the backing branch is live.
    Pending,
    /// Published: merged into the base branch, branch deleted.
    Approved,
    /// Declined: branch deleted, record retained.
    Rejected,
}

impl DraftStatus {
    /// Whether the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftStatus::Approved | DraftStatus::Rejected)
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftStatus::Pending => write!(f, "pending"),
            DraftStatus::Approved => write!(f, "approved"),
            DraftStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Authorship attached to a draft or comment.
///
/// Both fields are nullable: anonymous authorship is valid in permissive
/// auth configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Principal id, when authenticated.
    pub id: Option<String>,
    /// Principal email, when known.
    pub email: Option<String>,
}

impl Author {
    /// An anonymous author.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// One proposed change to exactly one document path, backed by a
/// version-control branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Opaque unique identifier, generated at creation.
    pub id: DraftId,
    /// Relative path of the target document.
    pub doc_path: String,
    /// Name of the backing branch; unique across all drafts.
    pub branch_name: BranchName,
    /// Human label; mutable only while pending.
    pub title: String,
    /// Author principal id, if any.
    pub author_id: Option<String>,
    /// Author email, if any.
    pub author_email: Option<String>,
    /// Lifecycle status.
    pub status: DraftStatus,
    /// Creation time, seconds since the epoch.
    pub created_at: i64,
    /// Last mutation time, seconds since the epoch.
    pub updated_at: i64,
}

impl Draft {
    /// Construct a new pending draft.
    pub fn new(
        doc_path: impl Into<String>,
        title: impl Into<String>,
        branch_name: BranchName,
        author: Author,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: DraftId::generate(),
            doc_path: doc_path.into(),
            branch_name,
            title: title.into(),
            author_id: author.id,
            author_email: author.email,
            status: DraftStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().timestamp();
    }
}

/// Reviewer or contributor feedback on a draft.
///
/// Comments may be added regardless of draft status: feedback on a
/// rejected draft must remain possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Opaque unique identifier.
    pub id: String,
    /// The draft this comment belongs to.
    pub draft_id: DraftId,
    /// Author principal id, if any.
    pub author_id: Option<String>,
    /// Author email, if any.
    pub author_email: Option<String>,
    /// Free-text content.
    pub content: String,
    /// Creation time, seconds since the epoch.
    pub created_at: i64,
}

impl Comment {
    /// Construct a new comment on a draft.
    pub fn new(draft_id: DraftId, content: impl Into<String>, author: Author) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            draft_id,
            author_id: author.id,
            author_email: author.email,
            content: content.into(),
            created_at: Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch() -> BranchName {
        BranchName::new("draft/guide-md-a1b2c3d4").unwrap()
    }

    #[test]
    fn new_draft_is_pending() {
        let draft = Draft::new("guide.md", "Guide", branch(), Author::anonymous());
        assert_eq!(draft.status, DraftStatus::Pending);
        assert_eq!(draft.created_at, draft.updated_at);
        assert!(draft.author_id.is_none());
        assert!(draft.author_email.is_none());
    }

    #[test]
    fn authored_draft_carries_principal() {
        let author = Author {
            id: Some("u1".into()),
            email: Some("u1@example.com".into()),
        };
        let draft = Draft::new("guide.md", "Guide", branch(), author);
        assert_eq!(draft.author_id.as_deref(), Some("u1"));
        assert_eq!(draft.author_email.as_deref(), Some("u1@example.com"));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!DraftStatus::Pending.is_terminal());
        assert!(DraftStatus::Approved.is_terminal());
        assert!(DraftStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DraftStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&DraftStatus::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(format!("{}", DraftStatus::Rejected), "rejected");
    }

    #[test]
    fn draft_roundtrips_through_json() {
        let draft = Draft::new("guide.md", "Guide", branch(), Author::anonymous());
        let json = serde_json::to_string(&draft).unwrap();
        let back: Draft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn comments_get_unique_ids() {
        let draft_id = DraftId::generate();
        let a = Comment::new(draft_id.clone(), "first", Author::anonymous());
        let b = Comment::new(draft_id, "second", Author::anonymous());
        assert_ne!(a.id, b.id);
    }
}
