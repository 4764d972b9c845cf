//! Integration tests for the draft lifecycle engine.
//!
//! These tests run the full engine against the in-memory MockForge and a
//! temp-dir record store, covering the end-to-end create/approve/reject
//! scenarios and the concurrency ordering the fingerprint check provides.

use std::sync::Arc;

use tempfile::TempDir;

use draftforge::drafts::{Author, DraftError, DraftService, DraftStatus};
use draftforge::forge::mock::MockForge;
use draftforge::forge::ForgeError;
use draftforge::store::DraftStore;

struct Rig {
    service: Arc<DraftService>,
    forge: MockForge,
    _tmp: TempDir,
}

fn rig() -> Rig {
    // RUST_LOG=draftforge=debug surfaces engine traces on failures.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let tmp = TempDir::new().unwrap();
    let forge = MockForge::new();
    let store = DraftStore::open(tmp.path()).unwrap();
    Rig {
        service: Arc::new(DraftService::new(Arc::new(forge.clone()), store)),
        forge,
        _tmp: tmp,
    }
}

// =============================================================================
// Scenario A: create
// =============================================================================

#[tokio::test]
async fn create_stages_branch_record_and_content() {
    let rig = rig();

    let draft = rig
        .service
        .create_draft("guide.md", "Guide", Some("# Hello"), Author::anonymous())
        .await
        .unwrap();

    // Branch created, record persisted pending.
    assert!(rig.forge.branch_exists(draft.branch_name.as_str()));
    assert_eq!(draft.status, DraftStatus::Pending);
    let listed = rig
        .service
        .list_drafts(Some(DraftStatus::Pending))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, draft.id);

    // Content readable at the draft ref.
    let file = rig
        .service
        .get_content("guide.md", Some(draft.branch_name.as_str()))
        .await
        .unwrap();
    assert_eq!(file.content, "# Hello");

    // The base branch is untouched until approval.
    assert!(rig.forge.base_file("guide.md").is_none());
}

#[tokio::test]
async fn concurrent_drafts_for_one_path_get_distinct_branches() {
    let rig = rig();

    let a = rig
        .service
        .create_draft("guide.md", "First", None, Author::anonymous())
        .await
        .unwrap();
    let b = rig
        .service
        .create_draft("guide.md", "Second", None, Author::anonymous())
        .await
        .unwrap();

    assert_ne!(a.branch_name, b.branch_name);
    assert!(rig.forge.branch_exists(a.branch_name.as_str()));
    assert!(rig.forge.branch_exists(b.branch_name.as_str()));
}

// =============================================================================
// Scenario B: approve
// =============================================================================

#[tokio::test]
async fn approve_publishes_content_and_removes_branch() {
    let rig = rig();

    let draft = rig
        .service
        .create_draft("guide.md", "Guide", Some("# Hello"), Author::anonymous())
        .await
        .unwrap();

    let approved = rig.service.approve_draft(&draft.id).await.unwrap();

    // PR opened and squash-merged, branch deleted, status approved.
    let pr = rig.forge.pr(1).expect("a PR was opened");
    assert!(pr.merged);
    assert_eq!(pr.branch, draft.branch_name.as_str());
    assert!(!rig.forge.branch_exists(draft.branch_name.as_str()));
    assert_eq!(approved.status, DraftStatus::Approved);

    // Content now readable on the base branch.
    let file = rig.service.get_content("guide.md", None).await.unwrap();
    assert_eq!(file.content, "# Hello");

    // And the publish shows up in the file's history.
    let history = rig.service.get_history("guide.md").await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].message.contains("Guide"));
}

#[tokio::test]
async fn approved_draft_record_is_retained() {
    let rig = rig();
    let draft = rig
        .service
        .create_draft("guide.md", "Guide", Some("# x"), Author::anonymous())
        .await
        .unwrap();
    rig.service.approve_draft(&draft.id).await.unwrap();

    let reloaded = rig.service.get_draft(&draft.id).await.unwrap();
    assert_eq!(reloaded.status, DraftStatus::Approved);
    assert!(reloaded.updated_at >= reloaded.created_at);
}

// =============================================================================
// Scenario C: concurrent edits
// =============================================================================

#[tokio::test]
async fn concurrent_updates_with_stale_fingerprint_resolve_to_one_winner() {
    let rig = rig();

    let draft = rig
        .service
        .create_draft("guide.md", "Guide", Some("v1"), Author::anonymous())
        .await
        .unwrap();

    let stale = rig
        .service
        .get_content("guide.md", Some(draft.branch_name.as_str()))
        .await
        .unwrap()
        .fingerprint;

    let service_a = Arc::clone(&rig.service);
    let service_b = Arc::clone(&rig.service);
    let id_a = draft.id.clone();
    let id_b = draft.id.clone();
    let fp_a = stale.clone();
    let fp_b = stale.clone();

    let (a, b) = tokio::join!(
        async move { service_a.update_draft(&id_a, "edit from A", Some(&fp_a)).await },
        async move { service_b.update_draft(&id_b, "edit from B", Some(&fp_b)).await },
    );

    let conflicts = [&a, &b]
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(DraftError::Forge(ForgeError::Conflict { .. }))
            )
        })
        .count();
    assert_eq!(a.is_ok() as usize + b.is_ok() as usize, 1, "exactly one writer wins");
    assert_eq!(conflicts, 1, "the loser sees a typed conflict");

    // The loser re-reads and retries with the fresh fingerprint.
    let fresh = rig
        .service
        .get_content("guide.md", Some(draft.branch_name.as_str()))
        .await
        .unwrap()
        .fingerprint;
    rig.service
        .update_draft(&draft.id, "reconciled edit", Some(&fresh))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_without_fingerprint_is_last_writer_wins() {
    let rig = rig();
    let draft = rig
        .service
        .create_draft("guide.md", "Guide", Some("v1"), Author::anonymous())
        .await
        .unwrap();

    rig.service
        .update_draft(&draft.id, "v2", None)
        .await
        .unwrap();
    rig.service
        .update_draft(&draft.id, "v3", None)
        .await
        .unwrap();

    let file = rig
        .service
        .get_content("guide.md", Some(draft.branch_name.as_str()))
        .await
        .unwrap();
    assert_eq!(file.content, "v3");
}

// =============================================================================
// Rejection and deletion
// =============================================================================

#[tokio::test]
async fn reject_then_delete_converges() {
    let rig = rig();
    let draft = rig
        .service
        .create_draft("guide.md", "Guide", Some("# x"), Author::anonymous())
        .await
        .unwrap();

    rig.service
        .reject_draft(&draft.id, Some("not ready"))
        .await
        .unwrap();
    assert!(!rig.forge.branch_exists(draft.branch_name.as_str()));

    // Deleting after rejection re-deletes an absent branch; still fine.
    rig.service.delete_draft(&draft.id).await.unwrap();
    assert!(matches!(
        rig.service.get_draft(&draft.id).await.unwrap_err(),
        DraftError::NotFound(_)
    ));
}

#[tokio::test]
async fn update_title_survives_content_updates() {
    let rig = rig();
    let draft = rig
        .service
        .create_draft("guide.md", "Guide", Some("v1"), Author::anonymous())
        .await
        .unwrap();

    let updated = rig
        .service
        .update_draft(&draft.id, "v2", None)
        .await
        .unwrap();
    assert_eq!(updated.title, "Guide");
    assert_eq!(updated.doc_path, "guide.md");
    assert_eq!(updated.branch_name, draft.branch_name);
    assert!(updated.updated_at >= draft.updated_at);
}

// =============================================================================
// Tree and history passthroughs
// =============================================================================

#[tokio::test]
async fn tree_reflects_published_content_only() {
    let rig = rig();
    rig.forge.seed_file("published/intro.md", "# Intro");

    let draft = rig
        .service
        .create_draft("pending.md", "WIP", Some("# WIP"), Author::anonymous())
        .await
        .unwrap();

    let tree = rig.service.get_tree().await.unwrap();
    let paths: Vec<&str> = tree.iter().map(|e| e.path.as_str()).collect();
    assert!(paths.contains(&"published/intro.md"));
    assert!(paths.contains(&"published"));
    assert!(!paths.contains(&"pending.md"), "unmerged drafts stay invisible");

    rig.service.approve_draft(&draft.id).await.unwrap();
    let tree = rig.service.get_tree().await.unwrap();
    let paths: Vec<&str> = tree.iter().map(|e| e.path.as_str()).collect();
    assert!(paths.contains(&"pending.md"));
}

#[tokio::test]
async fn history_accumulates_across_approvals() {
    let rig = rig();

    for (title, content) in [("First", "v1"), ("Second", "v2")] {
        let draft = rig
            .service
            .create_draft("guide.md", title, Some(content), Author::anonymous())
            .await
            .unwrap();
        rig.service.approve_draft(&draft.id).await.unwrap();
    }

    let history = rig.service.get_history("guide.md").await.unwrap();
    assert_eq!(history.len(), 2);
    // Most recent first.
    assert!(history[0].message.contains("Second"));
    assert!(history[1].message.contains("First"));
}
