//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge keeps branches, per-branch file trees, pull requests,
//! and base-branch history in memory. Failure scenarios are scripted via
//! [`FailOn`], and every call is recorded for verification.
//!
//! Fingerprints are SHA-256 digests of the stored content, so the
//! optimistic-concurrency behavior matches the real adapter: reading a
//! file yields the fingerprint a later conflict-aware commit compares
//! against.
//!
//! # Example
//!
//! ```
//! use draftforge::forge::mock::MockForge;
//! use draftforge::forge::Forge;
//! use draftforge::core::types::BranchName;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new();
//! forge.seed_file("guide.md", "# Guide");
//!
//! let branch = BranchName::new("draft/guide-md-a1b2c3d4").unwrap();
//! forge.create_branch(&branch).await.unwrap();
//!
//! let file = forge.read_file("guide.md", Some(branch.as_str())).await.unwrap();
//! assert_eq!(file.content, "# Guide");
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::traits::{
    BinaryFile, EntryKind, FileRevision, Forge, ForgeError, PullRequest, RemoteFile, TreeEntry,
    HISTORY_PAGE_SIZE,
};
use crate::core::types::{BranchName, Fingerprint};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share
/// state.
#[derive(Debug, Clone)]
pub struct MockForge {
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    /// Branch name -> file tree (path -> raw bytes).
    branches: HashMap<String, BTreeMap<String, Vec<u8>>>,
    /// Base branch name.
    base_branch: String,
    /// Stored PRs by number.
    prs: HashMap<u64, MockPr>,
    /// Next PR number to assign.
    next_pr_number: u64,
    /// Commit counter, for synthetic revision ids.
    next_commit: u64,
    /// Base-branch history per path, most recent first.
    history: HashMap<String, Vec<FileRevision>>,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// A pull request stored by the mock.
#[derive(Debug, Clone)]
pub struct MockPr {
    /// PR number.
    pub number: u64,
    /// Head branch name.
    pub branch: String,
    /// PR title.
    pub title: String,
    /// PR body.
    pub body: String,
    /// Whether the PR has been merged.
    pub merged: bool,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail create_branch with the given error.
    CreateBranch(ForgeError),
    /// Fail commit_file with the given error.
    CommitFile(ForgeError),
    /// Fail open_pull_request with the given error.
    OpenPullRequest(ForgeError),
    /// Fail merge_pull_request with the given error.
    MergePullRequest(ForgeError),
    /// Fail delete_branch with the given error.
    DeleteBranch(ForgeError),
    /// Fail read_file with the given error.
    ReadFile(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListTree,
    ReadFile {
        path: String,
        git_ref: Option<String>,
    },
    CreateBranch {
        name: String,
    },
    CommitFile {
        branch: String,
        path: String,
        message: String,
        expected_fingerprint: Option<String>,
    },
    OpenPullRequest {
        branch: String,
        title: String,
    },
    MergePullRequest {
        number: u64,
    },
    DeleteBranch {
        name: String,
    },
    ListFileHistory {
        path: String,
    },
    UploadBinary {
        path: String,
        branch: Option<String>,
    },
    ReadBinary {
        path: String,
        git_ref: Option<String>,
    },
}

impl MockForge {
    /// Create a new mock forge with an empty `main` base branch.
    pub fn new() -> Self {
        let mut branches = HashMap::new();
        branches.insert("main".to_string(), BTreeMap::new());
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                branches,
                base_branch: "main".to_string(),
                prs: HashMap::new(),
                next_pr_number: 1,
                next_commit: 1,
                history: HashMap::new(),
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Seed a file onto the base branch without recording an operation.
    pub fn seed_file(&self, path: &str, content: &str) {
        let mut inner = self.inner.lock().unwrap();
        let base = inner.base_branch.clone();
        inner
            .branches
            .get_mut(&base)
            .expect("base branch always exists")
            .insert(path.to_string(), content.as_bytes().to_vec());
    }

    /// Script the next failure.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
    }

    /// Clear any scripted failure.
    pub fn clear_fail_on(&self) {
        self.inner.lock().unwrap().fail_on = None;
    }

    /// Whether a branch currently exists.
    pub fn branch_exists(&self, name: &str) -> bool {
        self.inner.lock().unwrap().branches.contains_key(name)
    }

    /// Read a file from the base branch, if present.
    pub fn base_file(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .branches
            .get(&inner.base_branch)
            .and_then(|tree| tree.get(path))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get a stored PR.
    pub fn pr(&self, number: u64) -> Option<MockPr> {
        self.inner.lock().unwrap().prs.get(&number).cloned()
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

impl MockForgeInner {
    fn take_failure(&mut self, matches: impl Fn(&FailOn) -> Option<ForgeError>) -> Option<ForgeError> {
        if let Some(fail_on) = &self.fail_on {
            if let Some(err) = matches(fail_on) {
                self.fail_on = None;
                return Some(err);
            }
        }
        None
    }

    fn next_revision_id(&mut self) -> String {
        let id = format!("{:040x}", self.next_commit);
        self.next_commit += 1;
        id
    }

    fn record_history(&mut self, path: &str, message: &str, author: Option<String>) {
        let revision = FileRevision {
            revision_id: self.next_revision_id(),
            message: message.to_string(),
            timestamp: Utc::now().timestamp(),
            author,
        };
        let entries = self.history.entry(path.to_string()).or_default();
        entries.insert(0, revision);
        entries.truncate(HISTORY_PAGE_SIZE);
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_tree(&self) -> Result<Vec<TreeEntry>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::ListTree);

        let tree = inner
            .branches
            .get(&inner.base_branch)
            .expect("base branch always exists");

        let mut dirs: Vec<String> = Vec::new();
        let mut entries = Vec::new();
        for path in tree.keys() {
            // Emit each ancestor directory once, in tree order.
            let components: Vec<&str> = path.split('/').collect();
            let mut prefix = String::new();
            for component in &components[..components.len() - 1] {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(component);
                if !dirs.contains(&prefix) {
                    dirs.push(prefix.clone());
                    entries.push(TreeEntry {
                        path: prefix.clone(),
                        kind: EntryKind::Dir,
                    });
                }
            }
            entries.push(TreeEntry {
                path: path.clone(),
                kind: EntryKind::File,
            });
        }
        Ok(entries)
    }

    async fn read_file(&self, path: &str, git_ref: Option<&str>) -> Result<RemoteFile, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::ReadFile {
            path: path.to_string(),
            git_ref: git_ref.map(str::to_string),
        });

        if let Some(err) = inner.take_failure(|f| match f {
            FailOn::ReadFile(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }

        let branch = git_ref.unwrap_or(&inner.base_branch).to_string();
        let tree = inner
            .branches
            .get(&branch)
            .ok_or_else(|| ForgeError::NotFound(format!("ref {branch}")))?;
        let bytes = tree
            .get(path)
            .ok_or_else(|| ForgeError::NotFound(format!("{path} at {branch}")))?;

        let content = String::from_utf8(bytes.clone()).map_err(|_| ForgeError::Client {
            status: 200,
            message: format!("content of '{path}' is not valid UTF-8"),
        })?;
        Ok(RemoteFile {
            fingerprint: Fingerprint::of_bytes(bytes),
            content,
        })
    }

    async fn create_branch(&self, name: &BranchName) -> Result<String, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::CreateBranch {
            name: name.as_str().to_string(),
        });

        if let Some(err) = inner.take_failure(|f| match f {
            FailOn::CreateBranch(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }

        if inner.branches.contains_key(name.as_str()) {
            return Err(ForgeError::Client {
                status: 422,
                message: "Reference already exists".into(),
            });
        }

        let base_tree = inner
            .branches
            .get(&inner.base_branch)
            .expect("base branch always exists")
            .clone();
        inner.branches.insert(name.as_str().to_string(), base_tree);
        Ok(inner.next_revision_id())
    }

    async fn commit_file(
        &self,
        branch: &BranchName,
        path: &str,
        content: &str,
        message: &str,
        expected_fingerprint: Option<&Fingerprint>,
    ) -> Result<Fingerprint, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::CommitFile {
            branch: branch.as_str().to_string(),
            path: path.to_string(),
            message: message.to_string(),
            expected_fingerprint: expected_fingerprint.map(|f| f.as_str().to_string()),
        });

        if let Some(err) = inner.take_failure(|f| match f {
            FailOn::CommitFile(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }

        let tree = inner
            .branches
            .get_mut(branch.as_str())
            .ok_or_else(|| ForgeError::NotFound(format!("ref {branch}")))?;

        let current = tree.get(path).map(|bytes| Fingerprint::of_bytes(bytes));
        if let Some(expected) = expected_fingerprint {
            if current.as_ref() != Some(expected) {
                let actual = current
                    .as_ref()
                    .map(|f| f.as_str().to_string())
                    .unwrap_or_else(|| "absent".to_string());
                return Err(ForgeError::Conflict {
                    path: path.to_string(),
                    message: format!("expected fingerprint {expected}, found {actual}"),
                });
            }
        }

        tree.insert(path.to_string(), content.as_bytes().to_vec());
        Ok(Fingerprint::of_bytes(content.as_bytes()))
    }

    async fn open_pull_request(
        &self,
        branch: &BranchName,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::OpenPullRequest {
            branch: branch.as_str().to_string(),
            title: title.to_string(),
        });

        if let Some(err) = inner.take_failure(|f| match f {
            FailOn::OpenPullRequest(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }

        if !inner.branches.contains_key(branch.as_str()) {
            return Err(ForgeError::NotFound(format!("ref {branch}")));
        }

        let number = inner.next_pr_number;
        inner.next_pr_number += 1;
        inner.prs.insert(
            number,
            MockPr {
                number,
                branch: branch.as_str().to_string(),
                title: title.to_string(),
                body: body.to_string(),
                merged: false,
            },
        );

        Ok(PullRequest {
            number,
            url: format!("https://mock.forge/pull/{number}"),
        })
    }

    async fn merge_pull_request(&self, number: u64) -> Result<(), ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .operations
            .push(MockOperation::MergePullRequest { number });

        if let Some(err) = inner.take_failure(|f| match f {
            FailOn::MergePullRequest(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }

        let pr = inner
            .prs
            .get(&number)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("pull request #{number}")))?;

        if pr.merged {
            return Err(ForgeError::Client {
                status: 405,
                message: "Pull Request is not mergeable".into(),
            });
        }

        let branch_tree = inner
            .branches
            .get(&pr.branch)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("ref {}", pr.branch)))?;

        // Squash semantics: fold the branch tree into the base and record
        // one history entry per changed path.
        let base = inner.base_branch.clone();
        let changed: Vec<String> = {
            let base_tree = inner.branches.get(&base).expect("base branch always exists");
            branch_tree
                .iter()
                .filter(|(path, bytes)| base_tree.get(*path) != Some(*bytes))
                .map(|(path, _)| path.clone())
                .collect()
        };
        inner
            .branches
            .get_mut(&base)
            .expect("base branch always exists")
            .extend(branch_tree);
        for path in changed {
            let title = pr.title.clone();
            inner.record_history(&path, &title, None);
        }

        inner
            .prs
            .get_mut(&number)
            .expect("checked above")
            .merged = true;
        Ok(())
    }

    async fn delete_branch(&self, name: &BranchName) -> Result<(), ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::DeleteBranch {
            name: name.as_str().to_string(),
        });

        if let Some(err) = inner.take_failure(|f| match f {
            FailOn::DeleteBranch(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(err);
        }

        // Absent refs delete successfully, mirroring the 404 tolerance of
        // the real adapter.
        inner.branches.remove(name.as_str());
        Ok(())
    }

    async fn list_file_history(&self, path: &str) -> Result<Vec<FileRevision>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::ListFileHistory {
            path: path.to_string(),
        });

        Ok(inner.history.get(path).cloned().unwrap_or_default())
    }

    async fn upload_binary(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        branch: Option<&BranchName>,
    ) -> Result<Fingerprint, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::UploadBinary {
            path: path.to_string(),
            branch: branch.map(|b| b.as_str().to_string()),
        });

        let branch = branch
            .map(|b| b.as_str().to_string())
            .unwrap_or_else(|| inner.base_branch.clone());
        let on_base = branch == inner.base_branch;
        let tree = inner
            .branches
            .get_mut(&branch)
            .ok_or_else(|| ForgeError::NotFound(format!("ref {branch}")))?;
        tree.insert(path.to_string(), bytes.to_vec());
        if on_base {
            inner.record_history(path, message, None);
        }
        Ok(Fingerprint::of_bytes(bytes))
    }

    async fn read_binary(
        &self,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<BinaryFile, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::ReadBinary {
            path: path.to_string(),
            git_ref: git_ref.map(str::to_string),
        });

        let branch = git_ref.unwrap_or(&inner.base_branch).to_string();
        let tree = inner
            .branches
            .get(&branch)
            .ok_or_else(|| ForgeError::NotFound(format!("ref {branch}")))?;
        let bytes = tree
            .get(path)
            .ok_or_else(|| ForgeError::NotFound(format!("{path} at {branch}")))?;

        Ok(BinaryFile {
            fingerprint: Fingerprint::of_bytes(bytes),
            bytes: bytes.clone(),
        })
    }
}
