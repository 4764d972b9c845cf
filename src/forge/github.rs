//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Design
//!
//! This module implements the `Forge` trait for GitHub:
//! - `git/refs` and `git/trees` for branch and tree operations
//! - `contents` for reads and commits (text and binary)
//! - `commits` for file history
//! - `pulls` for opening and squash-merging pull requests
//!
//! Every network call runs through the retry layer ([`with_retry`]); this
//! module's job is to classify each HTTP response into the `ForgeError`
//! taxonomy the retry layer understands.
//!
//! # Conflict Detection
//!
//! `commit_file` embeds the optimistic-concurrency check: it reads the
//! current blob SHA for the target path (absence is fine - the file may
//! not exist yet), aborts with `Conflict` when the caller's expected
//! fingerprint differs, and otherwise submits the write carrying that SHA
//! so GitHub's own compare-and-write applies too.
//!
//! # Rate Limiting
//!
//! 403 and 429 responses are classified as `RateLimited`. The reset wait
//! is derived from `retry-after` or, when the remaining quota is zero,
//! from `x-ratelimit-reset`; the retry layer decides whether to sleep
//! through it.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::retry::{with_retry, RetryPolicy};
use super::traits::{
    BinaryFile, EntryKind, FileRevision, Forge, ForgeError, PullRequest, RemoteFile, TreeEntry,
    HISTORY_PAGE_SIZE,
};
use crate::core::config::RepositoryConfig;
use crate::core::types::{BranchName, Fingerprint};
use async_trait::async_trait;

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "draftforge";

/// GitHub forge implementation.
///
/// Scoped to one repository and one base branch; authenticated with a
/// personal access token holding write scope on that repository.
///
/// # Example
///
/// ```ignore
/// let forge = GitHubForge::from_config(&config.repository, token)
///     .with_retry_policy(RetryPolicy::default());
/// let tree = forge.list_tree().await?;
/// ```
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Personal access token
    token: String,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// The branch drafts are proposed against and merged into
    base_branch: String,
    /// Directory under which all published documents live
    content_root: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
    /// Retry policy applied to every network call
    retry: RetryPolicy,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("base_branch", &self.base_branch)
            .field("content_root", &self.content_root)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a new GitHub forge.
    ///
    /// Uses `main` as the base branch and `docs` as the content root;
    /// prefer [`from_config`] outside of tests.
    ///
    /// [`from_config`]: GitHubForge::from_config
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            base_branch: "main".to_string(),
            content_root: "docs".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Create a GitHub forge from repository configuration.
    ///
    /// The token is supplied out of band (environment or secret store),
    /// never from the config file.
    pub fn from_config(config: &RepositoryConfig, token: impl Into<String>) -> Self {
        let mut forge = Self::new(token, config.owner.clone(), config.name.clone());
        forge.base_branch = config.base_branch.clone();
        forge.content_root = config.content_root.clone();
        if let Some(api_base) = &config.api_base {
            forge.api_base = api_base.clone();
        }
        forge
    }

    /// Override the API base URL (GitHub Enterprise).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Build common headers for API requests.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token)).expect("Invalid token format"),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Join a document path onto the content root.
    fn content_path(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if self.content_root.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.content_root, path)
        }
    }

    /// Strip the content root prefix from a tree path.
    ///
    /// Returns `None` for paths outside the content root.
    fn strip_root<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.content_root.is_empty() {
            return Some(path);
        }
        path.strip_prefix(&self.content_root)
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::Client {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(self.error_from_response(response, status).await)
        }
    }

    /// Classify an error response from the API.
    async fn error_from_response(&self, response: Response, status: StatusCode) -> ForgeError {
        // Rate-limit headers must be read before the body consumes the
        // response.
        let retry_in = rate_limit_wait(response.headers(), SystemTime::now());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                ForgeError::RateLimited { retry_in }
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            _ if status.is_server_error() => ForgeError::Transient {
                message: format!("GitHub server error: {} - {}", status.as_u16(), message),
            },
            _ => ForgeError::Client {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// GET a JSON resource.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ForgeError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| ForgeError::Transient {
                message: e.to_string(),
            })?;
        self.handle_response(response).await
    }

    /// Fetch the raw content record for a path at a ref.
    ///
    /// Returns `Ok(None)` when the path does not exist at that ref.
    async fn try_get_content(
        &self,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<GitHubContent>, ForgeError> {
        let url = format!(
            "{}?ref={}",
            self.repo_url(&format!("contents/{}", self.content_path(path))),
            git_ref
        );

        match with_retry(&self.retry, || self.get_json::<GitHubContent>(&url)).await {
            Ok(content) => Ok(Some(content)),
            Err(ForgeError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetch the current fingerprint for a path at a ref, if the file
    /// exists.
    async fn current_fingerprint(
        &self,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Fingerprint>, ForgeError> {
        Ok(self
            .try_get_content(path, git_ref)
            .await?
            .map(|c| Fingerprint::new(c.sha)))
    }

    /// Submit a contents-API write for a path.
    ///
    /// `current` is the blob SHA being replaced; GitHub requires it when
    /// updating an existing file, and answers 409 if it went stale.
    async fn put_contents(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        branch: &str,
        current: Option<&Fingerprint>,
    ) -> Result<Fingerprint, ForgeError> {
        let url = self.repo_url(&format!("contents/{}", self.content_path(path)));
        let body = PutContentsBody {
            message,
            content: BASE64.encode(bytes),
            branch,
            sha: current.map(|f| f.as_str()),
        };

        let written: GitHubContentWrite = with_retry(&self.retry, || async {
            let response = self
                .client
                .put(&url)
                .headers(self.headers())
                .json(&body)
                .send()
                .await
                .map_err(|e| ForgeError::Transient {
                    message: e.to_string(),
                })?;

            let status = response.status();
            if status == StatusCode::CONFLICT {
                // Lost the remote's own compare-and-write race.
                let message = response
                    .json::<GitHubErrorResponse>()
                    .await
                    .map(|e| e.message)
                    .unwrap_or_else(|_| "content changed since it was read".to_string());
                return Err(ForgeError::Conflict {
                    path: path.to_string(),
                    message,
                });
            }
            self.handle_response(response).await
        })
        .await?;

        Ok(Fingerprint::new(written.content.sha))
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_tree(&self) -> Result<Vec<TreeEntry>, ForgeError> {
        let url = format!(
            "{}?recursive=1",
            self.repo_url(&format!("git/trees/{}", self.base_branch))
        );

        let tree: GitHubTree = with_retry(&self.retry, || self.get_json(&url)).await?;

        if tree.truncated {
            tracing::warn!(
                owner = %self.owner,
                repo = %self.repo,
                "tree listing truncated by the API"
            );
        }

        let entries = tree
            .tree
            .into_iter()
            .filter_map(|entry| {
                let kind = match entry.entry_type.as_str() {
                    "blob" => EntryKind::File,
                    "tree" => EntryKind::Dir,
                    // Submodules and other object types are not documents.
                    _ => return None,
                };
                let path = self.strip_root(&entry.path)?;
                Some(TreeEntry {
                    path: path.to_string(),
                    kind,
                })
            })
            .collect();

        Ok(entries)
    }

    async fn read_file(&self, path: &str, git_ref: Option<&str>) -> Result<RemoteFile, ForgeError> {
        let git_ref = git_ref.unwrap_or(&self.base_branch);
        let content = self
            .try_get_content(path, git_ref)
            .await?
            .ok_or_else(|| ForgeError::NotFound(format!("{path} at {git_ref}")))?;

        let bytes = content.decoded_bytes()?;
        let text = String::from_utf8(bytes).map_err(|_| ForgeError::Client {
            status: 200,
            message: format!("content of '{path}' is not valid UTF-8"),
        })?;

        Ok(RemoteFile {
            content: text,
            fingerprint: Fingerprint::new(content.sha),
        })
    }

    async fn create_branch(&self, name: &BranchName) -> Result<String, ForgeError> {
        // Resolve the base branch head first; a vanished base branch
        // surfaces as NotFound here.
        let head_url = self.repo_url(&format!("git/ref/heads/{}", self.base_branch));
        let head: GitHubRefObject = with_retry(&self.retry, || self.get_json(&head_url)).await?;

        let url = self.repo_url("git/refs");
        let body = CreateRefBody {
            git_ref: format!("refs/heads/{}", name),
            sha: head.object.sha.clone(),
        };

        let _created: GitHubRefObject = with_retry(&self.retry, || async {
            let response = self
                .client
                .post(&url)
                .headers(self.headers())
                .json(&body)
                .send()
                .await
                .map_err(|e| ForgeError::Transient {
                    message: e.to_string(),
                })?;
            self.handle_response(response).await
        })
        .await?;

        tracing::debug!(branch = %name, head = %head.object.sha, "created draft branch");
        Ok(head.object.sha)
    }

    async fn commit_file(
        &self,
        branch: &BranchName,
        path: &str,
        content: &str,
        message: &str,
        expected_fingerprint: Option<&Fingerprint>,
    ) -> Result<Fingerprint, ForgeError> {
        // Conflict detector: compare the caller's expected fingerprint
        // against what the branch currently stores. Absence of the file
        // is not an error - the commit may be creating it.
        let current = self.current_fingerprint(path, branch.as_str()).await?;

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

        self.put_contents(path, content.as_bytes(), message, branch.as_str(), current.as_ref())
            .await
    }

    async fn open_pull_request(
        &self,
        branch: &BranchName,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, ForgeError> {
        let url = self.repo_url("pulls");
        let request = CreatePrBody {
            head: branch.as_str(),
            base: &self.base_branch,
            title,
            body,
        };

        let pr: GitHubPullRequest = with_retry(&self.retry, || async {
            let response = self
                .client
                .post(&url)
                .headers(self.headers())
                .json(&request)
                .send()
                .await
                .map_err(|e| ForgeError::Transient {
                    message: e.to_string(),
                })?;
            self.handle_response(response).await
        })
        .await?;

        tracing::debug!(number = pr.number, branch = %branch, "opened pull request");
        Ok(PullRequest {
            number: pr.number,
            url: pr.html_url,
        })
    }

    async fn merge_pull_request(&self, number: u64) -> Result<(), ForgeError> {
        let url = self.repo_url(&format!("pulls/{}/merge", number));
        let body = MergePrBody {
            merge_method: "squash",
        };

        let _merged: GitHubMergeResult = with_retry(&self.retry, || async {
            let response = self
                .client
                .put(&url)
                .headers(self.headers())
                .json(&body)
                .send()
                .await
                .map_err(|e| ForgeError::Transient {
                    message: e.to_string(),
                })?;
            self.handle_response(response).await
        })
        .await?;

        Ok(())
    }

    async fn delete_branch(&self, name: &BranchName) -> Result<(), ForgeError> {
        let url = self.repo_url(&format!("git/refs/heads/{}", name));

        let result = with_retry(&self.retry, || async {
            let response = self
                .client
                .delete(&url)
                .headers(self.headers())
                .send()
                .await
                .map_err(|e| ForgeError::Transient {
                    message: e.to_string(),
                })?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(self.error_from_response(response, status).await)
            }
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            // Already gone: a prior partial failure may have removed it.
            // GitHub answers 404 for an unknown ref URL and 422 for a
            // known URL whose ref does not exist.
            Err(ForgeError::NotFound(_)) => Ok(()),
            Err(ForgeError::Client { status: 422, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn list_file_history(&self, path: &str) -> Result<Vec<FileRevision>, ForgeError> {
        let url = format!(
            "{}?path={}&sha={}&per_page={}",
            self.repo_url("commits"),
            self.content_path(path),
            self.base_branch,
            HISTORY_PAGE_SIZE
        );

        let commits: Vec<GitHubCommitItem> =
            with_retry(&self.retry, || self.get_json(&url)).await?;

        Ok(commits
            .into_iter()
            .take(HISTORY_PAGE_SIZE)
            .map(|item| {
                let (author, timestamp) = match item.commit.author {
                    Some(a) => {
                        let ts = chrono::DateTime::parse_from_rfc3339(&a.date)
                            .map(|d| d.timestamp())
                            .unwrap_or(0);
                        (Some(a.name), ts)
                    }
                    None => (None, 0),
                };
                FileRevision {
                    revision_id: item.sha,
                    message: item.commit.message,
                    timestamp,
                    author,
                }
            })
            .collect())
    }

    async fn upload_binary(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        branch: Option<&BranchName>,
    ) -> Result<Fingerprint, ForgeError> {
        let branch = branch.map(|b| b.as_str()).unwrap_or(&self.base_branch);
        let current = self.current_fingerprint(path, branch).await?;
        self.put_contents(path, bytes, message, branch, current.as_ref())
            .await
    }

    async fn read_binary(
        &self,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<BinaryFile, ForgeError> {
        let git_ref = git_ref.unwrap_or(&self.base_branch);
        let content = self
            .try_get_content(path, git_ref)
            .await?
            .ok_or_else(|| ForgeError::NotFound(format!("{path} at {git_ref}")))?;

        Ok(BinaryFile {
            bytes: content.decoded_bytes()?,
            fingerprint: Fingerprint::new(content.sha),
        })
    }
}

/// Derive the rate-limit wait from response headers.
///
/// `retry-after` wins when present; otherwise a zero remaining quota plus
/// a reset time in the future yields the wait until that reset. Anything
/// else means the API gave no usable signal.
fn rate_limit_wait(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    if let Some(secs) = header_u64(headers, "retry-after") {
        return Some(Duration::from_secs(secs));
    }

    let remaining = header_u64(headers, "x-ratelimit-remaining")?;
    if remaining > 0 {
        return None;
    }
    let reset = header_u64(headers, "x-ratelimit-reset")?;
    let now_secs = now.duration_since(UNIX_EPOCH).ok()?.as_secs();
    if reset > now_secs {
        Some(Duration::from_secs(reset - now_secs))
    } else {
        None
    }
}

/// Parse a numeric header value.
fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a ref.
#[derive(Serialize)]
struct CreateRefBody {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: String,
}

/// Request body for a contents-API write.
#[derive(Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Request body for creating a PR.
#[derive(Serialize)]
struct CreatePrBody<'a> {
    head: &'a str,
    base: &'a str,
    title: &'a str,
    body: &'a str,
}

/// Request body for merging a PR.
#[derive(Serialize)]
struct MergePrBody<'a> {
    merge_method: &'a str,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// GitHub contents-API record for a single file.
#[derive(Deserialize)]
struct GitHubContent {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl GitHubContent {
    /// Decode the base64 payload the contents API returns.
    fn decoded_bytes(&self) -> Result<Vec<u8>, ForgeError> {
        let raw = self.content.as_deref().unwrap_or("");
        if self.encoding.as_deref() == Some("none") {
            // Files above the API's inline-content cap come back empty.
            return Err(ForgeError::Client {
                status: 200,
                message: "file too large for the contents API".into(),
            });
        }
        // The API wraps base64 at 60 columns.
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        BASE64.decode(compact).map_err(|e| ForgeError::Client {
            status: 200,
            message: format!("failed to decode content: {e}"),
        })
    }
}

/// Response for a contents-API write.
#[derive(Deserialize)]
struct GitHubContentWrite {
    content: GitHubWrittenBlob,
}

#[derive(Deserialize)]
struct GitHubWrittenBlob {
    sha: String,
}

/// GitHub git-ref response format.
#[derive(Deserialize)]
struct GitHubRefObject {
    object: GitHubRefTarget,
}

#[derive(Deserialize)]
struct GitHubRefTarget {
    sha: String,
}

/// GitHub tree response format.
#[derive(Deserialize)]
struct GitHubTree {
    tree: Vec<GitHubTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct GitHubTreeItem {
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
}

/// GitHub PR response format.
#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
}

/// GitHub merge response format.
#[derive(Deserialize)]
struct GitHubMergeResult {
    #[allow(dead_code)]
    #[serde(default)]
    merged: bool,
}

/// GitHub commit list item (subset of the full commit).
#[derive(Deserialize)]
struct GitHubCommitItem {
    sha: String,
    commit: GitHubCommitDetail,
}

#[derive(Deserialize)]
struct GitHubCommitDetail {
    message: String,
    #[serde(default)]
    author: Option<GitHubCommitAuthor>,
}

#[derive(Deserialize)]
struct GitHubCommitAuthor {
    name: String,
    date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_forge() -> GitHubForge {
        GitHubForge::new("token", "octocat", "handbook")
    }

    mod construction {
        use super::*;

        #[test]
        fn new_applies_defaults() {
            let forge = test_forge();
            assert_eq!(forge.name(), "github");
            assert_eq!(forge.owner(), "octocat");
            assert_eq!(forge.repo(), "handbook");
            assert_eq!(forge.base_branch, "main");
            assert_eq!(forge.content_root, "docs");
            assert_eq!(forge.api_base, DEFAULT_API_BASE);
        }

        #[test]
        fn from_config_takes_everything() {
            let config = RepositoryConfig {
                owner: "myorg".into(),
                name: "handbook".into(),
                base_branch: "trunk".into(),
                content_root: "content".into(),
                api_base: Some("https://github.example.com/api/v3".into()),
            };
            let forge = GitHubForge::from_config(&config, "token");
            assert_eq!(forge.owner(), "myorg");
            assert_eq!(forge.base_branch, "trunk");
            assert_eq!(forge.content_root, "content");
            assert_eq!(forge.api_base, "https://github.example.com/api/v3");
        }

        #[test]
        fn debug_redacts_token() {
            let forge = GitHubForge::new("secret_token_abc123", "owner", "repo");
            let debug_output = format!("{:?}", forge);
            assert!(!debug_output.contains("secret_token_abc123"));
            assert!(debug_output.contains("owner"));
        }
    }

    mod urls {
        use super::*;

        #[test]
        fn repo_url_format() {
            let forge = test_forge();
            assert_eq!(
                forge.repo_url("pulls"),
                "https://api.github.com/repos/octocat/handbook/pulls"
            );
            assert_eq!(
                forge.repo_url("git/refs/heads/draft/x"),
                "https://api.github.com/repos/octocat/handbook/git/refs/heads/draft/x"
            );
        }

        #[test]
        fn content_path_joins_root() {
            let forge = test_forge();
            assert_eq!(forge.content_path("guide.md"), "docs/guide.md");
            assert_eq!(forge.content_path("/guide.md"), "docs/guide.md");
        }

        #[test]
        fn content_path_with_empty_root() {
            let mut forge = test_forge();
            forge.content_root = String::new();
            assert_eq!(forge.content_path("guide.md"), "guide.md");
        }

        #[test]
        fn strip_root_filters_outsiders() {
            let forge = test_forge();
            assert_eq!(forge.strip_root("docs/guide.md"), Some("guide.md"));
            assert_eq!(forge.strip_root("docs/a/b.md"), Some("a/b.md"));
            assert_eq!(forge.strip_root("src/lib.rs"), None);
            assert_eq!(forge.strip_root("docs"), None);
            assert_eq!(forge.strip_root("docsother/x.md"), None);
        }
    }

    mod rate_limit {
        use super::*;

        fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
            let mut map = HeaderMap::new();
            for (k, v) in pairs {
                map.insert(
                    reqwest::header::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                    HeaderValue::from_str(v).unwrap(),
                );
            }
            map
        }

        fn at(epoch_secs: u64) -> SystemTime {
            UNIX_EPOCH + Duration::from_secs(epoch_secs)
        }

        #[test]
        fn retry_after_wins() {
            let h = headers(&[("retry-after", "30")]);
            assert_eq!(
                rate_limit_wait(&h, at(1_000)),
                Some(Duration::from_secs(30))
            );
        }

        #[test]
        fn exhausted_quota_uses_reset() {
            let h = headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "1045")]);
            assert_eq!(
                rate_limit_wait(&h, at(1_000)),
                Some(Duration::from_secs(45))
            );
        }

        #[test]
        fn remaining_quota_means_no_wait() {
            let h = headers(&[
                ("x-ratelimit-remaining", "12"),
                ("x-ratelimit-reset", "1045"),
            ]);
            assert_eq!(rate_limit_wait(&h, at(1_000)), None);
        }

        #[test]
        fn reset_in_the_past_means_no_wait() {
            let h = headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "900")]);
            assert_eq!(rate_limit_wait(&h, at(1_000)), None);
        }

        #[test]
        fn missing_headers_mean_no_wait() {
            assert_eq!(rate_limit_wait(&HeaderMap::new(), at(1_000)), None);
        }
    }

    mod content_decoding {
        use super::*;

        #[test]
        fn decodes_wrapped_base64() {
            let content = GitHubContent {
                sha: "abc".into(),
                content: Some("IyBIZWxs\nbyB3b3Js\nZA==\n".into()),
                encoding: Some("base64".into()),
            };
            assert_eq!(content.decoded_bytes().unwrap(), b"# Hello world");
        }

        #[test]
        fn rejects_oversized_files() {
            let content = GitHubContent {
                sha: "abc".into(),
                content: Some(String::new()),
                encoding: Some("none".into()),
            };
            assert!(matches!(
                content.decoded_bytes(),
                Err(ForgeError::Client { .. })
            ));
        }

        #[test]
        fn rejects_invalid_base64() {
            let content = GitHubContent {
                sha: "abc".into(),
                content: Some("!!!not-base64!!!".into()),
                encoding: Some("base64".into()),
            };
            assert!(content.decoded_bytes().is_err());
        }
    }
}
