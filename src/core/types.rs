//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Fingerprint`] - Opaque content marker for optimistic concurrency
//! - [`DraftId`] - Unique draft identifier
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use draftforge::core::types::BranchName;
//!
//! let branch = BranchName::new("draft/getting-started-a1b2c3d4").unwrap();
//! assert_eq!(branch.as_str(), "draft/getting-started-a1b2c3d4");
//!
//! // Invalid constructions fail at creation time
//! assert!(BranchName::new("invalid..name").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see
/// `git check-ref-format`):
/// - Cannot be empty
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
/// - Cannot be exactly `@`
///
/// # Example
///
/// ```
/// use draftforge::core::types::BranchName;
///
/// let name = BranchName::new("draft/intro-guide-1f2e3d4c").unwrap();
/// assert_eq!(name.as_str(), "draft/intro-guide-1f2e3d4c");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's
    /// refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Validate a branch name against Git's refname rules.
    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }

        // "@" alone is reserved
        if name == "@" {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be '@' (reserved)".into(),
            ));
        }

        if name.starts_with('.') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '.'".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }

        if name.ends_with(".lock") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '.lock'".into(),
            ));
        }
        if name.ends_with('/') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '/'".into(),
            ));
        }

        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{pattern}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{c}'"
                )));
            }
        }

        for c in name.chars() {
            if c.is_ascii_control() {
                return Err(TypeError::InvalidBranchName(
                    "branch name cannot contain control characters".into(),
                ));
            }
        }

        // Component-level rules (split by /)
        for component in name.split('/') {
            if component.is_empty() {
                continue;
            }
            if component.starts_with('.') {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque content-identifying marker used for optimistic concurrency.
///
/// For the GitHub adapter this is the blob SHA the contents API reports;
/// for the in-memory forge it is a SHA-256 digest of the content. Callers
/// compare fingerprints for equality and never interpret their structure.
///
/// # Example
///
/// ```
/// use draftforge::core::types::Fingerprint;
///
/// let a = Fingerprint::of_bytes(b"# Hello");
/// let b = Fingerprint::of_bytes(b"# Hello");
/// assert_eq!(a, b);
/// assert_ne!(a, Fingerprint::of_bytes(b"# Changed"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a revision marker reported by a remote store.
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    /// Compute a fingerprint from raw content bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A unique draft identifier, generated at creation and immutable.
///
/// # Example
///
/// ```
/// use draftforge::core::types::DraftId;
///
/// let id = DraftId::generate();
/// assert!(!id.as_str().is_empty());
/// assert_ne!(id, DraftId::generate());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(String);

impl DraftId {
    /// Generate a new unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing id (e.g., read back from the record store).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod branch_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(BranchName::new("main").is_ok());
            assert!(BranchName::new("draft/guide-a1b2c3d4").is_ok());
            assert!(BranchName::new("user@feature").is_ok());
        }

        #[test]
        fn rejects_empty() {
            assert!(BranchName::new("").is_err());
        }

        #[test]
        fn rejects_reserved_at() {
            assert!(BranchName::new("@").is_err());
        }

        #[test]
        fn rejects_bad_prefixes_and_suffixes() {
            assert!(BranchName::new(".hidden").is_err());
            assert!(BranchName::new("-leading-dash").is_err());
            assert!(BranchName::new("name.lock").is_err());
            assert!(BranchName::new("trailing/").is_err());
        }

        #[test]
        fn rejects_bad_sequences() {
            assert!(BranchName::new("a..b").is_err());
            assert!(BranchName::new("a@{b").is_err());
            assert!(BranchName::new("a//b").is_err());
        }

        #[test]
        fn rejects_invalid_chars() {
            for name in ["has space", "til~de", "car^et", "col:on", "ast*erisk"] {
                assert!(BranchName::new(name).is_err(), "{name} should be invalid");
            }
        }

        #[test]
        fn rejects_bad_components() {
            assert!(BranchName::new("draft/.hidden").is_err());
            assert!(BranchName::new("draft/name.lock/x").is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let name = BranchName::new("draft/guide-a1b2c3d4").unwrap();
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, "\"draft/guide-a1b2c3d4\"");
            let back: BranchName = serde_json::from_str(&json).unwrap();
            assert_eq!(back, name);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<BranchName, _> = serde_json::from_str("\"a..b\"");
            assert!(result.is_err());
        }
    }

    mod fingerprint {
        use super::*;

        #[test]
        fn deterministic() {
            assert_eq!(Fingerprint::of_bytes(b"abc"), Fingerprint::of_bytes(b"abc"));
        }

        #[test]
        fn content_sensitive() {
            assert_ne!(Fingerprint::of_bytes(b"abc"), Fingerprint::of_bytes(b"abd"));
        }

        #[test]
        fn wraps_remote_marker() {
            let fp = Fingerprint::new("95d09f2b10159347eece71399a7e2e907ea3df4f");
            assert_eq!(fp.as_str(), "95d09f2b10159347eece71399a7e2e907ea3df4f");
        }
    }

    mod draft_id {
        use super::*;

        #[test]
        fn generate_is_unique() {
            assert_ne!(DraftId::generate(), DraftId::generate());
        }

        #[test]
        fn roundtrips_through_string() {
            let id = DraftId::generate();
            let back = DraftId::new(id.as_str());
            assert_eq!(id, back);
        }
    }
}
