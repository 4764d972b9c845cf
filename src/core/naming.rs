//! core::naming
//!
//! Draft branch naming rules.
//!
//! # Features
//!
//! - Generate slugs from document paths
//! - Derive collision-avoided draft branch names

use uuid::Uuid;

use super::types::{BranchName, TypeError};

/// Prefix for draft branches.
const DRAFT_BRANCH_PREFIX: &str = "draft";

/// Length of the random uniqueness suffix (hex chars).
const SUFFIX_LEN: usize = 8;

/// Generate a slug from a document path.
///
/// Converts a relative document path into a valid branch name fragment:
/// - Lowercase
/// - Path separators, spaces, and underscores become hyphens
/// - Remove other invalid characters
/// - Truncate to reasonable length
///
/// # Example
///
/// ```
/// use draftforge::core::naming::slugify;
///
/// assert_eq!(slugify("guides/Getting Started.md"), "guides-getting-started-md");
/// assert_eq!(slugify("api_reference.md"), "api-reference-md");
/// ```
pub fn slugify(path: &str) -> String {
    path.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else if c == ' ' || c == '_' || c == '/' || c == '.' {
                '-'
            } else {
                // Skip invalid characters
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(50) // Reasonable max length
        .collect()
}

/// Derive a draft branch name from a document path.
///
/// The name is deterministic in its slug portion and carries a short random
/// suffix so that concurrent drafts targeting the same document never
/// collide: `draft/<slug>-<8 hex chars>`.
///
/// # Errors
///
/// Returns `TypeError::InvalidBranchName` if the derived name fails refname
/// validation (only possible for pathological inputs whose slug is empty;
/// those fall back to the bare suffix and always validate).
///
/// # Example
///
/// ```
/// use draftforge::core::naming::draft_branch_name;
///
/// let name = draft_branch_name("guides/intro.md").unwrap();
/// assert!(name.as_str().starts_with("draft/guides-intro-md-"));
/// ```
pub fn draft_branch_name(doc_path: &str) -> Result<BranchName, TypeError> {
    let slug = slugify(doc_path);
    let suffix: String = Uuid::new_v4().simple().to_string()[..SUFFIX_LEN].to_string();

    let name = if slug.is_empty() {
        format!("{DRAFT_BRANCH_PREFIX}/{suffix}")
    } else {
        format!("{DRAFT_BRANCH_PREFIX}/{slug}-{suffix}")
    };

    BranchName::new(name)
}
