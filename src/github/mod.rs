pub mod client;
pub mod fixture;
pub mod paginator;
pub mod types;

pub use client::GitHubFetcher;
pub use fixture::FixtureFetcher;
pub use types::{RepoRef, Resource, ResourceKind};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Largest page size the remote API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("GitHub API returned {status} for {path}: {message}")]
    Remote {
        path: String,
        status: u16,
        message: String,
    },

    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response shape for {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Pagination limit of {max_pages} pages exceeded for {path}")]
    PaginationLimitExceeded { path: String, max_pages: u32 },

    #[error("Invalid repository reference: {0}")]
    InvalidReference(String),
}

impl FetchError {
    /// HTTP status of the failed call, when the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::NotFound { .. } => Some(404),
            FetchError::Remote { status, .. } => Some(*status),
            FetchError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// API path of the failed call, when known.
    pub fn path(&self) -> Option<&str> {
        match self {
            FetchError::NotFound { path }
            | FetchError::Remote { path, .. }
            | FetchError::Decode { path, .. }
            | FetchError::PaginationLimitExceeded { path, .. } => Some(path.as_str()),
            FetchError::Transport(_) | FetchError::InvalidReference(_) => None,
        }
    }
}

/// One bounded request against a paged collection.
///
/// Implementations make a single attempt per call. Retrying is left to callers.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the single (non-paged) repository record.
    async fn fetch_repository(&self, repo: &RepoRef) -> Result<Value, FetchError>;

    /// Fetch page `page` (1-based) of `resource`, at most `per_page` items.
    async fn fetch_page(
        &self,
        resource: &Resource,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, FetchError>;
}

/// Parse a repository reference.
///
/// Accepts `owner/repo` or `https://github.com/{owner}/{repo}` (trailing
/// `.git` and extra path segments such as `/tree/main` are ignored).
pub fn parse_repo_ref(input: &str) -> Result<RepoRef, FetchError> {
    let trimmed = input.trim();
    if trimmed.contains("://") {
        let parsed = reqwest::Url::parse(trimmed)
            .map_err(|_| FetchError::InvalidReference(input.to_string()))?;

        if parsed.host_str() != Some("github.com") {
            return Err(FetchError::InvalidReference(input.to_string()));
        }

        let segments: Vec<_> = parsed
            .path_segments()
            .ok_or_else(|| FetchError::InvalidReference(input.to_string()))?
            .filter(|segment| !segment.is_empty())
            .collect();

        if segments.len() < 2 {
            return Err(FetchError::InvalidReference(input.to_string()));
        }
        return RepoRef::new(segments[0], segments[1].trim_end_matches(".git"))
            .ok_or_else(|| FetchError::InvalidReference(input.to_string()));
    }

    let mut parts = trimmed.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) => RepoRef::new(owner, repo)
            .ok_or_else(|| FetchError::InvalidReference(input.to_string())),
        _ => Err(FetchError::InvalidReference(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_slash_repo() {
        let repo = parse_repo_ref("ChicoState/garden").unwrap();
        assert_eq!(repo.owner, "ChicoState");
        assert_eq!(repo.repo, "garden");
    }

    #[test]
    fn test_parse_repo_url() {
        let repo = parse_repo_ref("https://github.com/org/repo.git").unwrap();
        assert_eq!(repo.owner, "org");
        assert_eq!(repo.repo, "repo");

        let repo = parse_repo_ref("https://github.com/org/repo/tree/main").unwrap();
        assert_eq!(repo.repo, "repo");
    }

    #[test]
    fn test_parse_invalid_repo_ref() {
        assert!(parse_repo_ref("https://example.com/org/repo").is_err());
        assert!(parse_repo_ref("https://github.com/org").is_err());
        assert!(parse_repo_ref("just-a-name").is_err());
        assert!(parse_repo_ref("a/b/c").is_err());
        assert!(parse_repo_ref("/repo").is_err());
    }

    #[test]
    fn test_not_found_is_distinguishable() {
        let not_found = FetchError::NotFound {
            path: "/repos/a/b".to_string(),
        };
        let server = FetchError::Remote {
            path: "/repos/a/b".to_string(),
            status: 500,
            message: "boom".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(!server.is_not_found());
        assert_eq!(server.status(), Some(500));
        assert_eq!(not_found.path(), Some("/repos/a/b"));
    }
}
