use serde::Deserialize;

/// Owner and name of a repository, e.g. `ChicoState/garden`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Returns None when either part is blank.
    pub fn new(owner: &str, repo: &str) -> Option<RepoRef> {
        let owner = owner.trim();
        let repo = repo.trim();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(RepoRef {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The paged collections the tool knows how to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Issues,
    PullRequests,
    Commits,
    IssueComments,
    ReviewComments,
    Reviews,
    OwnerRepositories,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Issues => "issues",
            ResourceKind::PullRequests => "pull_requests",
            ResourceKind::Commits => "commits",
            ResourceKind::IssueComments => "issue_comments",
            ResourceKind::ReviewComments => "review_comments",
            ResourceKind::Reviews => "reviews",
            ResourceKind::OwnerRepositories => "owner_repositories",
        };
        write!(f, "{}", name)
    }
}

/// A paged collection endpoint: its kind, API path and fixed query parameters.
/// `page`/`per_page` are added per call by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

impl Resource {
    pub fn issues(repo: &RepoRef, state: Option<&str>) -> Resource {
        Resource::new(ResourceKind::Issues, format!("{}/issues", repo.path()))
            .with_param("state", state)
    }

    pub fn pull_requests(repo: &RepoRef, state: Option<&str>) -> Resource {
        Resource::new(ResourceKind::PullRequests, format!("{}/pulls", repo.path()))
            .with_param("state", state)
    }

    pub fn commits(repo: &RepoRef, branch: Option<&str>) -> Resource {
        Resource::new(ResourceKind::Commits, format!("{}/commits", repo.path()))
            .with_param("sha", branch)
    }

    pub fn issue_comments(repo: &RepoRef) -> Resource {
        Resource::new(
            ResourceKind::IssueComments,
            format!("{}/issues/comments", repo.path()),
        )
    }

    pub fn review_comments(repo: &RepoRef) -> Resource {
        Resource::new(
            ResourceKind::ReviewComments,
            format!("{}/pulls/comments", repo.path()),
        )
    }

    pub fn reviews(repo: &RepoRef, pull_number: u64) -> Resource {
        Resource::new(
            ResourceKind::Reviews,
            format!("{}/pulls/{}/reviews", repo.path(), pull_number),
        )
    }

    pub fn owner_repositories(owner: &str) -> Resource {
        Resource::new(
            ResourceKind::OwnerRepositories,
            format!("/users/{}/repos", owner),
        )
    }

    fn new(kind: ResourceKind, path: String) -> Resource {
        Resource {
            kind,
            path,
            query: Vec::new(),
        }
    }

    fn with_param(mut self, key: &'static str, value: Option<&str>) -> Resource {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.query.push((key, value.to_string()));
        }
        self
    }
}

// Wire records. Everything beyond the identifying fields is optional so that a
// sparse record normalizes instead of failing to decode.

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRepository {
    pub full_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: Option<String>,
    pub user: Option<RawUser>,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    pub closed_by: Option<RawUser>,
    /// Null and absent both mean "no assignees".
    pub assignees: Option<Vec<RawUser>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPullRequest {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: Option<String>,
    pub user: Option<RawUser>,
    pub created_at: Option<String>,
    pub merged_at: Option<String>,
    pub closed_at: Option<String>,
    pub assignees: Option<Vec<RawUser>>,
    pub requested_reviewers: Option<Vec<RawUser>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitPerson {
    pub name: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitDetail {
    pub message: Option<String>,
    pub author: Option<RawCommitPerson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitStats {
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub commit: Option<RawCommitDetail>,
    /// The linked account; null when the commit email maps to no account.
    pub author: Option<RawUser>,
    pub stats: Option<RawCommitStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReview {
    pub user: Option<RawUser>,
    pub state: Option<String>,
    pub body: Option<String>,
    pub submitted_at: Option<String>,
    pub pull_request_number: Option<u64>,
    pub pull_request_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub id: u64,
    pub user: Option<RawUser>,
    pub body: Option<String>,
    pub created_at: Option<String>,
    pub pull_request_url: Option<String>,
}
