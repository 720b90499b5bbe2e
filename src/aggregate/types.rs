/// Repository metadata shown above the tabs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySummary {
    pub full_name: String,
    pub description: Option<String>,
}

/// An issue that is not a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub number: u64,
    pub author: String,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    pub closed_by: Option<String>,
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub author: String,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub created_at: Option<String>,
    pub merged_at: Option<String>,
    pub closed_at: Option<String>,
    pub assignees: Vec<String>,
    pub requested_reviewers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    /// Account login when the commit is linked to one, else the git author name.
    pub author: String,
    pub message: String,
    pub date: Option<String>,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub pull_request_number: u64,
    pub reviewer: String,
    pub state: String,
    pub submitted_at: Option<String>,
    pub body: Option<String>,
}

/// An issue comment or, when `pull_request_number` is set, a review comment
/// on a pull request diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    pub author: String,
    pub body: String,
    pub created_at: Option<String>,
    pub pull_request_number: Option<u64>,
}

/// Everything fetched for one repository, in page-arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    pub repository: RepositorySummary,
    pub issues: Vec<Issue>,
    pub pull_requests: Vec<PullRequest>,
    pub commits: Vec<Commit>,
    pub reviews: Vec<Review>,
    pub comments: Vec<Comment>,
    pub review_comments: Vec<Comment>,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
            && self.pull_requests.is_empty()
            && self.commits.is_empty()
            && self.reviews.is_empty()
            && self.comments.is_empty()
            && self.review_comments.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.issues.len()
            + self.pull_requests.len()
            + self.commits.len()
            + self.reviews.len()
            + self.comments.len()
            + self.review_comments.len()
    }
}

/// Where a search currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Fetching,
    Fetched,
    Failed,
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStatus::Idle => write!(f, "idle"),
            SearchStatus::Fetching => write!(f, "fetching"),
            SearchStatus::Fetched => write!(f, "fetched"),
            SearchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// An immutable view of the aggregator state. Replaced wholesale on every
/// transition, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generation: u64,
    pub status: SearchStatus,
    pub result: AggregateResult,
    pub error_message: Option<String>,
}

impl Snapshot {
    pub fn idle() -> Snapshot {
        Snapshot {
            generation: 0,
            status: SearchStatus::Idle,
            result: AggregateResult::default(),
            error_message: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == SearchStatus::Fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aggregate_is_empty() {
        let result = AggregateResult::default();
        assert!(result.is_empty());
        assert_eq!(result.total_records(), 0);
        assert_eq!(result.repository, RepositorySummary::default());
    }

    #[test]
    fn test_idle_snapshot_is_not_ready() {
        let snapshot = Snapshot::idle();
        assert!(!snapshot.is_ready());
        assert!(snapshot.error_message.is_none());
        assert_eq!(snapshot.status.to_string(), "idle");
    }
}
