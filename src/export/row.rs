use chrono::{DateTime, SecondsFormat, Utc};

use crate::aggregate::{AggregateResult, Comment, Commit, Issue, PullRequest, Review};

/// Placeholder written for every missing value.
pub const SENTINEL: &str = "N/A";

pub const HEADER: [&str; 16] = [
    "Repository",
    "Timestamp",
    "Action",
    "Author",
    "Repo_ID",
    "Additions",
    "Deletions",
    "Message",
    "Description",
    "Assignees",
    "Close_date",
    "Closed_by",
    "Request_Status",
    "Reviewers",
    "Review_Recommendation",
    "Tagged",
];

/// One exported line. Cells hold final text; missing values are `SENTINEL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub repository: String,
    pub timestamp: String,
    pub action: String,
    pub author: String,
    pub repo_id: String,
    pub additions: String,
    pub deletions: String,
    pub message: String,
    pub description: String,
    pub assignees: String,
    pub close_date: String,
    pub closed_by: String,
    pub request_status: String,
    pub reviewers: String,
    pub review_recommendation: String,
    pub tagged: String,
}

impl CsvRow {
    fn blank(repository: &str, action: &str) -> CsvRow {
        let na = || SENTINEL.to_string();
        CsvRow {
            repository: repository.to_string(),
            timestamp: na(),
            action: action.to_string(),
            author: na(),
            repo_id: na(),
            additions: na(),
            deletions: na(),
            message: na(),
            description: na(),
            assignees: na(),
            close_date: na(),
            closed_by: na(),
            request_status: na(),
            reviewers: na(),
            review_recommendation: na(),
            tagged: na(),
        }
    }

    /// Cells in header order.
    pub fn cells(&self) -> [&str; 16] {
        [
            self.repository.as_str(),
            self.timestamp.as_str(),
            self.action.as_str(),
            self.author.as_str(),
            self.repo_id.as_str(),
            self.additions.as_str(),
            self.deletions.as_str(),
            self.message.as_str(),
            self.description.as_str(),
            self.assignees.as_str(),
            self.close_date.as_str(),
            self.closed_by.as_str(),
            self.request_status.as_str(),
            self.reviewers.as_str(),
            self.review_recommendation.as_str(),
            self.tagged.as_str(),
        ]
    }
}

/// A record of any kind, borrowed from an `AggregateResult`.
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Commit(&'a Commit),
    PullRequest(&'a PullRequest),
    Issue(&'a Issue),
    Review(&'a Review),
    Comment(&'a Comment),
    ReviewComment(&'a Comment),
}

impl Record<'_> {
    pub fn action(&self) -> &'static str {
        match self {
            Record::Commit(_) => "commit",
            Record::PullRequest(_) => "pull_request",
            Record::Issue(_) => "issue",
            Record::Review(_) => "review",
            Record::Comment(_) => "comment",
            Record::ReviewComment(_) => "review_comment",
        }
    }

    /// Project the record onto the fixed export schema.
    pub fn to_row(&self, repository: &str) -> CsvRow {
        let mut row = CsvRow::blank(repository, self.action());
        match self {
            Record::Commit(commit) => {
                row.timestamp = timestamp(commit.date.as_deref());
                row.author = text(&commit.author);
                row.repo_id = commit.sha.clone();
                row.additions = optional(commit.additions);
                row.deletions = optional(commit.deletions);
                row.message = text(&commit.message);
            }
            Record::PullRequest(pr) => {
                row.timestamp = timestamp(pr.created_at.as_deref());
                row.author = text(&pr.author);
                row.repo_id = pr.number.to_string();
                row.message = text(&pr.title);
                row.description = optional_text(pr.body.as_deref());
                row.assignees = list(&pr.assignees);
                row.close_date = timestamp(pr.closed_at.as_deref());
                row.request_status = request_status(&pr.state, pr.merged_at.is_some());
                row.reviewers = list(&pr.requested_reviewers);
            }
            Record::Issue(issue) => {
                row.timestamp = timestamp(issue.created_at.as_deref());
                row.author = text(&issue.author);
                row.repo_id = issue.number.to_string();
                row.message = text(&issue.title);
                row.description = optional_text(issue.body.as_deref());
                row.assignees = list(&issue.assignees);
                row.close_date = timestamp(issue.closed_at.as_deref());
                row.closed_by = optional_text(issue.closed_by.as_deref());
                row.request_status = text(&issue.state);
            }
            Record::Review(review) => {
                row.timestamp = timestamp(review.submitted_at.as_deref());
                row.author = text(&review.reviewer);
                row.repo_id = review.pull_request_number.to_string();
                row.description = optional_text(review.body.as_deref());
                row.review_recommendation = text(&review.state.to_lowercase());
                row.tagged = mentions(review.body.as_deref().unwrap_or_default());
            }
            Record::Comment(comment) | Record::ReviewComment(comment) => {
                row.timestamp = timestamp(comment.created_at.as_deref());
                row.author = text(&comment.author);
                row.repo_id = comment.id.to_string();
                row.message = text(&comment.body);
                row.tagged = mentions(&comment.body);
            }
        }
        row
    }
}

/// All records of an aggregate in export order: commits, pull requests,
/// issues, reviews, comments, review comments.
pub fn records(result: &AggregateResult) -> impl Iterator<Item = Record<'_>> {
    result
        .commits
        .iter()
        .map(Record::Commit)
        .chain(result.pull_requests.iter().map(Record::PullRequest))
        .chain(result.issues.iter().map(Record::Issue))
        .chain(result.reviews.iter().map(Record::Review))
        .chain(result.comments.iter().map(Record::Comment))
        .chain(result.review_comments.iter().map(Record::ReviewComment))
}

/// Normalize an API timestamp to `YYYY-MM-DDTHH:MM:SS.mmmZ`.
/// Absent or unparseable input becomes the sentinel.
pub fn timestamp(raw: Option<&str>) -> String {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value.trim()).ok())
        .map(|parsed| {
            parsed
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .unwrap_or_else(|| SENTINEL.to_string())
}

/// `@login` mentions in free text, in first-seen order, joined with `; `.
pub fn mentions(body: &str) -> String {
    let mut found: Vec<&str> = Vec::new();
    for (idx, _) in body.match_indices('@') {
        let preceded_by_word = body[..idx]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        if preceded_by_word {
            continue;
        }
        let login = mention_login(&body[idx + 1..]);
        if !login.is_empty() && !found.contains(&login) {
            found.push(login);
        }
    }
    list(&found)
}

/// The login immediately after an `@`, empty when there is none.
pub(crate) fn mention_login(after_at: &str) -> &str {
    let end = after_at
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(after_at.len());
    after_at[..end].trim_end_matches('-')
}

fn request_status(state: &str, merged: bool) -> String {
    if merged {
        "merged".to_string()
    } else {
        text(state)
    }
}

fn text(value: &str) -> String {
    if value.trim().is_empty() {
        SENTINEL.to_string()
    } else {
        value.to_string()
    }
}

fn optional_text(value: Option<&str>) -> String {
    text(value.unwrap_or_default())
}

fn optional(value: Option<u64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| SENTINEL.to_string())
}

fn list<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return SENTINEL.to_string();
    }
    items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue() -> Issue {
        Issue {
            number: 12,
            author: "alice".to_string(),
            title: "Crash".to_string(),
            body: None,
            state: "open".to_string(),
            created_at: Some("2024-05-01T10:00:00Z".to_string()),
            closed_at: None,
            closed_by: None,
            assignees: vec![],
        }
    }

    #[test]
    fn test_open_issue_uses_sentinels() {
        let row = Record::Issue(&issue()).to_row("repo");
        assert_eq!(row.close_date, SENTINEL);
        assert_eq!(row.closed_by, SENTINEL);
        assert_eq!(row.assignees, SENTINEL);
        assert_eq!(row.description, SENTINEL);
        assert_eq!(row.timestamp, "2024-05-01T10:00:00.000Z");
        assert_eq!(row.action, "issue");
        assert_eq!(row.repo_id, "12");
    }

    #[test]
    fn test_pull_request_row() {
        let pr = PullRequest {
            number: 3,
            author: "bob".to_string(),
            title: "Add feature".to_string(),
            body: Some("Closes #1".to_string()),
            state: "closed".to_string(),
            created_at: Some("2024-05-01T10:00:00+02:00".to_string()),
            merged_at: Some("2024-05-02T10:00:00Z".to_string()),
            closed_at: Some("2024-05-02T10:00:00Z".to_string()),
            assignees: vec!["bob".to_string()],
            requested_reviewers: vec!["carol".to_string(), "dave".to_string()],
        };
        let row = Record::PullRequest(&pr).to_row("repo");
        assert_eq!(row.timestamp, "2024-05-01T08:00:00.000Z");
        assert_eq!(row.request_status, "merged");
        assert_eq!(row.reviewers, "carol; dave");
        assert_eq!(row.description, "Closes #1");
        assert_eq!(row.review_recommendation, SENTINEL);
    }

    #[test]
    fn test_commit_row_without_stats() {
        let commit = Commit {
            sha: "abc".to_string(),
            author: "Jane Doe".to_string(),
            message: "init".to_string(),
            date: Some("not a date".to_string()),
            additions: None,
            deletions: None,
        };
        let row = Record::Commit(&commit).to_row("repo");
        assert_eq!(row.timestamp, SENTINEL);
        assert_eq!(row.additions, SENTINEL);
        assert_eq!(row.repo_id, "abc");
        assert_eq!(row.author, "Jane Doe");
    }

    #[test]
    fn test_review_row() {
        let review = Review {
            pull_request_number: 42,
            reviewer: "erin".to_string(),
            state: "CHANGES_REQUESTED".to_string(),
            submitted_at: None,
            body: Some("please ask @frank".to_string()),
        };
        let row = Record::Review(&review).to_row("repo");
        assert_eq!(row.repo_id, "42");
        assert_eq!(row.review_recommendation, "changes_requested");
        assert_eq!(row.tagged, "frank");
        assert_eq!(row.timestamp, SENTINEL);
    }

    #[test]
    fn test_mentions() {
        assert_eq!(mentions("cc @alice and @bob-2, thanks @alice"), "alice; bob-2");
        assert_eq!(mentions("mail me at me@example.com"), SENTINEL);
        assert_eq!(mentions("no mentions"), SENTINEL);
        assert_eq!(mentions("@ alone"), SENTINEL);
    }

    #[test]
    fn test_timestamp_absent() {
        assert_eq!(timestamp(None), SENTINEL);
        assert_eq!(timestamp(Some("")), SENTINEL);
    }

    #[test]
    fn test_cells_follow_header() {
        let row = Record::Issue(&issue()).to_row("repo");
        let cells = row.cells();
        assert_eq!(cells.len(), HEADER.len());
        assert_eq!(cells[0], "repo");
        assert_eq!(cells[2], "issue");
    }
}
