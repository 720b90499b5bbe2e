//! Turns raw API records into the typed collections of an `AggregateResult`.
//!
//! Records that cannot be decoded at all are dropped with a warning. Missing
//! optional fields are repaired locally and never surface as errors.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{Comment, Commit, Issue, PullRequest, RepositorySummary, Review};
use crate::github::types::{
    RawComment, RawCommit, RawIssue, RawPullRequest, RawRepository, RawReview, RawUser,
};
use crate::github::{RepoRef, ResourceKind};

/// Display name used when a record carries no usable author at all.
pub const UNKNOWN_AUTHOR: &str = "unknown";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Malformed {kind} record: {reason}")]
    MalformedRecord { kind: ResourceKind, reason: String },
}

pub fn repository(raw: Value, requested: &RepoRef) -> RepositorySummary {
    match serde_json::from_value::<RawRepository>(raw) {
        Ok(repo) => RepositorySummary {
            full_name: repo.full_name,
            description: repo.description.filter(|d| !d.is_empty()),
        },
        Err(err) => {
            warn!(error = %err, "repository record missing full_name, using requested name");
            RepositorySummary {
                full_name: requested.to_string(),
                description: None,
            }
        }
    }
}

/// Normalize issues, dropping every record that is really a pull request.
pub fn issues(raw: Vec<Value>) -> Vec<Issue> {
    let total = raw.len();
    let issues: Vec<Issue> = raw
        .into_iter()
        .filter(|item| !is_pull_request(item))
        .filter_map(|item| decode::<RawIssue>(ResourceKind::Issues, item))
        .map(|issue| Issue {
            number: issue.number,
            author: login_or_unknown(issue.user),
            title: issue.title.unwrap_or_default(),
            body: issue.body,
            state: issue.state.unwrap_or_else(|| "unknown".to_string()),
            created_at: issue.created_at,
            closed_at: issue.closed_at,
            closed_by: issue.closed_by.map(|u| u.login),
            assignees: logins(issue.assignees.unwrap_or_default()),
        })
        .collect();

    if issues.len() != total {
        debug!(total, kept = issues.len(), "filtered issue records");
    }
    issues
}

pub fn pull_requests(raw: Vec<Value>) -> Vec<PullRequest> {
    raw.into_iter()
        .filter_map(|item| decode::<RawPullRequest>(ResourceKind::PullRequests, item))
        .map(|pr| PullRequest {
            number: pr.number,
            author: login_or_unknown(pr.user),
            title: pr.title.unwrap_or_default(),
            body: pr.body,
            state: pr.state.unwrap_or_else(|| "unknown".to_string()),
            created_at: pr.created_at,
            merged_at: pr.merged_at,
            closed_at: pr.closed_at,
            assignees: logins(pr.assignees.unwrap_or_default()),
            requested_reviewers: logins(pr.requested_reviewers.unwrap_or_default()),
        })
        .collect()
}

/// Normalize commits. The author is the linked account login, falling back to
/// the raw git author name when the commit is not linked to an account.
pub fn commits(raw: Vec<Value>) -> Vec<Commit> {
    raw.into_iter()
        .filter_map(|item| decode::<RawCommit>(ResourceKind::Commits, item))
        .map(|commit| {
            let detail = commit.commit;
            let git_author = detail.as_ref().and_then(|d| d.author.as_ref());
            let author = commit
                .author
                .map(|u| u.login)
                .or_else(|| git_author.and_then(|a| a.name.clone()))
                .unwrap_or_else(|| {
                    warn!(sha = %commit.sha, "commit has no author block");
                    UNKNOWN_AUTHOR.to_string()
                });

            Commit {
                author,
                date: git_author.and_then(|a| a.date.clone()),
                message: detail
                    .as_ref()
                    .and_then(|d| d.message.clone())
                    .unwrap_or_default(),
                additions: commit.stats.as_ref().and_then(|s| s.additions),
                deletions: commit.stats.as_ref().and_then(|s| s.deletions),
                sha: commit.sha,
            }
        })
        .collect()
}

/// Normalize the reviews of one pull request. The owning PR number comes from
/// the record itself, then from its `pull_request_url`, then from the PR the
/// reviews were requested for.
pub fn reviews(raw: Vec<Value>, requested_pull: u64) -> Vec<Review> {
    raw.into_iter()
        .filter_map(|item| decode::<RawReview>(ResourceKind::Reviews, item))
        .map(|review| Review {
            pull_request_number: review
                .pull_request_number
                .or_else(|| {
                    review
                        .pull_request_url
                        .as_deref()
                        .and_then(pull_number_from_url)
                })
                .unwrap_or(requested_pull),
            reviewer: login_or_unknown(review.user),
            state: review.state.unwrap_or_else(|| "unknown".to_string()),
            submitted_at: review.submitted_at,
            body: review.body.filter(|b| !b.is_empty()),
        })
        .collect()
}

pub fn comments(raw: Vec<Value>, kind: ResourceKind) -> Vec<Comment> {
    raw.into_iter()
        .filter_map(|item| decode::<RawComment>(kind, item))
        .map(|comment| Comment {
            id: comment.id,
            author: login_or_unknown(comment.user),
            body: comment.body.unwrap_or_default(),
            created_at: comment.created_at,
            pull_request_number: comment
                .pull_request_url
                .as_deref()
                .and_then(pull_number_from_url),
        })
        .collect()
}

/// Names of repositories returned by the owner listing.
pub fn repository_names(raw: Vec<Value>) -> Vec<String> {
    raw.into_iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str).map(String::from))
        .collect()
}

/// Parse the trailing path segment of a pull request API URL as its number,
/// e.g. `https://api.github.com/repos/o/r/pulls/42` -> 42.
pub fn pull_number_from_url(url: &str) -> Option<u64> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

fn is_pull_request(item: &Value) -> bool {
    item.get("pull_request").is_some_and(|marker| !marker.is_null())
}

fn decode<T: DeserializeOwned>(kind: ResourceKind, item: Value) -> Option<T> {
    match serde_json::from_value::<T>(item) {
        Ok(record) => Some(record),
        Err(err) => {
            let err = NormalizeError::MalformedRecord {
                kind,
                reason: err.to_string(),
            };
            warn!(error = %err, "skipping record");
            None
        }
    }
}

fn login_or_unknown(user: Option<RawUser>) -> String {
    user.map(|u| u.login)
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

fn logins(users: Vec<RawUser>) -> Vec<String> {
    users.into_iter().map(|u| u.login).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issues_drop_pull_requests() {
        let raw = vec![
            json!({ "number": 1, "title": "bug", "user": { "login": "alice" } }),
            json!({ "number": 2, "title": "pr", "pull_request": { "url": "x" } }),
            json!({ "number": 3, "title": "feature", "pull_request": null }),
            json!({ "number": 4, "title": "pr2", "pull_request": {} }),
        ];
        let issues = issues(raw);
        let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(issues[0].author, "alice");
        assert_eq!(issues[1].author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_issue_fields() {
        let raw = vec![json!({
            "number": 7,
            "title": "Crash on start",
            "state": "closed",
            "user": { "login": "bob" },
            "created_at": "2024-01-02T03:04:05Z",
            "closed_at": "2024-01-03T00:00:00Z",
            "closed_by": { "login": "carol" },
            "assignees": [{ "login": "dave" }, { "login": "erin" }]
        })];
        let issue = &issues(raw)[0];
        assert_eq!(issue.state, "closed");
        assert_eq!(issue.closed_by.as_deref(), Some("carol"));
        assert_eq!(issue.assignees, vec!["dave", "erin"]);
    }

    #[test]
    fn test_null_user_lists_are_repaired() {
        let issues = issues(vec![json!({ "number": 1, "title": "t", "assignees": null })]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].assignees.is_empty());

        let prs = pull_requests(vec![json!({
            "number": 2,
            "assignees": null,
            "requested_reviewers": null
        })]);
        assert_eq!(prs.len(), 1);
        assert!(prs[0].assignees.is_empty());
        assert!(prs[0].requested_reviewers.is_empty());
    }

    #[test]
    fn test_commit_author_falls_back_to_git_name() {
        let raw = vec![json!({
            "sha": "abc123",
            "author": null,
            "commit": {
                "message": "Initial commit",
                "author": { "name": "Jane Doe", "date": "2024-01-01T00:00:00Z" }
            }
        })];
        let commit = &commits(raw)[0];
        assert_eq!(commit.author, "Jane Doe");
        assert_eq!(commit.date.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(commit.additions, None);
    }

    #[test]
    fn test_commit_prefers_account_login_and_reads_stats() {
        let raw = vec![json!({
            "sha": "def456",
            "author": { "login": "jdoe" },
            "commit": { "message": "Fix", "author": { "name": "Jane Doe" } },
            "stats": { "additions": 10, "deletions": 2 }
        })];
        let commit = &commits(raw)[0];
        assert_eq!(commit.author, "jdoe");
        assert_eq!(commit.additions, Some(10));
        assert_eq!(commit.deletions, Some(2));
    }

    #[test]
    fn test_commit_without_author_block_is_repaired() {
        let raw = vec![json!({ "sha": "0001", "author": null, "commit": { "message": "m" } })];
        let commit = &commits(raw)[0];
        assert_eq!(commit.author, UNKNOWN_AUTHOR);
        assert!(commit.date.is_none());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let raw = vec![json!({ "author": null }), json!({ "sha": "ok" })];
        let commits = commits(raw);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].sha, "ok");
    }

    #[test]
    fn test_review_number_from_url() {
        let raw = vec![json!({
            "user": { "login": "rev" },
            "state": "APPROVED",
            "submitted_at": "2024-02-01T00:00:00Z",
            "pull_request_url": "https://api.github.com/repos/o/r/pulls/42"
        })];
        let review = &reviews(raw, 7)[0];
        assert_eq!(review.pull_request_number, 42);
        assert_eq!(review.state, "APPROVED");
    }

    #[test]
    fn test_review_number_falls_back_to_requested_pull() {
        let raw = vec![json!({ "user": { "login": "rev" }, "state": "COMMENTED", "body": "" })];
        let review = &reviews(raw, 7)[0];
        assert_eq!(review.pull_request_number, 7);
        assert!(review.body.is_none());
    }

    #[test]
    fn test_pull_number_from_url() {
        assert_eq!(pull_number_from_url("https://x/pulls/42"), Some(42));
        assert_eq!(pull_number_from_url("https://x/pulls/42/"), Some(42));
        assert_eq!(pull_number_from_url("https://x/pulls/abc"), None);
        assert_eq!(pull_number_from_url(""), None);
    }

    #[test]
    fn test_comments() {
        let raw = vec![json!({
            "id": 99,
            "user": { "login": "alice" },
            "body": "LGTM @bob",
            "created_at": "2024-03-01T00:00:00Z",
            "pull_request_url": "https://api.github.com/repos/o/r/pulls/5"
        })];
        let comment = &comments(raw, ResourceKind::ReviewComments)[0];
        assert_eq!(comment.id, 99);
        assert_eq!(comment.pull_request_number, Some(5));
    }

    #[test]
    fn test_repository_summary_fallback() {
        let requested = RepoRef::new("o", "r").unwrap();
        let summary = repository(json!({ "full_name": "o/r", "description": "" }), &requested);
        assert_eq!(summary.full_name, "o/r");
        assert!(summary.description.is_none());

        let summary = repository(json!({}), &requested);
        assert_eq!(summary.full_name, "o/r");
    }
}
