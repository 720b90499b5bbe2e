pub mod page;

pub use page::{paginate, PageView, Tab};

use colored::Colorize;
use tracing::{debug, instrument};

use crate::aggregate::{AggregateResult, Comment, Commit, Issue, PullRequest, Review, Snapshot};

/// Print the outcome of a search: an error banner when it failed, otherwise
/// the repository header and one count per tab.
pub fn print_summary(snapshot: &Snapshot) {
    if let Some(message) = &snapshot.error_message {
        println!();
        println!("{} {}", "error:".red().bold(), message);
        println!();
        return;
    }

    let result = &snapshot.result;
    println!();
    println!("{}", result.repository.full_name.bold());
    if let Some(description) = &result.repository.description {
        println!("{}", description.dimmed());
    }
    println!();
    if result.is_empty() {
        println!("  No records found.");
    }
    for (tab, count) in tab_counts(result) {
        println!("  {:<16} {}", format!("{}:", tab), count);
    }
    println!();
}

/// Print one page of one tab.
#[instrument(skip(result))]
pub fn print_tab(result: &AggregateResult, tab: Tab, page: usize, per_page: usize) {
    let lines = tab_lines(result, tab);
    let view = paginate(&lines, page, per_page);
    debug!(page = view.page, total_pages = view.total_pages, "rendering tab");

    println!("═══ {} ═══", tab);
    if view.items.is_empty() {
        println!("  No records.");
    }
    for line in view.items {
        println!("  • {}", line);
    }
    println!("{}", page_footer(&view));
    println!();
}

/// Print one page of an owner's repository names.
pub fn print_repositories(owner: &str, names: &[String], page: usize, per_page: usize) {
    let view = paginate(names, page, per_page);
    println!();
    println!("{}", owner.bold());
    for name in view.items {
        println!("  {}", name);
    }
    println!("{}", page_footer(&view));
    println!();
}

pub fn tab_counts(result: &AggregateResult) -> Vec<(Tab, usize)> {
    vec![
        (Tab::Issues, result.issues.len()),
        (Tab::PullRequests, result.pull_requests.len()),
        (Tab::Commits, result.commits.len()),
        (Tab::Reviews, result.reviews.len()),
        (Tab::Comments, result.comments.len()),
        (Tab::ReviewComments, result.review_comments.len()),
    ]
}

fn tab_lines(result: &AggregateResult, tab: Tab) -> Vec<String> {
    match tab {
        Tab::Issues => result.issues.iter().map(issue_line).collect(),
        Tab::PullRequests => result.pull_requests.iter().map(pull_request_line).collect(),
        Tab::Commits => result.commits.iter().map(commit_line).collect(),
        Tab::Reviews => result.reviews.iter().map(review_line).collect(),
        Tab::Comments => result.comments.iter().map(comment_line).collect(),
        Tab::ReviewComments => result.review_comments.iter().map(comment_line).collect(),
    }
}

fn page_footer<T>(view: &PageView<'_, T>) -> String {
    let prev = if view.has_prev() { "◀ prev" } else { "" };
    let next = if view.has_next() { "next ▶" } else { "" };
    format!("  {} Page {}/{} {}", prev, view.page, view.total_pages, next)
        .dimmed()
        .to_string()
}

fn issue_line(issue: &Issue) -> String {
    let closed = match (&issue.closed_at, &issue.closed_by) {
        (Some(at), Some(by)) => format!(" | closed {} by {}", at, by),
        (Some(at), None) => format!(" | closed {}", at),
        _ => String::new(),
    };
    let assignees = if issue.assignees.is_empty() {
        String::new()
    } else {
        format!(" | assignees: {}", issue.assignees.join(", "))
    };
    format!(
        "#{} [{}] {} by {} ({}){}{}",
        issue.number,
        colorize_state(&issue.state),
        issue.title,
        issue.author,
        issue.created_at.as_deref().unwrap_or("-"),
        assignees,
        closed
    )
}

fn pull_request_line(pr: &PullRequest) -> String {
    let state = if pr.merged_at.is_some() {
        colorize_state("merged")
    } else {
        colorize_state(&pr.state)
    };
    let reviewers = if pr.requested_reviewers.is_empty() {
        String::new()
    } else {
        format!(" | reviewers: {}", pr.requested_reviewers.join(", "))
    };
    format!(
        "#{} [{}] {} by {} ({}){}",
        pr.number,
        state,
        pr.title,
        pr.author,
        pr.created_at.as_deref().unwrap_or("-"),
        reviewers
    )
}

fn commit_line(commit: &Commit) -> String {
    let short_sha: String = commit.sha.chars().take(7).collect();
    let subject = commit.message.lines().next().unwrap_or_default();
    let stats = match (commit.additions, commit.deletions) {
        (Some(a), Some(d)) => format!(" +{} -{}", a, d),
        _ => String::new(),
    };
    format!(
        "{} {} by {} ({}){}",
        short_sha.yellow(),
        subject,
        commit.author,
        commit.date.as_deref().unwrap_or("-"),
        stats
    )
}

fn review_line(review: &Review) -> String {
    format!(
        "PR #{} [{}] by {} ({}){}",
        review.pull_request_number,
        colorize_state(&review.state),
        review.reviewer,
        review.submitted_at.as_deref().unwrap_or("-"),
        review
            .body
            .as_deref()
            .map(|b| format!(": {}", first_line(b)))
            .unwrap_or_default()
    )
}

fn comment_line(comment: &Comment) -> String {
    let target = comment
        .pull_request_number
        .map(|n| format!(" on PR #{}", n))
        .unwrap_or_default();
    format!(
        "#{} by {}{} ({}): {}",
        comment.id,
        comment.author,
        target,
        comment.created_at.as_deref().unwrap_or("-"),
        first_line(&comment.body)
    )
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Helper to colorize a record state for terminal output.
fn colorize_state(state: &str) -> colored::ColoredString {
    match state.to_ascii_lowercase().as_str() {
        "open" | "approved" => state.green().bold(),
        "merged" => state.magenta().bold(),
        "closed" | "changes_requested" => state.red().bold(),
        _ => state.normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{RepositorySummary, SearchStatus};

    fn sample_result() -> AggregateResult {
        AggregateResult {
            repository: RepositorySummary {
                full_name: "org/repo".to_string(),
                description: Some("demo".to_string()),
            },
            commits: vec![Commit {
                sha: "abcdef123456".to_string(),
                author: "Jane Doe".to_string(),
                message: "Fix parser\n\nLong body".to_string(),
                date: None,
                additions: Some(3),
                deletions: Some(1),
            }],
            reviews: vec![Review {
                pull_request_number: 4,
                reviewer: "dave".to_string(),
                state: "APPROVED".to_string(),
                submitted_at: None,
                body: None,
            }],
            ..AggregateResult::default()
        }
    }

    #[test]
    fn test_tab_counts() {
        let counts = tab_counts(&sample_result());
        assert_eq!(counts.len(), 6);
        assert!(counts.contains(&(Tab::Commits, 1)));
        assert!(counts.contains(&(Tab::Issues, 0)));
    }

    #[test]
    fn test_commit_line_uses_short_sha_and_subject() {
        colored::control::set_override(false);
        let line = commit_line(&sample_result().commits[0]);
        assert!(line.starts_with("abcdef1 Fix parser by Jane Doe"));
        assert!(line.ends_with("+3 -1"));
        assert!(!line.contains("Long body"));
    }

    #[test]
    fn test_review_line() {
        colored::control::set_override(false);
        let line = review_line(&sample_result().reviews[0]);
        assert_eq!(line, "PR #4 [APPROVED] by dave (-)");
    }

    #[test]
    fn test_print_does_not_panic() {
        let snapshot = Snapshot {
            generation: 1,
            status: SearchStatus::Fetched,
            result: sample_result(),
            error_message: None,
        };
        print_summary(&snapshot);
        for (tab, _) in tab_counts(&snapshot.result) {
            print_tab(&snapshot.result, tab, 1, 10);
        }
        print_repositories("org", &["a".to_string()], 5, 10);
    }

    #[test]
    fn test_print_error_banner_does_not_panic() {
        let snapshot = Snapshot {
            generation: 1,
            status: SearchStatus::Failed,
            result: AggregateResult::default(),
            error_message: Some("Repository not found.".to_string()),
        };
        print_summary(&snapshot);
    }
}
