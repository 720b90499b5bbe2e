pub mod normalize;
pub mod types;

pub use types::{AggregateResult, Comment, Commit, Issue, PullRequest, Review};
#[cfg(test)]
pub use types::RepositorySummary;
pub use types::{SearchStatus, Snapshot};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::github::paginator::Paginator;
use crate::github::{FetchError, PageFetcher, RepoRef, Resource, ResourceKind};

/// Message kept when the repository itself does not exist or is hidden.
pub const NOT_FOUND_MESSAGE: &str =
    "Repository not found. Check the owner and repository name, or whether it is private.";

/// What to do when fetching the reviews of a single pull request fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFailurePolicy {
    /// Fail the whole search and discard everything fetched so far.
    #[default]
    #[serde(alias = "fail")]
    FailSearch,
    /// Log the failure, leave that pull request without reviews and continue.
    #[serde(alias = "skip")]
    SkipPullRequest,
}

/// Knobs for one search. Built from `Config` in `main`.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub paginator: Paginator,
    /// Sent as `state=` for issues and pull requests.
    pub state: Option<String>,
    /// Sent as `sha=` for commits.
    pub commit_branch: Option<String>,
    pub include_review_comments: bool,
    pub review_failure: ReviewFailurePolicy,
}

/// Drives the per-repository fetch sequence and owns the resulting snapshot.
///
/// Every search gets a generation number. A search only commits its result
/// while it is still the newest one, so a slow earlier search can never
/// overwrite a later one.
pub struct Aggregator<F> {
    fetcher: F,
    options: SearchOptions,
    generation: AtomicU64,
    state: RwLock<Arc<Snapshot>>,
}

impl<F: PageFetcher> Aggregator<F> {
    pub fn new(fetcher: F, options: SearchOptions) -> Aggregator<F> {
        debug!(
            page_size = options.paginator.page_size(),
            review_failure = ?options.review_failure,
            "aggregator configured"
        );
        Aggregator {
            fetcher,
            options,
            generation: AtomicU64::new(0),
            state: RwLock::new(Arc::new(Snapshot::idle())),
        }
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The latest committed snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.state.read() {
            Ok(state) => Arc::clone(&*state),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_ready()
    }

    pub fn error_message(&self) -> Option<String> {
        self.snapshot().error_message.clone()
    }

    /// Fetch everything for `owner/repo`.
    ///
    /// Any prior result is cleared before the first request. The outcome is
    /// all-or-nothing: on failure the snapshot holds an empty aggregate and an
    /// error message. Blank input does not start a search.
    #[instrument(skip(self))]
    pub async fn search(&self, owner: &str, repo: &str) -> Arc<Snapshot> {
        let Some(repo) = RepoRef::new(owner, repo) else {
            warn!("owner and repository name are required, ignoring search");
            return self.snapshot();
        };

        let generation = self.begin();
        info!(generation, repo = %repo, "search started");

        let snapshot = match self.collect(&repo, generation).await {
            Ok(Some(result)) => {
                info!(
                    issues = result.issues.len(),
                    pull_requests = result.pull_requests.len(),
                    commits = result.commits.len(),
                    reviews = result.reviews.len(),
                    comments = result.comments.len(),
                    "search complete"
                );
                Snapshot {
                    generation,
                    status: SearchStatus::Fetched,
                    result,
                    error_message: None,
                }
            }
            Ok(None) => {
                debug!(generation, "search superseded, discarding");
                return self.snapshot();
            }
            Err(err) => {
                warn!(error = %err, "search failed");
                Snapshot {
                    generation,
                    status: SearchStatus::Failed,
                    result: AggregateResult::default(),
                    error_message: Some(user_message(&err, &repo)),
                }
            }
        };

        self.commit(snapshot);
        self.snapshot()
    }

    /// Names of all repositories owned by `owner`.
    #[instrument(skip(self))]
    pub async fn list_repositories(&self, owner: &str) -> Result<Vec<String>, FetchError> {
        let resource = Resource::owner_repositories(owner);
        let raw = self.options.paginator.fetch_all(&self.fetcher, &resource).await?;
        Ok(normalize::repository_names(raw))
    }

    /// Start a new generation and publish an empty `Fetching` snapshot.
    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.commit(Snapshot {
            generation,
            status: SearchStatus::Fetching,
            result: AggregateResult::default(),
            error_message: None,
        });
        generation
    }

    /// Publish `snapshot` unless a newer search has started since it began.
    fn commit(&self, snapshot: Snapshot) -> bool {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if snapshot.generation != self.generation.load(Ordering::SeqCst) {
            debug!(generation = snapshot.generation, "dropping stale snapshot");
            return false;
        }
        *state = Arc::new(snapshot);
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Run the fetch sequence. `Ok(None)` means a newer search started and
    /// this one stopped early.
    async fn collect(
        &self,
        repo: &RepoRef,
        generation: u64,
    ) -> Result<Option<AggregateResult>, FetchError> {
        let paginator = &self.options.paginator;
        let state = self.options.state.as_deref();

        let raw = self.fetcher.fetch_repository(repo).await?;
        let repository = normalize::repository(raw, repo);
        if !self.is_current(generation) {
            return Ok(None);
        }

        let raw = paginator
            .fetch_all(&self.fetcher, &Resource::issues(repo, state))
            .await?;
        let issues = normalize::issues(raw);
        if !self.is_current(generation) {
            return Ok(None);
        }

        let raw = paginator
            .fetch_all(&self.fetcher, &Resource::pull_requests(repo, state))
            .await?;
        let pull_requests = normalize::pull_requests(raw);
        if !self.is_current(generation) {
            return Ok(None);
        }

        let branch = self.options.commit_branch.as_deref();
        let raw = paginator
            .fetch_all(&self.fetcher, &Resource::commits(repo, branch))
            .await?;
        let commits = normalize::commits(raw);
        if !self.is_current(generation) {
            return Ok(None);
        }

        let raw = paginator
            .fetch_all(&self.fetcher, &Resource::issue_comments(repo))
            .await?;
        let comments = normalize::comments(raw, ResourceKind::IssueComments);
        if !self.is_current(generation) {
            return Ok(None);
        }

        let review_comments = if self.options.include_review_comments {
            let raw = paginator
                .fetch_all(&self.fetcher, &Resource::review_comments(repo))
                .await?;
            normalize::comments(raw, ResourceKind::ReviewComments)
        } else {
            Vec::new()
        };

        let mut reviews = Vec::new();
        for pr in &pull_requests {
            if !self.is_current(generation) {
                return Ok(None);
            }
            let resource = Resource::reviews(repo, pr.number);
            match paginator.fetch_all(&self.fetcher, &resource).await {
                Ok(raw) => reviews.extend(normalize::reviews(raw, pr.number)),
                Err(err) if self.options.review_failure == ReviewFailurePolicy::SkipPullRequest => {
                    warn!(pr = pr.number, error = %err, "skipping reviews for pull request");
                }
                Err(err) => return Err(err),
            }
        }
        if !self.is_current(generation) {
            return Ok(None);
        }

        Ok(Some(AggregateResult {
            repository,
            issues,
            pull_requests,
            commits,
            reviews,
            comments,
            review_comments,
        }))
    }
}

/// The text shown for a failed search. Only a 404 on the repository record
/// itself reads as "not found"; a 404 deeper in the walk is a generic failure.
pub fn user_message(err: &FetchError, repo: &RepoRef) -> String {
    if err.is_not_found() && err.path() == Some(repo.path().as_str()) {
        NOT_FOUND_MESSAGE.to_string()
    } else {
        format!("Failed to fetch repository data: {}", err)
    }
}
