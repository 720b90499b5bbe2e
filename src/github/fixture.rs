use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{FetchError, PageFetcher, RepoRef, Resource};

/// In-memory `PageFetcher` serving canned records keyed by API path.
///
/// Collections are sliced into pages exactly like the remote API would, and
/// every call is recorded so callers can assert on request counts. Used by
/// `--mock` and throughout the tests.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    repositories: HashMap<String, Value>,
    collections: HashMap<String, Vec<Value>>,
    failures: HashMap<String, u16>,
    endless: HashSet<String>,
    calls: Mutex<Vec<(String, u32)>>,
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    repositories: HashMap<String, Value>,
    #[serde(default)]
    collections: HashMap<String, Vec<Value>>,
}

impl FixtureFetcher {
    #[cfg(test)]
    pub fn new() -> FixtureFetcher {
        FixtureFetcher::default()
    }

    /// Load from a JSON document shaped like
    /// `{"repositories": {path: record}, "collections": {path: [records]}}`.
    pub fn from_json(json: &str) -> Result<FixtureFetcher, serde_json::Error> {
        let file: FixtureFile = serde_json::from_str(json)?;
        Ok(FixtureFetcher {
            repositories: file.repositories,
            collections: file.collections,
            ..FixtureFetcher::default()
        })
    }

    #[cfg(test)]
    pub fn with_repository(mut self, repo: &RepoRef, record: Value) -> FixtureFetcher {
        self.repositories.insert(repo.path(), record);
        self
    }

    #[cfg(test)]
    pub fn with_collection(mut self, path: &str, items: Vec<Value>) -> FixtureFetcher {
        self.collections.insert(path.to_string(), items);
        self
    }

    /// Every call against `path` fails with `status`.
    #[cfg(test)]
    pub fn with_failure(mut self, path: &str, status: u16) -> FixtureFetcher {
        self.failures.insert(path.to_string(), status);
        self
    }

    /// `path` answers every page with a full page of items, forever.
    #[cfg(test)]
    pub fn with_endless(mut self, path: &str) -> FixtureFetcher {
        self.endless.insert(path.to_string());
        self
    }

    /// Paths requested so far, with their page index (0 for repository calls).
    #[cfg(test)]
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|(p, _)| p == path).count()
    }

    fn record(&self, path: &str, page: u32) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((path.to_string(), page));
        }
    }

    fn check_failure(&self, path: &str) -> Result<(), FetchError> {
        match self.failures.get(path) {
            Some(404) => Err(FetchError::NotFound {
                path: path.to_string(),
            }),
            Some(status) => Err(FetchError::Remote {
                path: path.to_string(),
                status: *status,
                message: "fixture failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch_repository(&self, repo: &RepoRef) -> Result<Value, FetchError> {
        let path = repo.path();
        self.record(&path, 0);
        self.check_failure(&path)?;
        self.repositories
            .get(&path)
            .cloned()
            .ok_or(FetchError::NotFound { path })
    }

    async fn fetch_page(
        &self,
        resource: &Resource,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, FetchError> {
        self.record(&resource.path, page);
        self.check_failure(&resource.path)?;

        if self.endless.contains(&resource.path) {
            return Ok((0..per_page)
                .map(|i| serde_json::json!({ "id": u64::from(page) * 1000 + u64::from(i) }))
                .collect());
        }

        let items = match self.collections.get(&resource.path) {
            Some(items) => items,
            None => return Ok(Vec::new()),
        };
        let start = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
        Ok(items
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect())
    }
}
