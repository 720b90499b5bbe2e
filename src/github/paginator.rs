use serde_json::Value;
use tracing::{debug, instrument};

use super::{FetchError, PageFetcher, Resource, MAX_PAGE_SIZE};

/// Walks a paged collection to completion.
///
/// Pages are requested one at a time, starting at 1, until a page comes back
/// shorter than `page_size`. The remote API is assumed never to return a short
/// page before the last one.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: u32,
    max_pages: Option<u32>,
}

impl Default for Paginator {
    fn default() -> Self {
        Paginator {
            page_size: MAX_PAGE_SIZE,
            max_pages: None,
        }
    }
}

impl Paginator {
    /// `page_size` is clamped into `1..=100`.
    pub fn new(page_size: u32, max_pages: Option<u32>) -> Paginator {
        Paginator {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            max_pages,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch every item of `resource`, in page order.
    ///
    /// Errors from the fetcher are returned unchanged. When `max_pages` is set
    /// and that many full pages have been read, the walk stops with
    /// `FetchError::PaginationLimitExceeded`.
    #[instrument(skip(self, fetcher, resource), fields(kind = %resource.kind, path = %resource.path))]
    pub async fn fetch_all<F>(&self, fetcher: &F, resource: &Resource) -> Result<Vec<Value>, FetchError>
    where
        F: PageFetcher + ?Sized,
    {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let batch = fetcher.fetch_page(resource, page, self.page_size).await?;
            let count = batch.len();
            items.extend(batch);
            debug!(page, count, total = items.len(), "fetched page");

            if count < self.page_size as usize {
                break;
            }

            if let Some(max_pages) = self.max_pages {
                if page >= max_pages {
                    return Err(FetchError::PaginationLimitExceeded {
                        path: resource.path.clone(),
                        max_pages,
                    });
                }
            }

            page += 1;
        }

        debug!(pages = page, total = items.len(), "collection complete");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{FixtureFetcher, RepoRef};
    use serde_json::json;

    fn numbered(count: usize) -> Vec<Value> {
        (0..count).map(|i| json!({ "number": i })).collect()
    }

    fn issues() -> Resource {
        Resource::issues(&RepoRef::new("org", "repo").unwrap(), None)
    }

    #[tokio::test]
    async fn test_short_page_terminates_walk() {
        let fetcher = FixtureFetcher::new().with_collection("/repos/org/repo/issues", numbered(237));
        let items = Paginator::new(100, None)
            .fetch_all(&fetcher, &issues())
            .await
            .unwrap();

        assert_eq!(items.len(), 237);
        assert_eq!(fetcher.calls_to("/repos/org/repo/issues"), 3);
        assert_eq!(items[236], json!({ "number": 236 }));
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let fetcher = FixtureFetcher::new();
        let items = Paginator::new(100, None)
            .fetch_all(&fetcher, &issues())
            .await
            .unwrap();

        assert!(items.is_empty());
        assert_eq!(fetcher.calls_to("/repos/org/repo/issues"), 1);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_trailing_empty_page() {
        let fetcher = FixtureFetcher::new().with_collection("/repos/org/repo/issues", numbered(20));
        let items = Paginator::new(10, None)
            .fetch_all(&fetcher, &issues())
            .await
            .unwrap();

        assert_eq!(items.len(), 20);
        let pages: Vec<u32> = fetcher.calls().into_iter().map(|(_, page)| page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_page_limit_stops_endless_collection() {
        let fetcher = FixtureFetcher::new().with_endless("/repos/org/repo/issues");
        let err = Paginator::new(50, Some(4))
            .fetch_all(&fetcher, &issues())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::PaginationLimitExceeded { max_pages: 4, .. }));
        assert_eq!(fetcher.calls_to("/repos/org/repo/issues"), 4);
    }

    #[tokio::test]
    async fn test_errors_propagate_unchanged() {
        let fetcher = FixtureFetcher::new().with_failure("/repos/org/repo/issues", 502);
        let err = Paginator::default()
            .fetch_all(&fetcher, &issues())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(502));
        assert_eq!(fetcher.calls_to("/repos/org/repo/issues"), 1);
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(Paginator::new(0, None).page_size(), 1);
        assert_eq!(Paginator::new(250, None).page_size(), 100);
    }
}
