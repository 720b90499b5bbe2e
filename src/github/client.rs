use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{FetchError, PageFetcher, RepoRef, Resource};
use crate::config::Config;

/// `PageFetcher` backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubFetcher {
    pub fn new(base_url: &str, token: Option<String>) -> Result<GitHubFetcher, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("gh-repo-export"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(GitHubFetcher {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build a fetcher from configuration. Without a token the API is used
    /// unauthenticated (and rate limited accordingly).
    pub fn from_config(config: &Config) -> Result<GitHubFetcher, FetchError> {
        let token = config.github_token();
        if token.is_none() {
            debug!("no GitHub token configured, using unauthenticated access");
        }
        GitHubFetcher::new(config.api_base_url(), token)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(path, status, &body));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl PageFetcher for GitHubFetcher {
    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn fetch_repository(&self, repo: &RepoRef) -> Result<Value, FetchError> {
        debug!("fetching repository metadata");
        self.get(&repo.path(), &[]).await
    }

    #[instrument(skip(self, resource), fields(path = %resource.path))]
    async fn fetch_page(
        &self,
        resource: &Resource,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, FetchError> {
        let mut query = resource.query.clone();
        query.push(("page", page.to_string()));
        query.push(("per_page", per_page.to_string()));

        match self.get(&resource.path, &query).await? {
            Value::Array(items) => {
                debug!(items = items.len(), "received page");
                Ok(items)
            }
            other => Err(FetchError::Decode {
                path: resource.path.clone(),
                reason: format!("expected a JSON array, got {}", json_type(&other)),
            }),
        }
    }
}

/// Map a non-success response to a typed error. 404 is kept apart so callers
/// can tell a missing repository from every other failure.
pub fn classify_failure(path: &str, status: StatusCode, body: &str) -> FetchError {
    if status == StatusCode::NOT_FOUND {
        return FetchError::NotFound {
            path: path.to_string(),
        };
    }

    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    FetchError::Remote {
        path: path.to_string(),
        status: status.as_u16(),
        message,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
