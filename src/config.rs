use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::aggregate::{ReviewFailurePolicy, SearchOptions};
use crate::github::paginator::Paginator;
use crate::github::MAX_PAGE_SIZE;

pub const CONFIG_FILE: &str = ".gh-repo-export.toml";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from `.gh-repo-export.toml`.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// Defaults to the public API; set for GitHub Enterprise.
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub page_size: u32,
    /// Hard ceiling on pages per collection. Unbounded when unset.
    pub max_pages: Option<u32>,
    /// Issue and pull request state filter (`open`, `closed`, `all`).
    pub state: Option<String>,
    /// Branch or sha to list commits from. Default branch when unset.
    pub commit_branch: Option<String>,
    pub include_review_comments: bool,
    pub review_failure: ReviewFailurePolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            page_size: MAX_PAGE_SIZE,
            max_pages: None,
            state: Some("all".to_string()),
            commit_branch: None,
            include_review_comments: false,
            review_failure: ReviewFailurePolicy::FailSearch,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub anonymize: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            output_dir: PathBuf::from("."),
            anonymize: false,
        }
    }
}

impl Config {
    /// Load configuration from `.gh-repo-export.toml` in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.github.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var. Blank tokens count as absent.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
    }

    pub fn api_base_url(&self) -> &str {
        self.github
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            paginator: Paginator::new(self.fetch.page_size, self.fetch.max_pages),
            state: self.fetch.state.clone(),
            commit_branch: self.fetch.commit_branch.clone(),
            include_review_comments: self.fetch.include_review_comments,
            review_failure: self.fetch.review_failure,
        }
    }
}
