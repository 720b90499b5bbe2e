mod aggregate;
mod config;
mod export;
mod github;
mod report;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use aggregate::{Aggregator, ReviewFailurePolicy};
use github::{FixtureFetcher, GitHubFetcher, PageFetcher, RepoRef};
use report::Tab;

const MOCK_FIXTURE: &str = include_str!("../tests/fixtures/sample_repo.json");
const MOCK_REPOSITORY: &str = "octo-org/garden";

/// gh-repo-export — fetch a GitHub repository's issues, pull requests, commits,
/// reviews and comments, browse them page by page and export them to CSV.
#[derive(Parser, Debug)]
#[command(name = "gh-repo-export", version, about)]
struct Cli {
    /// Repository as `owner/repo` or a GitHub URL; just the owner with --list,
    /// or the owner when REPO is given separately.
    ///
    /// Not required when --mock is used.
    target: Option<String>,

    /// Repository name, when TARGET is only the owner
    repo: Option<String>,

    /// List the owner's repositories instead of fetching one
    #[arg(long)]
    list: bool,

    /// Tab to print after the summary
    #[arg(long, value_enum)]
    tab: Option<Tab>,

    /// Page of the tab (or repository list) to print, 1-based
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Rows per printed page
    #[arg(long, default_value_t = 10)]
    per_page: usize,

    /// Write `<repo>_data.csv` with every fetched record
    #[arg(long)]
    csv: bool,

    /// Directory for the CSV export (overrides config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Replace usernames and repository names with participant codes in the export
    #[arg(long)]
    anonymize: bool,

    /// Items requested per API page, 1-100 (overrides config)
    #[arg(long)]
    page_size: Option<u32>,

    /// Give up on a collection after this many full pages (overrides config)
    #[arg(long)]
    max_pages: Option<u32>,

    /// Branch or sha to list commits from
    #[arg(long)]
    branch: Option<String>,

    /// Also fetch pull request review comments
    #[arg(long)]
    review_comments: bool,

    /// Keep going when the reviews of a single pull request cannot be fetched
    #[arg(long)]
    skip_failed_reviews: bool,

    /// Use a built-in mock repository for demo purposes (no network or token needed)
    #[arg(long)]
    r#mock: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let mut config = config::Config::load()?;
    apply_overrides(&mut config, &cli);

    if cli.r#mock {
        info!("using mock repository data for demo");
        let fetcher = FixtureFetcher::from_json(MOCK_FIXTURE)?;
        run(&cli, &config, fetcher).await
    } else {
        let fetcher = GitHubFetcher::from_config(&config)?;
        run(&cli, &config, fetcher).await
    }
}

fn apply_overrides(config: &mut config::Config, cli: &Cli) {
    if let Some(page_size) = cli.page_size {
        config.fetch.page_size = page_size;
    }
    if cli.max_pages.is_some() {
        config.fetch.max_pages = cli.max_pages;
    }
    if cli.branch.is_some() {
        config.fetch.commit_branch = cli.branch.clone();
    }
    if cli.review_comments {
        config.fetch.include_review_comments = true;
    }
    if cli.skip_failed_reviews {
        config.fetch.review_failure = ReviewFailurePolicy::SkipPullRequest;
    }
    if let Some(dir) = &cli.output_dir {
        config.export.output_dir = dir.clone();
    }
    if cli.anonymize {
        config.export.anonymize = true;
    }
}

async fn run<F: PageFetcher>(
    cli: &Cli,
    config: &config::Config,
    fetcher: F,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let aggregator = Aggregator::new(fetcher, config.search_options());

    let target = match (&cli.target, cli.r#mock) {
        (Some(target), _) => target.clone(),
        (None, true) => MOCK_REPOSITORY.to_string(),
        (None, false) => {
            return Err("a repository is required unless --mock is used. Usage: gh-repo-export <owner/repo> or gh-repo-export --mock".into())
        }
    };

    if cli.list {
        let owner = target.split('/').next().unwrap_or_default();
        let _span = info_span!("list", owner = %owner).entered();
        info!("listing repositories");
        let names = aggregator.list_repositories(owner).await?;
        report::print_repositories(owner, &names, cli.page, cli.per_page);
        return Ok(ExitCode::SUCCESS);
    }

    let repo = match &cli.repo {
        Some(name) => RepoRef::new(&target, name)
            .ok_or_else(|| github::FetchError::InvalidReference(format!("{}/{}", target, name)))?,
        None => github::parse_repo_ref(&target)?,
    };

    let _main_span = info_span!("search", repo = %repo).entered();
    info!("fetching repository data");
    let snapshot = aggregator.search(&repo.owner, &repo.repo).await;
    report::print_summary(&snapshot);

    if !aggregator.is_ready() {
        warn!(
            status = %snapshot.status,
            error = aggregator.error_message().as_deref().unwrap_or("none"),
            "nothing to show"
        );
        return Ok(ExitCode::FAILURE);
    }

    if let Some(tab) = cli.tab {
        report::print_tab(&snapshot.result, tab, cli.page, cli.per_page);
    }

    if cli.csv {
        let path = export::export_to_file(
            &repo.repo,
            &snapshot.result,
            &config.export.output_dir,
            config.export.anonymize,
        )?;
        debug!(records = snapshot.result.total_records(), "export finished");
        println!("Exported {} records to {}", snapshot.result.total_records(), path.display());
    }

    info!("done");
    Ok(ExitCode::SUCCESS)
}
