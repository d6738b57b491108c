mod config;
mod pr;
mod preview;
mod report;
mod status;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use config::Mode;
use pr::event::{ContextOverrides, WorkflowContext};
use pr::{BodyWriter, GitHubClient};
use preview::{FsContent, PullUpdater};

/// PR preview table — waits for the docs build status check on a pull request
/// and, once it succeeds, maintains a table of preview links in the PR body.
#[derive(Parser, Debug)]
#[command(name = "pr-preview-table", version, about)]
struct Cli {
    /// Config file (defaults to .pr-preview-table.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Repository as owner/name (defaults to GITHUB_REPOSITORY)
    #[arg(long)]
    repo: Option<String>,

    /// Pull request number (defaults to the event payload)
    #[arg(long)]
    pr: Option<u64>,

    /// Head commit SHA (defaults to the event payload)
    #[arg(long)]
    sha: Option<String>,

    /// Override the configured mode: preview or warning
    #[arg(long)]
    mode: Option<Mode>,

    /// Checkout root used to read article titles
    #[arg(long, default_value = ".")]
    content_root: PathBuf,

    /// Skip waiting for the build status and update the table right away
    #[arg(long)]
    skip_status: bool,

    /// Print the proposed body instead of writing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(mode) = cli.mode {
        config.preview.mode = mode;
    }
    debug!(mode = %config.preview.mode, docs_path = %config.preview.docs_path, "loaded configuration");

    let ctx = WorkflowContext::from_env(&ContextOverrides {
        repo: cli.repo.clone(),
        number: cli.pr,
        sha: cli.sha.clone(),
    })?;
    let span = info_span!("pr_preview", owner = %ctx.pull.owner, repo = %ctx.pull.repo, pr = ctx.pull.number);

    run(&cli, &config, &ctx).instrument(span).await
}

/// Check the build status, then refresh the preview table when the mode asks for it.
async fn run(
    cli: &Cli,
    config: &config::Config,
    ctx: &WorkflowContext,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = GitHubClient::new(config, ctx.pull.clone())?;

    let verdict = if cli.skip_status {
        info!("skipping build status check");
        None
    } else {
        let verdict = status::wait_for_build(&client, ctx, &config.status).await?;
        report::print_verdict(&verdict, &config.status.context);
        Some(verdict)
    };
    let build_ok = verdict.as_ref().map_or(true, status::BuildVerdict::is_success);

    if config.preview.mode == Mode::Preview && build_ok {
        let content = FsContent::new(cli.content_root.clone());
        let writer: &dyn BodyWriter = if cli.dry_run { &report::StdoutBody } else { &client };
        let updater = PullUpdater {
            pull: client.pull(),
            commit: ctx.head_sha.as_deref(),
            config: &config.preview,
            source: &client,
            writer,
            content: &content,
        };
        let outcome = updater.try_update().await;
        report::print_outcome(&outcome);
    }

    match verdict.and_then(|v| v.failure_message(&config.status.context)) {
        Some(message) => Err(message.into()),
        None => {
            info!("done");
            Ok(())
        }
    }
}
