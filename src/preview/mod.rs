pub mod body;
pub mod link;
pub mod rank;
pub mod table;
pub mod title;

pub use body::{reconcile, ReconcileError};
pub use rank::{has_modified_markdown, rank};
pub use title::{ContentSource, FsContent};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::PreviewConfig;
use crate::pr::pages::FilePages;
use crate::pr::{BodyWriter, PrError, PrRef, PullRequestSource};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Pr(#[from] PrError),

    #[error("Malformed pull request body: {0}")]
    Reconcile(#[from] ReconcileError),
}

/// What a preview table update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The pull request has no changed files at all.
    NoChangedFiles,
    /// Files changed, but none of them is a previewable article.
    NoMarkdownChanges,
    /// The body was rewritten with a fresh table.
    Updated { rows: usize, exceeds_max: bool },
    /// The update was abandoned; the body was not written.
    Failed(String),
}

/// Regenerates the preview table of one pull request.
pub struct PullUpdater<'a> {
    pub pull: &'a PrRef,
    /// Head commit used for file links
    pub commit: Option<&'a str>,
    pub config: &'a PreviewConfig,
    pub source: &'a dyn PullRequestSource,
    pub writer: &'a dyn BodyWriter,
    pub content: &'a dyn ContentSource,
}

impl PullUpdater<'_> {
    /// Best-effort update: failures are logged as warnings and reported as
    /// [`UpdateOutcome::Failed`], never returned as errors.
    pub async fn try_update(&self) -> UpdateOutcome {
        let outcome = match self.update().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "unable to process markdown preview");
                UpdateOutcome::Failed(e.to_string())
            }
        };
        info!(outcome = ?outcome, "finished attempting to generate preview");
        outcome
    }

    /// Fetch every changed file, render the table and write the new body once.
    #[instrument(skip(self), fields(pr = self.pull.number))]
    pub async fn update(&self) -> Result<UpdateOutcome, PreviewError> {
        info!("updating pull request body");
        let mut pages = FilePages::new(self.source);
        let Some(first) = pages.next_page().await else {
            return Err(PrError::PullRequestNotFound(self.pull.number).into());
        };
        let first = first?;

        if first.changed_files == 0 {
            info!("no files changed at all");
            return Ok(UpdateOutcome::NoChangedFiles);
        }
        if let Ok(json) = serde_json::to_string_pretty(&first) {
            debug!(pull_request = %json, "first pull request page");
        }

        let body = first.body;
        let checks_url = first.checks_url;
        let files = first.files.edges.into_iter().map(|edge| edge.node).collect();
        let all_files = pages.collect_remaining(files).await?;

        if !has_modified_markdown(&all_files) {
            info!(files = all_files.len(), "no updated markdown files");
            return Ok(UpdateOutcome::NoMarkdownChanges);
        }

        let ranked = rank(&all_files, self.config.max_row_count);
        let markdown_table = table::render(
            self.pull,
            &ranked,
            &checks_url,
            self.commit,
            self.config,
            self.content,
        )
        .await;

        let updated_body = reconcile(&body, &markdown_table)?;
        debug!(body = %updated_body, "proposed pull request body");

        self.writer.update_body(&updated_body).await?;
        info!(rows = ranked.files.len(), "pull request updated");
        Ok(UpdateOutcome::Updated {
            rows: ranked.files.len(),
            exceeds_max: ranked.exceeds_max,
        })
    }
}
