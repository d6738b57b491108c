use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::StatusConfig;
use crate::pr::event::WorkflowContext;
use crate::pr::types::{CommitStatus, StatusState};
use crate::pr::{PrError, StatusSource};

/// Description the docs build reports when it succeeded with warnings.
const WARNINGS_DESCRIPTION: &str = "Validation status: warnings";

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Event is not a pull request or payload action is undefined.")]
    NotPullRequestEvent,

    #[error("Head commit of the pull request is unknown")]
    MissingHeadSha,

    #[error("Did not find {0} status check.")]
    StatusVanished(String),

    #[error(transparent)]
    Api(#[from] PrError),
}

/// Final state of the docs build status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildVerdict {
    Success,
    /// Succeeded, but the build reported warnings
    Warnings,
    /// Finished in `error` or `failure`
    Failed(StatusState),
    /// Never reported within the allotted attempts
    NotFound { waited_secs: u64 },
}

impl BuildVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildVerdict::Success)
    }

    /// Message explaining why the run fails, `None` for success.
    pub fn failure_message(&self, context: &str) -> Option<String> {
        match self {
            BuildVerdict::Success => None,
            BuildVerdict::Warnings => Some(format!(
                "Please fix OPS build warnings before merging. To see the warnings, click 'Details' \
                 next to the {context} status check at the bottom of your pull request."
            )),
            BuildVerdict::Failed(_) => Some(format!("{context} status is either failure or error.")),
            BuildVerdict::NotFound { waited_secs } => Some(format!(
                "Did not find OPS status check after waiting for {} minutes. If it shows \
                 'Expected — Waiting for status to be reported', close and reopen the pull request \
                 to trigger a build.",
                *waited_secs as f64 / 60.0
            )),
        }
    }
}

/// Wait for the docs build status on the pull request's head commit to settle.
#[instrument(skip_all, fields(pr = ctx.pull.number, context = %settings.context))]
pub async fn wait_for_build(
    source: &dyn StatusSource,
    ctx: &WorkflowContext,
    settings: &StatusConfig,
) -> Result<BuildVerdict, StatusError> {
    if !ctx.is_pull_request_event() {
        return Err(StatusError::NotPullRequestEvent);
    }
    let sha = ctx.head_sha.as_deref().ok_or(StatusError::MissingHeadSha)?;
    info!(commit = %sha, "checking build status");

    tokio::time::sleep(settings.initial_delay()).await;
    debug!(secs = settings.initial_delay_secs, "waited before first status lookup");

    let mut status = latest_status(source, sha, &settings.context).await?;
    let mut attempts = 0;
    while status.is_none() && attempts < settings.max_attempts {
        tokio::time::sleep(settings.poll_interval()).await;
        attempts += 1;
        status = latest_status(source, sha, &settings.context).await?;
    }

    let Some(mut status) = status else {
        return Ok(BuildVerdict::NotFound {
            waited_secs: u64::from(settings.max_attempts) * settings.poll_interval_secs,
        });
    };
    info!("found build status check");

    while status.state == StatusState::Pending {
        info!(secs = settings.poll_interval_secs, "build status check is still pending");
        tokio::time::sleep(settings.poll_interval()).await;
        status = latest_status(source, sha, &settings.context)
            .await?
            .ok_or_else(|| StatusError::StatusVanished(settings.context.clone()))?;
    }
    info!(state = %status.state, "build status check has completed");

    Ok(verdict(&status))
}

/// The most recent status reported under `context`.
async fn latest_status(
    source: &dyn StatusSource,
    sha: &str,
    context: &str,
) -> Result<Option<CommitStatus>, StatusError> {
    let statuses = source.commit_statuses(sha).await?;
    Ok(statuses.into_iter().find(|s| s.context == context))
}

fn verdict(status: &CommitStatus) -> BuildVerdict {
    match status.state {
        StatusState::Success if status.description.as_deref() == Some(WARNINGS_DESCRIPTION) => {
            BuildVerdict::Warnings
        }
        StatusState::Success => BuildVerdict::Success,
        other => BuildVerdict::Failed(other),
    }
}
