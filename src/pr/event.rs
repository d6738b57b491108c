use serde::Deserialize;
use std::path::Path;

use super::types::PrRef;
use super::PrError;

/// Events whose payload carries a pull request the status checker can follow.
const PULL_REQUEST_EVENTS: [&str; 2] = ["pull_request", "pull_request_target"];

/// The subset of the webhook payload this tool reads.
#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    number: Option<u64>,
    action: Option<String>,
    pull_request: Option<PayloadPullRequest>,
}

#[derive(Debug, Deserialize)]
struct PayloadPullRequest {
    number: Option<u64>,
    head: Option<PayloadHead>,
}

#[derive(Debug, Deserialize)]
struct PayloadHead {
    sha: Option<String>,
}

/// Who, what and which commit this workflow run is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowContext {
    pub pull: PrRef,
    /// Head commit of the pull request, when known
    pub head_sha: Option<String>,
    /// `GITHUB_EVENT_NAME` (empty when not running under Actions)
    pub event_name: String,
    /// Payload `action` (e.g., "opened", "synchronize")
    pub action: Option<String>,
}

/// Values supplied on the command line; each one wins over the runner environment.
#[derive(Debug, Clone, Default)]
pub struct ContextOverrides {
    pub repo: Option<String>,
    pub number: Option<u64>,
    pub sha: Option<String>,
}

impl WorkflowContext {
    /// Build the context from the GitHub Actions runner environment, then
    /// apply command-line overrides.
    pub fn from_env(overrides: &ContextOverrides) -> Result<Self, PrError> {
        Self::resolve(|name| std::env::var(name).ok(), overrides)
    }

    /// Environment-agnostic resolution (useful for testing).
    pub fn resolve<F>(lookup: F, overrides: &ContextOverrides) -> Result<Self, PrError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let payload = match lookup("GITHUB_EVENT_PATH").filter(|p| !p.is_empty()) {
            Some(path) => read_payload(Path::new(&path))?,
            None => EventPayload::default(),
        };

        let slug = overrides
            .repo
            .clone()
            .or_else(|| lookup("GITHUB_REPOSITORY"))
            .ok_or_else(|| PrError::InvalidRepository(String::new()))?;
        let (owner, repo) = parse_repo_slug(&slug)?;

        let number = overrides
            .number
            .or(payload.number)
            .or_else(|| payload.pull_request.as_ref().and_then(|pr| pr.number))
            .ok_or(PrError::MissingPullRequestNumber)?;

        let head_sha = overrides.sha.clone().or_else(|| {
            payload
                .pull_request
                .as_ref()
                .and_then(|pr| pr.head.as_ref())
                .and_then(|head| head.sha.clone())
        });

        Ok(WorkflowContext {
            pull: PrRef { owner, repo, number },
            head_sha,
            event_name: lookup("GITHUB_EVENT_NAME").unwrap_or_default(),
            action: payload.action,
        })
    }

    /// Whether the triggering event is a pull request event with an action.
    pub fn is_pull_request_event(&self) -> bool {
        PULL_REQUEST_EVENTS.contains(&self.event_name.as_str()) && self.action.is_some()
    }
}

fn read_payload(path: &Path) -> Result<EventPayload, PrError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PrError::EventPayload(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| PrError::EventPayload(format!("{}: {e}", path.display())))
}

/// Split an `owner/repo` slug.
pub fn parse_repo_slug(slug: &str) -> Result<(String, String), PrError> {
    match slug.trim().split_once('/') {
        Some((owner, repo))
            if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
        {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(PrError::InvalidRepository(slug.to_string())),
    }
}
