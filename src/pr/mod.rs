pub mod event;
pub mod pages;
pub mod types;

pub use types::{ChangeType, CommitStatus, FileChange, PrRef, PullRequestPage};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Changed files requested per GraphQL page.
pub const FILES_PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = "pr-preview-table";

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("Pull request {0} not found in GraphQL response")]
    PullRequestNotFound(u64),

    #[error("Files page {0} reports more files but has no end cursor")]
    MissingEndCursor(usize),

    #[error("Invalid repository (expected owner/repo): {0:?}")]
    InvalidRepository(String),

    #[error("Pull request number not found in event payload or arguments")]
    MissingPullRequestNumber,

    #[error("Failed to read event payload: {0}")]
    EventPayload(String),

    #[error("GitHub token not found in configuration or environment")]
    MissingToken,
}

/// Fetches the pull request summary plus one page of changed files.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// `cursor` is the `endCursor` of the previous page, `None` for the first.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<PullRequestPage, PrError>;
}

/// Overwrites the pull request description.
#[async_trait]
pub trait BodyWriter: Send + Sync {
    async fn update_body(&self, body: &str) -> Result<(), PrError>;
}

/// Lists commit statuses, most recent first.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn commit_statuses(&self, sha: &str) -> Result<Vec<CommitStatus>, PrError>;
}

/// GitHub REST + GraphQL client bound to one pull request.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    pull: PrRef,
}

const PULL_REQUEST_QUERY: &str = r#"query getPullRequest($name: String!, $owner: String!, $number: Int!, $cursor: String, $first: Int!) {
  repository(name: $name, owner: $owner) {
    pullRequest(number: $number) {
      body
      checksUrl
      changedFiles
      state
      files(first: $first, after: $cursor) {
        pageInfo {
          hasNextPage
          endCursor
        }
        edges {
          node {
            additions
            changeType
            deletions
            path
          }
        }
      }
    }
  }
}"#;

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct RepositoryData {
    repository: Option<RepositoryNode>,
}

#[derive(Deserialize)]
struct RepositoryNode {
    #[serde(rename = "pullRequest")]
    pull_request: Option<PullRequestPage>,
}

impl GitHubClient {
    pub fn new(config: &crate::config::Config, pull: PrRef) -> Result<Self, PrError> {
        let token = config.github_token().ok_or(PrError::MissingToken)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.github.api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            pull,
        })
    }

    pub fn pull(&self) -> &PrRef {
        &self.pull
    }

    fn pull_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url, self.pull.owner, self.pull.repo, self.pull.number
        )
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    #[instrument(skip(self), fields(owner = %self.pull.owner, repo = %self.pull.repo, pr = self.pull.number))]
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<PullRequestPage, PrError> {
        let request = serde_json::json!({
            "query": PULL_REQUEST_QUERY,
            "variables": {
                "name": self.pull.repo,
                "owner": self.pull.owner,
                "number": self.pull.number,
                "cursor": cursor,
                "first": FILES_PAGE_SIZE,
            },
        });

        debug!("querying pull request files from GitHub GraphQL");
        let response = self
            .http
            .post(format!("{}/graphql", self.api_url))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GraphQlResponse<RepositoryData>>()
            .await?;

        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(PrError::GraphQl(messages.join("; ")));
        }

        let page = response
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.pull_request)
            .ok_or(PrError::PullRequestNotFound(self.pull.number))?;
        debug!(
            edges = page.files.edges.len(),
            has_next_page = page.files.page_info.has_next_page,
            "received pull request page"
        );
        Ok(page)
    }
}

#[async_trait]
impl BodyWriter for GitHubClient {
    #[instrument(skip(self, body), fields(pr = self.pull.number, body_bytes = body.len()))]
    async fn update_body(&self, body: &str) -> Result<(), PrError> {
        debug!("updating pull request body");
        self.http
            .patch(self.pull_url())
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl StatusSource for GitHubClient {
    #[instrument(skip(self), fields(owner = %self.pull.owner, repo = %self.pull.repo))]
    async fn commit_statuses(&self, sha: &str) -> Result<Vec<CommitStatus>, PrError> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}/statuses",
            self.api_url, self.pull.owner, self.pull.repo, sha
        );
        let statuses = self
            .http
            .get(url)
            .query(&[("per_page", "100")])
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<CommitStatus>>()
            .await?;
        debug!(count = statuses.len(), "received commit statuses");
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn pull() -> PrRef {
        PrRef {
            owner: "dotnet".to_string(),
            repo: "docs".to_string(),
            number: 42,
        }
    }

    #[test]
    fn test_client_requires_token() {
        let result = GitHubClient::new(&Config::default(), pull());
        assert!(matches!(result, Err(PrError::MissingToken)));
    }

    #[test]
    fn test_client_urls() {
        let mut config = Config::default();
        config.github.token = Some("t".to_string());
        config.github.api_url = "https://ghe.example.com/api/v3/".to_string();
        let client = GitHubClient::new(&config, pull()).unwrap();
        assert_eq!(
            client.pull_url(),
            "https://ghe.example.com/api/v3/repos/dotnet/docs/pulls/42"
        );
        assert_eq!(client.pull().number, 42);
    }

    #[test]
    fn test_graphql_errors_deserialize() {
        let json = r#"{ "data": null, "errors": [{ "message": "Bad credentials" }] }"#;
        let response: GraphQlResponse<RepositoryData> = serde_json::from_str(json).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "Bad credentials");
    }

    #[test]
    fn test_graphql_missing_pull_request() {
        let json = r#"{ "data": { "repository": { "pullRequest": null } } }"#;
        let response: GraphQlResponse<RepositoryData> = serde_json::from_str(json).unwrap();
        let page = response
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.pull_request);
        assert!(page.is_none());
        assert!(response.errors.is_empty());
    }
}
