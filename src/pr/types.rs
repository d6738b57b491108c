use serde::{Deserialize, Serialize};

/// How a file was changed by the pull request.
/// Mirrors GitHub's GraphQL `PatchStatus` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Added,
    Modified,
    Changed,
    Renamed,
    Copied,
    Deleted,
}

impl ChangeType {
    /// Tie-break order used when ranking files with equal change volume.
    pub const PRECEDENCE: [ChangeType; 6] = [
        ChangeType::Added,
        ChangeType::Modified,
        ChangeType::Changed,
        ChangeType::Renamed,
        ChangeType::Copied,
        ChangeType::Deleted,
    ];

    /// Position in [`ChangeType::PRECEDENCE`]; lower sorts first.
    pub fn precedence(self) -> usize {
        Self::PRECEDENCE
            .iter()
            .position(|c| *c == self)
            .unwrap_or(Self::PRECEDENCE.len())
    }
}

/// A single changed file in a pull request snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Repository-relative path (e.g., "docs/core/install.md")
    pub path: String,
    pub change_type: ChangeType,
    /// Lines added in this file
    pub additions: u64,
    /// Lines deleted in this file
    pub deletions: u64,
}

impl FileChange {
    /// Total change volume used for ranking.
    pub fn changes(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// See https://docs.github.com/graphql/reference/enums#pullrequeststate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    Closed,
    Merged,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEdge {
    pub node: FileChange,
}

/// One `files(first: 100, after: $cursor)` connection page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConnection {
    pub page_info: PageInfo,
    pub edges: Vec<FileEdge>,
}

/// Pull request summary plus one page of changed files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestPage {
    /// Current description; an absent field reads as empty
    #[serde(default)]
    pub body: String,
    pub checks_url: String,
    /// Total files changed across all pages
    pub changed_files: u64,
    pub state: PullRequestState,
    pub files: FileConnection,
}

/// Identifies the pull request the workflow runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

/// State of a commit status as reported by the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Error,
    Failure,
    Pending,
    Success,
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StatusState::Error => "error",
            StatusState::Failure => "failure",
            StatusState::Pending => "pending",
            StatusState::Success => "success",
        };
        f.write_str(label)
    }
}

/// One entry of `GET /repos/{owner}/{repo}/commits/{ref}/statuses`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitStatus {
    pub context: String,
    pub state: StatusState,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_precedence() {
        assert_eq!(ChangeType::Added.precedence(), 0);
        assert_eq!(ChangeType::Deleted.precedence(), 5);
        assert!(ChangeType::Modified.precedence() < ChangeType::Renamed.precedence());
    }

    #[test]
    fn test_pull_request_page_from_graphql_json() {
        let json = r#"{
            "body": "test body",
            "checksUrl": "https://github.com/dotnet/docs/pull/34601/checks",
            "changedFiles": 3,
            "state": "OPEN",
            "files": {
                "pageInfo": { "hasNextPage": false, "endCursor": "Mw" },
                "edges": [
                    { "node": { "additions": 1, "changeType": "MODIFIED", "deletions": 0, "path": "docs/core/extensions/httpclient-http3.md" } },
                    { "node": { "additions": 317, "changeType": "ADDED", "deletions": 0, "path": "docs/fundamentals/networking/quic/quic-overview.md" } },
                    { "node": { "additions": 4, "changeType": "MODIFIED", "deletions": 0, "path": "docs/fundamentals/toc.yml" } }
                ]
            }
        }"#;
        let page: PullRequestPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.changed_files, 3);
        assert_eq!(page.state, PullRequestState::Open);
        assert_eq!(page.files.edges.len(), 3);
        assert_eq!(page.files.edges[1].node.change_type, ChangeType::Added);
        assert_eq!(page.files.edges[1].node.changes(), 317);
    }

    #[test]
    fn test_missing_body_defaults_to_empty() {
        let json = r#"{
            "checksUrl": "",
            "changedFiles": 0,
            "state": "MERGED",
            "files": { "pageInfo": { "hasNextPage": false, "endCursor": null }, "edges": [] }
        }"#;
        let page: PullRequestPage = serde_json::from_str(json).unwrap();
        assert!(page.body.is_empty());
        assert!(page.files.page_info.end_cursor.is_none());
    }

    #[test]
    fn test_commit_status_deserialize() {
        let json = r#"{ "context": "OpenPublishing.Build", "state": "pending", "description": null }"#;
        let status: CommitStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.state, StatusState::Pending);
        assert_eq!(status.state.to_string(), "pending");
    }
}
