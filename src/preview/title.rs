//! Human-readable titles for changed articles.
//!
//! The title is the first level-one heading (`# Heading`), or the front-matter
//! `title:` value when the article has no such heading. Cross-reference
//! markup (`<xref:Some.Type>`) in the chosen text is rendered as inline code.

use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::debug;

static H1_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# (.*)$").expect("invalid heading regex"));

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^title:[ \t]*(.*)$").expect("invalid title regex"));

static XREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<xref:([^>]+)>").expect("invalid xref regex"));

/// Reads repository-relative file content. Any failure reads as `None`.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn read(&self, path: &str) -> Option<String>;
}

/// Reads files from a checkout on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsContent {
    root: PathBuf,
}

impl FsContent {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentSource for FsContent {
    async fn read(&self, path: &str) -> Option<String> {
        let full_path = self.root.join(path);
        match tokio::fs::read_to_string(&full_path).await {
            Ok(content) if !content.is_empty() => Some(content),
            Ok(_) => {
                debug!(path, "file is empty");
                None
            }
            Err(e) => {
                debug!(path, error = %e, "unable to read file content");
                None
            }
        }
    }
}

/// Look up the title of the article at `path`.
pub async fn title_from(source: &dyn ContentSource, path: &str) -> Option<String> {
    let content = source.read(path).await?;
    let title = extract_title(&content);
    debug!(path, title = ?title, "extracted title");
    title
}

/// Derive a title from article content.
pub fn extract_title(content: &str) -> Option<String> {
    let title = first_capture(&H1_PATTERN, content).or_else(|| first_capture(&TITLE_PATTERN, content))?;
    Some(normalize_xref(&title))
}

/// Capture group of the first line matching `pattern`; an empty capture counts as no match.
fn first_capture(pattern: &Regex, content: &str) -> Option<String> {
    let caps = pattern.captures(content)?;
    let text = caps[1].trim_end_matches('\r').trim_end();
    (!text.is_empty()).then(|| text.to_string())
}

/// Replace the first `<xref:Id>` or `<xref:Id />` with `` `Id` ``.
fn normalize_xref(text: &str) -> String {
    XREF_PATTERN
        .replace(text, |caps: &Captures| {
            let id = caps[1].trim().trim_end_matches('/').trim_end();
            format!("`{id}`")
        })
        .into_owned()
}
