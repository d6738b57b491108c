use tracing::debug;

use super::{FileChange, PrError, PullRequestPage, PullRequestSource};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    After(String),
    Done,
}

/// Lazy, finite sequence of pull request pages in cursor order.
///
/// Each request depends on the previous page's `endCursor`, so pages are
/// fetched strictly one after another. Once exhausted (or after an error)
/// the sequence stays exhausted.
pub struct FilePages<'a, S: PullRequestSource + ?Sized> {
    source: &'a S,
    cursor: Cursor,
    fetched: usize,
}

impl<'a, S: PullRequestSource + ?Sized> FilePages<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            cursor: Cursor::Start,
            fetched: 0,
        }
    }

    /// Fetch the next page, or `None` when there are no more.
    pub async fn next_page(&mut self) -> Option<Result<PullRequestPage, PrError>> {
        let cursor = match &self.cursor {
            Cursor::Start => None,
            Cursor::After(cursor) => Some(cursor.as_str()),
            Cursor::Done => return None,
        };

        let result = self.source.fetch_page(cursor).await.and_then(|page| {
            self.fetched += 1;
            let info = &page.files.page_info;
            self.cursor = match (info.has_next_page, &info.end_cursor) {
                (true, Some(end)) => Cursor::After(end.clone()),
                // Paging cannot continue without a cursor.
                (true, None) => return Err(PrError::MissingEndCursor(self.fetched)),
                (false, _) => Cursor::Done,
            };
            Ok(page)
        });
        if result.is_err() {
            self.cursor = Cursor::Done;
        }
        Some(result)
    }

    /// Fold the remaining pages into `files`, preserving page order.
    pub async fn collect_remaining(
        &mut self,
        mut files: Vec<FileChange>,
    ) -> Result<Vec<FileChange>, PrError> {
        while let Some(page) = self.next_page().await {
            let page = page?;
            files.extend(page.files.edges.into_iter().map(|edge| edge.node));
        }
        debug!(pages = self.fetched, files = files.len(), "collected changed files");
        Ok(files)
    }
}
