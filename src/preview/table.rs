use std::fmt::Write;

use tracing::debug;

use super::link::{build_link, source_link};
use super::rank::RankedFileSet;
use super::title::{title_from, ContentSource};
use crate::config::PreviewConfig;
use crate::pr::PrRef;

const HEADER: &str = "#### Internal previews\n\n";
const DETAILS_OPEN: &str = "<details><summary><strong>Toggle expand/collapse</strong></summary><br/>\n\n";
const DETAILS_CLOSE: &str = "\n</details>\n";
const COLUMNS: &str = "| 📄 File | 🔗 Preview link |\n|:--|:--|\n";

/// Render the preview table for the ranked files.
///
/// Titles are looked up one file at a time, in row order.
pub async fn render(
    pull: &PrRef,
    ranked: &RankedFileSet,
    checks_url: &str,
    commit: Option<&str>,
    config: &PreviewConfig,
    content: &dyn ContentSource,
) -> String {
    let collapsible = ranked.files.len() > config.collapsible_after;

    let mut table = String::from(HEADER);
    if collapsible {
        table.push_str(DETAILS_OPEN);
    }
    table.push_str(COLUMNS);

    for file in &ranked.files {
        let preview = build_link(&file.path, pull.number, config);
        let title = match title_from(content, &file.path).await {
            Some(title) => title,
            None => file.path.strip_suffix(".md").unwrap_or(&file.path).to_string(),
        };
        let _ = writeln!(
            table,
            "| {} | [{title}]({preview}) |",
            source_link(&file.path, pull, commit)
        );
    }

    if collapsible {
        table.push_str(DETAILS_CLOSE);
    }

    if ranked.exceeds_max {
        let _ = write!(
            table,
            "\n> [!NOTE]\n> This table shows preview links for the {} files with the most changes. \
             For preview links for other files in this PR, select <strong>OpenPublishing.Build Details</strong> \
             within [checks]({checks_url}).\n",
            config.max_row_count
        );
    }

    debug!(rows = ranked.files.len(), collapsible, exceeds_max = ranked.exceeds_max, "rendered preview table");
    table
}
