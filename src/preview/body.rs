use thiserror::Error;

pub const PREVIEW_TABLE_START: &str = "<!-- PREVIEW-TABLE-START -->";
pub const PREVIEW_TABLE_END: &str = "<!-- PREVIEW-TABLE-END -->";

/// The body holds a broken preview table region; it must not be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Unable to parse starting index of existing markdown table.")]
    MissingStart,

    #[error("Unable to parse ending index of existing markdown table.")]
    MissingEnd,

    #[error("Ending marker of existing markdown table precedes its starting marker.")]
    EndBeforeStart,
}

/// Insert `table` into `body`, or replace the table already between the markers.
pub fn reconcile(body: &str, table: &str) -> Result<String, ReconcileError> {
    match (body.find(PREVIEW_TABLE_START), body.rfind(PREVIEW_TABLE_END)) {
        (None, None) => Ok(append_table(body, table)),
        (Some(start), Some(end)) => replace_table(body, table, start, end),
        (None, Some(_)) => Err(ReconcileError::MissingStart),
        (Some(_), None) => Err(ReconcileError::MissingEnd),
    }
}

fn append_table(body: &str, table: &str) -> String {
    format!("{body}\n\n{PREVIEW_TABLE_START}\n\n---\n\n{table}\n{PREVIEW_TABLE_END}")
}

/// Splice between the first start marker and the last end marker.
fn replace_table(body: &str, table: &str, start: usize, end: usize) -> Result<String, ReconcileError> {
    let head_end = start + PREVIEW_TABLE_START.len();
    if end < head_end {
        return Err(ReconcileError::EndBeforeStart);
    }
    let head = &body[..head_end];
    let tail = &body[end..];
    Ok(format!("{head}\n\n---\n\n{table}\n\n{tail}"))
}
