use crate::pr::{ChangeType, FileChange};

/// Files chosen for the preview table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedFileSet {
    /// At most `max_rows` files, alphabetical by path
    pub files: Vec<FileChange>,
    /// More previewable files existed than `max_rows`
    pub exceeds_max: bool,
}

/// Whether a changed file gets a preview link.
///
/// Markdown articles only: includes, READMEs and copied or deleted files are skipped.
pub fn is_file_previewable(file: &FileChange) -> bool {
    !file.path.contains("includes/")
        && !file.path.ends_with("README.md")
        && file.path.ends_with(".md")
        && matches!(
            file.change_type,
            ChangeType::Added | ChangeType::Changed | ChangeType::Modified | ChangeType::Renamed
        )
}

/// Whether any changed file is a previewable markdown article.
pub fn has_modified_markdown(files: &[FileChange]) -> bool {
    files.iter().any(is_file_previewable)
}

/// Select the previewable files for the table.
///
/// Files are ranked by change volume (ties broken by change type precedence),
/// cut to `max_rows`, then presented alphabetically.
pub fn rank(all_files: &[FileChange], max_rows: usize) -> RankedFileSet {
    let mut files: Vec<FileChange> = all_files
        .iter()
        .filter(|f| is_file_previewable(f))
        .cloned()
        .collect();
    let exceeds_max = files.len() > max_rows;

    files.sort_by(|a, b| {
        b.changes()
            .cmp(&a.changes())
            .then_with(|| a.change_type.precedence().cmp(&b.change_type.precedence()))
    });
    files.truncate(max_rows);
    // Case-insensitive, with byte order as the tiebreak.
    files.sort_by(|a, b| {
        a.path
            .to_lowercase()
            .cmp(&b.path.to_lowercase())
            .then_with(|| a.path.cmp(&b.path))
    });

    RankedFileSet { files, exceeds_max }
}
