use crate::config::PreviewConfig;
use crate::pr::PrRef;

/// Review site root that serves pull request builds.
pub const PREVIEW_HOST: &str = "https://review.learn.microsoft.com/en-us";

/// Build the review-site preview URL for a changed article.
///
/// The docs root and `.md` extension are stripped, then the first opaque
/// leading segment that prefixes the path is replaced by its query fragment.
pub fn build_link(path: &str, pr_number: u64, config: &PreviewConfig) -> String {
    let docs_root = format!("{}/", config.docs_path);
    let path = path.strip_prefix(docs_root.as_str()).unwrap_or(path);
    let mut path = path.strip_suffix(".md").unwrap_or(path);

    let mut query = None;
    for rule in config.opaque_leading_url_segments.iter() {
        let segment = format!("{}/", rule.prefix_segment);
        if let Some(rest) = path.strip_prefix(segment.as_str()) {
            path = rest;
            query = Some(rule.query_fragment.as_str());
            break;
        }
    }

    let mut url = format!(
        "{PREVIEW_HOST}/{}/{path}?branch=pr-en-us-{pr_number}",
        config.url_base_path
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('&');
        url.push_str(query);
    }
    url
}

/// Link to the file at `commit` on GitHub, or the italicized path when the
/// head commit is unknown.
pub fn source_link(path: &str, pull: &PrRef, commit: Option<&str>) -> String {
    match commit {
        Some(commit) => format!(
            "[{path}](https://github.com/{}/{}/blob/{commit}/{path})",
            pull.owner, pull.repo
        ),
        None => format!("_{path}_"),
    }
}
