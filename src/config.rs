use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".pr-preview-table.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// What the workflow run does once the build status check settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Check the build status, then refresh the preview table.
    #[default]
    Preview,
    /// Only check the build status.
    Warning,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(Mode::Preview),
            "warning" => Ok(Mode::Warning),
            other => Err(format!("expected \"preview\" or \"warning\", got {other:?}")),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Preview => f.write_str("preview"),
            Mode::Warning => f.write_str("warning"),
        }
    }
}

/// An opaque leading URL segment: a path prefix replaced by a query fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewriteRule {
    /// Leading path segment without the trailing slash (e.g., "framework")
    pub prefix_segment: String,
    /// Query string fragment appended to the preview URL (e.g., "view=netframeworkdesktop-4.8")
    pub query_fragment: String,
}

/// Ordered rewrite rules. The first rule whose segment leads a path wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct RewriteRules(Vec<PathRewriteRule>);

impl RewriteRules {
    pub fn iter(&self) -> impl Iterator<Item = &PathRewriteRule> {
        self.0.iter()
    }
}

impl FromStr for RewriteRules {
    type Err = String;

    /// Parse `"net:view=netdesktop-7.0,framework:view=netframeworkdesktop-4.8"`.
    ///
    /// Only the first colon of each pair separates segment from fragment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rules = Vec::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (segment, fragment) = pair
                .split_once(':')
                .ok_or_else(|| format!("pair {pair:?} is not of the form prefix:query"))?;
            let segment = segment.trim().trim_end_matches('/');
            if segment.is_empty() {
                return Err(format!("pair {pair:?} has an empty prefix"));
            }
            rules.push(PathRewriteRule {
                prefix_segment: segment.to_string(),
                query_fragment: fragment.trim().to_string(),
            });
        }
        Ok(Self(rules))
    }
}

impl TryFrom<String> for RewriteRules {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Top-level configuration loaded from .pr-preview-table.toml and the
/// GitHub Actions inputs in the environment.
///
/// All fields are optional; the tool works with zero config apart from a token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub status: StatusConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to INPUT_REPO_TOKEN / GITHUB_TOKEN.
    pub token: Option<String>,
    /// REST API root; the GraphQL endpoint is `{api_url}/graphql`.
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://api.github.com".to_string(),
        }
    }
}

/// Settings consumed by the preview table engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Docs root stripped from file paths before building preview URLs
    pub docs_path: String,
    /// Path under `https://review.learn.microsoft.com/en-us/`
    pub url_base_path: String,
    /// Maximum number of rows in the preview table
    pub max_row_count: usize,
    /// Tables with more rows than this are wrapped in a collapsible block
    pub collapsible_after: usize,
    pub opaque_leading_url_segments: RewriteRules,
    pub mode: Mode,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            docs_path: "docs".to_string(),
            url_base_path: "dotnet".to_string(),
            max_row_count: 30,
            collapsible_after: 10,
            opaque_leading_url_segments: RewriteRules::default(),
            mode: Mode::Preview,
        }
    }
}

/// Settings for the build status polling loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Commit status context that reports the docs build
    pub context: String,
    /// Wait before the first status lookup
    pub initial_delay_secs: u64,
    /// Wait between status lookups
    pub poll_interval_secs: u64,
    /// Lookups to attempt before giving up on a status that never appeared
    pub max_attempts: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            context: "OpenPublishing.Build".to_string(),
            initial_delay_secs: 60,
            poll_interval_secs: 10,
            max_attempts: 30,
        }
    }
}

impl StatusConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Config {
    /// Load configuration from `path`, or from .pr-preview-table.toml in the
    /// current directory when it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None if default_path.exists() => Self::load_from(default_path)?,
            None => Config::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Override settings with GitHub Actions inputs (`INPUT_*`) and the
    /// standard runner variables. Empty values keep the current setting.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = input("INPUT_DOCS_PATH") {
            self.preview.docs_path = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = input("INPUT_URL_BASE_PATH") {
            self.preview.url_base_path = v.trim_matches('/').to_string();
        }
        if let Some(v) = input("INPUT_MAX_ROW_COUNT") {
            self.preview.max_row_count = parse_value("max_row_count", &v)?;
        }
        if let Some(v) = input("INPUT_COLLAPSIBLE_AFTER") {
            self.preview.collapsible_after = parse_value("collapsible_after", &v)?;
        }
        if let Some(v) = input("INPUT_OPAQUE_LEADING_URL_SEGMENTS") {
            self.preview.opaque_leading_url_segments =
                parse_value("opaque_leading_url_segments", &v)?;
        }
        if let Some(v) = input("INPUT_MODE") {
            self.preview.mode = parse_value("mode", &v)?;
        }
        if self.github.token.is_none() {
            self.github.token = input("INPUT_REPO_TOKEN").or_else(|| input("GITHUB_TOKEN"));
        }
        if let Some(v) = input("GITHUB_API_URL") {
            self.github.api_url = v.trim_end_matches('/').to_string();
        }
        Ok(())
    }

    /// Resolved GitHub token, if any source provided one.
    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref()
    }
}

fn parse_value<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.preview.docs_path, "docs");
        assert_eq!(config.preview.url_base_path, "dotnet");
        assert_eq!(config.preview.max_row_count, 30);
        assert_eq!(config.preview.collapsible_after, 10);
        assert_eq!(config.preview.opaque_leading_url_segments, RewriteRules::default());
        assert_eq!(config.preview.mode, Mode::Preview);
        assert_eq!(config.status.context, "OpenPublishing.Build");
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[preview]
docs_path = "dotnet-desktop-guide"
url_base_path = "dotnet/desktop"
max_row_count = 12
opaque_leading_url_segments = "framework:id=77,test:uid=foo"
mode = "warning"

[status]
poll_interval_secs = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.preview.docs_path, "dotnet-desktop-guide");
        assert_eq!(config.preview.max_row_count, 12);
        assert_eq!(config.preview.collapsible_after, 10);
        assert_eq!(config.preview.opaque_leading_url_segments.iter().count(), 2);
        assert_eq!(config.preview.mode, Mode::Warning);
        assert_eq!(config.status.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.status.max_attempts, 30);
    }

    #[test]
    fn test_invalid_rewrite_rules_in_toml() {
        let toml_str = r#"
[preview]
opaque_leading_url_segments = "framework"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[github]\ntoken = \"from-file\"\n\n[preview]\ncollapsible_after = 3").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.github_token(), Some("from-file"));
        assert_eq!(config.preview.collapsible_after, 3);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }

    #[test]
    fn test_rewrite_rules_keep_order() {
        let rules: RewriteRules = "net:view=netdesktop-7.0, framework:view=netframeworkdesktop-4.8"
            .parse()
            .unwrap();
        let parsed: Vec<_> = rules
            .iter()
            .map(|r| (r.prefix_segment.as_str(), r.query_fragment.as_str()))
            .collect();
        assert_eq!(
            parsed,
            vec![
                ("net", "view=netdesktop-7.0"),
                ("framework", "view=netframeworkdesktop-4.8"),
            ]
        );
    }

    #[test]
    fn test_rewrite_rules_split_on_first_colon() {
        let rules: RewriteRules = "api:uid=System.Net:Http".parse().unwrap();
        let rule = rules.iter().next().unwrap();
        assert_eq!(rule.prefix_segment, "api");
        assert_eq!(rule.query_fragment, "uid=System.Net:Http");
    }

    #[test]
    fn test_rewrite_rules_reject_malformed_pairs() {
        assert!("framework".parse::<RewriteRules>().is_err());
        assert!(":id=77".parse::<RewriteRules>().is_err());
        assert_eq!("".parse::<RewriteRules>().unwrap(), RewriteRules::default());
        assert_eq!(" , ".parse::<RewriteRules>().unwrap(), RewriteRules::default());
    }

    #[test]
    fn test_apply_env_inputs() {
        let vars = env(&[
            ("INPUT_COLLAPSIBLE_AFTER", "7"),
            ("INPUT_DOCS_PATH", "test/path"),
            ("INPUT_URL_BASE_PATH", "foundation"),
            (
                "INPUT_OPAQUE_LEADING_URL_SEGMENTS",
                "net:view=netdesktop-7.0,framework:view=netframeworkdesktop-4.8",
            ),
            ("INPUT_MAX_ROW_COUNT", ""),
            ("INPUT_MODE", "warning"),
            ("GITHUB_TOKEN", "ghs_env"),
        ]);

        let mut config = Config::default();
        config.apply_env(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.preview.collapsible_after, 7);
        assert_eq!(config.preview.docs_path, "test/path");
        assert_eq!(config.preview.url_base_path, "foundation");
        assert_eq!(config.preview.max_row_count, 30);
        assert_eq!(config.preview.opaque_leading_url_segments.iter().count(), 2);
        assert_eq!(config.preview.mode, Mode::Warning);
        assert_eq!(config.github_token(), Some("ghs_env"));
    }

    #[test]
    fn test_repo_token_input_wins_over_github_token() {
        let vars = env(&[("INPUT_REPO_TOKEN", "ghs_input"), ("GITHUB_TOKEN", "ghs_env")]);
        let mut config = Config::default();
        config.apply_env(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.github_token(), Some("ghs_input"));
    }

    #[test]
    fn test_file_token_wins_over_env() {
        let vars = env(&[("GITHUB_TOKEN", "ghs_env")]);
        let mut config = Config::default();
        config.github.token = Some("from-file".to_string());
        config.apply_env(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.github_token(), Some("from-file"));
    }

    #[test]
    fn test_apply_env_rejects_bad_numbers_and_modes() {
        let vars = env(&[("INPUT_MAX_ROW_COUNT", "lots")]);
        let err = Config::default()
            .apply_env(|k| vars.get(k).cloned())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "max_row_count", .. }));

        let vars = env(&[("INPUT_MODE", "publish")]);
        let err = Config::default()
            .apply_env(|k| vars.get(k).cloned())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "mode", .. }));
    }
}
