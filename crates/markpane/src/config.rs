//! Preview configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a working setup.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use log::info;
use markpane_diagram::DiagramConfig;
use markpane_markdown::MarkdownRenderOptions;
use markpane_syntax::cache::DEFAULT_CACHE_CAPACITY;
use serde::Deserialize;
use thiserror::Error;

/// Default quiet period before a render starts.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub render: RenderConfig,
    pub highlight: HighlightConfig,
    pub diagram: DiagramConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub debounce_ms: u64,
    pub max_highlight_lines: usize,
    pub allow_raw_html: bool,
    pub base_url: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = MarkdownRenderOptions::default();
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_highlight_lines: options.max_highlight_lines,
            allow_raw_html: options.allow_raw_html,
            base_url: options.base_url,
        }
    }
}

impl RenderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn markdown_options(&self) -> MarkdownRenderOptions {
        MarkdownRenderOptions {
            allow_raw_html: self.allow_raw_html,
            max_highlight_lines: self.max_highlight_lines,
            base_url: self.base_url.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightConfig {
    /// Name of a theme in syntect's default theme set.
    pub theme: String,
    /// Highlighted blocks kept in memory; `0` disables the cache.
    pub cache_capacity: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "InspiredGitHub".to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl PreviewConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Validation`] for values that parse but cannot be used.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File doesn't exist
    /// - File cannot be read
    /// - TOML parsing or validation fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        info!(path = path.display().to_string(); "Loading preview configuration");
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.render.max_highlight_lines == 0 {
            return Err(ConfigError::Validation(
                "render.max_highlight_lines must be at least 1".to_string(),
            ));
        }
        if let Some(base) = &self.render.base_url {
            url::Url::parse(base).map_err(|e| {
                ConfigError::Validation(format!("render.base_url `{base}` is not absolute: {e}"))
            })?;
        }
        if self.highlight.theme.trim().is_empty() {
            return Err(ConfigError::Validation(
                "highlight.theme must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markpane_diagram::DiagramTheme;
    use std::io::Write;

    #[test]
    fn empty_text_yields_defaults() {
        let config = PreviewConfig::from_toml_str("").expect("config");
        assert_eq!(config, PreviewConfig::default());
        assert_eq!(config.render.debounce(), Duration::from_millis(200));
        assert!(config.diagram.strict);
        assert!(!config.render.allow_raw_html);
    }

    #[test]
    fn parses_every_section() {
        let config = PreviewConfig::from_toml_str(
            r#"
            [render]
            debounce_ms = 50
            max_highlight_lines = 10
            allow_raw_html = true
            base_url = "https://example.com/docs/"

            [highlight]
            theme = "base16-ocean.dark"
            cache_capacity = 0

            [diagram]
            theme = "dark"
            strict = false
            "#,
        )
        .expect("config");

        assert_eq!(config.render.debounce(), Duration::from_millis(50));
        let options = config.render.markdown_options();
        assert_eq!(options.max_highlight_lines, 10);
        assert!(options.allow_raw_html);
        assert_eq!(
            options.base_url.as_deref(),
            Some("https://example.com/docs/")
        );
        assert_eq!(config.highlight.theme, "base16-ocean.dark");
        assert_eq!(config.highlight.cache_capacity, 0);
        assert_eq!(config.diagram.theme, DiagramTheme::Dark);
        assert!(!config.diagram.strict);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            PreviewConfig::from_toml_str("[render]\ndebounce = 5\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            PreviewConfig::from_toml_str("[diagram]\nstrickt = false\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            PreviewConfig::from_toml_str("[diagram]\ntheme = \"neon\"\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            PreviewConfig::from_toml_str("[render]\nbase_url = \"docs/\"\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            PreviewConfig::from_toml_str("[render]\nmax_highlight_lines = 0\n"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_reads_files_and_reports_missing_ones() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[render]\ndebounce_ms = 75").expect("write");
        let config = PreviewConfig::load(file.path()).expect("load");
        assert_eq!(config.render.debounce_ms, 75);

        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            PreviewConfig::load(&missing),
            Err(ConfigError::MissingFile(path)) if path == missing
        ));
    }
}
