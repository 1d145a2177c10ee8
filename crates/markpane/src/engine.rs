//! Process-wide engine setup.
//!
//! The highlighter and the diagram engine are configured exactly once, before the first render.
//! [`initialize`] is safe to call again: later calls return the pipeline built by the first call
//! and never touch engine configuration while renders may be running.

use std::sync::Arc;
use std::sync::OnceLock;

use log::info;
use markpane_core::text::CodeHighlighter;
use markpane_markdown::MarkdownPipeline;
use markpane_syntax::cache::CachedHighlighter;

use crate::config::HighlightConfig;
use crate::config::PreviewConfig;

static PIPELINE: OnceLock<Arc<MarkdownPipeline>> = OnceLock::new();

/// Configures the shared engines from `config` on first call and returns the pipeline using them.
pub fn initialize(config: &PreviewConfig) -> Arc<MarkdownPipeline> {
    PIPELINE
        .get_or_init(|| {
            info!(
                debounce_ms = config.render.debounce_ms,
                highlight_theme = config.highlight.theme.as_str();
                "Initializing preview engines"
            );
            Arc::new(build_pipeline(config))
        })
        .clone()
}

pub fn is_initialized() -> bool {
    PIPELINE.get().is_some()
}

/// Builds a pipeline on the process-wide engines without registering it.
///
/// Render options come from `config`; engine settings only apply if the engines were not
/// configured yet.
pub fn build_pipeline(config: &PreviewConfig) -> MarkdownPipeline {
    let highlighter = highlighter(&config.highlight);
    let diagrams = markpane_diagram::initialize(&config.diagram);
    MarkdownPipeline::with_options(config.render.markdown_options(), highlighter, diagrams)
}

fn highlighter(config: &HighlightConfig) -> Arc<dyn CodeHighlighter + Send + Sync> {
    let backend = backend(config);
    if config.cache_capacity == 0 {
        return backend;
    }
    Arc::new(CachedHighlighter::new(backend, config.cache_capacity))
}

#[cfg(feature = "syntect")]
fn backend(config: &HighlightConfig) -> Arc<dyn CodeHighlighter + Send + Sync> {
    markpane_syntax::syntect::SyntectHighlighter::shared(&config.theme)
}

#[cfg(not(feature = "syntect"))]
fn backend(_config: &HighlightConfig) -> Arc<dyn CodeHighlighter + Send + Sync> {
    log::warn!("Built without a highlighter backend; code blocks render as plain text");
    Arc::new(markpane_core::text::NoHighlight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_returns_the_first_pipeline() {
        let first = initialize(&PreviewConfig::default());
        let mut other = PreviewConfig::default();
        other.render.allow_raw_html = true;
        let second = initialize(&other);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!second.options().allow_raw_html);
        assert!(is_initialized());
        assert!(markpane_diagram::is_initialized());
    }

    #[test]
    fn build_pipeline_applies_render_options() {
        let mut config = PreviewConfig::default();
        config.render.max_highlight_lines = 3;
        config.highlight.cache_capacity = 0;
        let pipeline = build_pipeline(&config);
        assert_eq!(pipeline.options().max_highlight_lines, 3);
    }
}
