use std::sync::Arc;

use log::debug;
use markpane_core::diagram::DiagramRenderer;
use markpane_core::text::CodeHighlighter;

use crate::error::RenderError;
use crate::substitute::substitute_diagrams;
use crate::transform::DiagramIds;
use crate::transform::MarkdownRenderOptions;
use crate::transform::transform;

/// Markdown → HTML with highlighted code and rendered diagrams.
///
/// Cheap to share behind an `Arc`; renders hold no state between calls, so several renders may
/// run at once against the same pipeline.
pub struct MarkdownPipeline {
    options: MarkdownRenderOptions,
    highlighter: Arc<dyn CodeHighlighter + Send + Sync>,
    diagrams: Arc<dyn DiagramRenderer>,
}

impl MarkdownPipeline {
    pub fn new(
        highlighter: Arc<dyn CodeHighlighter + Send + Sync>,
        diagrams: Arc<dyn DiagramRenderer>,
    ) -> Self {
        Self::with_options(MarkdownRenderOptions::default(), highlighter, diagrams)
    }

    pub fn with_options(
        options: MarkdownRenderOptions,
        highlighter: Arc<dyn CodeHighlighter + Send + Sync>,
        diagrams: Arc<dyn DiagramRenderer>,
    ) -> Self {
        Self {
            options,
            highlighter,
            diagrams,
        }
    }

    pub fn options(&self) -> &MarkdownRenderOptions {
        &self.options
    }

    /// Stylesheet for highlighted code, if the highlighter provides one.
    pub fn stylesheet(&self) -> Option<String> {
        self.highlighter.stylesheet()
    }

    /// Renders `markdown` to final HTML.
    ///
    /// # Errors
    ///
    /// Only a malformed diagram placeholder in the intermediate HTML fails the render. Highlight
    /// and diagram failures are absorbed into fallback fragments.
    pub async fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let mut ids = DiagramIds::new();
        let out = transform(markdown, &self.options, self.highlighter.as_ref(), &mut ids);
        if out.diagrams == 0 {
            return Ok(out.html);
        }
        debug!(diagrams = out.diagrams; "Resolving diagrams");
        substitute_diagrams(&out.html, self.diagrams.as_ref()).await
    }
}
