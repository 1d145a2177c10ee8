use futures::future::BoxFuture;
use thiserror::Error;

/// Future returned by [`DiagramRenderer::render`].
pub type DiagramFuture<'a> = BoxFuture<'a, Result<String, DiagramError>>;

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("diagram syntax error: {0}")]
    Syntax(String),

    #[error("diagram render failed: {0}")]
    Render(String),

    #[error("diagram engine panicked")]
    Panicked,

    #[error("no diagram engine available")]
    Unsupported,
}

/// Compiles diagram source text into a self-contained markup fragment (typically SVG).
///
/// Implementations must be safe to call concurrently for read-only rendering; any engine
/// configuration happens before the renderer is handed to the pipeline.
pub trait DiagramRenderer: Send + Sync {
    /// Renders `source`. `id` is unique within one render pass and may be used to namespace ids
    /// inside the produced markup.
    fn render<'a>(&'a self, id: &'a str, source: &'a str) -> DiagramFuture<'a>;
}

/// Renderer for builds without a diagram engine. Every diagram fails with
/// [`DiagramError::Unsupported`].
pub struct NoDiagrams;

impl DiagramRenderer for NoDiagrams {
    fn render<'a>(&'a self, _id: &'a str, _source: &'a str) -> DiagramFuture<'a> {
        Box::pin(async { Err::<String, _>(DiagramError::Unsupported) })
    }
}
