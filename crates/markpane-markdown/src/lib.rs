//! Markdown to HTML rendering for `markpane`.
//!
//! ## Two stages
//!
//! - [`transform`]: parses markdown (GitHub-flavored: tables, strikethrough, task lists,
//!   footnotes) into HTML. Code blocks are classified up front: ordinary blocks are highlighted
//!   inline, diagram blocks become placeholders.
//! - [`substitute`]: resolves every placeholder through a
//!   [`DiagramRenderer`](markpane_core::diagram::DiagramRenderer), all diagrams concurrently, and
//!   returns only once each one is resolved to a diagram or an error fragment.
//!
//! [`pipeline::MarkdownPipeline`] chains both and is what most callers want.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use markpane_core::diagram::NoDiagrams;
//! use markpane_core::text::NoHighlight;
//! use markpane_markdown::pipeline::MarkdownPipeline;
//!
//! # async fn demo() {
//! let pipeline = MarkdownPipeline::new(Arc::new(NoHighlight), Arc::new(NoDiagrams));
//! let html = pipeline.render("# Hello\n\nSome *markdown*.").await;
//! # let _ = html;
//! # }
//! ```
pub mod error;
pub mod pipeline;
pub mod substitute;
pub mod transform;

pub use error::RenderError;
pub use pipeline::MarkdownPipeline;
pub use transform::FALLBACK_ERROR_HTML;
pub use transform::MarkdownRenderOptions;
