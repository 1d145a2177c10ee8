//! Live markdown preview core.
//!
//! Feed markdown snapshots in, observe `{ html, is_rendering }` out:
//!
//! ```rust,no_run
//! use markpane::config::PreviewConfig;
//!
//! # async fn demo() {
//! let handle = markpane::start(&PreviewConfig::default());
//! let mut updates = handle.subscribe();
//! handle.render("# Hello\n\n```mermaid\ngraph TD; A-->B\n```\n");
//! let _ = updates.changed().await;
//! println!("{}", updates.borrow().display_html());
//! # }
//! ```
//!
//! Features:
//! - `syntect` (default): class-based code highlighting
//! - `mermaid` (default): Mermaid diagrams rendered to inline SVG
pub mod config;
pub mod engine;
pub mod scheduler;

pub use config::ConfigError;
pub use config::PreviewConfig;
pub use engine::initialize;
pub use markpane_markdown::FALLBACK_ERROR_HTML;
pub use markpane_markdown::MarkdownPipeline;
pub use scheduler::FALLBACK_EMPTY_HTML;
pub use scheduler::RenderHandle;
pub use scheduler::RenderScheduler;
pub use scheduler::RenderState;

/// Initializes the shared engines from `config` and starts a render scheduler on them.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn start(config: &PreviewConfig) -> RenderHandle {
    let pipeline = initialize(config);
    RenderScheduler::from_config(pipeline, &config.render).spawn()
}
