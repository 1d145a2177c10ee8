//! Diagram rendering backends for `markpane`.
//!
//! The diagram engine is a process-wide singleton: call [`initialize`] once before the first
//! render. Repeated calls are cheap and return the already-configured renderer, so the engine
//! configuration never changes while renders are in flight.
//!
//! Backends:
//! - `mermaid` (feature: `mermaid`): pure-Rust Mermaid to SVG via `mermaid-rs-renderer`
//! - [`markpane_core::diagram::NoDiagrams`]: used when no backend is compiled in
use std::sync::Arc;
use std::sync::OnceLock;

use log::info;
use markpane_core::diagram::DiagramRenderer;

pub mod config;
pub mod sanitize;

#[cfg(feature = "mermaid")]
pub mod mermaid;

pub use config::DiagramConfig;
pub use config::DiagramTheme;

static ENGINE: OnceLock<Arc<dyn DiagramRenderer>> = OnceLock::new();

/// Configures the process-wide diagram engine on first call and returns it.
///
/// Later calls ignore `config` and return the engine configured by the first call.
pub fn initialize(config: &DiagramConfig) -> Arc<dyn DiagramRenderer> {
    ENGINE
        .get_or_init(|| {
            info!(theme:? = config.theme, strict = config.strict; "Initializing diagram engine");
            build_engine(config)
        })
        .clone()
}

pub fn is_initialized() -> bool {
    ENGINE.get().is_some()
}

#[cfg(feature = "mermaid")]
fn build_engine(config: &DiagramConfig) -> Arc<dyn DiagramRenderer> {
    Arc::new(mermaid::MermaidRenderer::new(config.clone()))
}

#[cfg(not(feature = "mermaid"))]
fn build_engine(_config: &DiagramConfig) -> Arc<dyn DiagramRenderer> {
    log::warn!("Built without a diagram backend; diagrams will render as errors");
    Arc::new(markpane_core::diagram::NoDiagrams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent() {
        let first = initialize(&DiagramConfig::default());
        let second = initialize(&DiagramConfig {
            theme: DiagramTheme::Dark,
            strict: false,
        });
        assert!(Arc::ptr_eq(&first, &second));
        assert!(is_initialized());
    }
}
