use thiserror::Error;

/// Pipeline-wide render failures. Per-block highlight and per-diagram failures never surface
/// here; they are absorbed into fallback fragments.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("malformed diagram placeholder: {0}")]
    Carrier(String),
}
