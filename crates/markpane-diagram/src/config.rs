use serde::Deserialize;

/// Color scheme for rendered diagrams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramTheme {
    #[default]
    Default,
    Dark,
}

/// Diagram engine settings, fixed once the engine is initialized.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagramConfig {
    pub theme: DiagramTheme,
    /// Strip scripts, event handlers and `javascript:` URLs from produced markup.
    pub strict: bool,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            theme: DiagramTheme::Default,
            strict: true,
        }
    }
}
