use log::debug;
use log::warn;
use markpane_core::diagram::DiagramError;
use markpane_core::diagram::DiagramFuture;
use markpane_core::diagram::DiagramRenderer;
use mermaid_rs_renderer::LayoutConfig;
use mermaid_rs_renderer::RenderOptions;
use mermaid_rs_renderer::Theme;

use crate::config::DiagramConfig;
use crate::config::DiagramTheme;
use crate::sanitize;

/// Mermaid backend built on `mermaid-rs-renderer`.
///
/// Layout is CPU-bound, so inside a Tokio runtime each diagram is compiled on the blocking pool
/// and several diagrams of one document can make progress at once. Outside a runtime the
/// diagram is compiled inline.
pub struct MermaidRenderer {
    config: DiagramConfig,
}

impl MermaidRenderer {
    pub fn new(config: DiagramConfig) -> Self {
        Self { config }
    }
}

impl DiagramRenderer for MermaidRenderer {
    fn render<'a>(&'a self, id: &'a str, source: &'a str) -> DiagramFuture<'a> {
        Box::pin(async move {
            let svg = match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let source = source.to_string();
                    let theme = self.config.theme;
                    handle
                        .spawn_blocking(move || compile(&source, theme))
                        .await
                        .map_err(|e| {
                            if e.is_panic() {
                                DiagramError::Panicked
                            } else {
                                DiagramError::Render(e.to_string())
                            }
                        })??
                }
                Err(_) => compile_catching_panics(source, self.config.theme)?,
            };
            debug!(id, bytes = svg.len(); "Mermaid diagram compiled");
            Ok(finish(&svg, id, &self.config))
        })
    }
}

fn compile(source: &str, theme: DiagramTheme) -> Result<String, DiagramError> {
    let opts = RenderOptions {
        theme: mermaid_theme(theme),
        layout: LayoutConfig::default(),
    };
    mermaid_rs_renderer::render_with_options(source, opts).map_err(|e| {
        warn!(error:% = e; "Mermaid compile failed");
        DiagramError::Syntax(e.to_string())
    })
}

fn compile_catching_panics(source: &str, theme: DiagramTheme) -> Result<String, DiagramError> {
    std::panic::catch_unwind(|| compile(source, theme)).map_err(|_| DiagramError::Panicked)?
}

fn finish(svg: &str, id: &str, config: &DiagramConfig) -> String {
    let svg = if config.strict {
        sanitize::strip_active_content(svg)
    } else {
        svg.to_string()
    };
    sanitize::with_root_id(&sanitize::scope_ids(&svg, id), id)
}

fn mermaid_theme(theme: DiagramTheme) -> Theme {
    match theme {
        DiagramTheme::Default => Theme::modern(),
        DiagramTheme::Dark => Theme {
            background: "#0d1117".to_string(),
            primary_color: "#1f6feb".to_string(),
            primary_text_color: "#ffffff".to_string(),
            primary_border_color: "#30363d".to_string(),
            secondary_color: "#8957e5".to_string(),
            tertiary_color: "#2ea043".to_string(),
            line_color: "#8b949e".to_string(),
            text_color: "#e6edf3".to_string(),
            edge_label_background: "#161b22".to_string(),
            cluster_background: "#161b22".to_string(),
            cluster_border: "#30363d".to_string(),
            ..Theme::modern()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_flowchart_to_svg() {
        let r = MermaidRenderer::new(DiagramConfig::default());
        let svg = r
            .render("mermaid-0-0", "graph TD\n  A[Start] --> B[End]\n")
            .await
            .expect("svg");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("id=\""));
        assert!(svg.contains("Start"));
    }

    #[tokio::test]
    async fn diagrams_in_one_document_have_distinct_ids() {
        let r = MermaidRenderer::new(DiagramConfig::default());
        let source = "graph TD\n  A --> B\n  B --> C\n";
        let first = r.render("mermaid-0-0", source).await.expect("svg");
        let second = r.render("mermaid-0-1", source).await.expect("svg");

        let id_attr = regex::Regex::new(r#"\sid="([^"]*)""#).expect("regex");
        let mut seen = std::collections::HashSet::new();
        for svg in [&first, &second] {
            for caps in id_attr.captures_iter(svg) {
                let id = caps[1].to_string();
                assert!(seen.insert(id.clone()), "duplicate id {id}");
            }
        }
        assert!(seen.len() >= 2);
    }

    #[test]
    fn compiles_without_a_runtime() {
        let r = MermaidRenderer::new(DiagramConfig {
            theme: DiagramTheme::Dark,
            strict: true,
        });
        let svg = futures::executor::block_on(r.render("d", "graph LR\n  A --> B\n"))
            .expect("svg");
        assert!(svg.contains("<svg"));
    }
}
