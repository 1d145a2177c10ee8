//! Resolution of diagram placeholders in transformer output.
//!
//! The carrier HTML is split into a flat list of markup runs and placeholders; that list is the
//! only structure needed to replace each placeholder in place. All diagrams of a document are
//! rendered concurrently and the pass returns only after every one of them has resolved.
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::join_all;
use log::debug;
use log::error;
use markpane_core::diagram::DiagramError;
use markpane_core::diagram::DiagramRenderer;
use markpane_core::html::decode_basic_html_entities;
use markpane_core::html::plain_code_block;
use markpane_core::html::push_escaped;
use markpane_core::lang::DIAGRAM_LANGUAGE;

use crate::error::RenderError;
use crate::transform::PLACEHOLDER_CLASS;

/// Class of the element wrapping a rendered diagram.
pub const DIAGRAM_CLASS: &str = "mermaid-diagram";

/// Text shown for a diagram that failed to render.
pub const DIAGRAM_ERROR_TEXT: &str = "Error rendering diagram";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment<'a> {
    Markup(&'a str),
    Placeholder { id: String, source: String },
}

/// Splits carrier HTML into markup runs and placeholders, in document order.
///
/// # Errors
///
/// Returns [`RenderError::Carrier`] for a truncated placeholder, an empty id, or an id used
/// twice.
pub fn parse_carrier(html: &str) -> Result<Vec<Fragment<'_>>, RenderError> {
    let open = format!("<pre class=\"{PLACEHOLDER_CLASS}\" data-diagram-id=\"");
    let code_open = format!("\"><code class=\"language-{DIAGRAM_LANGUAGE}\">");
    let close = "</code></pre>\n";

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut rest = html;

    while let Some(start) = rest.find(&open) {
        if start > 0 {
            out.push(Fragment::Markup(&rest[..start]));
        }
        let after_open = &rest[start + open.len()..];

        let id_end = after_open
            .find('"')
            .ok_or_else(|| RenderError::Carrier("unterminated id".to_string()))?;
        let id = decode_basic_html_entities(&after_open[..id_end]);
        if id.is_empty() {
            return Err(RenderError::Carrier("empty id".to_string()));
        }

        let body = after_open[id_end..]
            .strip_prefix(code_open.as_str())
            .ok_or_else(|| RenderError::Carrier(format!("unexpected markup after id {id}")))?;
        let body_end = body
            .find(close)
            .ok_or_else(|| RenderError::Carrier(format!("unterminated placeholder {id}")))?;

        if !seen.insert(id.clone()) {
            return Err(RenderError::Carrier(format!("duplicate id {id}")));
        }
        out.push(Fragment::Placeholder {
            id,
            source: decode_basic_html_entities(&body[..body_end]),
        });
        rest = &body[body_end + close.len()..];
    }

    if !rest.is_empty() {
        out.push(Fragment::Markup(rest));
    }
    Ok(out)
}

/// Replaces every placeholder in `html` with its rendered diagram or an error fragment.
pub async fn substitute_diagrams(
    html: &str,
    renderer: &dyn DiagramRenderer,
) -> Result<String, RenderError> {
    let fragments = parse_carrier(html)?;

    let jobs = fragments.iter().filter_map(|f| match f {
        Fragment::Placeholder { id, source } => Some(resolve(renderer, id, source)),
        Fragment::Markup(_) => None,
    });
    let mut resolved = join_all(jobs).await.into_iter();

    let mut out = String::with_capacity(html.len());
    for fragment in &fragments {
        match fragment {
            Fragment::Markup(markup) => out.push_str(markup),
            Fragment::Placeholder { .. } => out.push_str(&resolved.next().unwrap_or_default()),
        }
    }
    Ok(out)
}

async fn resolve(renderer: &dyn DiagramRenderer, id: &str, source: &str) -> String {
    if source.trim().is_empty() {
        return plain_code_block(source, Some(&format!("language-{DIAGRAM_LANGUAGE}")));
    }

    let result = AssertUnwindSafe(renderer.render(id, source))
        .catch_unwind()
        .await
        .unwrap_or(Err(DiagramError::Panicked));

    match result {
        Ok(svg) => {
            debug!(id; "Diagram resolved");
            format!("<div class=\"{DIAGRAM_CLASS}\">{svg}</div>\n")
        }
        Err(err) => {
            error!(id, error:% = err; "Diagram rendering failed");
            error_fragment(source)
        }
    }
}

/// Fragment shown in place of a diagram that failed to render, keeping the source visible.
pub fn error_fragment(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 128);
    out.push_str("<div class=\"");
    out.push_str(DIAGRAM_CLASS);
    out.push_str(" mermaid-error\"><p>");
    out.push_str(DIAGRAM_ERROR_TEXT);
    out.push_str("</p><pre><code>");
    push_escaped(&mut out, source);
    out.push_str("</code></pre></div>\n");
    out
}
