use thiserror::Error;

use crate::html::escape_html;

/// Highlighted markup for one code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightedCode {
    /// Inner markup of the `<code>` element. Already escaped.
    pub markup: String,
    /// Language the highlighter actually used (requested or detected), if any.
    pub language: Option<String>,
}

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("highlighter failed: {0}")]
    Backend(String),

    #[error("highlighter panicked")]
    Panicked,
}

pub trait CodeHighlighter {
    /// Highlights `code` as `language`, or auto-detects when `language` is `None` or unknown.
    fn highlight(
        &self,
        language: Option<&str>,
        code: &str,
    ) -> Result<HighlightedCode, HighlightError>;

    /// `true` if the backend has a grammar for `language`.
    fn supports_language(&self, _language: &str) -> bool {
        false
    }

    /// CSS matching the markup produced by [`Self::highlight`], if the backend emits classes.
    fn stylesheet(&self) -> Option<String> {
        None
    }
}

/// Null backend: escapes the code and keeps the requested language.
pub struct NoHighlight;

impl CodeHighlighter for NoHighlight {
    fn highlight(
        &self,
        language: Option<&str>,
        code: &str,
    ) -> Result<HighlightedCode, HighlightError> {
        Ok(HighlightedCode {
            markup: escape_html(code),
            language: language.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_highlight_escapes_and_keeps_language() {
        let out = NoHighlight
            .highlight(Some("html"), "<b>&</b>")
            .expect("infallible");
        assert_eq!(out.markup, "&lt;b&gt;&amp;&lt;/b&gt;");
        assert_eq!(out.language.as_deref(), Some("html"));
        assert!(!NoHighlight.supports_language("html"));
        assert!(NoHighlight.stylesheet().is_none());
    }
}
