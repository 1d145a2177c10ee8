//! Language hint normalization for fenced code blocks.
//!
//! Info strings come straight from user-authored markdown. Only tokens made of `[0-9a-z+-]` are
//! ever allowed to reach a `class` attribute; anything else is treated as "no language" and the
//! highlighter falls back to auto-detection.

/// Language token that routes a fenced block to the diagram renderer.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// A fenced or indented code block as it appears in the source document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    /// Raw info string (`None` for indented blocks or fences without one).
    pub language_hint: Option<String>,
    pub raw_text: String,
}

impl CodeBlock {
    pub fn new(language_hint: Option<String>, raw_text: impl Into<String>) -> Self {
        Self {
            language_hint,
            raw_text: raw_text.into(),
        }
    }

    pub fn classify(&self) -> CodeBlockClass {
        classify(self.language_hint.as_deref())
    }
}

/// How a code block is rendered, decided before the markdown transformer runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeBlockClass {
    /// Replaced by a placeholder and rendered asynchronously by a diagram backend.
    Diagram,
    /// Syntax highlighted. `None` asks the highlighter to auto-detect.
    Highlight { language: Option<String> },
}

/// Returns the canonical language token for an info string, or `None` if it is absent or fails
/// the whitelist.
pub fn canonical_language(info: &str) -> Option<String> {
    let first = info.split_whitespace().next()?.to_lowercase();
    is_safe_language(&first).then_some(first)
}

/// `true` if `token` is non-empty and made only of ASCII digits, lowercase letters, `+` and `-`.
pub fn is_safe_language(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase() || b == b'+' || b == b'-')
}

/// Classifies a block from its raw info string.
pub fn classify(info: Option<&str>) -> CodeBlockClass {
    match info.and_then(canonical_language) {
        Some(lang) if lang == DIAGRAM_LANGUAGE => CodeBlockClass::Diagram,
        language => CodeBlockClass::Highlight { language },
    }
}

/// Builds the `class` attribute value for a highlighted block.
///
/// The resolved language is lowercased and only attached when it passes [`is_safe_language`].
pub fn code_class_names(base: &str, resolved_language: Option<&str>) -> String {
    let mut out = base.to_string();
    if let Some(lang) = resolved_language.map(str::to_lowercase) {
        if is_safe_language(&lang) {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str("language-");
            out.push_str(&lang);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_token_and_lowercases() {
        assert_eq!(canonical_language("Rust ignore"), Some("rust".to_string()));
        assert_eq!(canonical_language("  c++  "), Some("c++".to_string()));
        assert_eq!(
            canonical_language("objective-c"),
            Some("objective-c".to_string())
        );
    }

    #[test]
    fn rejects_unsafe_tokens() {
        assert_eq!(canonical_language("\"><script>alert(1)</script>"), None);
        assert_eq!(canonical_language("{.rust}"), None);
        assert_eq!(canonical_language("py,linenos"), None);
        assert_eq!(canonical_language(""), None);
        assert_eq!(canonical_language("   "), None);
    }

    #[test]
    fn routes_mermaid_to_diagrams() {
        assert_eq!(classify(Some("mermaid")), CodeBlockClass::Diagram);
        assert_eq!(classify(Some("Mermaid title")), CodeBlockClass::Diagram);
        assert_eq!(
            classify(Some("mermaid-js")),
            CodeBlockClass::Highlight {
                language: Some("mermaid-js".to_string())
            }
        );
        assert_eq!(classify(None), CodeBlockClass::Highlight { language: None });
    }

    #[test]
    fn class_names_drop_unsafe_resolved_language() {
        assert_eq!(code_class_names("hl", Some("Rust")), "hl language-rust");
        assert_eq!(code_class_names("hl", Some("JavaScript (Babel)")), "hl");
        assert_eq!(code_class_names("hl", None), "hl");
        assert_eq!(code_class_names("", Some("toml")), "language-toml");
    }

    #[test]
    fn code_block_classifies_from_its_hint() {
        let block = CodeBlock::new(Some("py".to_string()), "print(1)\n");
        assert_eq!(
            block.classify(),
            CodeBlockClass::Highlight {
                language: Some("py".to_string())
            }
        );
    }
}
