use std::sync::Arc;
use std::sync::OnceLock;

use log::debug;
use log::warn;
use markpane_core::html::escape_html;
use markpane_core::text::CodeHighlighter;
use markpane_core::text::HighlightError;
use markpane_core::text::HighlightedCode;
use syntect::highlighting::Theme;
use syntect::highlighting::ThemeSet;
use syntect::html::ClassStyle;
use syntect::html::ClassedHTMLGenerator;
use syntect::html::css_for_theme_with_class_style;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::auto;

/// Class prefix for highlighted spans, e.g. `<span class="hl-source hl-rust">`.
pub const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Light theme close to GitHub's code styling.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

static SHARED: OnceLock<Arc<SyntectHighlighter>> = OnceLock::new();

pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    theme_name: String,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Loads syntect's bundled grammars and the named bundled theme.
    ///
    /// Unknown theme names fall back to [`DEFAULT_THEME`], then to any bundled theme.
    pub fn with_theme(name: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        let (theme_name, theme) = match theme_set.themes.get(name) {
            Some(theme) => (name.to_string(), theme.clone()),
            None => {
                warn!(theme = name; "Unknown highlight theme, using default");
                theme_set
                    .themes
                    .get(DEFAULT_THEME)
                    .map(|t| (DEFAULT_THEME.to_string(), t.clone()))
                    .or_else(|| {
                        theme_set
                            .themes
                            .iter()
                            .next()
                            .map(|(n, t)| (n.clone(), t.clone()))
                    })
                    .unwrap_or_default()
            }
        };
        debug!(theme = theme_name.as_str(); "Syntect highlighter loaded");
        Self {
            syntax_set,
            theme,
            theme_name,
        }
    }

    /// Process-wide instance, loaded on first use with `theme`.
    ///
    /// Loading grammars is expensive, so apps share one instance. Later calls return the first
    /// instance regardless of `theme`.
    pub fn shared(theme: &str) -> Arc<SyntectHighlighter> {
        let hl = SHARED.get_or_init(|| Arc::new(SyntectHighlighter::with_theme(theme)));
        if hl.theme_name != theme {
            debug!(
                requested = theme,
                active = hl.theme_name.as_str();
                "Shared highlighter already initialized"
            );
        }
        Arc::clone(hl)
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    fn syntax_for(&self, language: &str) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_extension(language)
            .or_else(|| self.syntax_set.find_syntax_by_token(language))
    }

    fn render(&self, syntax: &SyntaxReference, code: &str) -> Result<String, HighlightError> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| HighlightError::Backend(e.to_string()))?;
        }
        Ok(generator.finalize())
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(
        &self,
        language: Option<&str>,
        code: &str,
    ) -> Result<HighlightedCode, HighlightError> {
        if let Some(lang) = language {
            if let Some(syntax) = self.syntax_for(lang) {
                return Ok(HighlightedCode {
                    markup: self.render(syntax, code)?,
                    language: Some(lang.to_string()),
                });
            }
        }

        match auto::detect_syntax(&self.syntax_set, code) {
            Some(syntax) => Ok(HighlightedCode {
                markup: self.render(syntax, code)?,
                language: auto::language_tag(syntax).or_else(|| language.map(str::to_string)),
            }),
            None => Ok(HighlightedCode {
                markup: escape_html(code),
                language: language.map(str::to_string),
            }),
        }
    }

    fn supports_language(&self, language: &str) -> bool {
        self.syntax_for(language).is_some()
    }

    fn stylesheet(&self) -> Option<String> {
        css_for_theme_with_class_style(&self.theme, CLASS_STYLE)
            .inspect_err(|e| warn!(error:% = e; "Failed to build highlight stylesheet"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_known_language_with_classes() {
        let h = SyntectHighlighter::new();
        let out = h
            .highlight(Some("rs"), "fn main() {}\n")
            .expect("highlight");
        assert_eq!(out.language.as_deref(), Some("rs"));
        assert!(out.markup.contains("class=\"hl-"));
        assert!(out.markup.contains("main"));
    }

    #[test]
    fn escapes_markup_in_code() {
        let h = SyntectHighlighter::new();
        let out = h
            .highlight(Some("html"), "<script>alert(1)</script>\n")
            .expect("highlight");
        assert!(!out.markup.contains("<script>"));
        assert!(out.markup.contains("&lt;"));
    }

    #[test]
    fn unknown_language_without_detection_keeps_requested_tag() {
        let h = SyntectHighlighter::new();
        let out = h
            .highlight(Some("no-such-lang"), "just words here\n")
            .expect("highlight");
        assert_eq!(out.markup, "just words here\n");
        assert_eq!(out.language.as_deref(), Some("no-such-lang"));
    }

    #[test]
    fn auto_detects_from_shebang() {
        let h = SyntectHighlighter::new();
        let out = h
            .highlight(None, "#!/usr/bin/env python\nprint('hi')\n")
            .expect("highlight");
        assert!(out.markup.contains("class=\"hl-"));
        assert_eq!(out.language.as_deref(), Some("python"));
    }

    #[test]
    fn stylesheet_targets_prefixed_classes() {
        let h = SyntectHighlighter::new();
        let css = h.stylesheet().expect("css");
        assert!(css.contains(".hl-"));
        assert!(h.supports_language("rust"));
        assert!(!h.supports_language("no-such-lang"));
    }

    #[test]
    fn shared_instance_is_loaded_once() {
        let first = SyntectHighlighter::shared(DEFAULT_THEME);
        let second = SyntectHighlighter::shared("base16-ocean.dark");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn unknown_theme_falls_back() {
        let h = SyntectHighlighter::with_theme("does-not-exist");
        assert_eq!(h.theme_name(), DEFAULT_THEME);
    }
}
