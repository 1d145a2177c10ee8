use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use log::debug;
use log::error;
use log::warn;
use markpane_core::html::plain_code_block;
use markpane_core::html::push_escaped;
use markpane_core::lang::CodeBlock;
use markpane_core::lang::CodeBlockClass;
use markpane_core::lang::DIAGRAM_LANGUAGE;
use markpane_core::lang::code_class_names;
use markpane_core::text::CodeHighlighter;
use markpane_core::text::HighlightError;
use markpane_core::text::HighlightedCode;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::CowStr;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use url::Url;

/// Shown in place of the whole preview when the document cannot be rendered.
pub const FALLBACK_ERROR_HTML: &str = "<p class=\"text-destructive\">Error parsing markdown.</p>";

/// Class carried by diagram placeholders in the intermediate HTML.
pub const PLACEHOLDER_CLASS: &str = "diagram-placeholder";

/// Class carried by every highlighted `<code>` element.
pub const HIGHLIGHT_CLASS: &str = "hl";

/// Transformer configuration.
#[derive(Clone, Debug)]
pub struct MarkdownRenderOptions {
    /// Pass raw HTML in the markdown through. When off, it is escaped and shown as text.
    pub allow_raw_html: bool,
    /// Code blocks with more lines than this are emitted without highlighting.
    pub max_highlight_lines: usize,
    /// Base for resolving relative link and image destinations.
    pub base_url: Option<String>,
}

impl Default for MarkdownRenderOptions {
    fn default() -> Self {
        Self {
            allow_raw_html: false,
            max_highlight_lines: 2000,
            base_url: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformOutput {
    pub html: String,
    /// Number of diagram placeholders in `html`.
    pub diagrams: usize,
}

/// Issues placeholder ids of the form `mermaid-<session>-<index>`.
///
/// Each render pass takes a fresh session from a process-wide counter, so ids are unique within
/// a pass and never repeat across passes.
#[derive(Debug)]
pub struct DiagramIds {
    session: u64,
    next: usize,
}

static SESSIONS: AtomicU64 = AtomicU64::new(0);

impl DiagramIds {
    pub fn new() -> Self {
        Self {
            session: SESSIONS.fetch_add(1, Ordering::Relaxed),
            next: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("{DIAGRAM_LANGUAGE}-{}-{}", self.session, self.next);
        self.next += 1;
        id
    }
}

impl Default for DiagramIds {
    fn default() -> Self {
        Self::new()
    }
}

/// A code block after classification and highlighting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedBlock {
    DiagramPlaceholder { id: String, source: String },
    Highlighted(HighlightedCode),
    Plain { code: String, language: Option<String> },
}

impl RenderedBlock {
    pub fn to_html(&self) -> String {
        match self {
            Self::DiagramPlaceholder { id, source } => placeholder_html(id, source),
            Self::Highlighted(code) => {
                let class = code_class_names(HIGHLIGHT_CLASS, code.language.as_deref());
                let mut out = String::with_capacity(code.markup.len() + 48);
                out.push_str("<pre><code class=\"");
                out.push_str(&class);
                out.push_str("\">");
                out.push_str(&code.markup);
                out.push_str("</code></pre>\n");
                out
            }
            Self::Plain { code, language } => {
                let class = code_class_names("", language.as_deref());
                plain_code_block(code, Some(&class))
            }
        }
    }
}

/// Placeholder markup for one diagram block.
///
/// `substitute::parse_carrier` recognizes exactly this shape.
pub fn placeholder_html(id: &str, source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 96);
    out.push_str("<pre class=\"");
    out.push_str(PLACEHOLDER_CLASS);
    out.push_str("\" data-diagram-id=\"");
    push_escaped(&mut out, id);
    out.push_str("\"><code class=\"language-");
    out.push_str(DIAGRAM_LANGUAGE);
    out.push_str("\">");
    push_escaped(&mut out, source);
    out.push_str("</code></pre>\n");
    out
}

/// Parses `source` and renders it to HTML with highlighted code and diagram placeholders.
///
/// Never fails: if rendering panics, the output is [`FALLBACK_ERROR_HTML`].
pub fn transform(
    source: &str,
    options: &MarkdownRenderOptions,
    highlighter: &dyn CodeHighlighter,
    ids: &mut DiagramIds,
) -> TransformOutput {
    guarded(|| transform_unguarded(source, options, highlighter, ids))
}

fn guarded(f: impl FnOnce() -> TransformOutput) -> TransformOutput {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(out) => out,
        Err(_) => {
            error!("Markdown rendering panicked");
            TransformOutput {
                html: FALLBACK_ERROR_HTML.to_string(),
                diagrams: 0,
            }
        }
    }
}

fn gfm_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

fn transform_unguarded(
    source: &str,
    options: &MarkdownRenderOptions,
    highlighter: &dyn CodeHighlighter,
    ids: &mut DiagramIds,
) -> TransformOutput {
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut code: Option<CodeBlock> = None;
    let mut diagrams = 0usize;

    for event in Parser::new_ext(source, gfm_options()) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let hint = match kind {
                    CodeBlockKind::Fenced(info) if !info.trim().is_empty() => {
                        Some(info.to_string())
                    }
                    _ => None,
                };
                code = Some(CodeBlock::new(hint, String::new()));
            }
            Event::Text(text) if code.is_some() => {
                if let Some(block) = code.as_mut() {
                    block.raw_text.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = code.take() {
                    let rendered = render_code_block(&block, options, highlighter, ids);
                    if matches!(rendered, RenderedBlock::DiagramPlaceholder { .. }) {
                        diagrams += 1;
                    }
                    events.push(Event::Html(CowStr::from(rendered.to_html())));
                }
            }
            Event::Html(raw) | Event::InlineHtml(raw)
                if !options.allow_raw_html || raw.contains(PLACEHOLDER_CLASS) =>
            {
                // Placeholder markup is reserved for the substitution pass.
                events.push(Event::Text(raw));
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Link {
                link_type,
                dest_url: resolve_dest(options.base_url.as_deref(), dest_url),
                title,
                id,
            })),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => events.push(Event::Start(Tag::Image {
                link_type,
                dest_url: resolve_dest(options.base_url.as_deref(), dest_url),
                title,
                id,
            })),
            other => events.push(other),
        }
    }

    let mut html = String::with_capacity(source.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    debug!(bytes = html.len(), diagrams; "Markdown transformed");
    TransformOutput { html, diagrams }
}

/// Classifies and renders one code block.
///
/// Highlighter errors and panics are logged and degrade to a plain block.
pub fn render_code_block(
    block: &CodeBlock,
    options: &MarkdownRenderOptions,
    highlighter: &dyn CodeHighlighter,
    ids: &mut DiagramIds,
) -> RenderedBlock {
    let language = match block.classify() {
        CodeBlockClass::Diagram => {
            return RenderedBlock::DiagramPlaceholder {
                id: ids.next_id(),
                source: block.raw_text.clone(),
            };
        }
        CodeBlockClass::Highlight { language } => language,
    };

    let plain = || RenderedBlock::Plain {
        code: block.raw_text.clone(),
        language: language.clone(),
    };

    if block.raw_text.lines().count() > options.max_highlight_lines {
        debug!(
            lines = block.raw_text.lines().count(),
            limit = options.max_highlight_lines;
            "Skipping highlight for long code block"
        );
        return plain();
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        highlighter.highlight(language.as_deref(), &block.raw_text)
    }))
    .unwrap_or(Err(HighlightError::Panicked));

    match result {
        Ok(code) => RenderedBlock::Highlighted(code),
        Err(err) => {
            warn!(language:? = language, error:% = err; "Highlight failed, emitting plain block");
            plain()
        }
    }
}

fn resolve_dest<'a>(base_url: Option<&str>, dest: CowStr<'a>) -> CowStr<'a> {
    if has_script_scheme(&dest) {
        return CowStr::Borrowed("#");
    }
    match base_url {
        Some(base) if !is_absolute_url(&dest) => CowStr::from(resolve_url(base, &dest)),
        _ => dest,
    }
}

fn has_script_scheme(dest: &str) -> bool {
    let d: String = dest
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .take(11)
        .collect::<String>()
        .to_ascii_lowercase();
    d.starts_with("javascript:") || d.starts_with("vbscript:")
}

fn resolve_url(base: &str, dest: &str) -> String {
    let dest = dest.trim();
    if dest.is_empty() {
        return String::new();
    }
    let base = base.trim();
    if base.is_empty() {
        return dest.to_string();
    }

    if let Ok(base) = Url::parse(base) {
        return base
            .join(dest)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| dest.to_string());
    }

    let mut out = base.trim_end_matches('/').to_string();
    let dest = dest.trim_start_matches("./").trim_start_matches('/');
    out.push('/');
    out.push_str(dest);
    out
}

fn is_absolute_url(dest: &str) -> bool {
    let d = dest.trim();
    d.is_empty()
        || d.starts_with('#')
        || d.starts_with("mailto:")
        || d.starts_with("http://")
        || d.starts_with("https://")
        || d.starts_with("data:")
        || d.starts_with('/')
}
