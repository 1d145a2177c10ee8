use markpane_core::diagram::DiagramError;
use markpane_core::diagram::DiagramFuture;
use markpane_core::diagram::DiagramRenderer;
use markpane_markdown::MarkdownPipeline;
use markpane_markdown::MarkdownRenderOptions;
use markpane_syntax::syntect::SyntectHighlighter;
use std::sync::Arc;

struct BoxRenderer;

impl DiagramRenderer for BoxRenderer {
    fn render<'a>(&'a self, id: &'a str, source: &'a str) -> DiagramFuture<'a> {
        Box::pin(async move {
            if source.trim_start().starts_with("graph") {
                Ok(format!("<svg id=\"{id}\"><text>{}</text></svg>", source.lines().count()))
            } else {
                Err(DiagramError::Syntax("unknown diagram type".to_string()))
            }
        })
    }
}

fn pipeline(options: MarkdownRenderOptions) -> MarkdownPipeline {
    MarkdownPipeline::with_options(
        options,
        Arc::new(SyntectHighlighter::new()),
        Arc::new(BoxRenderer),
    )
}

const DOCUMENT: &str = "# Notes

Some **bold** text, ~~gone~~, and a footnote.[^1]

- [x] done
- [ ] todo

| Name | Value |
|:-----|------:|
| foo  | 1     |

```rust
fn main() {
    println!(\"hi\");
}
```

```mermaid
graph TD
  A --> B
```

```mermaid
sequence nonsense
```

[^1]: The footnote.
";

#[tokio::test]
async fn full_document_renders_every_block_kind() {
    let html = pipeline(MarkdownRenderOptions::default())
        .render(DOCUMENT)
        .await
        .expect("render");

    assert!(html.starts_with("<h1>Notes</h1>\n"));
    assert!(html.contains("<strong>bold</strong>"));
    assert!(html.contains("<del>gone</del>"));
    assert!(html.contains("type=\"checkbox\""));
    assert!(html.contains("<table>"));
    assert!(html.contains("<pre><code class=\"hl language-rust\">"));
    assert!(html.contains("class=\"hl-"));
    assert!(html.contains("<div class=\"mermaid-diagram\"><svg id=\"mermaid-"));
    assert!(html.contains("<div class=\"mermaid-diagram mermaid-error\">"));
    assert!(html.contains("sequence nonsense"));
    assert!(html.contains("footnote-definition"));
    assert!(!html.contains("diagram-placeholder"));
}

#[tokio::test]
async fn untrusted_content_cannot_inject_markup() {
    let md = "<script>alert(1)</script>\n\n\
              [click](javascript:alert(1))\n\n\
              ```\"><img src=x onerror=alert(1)>\nx = 1\n```\n\n\
              ```html\n<script>alert(2)</script>\n```\n";
    let html = pipeline(MarkdownRenderOptions::default())
        .render(md)
        .await
        .expect("render");

    assert!(!html.contains("<script>"));
    assert!(!html.contains("<img"));
    assert!(!html.contains("javascript:"));
    assert!(html.contains("href=\"#\""));
}

#[tokio::test]
async fn relative_links_resolve_against_base_url() {
    let options = MarkdownRenderOptions {
        base_url: Some("https://example.com/docs/".to_string()),
        ..MarkdownRenderOptions::default()
    };
    let html = pipeline(options)
        .render("[guide](guide.md) and [abs](https://other.org/x)\n")
        .await
        .expect("render");

    assert!(html.contains("href=\"https://example.com/docs/guide.md\""));
    assert!(html.contains("href=\"https://other.org/x\""));
}

#[tokio::test]
async fn long_code_blocks_skip_highlighting() {
    let options = MarkdownRenderOptions {
        max_highlight_lines: 2,
        ..MarkdownRenderOptions::default()
    };
    let html = pipeline(options)
        .render("```rust\nlet a = 1;\nlet b = 2;\nlet c = 3;\n```\n")
        .await
        .expect("render");

    assert_eq!(
        html,
        "<pre><code class=\"language-rust\">let a = 1;\nlet b = 2;\nlet c = 3;\n</code></pre>\n"
    );
}

#[tokio::test]
async fn stylesheet_comes_from_the_highlighter() {
    let css = pipeline(MarkdownRenderOptions::default())
        .stylesheet()
        .expect("css");
    assert!(css.contains(".hl-"));
}

#[tokio::test]
async fn prose_without_fences_has_no_diagram_or_highlight_markup() {
    let md = "# Heading\n\nPlain *prose* with `inline code`, a list:\n\n1. one\n2. two\n\n> quoted\n";
    let html = pipeline(MarkdownRenderOptions::default())
        .render(md)
        .await
        .expect("render");

    assert!(!html.contains("mermaid"));
    assert!(!html.contains("diagram"));
    assert!(!html.contains("hl-"));
    assert!(!html.contains("class=\"hl"));
    assert!(html.contains("<code>inline code</code>"));
}

#[tokio::test]
async fn malicious_language_hint_never_reaches_class_names() {
    let md = "```\"><script>alert(1)</script>\nplain words\n```\n";
    let html = pipeline(MarkdownRenderOptions::default())
        .render(md)
        .await
        .expect("render");

    assert!(!html.contains("<script>"));
    assert!(!html.contains("language-\""));
    assert!(!html.contains("language-&quot;"));
    assert!(html.contains("plain words"));
}
