//! Minimal HTML text helpers.
//!
//! These only cover what the renderer itself produces: escaping text into element bodies and
//! double-quoted attributes, and decoding it back out of carrier markup.

/// Escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped(&mut out, s);
    out
}

pub fn push_escaped(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Reverses [`escape_html`] plus the few named entities `pulldown-cmark` emits.
pub fn decode_basic_html_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    // `&amp;` last so `&amp;lt;` decodes to `&lt;`, not `<`.
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Wraps escaped `code` in a plain `<pre><code>` block.
pub fn plain_code_block(code: &str, class: Option<&str>) -> String {
    let mut out = String::with_capacity(code.len() + 32);
    match class.filter(|c| !c.is_empty()) {
        Some(class) => {
            out.push_str("<pre><code class=\"");
            push_escaped(&mut out, class);
            out.push_str("\">");
        }
        None => out.push_str("<pre><code>"),
    }
    push_escaped(&mut out, code);
    out.push_str("</code></pre>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_then_decode_is_identity_for_markup_chars() {
        let raw = r#"<a href="x">&'</a> &lt;"#;
        assert_eq!(decode_basic_html_entities(&escape_html(raw)), raw);
    }

    #[test]
    fn plain_code_block_escapes_body_and_class() {
        assert_eq!(
            plain_code_block("a < b", Some("language-mermaid")),
            "<pre><code class=\"language-mermaid\">a &lt; b</code></pre>\n"
        );
        assert_eq!(plain_code_block("x", None), "<pre><code>x</code></pre>\n");
        assert_eq!(plain_code_block("x", Some("")), "<pre><code>x</code></pre>\n");
    }
}
