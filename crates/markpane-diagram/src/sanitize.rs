//! Post-processing for engine-produced SVG before it is inlined into the preview.
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

static SCRIPT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?(?:</script\s*>|/>)").expect("valid regex")
});

static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid regex")
});

static JAVASCRIPT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("valid regex"));

static SVG_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<svg\b([^>]*)>").expect("valid regex"));

static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\sid\s*="#).expect("valid regex"));

static ID_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\s)id\s*=\s*"([^"]*)""#).expect("valid regex"));

static ID_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"url\(\s*#([^)\s]+)\s*\)|((?:xlink:)?href\s*=\s*)"#([^"]*)""##)
        .expect("valid regex")
});

/// Removes `<script>` elements, `on*=` attributes and `javascript:` URLs.
pub fn strip_active_content(svg: &str) -> String {
    let out = SCRIPT_ELEMENT.replace_all(svg, "");
    let out = EVENT_HANDLER.replace_all(&out, "");
    JAVASCRIPT_URL.replace_all(&out, "blocked:").into_owned()
}

/// Prefixes every element id with `prefix`, along with the `url(#..)` and `href="#.."`
/// references that point at them.
///
/// Diagrams share one document once inlined, and ids such as marker names repeat from one
/// diagram to the next. References to ids the SVG does not define are left alone.
pub fn scope_ids(svg: &str, prefix: &str) -> String {
    let ids = ID_VALUE
        .captures_iter(svg)
        .filter_map(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>();
    if ids.is_empty() {
        return svg.to_string();
    }

    let out = ID_VALUE.replace_all(svg, |caps: &Captures| {
        let id = &caps[2];
        if id.is_empty() {
            caps[0].to_string()
        } else {
            format!("{}id=\"{prefix}-{id}\"", &caps[1])
        }
    });
    ID_REFERENCE
        .replace_all(&out, |caps: &Captures| {
            if let Some(target) = caps.get(1) {
                if ids.contains(target.as_str()) {
                    return format!("url(#{prefix}-{})", target.as_str());
                }
            } else if let (Some(attr), Some(target)) = (caps.get(2), caps.get(3))
                && ids.contains(target.as_str())
            {
                return format!("{}\"#{prefix}-{}\"", attr.as_str(), target.as_str());
            }
            caps[0].to_string()
        })
        .into_owned()
}

/// Sets `id` on the root `<svg>` element unless it already has one.
pub fn with_root_id(svg: &str, id: &str) -> String {
    let Some(caps) = SVG_OPEN.captures(svg) else {
        return svg.to_string();
    };
    let (Some(whole), Some(attrs)) = (caps.get(0), caps.get(1)) else {
        return svg.to_string();
    };
    if ID_ATTR.is_match(attrs.as_str()) {
        return svg.to_string();
    }

    let mut out = String::with_capacity(svg.len() + id.len() + 8);
    out.push_str(&svg[..whole.start()]);
    out.push_str("<svg id=\"");
    markpane_core::html::push_escaped(&mut out, id);
    out.push('"');
    out.push_str(attrs.as_str());
    out.push('>');
    out.push_str(&svg[whole.end()..]);
    out
}
