//! Best-effort language detection for blocks without a usable language hint.
//!
//! syntect has no relevance scoring like highlight.js, so detection is limited to what the
//! grammars declare as first-line matches (shebangs, `<?xml`, `<?php`, modelines, ...), a
//! structural check for JSON documents, and a tally of line-leading keywords for a handful of
//! common languages.
use markpane_core::lang::is_safe_language;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;

/// Number of leading non-blank lines offered to first-line matchers.
const PROBE_LINES: usize = 3;

pub fn detect_syntax<'a>(syntax_set: &'a SyntaxSet, code: &str) -> Option<&'a SyntaxReference> {
    let by_first_line = code
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(PROBE_LINES)
        .find_map(|l| syntax_set.find_syntax_by_first_line(l));
    if by_first_line.is_some() {
        return by_first_line;
    }

    if looks_like_json(code) {
        return syntax_set.find_syntax_by_extension("json");
    }
    guess_extension(code).and_then(|ext| syntax_set.find_syntax_by_extension(ext))
}

/// Line-leading markers per file extension. Earlier entries win ties.
const KEYWORD_RULES: &[(&str, fn(&str) -> bool)] = &[
    ("rs", |l| {
        ["fn ", "pub fn ", "let mut ", "impl ", "impl<", "use std::", "#[derive("]
            .iter()
            .any(|p| l.starts_with(p))
    }),
    ("py", |l| {
        ((l.starts_with("def ") || l.starts_with("class ")) && l.ends_with(':'))
            || (l.starts_with("from ") && l.contains(" import "))
            || l.starts_with("if __name__")
            || l.strip_prefix("import ").is_some_and(|rest| {
                !rest.contains(char::is_whitespace) || rest.contains(" as ")
            })
    }),
    ("go", |l| {
        l.starts_with("func ")
            || l.strip_prefix("package ").is_some_and(|rest| {
                !rest.is_empty() && !rest.contains(char::is_whitespace)
            })
    }),
    ("js", |l| {
        (l.starts_with("function ") && l.contains('('))
            || ((l.starts_with("const ") || l.starts_with("let ")) && l.contains(" = "))
            || l.starts_with("console.log(")
            || l.starts_with("export default ")
            || (l.starts_with("import ") && l.contains(" from "))
    }),
    ("cpp", |l| l.starts_with("#include")),
    ("sql", |l| {
        let upper = l.to_ascii_uppercase();
        upper.starts_with("SELECT ") && upper.contains(" FROM ")
    }),
];

fn guess_extension(code: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for &(ext, rule) in KEYWORD_RULES {
        let hits = code.lines().map(str::trim).filter(|l| rule(l)).count();
        if hits > best.map_or(0, |(_, n)| n) {
            best = Some((ext, hits));
        }
    }
    best.map(|(ext, _)| ext)
}

/// Language tag for a detected grammar: its lowercased name if that is a safe token, otherwise
/// its first safe file extension.
pub fn language_tag(syntax: &SyntaxReference) -> Option<String> {
    let name = syntax.name.to_lowercase();
    if is_safe_language(&name) {
        return Some(name);
    }
    syntax
        .file_extensions
        .iter()
        .map(|e| e.to_lowercase())
        .find(|e| is_safe_language(e))
}

fn looks_like_json(code: &str) -> bool {
    let t = code.trim();
    let object = t.starts_with('{') && t.ends_with('}');
    let array = t.starts_with('[') && t.ends_with(']');
    (object || array) && t.contains('"') && t.contains(':')
}
