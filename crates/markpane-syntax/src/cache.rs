use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::Mutex;

use log::trace;
use markpane_core::text::CodeHighlighter;
use markpane_core::text::HighlightError;
use markpane_core::text::HighlightedCode;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Memoizes highlight results keyed by `(language, code)`.
///
/// Live previews re-render the whole document on every edit while most code blocks stay
/// unchanged, so caching avoids re-running the grammar over them. The cache is cleared wholesale
/// when it reaches capacity. Errors are never cached.
pub struct CachedHighlighter {
    inner: Arc<dyn CodeHighlighter + Send + Sync>,
    capacity: usize,
    entries: Mutex<HashMap<u64, HighlightedCode>>,
}

impl CachedHighlighter {
    pub fn new(inner: Arc<dyn CodeHighlighter + Send + Sync>, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl CodeHighlighter for CachedHighlighter {
    fn highlight(
        &self,
        language: Option<&str>,
        code: &str,
    ) -> Result<HighlightedCode, HighlightError> {
        let key = highlight_cache_key(language, code);
        if let Some(hit) = self.entries.lock().ok().and_then(|e| e.get(&key).cloned()) {
            trace!(key; "Highlight cache hit");
            return Ok(hit);
        }

        let out = self.inner.highlight(language, code)?;
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity {
                entries.clear();
            }
            entries.insert(key, out.clone());
        }
        Ok(out)
    }

    fn supports_language(&self, language: &str) -> bool {
        self.inner.supports_language(language)
    }

    fn stylesheet(&self) -> Option<String> {
        self.inner.stylesheet()
    }
}

fn highlight_cache_key(language: Option<&str>, code: &str) -> u64 {
    let mut h = DefaultHasher::new();
    language.unwrap_or("").hash(&mut h);
    code.hash(&mut h);
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    #[derive(Default)]
    struct CountingHighlighter {
        calls: AtomicUsize,
    }

    impl CodeHighlighter for CountingHighlighter {
        fn highlight(
            &self,
            language: Option<&str>,
            code: &str,
        ) -> Result<HighlightedCode, HighlightError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if code == "boom" {
                return Err(HighlightError::Backend("boom".to_string()));
            }
            Ok(HighlightedCode {
                markup: code.to_string(),
                language: language.map(str::to_string),
            })
        }
    }

    #[test]
    fn caches_repeat_highlights() {
        let inner = Arc::new(CountingHighlighter::default());
        let cached = CachedHighlighter::new(inner.clone(), 8);

        for _ in 0..3 {
            let out = cached.highlight(Some("rs"), "fn main() {}").expect("ok");
            assert_eq!(out.markup, "fn main() {}");
        }
        let _ = cached.highlight(Some("py"), "fn main() {}");

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn does_not_cache_errors() {
        let inner = Arc::new(CountingHighlighter::default());
        let cached = CachedHighlighter::new(inner.clone(), 8);

        assert!(cached.highlight(None, "boom").is_err());
        assert!(cached.highlight(None, "boom").is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cached.is_empty());
    }

    #[test]
    fn clears_when_full() {
        let inner = Arc::new(CountingHighlighter::default());
        let cached = CachedHighlighter::new(inner, 2);

        let _ = cached.highlight(None, "a");
        let _ = cached.highlight(None, "b");
        let _ = cached.highlight(None, "c");
        assert_eq!(cached.len(), 1);
    }
}
