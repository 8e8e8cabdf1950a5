//! External service seams
//!
//! The engine touches the outside world at two points: a fire-and-forget
//! analytics sink and a translation boundary. Both are traits so hosts plug
//! in their own transport; failures at either seam degrade to safe defaults
//! and never reach the caller as errors.

use crate::error::StoreError;
use crate::stores::TranslationCache;

/// Fire-and-forget analytics emitter.
///
/// The engine never waits on or branches on the outcome of `emit`.
pub trait AnalyticsSink {
    fn emit(&self, event: &str, properties: &serde_json::Value);
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn emit(&self, _event: &str, _properties: &serde_json::Value) {}
}

/// Translation boundary call
pub trait Translator {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, StoreError>;
}

/// Cache-fronted translation service.
///
/// A cache hit never calls the boundary; a miss calls through and caches the
/// result. A failed boundary call logs and returns the original text
/// verbatim.
pub struct TranslationService {
    cache: TranslationCache,
    translator: Box<dyn Translator>,
}

impl TranslationService {
    pub fn new(cache: TranslationCache, translator: Box<dyn Translator>) -> Self {
        Self { cache, translator }
    }

    pub fn translate(&mut self, text: &str, source_lang: &str, target_lang: &str) -> String {
        if let Some(cached) = self.cache.get(text, source_lang, target_lang) {
            return cached;
        }

        match self.translator.translate(text, source_lang, target_lang) {
            Ok(translated) => {
                self.cache
                    .put(text, source_lang, target_lang, translated.clone());
                translated
            }
            Err(e) => {
                log::warn!(
                    "Translation {}->{} failed: {}; serving original text",
                    source_lang,
                    target_lang,
                    e
                );
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingTranslator {
        calls: Rc<Cell<u32>>,
        fail: bool,
    }

    impl Translator for CountingTranslator {
        fn translate(
            &self,
            text: &str,
            _source_lang: &str,
            _target_lang: &str,
        ) -> Result<String, StoreError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(StoreError::Translation("boundary timeout".to_string()))
            } else {
                Ok(format!("[fr] {}", text))
            }
        }
    }

    fn make_service(fail: bool) -> (TranslationService, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let cache = TranslationCache::open(Box::new(MemoryStore::new()));
        let service = TranslationService::new(
            cache,
            Box::new(CountingTranslator {
                calls: calls.clone(),
                fail,
            }),
        );
        (service, calls)
    }

    #[test]
    fn test_cache_miss_calls_boundary_once() {
        let (mut service, calls) = make_service(false);

        assert_eq!(service.translate("hello", "en", "fr"), "[fr] hello");
        assert_eq!(service.translate("hello", "en", "fr"), "[fr] hello");
        // Second call served from cache
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_boundary_failure_serves_original_text() {
        let (mut service, calls) = make_service(true);

        assert_eq!(service.translate("hello", "en", "fr"), "hello");
        // Failures are not cached; the next call retries the boundary
        assert_eq!(service.translate("hello", "en", "fr"), "hello");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_noop_sink_accepts_events() {
        let sink = NoopSink;
        sink.emit("interaction_recorded", &serde_json::json!({"kind": "view"}));
    }
}
