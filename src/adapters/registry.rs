//! Explicit adapter registry.

use std::collections::HashMap;
use std::sync::Arc;

use super::{GoAdapter, JavaAdapter, JavaScriptAdapter, LanguageAdapter, PythonAdapter, RustAdapter};
use crate::types::Language;

/// Looks up a [`LanguageAdapter`] by language tag.
///
/// Constructed once at process start and passed by reference into the
/// engine and worker pool, so tests can substitute fake adapters
/// without touching global state.
pub struct AdapterRegistry {
    adapters: HashMap<Language, Arc<dyn LanguageAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// A registry with all built-in adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GoAdapter::new()));
        registry.register(Arc::new(PythonAdapter::new()));
        registry.register(Arc::new(RustAdapter::new()));
        registry.register(Arc::new(JavaScriptAdapter::new()));
        registry.register(Arc::new(JavaAdapter::new()));
        registry
    }

    /// Register an adapter under its language.
    pub fn register(&mut self, adapter: Arc<dyn LanguageAdapter>) {
        self.adapters.insert(adapter.language(), adapter);
    }

    /// Look up the adapter for a language.
    ///
    /// TypeScript resolves to the JavaScript-family adapter when one is
    /// registered.
    pub fn get(&self, language: Language) -> Option<Arc<dyn LanguageAdapter>> {
        self.adapters
            .get(&language)
            .or_else(|| self.adapters.get(&language.adapter_family()))
            .cloned()
    }

    /// Whether an adapter exists for the language.
    pub fn has(&self, language: Language) -> bool {
        self.get(language).is_some()
    }

    /// Registered languages, unordered.
    pub fn languages(&self) -> Vec<Language> {
        self.adapters.keys().copied().collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
