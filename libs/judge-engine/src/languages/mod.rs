// Language strategies and the registry that resolves request language names
mod go;
mod java;
mod javascript;
mod native;
mod python;

pub use go::Go;
pub use java::Java;
pub use javascript::{JavaScript, TypeScript};
pub use native::{Native, NativeLanguage};
pub use python::Python;

use crate::strategy::LanguageStrategy;
use judge_common::types::{Language, UnsupportedLanguage};
use std::collections::HashMap;

/// Registry of language strategies
/// This is the authoritative source for which languages a judge can serve
pub struct LanguageRegistry {
    strategies: HashMap<Language, Box<dyn LanguageStrategy>>,
}

impl LanguageRegistry {
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Every built-in language.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(JavaScript));
        registry.register(Box::new(TypeScript));
        registry.register(Box::new(Python));
        registry.register(Box::new(Java));
        registry.register(Box::new(Native::new(NativeLanguage::C)));
        registry.register(Box::new(Native::new(NativeLanguage::Cpp)));
        registry.register(Box::new(Native::new(NativeLanguage::Rust)));
        registry.register(Box::new(Go));
        registry
    }

    /// Add or replace the strategy for `strategy.language()`.
    pub fn register(&mut self, strategy: Box<dyn LanguageStrategy>) {
        self.strategies.insert(strategy.language(), strategy);
    }

    pub fn get(&self, language: Language) -> Option<&dyn LanguageStrategy> {
        self.strategies.get(&language).map(|strategy| strategy.as_ref())
    }

    /// Resolve a case-insensitive request language name.
    pub fn resolve(&self, name: &str) -> Result<&dyn LanguageStrategy, UnsupportedLanguage> {
        let language: Language = name.parse()?;
        self.get(language)
            .ok_or_else(|| UnsupportedLanguage(name.to_string()))
    }

    /// List all registered languages, in a stable order
    pub fn list_languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|language| self.strategies.contains_key(language))
            .collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
