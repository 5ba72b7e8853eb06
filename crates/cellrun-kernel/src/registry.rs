//! Language-keyed registry of kernel factories.
//!
//! Kernel variants are selected through a registry rather than subclassing:
//! callers look up a factory by language identifier and get back a boxed,
//! unstarted kernel.

use crate::kernel::Kernel;
use crate::repl::ReplKernel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Factory producing an unstarted kernel.
pub type KernelFactory = Arc<dyn Fn() -> Box<dyn Kernel> + Send + Sync>;

/// Maps language identifiers to kernel factories.
pub struct KernelRegistry {
    factories: HashMap<String, KernelFactory>,
}

impl KernelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the stock languages: `c` and `cpp`, both backed by the
    /// cling REPL kernel.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let cling: KernelFactory = Arc::new(|| Box::new(ReplKernel::cling()));
        registry.register("c", Arc::clone(&cling));
        registry.register("cpp", cling);
        registry
    }

    /// Register a factory for a language identifier, replacing any previous
    /// registration.
    pub fn register(&mut self, language: impl Into<String>, factory: KernelFactory) {
        let language = language.into();
        debug!(language = %language, "kernel factory registered");
        self.factories.insert(language, factory);
    }

    /// Look up the factory for a language.
    pub fn factory(&self, language: &str) -> Option<KernelFactory> {
        self.factories.get(language).cloned()
    }

    /// Construct an unstarted kernel for a language.
    pub fn create(&self, language: &str) -> Option<Box<dyn Kernel>> {
        self.factories.get(language).map(|factory| factory())
    }

    /// Registered language identifiers.
    pub fn languages(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelState;

    #[test]
    fn test_default_registry_covers_c_and_cpp() {
        let registry = KernelRegistry::with_defaults();
        let mut languages = registry.languages();
        languages.sort_unstable();
        assert_eq!(languages, vec!["c", "cpp"]);
    }

    #[test]
    fn test_created_kernel_is_unstarted() {
        let registry = KernelRegistry::with_defaults();
        let kernel = registry.create("cpp").unwrap();
        assert_eq!(kernel.state(), KernelState::NotStarted);
    }

    #[test]
    fn test_unknown_language_yields_none() {
        let registry = KernelRegistry::with_defaults();
        assert!(registry.create("fortran").is_none());
        assert!(registry.factory("fortran").is_none());
    }

    #[test]
    fn test_register_custom_language() {
        let mut registry = KernelRegistry::new();
        registry.register(
            "cxx",
            Arc::new(|| Box::new(ReplKernel::cling()) as Box<dyn Kernel>) as KernelFactory,
        );
        assert!(registry.create("cxx").is_some());
    }
}
