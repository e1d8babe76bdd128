use super::{DefaultServlet, Servlet, ServletConfig, StaticResourceServlet};
use std::collections::HashMap;
use std::sync::Arc;

/// Creates a servlet instance for one registration.
pub type ServletFactory = Arc<dyn Fn(&ServletConfig) -> Arc<dyn Servlet> + Send + Sync>;

/// Servlet class name -> factory
///
/// Deployment descriptors refer to servlets by class name; the registry turns
/// that name into an instance.
#[derive(Clone, Default)]
pub struct ServletRegistry {
    factories: HashMap<String, ServletFactory>,
}

impl ServletRegistry {
    /// Empty registry without the built-in classes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `static` and `default` classes.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("static", |config: &ServletConfig| -> Arc<dyn Servlet> {
            Arc::new(StaticResourceServlet::from_config(config))
        });
        registry.register("default", |config: &ServletConfig| -> Arc<dyn Servlet> {
            Arc::new(DefaultServlet::from_config(config))
        });
        registry
    }

    /// Register (or replace) a servlet class.
    pub fn register<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn(&ServletConfig) -> Arc<dyn Servlet> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Arc::new(factory));
    }

    /// Instantiate `class` for `config`, if the class is known.
    #[must_use]
    pub fn create(&self, class: &str, config: &ServletConfig) -> Option<Arc<dyn Servlet>> {
        self.factories.get(class).map(|factory| factory(config))
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Registered class names, sorted.
    #[must_use]
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }
}

impl std::fmt::Debug for ServletRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServletRegistry")
            .field("classes", &self.classes())
            .finish()
    }
}
