use super::ApplicationContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// One resolved path: the servlet and the (possibly shortened) path its
/// route matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CachedServlet {
    pub servlet_name: String,
    pub matched_path: String,
}

impl CachedServlet {
    pub fn new(servlet_name: impl Into<String>, matched_path: impl Into<String>) -> Self {
        Self {
            servlet_name: servlet_name.into(),
            matched_path: matched_path.into(),
        }
    }
}

/// Typed view of an application's resolved-path cache.
///
/// The mapping `normalized path -> {servlet-name, matched-path}` is kept in
/// the [`ApplicationContext`] under `"<application>.servletCache"` so that
/// anything holding the context can inspect or drop it. Entries are written
/// lazily by the locator and only removed by [`ServletCache::invalidate`].
///
/// Concurrent writers for the same path always store the same entry, so
/// writes need no coordination beyond the context's own locking.
#[derive(Debug, Clone)]
pub struct ServletCache {
    key: String,
    context: Arc<ApplicationContext>,
}

impl ServletCache {
    pub fn new(application_name: &str, context: Arc<ApplicationContext>) -> Self {
        Self {
            key: Self::key_for(application_name),
            context,
        }
    }

    /// Attribute key holding the cache of `application_name`.
    #[must_use]
    pub fn key_for(application_name: &str) -> String {
        format!("{application_name}.servletCache")
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cached resolution for `path`.
    ///
    /// A value under the key that is not a mapping reads as an empty cache,
    /// and an entry of the wrong shape reads as absent.
    #[must_use]
    pub fn entry(&self, path: &str) -> Option<CachedServlet> {
        let entry = self
            .context
            .with_attribute(&self.key, |value| value.as_object()?.get(path).cloned())
            .flatten()?;
        match serde_json::from_value(entry) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(key = %self.key, path = %path, error = %e, "Ignoring malformed servlet cache entry");
                None
            }
        }
    }

    /// Cached servlet name for `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<String> {
        self.entry(path).map(|cached| cached.servlet_name)
    }

    /// Record the resolution of `path`, replacing a malformed cache value.
    pub fn insert(&self, path: &str, cached: &CachedServlet) {
        let entry = match serde_json::to_value(cached) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %self.key, path = %path, error = %e, "Failed to encode servlet cache entry");
                return;
            }
        };
        self.context.update_attribute(&self.key, |value| {
            if !value.is_object() {
                if !value.is_null() {
                    warn!(key = %self.key, "Servlet cache is not a mapping, rebuilding");
                }
                *value = Value::Object(Map::new());
            }
            if let Value::Object(map) = value {
                map.insert(path.to_string(), entry);
            }
        });
        debug!(
            key = %self.key,
            path = %path,
            servlet = %cached.servlet_name,
            matched_path = %cached.matched_path,
            "Servlet cache updated"
        );
    }

    /// Drop every cached resolution.
    pub fn invalidate(&self) {
        if self.context.remove_attribute(&self.key).is_some() {
            debug!(key = %self.key, "Servlet cache invalidated");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.context
            .with_attribute(&self.key, |value| value.as_object().map_or(0, Map::len))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> (Arc<ApplicationContext>, ServletCache) {
        let ctx = Arc::new(ApplicationContext::new());
        let cache = ServletCache::new("shop", Arc::clone(&ctx));
        (ctx, cache)
    }

    #[test]
    fn test_key_convention() {
        assert_eq!(ServletCache::key_for("shop"), "shop.servletCache");
    }

    #[test]
    fn test_insert_and_get_through_context() {
        let (ctx, cache) = cache();
        assert!(cache.get("/items").is_none());
        cache.insert("/items/42", &CachedServlet::new("catalog", "/items"));
        assert_eq!(cache.get("/items/42").as_deref(), Some("catalog"));
        assert_eq!(
            cache.entry("/items/42"),
            Some(CachedServlet::new("catalog", "/items"))
        );
        assert_eq!(
            ctx.get_attribute("shop.servletCache"),
            Some(json!({"/items/42": {"servlet-name": "catalog", "matched-path": "/items"}}))
        );
    }

    #[test]
    fn test_entry_of_wrong_shape_reads_absent() {
        let (ctx, cache) = cache();
        ctx.set_attribute("shop.servletCache", json!({"/items": "catalog"}));
        assert!(cache.entry("/items").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_malformed_value_reads_empty_and_is_rebuilt() {
        let (ctx, cache) = cache();
        ctx.set_attribute("shop.servletCache", json!("garbage"));
        assert!(cache.get("/items").is_none());
        assert_eq!(cache.len(), 0);
        cache.insert("/items", &CachedServlet::new("catalog", "/items"));
        assert_eq!(cache.get("/items").as_deref(), Some("catalog"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let (ctx, cache) = cache();
        cache.insert("/a", &CachedServlet::new("x", "/a"));
        cache.invalidate();
        assert!(cache.is_empty());
        assert!(ctx.get_attribute(cache.key()).is_none());
    }
}
