//! Route table core - ordered URL patterns compiled to anchored regexes.
//!
//! Patterns come from servlet mappings and secured URL configs. A trailing
//! `/*` is rewritten to a single capture named `placeholder_<index>` that
//! absorbs the remainder of the path, `/` included. Any other `{name}`
//! segment captures exactly one path segment.

use regex::Regex;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::RouteError;

/// Maximum number of captures before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured parameters of a match, names shared with the route.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Prefix of the capture a trailing `/*` is rewritten to.
pub const WILDCARD_PREFIX: &str = "placeholder_";

/// A compiled URL pattern plus its payload
#[derive(Debug, Clone)]
pub struct Route<P> {
    index: usize,
    pattern: String,
    rewritten: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    payload: P,
}

impl<P> Route<P> {
    /// Construction index, also the wildcard capture suffix.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The pattern as registered (e.g. `/admin/*`).
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The pattern after wildcard substitution (e.g. `/admin/{placeholder_3}`).
    #[must_use]
    pub fn rewritten_pattern(&self) -> &str {
        &self.rewritten
    }

    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }
}

/// Result of matching one path against a [`RouteTable`]
#[derive(Debug)]
pub struct RouteMatch<'t, P> {
    pub route: &'t Route<P>,
    pub params: ParamVec,
}

impl<'t, P> RouteMatch<'t, P> {
    #[must_use]
    pub fn payload(&self) -> &'t P {
        &self.route.payload
    }

    /// Get a captured parameter by name
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A match found by the progressive fallback traversal
#[derive(Debug)]
pub struct FallbackMatch<'t, 'p, P> {
    /// The (possibly shortened) path that matched
    pub path: &'p str,
    pub route_match: RouteMatch<'t, P>,
}

/// Ordered, immutable collection of routes
///
/// Insertion order is the only tie-break: [`RouteTable::match_path`] returns
/// the first route whose pattern matches the whole path.
#[derive(Debug)]
pub struct RouteTable<P> {
    routes: Vec<Route<P>>,
    match_attempts: AtomicU64,
}

impl<P> Default for RouteTable<P> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            match_attempts: AtomicU64::new(0),
        }
    }
}

impl<P> RouteTable<P> {
    /// Build a route table from an ordered `pattern -> payload` mapping
    ///
    /// Routes are numbered from zero in iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if a pattern cannot be compiled.
    pub fn build<I, S>(mappings: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (S, P)>,
        S: AsRef<str>,
    {
        let routes = mappings
            .into_iter()
            .enumerate()
            .map(|(index, (pattern, payload))| compile_route(index, pattern.as_ref(), payload))
            .collect::<Result<Vec<_>, _>>()?;

        let routes_summary: Vec<&str> = routes.iter().take(10).map(|r| r.rewritten.as_str()).collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Route table built"
        );

        Ok(Self {
            routes,
            match_attempts: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route<P>> {
        self.routes.iter()
    }

    /// Number of single-path match attempts performed against this table.
    #[must_use]
    pub fn match_attempts(&self) -> u64 {
        self.match_attempts.load(Ordering::Relaxed)
    }

    /// Match a single path against the table, first route wins
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_, P>> {
        self.match_attempts.fetch_add(1, Ordering::Relaxed);

        for route in &self.routes {
            let Some(captures) = route.regex.captures(path) else {
                continue;
            };
            let params: ParamVec = route
                .param_names
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (Arc::clone(name), value.as_str().to_string()))
                })
                .collect();
            debug!(
                path = %path,
                route_index = route.index,
                route_pattern = %route.pattern,
                "Route matched"
            );
            return Some(RouteMatch { route, params });
        }

        None
    }

    /// Match with progressive fallback
    ///
    /// Attempts the full path, then repeatedly drops the last `/`-separated
    /// segment and retries while the remaining path still contains a `/`.
    ///
    /// # Errors
    ///
    /// Returns the last truncated path when no attempt matched.
    pub fn match_with_fallback<'p>(
        &self,
        path: &'p str,
    ) -> Result<FallbackMatch<'_, 'p, P>, &'p str> {
        let mut candidate = path;
        loop {
            if let Some(route_match) = self.match_path(candidate) {
                return Ok(FallbackMatch {
                    path: candidate,
                    route_match,
                });
            }
            match candidate.rfind('/') {
                Some(idx) => candidate = &candidate[..idx],
                None => return Err(candidate),
            }
            if !candidate.contains('/') {
                return Err(candidate);
            }
        }
    }
}

impl<P: Clone> RouteTable<P> {
    /// Return a new table with one more route appended
    ///
    /// Existing routes keep their indices; the new route gets the next one.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if the pattern cannot be compiled.
    pub fn with_route(&self, pattern: &str, payload: P) -> Result<Self, RouteError> {
        let mut routes = self.routes.clone();
        routes.push(compile_route(routes.len(), pattern, payload)?);
        Ok(Self {
            routes,
            match_attempts: AtomicU64::new(0),
        })
    }
}

fn compile_route<P>(index: usize, pattern: &str, payload: P) -> Result<Route<P>, RouteError> {
    let rewritten = rewrite_wildcard(pattern, index);
    let regex = pattern_to_regex(&rewritten, index).map_err(|reason| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    })?;
    let param_names = regex.capture_names().flatten().map(Arc::from).collect();

    Ok(Route {
        index,
        pattern: pattern.to_string(),
        rewritten,
        regex,
        param_names,
        payload,
    })
}

/// Rewrite a trailing `/*` into the route's wildcard capture.
pub(crate) fn rewrite_wildcard(pattern: &str, index: usize) -> String {
    match pattern.strip_suffix("/*") {
        Some(prefix) => format!("{prefix}/{{{WILDCARD_PREFIX}{index}}}"),
        None => pattern.to_string(),
    }
}

/// Compile a rewritten pattern into an anchored regex
///
/// `{placeholder_<index>}` matches `.*`; any other `{name}` matches one
/// segment (`[^/]+`). Everything else is literal.
pub(crate) fn pattern_to_regex(pattern: &str, index: usize) -> Result<Regex, String> {
    let wildcard = format!("{WILDCARD_PREFIX}{index}");
    let mut re = String::with_capacity(pattern.len() + 16);
    re.push_str("(?s)^");

    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        re.push_str(&regex::escape(&rest[..open]));
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| format!("unterminated placeholder at byte {}", pattern.len() - rest.len() + open))?;
        let name = &after[..close];
        if !is_valid_name(name) {
            return Err(format!("invalid placeholder name '{name}'"));
        }
        let requirement = if name == wildcard { ".*" } else { "[^/]+" };
        re.push_str(&format!("(?P<{name}>{requirement})"));
        rest = &after[close + 1..];
    }
    re.push_str(&regex::escape(rest));
    re.push('$');

    Regex::new(&re).map_err(|e| e.to_string())
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
