use std::fmt;

/// Failure to resolve a request to a servlet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    /// No route matched the path or any of its truncations
    NotFound {
        /// Normalized request path
        path: String,
        /// Last (shortest) path the fallback traversal attempted
        last_attempt: String,
    },
    /// A route matched but its servlet is not registered with the application
    ServletNotRegistered { servlet_name: String, path: String },
}

impl LocateError {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            LocateError::NotFound { .. } => 404,
            LocateError::ServletNotRegistered { .. } => 500,
        }
    }
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocateError::NotFound { path, .. } => {
                write!(f, "Can't find servlet for requested path {}", path)
            }
            LocateError::ServletNotRegistered { servlet_name, path } => write!(
                f,
                "Servlet '{}' matched for path {} is not registered",
                servlet_name, path
            ),
        }
    }
}

impl std::error::Error for LocateError {}
