use std::fmt;

/// Route table construction error
///
/// Returned by [`RouteTable::build`](super::RouteTable::build) and by the
/// servlet locator when a table cannot be compiled from its mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The URL pattern could not be compiled into a matcher
    InvalidPattern {
        /// The pattern as registered
        pattern: String,
        /// Compiler diagnostic
        reason: String,
    },
    /// A servlet mapping references a servlet that was never registered
    UnknownServlet {
        /// The mapped URL pattern
        pattern: String,
        /// The missing servlet name
        servlet_name: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid URL pattern '{}': {}", pattern, reason)
            }
            RouteError::UnknownServlet {
                pattern,
                servlet_name,
            } => {
                write!(
                    f,
                    "URL pattern '{}' is mapped to unknown servlet '{}'",
                    pattern, servlet_name
                )
            }
        }
    }
}

impl std::error::Error for RouteError {}
