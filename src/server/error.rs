use std::fmt;
use std::io;

/// Failure to frame a request from the connection stream
///
/// Framing errors are fatal to the current request. They are never retried
/// by the framer; the connection service logs them and closes the connection.
#[derive(Debug)]
pub enum FramingError {
    /// Reading from the stream failed (includes read timeouts)
    Io(io::Error),
    /// The stream ended before the header terminator was found
    HeaderIncomplete {
        /// Bytes received before the stream closed
        received: usize,
    },
    /// The header block grew past the configured limit without a terminator
    HeaderTooLarge {
        /// Configured maximum header size in bytes
        limit: usize,
    },
    /// The header block was complete but the request builder rejected it
    InvalidHeader(String),
    /// The `Content-Length` header is not a non-negative integer
    InvalidContentLength(String),
    /// The stream ended before the declared body length was read
    BodyIncomplete {
        /// Declared `Content-Length`
        expected: usize,
        /// Body bytes actually received
        received: usize,
    },
}

impl FramingError {
    /// Status code to answer with, if the peer can still be told anything.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FramingError::InvalidHeader(_) | FramingError::InvalidContentLength(_) => Some(400),
            FramingError::HeaderTooLarge { .. } => Some(431),
            FramingError::Io(_)
            | FramingError::HeaderIncomplete { .. }
            | FramingError::BodyIncomplete { .. } => None,
        }
    }
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramingError::Io(e) => write!(f, "Failed to read request: {}", e),
            FramingError::HeaderIncomplete { received } => write!(
                f,
                "Connection closed before end of header ({} bytes received)",
                received
            ),
            FramingError::HeaderTooLarge { limit } => {
                write!(f, "Request header exceeds {} bytes", limit)
            }
            FramingError::InvalidHeader(reason) => write!(f, "Invalid request header: {}", reason),
            FramingError::InvalidContentLength(value) => {
                write!(f, "Invalid Content-Length '{}'", value)
            }
            FramingError::BodyIncomplete { expected, received } => write!(
                f,
                "Connection closed after {} of {} body bytes",
                received, expected
            ),
        }
    }
}

impl std::error::Error for FramingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FramingError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FramingError {
    fn from(e: io::Error) -> Self {
        FramingError::Io(e)
    }
}
