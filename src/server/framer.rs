//! HTTP framing: delimiting a byte stream into a header block and a body of
//! known length.
//!
//! The framer reads in bounded chunks until the header terminator shows up,
//! splits at its first occurrence, hands the header block to a
//! [`RequestBuilder`], and keeps reading until the declared `Content-Length`
//! is satisfied. It never reads past the declared body length.

use super::error::FramingError;
use super::request::{RequestBuilder, ServletRequest};
use crate::config::FramerConfig;
use std::io::{ErrorKind, Read};
use tracing::{debug, warn};

/// Reads one request from a stream
#[derive(Debug, Clone)]
pub struct HttpFramer<B> {
    config: FramerConfig,
    builder: B,
}

impl<B: RequestBuilder> HttpFramer<B> {
    pub fn new(config: FramerConfig, builder: B) -> Self {
        Self { config, builder }
    }

    #[must_use]
    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Receive a request from the stream
    ///
    /// # Errors
    ///
    /// Returns a [`FramingError`] if the header terminator never arrives, the
    /// header block is rejected by the builder, `Content-Length` is not a
    /// number, the body ends early, or a read fails.
    pub fn receive<R: Read + ?Sized>(&self, stream: &mut R) -> Result<B::Request, FramingError> {
        let new_line = self.config.new_line.as_bytes();
        let (mut buffer, header_end) = self.read_header(stream)?;

        let mut body = buffer.split_off(header_end + new_line.len());
        buffer.truncate(header_end);
        let raw_header = buffer;

        let mut request = self.builder.init_from_raw_header(&raw_header)?;

        if let Some(value) = request.header("content-length") {
            let content_length: usize = value
                .trim()
                .parse()
                .map_err(|_| FramingError::InvalidContentLength(value.to_string()))?;

            if body.len() > content_length {
                warn!(
                    content_length,
                    body_bytes = body.len(),
                    discarded = body.len() - content_length,
                    "Body exceeds Content-Length, truncating"
                );
                body.truncate(content_length);
            } else if body.len() < content_length {
                self.read_body(stream, &mut body, content_length)?;
            }
        }

        debug!(
            header_bytes = raw_header.len(),
            body_bytes = body.len(),
            "Request framed"
        );

        self.builder.parse_body(&mut request, body);
        Ok(request)
    }

    /// Read chunks until the terminator is found.
    ///
    /// Returns the accumulated buffer and the offset of the first terminator.
    fn read_header<R: Read + ?Sized>(
        &self,
        stream: &mut R,
    ) -> Result<(Vec<u8>, usize), FramingError> {
        let new_line = self.config.new_line.as_bytes();
        let mut buffer = Vec::with_capacity(self.config.line_length);
        let mut chunk = vec![0u8; self.config.line_length];

        loop {
            let read = read_chunk(stream, &mut chunk)?;
            if read == 0 {
                return Err(FramingError::HeaderIncomplete {
                    received: buffer.len(),
                });
            }

            // Only the new bytes plus a terminator-sized overlap can hold a
            // terminator that was not there before.
            let scan_from = buffer.len().saturating_sub(new_line.len().saturating_sub(1));
            buffer.extend_from_slice(&chunk[..read]);

            if let Some(pos) = find(&buffer[scan_from..], new_line) {
                return Ok((buffer, scan_from + pos));
            }
            if buffer.len() > self.config.max_header_bytes {
                return Err(FramingError::HeaderTooLarge {
                    limit: self.config.max_header_bytes,
                });
            }
        }
    }

    fn read_body<R: Read + ?Sized>(
        &self,
        stream: &mut R,
        body: &mut Vec<u8>,
        content_length: usize,
    ) -> Result<(), FramingError> {
        let mut chunk = vec![0u8; self.config.line_length];
        while body.len() < content_length {
            let want = (content_length - body.len()).min(chunk.len());
            let read = read_chunk(stream, &mut chunk[..want])?;
            if read == 0 {
                return Err(FramingError::BodyIncomplete {
                    expected: content_length,
                    received: body.len(),
                });
            }
            body.extend_from_slice(&chunk[..read]);
        }
        Ok(())
    }
}

fn read_chunk<R: Read + ?Sized>(stream: &mut R, chunk: &mut [u8]) -> Result<usize, FramingError> {
    loop {
        match stream.read(chunk) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FramingError::Io(e)),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::request::HttpRequestBuilder;
    use std::collections::VecDeque;
    use std::io;

    /// Reader handing out pre-cut chunks and counting reads.
    struct ChunkedReader {
        chunks: VecDeque<Vec<u8>>,
        reads: usize,
    }

    impl ChunkedReader {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                reads: 0,
            }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            let Some(mut chunk) = self.chunks.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.chunks.push_front(chunk.split_off(n));
            }
            Ok(n)
        }
    }

    fn framer(line_length: usize) -> HttpFramer<HttpRequestBuilder> {
        let config = FramerConfig {
            line_length,
            ..FramerConfig::default()
        };
        HttpFramer::new(config, HttpRequestBuilder)
    }

    #[test]
    fn test_body_across_three_reads() {
        let mut reader = ChunkedReader::new(&[
            b"POST /a HTTP/1.1\r\nContent-Length: 10\r\n\r\n",
            b"0123",
            b"4567",
            b"89",
            b"trailing garbage",
        ]);
        let req = framer(1024).receive(&mut reader).unwrap();
        assert_eq!(req.body, b"0123456789");
        assert_eq!(reader.reads, 4);
        assert_eq!(reader.chunks.len(), 1);
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let mut reader = ChunkedReader::new(&[b"GET /x HTTP/1.1\r\nHost: a\r\n", b"\r\n"]);
        let req = framer(8).receive(&mut reader).unwrap();
        assert_eq!(req.path_info, "/x");
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_first_terminator_wins() {
        let mut reader = ChunkedReader::new(&[
            b"POST /x HTTP/1.1\r\nContent-Length: 8\r\n\r\nab\r\n\r\ncd",
        ]);
        let req = framer(1024).receive(&mut reader).unwrap();
        assert_eq!(req.body, b"ab\r\n\r\ncd");
    }

    #[test]
    fn test_no_content_length_reads_nothing_more() {
        let mut reader = ChunkedReader::new(&[b"GET / HTTP/1.1\r\n\r\n", b"never read"]);
        let req = framer(1024).receive(&mut reader).unwrap();
        assert!(req.body.is_empty());
        assert_eq!(reader.reads, 1);
    }

    #[test]
    fn test_overlong_fragment_is_truncated() {
        let mut reader =
            ChunkedReader::new(&[b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nabcdef"]);
        let req = framer(1024).receive(&mut reader).unwrap();
        assert_eq!(req.body, b"ab");
    }

    #[test]
    fn test_missing_terminator_is_framing_error() {
        let mut reader = ChunkedReader::new(&[b"GET / HTTP/1.1\r\nHost: a"]);
        let err = framer(4).receive(&mut reader).unwrap_err();
        assert!(matches!(err, FramingError::HeaderIncomplete { received: 23 }));
    }

    #[test]
    fn test_short_body_is_framing_error() {
        let mut reader = ChunkedReader::new(&[b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nab"]);
        let err = framer(1024).receive(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            FramingError::BodyIncomplete {
                expected: 5,
                received: 2
            }
        ));
    }

    #[test]
    fn test_invalid_content_length() {
        let mut reader = ChunkedReader::new(&[b"POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n"]);
        let err = framer(1024).receive(&mut reader).unwrap_err();
        assert!(matches!(err, FramingError::InvalidContentLength(ref v) if v == "ten"));
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn test_header_size_limit() {
        let config = FramerConfig {
            line_length: 16,
            max_header_bytes: 32,
            ..FramerConfig::default()
        };
        let framer = HttpFramer::new(config, HttpRequestBuilder);
        let mut reader = ChunkedReader::new(&[&[b'a'; 100]]);
        let err = framer.receive(&mut reader).unwrap_err();
        assert!(matches!(err, FramingError::HeaderTooLarge { limit: 32 }));
    }

    #[test]
    fn test_custom_terminator() {
        let config = FramerConfig {
            new_line: "\n\n".to_string(),
            ..FramerConfig::default()
        };
        let framer = HttpFramer::new(config, HttpRequestBuilder);
        let mut reader = ChunkedReader::new(&[b"GET /nl HTTP/1.1\nHost: h\n\nbody"]);
        let req = framer.receive(&mut reader).unwrap();
        assert_eq!(req.path_info, "/nl");
        assert_eq!(req.server_name, "h");
    }
}
