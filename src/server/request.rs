use super::error::FramingError;
use http::{Method, Version};
use std::collections::HashMap;
use tracing::debug;

/// Structured request as seen by the servlet locator and authenticators.
pub trait ServletRequest {
    /// HTTP method
    fn method(&self) -> &Method;
    /// Percent-decoded request path without query string
    fn path_info(&self) -> &str;
    /// Host name the request was addressed to, without port
    fn server_name(&self) -> &str;
    /// Header value by case-insensitive name
    fn header(&self, name: &str) -> Option<&str>;
}

/// Collaborator turning a raw header block into a structured request.
///
/// The framer hands over everything before the header terminator, then the
/// complete body once it has been read.
pub trait RequestBuilder {
    type Request: ServletRequest;

    /// Build a request from the raw header block.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::InvalidHeader`] if the block is malformed.
    fn init_from_raw_header(&self, raw_header: &[u8]) -> Result<Self::Request, FramingError>;

    /// Attach the body and decode it where the content type allows.
    fn parse_body(&self, request: &mut Self::Request, body: Vec<u8>);
}

/// HTTP/1.x request produced by [`HttpRequestBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Request target as sent, including query string
    pub uri: String,
    pub path_info: String,
    pub version: Version,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub server_name: String,
    pub body: Vec<u8>,
    /// Decoded `application/x-www-form-urlencoded` body fields
    pub form_params: HashMap<String, String>,
}

impl HttpRequest {
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn form_param(&self, name: &str) -> Option<&str> {
        self.form_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body decoded as JSON, if the content type says so and it parses.
    #[must_use]
    pub fn json(&self) -> Option<serde_json::Value> {
        let is_json = self
            .content_type()
            .is_some_and(|ct| ct.starts_with("application/json"));
        if !is_json || self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

impl ServletRequest for HttpRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path_info(&self) -> &str {
        &self.path_info
    }

    fn server_name(&self) -> &str {
        &self.server_name
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Default [`RequestBuilder`] for HTTP/1.0 and HTTP/1.1 request heads.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRequestBuilder;

impl RequestBuilder for HttpRequestBuilder {
    type Request = HttpRequest;

    fn init_from_raw_header(&self, raw_header: &[u8]) -> Result<HttpRequest, FramingError> {
        let raw = std::str::from_utf8(raw_header)
            .map_err(|_| FramingError::InvalidHeader("header block is not valid UTF-8".into()))?;
        let mut lines = raw.lines().filter(|l| !l.trim().is_empty());

        let request_line = lines
            .next()
            .ok_or_else(|| FramingError::InvalidHeader("missing request line".into()))?;
        let (method, uri, version) = parse_request_line(request_line)?;

        let mut headers: HashMap<String, String> = HashMap::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| FramingError::InvalidHeader(format!("malformed header line '{line}'")))?;
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(FramingError::InvalidHeader(format!("invalid header name '{name}'")));
            }
            headers
                .entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value.trim());
                })
                .or_insert_with(|| value.trim().to_string());
        }

        let (path, query, uri_host) = split_target(uri)?;
        let path_info = urlencoding::decode(path)
            .map_err(|_| FramingError::InvalidHeader(format!("path '{path}' is not valid UTF-8")))?
            .into_owned();

        let server_name = headers
            .get("host")
            .map(|h| strip_port(h).to_string())
            .or(uri_host)
            .unwrap_or_default();

        let cookies = parse_cookies(&headers);
        let query_params = query.map(parse_query_string).unwrap_or_default();

        debug!(
            method = %method,
            path = %path_info,
            server_name = %server_name,
            header_count = headers.len(),
            "Request header parsed"
        );

        Ok(HttpRequest {
            method,
            uri: uri.to_string(),
            path_info,
            version,
            headers,
            cookies,
            query_params,
            server_name,
            body: Vec::new(),
            form_params: HashMap::new(),
        })
    }

    fn parse_body(&self, request: &mut HttpRequest, body: Vec<u8>) {
        let is_form = request
            .content_type()
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if is_form {
            request.form_params = url::form_urlencoded::parse(&body)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        }
        request.body = body;
    }
}

fn parse_request_line(line: &str) -> Result<(Method, &str, Version), FramingError> {
    let mut parts = line.split_whitespace();
    let (Some(method), Some(uri), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(FramingError::InvalidHeader(format!("malformed request line '{line}'")));
    };
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| FramingError::InvalidHeader(format!("invalid method '{method}'")))?;
    let version = match version {
        "HTTP/1.1" => Version::HTTP_11,
        "HTTP/1.0" => Version::HTTP_10,
        other => {
            return Err(FramingError::InvalidHeader(format!("unsupported version '{other}'")))
        }
    };
    Ok((method, uri, version))
}

/// Split a request target into path, query and (absolute-form) host.
fn split_target(uri: &str) -> Result<(&str, Option<&str>, Option<String>), FramingError> {
    if uri.starts_with('/') || uri == "*" {
        return Ok(match uri.split_once('?') {
            Some((path, query)) => (path, Some(query), None),
            None => (uri, None, None),
        });
    }
    let parsed = url::Url::parse(uri)
        .map_err(|e| FramingError::InvalidHeader(format!("invalid request target '{uri}': {e}")))?;
    let host = parsed.host_str().map(str::to_string);
    // Slice the original string so the path stays borrowed.
    let after_scheme = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let target = after_scheme.find('/').map_or("/", |idx| &after_scheme[idx..]);
    Ok(match target.split_once('?') {
        Some((path, query)) => (path, Some(query), host),
        None => (target, None, host),
    })
}

/// Strip an optional `:port` from a Host header value.
fn strip_port(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        return host.find(']').map_or(host, |idx| &host[..=idx]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

/// Extract cookies from the lowercase header map.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter names and values.
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    path.split_once('?')
        .map(|(_, query)| parse_query_string(query))
        .unwrap_or_default()
}

fn parse_query_string(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
