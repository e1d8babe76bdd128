use super::{Servlet, ServletConfig};
use crate::locator::Resolution;
use crate::server::{HttpRequest, ServletResponse};
use http::Method;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};

/// File served for a directory request.
pub const INDEX_FILE: &str = "index.html";

/// Serves files below a base directory.
///
/// The base is the application's webapp directory, or the `root` init
/// parameter resolved against it.
#[derive(Debug, Clone)]
pub struct StaticResourceServlet {
    base_dir: PathBuf,
}

impl StaticResourceServlet {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ServletConfig) -> Self {
        match config.init_param("root") {
            Some(root) => Self::new(config.webapp_path.join(root)),
            None => Self::new(&config.webapp_path),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a URL path below the base directory, rejecting `..` and absolute
    /// components.
    pub(crate) fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        }
    }

    /// Read the file for `url_path`; directories resolve to their index file.
    ///
    /// # Errors
    ///
    /// `NotFound` for traversal attempts and missing files, otherwise the
    /// underlying read error.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let mut path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if path.is_dir() {
            path.push(INDEX_FILE);
        }
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }

    pub(crate) fn serve(&self, request: &HttpRequest, url_path: &str) -> ServletResponse {
        if request.method != Method::GET && request.method != Method::HEAD {
            return ServletResponse::new(405).with_header("Allow", "GET, HEAD");
        }
        match self.load(url_path) {
            Ok((bytes, content_type)) => {
                debug!(path = %url_path, bytes = bytes.len(), "Static resource served");
                let response = ServletResponse::new(200).with_header("Content-Type", content_type);
                if request.method == Method::HEAD {
                    response
                } else {
                    response.with_body(bytes)
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => ServletResponse::not_found(url_path),
            Err(e) => {
                error!(path = %url_path, error = %e, "Failed to read static resource");
                ServletResponse::text(500, "Internal Server Error")
            }
        }
    }
}

impl Servlet for StaticResourceServlet {
    fn service(&self, request: &HttpRequest, resolution: &Resolution) -> ServletResponse {
        self.serve(request, &resolution.request_path)
    }

    fn servlet_info(&self) -> &str {
        "StaticResourceServlet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_path_prevents_traversal() {
        let sf = StaticResourceServlet::new("webapp");
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("/a/../../etc/passwd").is_none());
        assert_eq!(sf.map_path("/css/site.css"), Some(PathBuf::from("webapp/css/site.css")));
    }

    #[test]
    fn test_load_file_and_directory_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join(INDEX_FILE), "<h1>Docs</h1>").unwrap();

        let sf = StaticResourceServlet::new(dir.path());
        let (bytes, ct) = sf.load("/hello.txt").unwrap();
        assert_eq!(ct, "text/plain");
        assert_eq!(bytes, b"Hello\n");

        let (bytes, ct) = sf.load("/docs/").unwrap();
        assert_eq!(ct, "text/html");
        assert_eq!(bytes, b"<h1>Docs</h1>");

        let err = sf.load("/missing.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_root_init_param() {
        let mut config = ServletConfig {
            webapp_path: PathBuf::from("/srv/shop"),
            ..ServletConfig::default()
        };
        config.init_params.insert("root".into(), "public".into());
        let sf = StaticResourceServlet::from_config(&config);
        assert_eq!(sf.base_dir(), Path::new("/srv/shop/public"));
    }
}
