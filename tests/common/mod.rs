#![allow(dead_code)]

pub mod fixtures {
    use servlet_engine::security::password_digest;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    pub const ADMIN_USER: &str = "admin";
    pub const ADMIN_PASSWORD: &str = "secret";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Application base with two applications:
    ///
    /// - `shop`: vhost `shop.example.com`, `/assets/*` -> static, `/*` ->
    ///   default, `/admin/*` secured by Basic auth
    /// - `blog`: no descriptor, default servlet only
    pub fn webapps() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let descriptor = format!(
            r#"vhosts: [shop.example.com]
servlets:
  - name: files
    class: static
  - name: default
    class: default
servlet-mappings:
  - url-pattern: /assets/*
    servlet-name: files
  - url-pattern: /*
    servlet-name: default
security:
  - url-pattern: /admin/*
    auth:
      auth-type: basic
      realm: Shop Admin
      users:
        {ADMIN_USER}: {}
"#,
            password_digest(ADMIN_PASSWORD)
        );
        write(root, "shop/WEB-INF/web.yaml", &descriptor);
        write(root, "shop/index.html", "<h1>Shop</h1>");
        write(root, "shop/assets/site.css", "body{}");
        write(root, "shop/admin/index.html", "<h1>Admin</h1>");

        write(root, "blog/index.html", "<h1>Blog</h1>");
        write(root, "blog/docs/index.html", "<h1>Docs</h1>");

        write(root, ".hidden/index.html", "nope");
        write(root, "README.txt", "not an application");
        dir
    }
}

pub mod http {
    use std::io::{self, Cursor, Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// In-memory connection: reads from a fixed input, records output.
    pub struct MockStream {
        input: Cursor<Vec<u8>>,
        pub output: Vec<u8>,
    }

    impl MockStream {
        pub fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
            }
        }

        pub fn output_text(&self) -> String {
            String::from_utf8_lossy(&self.output).to_string()
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Parsed response: status, headers (lowercase names), body.
    pub struct Parsed {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl Parsed {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k == &name.to_ascii_lowercase())
                .map(|(_, v)| v.as_str())
        }
    }

    pub fn parse_response(resp: &str) -> Parsed {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        Parsed {
            status,
            headers,
            body: body.to_string(),
        }
    }

    /// Send a raw request over TCP and read until the server closes.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }
}

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}
