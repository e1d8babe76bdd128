use super::*;
use crate::application::{ApplicationContext, ServletMapping};
use crate::security::AuthConfig;
use crate::server::{HttpRequest, HttpRequestBuilder, RequestBuilder, ServletResponse};
use crate::servlet::Servlet;
use serde_json::json;
use std::collections::BTreeMap;

struct Named(&'static str);

impl Servlet for Named {
    fn service(&self, _: &HttpRequest, _: &Resolution) -> ServletResponse {
        ServletResponse::text(200, self.0)
    }

    fn servlet_info(&self) -> &str {
        self.0
    }
}

fn application(mappings: &[(&str, &'static str)]) -> Application {
    let mut app = Application::new("shop", "/srv/shop", Arc::new(ApplicationContext::new()))
        .with_vhost("shop.example.com");
    for (pattern, name) in mappings {
        if app.servlets().servlet(name).is_none() {
            app.add_servlet(*name, Arc::new(Named(name)), BTreeMap::new());
        }
        app.servlets().add_mapping(ServletMapping::new(*pattern, *name));
    }
    app
}

fn request(host: &str, path: &str) -> HttpRequest {
    HttpRequestBuilder
        .init_from_raw_header(format!("GET {path} HTTP/1.1\r\nHost: {host}").as_bytes())
        .unwrap()
}

#[test]
fn test_normalize_strips_whole_segment_only() {
    assert_eq!(normalize_path("shop", "/shop/items", false), "/items");
    assert_eq!(normalize_path("shop", "/shop", false), "/");
    assert_eq!(normalize_path("shop", "/shopping/cart", false), "/shopping/cart");
    assert_eq!(normalize_path("shop", "//shop//items", false), "/items");
    assert_eq!(normalize_path("shop", "/shop/items", true), "/shop/items");
    assert_eq!(normalize_path("shop", "", true), "/");
}

#[test]
fn test_unknown_servlet_is_construction_error() {
    let app = application(&[("/*", "default")]);
    app.servlets().add_mapping(ServletMapping::new("/api/*", "api"));
    let err = ServletLocator::new(Arc::new(app)).unwrap_err();
    assert_eq!(
        err,
        RouteError::UnknownServlet {
            pattern: "/api/*".into(),
            servlet_name: "api".into()
        }
    );
}

#[test]
fn test_not_found_reports_request_path() {
    let locator = ServletLocator::new(Arc::new(application(&[("/api/{v}", "api")]))).unwrap();
    let err = locator.locate(&request("localhost", "/shop/docs/intro")).unwrap_err();
    assert_eq!(
        err,
        LocateError::NotFound {
            path: "/docs/intro".into(),
            last_attempt: String::new()
        }
    );
    assert_eq!(err.status_code(), 404);
    assert!(err.to_string().contains("/docs/intro"));
}

#[test]
fn test_extra_path_below_match() {
    let locator = ServletLocator::new(Arc::new(application(&[("/files/*", "files")]))).unwrap();
    let resolution = locator.locate(&request("shop.example.com", "/files/a/b.txt")).unwrap();
    assert_eq!(resolution.matched_path, "/files/a/b.txt");
    assert_eq!(resolution.extra_path(), "");

    let locator = ServletLocator::new(Arc::new(application(&[("/files", "files")]))).unwrap();
    let resolution = locator.locate(&request("shop.example.com", "/files/a/b.txt")).unwrap();
    assert_eq!(resolution.matched_path, "/files");
    assert_eq!(resolution.extra_path(), "/a/b.txt");
}

#[test]
fn test_cached_name_without_servlet_is_rematched() {
    let app = Arc::new(application(&[("/*", "default")]));
    app.context()
        .set_attribute(
            "shop.servletCache",
            json!({"/index.html": {"servlet-name": "ghost", "matched-path": "/index.html"}}),
        );
    let locator = ServletLocator::new(Arc::clone(&app)).unwrap();

    let resolution = locator.locate(&request("localhost", "/shop/index.html")).unwrap();
    assert_eq!(resolution.servlet_name, "default");
    assert!(!resolution.from_cache);
    assert_eq!(app.cache().get("/index.html").as_deref(), Some("default"));
}

#[test]
fn test_invalid_secured_pattern_leaves_table_unchanged() {
    let locator = ServletLocator::new(Arc::new(application(&[("/*", "default")]))).unwrap();
    let err = locator
        .register_secured_url(SecuredUrlConfig::new("/admin/{", AuthConfig::basic("Admin")))
        .unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
    assert!(locator.secured_routes().is_empty());
    assert!(locator.application().servlets().secured_urls().is_empty());
}

#[test]
fn test_reload_routes_picks_up_mappings_and_clears_cache() {
    let app = Arc::new(application(&[("/static/*", "files"), ("/v1/*", "api")]));
    let locator = ServletLocator::new(Arc::clone(&app)).unwrap();

    locator.locate(&request("localhost", "/shop/static/a.css")).unwrap();
    assert_eq!(app.cache().len(), 1);
    assert!(locator.locate(&request("localhost", "/shop/v2/users")).is_err());

    app.servlets().add_mapping(ServletMapping::new("/v2/*", "api"));
    locator.reload_routes().unwrap();
    assert!(app.cache().is_empty());
    assert_eq!(locator.routes().len(), 3);

    let resolution = locator.locate(&request("localhost", "/shop/v2/users")).unwrap();
    assert_eq!(resolution.servlet_name, "api");
    assert!(!resolution.from_cache);
}
