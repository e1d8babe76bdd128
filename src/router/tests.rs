use super::core::{pattern_to_regex, rewrite_wildcard};
use super::{RouteError, RouteTable};

#[test]
fn test_root_path() {
    let re = pattern_to_regex("/", 0).unwrap();
    assert!(re.is_match("/"));
    assert!(!re.is_match("/a"));
}

#[test]
fn test_trailing_wildcard_is_rewritten_with_index() {
    assert_eq!(rewrite_wildcard("/admin/*", 3), "/admin/{placeholder_3}");
    assert_eq!(rewrite_wildcard("/*", 0), "/{placeholder_0}");
    assert_eq!(rewrite_wildcard("/index.do", 1), "/index.do");
}

#[test]
fn test_wildcard_absorbs_multiple_segments() {
    let re = pattern_to_regex("/files/{placeholder_0}", 0).unwrap();
    assert!(re.is_match("/files/a/b/c.txt"));
    assert!(re.is_match("/files/"));
    assert!(!re.is_match("/files"));
}

#[test]
fn test_named_placeholder_is_single_segment() {
    let re = pattern_to_regex("/items/{id}", 0).unwrap();
    assert!(re.is_match("/items/123"));
    assert!(!re.is_match("/items/123/edit"));
}

#[test]
fn test_literal_characters_are_escaped() {
    let re = pattern_to_regex("/index.php", 0).unwrap();
    assert!(re.is_match("/index.php"));
    assert!(!re.is_match("/indexXphp"));
}

#[test]
fn test_insertion_order_breaks_ties() {
    let table = RouteTable::build(vec![("/*", "first"), ("/app/*", "second")]).unwrap();
    let m = table.match_path("/app/x").unwrap();
    assert_eq!(*m.payload(), "first");
    assert_eq!(m.route.index(), 0);
}

#[test]
fn test_wildcard_capture_names_are_unique() {
    let table = RouteTable::build(vec![("/a/*", 'a'), ("/b/*", 'b')]).unwrap();
    let names: Vec<String> = table
        .iter()
        .flat_map(|r| r.param_names().iter().map(|n| n.to_string()))
        .collect();
    assert_eq!(names, vec!["placeholder_0", "placeholder_1"]);

    let m = table.match_path("/b/deep/er").unwrap();
    assert_eq!(m.get_param("placeholder_1"), Some("deep/er"));
}

#[test]
fn test_fallback_prefers_full_path() {
    let table = RouteTable::build(vec![("/a/{x}", "ax"), ("/a/b/{y}", "aby")]).unwrap();

    let found = table.match_with_fallback("/a/b/c/d").unwrap();
    assert_eq!(found.path, "/a/b/c");
    assert_eq!(*found.route_match.payload(), "aby");

    let found = table.match_with_fallback("/a/x/y").unwrap();
    assert_eq!(found.path, "/a/x");
    assert_eq!(*found.route_match.payload(), "ax");
}

#[test]
fn test_fallback_exhaustion_counts_every_truncation() {
    let table = RouteTable::build(vec![("/other", ())]).unwrap();
    let last = table.match_with_fallback("/x/y/z").unwrap_err();
    assert_eq!(last, "");
    // "/x/y/z", "/x/y", "/x"
    assert_eq!(table.match_attempts(), 3);
}

#[test]
fn test_fallback_without_slash_attempts_once() {
    let table = RouteTable::build(vec![("/other", ())]).unwrap();
    assert_eq!(table.match_with_fallback("plain").unwrap_err(), "plain");
    assert_eq!(table.match_attempts(), 1);
}

#[test]
fn test_invalid_pattern_is_reported_at_build() {
    let err = RouteTable::build(vec![("/a/{id}/b/{id}", ())]).unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));

    let err = RouteTable::build(vec![("/a/{open", ())]).unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
}

#[test]
fn test_with_route_appends_and_keeps_numbering() {
    let table = RouteTable::build(vec![("/a/*", 1)]).unwrap();
    let extended = table.with_route("/b/*", 2).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(extended.len(), 2);
    let last = extended.iter().last().unwrap();
    assert_eq!(last.index(), 1);
    assert_eq!(last.rewritten_pattern(), "/b/{placeholder_1}");
}
