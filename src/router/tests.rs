use http::Method;

use super::Router;
use crate::dispatcher::{HandlerRequest, HandlerResponse, MatchKind};
use crate::error::{PatternError, RouteError};

fn ok(_req: HandlerRequest) -> HandlerResponse {
    HandlerResponse::text(200, "ok")
}

fn prefixes_of(router: &Router) -> Vec<&str> {
    router.prefixes().iter().map(|p| &**p).collect()
}

#[test]
fn test_root_prefix() {
    let router = Router::default();
    assert_eq!(router.prefix(), "/");
    assert_eq!(prefixes_of(&router), vec!["/"]);
}

#[test]
fn test_nested_groups_join_prefixes() {
    let router = Router::default();
    let hello = router.group("hello");
    let world = hello.group("/world/");
    assert_eq!(prefixes_of(&hello), vec!["/", "/hello"]);
    assert_eq!(prefixes_of(&world), vec!["/", "/hello", "/hello/world"]);
    assert_eq!(world.prefix(), "/hello/world");
}

#[test]
fn test_group_routes_keep_their_path() {
    let router = Router::default();
    let hello = router.group("/hello");
    hello.get("/hello/world", ok).unwrap();
    hello.get("items", ok).unwrap();

    let dispatcher = router.build();
    let paths: Vec<String> = dispatcher.routes().into_iter().map(|(_, p)| p).collect();
    assert_eq!(paths, vec!["/hello/world", "/items"]);

    let matched = dispatcher.resolve(&Method::GET, "/hello/world").unwrap();
    assert_eq!(matched.kind, MatchKind::Exact);
    let prefixes: Vec<&str> = matched.group_prefixes.iter().map(|p| &**p).collect();
    assert_eq!(prefixes, vec!["/", "/hello"]);
    assert!(dispatcher.resolve(&Method::GET, "/hello/hello/world").is_none());
}

#[test]
fn test_registration_errors() {
    let router = Router::default();
    assert!(matches!(router.add("", "/x", ok), Err(RouteError::EmptyMethod)));
    assert!(matches!(
        router.add("GE T", "/x", ok),
        Err(RouteError::InvalidMethod { .. })
    ));
    assert!(matches!(router.get("", ok), Err(RouteError::EmptyPath)));
    assert!(matches!(
        router.get("/user/{name", ok),
        Err(RouteError::Pattern {
            source: PatternError::UnbalancedBrace { .. },
            ..
        })
    ));
    assert!(matches!(
        router.get("/user/{name:}", ok),
        Err(RouteError::Pattern {
            source: PatternError::EmptyRegex { .. },
            ..
        })
    ));
    assert!(router.build().routes().is_empty());
}

#[test]
fn test_custom_method() {
    let router = Router::default();
    router.add("PURGE", "/cache", ok).unwrap();
    let dispatcher = router.build();
    let method = Method::from_bytes(b"PURGE").unwrap();
    assert!(dispatcher.resolve(&method, "/cache").is_some());
    assert!(dispatcher.resolve(&Method::GET, "/cache").is_none());
}

#[test]
fn test_reregistration_replaces_handler() {
    let router = Router::default();
    router.get("/v", |_req| HandlerResponse::text(200, "one")).unwrap();
    router.get("/v", |_req| HandlerResponse::text(200, "two")).unwrap();

    let dispatcher = router.build();
    assert_eq!(dispatcher.routes().len(), 1);
    let resp = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/v"));
    assert_eq!(resp.body_str(), "two");
}

#[test]
fn test_build_is_a_snapshot() {
    let router = Router::default();
    router.get("/a", ok).unwrap();
    let first = router.build();
    router.get("/b", ok).unwrap();

    assert!(first.resolve(&Method::GET, "/b").is_none());
    assert!(router.build().resolve(&Method::GET, "/b").is_some());
}

#[test]
fn test_leaf_records_group_prefixes() {
    let router = Router::default();
    router
        .group("/admin")
        .group("/users")
        .get("/admin/users/:id", ok)
        .unwrap();

    let dispatcher = router.build();
    let matched = dispatcher.resolve(&Method::GET, "/admin/users/7").unwrap();
    assert_eq!(matched.kind, MatchKind::Fallback);
    assert_eq!(matched.route, "/admin/users/:id");
    let prefixes: Vec<&str> = matched.group_prefixes.iter().map(|p| &**p).collect();
    assert_eq!(prefixes, vec!["/", "/admin", "/admin/users"]);
    assert_eq!(matched.get_path_param("id"), Some("7"));
}

#[test]
fn test_helpers_are_shared_with_dispatcher() {
    let router = Router::default();
    router.get("/hex/:hex", ok).unwrap();
    let dispatcher = router.build();

    router.register_helper("hex", "[0-9a-f]+").unwrap();
    assert!(dispatcher.matcher().helpers().contains("hex"));
    assert!(dispatcher.resolve(&Method::GET, "/hex/beef").is_some());
    assert!(dispatcher.resolve(&Method::GET, "/hex/xyz").is_none());
}
