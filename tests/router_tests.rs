use std::sync::Arc;

use http::Method;
use vi_router::router::{PathTree, Router};
use vi_router::{HandlerRequest, HandlerResponse, MatchKind, RouteError, RouterConfig};

fn root_prefixes() -> Arc<[Arc<str>]> {
    Arc::from(vec![Arc::<str>::from("/")])
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

#[test]
fn test_tree_size_for_path_pairs() {
    let pairs = [
        ("/hello", "/hello2"),
        ("/hello", "/world"),
        ("/user/:name", "/user/:name/:id"),
        ("/user/:name/:id", "/user/me"),
        ("/a", "/b"),
        ("/api/v1/items", "/api/v2/items"),
        ("/static/*", "/status"),
    ];
    for (p1, p2) in pairs {
        let mut tree = PathTree::new();
        tree.add(p1, 1, root_prefixes());
        tree.add(p2, 2, root_prefixes());

        let expected = p1.chars().count() + p2.chars().count() - common_prefix_len(p1, p2);
        assert_eq!(tree.size(), expected, "size after adding {p1} and {p2}");

        for (path, handler) in [(p1, 1), (p2, 2)] {
            let found = tree.find(path);
            assert_eq!(found.len(), 1, "find({path})");
            let route = found[0].route().unwrap();
            assert_eq!(route.path, path);
            assert_eq!(route.handler, handler);
        }
    }
}

#[test]
fn test_tree_reregistration_is_idempotent() {
    let mut tree = PathTree::new();
    tree.add("/users/:id", "first", root_prefixes());
    tree.add("/users", "list", root_prefixes());
    let size = tree.size();

    tree.add("/users/:id", "second", root_prefixes());
    assert_eq!(tree.size(), size);
    assert_eq!(tree.len(), 2);

    let leaves: Vec<(&str, &str)> = tree
        .leaves()
        .into_iter()
        .map(|r| (r.path.as_str(), r.handler))
        .collect();
    assert_eq!(leaves, vec![("/users/:id", "second"), ("/users", "list")]);
}

#[test]
fn test_tree_find_on_prefix_collects_leaves_below() {
    let mut tree = PathTree::new();
    tree.add("/hello/:name", (), root_prefixes());
    tree.add("/hello/world/:id", (), root_prefixes());
    tree.add("/bye", (), root_prefixes());

    let found: Vec<&str> = tree
        .find("/hello/")
        .into_iter()
        .filter_map(|n| n.path())
        .collect();
    assert_eq!(found, vec!["/hello/:name", "/hello/world/:id"]);
    assert!(tree.find("/nope").is_empty());
}

#[test]
fn test_routes_lists_methods_and_paths() {
    let router = Router::default();
    let ok = |_req: HandlerRequest| HandlerResponse::text(200, "ok");
    router.post("/items", ok).unwrap();
    router.get("/items", ok).unwrap();
    router.get("/items/:id", ok).unwrap();
    router.delete("/items/:id", ok).unwrap();

    let routes = router.build().routes();
    assert_eq!(
        routes,
        vec![
            (Method::DELETE, "/items/:id".to_string()),
            (Method::GET, "/items".to_string()),
            (Method::GET, "/items/:id".to_string()),
            (Method::POST, "/items".to_string()),
        ]
    );
}

#[test]
fn test_every_shorthand_registers_its_method() {
    let router = Router::default();
    let ok = |_req: HandlerRequest| HandlerResponse::text(200, "ok");
    router.get("/r", ok).unwrap();
    router.post("/r", ok).unwrap();
    router.put("/r", ok).unwrap();
    router.delete("/r", ok).unwrap();
    router.patch("/r", ok).unwrap();
    router.head("/r", ok).unwrap();
    router.options("/r", ok).unwrap();

    let dispatcher = router.build();
    for method in [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::HEAD,
        Method::OPTIONS,
    ] {
        let found = dispatcher.resolve(&method, "/r");
        assert_eq!(found.map(|m| m.kind), Some(MatchKind::Exact), "{method}");
    }
    assert!(dispatcher.resolve(&Method::TRACE, "/r").is_none());
}

#[test]
fn test_nested_group_routes() {
    let router = Router::default();
    let hello = router.group("/hello");
    let world = hello.group("world");
    hello
        .get("/hello", |_req: HandlerRequest| HandlerResponse::text(200, "hello"))
        .unwrap();
    world
        .get("/hello/world/:n", |req: HandlerRequest| {
            HandlerResponse::text(200, format!("world {}", req.param("n")))
        })
        .unwrap();

    let dispatcher = router.build();
    let resp = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/hello"));
    assert_eq!(resp.body_str(), "hello");
    let resp = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/hello/world/2"));
    assert_eq!(resp.body_str(), "world 2");
    let resp = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/world/2"));
    assert_eq!(resp.status, 404);
}

#[test]
fn test_path_without_leading_slash() {
    let router = Router::default();
    router
        .get("user", |_req: HandlerRequest| HandlerResponse::text(200, "user"))
        .unwrap();
    let dispatcher = router.build();
    assert_eq!(dispatcher.routes(), vec![(Method::GET, "/user".to_string())]);
    let resp = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/user"));
    assert_eq!(resp.body_str(), "user");
}

#[test]
fn test_invalid_route_leaves_table_untouched() {
    let router = Router::default();
    router
        .get("/ok", |_req: HandlerRequest| HandlerResponse::text(200, "ok"))
        .unwrap();
    let err = router
        .get("/bad/{id", |_req: HandlerRequest| HandlerResponse::text(200, "bad"))
        .unwrap_err();
    assert!(matches!(err, RouteError::Pattern { .. }));
    assert!(err.to_string().contains("/bad/{id"));
    assert_eq!(router.build().routes().len(), 1);
}

#[test]
fn test_router_from_config() {
    let config = RouterConfig::from_toml_str("not_found_body = \"nope\"").unwrap();
    let router = Router::new(config);
    assert_eq!(router.config().not_found_body, "nope");

    let resp = router
        .build()
        .dispatch(HandlerRequest::new(Method::GET, "/missing"));
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body_str(), "nope");
}
