use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use http::Method;
use serde_json::json;
use vi_router::{Dispatcher, HandlerRequest, HandlerResponse, MatchKind, Router};

fn named(name: &'static str) -> impl Fn(HandlerRequest) -> HandlerResponse + Send + Sync {
    move |_req| HandlerResponse::text(200, name)
}

fn get(dispatcher: &Dispatcher, path: &str) -> HandlerResponse {
    dispatcher.dispatch(HandlerRequest::new(Method::GET, path))
}

#[test]
fn test_exact_match_wins_over_pattern() {
    let router = Router::default();
    router.get("/user/:name", named("by-name")).unwrap();
    router.get("/user/me", named("me")).unwrap();
    let dispatcher = router.build();

    let found = dispatcher.resolve(&Method::GET, "/user/me").unwrap();
    assert_eq!(found.kind, MatchKind::Exact);
    assert!(found.path_params.is_empty());
    assert_eq!(get(&dispatcher, "/user/me").body_str(), "me");

    let found = dispatcher.resolve(&Method::GET, "/user/anh").unwrap();
    assert_eq!(found.kind, MatchKind::Fallback);
    assert_eq!(found.route, "/user/:name");
    assert_eq!(get(&dispatcher, "/user/anh").body_str(), "by-name");
}

#[test]
fn test_static_prefix_of_dynamic_route() {
    let router = Router::default();
    router.get("/hello", named("static")).unwrap();
    router
        .get("/hello/:name", |req: HandlerRequest| {
            HandlerResponse::text(200, format!("hi {}", req.param("name")))
        })
        .unwrap();
    let dispatcher = router.build();

    assert_eq!(get(&dispatcher, "/hello").body_str(), "static");
    assert_eq!(get(&dispatcher, "/hello/anh").body_str(), "hi anh");
    assert_eq!(get(&dispatcher, "/hello/").body_str(), "static");
}

#[test]
fn test_fallback_follows_registration_order() {
    let router = Router::default();
    router.get("/item/:id", named("numeric")).unwrap();
    router.get("/item/{slug:[a-z0-9]+}", named("slug")).unwrap();
    let dispatcher = router.build();
    assert_eq!(get(&dispatcher, "/item/42").body_str(), "numeric");
    assert_eq!(get(&dispatcher, "/item/abc").body_str(), "slug");

    let router = Router::default();
    router.get("/item/{slug:[a-z0-9]+}", named("slug")).unwrap();
    router.get("/item/:id", named("numeric")).unwrap();
    let dispatcher = router.build();
    assert_eq!(get(&dispatcher, "/item/42").body_str(), "slug");
}

#[test]
fn test_reregistration_keeps_scan_position() {
    let router = Router::default();
    router.get("/a/:x", named("first")).unwrap();
    router.get("/a/{y:[0-9]+}", named("second")).unwrap();
    router.get("/a/:x", named("first-again")).unwrap();
    let dispatcher = router.build();
    assert_eq!(get(&dispatcher, "/a/1").body_str(), "first-again");
}

#[test]
fn test_params_and_query_reach_handler() {
    let router = Router::default();
    router
        .get("/user/:name/{id:[0-9]+}", |req: HandlerRequest| {
            HandlerResponse::json(
                200,
                &json!({
                    "name": req.param("name"),
                    "id": req.get_path_param("id"),
                    "missing": req.param("missing"),
                    "page": req.get_query_param("page"),
                }),
            )
        })
        .unwrap();
    let dispatcher = router.build();

    let resp = get(&dispatcher, "/user/anh/101?page=3");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("content-type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
    assert_eq!(
        body,
        json!({ "name": "anh", "id": "101", "missing": "", "page": "3" })
    );
}

#[test]
fn test_method_mismatch_is_not_found() {
    let router = Router::default();
    router.get("/only-get", named("get")).unwrap();
    let dispatcher = router.build();

    let resp = dispatcher.dispatch(HandlerRequest::new(Method::POST, "/only-get"));
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body_str(), "404 Not Found");
}

#[test]
fn test_default_not_found() {
    let router = Router::default();
    router.get("/hello", named("hello")).unwrap();
    let dispatcher = router.build();

    assert!(dispatcher.resolve(&Method::GET, "/world").is_none());
    let resp = get(&dispatcher, "/world");
    assert_eq!(resp.status, 404);
    assert_eq!(resp.get_header("content-type"), Some("text/plain; charset=utf-8"));
    assert_eq!(resp.body_str(), "404 Not Found");
}

#[test]
fn test_custom_not_found() {
    let router = Router::default();
    let group = router.group("/hello");
    group.get("/hello/world", named("world")).unwrap();
    router.not_found(|req: HandlerRequest| {
        HandlerResponse::text(404, format!("not found handler called for {}", req.path))
    });
    let dispatcher = router.build();

    let resp = get(&dispatcher, "/notfound");
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body_str(), "not found handler called for /notfound");
}

#[test]
fn test_root_route() {
    let router = Router::default();
    router.get("/", named("root")).unwrap();
    router.get("/docs", named("docs")).unwrap();
    let dispatcher = router.build();

    let found = dispatcher.resolve(&Method::GET, "/").unwrap();
    assert_eq!(found.kind, MatchKind::Exact);
    assert_eq!(get(&dispatcher, "/").body_str(), "root");
    assert_eq!(get(&dispatcher, "/docs").body_str(), "docs");
}

#[test]
fn test_wildcard_route_catches_everything_else() {
    let router = Router::default();
    router.get("/api/ping", named("pong")).unwrap();
    router.get("/*", named("spa")).unwrap();
    let dispatcher = router.build();

    assert_eq!(get(&dispatcher, "/api/ping").body_str(), "pong");
    assert_eq!(get(&dispatcher, "/deep/link/42").body_str(), "spa");
    assert_eq!(get(&dispatcher, "/").body_str(), "spa");
}

#[test]
fn test_handle_http_request() {
    let router = Router::default();
    router
        .post("/echo", |req: HandlerRequest| {
            let mut resp = HandlerResponse::new(201, Default::default(), req.body.clone());
            resp.set_header("x-seen", req.get_header("x-token").unwrap_or("-").to_string());
            resp
        })
        .unwrap();
    let dispatcher = router.build();

    let req = http::Request::builder()
        .method("POST")
        .uri("/echo")
        .header("X-Token", "t1")
        .body(b"payload".to_vec())
        .unwrap();
    let resp = dispatcher.handle(req).unwrap();
    assert_eq!(resp.status(), http::StatusCode::CREATED);
    assert_eq!(resp.headers()["x-seen"], "t1");
    assert_eq!(resp.body(), b"payload");
}

#[test]
fn test_concurrent_dispatch() {
    const THREADS: usize = 8;
    const REQUESTS: usize = 50;

    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::default();
    let counter = Arc::clone(&calls);
    router
        .get("/orders/{id:[0-9]+}/lines/:line", move |req: HandlerRequest| {
            counter.fetch_add(1, Ordering::Relaxed);
            HandlerResponse::text(200, format!("{}-{}", req.param("id"), req.param("line")))
        })
        .unwrap();
    let dispatcher = router.build();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let dispatcher = &dispatcher;
            scope.spawn(move || {
                for i in 0..REQUESTS {
                    let resp = get(dispatcher, &format!("/orders/{t}/lines/l{i}"));
                    assert_eq!(resp.status, 200);
                    assert_eq!(resp.body_str(), format!("{t}-l{i}"));
                }
            });
        }
    });

    assert_eq!(calls.load(Ordering::Relaxed), THREADS * REQUESTS);
    assert_eq!(dispatcher.matcher().cache().len(), 1);
}

#[test]
fn test_dispatcher_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Dispatcher>();
    assert_send_sync::<Router>();
}
