use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::StatusCode;
use trellis::{Middleware, Next, Request, Response, RouterBuilder, Routes};

type Log = Arc<Mutex<Vec<String>>>;

fn request(method: &str, uri: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
        .into()
}

fn body(res: &Response) -> &str {
    std::str::from_utf8(res.body()).unwrap()
}

async fn echo_params(req: Request) -> Response {
    let mut pairs: Vec<_> = req.params().iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    Response::text(pairs.join(","))
}

async fn me(_req: Request) -> &'static str {
    "me"
}

fn tracer(log: Log, name: &'static str) -> impl Middleware {
    move |req: Request, next: Next| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("{name} pre"));
            let res = next.run(req).await;
            log.lock().unwrap().push(format!("{name} post"));
            res
        }
    }
}

fn tag(value: &'static str) -> impl Middleware {
    move |req: Request, next: Next| async move {
        let res = next.run(req).await;
        let tags = match res.header("x-tag") {
            Some(inner) => format!("{inner},{value}"),
            None => value.to_owned(),
        };
        Response::builder()
            .status(res.status_code())
            .header("x-tag", &tags)
            .text(String::from_utf8_lossy(res.body()).into_owned())
    }
}

#[tokio::test]
async fn literal_route_beats_overlapping_pattern() {
    let mut app = RouterBuilder::new();
    app.get("/users/{id:[0-9]+}", echo_params).get("/users/me", me);
    let router = app.build();

    assert_eq!(body(&router.dispatch(request("GET", "/users/me")).await), "me");
    assert_eq!(body(&router.dispatch(request("GET", "/users/42")).await), "id=42");
}

#[tokio::test]
async fn non_matching_dynamic_segment_is_not_found() {
    let mut app = RouterBuilder::new();
    app.get("/users/{id:[0-9]+}", echo_params);
    let router = app.build();

    let res = router.dispatch(request("GET", "/users/abc")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn partial_literal_walk_still_tries_patterns() {
    let mut app = RouterBuilder::new();
    app.get("/a/b/c", me).get("/a/:x", echo_params);
    let router = app.build();

    // `/a/b` exists in the trie only as a step toward `/a/b/c`.
    let res = router.dispatch(request("GET", "/a/b")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(body(&res), "x=b");
    assert_eq!(body(&router.dispatch(request("GET", "/a/b/c")).await), "me");
}

#[tokio::test]
async fn colon_shorthand_parameters() {
    let mut app = RouterBuilder::new();
    app.get("/items/:id", echo_params).get("/tags/:name", echo_params);
    let router = app.build();

    assert_eq!(body(&router.dispatch(request("GET", "/items/7")).await), "id=7");
    assert_eq!(
        router.dispatch(request("GET", "/items/seven")).await.status_code(),
        StatusCode::NOT_FOUND,
    );
    assert_eq!(body(&router.dispatch(request("GET", "/tags/rust_lang")).await), "name=rust_lang");
}

#[tokio::test]
async fn middleware_runs_as_an_onion() {
    let log = Log::default();
    let handler_log = Arc::clone(&log);

    let mut app = RouterBuilder::new();
    app.use_middleware(tracer(Arc::clone(&log), "A"))
        .use_middleware(tracer(Arc::clone(&log), "B"))
        .get("/", move |_req: Request| {
            let log = Arc::clone(&handler_log);
            async move {
                log.lock().unwrap().push("handler".to_owned());
                "done"
            }
        });
    let router = app.build();

    let res = router.dispatch(request("GET", "/")).await;
    assert_eq!(body(&res), "done");
    assert_eq!(
        *log.lock().unwrap(),
        ["A pre", "B pre", "handler", "B post", "A post"],
    );
}

#[tokio::test]
async fn groups_inherit_prefix_and_middleware_but_stay_isolated() {
    let mut app = RouterBuilder::new();
    app.use_middleware(tag("root"));
    app.group("/admin").use_middleware(tag("admin")).get("/stats", me);
    app.group("/public").get("/stats", me);
    let router = app.build();

    let admin = router.dispatch(request("GET", "/admin/stats")).await;
    assert_eq!(body(&admin), "me");
    // Inner middleware tags first on the way out.
    assert_eq!(admin.header("x-tag"), Some("admin,root"));

    let public = router.dispatch(request("GET", "/public/stats")).await;
    assert_eq!(public.header("x-tag"), Some("root"));

    let bare = router.dispatch(request("GET", "/stats")).await;
    assert_eq!(bare.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn middleware_added_later_does_not_reach_earlier_routes() {
    let mut app = RouterBuilder::new();
    app.get("/early", me).use_middleware(tag("late")).get("/late", me);
    let router = app.build();

    assert_eq!(router.dispatch(request("GET", "/early")).await.header("x-tag"), None);
    assert_eq!(router.dispatch(request("GET", "/late")).await.header("x-tag"), Some("late"));
}

#[tokio::test]
async fn custom_not_found_runs_inside_root_middleware() {
    let mut app = RouterBuilder::new();
    app.use_middleware(tag("root"))
        .get("/users", me)
        .not_found(|req: Request| async move {
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .text(format!("no {}", req.path()))
        });
    let router = app.build();

    let res = router.dispatch(request("GET", "/nowhere")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(body(&res), "no /nowhere");
    assert_eq!(res.header("x-tag"), Some("root"));

    // A method with no trie at all takes the same path.
    let res = router.dispatch(request("PUT", "/users")).await;
    assert_eq!(body(&res), "no /users");
}

#[tokio::test]
async fn unknown_method_is_not_found() {
    let mut app = RouterBuilder::new();
    app.any("/cache", me);
    let router = app.build();

    let res = router.dispatch(request("PURGE", "/cache")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(body(&router.dispatch(request("TRACE", "/cache")).await), "me");
}

#[tokio::test]
async fn malformed_pattern_fails_the_request() {
    let mut app = RouterBuilder::new();
    app.get("/broken/{id:(}", me).get("/fine", me);
    let router = app.build();

    let res = router.dispatch(request("GET", "/broken/1")).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(&router.dispatch(request("GET", "/fine")).await), "me");
}

#[tokio::test]
async fn handlers_read_query_and_cookies() {
    let mut app = RouterBuilder::new();
    app.get("/posts/:slug", |req: Request| async move {
        let slug = req.param("slug").unwrap_or_default().to_owned();
        let lang = req.query("lang").unwrap_or_default();
        let theme = req.cookie("theme").unwrap_or_default();
        Response::text(format!("{slug}/{lang}/{theme}"))
    });
    let router = app.build();

    let req: Request = http::Request::builder()
        .uri("/posts/hello?lang=fr")
        .header("cookie", "theme=dark")
        .body(Bytes::new())
        .unwrap()
        .into();
    assert_eq!(body(&router.dispatch(req).await), "hello/fr/dark");
}

#[tokio::test]
async fn static_mount_serves_files() {
    let dir = std::env::temp_dir().join(format!("trellis-static-{}", std::process::id()));
    std::fs::create_dir_all(dir.join("css")).unwrap();
    std::fs::write(dir.join("css/site.css"), "body{}").unwrap();
    std::fs::write(dir.join("index.html"), "<h1>hi</h1>").unwrap();

    let mut app = RouterBuilder::new();
    app.group("/ui").static_files("/assets/{file:.+}", &dir);
    let router = app.build();

    let res = router.dispatch(request("GET", "/ui/assets/css/site.css")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("text/css"));
    assert_eq!(body(&res), "body{}");

    let res = router.dispatch(request("HEAD", "/ui/assets/index.html")).await;
    assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));

    let res = router.dispatch(request("GET", "/ui/assets/missing.txt")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = router.dispatch(request("GET", "/ui/assets/..%2f..%2fetc/passwd")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    std::fs::remove_dir_all(&dir).unwrap();
}
