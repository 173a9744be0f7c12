//! Minimal trellis example: literal and dynamic routes, a group with its own
//! middleware, and a static mount.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/me
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/users/abc          # 404, id must be numeric
//!   curl -X DELETE -H 'x-admin: 1' http://localhost:3000/admin/users/42
//!   curl http://localhost:3000/assets/index.html

use http::StatusCode;
use trellis::{Next, Request, Response, RouterBuilder, Routes, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut app = RouterBuilder::new();
    app.use_middleware(access_log)
        .get("/", index)
        .get("/users/me", me)
        .get("/users/{id:[0-9]+}", get_user)
        .get("/posts/:slug", get_post)
        .static_files("/assets/{file:.+}", "./public")
        .not_found(not_found);

    app.group("/admin")
        .use_middleware(require_admin)
        .delete("/users/:id", delete_user);

    Server::bind("0.0.0.0:3000")
        .serve(app.build())
        .await
        .expect("server error");
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.path().to_owned();
    let res = next.run(req).await;
    tracing::info!(%method, path, status = res.status_code().as_u16(), "handled");
    res
}

async fn require_admin(req: Request, next: Next) -> Response {
    if req.header("x-admin").is_none() {
        return Response::status(StatusCode::FORBIDDEN);
    }
    next.run(req).await
}

async fn index(_req: Request) -> &'static str {
    "trellis"
}

async fn me(_req: Request) -> Response {
    Response::json(r#"{"id":"me","name":"alice"}"#)
}

// GET /users/{id:[0-9]+}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// GET /posts/:slug?lang=fr
async fn get_post(req: Request) -> Response {
    let slug = req.param("slug").unwrap_or_default();
    let lang = req.query("lang").unwrap_or_else(|| "en".to_owned());
    Response::text(format!("{slug} ({lang})"))
}

// DELETE /admin/users/:id → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found(req: Request) -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .text(format!("nothing at {}", req.path()))
}
