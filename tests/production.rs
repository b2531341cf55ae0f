//! End-to-end tests for production mode.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use ssr_bridge::assets::IMMUTABLE_CACHE_CONTROL;
use ssr_bridge::config::Mode;
use ssr_bridge::entry::EntryError;
use ssr_bridge::lifecycle::{self, StartupError};
use ssr_bridge::render::PreviewEngine;

mod common;

use common::{get_text, test_config, write_manifest, CapturingEngine};

const MANIFEST: &str = r#"
[[routes]]
method = "GET"
path = "/ping"
respond = { body = "pong" }

[[routes]]
path = "/mixed"
locals = { msg = "x" }

[[routes]]
path = "/assets/*"
respond = { body = "handler saw an asset" }

[[routes]]
path = "/login"
locals = { cookies = ["session=abc; Path=/", "theme=dark; Path=/"] }
"#;

#[tokio::test]
async fn test_user_route_terminal_and_catch_all_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let entry = write_manifest(dir.path(), MANIFEST);
    let engine = CapturingEngine::new();

    let server = lifecycle::start(&test_config(Mode::Production, Some(entry)), engine.clone())
        .await
        .unwrap();

    let (status, body) = get_text(&server, "/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "pong");
    assert!(engine.seen().is_empty());

    let (status, body) = get_text(&server, "/about").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "rendered /about");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_locals_from_route_reach_renderer() {
    let dir = tempfile::tempdir().unwrap();
    let entry = write_manifest(dir.path(), MANIFEST);
    let engine = CapturingEngine::new();

    let server = lifecycle::start(&test_config(Mode::Production, Some(entry)), engine.clone())
        .await
        .unwrap();

    let (_, body) = get_text(&server, "/mixed").await;
    assert_eq!(body, "rendered /mixed");

    let seen = engine.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "/mixed");
    assert_eq!(seen[0].1.get("msg"), Some(&json!("x")));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_assets_are_immutable_and_never_reach_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let client_root = dir.path().join("client");
    std::fs::create_dir_all(client_root.join("assets")).unwrap();
    std::fs::write(client_root.join("assets/app.123.js"), "console.log(1)").unwrap();
    std::fs::write(client_root.join("robots.txt"), "User-agent: *").unwrap();

    let entry = write_manifest(dir.path(), MANIFEST);
    let mut config = test_config(Mode::Production, Some(entry));
    config.assets.enabled = true;
    config.assets.client_root = client_root;

    let engine = CapturingEngine::new();
    let server = lifecycle::start(&config, engine.clone()).await.unwrap();

    let response = reqwest::get(common::url(&server, "/assets/app.123.js")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["cache-control"].to_str().unwrap(),
        IMMUTABLE_CACHE_CONTROL
    );
    assert_eq!(response.text().await.unwrap(), "console.log(1)");

    let response = reqwest::get(common::url(&server, "/assets/missing.js")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert!(response.headers().get("cache-control").is_none());
    assert_ne!(response.text().await.unwrap(), "handler saw an asset");

    let response = reqwest::get(common::url(&server, "/robots.txt")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers().get("cache-control").is_none());
    assert_eq!(response.text().await.unwrap(), "User-agent: *");

    assert!(engine.seen().is_empty());
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_cookies_arrive_as_separate_headers() {
    let dir = tempfile::tempdir().unwrap();
    let entry = write_manifest(dir.path(), MANIFEST);

    let server = lifecycle::start(
        &test_config(Mode::Production, Some(entry)),
        Arc::new(PreviewEngine::default()),
    )
    .await
    .unwrap();

    let response = reqwest::get(common::url(&server, "/login")).await.unwrap();
    let cookies: Vec<_> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies, vec!["session=abc; Path=/", "theme=dark; Path=/"]);

    let body = response.text().await.unwrap();
    assert!(body.starts_with("<!doctype html>"));
    assert!(body.ends_with("</body></html>"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_invalid_entry_fails_before_binding() {
    let dir = tempfile::tempdir().unwrap();
    let entry = write_manifest(dir.path(), "title = \"no routes here\"\n");
    let port = common::free_port().await;

    let mut config = test_config(Mode::Production, Some(entry.clone()));
    config.server.port = Some(port);

    let err = lifecycle::start(&config, CapturingEngine::new())
        .await
        .err()
        .expect("startup should fail");
    assert!(matches!(err, StartupError::Entry(EntryError::InvalidEntrypoint { .. })));
    assert!(err.to_string().contains(&entry.display().to_string()));

    // Nothing was bound, so the port is still ours to take.
    tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
}

#[tokio::test]
async fn test_missing_entry_serves_catch_all_only() {
    let engine = CapturingEngine::new();
    let server = lifecycle::start(&test_config(Mode::Production, None), engine.clone())
        .await
        .unwrap();

    let (status, body) = get_text(&server, "/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "rendered /ping");

    server.stop().await.unwrap();
}
