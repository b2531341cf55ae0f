//! Shared utilities for the end-to-end server tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use ssr_bridge::config::{BridgeConfig, Mode};
use ssr_bridge::lifecycle::RunningServer;
use ssr_bridge::locals::Locals;
use ssr_bridge::render::{RenderError, SsrEngine, SsrResponse};

/// Engine that records what it was asked to render.
#[derive(Default)]
pub struct CapturingEngine {
    seen: Mutex<Vec<(String, Locals)>>,
}

impl CapturingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Paths and locals of every render so far.
    pub fn seen(&self) -> Vec<(String, Locals)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SsrEngine for CapturingEngine {
    async fn render(&self, request: Request<Body>, locals: Locals) -> Result<SsrResponse, RenderError> {
        let path = request.uri().path().to_string();
        self.seen.lock().unwrap().push((path.clone(), locals));
        Ok(SsrResponse::text(StatusCode::OK, format!("rendered {path}")))
    }
}

/// Write a route manifest into `dir`.
pub fn write_manifest(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("routes.toml");
    std::fs::write(&path, content).unwrap();
    path
}

/// Config bound to an ephemeral loopback port with no static files.
pub fn test_config(mode: Mode, entry: Option<PathBuf>) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.mode = mode;
    config.entry = entry;
    config.server.host = Some("127.0.0.1".into());
    config.server.port = Some(0);
    config.assets.enabled = false;
    config.dev.watch_entry = false;
    config
}

/// A port nobody is listening on right now.
pub async fn free_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn url(server: &RunningServer, path: &str) -> String {
    format!("http://{}{}", server.local_addr(), path)
}

pub async fn get_text(server: &RunningServer, path: &str) -> (StatusCode, String) {
    let response = reqwest::get(url(server, path)).await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.text().await.unwrap())
}
