//! TOML route manifests.
//!
//! ```toml
//! [[routes]]
//! method = "GET"
//! path = "/ping"
//! respond = { body = "pong" }
//!
//! [[routes]]
//! path = "/mixed"
//! locals = { msg = "hello" }
//! ```
//!
//! A route with `respond` is terminal. A route with `locals` merges them into
//! the request and delegates. A route with both merges, then responds.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use serde::Deserialize;

use super::{EntryError, Registrar};
use crate::locals::{Locals, LocalsExt};
use crate::routing::{Flow, HandlerError, RouteHandler, Routes};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteSpec {
    method: Option<String>,
    path: String,
    respond: Option<RespondSpec>,
    locals: Option<Locals>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RespondSpec {
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    body: String,
    content_type: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

fn default_status() -> u16 {
    200
}

/// A fixed response prepared at load time.
#[derive(Debug, Clone)]
struct PreparedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl PreparedResponse {
    fn to_response(&self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// One validated manifest route.
#[derive(Debug, Clone)]
pub struct ManifestRoute {
    method: Option<Method>,
    path: String,
    locals: Option<Locals>,
    respond: Option<PreparedResponse>,
}

#[async_trait]
impl RouteHandler for ManifestRoute {
    async fn call(&self, mut request: Request<Body>) -> Result<Flow, HandlerError> {
        if let Some(locals) = &self.locals {
            request.locals_mut().merge(locals.clone());
        }
        match &self.respond {
            Some(prepared) => Ok(Flow::Respond(prepared.to_response())),
            None => Ok(Flow::Next(request)),
        }
    }
}

/// A loaded route manifest, ready to register.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    path: PathBuf,
    routes: Vec<ManifestRoute>,
}

impl ManifestEntry {
    /// File the routes were loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl Registrar for ManifestEntry {
    async fn register(&self, routes: &mut Routes) -> Result<(), HandlerError> {
        for route in &self.routes {
            routes.route(route.method.clone(), &route.path, route.clone());
        }
        Ok(())
    }
}

/// Read, parse and validate a route manifest.
pub fn load_entrypoint(path: &Path) -> Result<ManifestEntry, EntryError> {
    let content = fs::read_to_string(path).map_err(|source| EntryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_entrypoint(path, &content)
}

fn parse_entrypoint(path: &Path, content: &str) -> Result<ManifestEntry, EntryError> {
    let invalid = |reason: String| EntryError::InvalidEntrypoint {
        path: path.to_path_buf(),
        reason,
    };

    let table: toml::Table = content.parse().map_err(|e: toml::de::Error| invalid(e.message().to_string()))?;

    let items = match table.get("routes") {
        None => return Err(invalid("no `routes` defined".to_string())),
        Some(toml::Value::Array(items)) => items,
        Some(other) => return Err(invalid(format!("`routes` is a {}", other.type_str()))),
    };

    let mut routes = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let route_error = |reason: String| EntryError::InvalidRoute {
            path: path.to_path_buf(),
            index,
            reason,
        };

        if !item.is_table() {
            return Err(invalid(format!("route #{index} is a {}", item.type_str())));
        }
        let spec: RouteSpec = item.clone().try_into().map_err(|e: toml::de::Error| route_error(e.message().to_string()))?;
        routes.push(compile_route(spec).map_err(route_error)?);
    }

    tracing::debug!(path = %path.display(), routes = routes.len(), "Route manifest loaded");

    Ok(ManifestEntry {
        path: path.to_path_buf(),
        routes,
    })
}

fn compile_route(spec: RouteSpec) -> Result<ManifestRoute, String> {
    if !spec.path.starts_with('/') {
        return Err(format!("path `{}` must start with `/`", spec.path));
    }
    if spec.respond.is_none() && spec.locals.is_none() {
        return Err("needs `respond`, `locals` or both".to_string());
    }

    let method = spec
        .method
        .map(|m| {
            Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| format!("invalid method `{m}`"))
        })
        .transpose()?;

    let respond = spec.respond.map(prepare_response).transpose()?;

    Ok(ManifestRoute {
        method,
        path: spec.path,
        locals: spec.locals,
        respond,
    })
}

fn prepare_response(spec: RespondSpec) -> Result<PreparedResponse, String> {
    let status = StatusCode::from_u16(spec.status).map_err(|_| format!("invalid status {}", spec.status))?;

    let mut headers = HeaderMap::new();
    let content_type = spec
        .content_type
        .unwrap_or_else(|| "text/plain; charset=utf-8".to_string());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type).map_err(|_| format!("invalid content type `{content_type}`"))?,
    );

    for (name, value) in spec.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| format!("invalid header name `{name}`"))?;
        let header_value =
            HeaderValue::from_str(&value).map_err(|_| format!("invalid value for header `{name}`"))?;
        headers.append(header_name, header_value);
    }

    Ok(PreparedResponse {
        status,
        headers,
        body: Bytes::from(spec.body),
    })
}
