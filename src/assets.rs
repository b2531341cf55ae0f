//! Static file serving for production.
//!
//! - Paths under the assets prefix are answered here and nowhere else. Files
//!   found there get an immutable one-year cache policy (fingerprinted build
//!   output); misses do not
//! - Other client files are tried after user routes; a miss passes the request on

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode};
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Cache policy for prefixed assets.
pub const IMMUTABLE_CACHE_CONTROL: &str = "max-age=31536000,immutable";

/// Static files rooted at the built client directory.
#[derive(Clone)]
pub struct StaticFiles {
    root: PathBuf,
    prefix: String,
    files: ServeDir,
}

impl StaticFiles {
    /// Serve `client_root`; `prefix` (e.g. `/assets/`) maps to `client_root/assets`.
    pub fn new(client_root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        let root = client_root.into();
        Self {
            files: ServeDir::new(&root),
            prefix: prefix.into(),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True when `path` falls under the assets prefix, after percent-decoding.
    pub fn is_asset(&self, path: &str) -> bool {
        let decoded = urlencoding::decode(path).unwrap_or(std::borrow::Cow::Borrowed(path));
        let base = self.prefix.trim_end_matches('/');
        match decoded.strip_prefix(base) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Answer an asset request. Misses are 404s; they never fall through.
    pub async fn serve_asset(&self, request: Request<Body>) -> Response<Body> {
        let mut response = self.serve(request).await;
        if response.status().is_success() {
            response.headers_mut().insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL),
            );
        }
        response
    }

    /// A bodiless copy of `request` to look up in the client root, or `None`
    /// when the method can never be answered with a file.
    pub fn client_lookup(request: &Request<Body>) -> Option<Request<Body>> {
        if request.method() != Method::GET && request.method() != Method::HEAD {
            return None;
        }

        let mut lookup = Request::new(Body::empty());
        *lookup.method_mut() = request.method().clone();
        *lookup.uri_mut() = request.uri().clone();
        *lookup.headers_mut() = request.headers().clone();
        Some(lookup)
    }

    /// Try to answer `lookup` from the client root, or `None` to let the
    /// original request continue.
    pub async fn try_client_file(&self, lookup: Request<Body>) -> Option<Response<Body>> {
        let response = self.serve(lookup).await;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => None,
            _ => Some(response),
        }
    }

    async fn serve(&self, request: Request<Body>) -> Response<Body> {
        match self.files.clone().oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        }
    }
}

impl std::fmt::Debug for StaticFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFiles")
            .field("root", &self.root)
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> (tempfile::TempDir, StaticFiles) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/app.1234.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();
        let files = StaticFiles::new(dir.path(), "/assets/");
        (dir, files)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_is_asset() {
        let (_dir, files) = fixture();
        assert!(files.is_asset("/assets/app.js"));
        assert!(files.is_asset("/assets"));
        assert!(!files.is_asset("/assetsx/app.js"));
        assert!(!files.is_asset("/ping"));
    }

    #[test]
    fn test_is_asset_decodes_escapes() {
        let (_dir, files) = fixture();
        assert!(files.is_asset("/%61ssets/app.js"));
        assert!(files.is_asset("/assets%2Fapp.js"));
        assert!(!files.is_asset("/%61ssetsx/app.js"));
    }

    #[tokio::test]
    async fn test_asset_served_with_immutable_cache() {
        let (_dir, files) = fixture();
        let response = files.serve_asset(get("/assets/app.1234.js")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], IMMUTABLE_CACHE_CONTROL);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"console.log(1)");
    }

    #[tokio::test]
    async fn test_missing_asset_is_not_found() {
        let (_dir, files) = fixture();
        let response = files.serve_asset(get("/assets/not-deployed-yet.js")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_encoded_asset_path_is_served_as_asset() {
        let (_dir, files) = fixture();
        let response = files.serve_asset(get("/%61ssets/app.1234.js")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], IMMUTABLE_CACHE_CONTROL);
    }

    #[tokio::test]
    async fn test_client_file_hit_and_miss() {
        let (_dir, files) = fixture();

        let lookup = StaticFiles::client_lookup(&get("/robots.txt")).unwrap();
        let hit = files.try_client_file(lookup).await.unwrap();
        assert_eq!(hit.status(), StatusCode::OK);
        assert!(hit.headers().get(header::CACHE_CONTROL).is_none());

        let lookup = StaticFiles::client_lookup(&get("/about")).unwrap();
        assert!(files.try_client_file(lookup).await.is_none());

        let post = Request::builder().method(Method::POST).uri("/robots.txt").body(Body::empty()).unwrap();
        assert!(StaticFiles::client_lookup(&post).is_none());
    }
}
