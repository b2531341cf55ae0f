//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method (absent = any method)
//! - Match exact paths and `/*` prefix patterns (case-sensitive)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix pattern only matches on segment boundaries (`/api/*` does not match `/apix`)
//! - No regex to guarantee O(n) matching

use axum::body::Body;
use axum::http::{Method, Request};

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: Method,
}

impl MethodMatcher {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        // HEAD is served by GET routes, as any HTTP/1.1 server would.
        req.method() == self.method || (self.method == Method::GET && req.method() == Method::HEAD)
    }
}

/// Matches one exact path.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    path: String,
}

impl PathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path() == self.path
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        let path = req.uri().path();
        let base = self.prefix.trim_end_matches('/');
        if base.is_empty() {
            return true;
        }
        match path.strip_prefix(base) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(req))
    }
}

/// Compile a path pattern into a matcher.
///
/// `"/*"` matches everything, `"/docs/*"` matches `/docs` and everything below
/// it, anything else is an exact path.
pub fn path_pattern(pattern: &str) -> Box<dyn Matcher> {
    match pattern.strip_suffix("/*") {
        Some(prefix) => Box::new(PathPrefixMatcher::new(prefix)),
        None => Box::new(PathMatcher::new(pattern)),
    }
}

/// Compile an optional method plus a path pattern.
pub fn compile(method: Option<Method>, pattern: &str) -> Box<dyn Matcher> {
    let path = path_pattern(pattern);
    match method {
        Some(method) => Box::new(AndMatcher::new(vec![Box::new(MethodMatcher::new(method)), path])),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(method: Method, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::default()).unwrap()
    }

    #[test]
    fn test_method_matcher() {
        let matcher = MethodMatcher::new(Method::GET);
        assert!(matcher.matches(&req(Method::GET, "/")));
        assert!(matcher.matches(&req(Method::HEAD, "/")));
        assert!(!matcher.matches(&req(Method::POST, "/")));

        let matcher = MethodMatcher::new(Method::POST);
        assert!(!matcher.matches(&req(Method::HEAD, "/")));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathMatcher::new("/ping");
        assert!(matcher.matches(&req(Method::GET, "http://example.com/ping?x=1")));
        assert!(!matcher.matches(&req(Method::GET, "/ping/more")));
        assert!(!matcher.matches(&req(Method::GET, "/PING"))); // Case sensitive
    }

    #[test]
    fn test_path_prefix_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        assert!(matcher.matches(&req(Method::GET, "http://example.com/api/v1")));
        assert!(matcher.matches(&req(Method::GET, "/api")));
        assert!(!matcher.matches(&req(Method::GET, "/apiary")));
        assert!(!matcher.matches(&req(Method::GET, "http://example.com/images")));
    }

    #[test]
    fn test_patterns() {
        let everything = path_pattern("/*");
        assert!(everything.matches(&req(Method::GET, "/")));
        assert!(everything.matches(&req(Method::GET, "/a/b/c")));

        let docs = compile(Some(Method::GET), "/docs/*");
        assert!(docs.matches(&req(Method::GET, "/docs/intro")));
        assert!(!docs.matches(&req(Method::POST, "/docs/intro")));
        assert!(!docs.matches(&req(Method::GET, "/blog")));

        let any_method = compile(None, "/mixed");
        assert!(any_method.matches(&req(Method::DELETE, "/mixed")));
    }
}
