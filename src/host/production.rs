//! Production host: owns the full request lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;

use super::RoutingHost;
use crate::assets::StaticFiles;
use crate::dispatch::{CatchAll, Dispatch, Dispatcher};
use crate::entry::{EntryError, Registrar};
use crate::routing::{HandlerError, Routes};

/// Assets → user routes → client files → catch-all, in one place.
#[derive(Debug)]
pub struct ProductionHost {
    dispatcher: Dispatcher,
    statics: Option<StaticFiles>,
    catch_all: CatchAll,
    installed: AtomicBool,
}

impl ProductionHost {
    pub fn new(catch_all: CatchAll, statics: Option<StaticFiles>) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            statics,
            catch_all,
            installed: AtomicBool::new(false),
        }
    }

    pub fn route_count(&self) -> usize {
        self.dispatcher.route_count()
    }
}

#[async_trait]
impl RoutingHost for ProductionHost {
    async fn install_routes(&self, registrar: &dyn Registrar) -> Result<usize, EntryError> {
        if self.installed.swap(true, Ordering::SeqCst) {
            return Err(EntryError::AlreadyInstalled);
        }

        let mut routes = Routes::new();
        registrar.register(&mut routes).await.map_err(EntryError::Register)?;

        let count = routes.len();
        self.dispatcher.install(routes);
        tracing::info!(routes = count, "Production routes installed");
        Ok(count)
    }

    async fn dispatch(&self, request: Request<Body>) -> Result<Dispatch, HandlerError> {
        if let Some(statics) = &self.statics {
            if statics.is_asset(request.uri().path()) {
                return Ok(Dispatch::Handled(statics.serve_asset(request).await));
            }
        }

        let (request, locals) = match self.dispatcher.dispatch(request).await? {
            Dispatch::Handled(response) => return Ok(Dispatch::Handled(response)),
            Dispatch::Fallthrough { request, locals } => (request, locals),
        };

        if let Some(statics) = &self.statics {
            // Only an owned copy may be held across the await.
            let lookup = StaticFiles::client_lookup(&request);
            if let Some(lookup) = lookup {
                if let Some(response) = statics.try_client_file(lookup).await {
                    return Ok(Dispatch::Handled(response));
                }
            }
        }

        let response = self.catch_all.respond(request, locals).await?;
        Ok(Dispatch::Handled(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::IMMUTABLE_CACHE_CONTROL;
    use crate::locals::{Locals, LocalsExt};
    use crate::render::{RenderError, SsrEngine, SsrResponse};
    use crate::routing::Flow;
    use axum::http::{header, Response, StatusCode};
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    /// Renders `rendered <path>` and remembers the locals it saw.
    #[derive(Default)]
    struct CapturingEngine {
        seen: Mutex<Vec<Locals>>,
    }

    #[async_trait]
    impl SsrEngine for CapturingEngine {
        async fn render(&self, request: Request<Body>, locals: Locals) -> Result<SsrResponse, RenderError> {
            self.seen.lock().unwrap().push(locals);
            Ok(SsrResponse::text(StatusCode::OK, format!("rendered {}", request.uri().path())))
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn handled(outcome: Dispatch) -> Response<Body> {
        match outcome {
            Dispatch::Handled(response) => response,
            other => panic!("production host must always handle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unmatched_request_rendered_by_catch_all() {
        let engine = Arc::new(CapturingEngine::default());
        let host = ProductionHost::new(CatchAll::new(engine.clone(), 4), None);
        host.install_routes(&|_: &mut Routes| {}).await.unwrap();

        let response = handled(host.dispatch(get("/ping")).await.unwrap());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "rendered /ping");
    }

    #[tokio::test]
    async fn test_handler_locals_reach_renderer() {
        let engine = Arc::new(CapturingEngine::default());
        let host = ProductionHost::new(CatchAll::new(engine.clone(), 4), None);
        host.install_routes(&|routes: &mut Routes| {
            routes.get("/mixed", |mut req: Request<Body>| async move {
                req.locals_mut().insert("msg", "x");
                Ok::<_, HandlerError>(Flow::Next(req))
            });
        })
        .await
        .unwrap();

        let response = handled(host.dispatch(get("/mixed")).await.unwrap());
        assert_eq!(body_text(response).await, "rendered /mixed");

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("msg"), Some(&serde_json::json!("x")));
    }

    #[tokio::test]
    async fn test_assets_never_reach_routes_or_catch_all() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "js").unwrap();

        let engine = Arc::new(CapturingEngine::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let host = ProductionHost::new(
            CatchAll::new(engine.clone(), 4),
            Some(StaticFiles::new(dir.path(), "/assets/")),
        );

        let counter = hits.clone();
        host.install_routes(&move |routes: &mut Routes| {
            let counter = counter.clone();
            routes.all("/*", move |req: Request<Body>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, HandlerError>(Flow::Next(req))
                }
            });
        })
        .await
        .unwrap();

        let found = handled(host.dispatch(get("/assets/app.js")).await.unwrap());
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(found.headers()[header::CACHE_CONTROL], IMMUTABLE_CACHE_CONTROL);

        let missing = handled(host.dispatch(get("/assets/nope.js")).await.unwrap());
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(missing.headers().get(header::CACHE_CONTROL).is_none());

        let encoded = handled(host.dispatch(get("/%61ssets/app.js")).await.unwrap());
        assert_eq!(encoded.status(), StatusCode::OK);
        assert_eq!(encoded.headers()[header::CACHE_CONTROL], IMMUTABLE_CACHE_CONTROL);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_client_files_served_after_routes_on_spawned_task() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();

        let engine = Arc::new(CapturingEngine::default());
        let host: Arc<dyn RoutingHost> = Arc::new(ProductionHost::new(
            CatchAll::new(engine.clone(), 4),
            Some(StaticFiles::new(dir.path(), "/assets/")),
        ));
        host.install_routes(&|_: &mut Routes| {}).await.unwrap();

        let task_host = host.clone();
        let response = tokio::spawn(async move { task_host.dispatch(get("/robots.txt")).await })
            .await
            .unwrap()
            .unwrap();
        let response = handled(response);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert_eq!(body_text(response).await, "User-agent: *");

        let response = handled(host.dispatch(get("/about")).await.unwrap());
        assert_eq!(body_text(response).await, "rendered /about");
        assert_eq!(engine.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_routes_install_only_once() {
        let host = ProductionHost::new(CatchAll::new(Arc::new(CapturingEngine::default()), 4), None);
        host.install_routes(&|_: &mut Routes| {}).await.unwrap();

        let err = host.install_routes(&|_: &mut Routes| {}).await.unwrap_err();
        assert!(matches!(err, EntryError::AlreadyInstalled));
    }
}
