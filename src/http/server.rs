//! HTTP server setup and S3 route dispatch.
//!
//! # Responsibilities
//! - Create the Axum router and wire middleware (timeout, request ID, trace)
//! - Resolve each request to a fixed action name (method + path shape)
//! - Invoke the handler pre-wrapped by the accounting decorator
//! - Bind the server to a listener with graceful shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use futures_util::FutureExt;
use tokio::net::TcpListener;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::classify::PrefixSet;
use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::request::MakeGatewayRequestId;
use crate::http::request::extract_bucket_and_object;
use crate::http::track::{track, GatewayHandler};
use crate::http::traffic::TrafficRecorder;
use crate::observability::{PromSink, StatsSink};
use crate::storage::ObjectStore;

/// Shared context for the wrapped handlers.
pub struct GatewayState {
    pub store: Arc<ObjectStore>,
    pub traffic: Arc<TrafficRecorder>,
    pub max_body_bytes: usize,
}

/// One tracked handler per action, fixed at construction time.
struct RouteTable {
    list_buckets: GatewayHandler,
    create_bucket: GatewayHandler,
    delete_bucket: GatewayHandler,
    list_objects: GatewayHandler,
    put_object: GatewayHandler,
    copy_object: GatewayHandler,
    get_object: GatewayHandler,
    head_object: GatewayHandler,
    delete_object: GatewayHandler,
}

/// Box a stateful handler fn into the decorator's handler shape.
fn boxed<F, Fut>(state: Arc<GatewayState>, f: F) -> GatewayHandler
where
    F: Fn(Arc<GatewayState>, Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| f(state.clone(), req).boxed())
}

impl RouteTable {
    fn new(state: Arc<GatewayState>, stats: Arc<dyn StatsSink>) -> Self {
        let s = &state;
        Self {
            list_buckets: track(stats.clone(), "ListBuckets", boxed(s.clone(), handlers::list_buckets)),
            create_bucket: track(stats.clone(), "CreateBucket", boxed(s.clone(), handlers::create_bucket)),
            delete_bucket: track(stats.clone(), "DeleteBucket", boxed(s.clone(), handlers::delete_bucket)),
            list_objects: track(stats.clone(), "ListObjects", boxed(s.clone(), handlers::list_objects)),
            put_object: track(stats.clone(), "PutObject", boxed(s.clone(), handlers::put_object)),
            copy_object: track(stats.clone(), "CopyObject", boxed(s.clone(), handlers::copy_object)),
            get_object: track(stats.clone(), "GetObject", boxed(s.clone(), handlers::get_object)),
            head_object: track(stats.clone(), "HeadObject", boxed(s.clone(), handlers::head_object)),
            delete_object: track(stats, "DeleteObject", boxed(s.clone(), handlers::delete_object)),
        }
    }

    /// Resolve a request to its tracked handler. `None` means the
    /// method/path combination has no registered action.
    fn resolve(&self, req: &Request<Body>) -> Option<&GatewayHandler> {
        let (bucket, key) = extract_bucket_and_object(req.uri().path());
        let has_bucket = !bucket.is_empty();
        let has_key = !key.is_empty();
        let method = req.method();

        if method == Method::GET {
            return Some(match (has_bucket, has_key) {
                (false, _) => &self.list_buckets,
                (true, false) => &self.list_objects,
                (true, true) => &self.get_object,
            });
        }
        if method == Method::HEAD && has_bucket && has_key {
            return Some(&self.head_object);
        }
        if method == Method::PUT && has_bucket {
            if !has_key {
                return Some(&self.create_bucket);
            }
            if req.headers().contains_key("x-amz-copy-source") {
                return Some(&self.copy_object);
            }
            return Some(&self.put_object);
        }
        if method == Method::DELETE && has_bucket {
            return Some(if has_key {
                &self.delete_object
            } else {
                &self.delete_bucket
            });
        }
        None
    }
}

/// Application state injected into the dispatch handler.
#[derive(Clone)]
struct AppState {
    routes: Arc<RouteTable>,
}

/// HTTP server for the stats gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server recording into the Prometheus sink.
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_sink(config, Arc::new(PromSink))
    }

    /// Create a server recording into an injected sink. Tests use this to
    /// observe recordings without a metrics registry.
    pub fn with_sink(config: GatewayConfig, stats: Arc<dyn StatsSink>) -> Self {
        let internal = Arc::new(ArcSwapOption::new(
            PrefixSet::build(&config.network.internal_cidrs).map(Arc::new),
        ));
        if let Some(set) = internal.load().as_ref() {
            tracing::info!(prefixes = set.len(), "Internal network ranges configured");
        } else {
            tracing::info!("No internal network ranges configured; all egress bills as external");
        }

        let state = Arc::new(GatewayState {
            store: Arc::new(ObjectStore::new()),
            traffic: Arc::new(TrafficRecorder::new(stats.clone(), internal)),
            max_body_bytes: config.limits.max_body_bytes,
        });

        let router = Self::build_router(&config, state, stats);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &GatewayConfig,
        state: Arc<GatewayState>,
        stats: Arc<dyn StatsSink>,
    ) -> Router {
        let app = AppState {
            routes: Arc::new(RouteTable::new(state, stats)),
        };

        Router::new()
            .route("/", any(dispatch))
            .route("/{bucket}", any(dispatch))
            .route("/{bucket}/{*key}", any(dispatch))
            .with_state(app)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(SetRequestIdLayer::x_request_id(MakeGatewayRequestId))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
    }

    /// The built router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Dispatch handler: resolve the action, then run its tracked handler.
async fn dispatch(State(app): State<AppState>, req: Request<Body>) -> Response {
    match app.routes.resolve(&req) {
        Some(handler) => handler(req).await,
        None => {
            tracing::debug!(method = %req.method(), path = %req.uri().path(), "No action for request");
            (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
