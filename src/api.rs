use std::sync::Arc;
use std::time::Duration;

use axum::BoxError;
use axum::body::Bytes;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::exporter::Exporter;
use crate::exposition::CONTENT_TYPE;

/// Transport tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerLimits {
    /// Scrapes allowed to run at the same time; further requests wait.
    pub max_concurrent_scrapes: usize,
    pub request_timeout: Duration,
    /// Upper bound for request bodies, in bytes. Larger requests get `413`.
    pub max_request_size: usize,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_concurrent_scrapes: 5,
            request_timeout: Duration::from_secs(30),
            max_request_size: 128 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
struct AppState {
    exporter: Arc<Exporter>,
    workers: Arc<Semaphore>,
}

/// Serves every request, whatever its method or path.
///
/// The body is read and discarded so that the size limit applies to chunked
/// uploads too.
async fn scrape(State(state): State<AppState>, _body: Bytes) -> Response {
    let permit = match Arc::clone(&state.workers).acquire_owned().await {
        Ok(permit) => permit,
        Err(err) => {
            log::error!("scrape worker pool closed: {err}");
            return (StatusCode::SERVICE_UNAVAILABLE, "exporter is shutting down").into_response();
        }
    };

    let exporter = Arc::clone(&state.exporter);
    let scraped = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        exporter.scrape()
    })
    .await;

    match scraped {
        Ok(body) => metrics_response(body),
        Err(err) => {
            log::error!("scrape task failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to collect metrics").into_response()
        }
    }
}

/// Frames a finished exposition document as a `200 OK` response.
pub fn metrics_response(body: String) -> Response {
    let length = body.len();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE)),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
        ],
        body,
    )
        .into_response()
}

async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        log::warn!("scrape exceeded the request timeout");
        return (StatusCode::REQUEST_TIMEOUT, "request timed out").into_response();
    }
    log::error!("unhandled middleware error: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(exporter: Arc<Exporter>, limits: ServerLimits) -> Self {
        let state = AppState {
            exporter,
            workers: Arc::new(Semaphore::new(limits.max_concurrent_scrapes.max(1))),
        };
        let router = axum::Router::new()
            .fallback(scrape)
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_middleware_error))
                    .layer(TimeoutLayer::new(limits.request_timeout)),
            )
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(limits.max_request_size))
            .with_state(state);
        Self { router }
    }

    /// Serves until `shutdown` is cancelled, then lets in-flight requests finish.
    pub async fn listen(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> std::io::Result<()> {
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
    }
}
