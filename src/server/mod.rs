//! Hosting the lifecycle on axum.
//!
//! [`MvcService`] buffers the request body, runs [`Application::run`] on the
//! blocking pool and converts the result into an axum response. It is a
//! plain tower service, so it can sit behind any tower middleware.

use crate::error::Result;
use crate::http::HttpRequest;
use crate::lifecycle::{Application, shutdown_signal};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::Service;

/// Tower service running every request through a bootstrapped application.
#[derive(Clone)]
pub struct MvcService {
    app: Arc<Application>,
    body_limit: usize,
}

impl MvcService {
    pub fn new(app: Arc<Application>) -> Self {
        let body_limit = app.config().body_limit;
        Self { app, body_limit }
    }
}

impl Service<Request<Body>> for MvcService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let app = Arc::clone(&self.app);
        let body_limit = self.body_limit;
        Box::pin(async move { Ok(handle(app, req, body_limit).await) })
    }
}

async fn handle(app: Arc<Application>, req: Request<Body>, body_limit: usize) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to buffer request body: {}", e);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };
    let request = HttpRequest::from_parts(parts, bytes);

    match tokio::task::spawn_blocking(move || app.run(request)).await {
        Ok(Ok(response)) => response.map(Body::from),
        Ok(Err(e)) => {
            tracing::error!("Request failed: {}", e);
            e.into_response()
        }
        Err(e) => {
            tracing::error!("Lifecycle task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// An axum router sending every request to the application.
pub fn router(app: Arc<Application>) -> axum::Router {
    axum::Router::new().fallback_service(MvcService::new(app))
}

/// Serve the application until Ctrl+C or SIGTERM.
pub async fn serve(app: Arc<Application>, addr: impl ToSocketAddrs) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApplicationConfig;
    use crate::controller::ActionController;
    use crate::event::ActionResult;
    use crate::router::HttpRouter;
    use crate::view::ViewModel;
    use tower::ServiceExt;

    fn app() -> Arc<Application> {
        let mut router = HttpRouter::new();
        router
            .add_route("album", "/album/{id}", &[("controller", "album")])
            .unwrap();

        let app = Application::builder()
            .config(ApplicationConfig {
                body_limit: 16,
                ..ApplicationConfig::default()
            })
            .router(router)
            .controller("album", |_| {
                Ok(ActionController::new().action("index", |event| {
                    let id = event.params().from_route("id").unwrap_or("").to_string();
                    Ok(ActionResult::Model(ViewModel::json().with_variable("id", id)))
                }))
            })
            .init()
            .unwrap();
        Arc::new(app)
    }

    #[tokio::test]
    async fn test_serves_json_model() {
        let response = router(app())
            .oneshot(Request::builder().uri("/album/7").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"id":"7"}"#);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = router(app())
            .oneshot(Request::builder().uri("/artist").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let response = MvcService::new(app())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/album/1")
                    .body(Body::from("x".repeat(64)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
