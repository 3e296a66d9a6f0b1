use super::{JsonRenderer, ModelKind, Renderer, ViewModel};
use crate::error::Result;
use crate::event::{ActionResult, MvcEvent, MvcFailure};
use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode, header};
use serde_json::Value;
use std::sync::Arc;

const NOT_FOUND_MESSAGE: &str = "Page not found.";
const EXCEPTION_MESSAGE: &str = "An error occurred during execution; please try again later.";

fn write_body(event: &mut MvcEvent, body: String, content_type: &'static str) {
    let response = event.response_mut();
    *response.body_mut() = Bytes::from(body);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
}

fn short_circuited(event: &MvcEvent) -> bool {
    event.result().is_some_and(ActionResult::is_response)
}

/// Renders the root view model into the response body.
pub struct DefaultRenderingStrategy {
    renderer: Arc<dyn Renderer>,
}

impl DefaultRenderingStrategy {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    pub fn render(&self, event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        if short_circuited(event) {
            return Ok(None);
        }

        let model = event.view_model();
        let (body, content_type) = match model.kind() {
            ModelKind::Json => (JsonRenderer.render(model)?, JsonRenderer.content_type()),
            ModelKind::View => (self.renderer.render(model)?, self.renderer.content_type()),
        };

        tracing::debug!(
            "Rendered '{}' ({} bytes)",
            event.view_model().template(),
            body.len()
        );
        write_body(event, body, content_type);
        Ok(None)
    }
}

/// Answers routing and controller lookup failures with a 404 page.
pub struct RouteNotFoundStrategy {
    template: String,
    display_reason: bool,
}

impl RouteNotFoundStrategy {
    pub fn new(template: impl Into<String>, display_reason: bool) -> Self {
        Self {
            template: template.into(),
            display_reason,
        }
    }

    /// Set a 404 status for not-found failures.
    pub fn detect_not_found(&self, event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        let not_found = event.error().is_some_and(|e| e.kind().is_not_found());
        if not_found {
            *event.response_mut().status_mut() = StatusCode::NOT_FOUND;
        }
        Ok(None)
    }

    /// Replace the result of a 404 response with the not-found model.
    pub fn prepare_not_found_model(&self, event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        if event.response().status() != StatusCode::NOT_FOUND || short_circuited(event) {
            return Ok(None);
        }

        let mut model = ViewModel::new()
            .with_template(self.template.as_str())
            .with_variable("message", NOT_FOUND_MESSAGE);

        if self.display_reason {
            let reason = event
                .error()
                .map(|e| e.kind().to_string())
                .or_else(|| {
                    event
                        .param("reason")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                });
            if let Some(reason) = reason {
                model.set_variable("reason", reason);
            }

            let controller = event
                .error()
                .and_then(MvcFailure::controller)
                .or_else(|| event.controller_name())
                .map(str::to_string);
            if let Some(controller) = controller {
                model.set_variable("controller", controller);
            }
        }

        event.set_result(ActionResult::Model(model));
        Ok(None)
    }
}

/// Answers dispatch exceptions and render failures with an error page.
pub struct ExceptionStrategy {
    template: String,
    display_exceptions: bool,
    renderer: Arc<dyn Renderer>,
}

impl ExceptionStrategy {
    pub fn new(
        template: impl Into<String>,
        display_exceptions: bool,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            template: template.into(),
            display_exceptions,
            renderer,
        }
    }

    fn error_model(&self, error: &MvcFailure) -> ViewModel {
        let mut model = ViewModel::new()
            .with_template(self.template.as_str())
            .with_variable("message", EXCEPTION_MESSAGE)
            .with_variable("reason", error.kind().to_string());
        if let Some(controller) = error.controller() {
            model.set_variable("controller", controller);
        }
        if self.display_exceptions {
            model.set_variable("exception", error.message());
        }
        model
    }

    pub fn prepare_exception_model(&self, event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        let Some(error) = event.error().cloned() else {
            return Ok(None);
        };
        if error.kind().is_not_found() || short_circuited(event) {
            return Ok(None);
        }

        event.set_result(ActionResult::Model(self.error_model(&error)));
        if !event.response().status().is_client_error() && !event.response().status().is_server_error() {
            *event.response_mut().status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        }
        Ok(None)
    }

    /// Render the error page directly; the layout may be what failed.
    pub fn render_error(&self, event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        let Some(error) = event.error().cloned() else {
            return Ok(None);
        };

        let model = self.error_model(&error);
        match self.renderer.render(&model) {
            Ok(body) => write_body(event, body, self.renderer.content_type()),
            Err(e) => {
                tracing::warn!("Error page could not be rendered: {}", e);
                write_body(event, EXCEPTION_MESSAGE.to_string(), "text/plain; charset=utf-8");
            }
        }
        *event.response_mut().status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        Ok(Some(ActionResult::Model(model)))
    }
}
