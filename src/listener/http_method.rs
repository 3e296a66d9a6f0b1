use crate::error::Result;
use crate::event::{ActionResult, EventManager, ListenerAggregate, ListenerHandle, MvcEvent, MvcStage};
use crate::http::empty_response;
use axum::http::{HeaderValue, StatusCode, header};
use std::sync::Arc;

/// Priority ahead of every other route listener.
pub const HTTP_METHOD_PRIORITY: i32 = 10000;

/// Answers requests using a method outside the allowed list with `405`.
#[derive(Debug, Clone)]
pub struct HttpMethodListener {
    enabled: bool,
    allowed_methods: Vec<String>,
}

impl HttpMethodListener {
    pub fn new(enabled: bool, allowed_methods: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            enabled,
            allowed_methods: allowed_methods
                .into_iter()
                .map(|m| m.into().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn allowed_methods(&self) -> &[String] {
        &self.allowed_methods
    }

    pub fn on_route(&self, event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        let method = event.request().method().as_str();
        if self.allowed_methods.iter().any(|m| m == method) {
            return Ok(None);
        }

        tracing::debug!("Method {} not allowed", method);
        let mut response = empty_response(StatusCode::METHOD_NOT_ALLOWED);
        if let Ok(allow) = HeaderValue::from_str(&self.allowed_methods.join(", ")) {
            response.headers_mut().insert(header::ALLOW, allow);
        }
        Ok(Some(ActionResult::Response(response)))
    }
}

impl ListenerAggregate for HttpMethodListener {
    fn attach(
        self: Arc<Self>,
        events: &mut EventManager<MvcEvent>,
        _priority: i32,
    ) -> Vec<ListenerHandle> {
        if !self.enabled || self.allowed_methods.is_empty() {
            return Vec::new();
        }
        vec![events.attach(
            MvcStage::Route,
            move |event| self.on_route(event),
            HTTP_METHOD_PRIORITY,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::ServiceLocator;
    use axum::body::Bytes;
    use axum::http::{Method, Request};

    fn event(method: Method) -> MvcEvent {
        let request = Request::builder()
            .method(method)
            .uri("/")
            .body(Bytes::new())
            .unwrap();
        MvcEvent::new(request, Arc::new(ServiceLocator::new()))
    }

    #[test]
    fn test_disallowed_method_is_405_with_allow() {
        let listener = HttpMethodListener::new(true, ["get", "post"]);
        let outcome = listener.on_route(&mut event(Method::DELETE)).unwrap();

        match outcome {
            Some(ActionResult::Response(response)) => {
                assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
                assert_eq!(response.headers()[header::ALLOW], "GET, POST");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_allowed_method_passes() {
        let listener = HttpMethodListener::new(true, ["GET"]);
        assert!(listener.on_route(&mut event(Method::GET)).unwrap().is_none());
    }

    #[test]
    fn test_disabled_attaches_nothing() {
        let mut events = EventManager::<MvcEvent>::new();
        let handles =
            events.attach_aggregate(Arc::new(HttpMethodListener::new(false, ["GET"])), 1);
        assert!(handles.is_empty());
        assert!(!events.has_listeners(MvcStage::Route));
    }
}
