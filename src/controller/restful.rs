use super::Controller;
use crate::event::{ActionResult, MvcEvent};
use crate::http::{empty_response, header_str, parse_query_string};
use axum::http::{Method, StatusCode, header};
use serde_json::{Map, Value};

fn method_not_allowed() -> anyhow::Result<ActionResult> {
    Ok(ActionResult::Response(empty_response(
        StatusCode::METHOD_NOT_ALLOWED,
    )))
}

/// A REST resource; every method not overridden answers `405`.
#[allow(unused_variables)]
pub trait RestfulResource: Send {
    fn get(&mut self, event: &mut MvcEvent, id: &str) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn get_list(&mut self, event: &mut MvcEvent) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn create(&mut self, event: &mut MvcEvent, data: Value) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn update(&mut self, event: &mut MvcEvent, id: &str, data: Value) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn replace_list(&mut self, event: &mut MvcEvent, data: Value) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn patch(&mut self, event: &mut MvcEvent, id: &str, data: Value) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn patch_list(&mut self, event: &mut MvcEvent, data: Value) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn delete(&mut self, event: &mut MvcEvent, id: &str) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn delete_list(&mut self, event: &mut MvcEvent, data: Value) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn head(&mut self, event: &mut MvcEvent, id: Option<&str>) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }

    fn options(&mut self, event: &mut MvcEvent) -> anyhow::Result<ActionResult> {
        method_not_allowed()
    }
}

/// Maps the request method and the route identifier onto a
/// [`RestfulResource`].
///
/// The identifier is the route parameter named by `identifier_name`
/// (`id` by default), falling back to a query parameter of the same name.
pub struct RestfulController<R> {
    resource: R,
    identifier_name: String,
}

impl<R: RestfulResource> RestfulController<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            identifier_name: "id".to_string(),
        }
    }

    pub fn with_identifier_name(mut self, name: impl Into<String>) -> Self {
        self.identifier_name = name.into();
        self
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    fn identifier(&self, event: &MvcEvent) -> Option<String> {
        if let Some(id) = event
            .route_match()
            .and_then(|m| m.param(&self.identifier_name))
        {
            return Some(id.to_string());
        }
        let query = event.request().uri().query()?;
        parse_query_string(query)
            .into_iter()
            .find(|(key, _)| *key == self.identifier_name)
            .map(|(_, value)| value)
    }
}

/// Decode a JSON or form-encoded request body.
pub(crate) fn decode_body(event: &MvcEvent) -> anyhow::Result<Value> {
    let body = event.request().body();
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let content_type = header_str(event.request(), header::CONTENT_TYPE.as_str()).unwrap_or("");
    if content_type.starts_with("application/json") || content_type.contains("+json") {
        return Ok(serde_json::from_slice(body)?);
    }

    let text = std::str::from_utf8(body)?;
    let fields = parse_query_string(text)
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    Ok(Value::Object(fields))
}

impl<R: RestfulResource> Controller for RestfulController<R> {
    fn dispatch(&mut self, event: &mut MvcEvent) -> anyhow::Result<ActionResult> {
        let method = event.request().method().clone();
        let id = self.identifier(event);
        tracing::debug!("RESTful {} (id: {:?})", method, id);

        match (method, id) {
            (Method::GET, Some(id)) => self.resource.get(event, &id),
            (Method::GET, None) => self.resource.get_list(event),
            (Method::HEAD, id) => self.resource.head(event, id.as_deref()),
            (Method::OPTIONS, _) => self.resource.options(event),
            (Method::POST, _) => {
                let data = decode_body(event)?;
                self.resource.create(event, data)
            }
            (Method::PUT, Some(id)) => {
                let data = decode_body(event)?;
                self.resource.update(event, &id, data)
            }
            (Method::PUT, None) => {
                let data = decode_body(event)?;
                self.resource.replace_list(event, data)
            }
            (Method::PATCH, Some(id)) => {
                let data = decode_body(event)?;
                self.resource.patch(event, &id, data)
            }
            (Method::PATCH, None) => {
                let data = decode_body(event)?;
                self.resource.patch_list(event, data)
            }
            (Method::DELETE, Some(id)) => self.resource.delete(event, &id),
            (Method::DELETE, None) => {
                let data = decode_body(event)?;
                self.resource.delete_list(event, data)
            }
            _ => method_not_allowed(),
        }
    }
}
