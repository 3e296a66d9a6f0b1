use crate::event::MvcEvent;
use crate::http::{header_str, parse_query_string};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Read-only access to the parameters of the current request.
pub struct Params<'a> {
    event: &'a MvcEvent,
}

impl<'a> Params<'a> {
    pub(crate) fn new(event: &'a MvcEvent) -> Self {
        Self { event }
    }

    /// A parameter of the matched route.
    pub fn from_route(&self, name: &str) -> Option<&'a str> {
        self.event.route_match().and_then(|m| m.param(name))
    }

    pub fn from_route_or(&self, name: &str, default: &'a str) -> &'a str {
        self.from_route(name).unwrap_or(default)
    }

    /// Every parameter of the matched route.
    pub fn route(&self) -> HashMap<String, String> {
        self.event
            .route_match()
            .map(|m| m.params().clone())
            .unwrap_or_default()
    }

    /// The first query parameter named `name`.
    pub fn from_query(&self, name: &str) -> Option<String> {
        self.query()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn query(&self) -> Vec<(String, String)> {
        self.event
            .request()
            .uri()
            .query()
            .map(parse_query_string)
            .unwrap_or_default()
    }

    /// The first field named `name` of a urlencoded request body.
    pub fn from_post(&self, name: &str) -> Option<String> {
        self.post()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn post(&self) -> Vec<(String, String)> {
        std::str::from_utf8(self.event.request().body())
            .map(parse_query_string)
            .unwrap_or_default()
    }

    pub fn from_header(&self, name: &str) -> Option<&'a str> {
        header_str(self.event.request(), name)
    }

    /// Deserialize the request body as JSON.
    pub fn from_json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(self.event.request().body())?)
    }
}

#[cfg(test)]
mod tests {
    use crate::di::ServiceLocator;
    use crate::event::MvcEvent;
    use crate::router::RouteMatch;
    use axum::body::Bytes;
    use axum::http::Request;
    use serde::Deserialize;
    use std::sync::Arc;

    fn event(body: &'static str) -> MvcEvent {
        let request = Request::builder()
            .method("POST")
            .uri("/album?page=2&sort=title")
            .header("x-requested-with", "XMLHttpRequest")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();
        let mut event = MvcEvent::new(request, Arc::new(ServiceLocator::new()));
        let mut route_match = RouteMatch::default();
        route_match.set_param("id", "42");
        event.set_route_match(Some(route_match));
        event
    }

    #[test]
    fn test_route_query_header() {
        let event = event("");
        let params = event.params();
        assert_eq!(params.from_route("id"), Some("42"));
        assert_eq!(params.from_route_or("action", "index"), "index");
        assert_eq!(params.from_query("page").as_deref(), Some("2"));
        assert_eq!(params.from_query("missing"), None);
        assert_eq!(params.from_header("X-Requested-With"), Some("XMLHttpRequest"));
    }

    #[test]
    fn test_post_fields() {
        let event = event("title=Blue+Train&artist=Coltrane");
        assert_eq!(event.params().from_post("title").as_deref(), Some("Blue Train"));
        assert_eq!(event.params().post().len(), 2);
    }

    #[test]
    fn test_json_body() {
        #[derive(Deserialize)]
        struct Album {
            title: String,
        }

        let event = event(r#"{"title":"Giant Steps"}"#);
        let album: Album = event.params().from_json().unwrap();
        assert_eq!(album.title, "Giant Steps");
        assert!(event.params().from_json::<Vec<u8>>().is_err());
    }
}
