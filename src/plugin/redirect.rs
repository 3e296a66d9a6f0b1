use super::Url;
use crate::error::{MvcError, Result};
use crate::event::{ActionResult, MvcEvent};
use crate::http::{HttpResponse, empty_response};
use axum::http::{HeaderValue, StatusCode, header};

/// Builds redirect responses.
pub struct Redirect<'a> {
    event: &'a MvcEvent,
    status: StatusCode,
}

impl<'a> Redirect<'a> {
    pub(crate) fn new(event: &'a MvcEvent) -> Self {
        Self {
            event,
            status: StatusCode::FOUND,
        }
    }

    /// Use another 3xx status (e.g. `301` or `303`).
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    fn response(&self, location: &str) -> Result<HttpResponse> {
        if !location.is_ascii() {
            return Err(MvcError::route(format!(
                "redirect target '{}' is not ASCII",
                location
            )));
        }
        let value = HeaderValue::from_str(location).map_err(|e| {
            MvcError::route(format!("invalid redirect target '{}': {}", location, e))
        })?;
        let mut response = empty_response(self.status);
        response.headers_mut().insert(header::LOCATION, value);
        Ok(response)
    }

    /// Redirect to `url`; it must be a valid `Location` value, so non-ASCII
    /// targets need percent-encoding first.
    pub fn to_url(&self, url: &str) -> Result<ActionResult> {
        Ok(ActionResult::Response(self.response(url)?))
    }

    /// Redirect to a named route; `None` reuses the matched route.
    pub fn to_route(&self, name: Option<&str>, params: &[(&str, &str)]) -> Result<ActionResult> {
        let url = Url::new(self.event).from_route(name, params)?;
        self.to_url(&url)
    }

    /// Redirect to the current request URI.
    pub fn refresh(&self) -> Result<ActionResult> {
        let uri = self.event.request().uri();
        let target = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string);
        self.to_url(&target)
    }
}
