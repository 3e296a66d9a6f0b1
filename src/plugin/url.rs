use crate::error::{MvcError, Result};
use crate::event::MvcEvent;

/// Assembles URLs from route names.
pub struct Url<'a> {
    event: &'a MvcEvent,
}

impl<'a> Url<'a> {
    pub(crate) fn new(event: &'a MvcEvent) -> Self {
        Self { event }
    }

    /// Assemble the URL of a route.
    ///
    /// With `name == None` the matched route is used and its parameters are
    /// reused underneath `params`.
    pub fn from_route(&self, name: Option<&str>, params: &[(&str, &str)]) -> Result<String> {
        let router = self
            .event
            .router()
            .ok_or_else(|| MvcError::route("no router is configured"))?;

        let (name, mut merged) = match name {
            Some(name) => (name, Default::default()),
            None => {
                let route_match = self
                    .event
                    .route_match()
                    .ok_or_else(|| MvcError::route("no route was matched to reuse"))?;
                (route_match.route_name(), route_match.params().clone())
            }
        };

        for (key, value) in params {
            merged.insert(key.to_string(), value.to_string());
        }
        router.assemble(name, &merged)
    }
}
