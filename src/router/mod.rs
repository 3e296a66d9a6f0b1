//! Routing collaborator.
//!
//! The lifecycle only needs two things from a router: turn a request into a
//! [`RouteMatch`] and turn a route name plus parameters back into a URL.
//! [`HttpRouter`] is a small adapter over `matchit` for applications that do
//! not bring their own.

mod http;

pub use http::HttpRouter;

use crate::error::Result;
use crate::http::HttpRequest;
use std::collections::HashMap;

/// The outcome of matching a request to a named route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    route_name: String,
    params: HashMap<String, String>,
}

impl RouteMatch {
    pub fn new(route_name: impl Into<String>, params: HashMap<String, String>) -> Self {
        Self {
            route_name: route_name.into(),
            params,
        }
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn param_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.param(name).unwrap_or(default)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }
}

/// Matches requests and assembles URLs.
pub trait Router: Send + Sync {
    fn route(&self, request: &HttpRequest) -> Option<RouteMatch>;

    fn assemble(&self, name: &str, params: &HashMap<String, String>) -> Result<String>;
}
