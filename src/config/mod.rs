use crate::error::{MvcError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Seeded from the process environment.
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// `true`, `1`, `yes` and `on` (any case) are true.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )
        })
    }

    /// Comma separated values, trimmed, empties dropped.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|v| {
                v.trim()
                    .parse::<T>()
                    .map_err(|e| MvcError::config(format!("{}: {}", key, e)))
            })
            .transpose()
    }
}

/// Settings read by the default listeners.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Include failure details in error pages.
    pub display_exceptions: bool,
    /// Include the not-found reason in 404 pages.
    pub display_not_found_reason: bool,
    pub not_found_template: String,
    pub exception_template: String,
    pub layout_template: String,
    /// Methods accepted by the HTTP method listener.
    pub allowed_methods: Vec<String>,
    pub http_method_listener: bool,
    /// Write the final response to the response sink at finish
    /// (standard output unless a `ResponseSink` service is registered).
    pub send_response: bool,
    /// Maximum buffered request body size for the axum adapter.
    pub body_limit: usize,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            display_exceptions: false,
            display_not_found_reason: false,
            not_found_template: "error/404".to_string(),
            exception_template: "error/index".to_string(),
            layout_template: "layout/layout".to_string(),
            allowed_methods: [
                "OPTIONS", "GET", "HEAD", "POST", "PUT", "DELETE", "TRACE", "CONNECT", "PATCH",
                "PROPFIND",
            ]
            .iter()
            .map(|m| m.to_string())
            .collect(),
            http_method_listener: true,
            send_response: false,
            body_limit: 2 * 1024 * 1024,
        }
    }
}

impl ApplicationConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| MvcError::config(e.to_string()))
    }

    /// Overlay `{prefix}DISPLAY_EXCEPTIONS`-style keys from a config service.
    pub fn from_service(service: &ConfigService, prefix: &str) -> Result<Self> {
        let key = |name: &str| format!("{}{}", prefix, name);
        let mut config = Self::default();

        if let Some(v) = service.get_bool(&key("DISPLAY_EXCEPTIONS")) {
            config.display_exceptions = v;
        }
        if let Some(v) = service.get_bool(&key("DISPLAY_NOT_FOUND_REASON")) {
            config.display_not_found_reason = v;
        }
        if let Some(v) = service.get(&key("NOT_FOUND_TEMPLATE")) {
            config.not_found_template = v;
        }
        if let Some(v) = service.get(&key("EXCEPTION_TEMPLATE")) {
            config.exception_template = v;
        }
        if let Some(v) = service.get(&key("LAYOUT_TEMPLATE")) {
            config.layout_template = v;
        }
        if let Some(v) = service.get_list(&key("ALLOWED_METHODS")) {
            config.allowed_methods = v.into_iter().map(|m| m.to_ascii_uppercase()).collect();
        }
        if let Some(v) = service.get_bool(&key("HTTP_METHOD_LISTENER")) {
            config.http_method_listener = v;
        }
        if let Some(v) = service.get_bool(&key("SEND_RESPONSE")) {
            config.send_response = v;
        }
        if let Some(v) = service.get_parsed::<usize>(&key("BODY_LIMIT"))? {
            config.body_limit = v;
        }

        Ok(config)
    }

    /// Read `MVC_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_service(&ConfigService::new(), "MVC_")
    }
}
