use super::ViewModel;
use crate::error::{MvcError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Turns a view model tree into response content.
///
/// Template engines are external; implement this trait to plug one in and
/// register it in the service locator under `"ViewRenderer"`.
pub trait Renderer: Send + Sync {
    fn render(&self, model: &ViewModel) -> Result<String>;

    /// Content type of what `render` produces.
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}

/// Serializes model variables as a JSON object.
///
/// Each child is nested under its `capture_to` key.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    fn collect(model: &ViewModel) -> Map<String, Value> {
        let mut variables = model.variables().clone();
        for child in model.children() {
            variables.insert(
                child.capture_to().to_string(),
                Value::Object(Self::collect(child)),
            );
        }
        variables
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, model: &ViewModel) -> Result<String> {
        serde_json::to_string(&Value::Object(Self::collect(model)))
            .map_err(|e| MvcError::render(e.to_string()))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

/// Resolves template names from an in-memory map and substitutes
/// `{{ name }}` placeholders with model variables.
///
/// Unknown placeholders render empty; unknown templates are a render error.
#[derive(Debug, Clone, Default)]
pub struct TemplateMapRenderer {
    templates: HashMap<String, String>,
}

impl TemplateMapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Templates for the layout and the built-in error pages.
    pub fn with_defaults(layout: &str, not_found: &str, exception: &str) -> Self {
        Self::new()
            .with_template(layout, "{{ content }}")
            .with_template(not_found, "<h1>{{ message }}</h1>\n<p>{{ reason }}</p>")
            .with_template(exception, "<h1>{{ message }}</h1>\n<pre>{{ exception }}</pre>")
    }

    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(name.into(), source.into());
        self
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    fn substitute(source: &str, variables: &Map<String, Value>) -> String {
        let mut output = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            let Some(offset) = rest[start..].find("}}") else {
                break;
            };
            output.push_str(&rest[..start]);
            let key = rest[start + 2..start + offset].trim();
            match variables.get(key) {
                Some(Value::String(s)) => output.push_str(s),
                Some(Value::Null) | None => {}
                Some(other) => output.push_str(&other.to_string()),
            }
            rest = &rest[start + offset + 2..];
        }
        output.push_str(rest);
        output
    }
}

impl Renderer for TemplateMapRenderer {
    fn render(&self, model: &ViewModel) -> Result<String> {
        let mut variables = model.variables().clone();

        for child in model.children() {
            let content = self.render(child)?;
            let slot = variables
                .entry(child.capture_to().to_string())
                .or_insert_with(|| Value::String(String::new()));
            match slot {
                Value::String(existing) => existing.push_str(&content),
                other => *other = Value::String(content),
            }
        }

        let source = self.templates.get(model.template()).ok_or_else(|| {
            MvcError::render(format!(
                "unable to resolve template \"{}\"",
                model.template()
            ))
        })?;

        Ok(Self::substitute(source, &variables))
    }
}
