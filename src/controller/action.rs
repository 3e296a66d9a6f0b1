use super::Controller;
use crate::event::{ActionResult, ErrorKind, MvcEvent};
use crate::view::ViewModel;
use axum::http::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;

type Action = Arc<dyn Fn(&mut MvcEvent) -> anyhow::Result<ActionResult> + Send + Sync>;

/// Dispatches to one of a table of named actions.
///
/// The action comes from the `action` route parameter (default `index`).
/// Names are compared case-insensitively with dashes and underscores
/// ignored, so `list-all`, `list_all` and `listAll` are the same action.
#[derive(Default, Clone)]
pub struct ActionController {
    actions: HashMap<String, Action>,
}

impl ActionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action<F>(mut self, name: &str, action: F) -> Self
    where
        F: Fn(&mut MvcEvent) -> anyhow::Result<ActionResult> + Send + Sync + 'static,
    {
        self.actions.insert(normalize(name), Arc::new(action));
        self
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(&normalize(name))
    }

    fn not_found(event: &mut MvcEvent) -> ActionResult {
        *event.response_mut().status_mut() = StatusCode::NOT_FOUND;
        event.set_param("reason", ErrorKind::ControllerCannotDispatch.to_string());
        ActionResult::Model(ViewModel::new().with_variable("content", "Page not found"))
    }
}

impl Controller for ActionController {
    fn dispatch(&mut self, event: &mut MvcEvent) -> anyhow::Result<ActionResult> {
        let name = event
            .route_match()
            .map_or("index", |m| m.param_or("action", "index"))
            .to_string();

        match self.actions.get(&normalize(&name)) {
            Some(action) => {
                tracing::debug!("Dispatching action '{}'", name);
                action(event)
            }
            None => {
                tracing::debug!("No action '{}' on {}", name, event.target());
                Ok(Self::not_found(event))
            }
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
