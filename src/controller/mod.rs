//! Controllers and the manager that builds them by name.
//!
//! Controllers are created per request from a registered factory, so they
//! may hold request-scoped state in `&mut self`.

mod action;
mod restful;

pub use action::ActionController;
pub use restful::{RestfulController, RestfulResource};

use crate::di::ServiceLocator;
use crate::error::{MvcError, Result};
use crate::event::{ActionResult, MvcEvent};
use std::collections::HashMap;
use std::sync::Arc;

/// Something the dispatch listener can hand the event to.
pub trait Controller: Send {
    fn dispatch(&mut self, event: &mut MvcEvent) -> anyhow::Result<ActionResult>;
}

type ControllerFactory =
    Arc<dyn Fn(&ServiceLocator) -> anyhow::Result<Box<dyn Controller>> + Send + Sync>;

/// Name → controller factory table.
#[derive(Default)]
pub struct ControllerManager {
    factories: HashMap<String, ControllerFactory>,
    aliases: HashMap<String, String>,
}

impl ControllerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory building a controller for each dispatch.
    pub fn register<C, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        C: Controller + 'static,
        F: Fn(&ServiceLocator) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        let factory: ControllerFactory = Arc::new(move |services: &ServiceLocator| {
            Ok(Box::new(factory(services)?) as Box<dyn Controller>)
        });
        self.factories.insert(name.into(), factory);
        self
    }

    /// Let `alias` resolve to the controller registered as `target`.
    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(self.canonical(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build the controller registered under `name`.
    ///
    /// A name known to the service locator but not registered here is
    /// `ControllerInvalid`; an unknown name is `ControllerNotFound`.
    pub fn get(&self, name: &str, services: &ServiceLocator) -> Result<Box<dyn Controller>> {
        let Some(factory) = self.factories.get(self.canonical(name)) else {
            if services.has(name) {
                return Err(MvcError::ControllerInvalid {
                    name: name.to_string(),
                });
            }
            return Err(MvcError::ControllerNotFound {
                name: name.to_string(),
            });
        };

        factory(services).map_err(|e| {
            tracing::warn!("Controller factory for '{}' failed: {:#}", name, e);
            MvcError::ControllerInvalid {
                name: name.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    struct Hello;

    impl Controller for Hello {
        fn dispatch(&mut self, _event: &mut MvcEvent) -> anyhow::Result<ActionResult> {
            Ok(ActionResult::Empty)
        }
    }

    fn manager() -> ControllerManager {
        let mut manager = ControllerManager::new();
        manager
            .register("hello", |_| Ok(Hello))
            .alias("Application\\Controller\\Hello", "hello");
        manager
    }

    #[test]
    fn test_get_by_name_and_alias() {
        let services = ServiceLocator::new();
        let manager = manager();
        assert!(manager.has("hello"));
        assert!(manager.has("Application\\Controller\\Hello"));

        let request = Request::builder().uri("/").body(Bytes::new()).unwrap();
        let mut event = MvcEvent::new(request, Arc::new(ServiceLocator::new()));
        let mut controller = manager.get("Application\\Controller\\Hello", &services).unwrap();
        assert!(matches!(
            controller.dispatch(&mut event).unwrap(),
            ActionResult::Empty
        ));
    }

    #[test]
    fn test_unknown_name_not_found() {
        let services = ServiceLocator::new();
        assert!(matches!(
            manager().get("missing", &services),
            Err(MvcError::ControllerNotFound { name }) if name == "missing"
        ));
    }

    #[test]
    fn test_non_controller_service_is_invalid() {
        let mut services = ServiceLocator::new();
        services.set("AlbumTable", 42_u32);
        assert!(matches!(
            manager().get("AlbumTable", &services),
            Err(MvcError::ControllerInvalid { .. })
        ));
    }

    #[test]
    fn test_failing_factory_is_invalid() {
        let mut manager = ControllerManager::new();
        manager.register::<Hello, _>("broken", |_| Err(anyhow::anyhow!("no database")));
        assert!(matches!(
            manager.get("broken", &ServiceLocator::new()),
            Err(MvcError::ControllerInvalid { .. })
        ));
    }
}
