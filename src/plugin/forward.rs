use crate::controller::ControllerManager;
use crate::di::keys;
use crate::event::{ActionResult, MvcEvent};
use crate::router::RouteMatch;

/// Deepest chain of nested forwards before dispatch is refused.
pub const MAX_FORWARD_DEPTH: usize = 10;

/// Dispatches another controller within the current request.
pub struct Forward<'a> {
    event: &'a mut MvcEvent,
}

impl<'a> Forward<'a> {
    pub(crate) fn new(event: &'a mut MvcEvent) -> Self {
        Self { event }
    }

    /// Dispatch `controller` with `params` as its route parameters.
    ///
    /// The route match and target of the event are restored afterwards.
    pub fn dispatch(self, controller: &str, params: &[(&str, &str)]) -> anyhow::Result<ActionResult> {
        let event = self.event;
        if event.forward_depth >= MAX_FORWARD_DEPTH {
            anyhow::bail!(
                "Circular forwarding detected: more than {} nested forwards",
                MAX_FORWARD_DEPTH
            );
        }

        let manager = event
            .services()
            .get::<ControllerManager>(keys::CONTROLLER_MANAGER)?;
        let mut target = manager.get(controller, event.services())?;

        let route_name = event
            .route_match()
            .map_or_else(String::new, |m| m.route_name().to_string());
        let mut route_match = RouteMatch::new(route_name, Default::default());
        for (key, value) in params {
            route_match.set_param(*key, *value);
        }
        route_match.set_param("controller", controller);

        let previous_match = event.route_match().cloned();
        let previous_target = event.target().to_string();
        event.set_route_match(Some(route_match));
        event.set_target(controller);
        event.forward_depth += 1;
        tracing::debug!("Forwarding to '{}' (depth {})", controller, event.forward_depth);

        let result = target.dispatch(event);

        event.forward_depth -= 1;
        event.set_target(previous_target);
        event.set_route_match(previous_match);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ActionController, Controller};
    use crate::di::ServiceLocator;
    use axum::body::Bytes;
    use axum::http::Request;
    use serde_json::{Map, Value};
    use std::sync::Arc;

    struct Looping;

    impl Controller for Looping {
        fn dispatch(&mut self, event: &mut MvcEvent) -> anyhow::Result<ActionResult> {
            event.forward().dispatch("loop", &[])
        }
    }

    fn event() -> MvcEvent {
        let mut controllers = ControllerManager::new();
        controllers
            .register("sidebar", |_| {
                Ok(ActionController::new().action("recent", |event| {
                    let mut data = Map::new();
                    let from = event.params().from_route("limit").unwrap_or("0");
                    data.insert("limit".to_string(), Value::from(from));
                    data.insert("target".to_string(), Value::from(event.target()));
                    Ok(ActionResult::Data(data))
                }))
            })
            .register("loop", |_| Ok(Looping));

        let mut services = ServiceLocator::new();
        services.set(keys::CONTROLLER_MANAGER, controllers);

        let request = Request::builder().uri("/").body(Bytes::new()).unwrap();
        let mut event = MvcEvent::new(request, Arc::new(services));
        let mut route_match = RouteMatch::new("home", Default::default());
        route_match.set_param("controller", "index");
        event.set_route_match(Some(route_match));
        event.set_target("index");
        event
    }

    #[test]
    fn test_forward_dispatches_and_restores() {
        let mut event = event();
        let result = event
            .forward()
            .dispatch("sidebar", &[("action", "recent"), ("limit", "5")])
            .unwrap();

        match result {
            ActionResult::Data(data) => {
                assert_eq!(data["limit"], "5");
                assert_eq!(data["target"], "sidebar");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(event.controller_name(), Some("index"));
        assert_eq!(event.target(), "index");
    }

    #[test]
    fn test_circular_forward_is_refused() {
        let mut event = event();
        let error = event.forward().dispatch("loop", &[]).unwrap_err();
        assert!(error.to_string().contains("Circular forwarding"));
        assert_eq!(event.forward_depth, 0);
    }

    #[test]
    fn test_unknown_controller_is_error() {
        let mut event = event();
        assert!(event.forward().dispatch("missing", &[]).is_err());
    }
}
