use crate::error::Result;
use crate::event::{
    ActionResult, ErrorKind, Event, EventManager, ListenerAggregate, ListenerHandle, MvcEvent,
    MvcFailure, MvcStage,
};
use std::sync::Arc;

/// Matches the request against the application router.
///
/// On a miss it records `error-router-no-match` and stops the route stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteListener;

impl RouteListener {
    pub fn on_route(event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        let matched = event.router().and_then(|router| router.route(event.request()));

        match matched {
            Some(route_match) => {
                tracing::debug!("Matched route '{}'", route_match.route_name());
                event.set_route_match(Some(route_match));
            }
            None => {
                let message = format!(
                    "The requested URL {} {} could not be matched by routing",
                    event.request().method(),
                    event.request().uri().path()
                );
                tracing::warn!("{}", message);
                event.set_error(MvcFailure::new(ErrorKind::RouterNoMatch, message));
                event.stop_propagation(true);
            }
        }
        Ok(None)
    }
}

impl ListenerAggregate for RouteListener {
    fn attach(
        self: Arc<Self>,
        events: &mut EventManager<MvcEvent>,
        priority: i32,
    ) -> Vec<ListenerHandle> {
        vec![events.attach(MvcStage::Route, Self::on_route, priority)]
    }
}
