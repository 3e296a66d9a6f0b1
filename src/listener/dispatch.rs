use crate::controller::ControllerManager;
use crate::di::keys;
use crate::error::{MvcError, Result};
use crate::event::{
    ActionResult, ErrorKind, Event, EventManager, ListenerAggregate, ListenerHandle, MvcEvent,
    MvcFailure, MvcStage,
};
use std::sync::Arc;

/// Resolves the matched controller and dispatches the event to it.
///
/// Lookup failures and controller errors are recorded on the event and
/// stop the dispatch stage; they never escape as errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchListener;

fn fail(event: &mut MvcEvent, failure: MvcFailure) -> Result<Option<ActionResult>> {
    tracing::warn!("Dispatch failed: {}", failure);
    event.set_error(failure);
    event.stop_propagation(true);
    Ok(None)
}

impl DispatchListener {
    pub fn on_dispatch(event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        let Some(name) = event.controller_name().map(str::to_string) else {
            return fail(
                event,
                MvcFailure::new(
                    ErrorKind::ControllerNotFound,
                    "The route match names no controller",
                ),
            );
        };

        let manager = event
            .services()
            .get::<ControllerManager>(keys::CONTROLLER_MANAGER)?;

        let mut controller = match manager.get(&name, event.services()) {
            Ok(controller) => controller,
            Err(MvcError::ControllerNotFound { .. }) => {
                return fail(
                    event,
                    MvcFailure::new(
                        ErrorKind::ControllerNotFound,
                        format!("Controller '{}' could not be found", name),
                    )
                    .with_controller(name),
                );
            }
            Err(MvcError::ControllerInvalid { .. }) => {
                return fail(
                    event,
                    MvcFailure::new(
                        ErrorKind::ControllerInvalid,
                        format!("Controller '{}' is not dispatchable", name),
                    )
                    .with_controller(name),
                );
            }
            Err(e) => return Err(e),
        };

        event.set_target(name.as_str());
        tracing::debug!("Dispatching to controller '{}'", name);

        match controller.dispatch(event) {
            Ok(ActionResult::Response(response)) => Ok(Some(ActionResult::Response(response))),
            Ok(result) => {
                event.set_result(result);
                Ok(None)
            }
            Err(e) => fail(
                event,
                MvcFailure::new(ErrorKind::Exception, format!("{:#}", e)).with_controller(name),
            ),
        }
    }
}

impl ListenerAggregate for DispatchListener {
    fn attach(
        self: Arc<Self>,
        events: &mut EventManager<MvcEvent>,
        priority: i32,
    ) -> Vec<ListenerHandle> {
        vec![events.attach(MvcStage::Dispatch, Self::on_dispatch, priority)]
    }
}
