use super::{
    HTTP_SENDER_PRIORITY, HttpResponseSender, ResponseSender, ResponseSink, SendResponseEvent,
    stdout_sink,
};
use crate::config::ApplicationConfig;
use crate::di::{ServiceLocator, keys};
use crate::error::Result;
use crate::event::{
    ActionResult, EventManager, ListenerAggregate, ListenerHandle, MvcEvent, MvcStage,
};
use std::sync::Arc;

/// Stage name used by the sender chain.
pub const SEND_RESPONSE_STAGE: &str = "sendResponse";

/// Hands the final response to the sender chain at the end of `finish`.
pub struct SendResponseListener {
    senders: EventManager<SendResponseEvent>,
    sink: ResponseSink,
    enabled: bool,
}

impl SendResponseListener {
    /// A listener with no senders attached.
    pub fn new(sink: ResponseSink) -> Self {
        Self {
            senders: EventManager::new(),
            sink,
            enabled: true,
        }
    }

    /// A listener with the [`HttpResponseSender`] attached.
    pub fn with_defaults(sink: ResponseSink) -> Self {
        Self::new(sink).with_sender(HttpResponseSender, HTTP_SENDER_PRIORITY)
    }

    /// Build from the `config` service; the `ResponseSink` service is used
    /// when registered, standard output otherwise.
    pub fn from_services(services: &ServiceLocator) -> Result<Self> {
        let config = services.get::<ApplicationConfig>(keys::CONFIG)?;
        let sink = if services.has(keys::RESPONSE_SINK) {
            services
                .get::<ResponseSink>(keys::RESPONSE_SINK)?
                .as_ref()
                .clone()
        } else {
            stdout_sink()
        };
        Ok(Self::with_defaults(sink).enabled(config.send_response))
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_sender(mut self, sender: impl ResponseSender, priority: i32) -> Self {
        self.senders.attach(
            SEND_RESPONSE_STAGE,
            move |event: &mut SendResponseEvent| {
                sender.send(event)?;
                Ok(None)
            },
            priority,
        );
        self
    }

    pub fn sender_count(&self) -> usize {
        self.senders.listener_count(SEND_RESPONSE_STAGE)
    }

    pub fn send_response(&self, event: &mut MvcEvent) -> Result<Option<ActionResult>> {
        let response = std::mem::take(event.response_mut());
        let mut send_event = SendResponseEvent::new(response, Arc::clone(&self.sink));

        let outcome = self.senders.trigger(SEND_RESPONSE_STAGE, &mut send_event);
        if !send_event.content_sent() {
            tracing::warn!("No response sender wrote the response");
        }
        event.set_response(send_event.into_response());
        outcome.map(|_| None)
    }
}

impl ListenerAggregate for SendResponseListener {
    fn attach(
        self: Arc<Self>,
        events: &mut EventManager<MvcEvent>,
        _priority: i32,
    ) -> Vec<ListenerHandle> {
        if !self.enabled {
            return Vec::new();
        }
        vec![events.attach(
            MvcStage::Finish,
            move |event| self.send_response(event),
            -10000,
        )]
    }
}
