//! Response senders.
//!
//! At the end of the finish stage the response is handed to a chain of
//! [`ResponseSender`]s, dispatched through their own [`EventManager`]. The
//! first sender that writes the content stops the chain.
//!
//! [`EventManager`]: crate::event::EventManager

mod listener;
mod sender;

pub use listener::{SEND_RESPONSE_STAGE, SendResponseListener};
pub use sender::{BodyResponseSender, HTTP_SENDER_PRIORITY, HttpResponseSender};

use crate::error::{MvcError, Result};
use crate::event::Event;
use crate::http::HttpResponse;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

/// Where senders write to.
pub type ResponseSink = Arc<Mutex<dyn Write + Send>>;

/// A sink writing to standard output.
pub fn stdout_sink() -> ResponseSink {
    Arc::new(Mutex::new(std::io::stdout()))
}

/// The event carried through the sender chain.
pub struct SendResponseEvent {
    response: HttpResponse,
    sink: ResponseSink,
    headers_sent: bool,
    content_sent: bool,
    propagation_stopped: bool,
}

impl SendResponseEvent {
    pub fn new(response: HttpResponse, sink: ResponseSink) -> Self {
        Self {
            response,
            sink,
            headers_sent: false,
            content_sent: false,
            propagation_stopped: false,
        }
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn into_response(self) -> HttpResponse {
        self.response
    }

    /// Lock the sink for writing.
    pub fn sink(&self) -> Result<MutexGuard<'_, dyn Write + Send + 'static>> {
        self.sink
            .lock()
            .map_err(|_| MvcError::Io(std::io::Error::other("response sink lock poisoned")))
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    pub fn set_headers_sent(&mut self) {
        self.headers_sent = true;
    }

    pub fn content_sent(&self) -> bool {
        self.content_sent
    }

    pub fn set_content_sent(&mut self) {
        self.content_sent = true;
    }
}

impl Event for SendResponseEvent {
    type Outcome = ();

    fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    fn stop_propagation(&mut self, flag: bool) {
        self.propagation_stopped = flag;
    }
}

/// Writes a response to the event's sink.
pub trait ResponseSender: Send + Sync + 'static {
    fn send(&self, event: &mut SendResponseEvent) -> Result<()>;
}

impl<F> ResponseSender for F
where
    F: Fn(&mut SendResponseEvent) -> Result<()> + Send + Sync + 'static,
{
    fn send(&self, event: &mut SendResponseEvent) -> Result<()> {
        self(event)
    }
}
