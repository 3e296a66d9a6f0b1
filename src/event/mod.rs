//! Event Module
//!
//! A small publish/subscribe core over named lifecycle stages.
//!
//! # Dispatch Order
//!
//! ```text
//! trigger("route", &mut event)
//!    ↓
//! listener (priority 10000)
//!    ↓
//! listener (priority 1)      ← registered first
//!    ↓
//! listener (priority 1)      ← registered second
//!    ↓
//! listener (priority -10000)
//! ```
//!
//! Dispatch stops early when a listener stops propagation on the event, or
//! when the caller's predicate accepts the value a listener returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use stagehand::event::{EventManager, MvcEvent, MvcStage};
//!
//! let mut events = EventManager::<MvcEvent>::new();
//! let handle = events.attach(MvcStage::Route, |event| {
//!     tracing::debug!("routing {}", event.request().uri());
//!     Ok(None)
//! }, 100);
//!
//! events.detach(&handle);
//! ```

mod aggregate;
mod manager;
mod mvc;

pub use aggregate::ListenerAggregate;
pub use manager::{DEFAULT_PRIORITY, EventManager, Listener, ListenerHandle, ResponseCollection};
pub use mvc::{ActionResult, ErrorKind, MvcEvent, MvcFailure, MvcStage};

/// An event that can flow through an [`EventManager`].
pub trait Event: Send + 'static {
    /// Value a listener may hand back to the caller of `trigger`.
    type Outcome;

    fn is_propagation_stopped(&self) -> bool;

    fn stop_propagation(&mut self, flag: bool);
}
