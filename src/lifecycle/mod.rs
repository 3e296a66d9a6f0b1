//! Lifecycle Module
//!
//! The application object and the driver of the request lifecycle.
//!
//! # Lifecycle Stages
//!
//! ```text
//! bootstrap                  ← once, from Application::bootstrap
//!
//! route ──── response ────────────────────────────┐
//!   │ failure                                     │
//!   ├─────────────────┐                           │
//!   ↓                 │                           │
//! dispatch ─ response ┼───────────────────────────┤
//!   │ failure         │                           │
//!   ↓                 ↓                           │
//!   │           dispatch.error ─ no result ───────┤  (default error response)
//!   ↓                 ↓                           │
//! render ──── failure ──→ render.error ───────────┤
//!   ↓                                             ↓
//! finish ←────────────────────────────────────────┘
//! ```
//!
//! Each stage is one `trigger` of the application's event manager with the
//! request's [`MvcEvent`](crate::event::MvcEvent).

mod application;
mod bootstrap;
mod shutdown;

pub use application::{Application, ApplicationBuilder};
pub use bootstrap::{
    Bootstrapper, BootstrapperChain, DEFAULT_LISTENERS, ListenerProviderBootstrapper,
};
pub use shutdown::shutdown_signal;
