//! # Stagehand
//!
//! An event-driven MVC request lifecycle for Rust.
//!
//! An [`Application`] runs every request through a fixed set of named
//! stages. Listeners attach to stages with a priority; higher priorities run
//! first and ties keep their registration order.
//!
//! ```text
//! route → dispatch → render → finish
//!   ↘        ↘          ↘
//!    dispatch.error    render.error
//! ```
//!
//! ## Features
//!
//! - **Prioritized listeners**: one [`EventManager`] per application, with
//!   short-circuiting by propagation flag or by returned response
//! - **Bootstrapper chain**: ordered setup units, including listener
//!   aggregates resolved from the service locator by name
//! - **Controllers**: action tables and RESTful resources
//! - **Plugins**: params, content negotiation, redirects, URLs, forwarding
//! - **Response senders**: a second listener chain flushing the response
//! - **Hosting**: a tower service and `axum` router for the lifecycle
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stagehand::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> stagehand::Result<()> {
//!     let mut router = HttpRouter::new();
//!     router.add_route("album", "/album/{action}", &[("controller", "album")])?;
//!
//!     let app = Application::builder()
//!         .router(router)
//!         .controller("album", |_| {
//!             Ok(ActionController::new()
//!                 .action("index", |_| Ok(ViewModel::json().with_variable("albums", 3).into())))
//!         })
//!         .init()?;
//!
//!     stagehand::server::serve(Arc::new(app), "127.0.0.1:3000").await
//! }
//! ```

pub mod config;
pub mod controller;
pub mod di;
pub mod error;
pub mod event;
pub mod exception;
pub mod http;
pub mod lifecycle;
pub mod listener;
pub mod plugin;
pub mod router;
pub mod send;
pub mod server;
pub mod view;

pub use config::{ApplicationConfig, ConfigService};
pub use controller::{ActionController, Controller, ControllerManager};
pub use di::{ServiceLocator, ServiceLocatorBuilder};
pub use error::{MvcError, Result};
pub use event::{
    ActionResult, ErrorKind, Event, EventManager, ListenerAggregate, ListenerHandle, MvcEvent,
    MvcFailure, MvcStage,
};
pub use lifecycle::{Application, ApplicationBuilder, Bootstrapper, BootstrapperChain};
pub use router::{HttpRouter, RouteMatch, Router};
pub use view::{ModelKind, ViewModel};

/// Common imports
pub mod prelude {
    pub use crate::config::ApplicationConfig;
    pub use crate::controller::{
        ActionController, Controller, ControllerManager, RestfulController, RestfulResource,
    };
    pub use crate::di::{ServiceLocator, ServiceLocatorBuilder, keys};
    pub use crate::error::{MvcError, Result};
    pub use crate::event::{
        ActionResult, ErrorKind, Event, EventManager, ListenerAggregate, ListenerHandle, MvcEvent,
        MvcFailure, MvcStage,
    };
    pub use crate::http::{HttpRequest, HttpResponse};
    pub use crate::lifecycle::{
        Application, ApplicationBuilder, Bootstrapper, BootstrapperChain,
        ListenerProviderBootstrapper,
    };
    pub use crate::plugin::AcceptableViewModelSelector;
    pub use crate::router::{HttpRouter, RouteMatch, Router};
    pub use crate::view::{ModelKind, Renderer, TemplateMapRenderer, ViewModel};
}
