//! Service location by string key.
//!
//! The locator is an explicit registration table (name → instance or
//! factory) built at startup. Listener aggregates and controllers are
//! resolved from it by name.

mod builder;
mod container;

pub use builder::ServiceLocatorBuilder;
pub use container::ServiceLocator;

/// Well-known service names.
pub mod keys {
    pub const CONFIG: &str = "config";
    pub const CONTROLLER_MANAGER: &str = "ControllerManager";
    pub const VIEW_RENDERER: &str = "ViewRenderer";
    pub const RESPONSE_SINK: &str = "ResponseSink";

    pub const ROUTE_LISTENER: &str = "RouteListener";
    pub const DISPATCH_LISTENER: &str = "DispatchListener";
    pub const HTTP_METHOD_LISTENER: &str = "HttpMethodListener";
    pub const VIEW_MANAGER: &str = "ViewManager";
    pub const SEND_RESPONSE_LISTENER: &str = "SendResponseListener";
}
