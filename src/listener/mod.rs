//! Built-in route and dispatch listeners.

mod dispatch;
mod http_method;
mod route;

pub use dispatch::DispatchListener;
pub use http_method::{HTTP_METHOD_PRIORITY, HttpMethodListener};
pub use route::RouteListener;
