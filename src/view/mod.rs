//! View models, renderers and the listeners that connect them to the
//! lifecycle.

mod listeners;
mod manager;
mod model;
mod renderer;
mod strategy;

pub use listeners::{create_view_model, inject_template, inject_view_model};
pub use manager::ViewManager;
pub use model::{ModelKind, ViewModel};
pub use renderer::{JsonRenderer, Renderer, TemplateMapRenderer};
pub use strategy::{DefaultRenderingStrategy, ExceptionStrategy, RouteNotFoundStrategy};
