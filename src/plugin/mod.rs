//! Controller plugins.
//!
//! Plugins are helpers reachable from the event a controller receives:
//!
//! ```rust,ignore
//! fn edit(event: &mut MvcEvent) -> anyhow::Result<ActionResult> {
//!     let id = event.params().from_route("id").unwrap_or("0").to_string();
//!     if event.request().method() == Method::POST {
//!         return Ok(event.redirect().to_route(Some("album"), &[])?);
//!     }
//!     event.layout("layout/admin");
//!     Ok(ViewModel::new().with_variable("id", id).into())
//! }
//! ```

mod accept;
mod forward;
mod params;
mod redirect;
mod url;

pub use accept::AcceptableViewModelSelector;
pub use forward::{Forward, MAX_FORWARD_DEPTH};
pub use params::Params;
pub use redirect::Redirect;
pub use url::Url;

use crate::event::MvcEvent;
use crate::view::ViewModel;

impl MvcEvent {
    pub fn params(&self) -> Params<'_> {
        Params::new(self)
    }

    pub fn redirect(&self) -> Redirect<'_> {
        Redirect::new(self)
    }

    pub fn url(&self) -> Url<'_> {
        Url::new(self)
    }

    pub fn forward(&mut self) -> Forward<'_> {
        Forward::new(self)
    }

    /// Set the template of the root (layout) model.
    pub fn layout(&mut self, template: impl Into<String>) {
        self.view_model_mut().set_template(template);
    }

    /// A view model of the kind the client asked for.
    pub fn acceptable_view_model(&self, selector: &AcceptableViewModelSelector) -> ViewModel {
        selector.view_model(self.request())
    }
}
