use super::{EventManager, ListenerHandle, MvcEvent};
use std::sync::Arc;

/// A unit that registers one or more listeners against lifecycle stages.
///
/// Aggregates are shared, so listeners usually capture a clone of `self`:
///
/// ```rust,ignore
/// impl ListenerAggregate for AuditListener {
///     fn attach(self: Arc<Self>, events: &mut EventManager<MvcEvent>, priority: i32) -> Vec<ListenerHandle> {
///         let this = Arc::clone(&self);
///         vec![events.attach(MvcStage::Finish, move |event| this.on_finish(event), priority)]
///     }
/// }
/// ```
pub trait ListenerAggregate: Send + Sync + 'static {
    /// Register listeners and return their handles for later detaching.
    fn attach(
        self: Arc<Self>,
        events: &mut EventManager<MvcEvent>,
        priority: i32,
    ) -> Vec<ListenerHandle>;
}
