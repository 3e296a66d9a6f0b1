use super::{Event, ListenerAggregate, MvcEvent};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Priority used by the built-in listeners unless stated otherwise.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Registration ids are unique across every manager in the process.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

/// A callable registered against a stage.
///
/// Closures of the shape `Fn(&mut E) -> Result<Option<E::Outcome>>` implement
/// this automatically.
pub trait Listener<E: Event>: Send + Sync {
    fn on_event(&self, event: &mut E) -> Result<Option<E::Outcome>>;
}

impl<E, F> Listener<E> for F
where
    E: Event,
    F: Fn(&mut E) -> Result<Option<E::Outcome>> + Send + Sync,
{
    fn on_event(&self, event: &mut E) -> Result<Option<E::Outcome>> {
        self(event)
    }
}

/// Identity of one registration, returned by `attach`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    stage: String,
    id: u64,
}

impl ListenerHandle {
    pub fn stage(&self) -> &str {
        &self.stage
    }
}

struct ListenerEntry<E: Event> {
    id: u64,
    priority: i32,
    listener: Arc<dyn Listener<E>>,
}

/// Values returned by the listeners of one `trigger` call, in call order.
#[derive(Debug)]
pub struct ResponseCollection<T> {
    responses: Vec<T>,
    stopped: bool,
}

impl<T> ResponseCollection<T> {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            stopped: false,
        }
    }

    /// Whether dispatch ended before every listener ran.
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn first(&self) -> Option<&T> {
        self.responses.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.responses.last()
    }

    pub fn into_last(mut self) -> Option<T> {
        self.responses.pop()
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.responses.iter()
    }
}

/// Registry of prioritized listeners keyed by stage name.
///
/// Listeners run highest priority first; equal priorities run in the order
/// they were attached.
pub struct EventManager<E: Event> {
    listeners: HashMap<String, Vec<ListenerEntry<E>>>,
}

impl<E: Event> Default for EventManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> EventManager<E> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Attach a closure to a stage.
    pub fn attach<F>(&mut self, stage: impl AsRef<str>, listener: F, priority: i32) -> ListenerHandle
    where
        F: Fn(&mut E) -> Result<Option<E::Outcome>> + Send + Sync + 'static,
    {
        self.attach_listener(stage, Arc::new(listener), priority)
    }

    /// Attach an already shared listener to a stage.
    pub fn attach_listener(
        &mut self,
        stage: impl AsRef<str>,
        listener: Arc<dyn Listener<E>>,
        priority: i32,
    ) -> ListenerHandle {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);

        let stage = stage.as_ref().to_string();
        let queue = self.listeners.entry(stage.clone()).or_default();

        // Insert after every entry of equal or higher priority to keep ties stable.
        let position = queue
            .iter()
            .position(|entry| entry.priority < priority)
            .unwrap_or(queue.len());
        queue.insert(
            position,
            ListenerEntry {
                id,
                priority,
                listener,
            },
        );

        tracing::trace!("Attached listener {} to '{}' (priority {})", id, stage, priority);
        ListenerHandle { stage, id }
    }

    /// Remove exactly the registration named by `handle`.
    ///
    /// Returns `false` when it was not attached.
    pub fn detach(&mut self, handle: &ListenerHandle) -> bool {
        let Some(queue) = self.listeners.get_mut(&handle.stage) else {
            return false;
        };
        let before = queue.len();
        queue.retain(|entry| entry.id != handle.id);
        let removed = queue.len() != before;
        if queue.is_empty() {
            self.listeners.remove(&handle.stage);
        }
        removed
    }

    /// Detach several registrations, returning how many were removed.
    pub fn detach_all<'a>(&mut self, handles: impl IntoIterator<Item = &'a ListenerHandle>) -> usize {
        handles
            .into_iter()
            .filter(|handle| self.detach(handle))
            .count()
    }

    /// Remove every listener of a stage.
    pub fn clear(&mut self, stage: impl AsRef<str>) {
        self.listeners.remove(stage.as_ref());
    }

    pub fn listener_count(&self, stage: impl AsRef<str>) -> usize {
        self.listeners.get(stage.as_ref()).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, stage: impl AsRef<str>) -> bool {
        self.listener_count(stage) > 0
    }

    /// Priorities of a stage's listeners in call order.
    pub fn priorities(&self, stage: impl AsRef<str>) -> Vec<i32> {
        self.listeners
            .get(stage.as_ref())
            .map(|queue| queue.iter().map(|entry| entry.priority).collect())
            .unwrap_or_default()
    }

    /// Invoke every listener of a stage.
    pub fn trigger(
        &self,
        stage: impl AsRef<str>,
        event: &mut E,
    ) -> Result<ResponseCollection<E::Outcome>> {
        self.trigger_until(stage, event, |_| false)
    }

    /// Invoke the listeners of a stage until `stop` accepts a returned value
    /// or a listener stops propagation.
    ///
    /// The propagation flag is cleared before the first listener runs. A
    /// listener error aborts dispatch and is returned as is.
    pub fn trigger_until<P>(
        &self,
        stage: impl AsRef<str>,
        event: &mut E,
        stop: P,
    ) -> Result<ResponseCollection<E::Outcome>>
    where
        P: Fn(&E::Outcome) -> bool,
    {
        event.stop_propagation(false);
        let mut responses = ResponseCollection::new();

        let Some(queue) = self.listeners.get(stage.as_ref()) else {
            return Ok(responses);
        };

        for entry in queue {
            if let Some(outcome) = entry.listener.on_event(event)? {
                let halt = stop(&outcome);
                responses.responses.push(outcome);
                if halt {
                    responses.stopped = true;
                    break;
                }
            }

            if event.is_propagation_stopped() {
                responses.stopped = true;
                break;
            }
        }

        Ok(responses)
    }
}

impl EventManager<MvcEvent> {
    /// Let an aggregate register its listeners.
    pub fn attach_aggregate(
        &mut self,
        aggregate: Arc<dyn ListenerAggregate>,
        priority: i32,
    ) -> Vec<ListenerHandle> {
        aggregate.attach(self, priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestEvent {
        trail: Vec<&'static str>,
        stopped: bool,
    }

    impl Event for TestEvent {
        type Outcome = &'static str;

        fn is_propagation_stopped(&self) -> bool {
            self.stopped
        }

        fn stop_propagation(&mut self, flag: bool) {
            self.stopped = flag;
        }
    }

    fn recorder(name: &'static str) -> impl Fn(&mut TestEvent) -> Result<Option<&'static str>> {
        move |event: &mut TestEvent| {
            event.trail.push(name);
            Ok(None)
        }
    }

    #[test]
    fn test_priority_descending_stable_on_ties() {
        let mut events = EventManager::<TestEvent>::new();
        events.attach("stage", recorder("low"), -10000);
        events.attach("stage", recorder("first"), 5);
        events.attach("stage", recorder("second"), 5);

        let mut event = TestEvent::default();
        events.trigger("stage", &mut event).unwrap();

        assert_eq!(event.trail, vec!["first", "second", "low"]);
        assert_eq!(events.priorities("stage"), vec![5, 5, -10000]);
    }

    #[test]
    fn test_trigger_without_listeners_is_noop() {
        let events = EventManager::<TestEvent>::new();
        let mut event = TestEvent::default();
        let responses = events.trigger("nothing", &mut event).unwrap();
        assert!(responses.is_empty());
        assert!(!responses.stopped());
    }

    #[test]
    fn test_detach_removes_exact_registration() {
        let mut events = EventManager::<TestEvent>::new();
        let first = events.attach("stage", recorder("a"), 1);
        events.attach("stage", recorder("a"), 1);

        assert!(events.detach(&first));
        assert!(!events.detach(&first));
        assert_eq!(events.listener_count("stage"), 1);
    }

    #[test]
    fn test_detach_unknown_is_noop() {
        let mut events = EventManager::<TestEvent>::new();
        let mut other = EventManager::<TestEvent>::new();
        let foreign = other.attach("elsewhere", recorder("x"), 1);

        assert!(!events.detach(&foreign));
        assert_eq!(events.listener_count("elsewhere"), 0);
    }

    #[test]
    fn test_detach_handle_from_other_manager_keeps_listener() {
        let mut events = EventManager::<TestEvent>::new();
        events.attach("stage", recorder("kept"), 1);
        let mut other = EventManager::<TestEvent>::new();
        let foreign = other.attach("stage", recorder("foreign"), 1);

        assert!(!events.detach(&foreign));
        assert_eq!(events.listener_count("stage"), 1);

        let mut event = TestEvent::default();
        events.trigger("stage", &mut event).unwrap();
        assert_eq!(event.trail, vec!["kept"]);
        assert!(other.detach(&foreign));
    }

    #[test]
    fn test_stop_propagation_halts_stage() {
        let mut events = EventManager::<TestEvent>::new();
        events.attach(
            "stage",
            |event: &mut TestEvent| {
                event.trail.push("stopper");
                event.stop_propagation(true);
                Ok(None)
            },
            10,
        );
        events.attach("stage", recorder("never"), 1);

        let mut event = TestEvent::default();
        let responses = events.trigger("stage", &mut event).unwrap();

        assert!(responses.stopped());
        assert_eq!(event.trail, vec!["stopper"]);

        // The next dispatch starts unflagged.
        events.attach("other", recorder("runs"), 1);
        events.trigger("other", &mut event).unwrap();
        assert_eq!(event.trail, vec!["stopper", "runs"]);
    }

    #[test]
    fn test_trigger_until_predicate() {
        let mut events = EventManager::<TestEvent>::new();
        events.attach("stage", |_: &mut TestEvent| Ok(Some("skip")), 3);
        events.attach("stage", |_: &mut TestEvent| Ok(Some("halt")), 2);
        events.attach("stage", recorder("never"), 1);

        let mut event = TestEvent::default();
        let responses = events
            .trigger_until("stage", &mut event, |r| *r == "halt")
            .unwrap();

        assert!(responses.stopped());
        assert_eq!(responses.len(), 2);
        assert_eq!(responses.first(), Some(&"skip"));
        assert_eq!(responses.into_last(), Some("halt"));
        assert!(event.trail.is_empty());
    }

    #[test]
    fn test_listener_error_propagates() {
        let mut events = EventManager::<TestEvent>::new();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        events.attach(
            "stage",
            |_: &mut TestEvent| Err(crate::error::MvcError::render("boom")),
            2,
        );
        events.attach(
            "stage",
            move |_: &mut TestEvent| {
                *counter.lock().unwrap() += 1;
                Ok(None)
            },
            1,
        );

        let mut event = TestEvent::default();
        assert!(events.trigger("stage", &mut event).is_err());
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
