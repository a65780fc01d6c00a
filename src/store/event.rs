use crate::errors::{CellarError, CellarResult, ErrorKind};
use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::error::Error as _;
use std::fmt::Debug;
use std::sync::Arc;

// Single topic carrying every store lifecycle event.
const CELLAR_EVENT: &str = "cellar-event";

/// Enumeration of lifecycle events that occur at the multi-store level.
///
/// # Purpose
/// `StoreEvents` represents the state transitions of managed stores. These
/// events let applications react to store creation, deletion, and shutdown
/// without polling the multi-store.
///
/// # Variants
/// - **Created**: fired after a store is successfully created and registered
/// - **Deleted**: fired after a store is removed from the multi-store
/// - **Closed**: fired for each store closed during a bulk close
#[derive(Debug, PartialEq, Clone)]
pub enum StoreEvents {
    Created,
    Deleted,
    Closed,
}

/// Context information provided with each store event.
///
/// Bundles the event type with the name of the store it concerns, which is
/// all a listener needs to react to a lifecycle change.
#[derive(Clone)]
pub struct StoreEventInfo {
    event: StoreEvents,
    store_name: String,
}

impl StoreEventInfo {
    pub fn new(event: StoreEvents, store_name: &str) -> Self {
        StoreEventInfo {
            event,
            store_name: store_name.to_string(),
        }
    }

    /// Returns a clone of the event that occurred.
    pub fn event(&self) -> StoreEvents {
        self.event.clone()
    }

    /// Returns the name of the store the event concerns.
    pub fn store_name(&self) -> &str {
        &self.store_name
    }
}

impl Debug for StoreEventInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEventInfo")
            .field("event", &self.event)
            .field("store_name", &self.store_name)
            .finish()
    }
}

/// A trait for closures that handle store events.
///
/// Automatically implemented for any `Send + Sync` function or closure taking
/// a `StoreEventInfo` and returning `CellarResult<()>`.
pub trait StoreEventCallback: Send + Sync + Fn(StoreEventInfo) -> CellarResult<()> {}

impl<F> StoreEventCallback for F where F: Send + Sync + Fn(StoreEventInfo) -> CellarResult<()> {}

/// A listener for store lifecycle events that wraps a callback function.
///
/// # Characteristics
/// - **Callback-Based**: wraps any `StoreEventCallback` closure or function
/// - **Cloneable**: cloning only increments the inner `Arc` reference count
/// - **Handle Trait**: implements `Handle<StoreEventInfo>` for bus delivery
///
/// # Usage
/// ```text
/// let listener = StoreEventListener::new(|info| {
///     match info.event() {
///         StoreEvents::Created => log::info!("store '{}' created", info.store_name()),
///         _ => {}
///     }
///     Ok(())
/// });
/// multi_store.subscribe(listener)?;
/// ```
#[derive(Clone)]
pub struct StoreEventListener {
    on_event: Arc<dyn StoreEventCallback>,
}

impl StoreEventListener {
    /// Creates a new store event listener with the given callback.
    pub fn new(on_event: impl StoreEventCallback + 'static) -> Self {
        StoreEventListener {
            on_event: Arc::new(on_event),
        }
    }
}

impl Handle<StoreEventInfo> for StoreEventListener {
    fn handle(&self, event: &Event<StoreEventInfo>) -> Result<(), BasuError> {
        match (self.on_event)(event.data.clone()) {
            Ok(_) => Ok(()),
            Err(e) => Err(BasuError::HandlerError(Error::from(e))),
        }
    }
}

impl Debug for StoreEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEventListener").finish()
    }
}

/// Opaque handle returned by `register`, required for deregistration.
pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

/// Publishes store lifecycle events to registered listeners.
///
/// # Responsibilities
/// * **Event Publishing**: broadcasts events to all registered listeners
/// * **Listener Management**: registers and deregisters event handlers
/// * **Performance**: fast path skips event construction when nobody listens
///
/// Delivery is synchronous: `publish` returns after every listener has run.
/// A failing listener surfaces as an `EventError` to the publisher.
#[derive(Clone)]
pub struct CellarEventBus {
    inner: Arc<CellarEventBusInner>,
}

impl Default for CellarEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CellarEventBus {
    /// Creates a new event bus instance.
    pub fn new() -> Self {
        CellarEventBus {
            inner: Arc::new(CellarEventBusInner {
                event_bus: EventBus::new(),
            }),
        }
    }

    /// Registers an event listener with the bus.
    pub fn register(&self, listener: StoreEventListener) -> CellarResult<SubscriberRef> {
        self.inner.register(listener)
    }

    /// Deregisters a previously registered event listener.
    pub fn deregister(&self, subscriber: SubscriberRef) -> CellarResult<()> {
        self.inner.deregister(subscriber)
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: StoreEventInfo) -> CellarResult<()> {
        self.inner.publish(event)
    }

    /// Closes the event bus and clears all registered listeners.
    pub fn close(&self) -> CellarResult<()> {
        self.inner.close()
    }

    /// Returns true if there are any registered listeners.
    pub fn has_listeners(&self) -> bool {
        self.inner.has_listeners()
    }
}

struct CellarEventBusInner {
    event_bus: EventBus<StoreEventInfo>,
}

impl CellarEventBusInner {
    fn register(&self, listener: StoreEventListener) -> CellarResult<SubscriberRef> {
        match self.event_bus.subscribe(CELLAR_EVENT, Box::new(listener)) {
            Ok(subscriber) => Ok(SubscriberRef::new(subscriber)),
            Err(e) => Err(Self::cellar_error(e)),
        }
    }

    #[inline]
    fn deregister(&self, subscriber: SubscriberRef) -> CellarResult<()> {
        match self.event_bus.unsubscribe(CELLAR_EVENT, &subscriber.inner) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::cellar_error(e)),
        }
    }

    #[inline]
    fn publish(&self, event: StoreEventInfo) -> CellarResult<()> {
        // Fast path: skip event construction when nobody listens.
        let handler_count = match self.event_bus.get_handler_count(CELLAR_EVENT) {
            Ok(count) => count,
            Err(e) => {
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    return Ok(());
                }
                return Err(Self::cellar_error(e));
            }
        };

        if handler_count == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        match self.event_bus.publish(CELLAR_EVENT, &basu_event) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::cellar_error(e)),
        }
    }

    #[inline]
    fn close(&self) -> CellarResult<()> {
        match self.event_bus.clear() {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::cellar_error(e)),
        }
    }

    #[inline]
    fn has_listeners(&self) -> bool {
        match self.event_bus.get_handler_count(CELLAR_EVENT) {
            Ok(count) => count > 0,
            Err(e) => {
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    false
                } else {
                    log::warn!("failed to check listeners: {}, defaulting to false", e);
                    false
                }
            }
        }
    }

    #[inline]
    fn cellar_error(e: BasuError) -> CellarError {
        match e {
            BasuError::EventTypeNotFOUND => CellarError::new(
                "event bus error: the requested event type is not registered",
                ErrorKind::EventError,
            ),
            BasuError::MutexPoisoned => CellarError::new(
                "event bus error: internal mutex poisoned - the event bus may be in an inconsistent state",
                ErrorKind::EventError,
            ),
            BasuError::HandlerError(e) => {
                let error_message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown error in event handler".to_string());
                CellarError::new(
                    &format!("event handler error: {}", error_message),
                    ErrorKind::EventError,
                )
            }
        }
    }
}
