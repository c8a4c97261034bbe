//! Domain events: the event contract, envelopes, handlers and dispatching.

pub mod dispatcher;
pub mod envelope;
pub mod event;
pub mod handler;

pub use dispatcher::{
    DEFAULT_DEDUP_CAPACITY, DispatchError, DispatchReport, EventDispatcher, HandlerFailure,
    InMemoryEventDispatcher,
};
pub use envelope::{EventEnvelope, collect_events};
pub use event::Event;
pub use handler::{EventHandler, FnHandler, HandlerError};
