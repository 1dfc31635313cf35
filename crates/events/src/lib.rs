//! `peopleforge-events` — event contracts and pub/sub mechanics.
//!
//! Domain modules emit typed events; infrastructure wraps them in
//! tenant-scoped envelopes, persists them, and distributes them over an
//! [`EventBus`]. Integration facts (e.g. a completed transfer) travel over the
//! same bus abstraction, best-effort.

pub mod bus;
pub mod envelope;
pub mod event;

pub use bus::{EventBus, InMemoryEventBus, Subscription};
pub use envelope::{EventEnvelope, TenantScoped};
pub use event::Event;
