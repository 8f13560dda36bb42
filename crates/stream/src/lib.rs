//! Realtime alert distribution
//!
//! The lifecycle publishes every applied alert change on a central bus; this
//! crate fans those changes out to per-subscriber queues. Each subscription
//! names a [`Scope`] and receives a full snapshot of the matching alert set
//! first, then incremental updates as they happen. After a delivery gap the
//! channel resends a fresh snapshot instead of replaying missed deltas.

pub mod distributor;
pub mod scope;
pub mod websocket;
pub mod wire;

pub use distributor::{RealtimeDistributor, Subscription, SubscriptionEvent};
pub use scope::Scope;
pub use websocket::WsServer;
pub use wire::WireAlert;
