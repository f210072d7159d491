#![forbid(unsafe_code)]

//! Topic observer pool for slotted.
//!
//! An [`ObserverPool`] maps a [`Topic`] to an ordered, deduplicated list of
//! observers and dispatches a single argument to every observer registered
//! under that topic.
//!
//! - [`Observer`]: the handle trait. Liveness is an explicit capability
//!   ([`Observer::is_alive`]) rather than a truthiness check.
//! - [`Handle`]: a ready-made closure observer, held strongly or weakly.
//! - [`PoolConfig`] / [`DispatchMode`]: choose between self-pruning and
//!   unconditional dispatch.
//!
//! # Invariants
//!
//! 1. An observer appears at most once per topic.
//! 2. Observers are notified in registration order.
//! 3. Topics are never pruned, even when their observer list is empty.
//! 4. Dispatch re-reads the live list length on every step, so observers
//!    may add or remove entries on the pool they are being called from.

pub mod error;
pub mod observer;
pub mod pool;
pub mod topic;

pub use error::{ObserverError, PoolError};
pub use observer::{Handle, Observer};
pub use pool::{DispatchMode, ObserverPool, PoolConfig, TopicSnapshot};
pub use topic::Topic;
