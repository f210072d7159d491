//! The topic observer pool.
//!
//! # Design
//!
//! Topics are kept as an ordered `Vec` of `(topic, observers)` entries,
//! searched linearly by value. A pool typically holds a handful of topics,
//! so a scan beats hashing, and insertion order doubles as the
//! introspection order of [`ObserverPool::snapshot`].
//!
//! Entries are never pruned when their observer list empties: an observer
//! that is repeatedly added and removed on the same topic would otherwise
//! churn the topic list.
//!
//! # Reentrancy
//!
//! Every method takes `&self`. The topic list lives in a `RefCell` that is
//! only borrowed for the duration of a lookup or edit, never across an
//! observer call, so an observer may call [`add`](ObserverPool::add),
//! [`remove`](ObserverPool::remove) or [`notify`](ObserverPool::notify) on
//! the pool that is dispatching to it.
//!
//! Dispatch walks the list by position and re-reads the live length on
//! every step. After each call the cursor is re-anchored on the observer
//! it just called, so removing that observer (or anything before it)
//! skips no survivor. Observers removed ahead of the cursor are never
//! reached; observers appended during dispatch are reached in the same
//! pass.
//!
//! A nested `notify` on the same topic runs its own full pass, so
//! observers after the reentrant caller are delivered twice, and entries
//! the nested pass prunes can shift an observer past the outer cursor.
//! Neither case has an ordering guarantee.
//!
//! # Failure Modes
//!
//! - **Observer fails**: dispatch stops at the failing observer and the
//!   error is returned. Earlier observers are not undone.
//! - **Observer dead** ([`DispatchMode::Pruning`] only): removed in place
//!   without advancing the cursor.

use std::cell::RefCell;
use std::fmt;

use crate::error::PoolError;
use crate::observer::Observer;
use crate::topic::Topic;

/// How [`ObserverPool::notify`] treats observers that are no longer alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Dead observers are removed from the topic instead of being called.
    #[default]
    Pruning,
    /// Every observer is called in order, alive or not.
    Unconditional,
}

/// Configuration for an [`ObserverPool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolConfig {
    /// Dispatch discipline (default: [`DispatchMode::Pruning`]).
    pub dispatch: DispatchMode,
}

impl PoolConfig {
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }
}

/// Read-only copy of one topic and its observers, in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSnapshot<O> {
    pub topic: Topic,
    pub observers: Vec<O>,
}

struct TopicEntry<O> {
    topic: Topic,
    observers: Vec<O>,
}

/// Registry mapping topics to ordered, deduplicated observer lists.
pub struct ObserverPool<O: Observer> {
    topics: RefCell<Vec<TopicEntry<O>>>,
    config: PoolConfig,
}

impl<O: Observer> Default for ObserverPool<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Observer + fmt::Debug> fmt::Debug for ObserverPool<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.borrow();
        let mut map = f.debug_map();
        for entry in topics.iter() {
            map.entry(&entry.topic, &entry.observers);
        }
        map.finish()
    }
}

impl<O: Observer> ObserverPool<O> {
    /// Create an empty pool with [`DispatchMode::Pruning`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            topics: RefCell::new(Vec::new()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Register `observer` under `topic`, creating the topic if needed.
    ///
    /// Returns `false` if an equal observer was already registered; the
    /// existing registration keeps its position.
    pub fn add(&self, topic: impl Into<Topic>, observer: O) -> bool {
        let topic = topic.into();
        let mut topics = self.topics.borrow_mut();
        let entry = match topics.iter().position(|e| e.topic == topic) {
            Some(pos) => &mut topics[pos],
            None => {
                topics.push(TopicEntry {
                    topic,
                    observers: Vec::new(),
                });
                let last = topics.len() - 1;
                &mut topics[last]
            }
        };
        if entry.observers.contains(&observer) {
            return false;
        }
        entry.observers.push(observer);
        true
    }

    /// Remove the first observer equal to `observer` from `topic`.
    ///
    /// Absent topics and unregistered observers are a silent no-op
    /// (returns `false`). The topic itself is kept even if it empties.
    pub fn remove(&self, topic: &str, observer: &O) -> bool {
        let removed = {
            let mut topics = self.topics.borrow_mut();
            let Some(entry) = topics.iter_mut().find(|e| e.topic == *topic) else {
                return false;
            };
            match entry.observers.iter().position(|o| o == observer) {
                Some(pos) => entry.observers.remove(pos),
                None => return false,
            }
        };
        // Dropped after the borrow ends: the observer's captures may touch the pool.
        drop(removed);
        true
    }

    /// Deliver `arg` to every observer registered under `topic`.
    ///
    /// Notifying an unknown or empty topic is a no-op. See the module docs
    /// for the behaviour when observers mutate the pool during dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ObserverFailed`] for the first observer that
    /// fails; no further observers are called.
    pub fn notify(&self, topic: &str, arg: &O::Arg) -> Result<(), PoolError> {
        let prune = self.config.dispatch == DispatchMode::Pruning;
        let mut position = 0;
        while let Some(observer) = self.observer_at(topic, position) {
            if prune && !observer.is_alive() {
                self.remove_at(topic, position, &observer);
                tracing::debug!(message = "pool.prune", topic, position);
                continue;
            }
            if let Err(source) = observer.call(arg) {
                tracing::debug!(message = "pool.observer_failed", topic, position);
                return Err(PoolError::ObserverFailed {
                    topic: Topic::from(topic),
                    position,
                    source,
                });
            }
            position = self.resume_after(topic, position, &observer);
        }
        Ok(())
    }

    /// Whether `observer` is registered under `topic`.
    #[must_use]
    pub fn contains(&self, topic: &str, observer: &O) -> bool {
        self.topics
            .borrow()
            .iter()
            .find(|e| e.topic == *topic)
            .is_some_and(|e| e.observers.contains(observer))
    }

    /// Number of observers registered under `topic`, dead ones included.
    #[must_use]
    pub fn observer_count(&self, topic: &str) -> usize {
        self.topics
            .borrow()
            .iter()
            .find(|e| e.topic == *topic)
            .map_or(0, |e| e.observers.len())
    }

    /// Number of topics, including topics whose observer list is empty.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.borrow().len()
    }

    /// Registered topics in creation order.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.topics
            .borrow()
            .iter()
            .map(|e| e.topic.clone())
            .collect()
    }

    /// Copy of every topic and its observers, for introspection.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TopicSnapshot<O>> {
        self.topics
            .borrow()
            .iter()
            .map(|e| TopicSnapshot {
                topic: e.topic.clone(),
                observers: e.observers.clone(),
            })
            .collect()
    }

    /// Drop every topic and observer.
    pub fn clear(&self) {
        // Observers may run arbitrary code on drop; release the borrow first.
        let dropped = std::mem::take(&mut *self.topics.borrow_mut());
        drop(dropped);
    }

    fn observer_at(&self, topic: &str, position: usize) -> Option<O> {
        self.topics
            .borrow()
            .iter()
            .find(|e| e.topic == *topic)
            .and_then(|e| e.observers.get(position).cloned())
    }

    /// Cursor position following `observer`, which was called at `position`.
    ///
    /// Only positions at or behind the cursor are searched: if the observer
    /// is gone (or moved ahead), the entry now at `position` is next.
    fn resume_after(&self, topic: &str, position: usize, observer: &O) -> usize {
        let topics = self.topics.borrow();
        let Some(entry) = topics.iter().find(|e| e.topic == *topic) else {
            return position;
        };
        if entry.observers.get(position) == Some(observer) {
            return position + 1;
        }
        let behind = position.min(entry.observers.len());
        match entry.observers[..behind].iter().rposition(|o| o == observer) {
            Some(found) => found + 1,
            None => position,
        }
    }

    fn remove_at(&self, topic: &str, position: usize, observer: &O) {
        let removed = {
            let mut topics = self.topics.borrow_mut();
            let Some(entry) = topics.iter_mut().find(|e| e.topic == *topic) else {
                return;
            };
            if entry.observers.get(position) == Some(observer) {
                Some(entry.observers.remove(position))
            } else {
                entry
                    .observers
                    .iter()
                    .position(|o| o == observer)
                    .map(|pos| entry.observers.remove(pos))
            }
        };
        drop(removed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
