//! Bounded in-memory event buffer
//!
//! Events are kept in arrival order. With a capacity configured, the oldest
//! event is evicted when an append would exceed it.

use crate::types::Event;
use std::collections::VecDeque;

/// Ordered, optionally bounded sequence of events
#[derive(Debug, Clone, Default)]
pub struct MessageBuffer {
    events: VecDeque<Event>,
    /// `None` = unbounded
    capacity: Option<usize>,
}

impl MessageBuffer {
    /// Create a buffer holding at most `max` events (`max <= 0` = unbounded)
    pub fn new(max: i64) -> Self {
        let capacity = usize::try_from(max).ok().filter(|&m| m > 0);
        Self {
            events: VecDeque::new(),
            capacity,
        }
    }

    /// Create a buffer with no size limit
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Add an event at the end, evicting the oldest one if over capacity
    ///
    /// Returns the evicted event, if any.
    pub fn append(&mut self, event: Event) -> Option<Event> {
        self.events.push_back(event);
        match self.capacity {
            Some(max) if self.events.len() > max => self.events.pop_front(),
            _ => None,
        }
    }

    /// Remove every event
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Iterate over events in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Copy of every event in arrival order
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    /// Copy of the events matching `predicate`, in arrival order
    pub fn filtered<P>(&self, mut predicate: P) -> Vec<Event>
    where
        P: FnMut(&Event) -> bool,
    {
        self.events
            .iter()
            .filter(|event| predicate(event))
            .cloned()
            .collect()
    }
}
