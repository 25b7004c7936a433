//! Keyed publish/subscribe primitive
//!
//! Used for life-cycle signaling (engine init, mode activation) between the
//! engine and the embedding view layer. Subscribers are registered under a
//! caller-chosen key; registering the same key twice is a programmer error
//! and is rejected, since silent duplicate delivery would corrupt gesture
//! timing downstream.

use thiserror::Error;

/// Errors raised by [`Event`] subscription management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("subscriber key '{0}' is already registered")]
    DuplicateSubscriber(String),
}

type Callback<T> = Box<dyn Fn(&T) + Send>;

/// A minimal notification primitive: keyed subscribers, delivery in
/// subscription order.
pub struct Event<T> {
    subscribers: Vec<(String, Callback<T>)>,
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self { subscribers: Vec::new() }
    }

    /// Register a callback under `key`. Fails if the key is already taken.
    pub fn subscribe(
        &mut self,
        key: impl Into<String>,
        callback: impl Fn(&T) + Send + 'static,
    ) -> Result<(), EventError> {
        let key = key.into();
        if self.subscribers.iter().any(|(k, _)| *k == key) {
            return Err(EventError::DuplicateSubscriber(key));
        }
        self.subscribers.push((key, Box::new(callback)));
        Ok(())
    }

    /// Remove the subscriber registered under `key`. Returns whether one
    /// was present.
    pub fn unsubscribe(&mut self, key: &str) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(k, _)| k != key);
        self.subscribers.len() != before
    }

    /// Deliver `value` to every subscriber, in subscription order.
    pub fn emit(&self, value: &T) {
        for (_, callback) in &self.subscribers {
            callback(value);
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_emit_delivers_in_subscription_order() {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut event: Event<u32> = Event::new();

        for name in ["first", "second", "third"] {
            let log = log.clone();
            event
                .subscribe(name, move |v| log.lock().push((name, *v)))
                .unwrap();
        }

        event.emit(&7);
        assert_eq!(
            *log.lock(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut event: Event<()> = Event::new();
        event.subscribe("observer", |_| {}).unwrap();

        let err = event.subscribe("observer", |_| {}).unwrap_err();
        assert_eq!(err, EventError::DuplicateSubscriber("observer".into()));
        assert_eq!(event.len(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut event: Event<()> = Event::new();
        {
            let hits = hits.clone();
            event
                .subscribe("counter", move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        event.emit(&());
        assert!(event.unsubscribe("counter"));
        assert!(!event.unsubscribe("counter"));
        event.emit(&());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
