//! Subscription streams and lock-step fan-out
//!
//! Every stage hands events downstream through zero-capacity channels, so a
//! send completes only when the subscriber has taken the event. A publisher
//! delivers to its subscribers one after another, which means event N has
//! reached every subscriber before event N+1 is issued.

use crate::task::lock;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::Mutex;

/// Read side of a subscription
///
/// Iterating it yields every event issued after the subscription was made,
/// in order, and ends when the publisher closes.
pub type Subscription<T> = Receiver<T>;

/// Anything that can be subscribed to for a stream of `T`
pub trait Publisher<T>: Send + Sync {
    /// Register a new subscriber
    fn subscribe(&self) -> Subscription<T>;
}

/// Subscriber list shared between a publisher handle and its producer task
pub(crate) struct Fanout<T> {
    state: Mutex<FanoutState<T>>,
}

struct FanoutState<T> {
    subscribers: Vec<Sender<T>>,
    closed: bool,
}

impl<T: Clone> Fanout<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FanoutState {
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Register a subscriber; after `close` the stream comes back already ended
    pub(crate) fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = bounded(0);
        let mut state = lock(&self.state);
        if !state.closed {
            state.subscribers.push(tx);
        }
        rx
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.state).subscribers.len()
    }

    /// Deliver `value` to every current subscriber, blocking on each
    ///
    /// Returns the number of subscribers that accepted it. Subscribers whose
    /// stream was dropped are pruned.
    pub(crate) fn publish(&self, value: &T) -> usize {
        let subscribers = self.snapshot();
        let mut gone = Vec::new();
        for tx in &subscribers {
            if tx.send(value.clone()).is_err() {
                gone.push(tx.clone());
            }
        }
        self.prune(&gone);
        subscribers.len() - gone.len()
    }

    /// Like [`Fanout::publish`], but gives up as soon as `stop` fires
    ///
    /// Returns `None` when interrupted. A stop signal is either a message or
    /// the disconnection of its sender.
    pub(crate) fn publish_until(&self, value: &T, stop: &Receiver<()>) -> Option<usize> {
        let subscribers = self.snapshot();
        let mut gone = Vec::new();
        for tx in &subscribers {
            select! {
                send(tx, value.clone()) -> res => {
                    if res.is_err() {
                        gone.push(tx.clone());
                    }
                }
                recv(stop) -> _ => return None,
            }
        }
        self.prune(&gone);
        Some(subscribers.len() - gone.len())
    }

    /// Drop every sender so all subscriptions observe end-of-stream
    ///
    /// Idempotent. Senders held in an in-flight snapshot close once that
    /// delivery finishes.
    pub(crate) fn close(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.subscribers.clear();
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    fn snapshot(&self) -> Vec<Sender<T>> {
        lock(&self.state).subscribers.clone()
    }

    fn prune(&self, gone: &[Sender<T>]) {
        if gone.is_empty() {
            return;
        }
        lock(&self.state)
            .subscribers
            .retain(|tx| !gone.iter().any(|g| g.same_channel(tx)));
    }
}
