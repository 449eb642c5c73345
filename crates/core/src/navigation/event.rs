//! Notifications emitted once a navigation operation has finished.

use super::context::ContextInfo;
use super::transition::NavigationOp;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

/// Events sent to subscribers after the transition lock is released.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    /// A context was pushed and is now current.
    Pushed(ContextInfo),
    /// A context was removed from the stack and its widget released.
    Popped(ContextInfo),
    /// `close_all_popups` removed this many popups.
    PopupsClosed { count: usize },
    /// A mutating call was turned away because `running` held the lock.
    Rejected {
        op: NavigationOp,
        running: NavigationOp,
    },
}

/// Fan-out of [`NavigationEvent`]s to any number of channel subscribers.
#[derive(Debug, Default)]
pub(crate) struct EventHub {
    subscribers: Mutex<Vec<Sender<NavigationEvent>>>,
}

impl EventHub {
    pub(crate) fn subscribe(&self) -> Receiver<NavigationEvent> {
        let (tx, rx) = channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Sends every event in order, dropping subscribers whose receiver is gone.
    pub(crate) fn send_all(&self, events: Vec<NavigationEvent>) {
        if events.is_empty() {
            return;
        }
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
