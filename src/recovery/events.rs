//! Recovery progress events and listener fan-out

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Progress of one device-loss recovery run.
///
/// Stream shape: `Invalidating → Invalidated → {Reinitializing,
/// Reinitialized}* → Complete`, with `Error` interleaved per failing
/// manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryEvent {
    Invalidating,
    Invalidated,
    Reinitializing { manager: String },
    Reinitialized { manager: String },
    Error { manager: String, message: String },
    /// Every manager has been attempted. `failed` names the ones whose
    /// reinitialization did not succeed.
    Complete { failed: Vec<String> },
}

/// Subscription token returned by [`RecoveryListeners::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Observer list with per-call isolation.
///
/// Each listener invocation is individually guarded so one panicking
/// observer cannot block delivery to the rest.
pub struct RecoveryListeners {
    listeners: Vec<(ListenerId, Box<dyn Fn(&RecoveryEvent)>)>,
    next_id: u64,
}

impl RecoveryListeners {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&RecoveryEvent)>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() < before
    }

    pub fn emit(&self, event: &RecoveryEvent) {
        for (id, listener) in &self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                log::error!("recovery listener {id:?} panicked on {event:?}");
            }
        }
    }
}

impl Default for RecoveryListeners {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let seen = Rc::new(RefCell::new(0u32));
        let mut listeners = RecoveryListeners::new();

        let counter = Rc::clone(&seen);
        let id = listeners.subscribe(Box::new(move |_| *counter.borrow_mut() += 1));

        listeners.emit(&RecoveryEvent::Invalidating);
        assert!(listeners.unsubscribe(id));
        listeners.emit(&RecoveryEvent::Invalidated);

        assert_eq!(*seen.borrow(), 1);
        assert!(!listeners.unsubscribe(id));
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let seen = Rc::new(RefCell::new(0u32));
        let mut listeners = RecoveryListeners::new();

        listeners.subscribe(Box::new(|_| panic!("misbehaving observer")));
        let counter = Rc::clone(&seen);
        listeners.subscribe(Box::new(move |_| *counter.borrow_mut() += 1));

        listeners.emit(&RecoveryEvent::Invalidating);
        assert_eq!(*seen.borrow(), 1);
    }
}
