//! Priority-ordered device-loss recovery

use crate::recovery::events::{ListenerId, RecoveryEvent, RecoveryListeners};
use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Error reported by a recovery manager's invalidate/reinitialize step.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RecoveryError {
    message: String,
}

impl RecoveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Future returned by [`RecoveryManager::reinitialize`].
pub type ReinitFuture<'a> = Pin<Box<dyn Future<Output = Result<(), RecoveryError>> + 'a>>;

/// Contract for a GPU-resource-owning component participating in recovery.
///
/// `C` is the recreation context handed through by the caller (device,
/// queue, capability table); the coordinator never inspects it.
pub trait RecoveryManager<C> {
    /// Identity used for registration, ordering diagnostics, and error
    /// reporting.
    fn name(&self) -> &str;

    /// Reinitialization order. Lower priorities rebuild earlier; managers
    /// may assume lower-priority managers have already rebuilt shared state.
    fn priority(&self) -> i32;

    /// Release GPU handles synchronously. Called on every manager before
    /// any reinitialization starts.
    fn invalidate(&mut self) -> Result<(), RecoveryError>;

    /// Recreate GPU handles. May await allocation or shader compilation.
    fn reinitialize<'a>(&'a mut self, ctx: &'a C) -> ReinitFuture<'a>;
}

/// Outcome of one recovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Managers attempted (all registered managers).
    pub attempted: usize,
    /// Names of managers whose reinitialization failed.
    pub failed: Vec<String>,
}

impl RecoveryReport {
    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Coordinates the two-phase recovery protocol across registered managers.
///
/// Phase 1 invalidates every manager synchronously; phase 2 reinitializes
/// them strictly one at a time in ascending priority order. Per-manager
/// failures are isolated: the run always attempts every manager and always
/// completes, possibly degraded.
pub struct RecoveryCoordinator<C> {
    managers: Vec<Box<dyn RecoveryManager<C>>>,
    listeners: RecoveryListeners,
    recovering: Cell<bool>,
}

/// Clears the recovery-in-progress flag when the run finishes, including
/// when the driving future is dropped before completion.
struct RecoverGuard<'a>(&'a Cell<bool>);

impl Drop for RecoverGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<C> RecoveryCoordinator<C> {
    pub fn new() -> Self {
        Self {
            managers: Vec::new(),
            listeners: RecoveryListeners::new(),
            recovering: Cell::new(false),
        }
    }

    /// Register a manager. A manager already registered under the same
    /// name is replaced with a warning.
    pub fn register(&mut self, manager: Box<dyn RecoveryManager<C>>) {
        let name = manager.name();
        if let Some(index) = self.managers.iter().position(|m| m.name() == name) {
            log::warn!("recovery manager '{name}' registered twice, replacing previous entry");
            self.managers[index] = manager;
        } else {
            self.managers.push(manager);
        }
    }

    /// Remove a manager by name. Returns whether one was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.managers.len();
        self.managers.retain(|m| m.name() != name);
        self.managers.len() < before
    }

    pub fn manager_count(&self) -> usize {
        self.managers.len()
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering.get()
    }

    /// Subscribe to recovery progress events.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&RecoveryEvent)>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Run the two-phase recovery protocol.
    ///
    /// Returns `None` if a recovery is already in flight (the call is
    /// dropped with a warning, not queued). Otherwise returns a report of
    /// the attempt; the run never aborts early on manager failure.
    pub async fn recover(&mut self, ctx: &C) -> Option<RecoveryReport> {
        if self.recovering.get() {
            log::warn!("recover() called while recovery already in progress, ignoring");
            return None;
        }
        self.recovering.set(true);
        // The caller may drop this future mid-flight (a fresh loss event
        // restarts the loss clock); the flag must clear either way.
        let _guard = RecoverGuard(&self.recovering);

        // Phase 1: release everything before anything is rebuilt. Order
        // does not matter here; failures only affect the failing manager.
        self.listeners.emit(&RecoveryEvent::Invalidating);
        for manager in &mut self.managers {
            if let Err(err) = manager.invalidate() {
                log::error!("manager '{}' failed to invalidate: {err}", manager.name());
            }
        }
        self.listeners.emit(&RecoveryEvent::Invalidated);

        // Phase 2: rebuild sequentially, ascending priority. Never in
        // parallel: later managers may sample state earlier ones rebuilt.
        let mut order: Vec<usize> = (0..self.managers.len()).collect();
        order.sort_by_key(|&i| (self.managers[i].priority(), i));

        let mut failed = Vec::new();
        for index in order {
            let name = self.managers[index].name().to_string();
            self.listeners.emit(&RecoveryEvent::Reinitializing {
                manager: name.clone(),
            });
            match self.managers[index].reinitialize(ctx).await {
                Ok(()) => {
                    log::debug!("manager '{name}' reinitialized");
                    self.listeners
                        .emit(&RecoveryEvent::Reinitialized { manager: name });
                }
                Err(err) => {
                    log::error!("manager '{name}' failed to reinitialize: {err}");
                    self.listeners.emit(&RecoveryEvent::Error {
                        manager: name.clone(),
                        message: err.to_string(),
                    });
                    failed.push(name);
                }
            }
        }

        self.listeners.emit(&RecoveryEvent::Complete {
            failed: failed.clone(),
        });

        Some(RecoveryReport {
            attempted: self.managers.len(),
            failed,
        })
    }
}

impl<C> Default for RecoveryCoordinator<C> {
    fn default() -> Self {
        Self::new()
    }
}
