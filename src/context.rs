//! GPU context loss/restore state machine
//!
//! An out-of-scope platform collaborator delivers the raw loss/restore
//! events; this container tracks where the context stands and owns the
//! exponential-backoff retry budget bounding recovery. The rendering loop
//! polls the deadline each tick with its own clock, so nothing here sleeps
//! or spawns timers.

use std::time::{Duration, Instant};

/// Retry budget for context restoration.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Timeout for the first restore attempt.
    pub initial_timeout: Duration,
    /// Ceiling the doubling timeout never exceeds.
    pub max_timeout: Duration,
    /// Attempts before the context is declared terminally failed.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_timeout: Duration::from_secs(1),
            max_timeout: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

/// Where the GPU context currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStatus {
    /// Context is live; rendering proceeds.
    Active,
    /// Loss signalled; waiting for the platform to restore.
    Lost,
    /// Restore signalled; recovery protocol is running.
    Restoring,
    /// Retry budget exhausted. Terminal; a full reload is required.
    Failed,
}

/// Outcome of polling the restore deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlinePoll {
    /// No deadline armed, or it has not elapsed yet.
    Pending,
    /// Deadline elapsed; an attempt was consumed and the deadline re-armed
    /// with a doubled timeout.
    Retry,
    /// Attempt budget exhausted; the context is now failed.
    Exhausted,
}

/// Context-loss state container.
pub struct ContextState {
    policy: RetryPolicy,
    status: ContextStatus,
    attempt: u32,
    deadline: Option<Instant>,
}

impl ContextState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            status: ContextStatus::Active,
            attempt: 0,
            deadline: None,
        }
    }

    pub fn status(&self) -> ContextStatus {
        self.status
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_failed(&self) -> bool {
        self.status == ContextStatus::Failed
    }

    /// Timeout for the current attempt: initial timeout doubled per
    /// consumed attempt, capped at the policy maximum.
    pub fn current_timeout(&self) -> Duration {
        let mut timeout = self.policy.initial_timeout;
        for _ in 0..self.attempt {
            timeout = (timeout * 2).min(self.policy.max_timeout);
        }
        timeout
    }

    /// The platform reported the context lost.
    ///
    /// Latest loss wins: a pending deadline is discarded and re-armed from
    /// `now`, so rapid repeated losses keep restarting the clock.
    pub fn on_context_lost(&mut self, now: Instant) {
        if self.status == ContextStatus::Failed {
            log::warn!("context loss reported after terminal failure, ignoring");
            return;
        }
        if self.deadline.is_some() {
            log::debug!("context lost again while a restore deadline was pending, re-arming");
        }
        self.status = ContextStatus::Lost;
        self.deadline = Some(now + self.current_timeout());
    }

    /// The platform has begun restoring the context.
    pub fn on_context_restoring(&mut self) {
        if self.status == ContextStatus::Lost {
            self.status = ContextStatus::Restoring;
        }
    }

    /// Restoration finished; the retry budget resets.
    pub fn on_context_restored(&mut self) {
        if self.status == ContextStatus::Failed {
            log::warn!("context restore reported after terminal failure, ignoring");
            return;
        }
        self.status = ContextStatus::Active;
        self.attempt = 0;
        self.deadline = None;
    }

    /// Force the terminal failed state.
    pub fn on_context_failed(&mut self) {
        self.status = ContextStatus::Failed;
        self.deadline = None;
    }

    /// Check the restore deadline against the caller's clock.
    ///
    /// On expiry one attempt is consumed; when attempts remain the deadline
    /// re-arms with the doubled timeout, otherwise the context fails.
    pub fn poll_deadline(&mut self, now: Instant) -> DeadlinePoll {
        let Some(deadline) = self.deadline else {
            return DeadlinePoll::Pending;
        };
        if now < deadline {
            return DeadlinePoll::Pending;
        }

        self.attempt += 1;
        if self.attempt >= self.policy.max_attempts {
            log::error!(
                "context not restored after {} attempts, giving up",
                self.attempt
            );
            self.on_context_failed();
            return DeadlinePoll::Exhausted;
        }

        let timeout = self.current_timeout();
        log::warn!(
            "restore attempt {} timed out, waiting {:?} for the next",
            self.attempt,
            timeout
        );
        self.deadline = Some(now + timeout);
        DeadlinePoll::Retry
    }
}
