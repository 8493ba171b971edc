//! Single-flight state container for one fallible async action.
//!
//! The state is a tagged value, so "is something in flight" is answered by
//! looking at one field. Every start and every reset bumps an attempt
//! counter; a task that settles after its attempt has been superseded is
//! discarded instead of overwriting newer state.

use std::{
    future::Future,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::FutureExt;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncState<T, E> {
    Idle,
    Pending,
    Succeeded(T),
    Failed(E),
}

impl<T, E> AsyncState<T, E> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Whether a settled task's result made it into the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    /// The attempt was reset or superseded before the task finished.
    Stale,
}

#[derive(Debug)]
pub struct AttemptHandle {
    attempt: u64,
    join: JoinHandle<Settlement>,
}

impl AttemptHandle {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Waits for the task to finish. A task that panicked reports `Stale`.
    pub async fn settled(self) -> Settlement {
        self.join.await.unwrap_or(Settlement::Stale)
    }
}

#[derive(Debug)]
pub enum StartOutcome {
    Started(AttemptHandle),
    /// A run was already in flight; the new task was dropped without being
    /// invoked.
    AlreadyPending,
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    pub fn into_handle(self) -> Option<AttemptHandle> {
        match self {
            Self::Started(handle) => Some(handle),
            Self::AlreadyPending => None,
        }
    }
}

struct Shared<T, E> {
    attempt: Mutex<u64>,
    state: watch::Sender<AsyncState<T, E>>,
}

impl<T, E> Shared<T, E> {
    fn lock_attempt(&self) -> MutexGuard<'_, u64> {
        self.attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops a run that produced no result. Only the current attempt is
    /// rolled back to `Idle`.
    fn abandon(&self, attempt: u64) {
        let current = self.lock_attempt();
        if *current == attempt {
            self.state.send_replace(AsyncState::Idle);
        }
    }
}

/// Tasks are spawned on the ambient tokio runtime, so `start` must be called
/// from within one.
pub struct AsyncOperation<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> AsyncOperation<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (state, _) = watch::channel(AsyncState::Idle);
        Self {
            shared: Arc::new(Shared {
                attempt: Mutex::new(0),
                state,
            }),
        }
    }

    pub fn start<F, Fut>(&self, task: F) -> StartOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.start_then(task, |_| {})
    }

    /// Like [`start`](Self::start), and runs `on_applied` once the result
    /// has been stored. `on_applied` never runs for a stale result.
    ///
    /// `on_applied` runs after the attempt lock is released, so a `reset`
    /// that lands between storing the result and the callback does not
    /// withdraw it: an applied attempt always delivers its result.
    ///
    /// A task that panics, either while building its future or while
    /// polling it, puts the container back to `Idle` so the next `start`
    /// can run.
    pub fn start_then<F, Fut, C>(&self, task: F, on_applied: C) -> StartOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        C: FnOnce(&Result<T, E>) + Send + 'static,
    {
        let attempt = {
            let mut current = self.shared.lock_attempt();
            if self.shared.state.borrow().is_pending() {
                debug!(attempt = *current, "start ignored; attempt already pending");
                return StartOutcome::AlreadyPending;
            }
            *current += 1;
            self.shared.state.send_replace(AsyncState::Pending);
            *current
        };

        let future = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(future) => future,
            Err(payload) => {
                self.shared.abandon(attempt);
                panic::resume_unwind(payload);
            }
        };

        let shared = Arc::clone(&self.shared);
        let join = tokio::spawn(async move {
            let result = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    warn!(attempt, "async operation task panicked");
                    shared.abandon(attempt);
                    return Settlement::Stale;
                }
            };

            {
                let current = shared.lock_attempt();
                if *current != attempt {
                    debug!(attempt, current = *current, "discarding stale completion");
                    return Settlement::Stale;
                }
                let settled = match &result {
                    Ok(value) => AsyncState::Succeeded(value.clone()),
                    Err(err) => AsyncState::Failed(err.clone()),
                };
                shared.state.send_replace(settled);
            }

            on_applied(&result);
            Settlement::Applied
        });

        StartOutcome::Started(AttemptHandle { attempt, join })
    }

    /// Returns to `Idle`. An in-flight task keeps running but its result
    /// will be discarded.
    pub fn reset(&self) {
        let mut current = self.shared.lock_attempt();
        *current += 1;
        self.shared.state.send_replace(AsyncState::Idle);
    }

    pub fn snapshot(&self) -> AsyncState<T, E> {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AsyncState<T, E>> {
        self.shared.state.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.state.borrow().is_pending()
    }

    pub fn attempt(&self) -> u64 {
        *self.shared.lock_attempt()
    }
}

impl<T, E> Default for AsyncOperation<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/async_operation_tests.rs"]
mod tests;
