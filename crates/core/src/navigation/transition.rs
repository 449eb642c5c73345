//! The transition lock serializing every stack mutation.
//!
//! The lock is a two-state machine guarded by a mutex. Acquisition never
//! waits: a caller arriving while another operation is `Transitioning` is
//! turned away, and it is up to the caller to retry once the engine is idle.
//! The mutex is only held for the few instructions it takes to flip the
//! state, so readers checking [`TransitionLock::is_transitioning`] are never
//! stalled by a running transition.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitionState {
    Idle,
    Transitioning(NavigationOp),
}

/// The operation currently holding the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NavigationOp {
    PushScreen,
    PushPopup,
    Pop,
    Back,
    CloseAllPopups,
    PopTo,
    /// Read access to a live widget through `inspect_widget`.
    Inspect,
}

impl fmt::Display for NavigationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavigationOp::PushScreen => "push_screen",
            NavigationOp::PushPopup => "push_popup",
            NavigationOp::Pop => "pop",
            NavigationOp::Back => "back",
            NavigationOp::CloseAllPopups => "close_all_popups",
            NavigationOp::PopTo => "pop_to",
            NavigationOp::Inspect => "inspect",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct TransitionLock {
    state: Mutex<TransitionState>,
}

impl Default for TransitionLock {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionLock {
    pub fn new() -> Self {
        TransitionLock {
            state: Mutex::new(TransitionState::Idle),
        }
    }

    // Poisoning only means a widget hook panicked mid-transition; the guard
    // already reset the state while unwinding.
    fn state(&self) -> MutexGuard<'_, TransitionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> TransitionState {
        *self.state()
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.current(), TransitionState::Transitioning(_))
    }

    /// Moves `Idle -> Transitioning(op)`.
    ///
    /// Returns `Err` with the operation already in progress when the lock is
    /// held.
    pub fn try_begin(&self, op: NavigationOp) -> Result<TransitionGuard<'_>, NavigationOp> {
        let mut state = self.state();
        match *state {
            TransitionState::Transitioning(running) => Err(running),
            TransitionState::Idle => {
                *state = TransitionState::Transitioning(op);
                Ok(TransitionGuard { lock: self })
            }
        }
    }
}

/// Holds the lock for one operation; dropping it returns the lock to `Idle`.
#[must_use = "the transition ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TransitionGuard<'a> {
    lock: &'a TransitionLock,
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        *self.lock.state() = TransitionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_starts_idle() {
        let lock = TransitionLock::new();
        assert_eq!(lock.current(), TransitionState::Idle);
        assert!(!lock.is_transitioning());
    }

    #[test]
    fn test_second_begin_is_rejected_with_running_op() {
        let lock = TransitionLock::new();
        let _guard = lock.try_begin(NavigationOp::PushScreen).unwrap();

        assert!(lock.is_transitioning());
        assert_eq!(
            lock.try_begin(NavigationOp::Pop).unwrap_err(),
            NavigationOp::PushScreen
        );
    }

    #[test]
    fn test_dropping_guard_returns_to_idle() {
        let lock = TransitionLock::new();
        {
            let _guard = lock.try_begin(NavigationOp::Back).unwrap();
            assert_eq!(
                lock.current(),
                TransitionState::Transitioning(NavigationOp::Back)
            );
        }
        assert_eq!(lock.current(), TransitionState::Idle);
        assert!(lock.try_begin(NavigationOp::Pop).is_ok());
    }

    #[test]
    fn test_guard_released_when_operation_panics() {
        let lock = TransitionLock::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = lock.try_begin(NavigationOp::PushPopup).unwrap();
            panic!("widget hook panicked");
        }));

        assert!(result.is_err());
        assert!(!lock.is_transitioning());
    }

    #[test]
    fn test_op_display_names() {
        assert_eq!(NavigationOp::CloseAllPopups.to_string(), "close_all_popups");
        assert_eq!(NavigationOp::PushScreen.to_string(), "push_screen");
    }
}
