//! Errors returned by navigation operations.

use super::transition::NavigationOp;
use super::widget::{WidgetError, WidgetTypeId};
use std::fmt;

/// The lifecycle hook that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Initialize,
    Show,
    Hide,
    Release,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::Initialize => "initialize",
            LifecyclePhase::Show => "show",
            LifecyclePhase::Hide => "hide",
            LifecyclePhase::Release => "release",
        };
        f.write_str(name)
    }
}

/// Error types that can occur during navigation operations.
///
/// Operations on an empty stack are not errors: they report `false` or `0`
/// through their `Ok` value.
#[derive(thiserror::Error, Debug)]
pub enum NavigationError {
    /// Another mutating operation holds the transition lock
    #[error("navigation rejected: {op} is already in progress")]
    TransitionInProgress { op: NavigationOp },

    /// No factory is registered for the requested widget type
    #[error("no widget registered for type {0}")]
    UnknownWidget(WidgetTypeId),

    /// The configured maximum stack depth would be exceeded
    #[error("navigation stack is full ({max_depth} contexts)")]
    StackFull { max_depth: usize },

    /// A widget hook failed; the stack was committed or rolled back as a whole
    #[error("widget {widget} failed to {phase}")]
    Lifecycle {
        widget: WidgetTypeId,
        phase: LifecyclePhase,
        #[source]
        source: WidgetError,
    },
}

impl NavigationError {
    pub(crate) fn lifecycle(widget: WidgetTypeId, phase: LifecyclePhase, source: WidgetError) -> Self {
        NavigationError::Lifecycle {
            widget,
            phase,
            source,
        }
    }

    /// Whether the call was turned away because a transition was running.
    pub fn is_rejected(&self) -> bool {
        matches!(self, NavigationError::TransitionInProgress { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_lifecycle_error_message_and_source() {
        let err = NavigationError::lifecycle(
            WidgetTypeId::new("GachaResult"),
            LifecyclePhase::Initialize,
            WidgetError::new("banner expired"),
        );

        assert_eq!(err.to_string(), "widget GachaResult failed to initialize");
        assert_eq!(
            err.source().map(|source| source.to_string()),
            Some("banner expired".to_string())
        );
        assert!(!err.is_rejected());
    }

    #[test]
    fn test_rejection_names_running_op() {
        let err = NavigationError::TransitionInProgress {
            op: NavigationOp::PushScreen,
        };
        assert!(err.is_rejected());
        assert_eq!(
            err.to_string(),
            "navigation rejected: push_screen is already in progress"
        );
    }
}
