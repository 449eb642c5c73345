//! Stack entries and their read-only descriptions.

use super::widget::{Widget, WidgetArgs, WidgetError, WidgetTypeId};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static CONTEXT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Whether a context is a full-page screen or an overlay popup.
///
/// The two kinds carry the same payload and only differ in stack policy:
/// pushing a screen hides the visible layer beneath it, pushing a popup
/// leaves it visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContextKind {
    Screen,
    Popup,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKind::Screen => f.write_str("Screen"),
            ContextKind::Popup => f.write_str("Popup"),
        }
    }
}

/// Process-unique identity of a pushed context.
///
/// Two pushes of the same widget type yield two different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        ContextId(CONTEXT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Copyable description of a context, as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextInfo {
    pub id: ContextId,
    pub kind: ContextKind,
    pub widget_type: WidgetTypeId,
    pub visible: bool,
}

impl ContextInfo {
    /// The `Kind:WidgetTypeId` token used by the stack debug string.
    pub fn token(&self) -> String {
        format!("{}:{}", self.kind, self.widget_type)
    }
}

/// A live stack entry that exclusively owns its widget.
///
/// Contexts are only created by the engine. Releasing consumes the context,
/// so a widget can never be released twice.
pub struct NavigationContext {
    id: ContextId,
    kind: ContextKind,
    widget_type: WidgetTypeId,
    view: Box<dyn Widget>,
    // Whether the last successful visibility call from the engine was `show`.
    shown: bool,
}

impl NavigationContext {
    pub(crate) fn new(kind: ContextKind, widget_type: WidgetTypeId, view: Box<dyn Widget>) -> Self {
        NavigationContext {
            id: ContextId::next(),
            kind,
            widget_type,
            view,
            shown: false,
        }
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    #[inline]
    pub fn widget_type(&self) -> WidgetTypeId {
        self.widget_type
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.view.is_visible()
    }

    pub fn view(&self) -> &(dyn Widget + 'static) {
        self.view.as_ref()
    }

    pub fn info(&self) -> ContextInfo {
        ContextInfo {
            id: self.id,
            kind: self.kind,
            widget_type: self.widget_type,
            visible: self.view.is_visible(),
        }
    }

    pub(crate) fn initialize(&mut self, args: &WidgetArgs) -> Result<(), WidgetError> {
        self.view.initialize(args)
    }

    /// Unconditional `show`, for an instance that was just initialized.
    pub(crate) fn show(&mut self) -> Result<(), WidgetError> {
        self.view.show()?;
        self.shown = true;
        Ok(())
    }

    /// Hides a context about to be removed.
    ///
    /// `hide` is called whenever the engine showed the widget, whatever the
    /// widget reports now. A widget whose `show` never succeeded is left
    /// alone.
    pub(crate) fn dismiss(&mut self) -> Result<(), WidgetError> {
        if !self.shown {
            return Ok(());
        }
        self.view.hide()?;
        self.shown = false;
        Ok(())
    }

    /// Shows a resident widget unless it already reports itself visible.
    ///
    /// Returns whether `show` was actually invoked.
    pub(crate) fn reveal(&mut self) -> Result<bool, WidgetError> {
        if self.view.is_visible() {
            return Ok(false);
        }
        self.view.show()?;
        self.shown = true;
        Ok(true)
    }

    /// Hides a resident widget unless it is already hidden.
    ///
    /// Returns whether `hide` was actually invoked.
    pub(crate) fn conceal(&mut self) -> Result<bool, WidgetError> {
        if !self.view.is_visible() {
            return Ok(false);
        }
        self.view.hide()?;
        self.shown = false;
        Ok(true)
    }

    pub(crate) fn release(mut self) -> Result<(), WidgetError> {
        self.view.release()
    }
}

impl fmt::Debug for NavigationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationContext")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("widget_type", &self.widget_type)
            .field("visible", &self.view.is_visible())
            .finish()
    }
}
