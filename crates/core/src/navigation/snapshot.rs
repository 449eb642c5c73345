//! Immutable views of the navigation stack for readers.
//!
//! The engine publishes a fresh [`StackSnapshot`] after every committed
//! append or removal. Readers clone the `Arc` and query it at leisure, so
//! they observe either the state before or after a mutation, never a
//! half-applied one.

use super::context::{ContextId, ContextInfo, ContextKind};
use super::widget::WidgetTypeId;
use serde::Serialize;

/// Separator between tokens of [`StackSnapshot::debug_string`].
pub const DEBUG_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackSnapshot {
    contexts: Vec<ContextInfo>,
}

impl StackSnapshot {
    pub(crate) fn new(contexts: Vec<ContextInfo>) -> Self {
        StackSnapshot { contexts }
    }

    /// Contexts from bottom (index 0) to top.
    pub fn contexts(&self) -> &[ContextInfo] {
        &self.contexts
    }

    pub fn stack_count(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn screen_count(&self) -> usize {
        self.count_kind(ContextKind::Screen)
    }

    pub fn popup_count(&self) -> usize {
        self.count_kind(ContextKind::Popup)
    }

    fn count_kind(&self, kind: ContextKind) -> usize {
        self.contexts.iter().filter(|c| c.kind == kind).count()
    }

    /// The tail of the stack, of any kind.
    pub fn current_context(&self) -> Option<ContextInfo> {
        self.contexts.last().copied()
    }

    /// The nearest screen from the tail, possibly with popups above it.
    pub fn current_screen(&self) -> Option<ContextInfo> {
        self.contexts
            .iter()
            .rev()
            .find(|c| c.kind == ContextKind::Screen)
            .copied()
    }

    pub fn has_popup_on_top(&self) -> bool {
        matches!(self.current_context(), Some(c) if c.kind == ContextKind::Popup)
    }

    pub fn contains(&self, id: ContextId) -> bool {
        self.contexts.iter().any(|c| c.id == id)
    }

    /// Contexts of the given widget type, bottom to top.
    pub fn find(&self, widget_type: WidgetTypeId) -> impl Iterator<Item = &ContextInfo> + '_ {
        self.contexts
            .iter()
            .filter(move |c| c.widget_type == widget_type)
    }

    /// Renders `Kind:WidgetTypeId` tokens in stack order.
    ///
    /// ```txt
    /// Screen:Title > Screen:Lobby > Popup:GachaResult
    /// ```
    ///
    /// An empty stack renders as an empty string.
    pub fn debug_string(&self) -> String {
        self.contexts
            .iter()
            .map(ContextInfo::token)
            .collect::<Vec<_>>()
            .join(DEBUG_SEPARATOR)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::context::NavigationContext;
    use crate::test_helpers::RecordingWidget;

    fn info(kind: ContextKind, name: &'static str) -> ContextInfo {
        let (widget, _) = RecordingWidget::new();
        NavigationContext::new(kind, WidgetTypeId::new(name), Box::new(widget)).info()
    }

    fn lobby_with_gacha() -> StackSnapshot {
        StackSnapshot::new(vec![
            info(ContextKind::Screen, "Title"),
            info(ContextKind::Screen, "Lobby"),
            info(ContextKind::Popup, "GachaResult"),
        ])
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = StackSnapshot::default();
        assert_eq!(snapshot.stack_count(), 0);
        assert!(snapshot.current_context().is_none());
        assert!(snapshot.current_screen().is_none());
        assert!(!snapshot.has_popup_on_top());
        assert_eq!(snapshot.debug_string(), "");
    }

    #[test]
    fn test_debug_string_lists_tokens_in_order() {
        assert_eq!(
            lobby_with_gacha().debug_string(),
            "Screen:Title > Screen:Lobby > Popup:GachaResult"
        );
    }

    #[test]
    fn test_current_screen_skips_popups() {
        let snapshot = lobby_with_gacha();

        assert_eq!(snapshot.current_context().unwrap().kind, ContextKind::Popup);
        assert_eq!(snapshot.current_screen().unwrap().widget_type.name(), "Lobby");
        assert!(snapshot.has_popup_on_top());
    }

    #[test]
    fn test_counts() {
        let snapshot = lobby_with_gacha();
        assert_eq!(snapshot.screen_count(), 2);
        assert_eq!(snapshot.popup_count(), 1);
        assert_eq!(
            snapshot.screen_count() + snapshot.popup_count(),
            snapshot.stack_count()
        );
    }

    #[test]
    fn test_find_by_widget_type() {
        let snapshot = StackSnapshot::new(vec![
            info(ContextKind::Screen, "Lobby"),
            info(ContextKind::Popup, "Confirm"),
            info(ContextKind::Popup, "Confirm"),
        ]);

        let found: Vec<_> = snapshot.find(WidgetTypeId::new("Confirm")).collect();
        assert_eq!(found.len(), 2);
        assert_ne!(found[0].id, found[1].id);
        assert!(snapshot.contains(found[1].id));
    }

    #[test]
    fn test_json_export_uses_names() {
        let json = lobby_with_gacha().to_json().unwrap();
        assert!(json.contains("\"widget_type\": \"GachaResult\""));
        assert!(json.contains("\"kind\": \"Popup\""));
    }
}
