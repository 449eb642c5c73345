//! Ordered storage for live navigation contexts.
//!
//! Insertion order is recency: the tail is the current context. The only
//! mutations exposed are append and tail removal, so the sequence can never
//! be reordered and a screen can never end up beneath a popup pushed before
//! it.
//!
//! # Visible layer
//!
//! The *visible layer* is the topmost screen together with every popup
//! stacked above it. When the stack holds no screen at all, the whole stack
//! is the visible layer. Contexts below the layer are resident but hidden.
//!
//! ```txt
//!   index 0  Screen:Title        hidden (resident)
//!   index 1  Screen:Lobby        ┐
//!   index 2  Popup:Gacha         │ visible layer
//!   index 3  Popup:GachaResult   ┘ <- tail / current
//! ```

use super::context::{ContextId, ContextInfo, ContextKind, NavigationContext};

#[derive(Debug, Default)]
pub struct NavigationStack {
    contexts: Vec<NavigationContext>,
}

impl NavigationStack {
    pub fn new() -> Self {
        NavigationStack {
            contexts: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn push(&mut self, context: NavigationContext) {
        self.contexts.push(context);
    }

    pub fn pop(&mut self) -> Option<NavigationContext> {
        self.contexts.pop()
    }

    pub fn tail(&self) -> Option<&NavigationContext> {
        self.contexts.last()
    }

    pub(crate) fn tail_mut(&mut self) -> Option<&mut NavigationContext> {
        self.contexts.last_mut()
    }

    pub fn tail_kind(&self) -> Option<ContextKind> {
        self.tail().map(NavigationContext::kind)
    }

    pub fn get(&self, index: usize) -> Option<&NavigationContext> {
        self.contexts.get(index)
    }

    pub fn count_kind(&self, kind: ContextKind) -> usize {
        self.contexts.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn position(&self, id: ContextId) -> Option<usize> {
        self.contexts.iter().position(|c| c.id() == id)
    }

    /// Index of the first context of the visible layer.
    ///
    /// Returns `0` for an empty stack.
    pub fn visible_layer_start(&self) -> usize {
        self.contexts
            .iter()
            .rposition(|c| c.kind() == ContextKind::Screen)
            .unwrap_or(0)
    }

    /// Number of popups stacked contiguously at the tail.
    pub fn tail_popup_run(&self) -> usize {
        self.contexts
            .iter()
            .rev()
            .take_while(|c| c.kind() == ContextKind::Popup)
            .count()
    }

    pub(crate) fn visible_layer_mut(&mut self) -> &mut [NavigationContext] {
        let start = self.visible_layer_start();
        &mut self.contexts[start..]
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut NavigationContext> {
        self.contexts.get_mut(index)
    }

    pub fn infos(&self) -> Vec<ContextInfo> {
        self.contexts.iter().map(NavigationContext::info).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::widget::WidgetTypeId;
    use crate::test_helpers::RecordingWidget;

    fn context(kind: ContextKind, name: &'static str) -> NavigationContext {
        let (widget, _) = RecordingWidget::new();
        NavigationContext::new(kind, WidgetTypeId::new(name), Box::new(widget))
    }

    fn stack_of(entries: &[(ContextKind, &'static str)]) -> NavigationStack {
        let mut stack = NavigationStack::new();
        for (kind, name) in entries {
            stack.push(context(*kind, name));
        }
        stack
    }

    #[test]
    fn test_empty_stack() {
        let stack = NavigationStack::new();
        assert!(stack.is_empty());
        assert!(stack.tail().is_none());
        assert_eq!(stack.visible_layer_start(), 0);
        assert_eq!(stack.tail_popup_run(), 0);
    }

    #[test]
    fn test_push_pop_is_lifo() {
        let mut stack = stack_of(&[
            (ContextKind::Screen, "Title"),
            (ContextKind::Screen, "Lobby"),
        ]);

        assert_eq!(stack.tail().map(|c| c.widget_type().name()), Some("Lobby"));
        let popped = stack.pop().unwrap();
        assert_eq!(popped.widget_type().name(), "Lobby");
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_counts_by_kind_sum_to_len() {
        let stack = stack_of(&[
            (ContextKind::Screen, "Title"),
            (ContextKind::Popup, "Notice"),
            (ContextKind::Screen, "Lobby"),
            (ContextKind::Popup, "Gacha"),
        ]);

        let screens = stack.count_kind(ContextKind::Screen);
        let popups = stack.count_kind(ContextKind::Popup);
        assert_eq!(screens, 2);
        assert_eq!(popups, 2);
        assert_eq!(screens + popups, stack.len());
    }

    #[test]
    fn test_visible_layer_starts_at_topmost_screen() {
        let stack = stack_of(&[
            (ContextKind::Screen, "Title"),
            (ContextKind::Screen, "Lobby"),
            (ContextKind::Popup, "Gacha"),
            (ContextKind::Popup, "GachaResult"),
        ]);

        assert_eq!(stack.visible_layer_start(), 1);
        assert_eq!(stack.tail_popup_run(), 2);
    }

    #[test]
    fn test_visible_layer_without_screens_is_whole_stack() {
        let stack = stack_of(&[
            (ContextKind::Popup, "Maintenance"),
            (ContextKind::Popup, "Confirm"),
        ]);

        assert_eq!(stack.visible_layer_start(), 0);
        assert_eq!(stack.tail_popup_run(), 2);
    }

    #[test]
    fn test_position_finds_context_by_id() {
        let stack = stack_of(&[
            (ContextKind::Screen, "Title"),
            (ContextKind::Screen, "Lobby"),
        ]);

        let lobby = stack.get(1).unwrap().id();
        assert_eq!(stack.position(lobby), Some(1));
    }
}
