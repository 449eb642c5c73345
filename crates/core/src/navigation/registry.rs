//! Widget factories keyed by [`WidgetTypeId`].
//!
//! The engine never constructs widgets itself. Each navigable type is
//! registered once at startup with a factory closure, and every push asks
//! the registry for a fresh instance. Pushing the same type twice therefore
//! yields two independent instances.

use super::widget::{Widget, WidgetTypeId};
use indexmap::IndexMap;
use std::fmt;

type WidgetFactory = Box<dyn Fn() -> Box<dyn Widget> + Send + Sync>;

#[derive(Default)]
pub struct WidgetRegistry {
    factories: IndexMap<WidgetTypeId, WidgetFactory>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        WidgetRegistry {
            factories: IndexMap::new(),
        }
    }

    /// Registers a factory for `id`, replacing any previous registration.
    ///
    /// Returns `true` when an earlier factory was replaced. Replacing keeps
    /// the original registration position.
    pub fn register<W, F>(&mut self, id: WidgetTypeId, factory: F) -> bool
    where
        W: Widget,
        F: Fn() -> W + Send + Sync + 'static,
    {
        let replaced = self
            .factories
            .insert(id, Box::new(move || Box::new(factory()) as Box<dyn Widget>))
            .is_some();
        if replaced {
            tracing::warn!(widget = %id, "replaced widget factory");
        }
        replaced
    }

    pub fn contains(&self, id: WidgetTypeId) -> bool {
        self.factories.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = WidgetTypeId> + '_ {
        self.factories.keys().copied()
    }

    pub(crate) fn instantiate(&self, id: WidgetTypeId) -> Option<Box<dyn Widget>> {
        self.factories.get(&id).map(|factory| factory())
    }
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
