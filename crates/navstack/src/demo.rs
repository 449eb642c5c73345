use navstack_core::navigation::{Widget, WidgetArgs, WidgetError, WidgetRegistry, WidgetTypeId};
use tracing::{debug, info};

pub const TITLE: WidgetTypeId = WidgetTypeId::new("Title");
pub const LOBBY: WidgetTypeId = WidgetTypeId::new("Lobby");
pub const GACHA: WidgetTypeId = WidgetTypeId::new("Gacha");
pub const GACHA_RESULT: WidgetTypeId = WidgetTypeId::new("GachaResult");
pub const SETTINGS: WidgetTypeId = WidgetTypeId::new("Settings");
pub const CONFIRM: WidgetTypeId = WidgetTypeId::new("Confirm");

const DEMO_TYPES: [WidgetTypeId; 6] = [TITLE, LOBBY, GACHA, GACHA_RESULT, SETTINGS, CONFIRM];

/// A widget with no presentation: every lifecycle call is a log line.
#[derive(Debug)]
pub struct TracingWidget {
    widget_type: WidgetTypeId,
    visible: bool,
}

impl TracingWidget {
    pub fn new(widget_type: WidgetTypeId) -> Self {
        TracingWidget {
            widget_type,
            visible: false,
        }
    }
}

impl Widget for TracingWidget {
    fn initialize(&mut self, args: &WidgetArgs) -> Result<(), WidgetError> {
        info!(widget = %self.widget_type, args = %args.as_value(), "widget initialized");
        Ok(())
    }

    fn show(&mut self) -> Result<(), WidgetError> {
        debug!(widget = %self.widget_type, "widget shown");
        self.visible = true;
        Ok(())
    }

    fn hide(&mut self) -> Result<(), WidgetError> {
        debug!(widget = %self.widget_type, "widget hidden");
        self.visible = false;
        Ok(())
    }

    fn release(&mut self) -> Result<(), WidgetError> {
        info!(widget = %self.widget_type, "widget released");
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

pub fn demo_registry() -> WidgetRegistry {
    let mut registry = WidgetRegistry::new();
    for widget_type in DEMO_TYPES {
        registry.register(widget_type, move || TracingWidget::new(widget_type));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_registry_registers_every_type() {
        let registry = demo_registry();
        assert_eq!(registry.len(), DEMO_TYPES.len());
        assert_eq!(registry.ids().next(), Some(TITLE));
    }
}
