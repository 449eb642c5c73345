//! Widget doubles for exercising the navigation engine.
//!
//! [`RecordingWidget`] logs every lifecycle call and panics when the engine
//! breaks the call-order contract (showing twice in a row, touching a
//! released instance, ...). [`Fixtures`] registers recording widgets under
//! the usual screen and popup ids and keeps a handle on every instance the
//! engine spawns.

use crate::navigation::{
    NavigationEngine, Widget, WidgetArgs, WidgetError, WidgetRegistry, WidgetTypeId,
};
use crate::settings::NavigationSettings;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub const TITLE: WidgetTypeId = WidgetTypeId::new("Title");
pub const LOBBY: WidgetTypeId = WidgetTypeId::new("Lobby");
pub const GACHA: WidgetTypeId = WidgetTypeId::new("Gacha");
pub const GACHA_RESULT: WidgetTypeId = WidgetTypeId::new("GachaResult");
pub const CONFIRM: WidgetTypeId = WidgetTypeId::new("Confirm");
pub const NOTICE: WidgetTypeId = WidgetTypeId::new("Notice");

const GATE_TIMEOUT: Duration = Duration::from_secs(5);

static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCall {
    Initialize,
    Show,
    Hide,
    Release,
}

/// Shared, append-only record of the calls one widget received.
#[derive(Debug, Clone, Default)]
pub struct LifecycleLog(Arc<Mutex<Vec<LifecycleCall>>>);

impl LifecycleLog {
    fn record(&self, call: LifecycleCall) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<LifecycleCall> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, call: LifecycleCall) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }
}

/// Blocks a widget inside one lifecycle hook until the test resumes it.
#[derive(Clone)]
pub struct Gate {
    call: LifecycleCall,
    entered: Sender<()>,
    resume: Arc<Mutex<Receiver<()>>>,
}

/// Test-side end of a [`Gate`].
pub struct GateHandle {
    entered: Receiver<()>,
    resume: Sender<()>,
}

impl Gate {
    pub fn new(call: LifecycleCall) -> (Gate, GateHandle) {
        let (entered_tx, entered_rx) = channel();
        let (resume_tx, resume_rx) = channel();
        (
            Gate {
                call,
                entered: entered_tx,
                resume: Arc::new(Mutex::new(resume_rx)),
            },
            GateHandle {
                entered: entered_rx,
                resume: resume_tx,
            },
        )
    }

    fn pass(&self, call: LifecycleCall) {
        if call != self.call {
            return;
        }
        self.entered.send(()).ok();
        let resume = self.resume.lock().unwrap_or_else(PoisonError::into_inner);
        resume.recv_timeout(GATE_TIMEOUT).ok();
    }
}

impl GateHandle {
    /// Waits until a widget is parked inside the gated hook.
    pub fn wait_entered(&self) {
        self.entered
            .recv_timeout(GATE_TIMEOUT)
            .expect("widget never reached the gated lifecycle hook");
    }

    pub fn resume(&self) {
        self.resume.send(()).ok();
    }
}

type Hook = Box<dyn FnMut() + Send>;

/// What a widget reports from `is_visible`, shared with the test so it can
/// stand in for a widget that shows or hides itself.
#[derive(Debug, Clone, Default)]
pub struct Visibility(Arc<AtomicBool>);

impl Visibility {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::SeqCst);
    }
}

pub struct RecordingWidget {
    instance: u64,
    visible: Visibility,
    shown: bool,
    initialized: bool,
    released: bool,
    args: WidgetArgs,
    log: LifecycleLog,
    fail_on: Option<LifecycleCall>,
    gate: Option<Gate>,
    hook: Option<(LifecycleCall, Hook)>,
}

impl RecordingWidget {
    pub fn new() -> (RecordingWidget, LifecycleLog) {
        let log = LifecycleLog::default();
        let widget = RecordingWidget {
            instance: INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed),
            visible: Visibility::default(),
            shown: false,
            initialized: false,
            released: false,
            args: WidgetArgs::new(),
            log: log.clone(),
            fail_on: None,
            gate: None,
            hook: None,
        };
        (widget, log)
    }

    /// Reports itself visible before the first `show`.
    pub fn starting_visible(self) -> Self {
        self.visible.set(true);
        self
    }

    /// Makes the given hook fail after being recorded.
    pub fn failing_on(mut self, call: LifecycleCall) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Runs `hook` from inside the given lifecycle call.
    pub fn with_hook(mut self, call: LifecycleCall, hook: impl FnMut() + Send + 'static) -> Self {
        self.hook = Some((call, Box::new(hook)));
        self
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn args(&self) -> &WidgetArgs {
        &self.args
    }

    pub fn log(&self) -> &LifecycleLog {
        &self.log
    }

    pub fn visibility(&self) -> Visibility {
        self.visible.clone()
    }

    fn enter(&mut self, call: LifecycleCall) -> Result<(), WidgetError> {
        assert!(!self.released, "{:?} on released widget {}", call, self.instance);
        self.log.record(call);
        if let Some(gate) = &self.gate {
            gate.pass(call);
        }
        if let Some((hook_call, hook)) = &mut self.hook {
            if *hook_call == call {
                hook();
            }
        }
        if self.fail_on == Some(call) {
            return Err(WidgetError::new(format!("{:?} failed", call)));
        }
        Ok(())
    }
}

impl Widget for RecordingWidget {
    fn initialize(&mut self, args: &WidgetArgs) -> Result<(), WidgetError> {
        assert!(!self.initialized, "widget {} initialized twice", self.instance);
        self.enter(LifecycleCall::Initialize)?;
        self.initialized = true;
        self.args = args.clone();
        Ok(())
    }

    fn show(&mut self) -> Result<(), WidgetError> {
        assert!(!self.shown, "widget {} shown twice", self.instance);
        self.enter(LifecycleCall::Show)?;
        self.shown = true;
        self.visible.set(true);
        Ok(())
    }

    fn hide(&mut self) -> Result<(), WidgetError> {
        assert!(self.shown, "widget {} hidden without being shown", self.instance);
        self.enter(LifecycleCall::Hide)?;
        self.shown = false;
        self.visible.set(false);
        Ok(())
    }

    fn release(&mut self) -> Result<(), WidgetError> {
        let result = self.enter(LifecycleCall::Release);
        self.released = true;
        result
    }

    fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

/// An instance handed out by a [`Fixtures`] factory.
#[derive(Debug, Clone)]
pub struct Spawned {
    pub widget_type: WidgetTypeId,
    pub instance: u64,
    pub log: LifecycleLog,
    pub visibility: Visibility,
}

#[derive(Clone, Default)]
pub struct Fixtures {
    spawned: Arc<Mutex<Vec<Spawned>>>,
}

impl Fixtures {
    pub fn new() -> Self {
        Fixtures::default()
    }

    pub fn register(&self, registry: &mut WidgetRegistry, id: WidgetTypeId) {
        self.register_with(registry, id, |widget| widget);
    }

    pub fn register_failing(
        &self,
        registry: &mut WidgetRegistry,
        id: WidgetTypeId,
        call: LifecycleCall,
    ) {
        self.register_with(registry, id, move |widget| widget.failing_on(call));
    }

    /// Every instance of `id` parks in `call` until the returned handle resumes it.
    pub fn register_gated(
        &self,
        registry: &mut WidgetRegistry,
        id: WidgetTypeId,
        call: LifecycleCall,
    ) -> GateHandle {
        let (gate, handle) = Gate::new(call);
        self.register_with(registry, id, move |widget| widget.with_gate(gate.clone()));
        handle
    }

    pub fn register_with<F>(&self, registry: &mut WidgetRegistry, id: WidgetTypeId, customize: F)
    where
        F: Fn(RecordingWidget) -> RecordingWidget + Send + Sync + 'static,
    {
        let spawned = Arc::clone(&self.spawned);
        registry.register(id, move || {
            let (widget, log) = RecordingWidget::new();
            let widget = customize(widget);
            spawned
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Spawned {
                    widget_type: id,
                    instance: widget.instance(),
                    log,
                    visibility: widget.visibility(),
                });
            widget
        });
    }

    pub fn spawned(&self, id: WidgetTypeId) -> Vec<Spawned> {
        self.spawned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.widget_type == id)
            .cloned()
            .collect()
    }

    pub fn last(&self, id: WidgetTypeId) -> Option<Spawned> {
        self.spawned(id).pop()
    }

    pub fn total(&self) -> usize {
        self.spawned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A registry with every fixture id registered as a plain recording widget.
pub fn fixture_registry(fixtures: &Fixtures) -> WidgetRegistry {
    let mut registry = WidgetRegistry::new();
    for id in [TITLE, LOBBY, GACHA, GACHA_RESULT, CONFIRM, NOTICE] {
        fixtures.register(&mut registry, id);
    }
    registry
}

pub fn fixture_engine() -> (NavigationEngine, Fixtures) {
    let fixtures = Fixtures::new();
    let engine = NavigationEngine::new(fixture_registry(&fixtures), NavigationSettings::default());
    (engine, fixtures)
}
