//! The navigation engine coordinating every screen and popup.
//!
//! `NavigationEngine` owns the single [`NavigationStack`] of the client and is
//! the only way to mutate it. It is built once at startup and handed to every
//! caller (usually as `Arc<NavigationEngine>`); there is no global accessor.
//!
//! # Operations
//!
//! | operation            | lock | effect                                             |
//! |----------------------|------|----------------------------------------------------|
//! | `push_screen`        | yes  | hide visible layer, append + show a new screen     |
//! | `push_popup`         | yes  | append + show a popup above the visible layer      |
//! | `pop`                | yes  | hide + release the tail, reveal the new layer      |
//! | `back`               | yes  | `pop`, unless the tail is the only context         |
//! | `close_all_popups`   | yes  | pop the contiguous popup run at the tail           |
//! | `pop_to`             | yes  | pop everything above a given context               |
//! | queries / `snapshot` | no   | read the last published [`StackSnapshot`]          |
//!
//! # Visibility
//!
//! A new instance always gets `initialize` then `show`, and the tail being
//! removed always gets `hide` before `release`, whatever the widget reports
//! from `is_visible`. Contexts that stay on the stack are only shown or
//! hidden when `is_visible` disagrees with the layer they end up in.
//!
//! # Concurrency
//!
//! Mutating operations hold the [`TransitionLock`] for their whole duration,
//! widget hooks included. A second mutating call arriving meanwhile, from
//! another thread or re-entrantly from a widget hook, fails immediately with
//! [`NavigationError::TransitionInProgress`] and has no side effects.
//!
//! Queries never wait for a transition. They read the snapshot published
//! after the previous operation completed, so during a transition they report
//! the state from before it. [`NavigationEngine::inspect_widget`] takes the
//! transition lock itself, so it returns `None` during a transition and
//! navigation from inside its closure is rejected.
//!
//! # Failure handling
//!
//! Widget hook failures are returned as [`NavigationError::Lifecycle`]:
//!
//! - A failed push is rolled back: the new instance is discarded (released
//!   only when its `show` failed) and every context hidden for it is shown
//!   again.
//! - A failed `hide` during a removal leaves the context in place.
//! - Once a context is hidden its removal commits. A failing `release`, or a
//!   failing `show` while revealing the new layer, is reported after the
//!   stack has been updated.
//!
//! In every case the transition lock is released and the snapshot reflects
//! exactly the committed state.

use super::context::{ContextId, ContextInfo, ContextKind, NavigationContext};
use super::error::{LifecyclePhase, NavigationError};
use super::event::{EventHub, NavigationEvent};
use super::registry::WidgetRegistry;
use super::snapshot::StackSnapshot;
use super::stack::NavigationStack;
use super::transition::{NavigationOp, TransitionGuard, TransitionLock, TransitionState};
use super::widget::{Widget, WidgetArgs, WidgetTypeId};
use crate::settings::NavigationSettings;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

pub struct NavigationEngine {
    registry: WidgetRegistry,
    settings: NavigationSettings,
    transition: TransitionLock,
    stack: Mutex<NavigationStack>,
    published: RwLock<Arc<StackSnapshot>>,
    events: EventHub,
}

impl NavigationEngine {
    pub fn new(registry: WidgetRegistry, settings: NavigationSettings) -> Self {
        tracing::debug!(
            widgets = registry.len(),
            max_depth = settings.max_depth,
            "creating navigation engine"
        );
        NavigationEngine {
            registry,
            settings,
            transition: TransitionLock::new(),
            stack: Mutex::new(NavigationStack::new()),
            published: RwLock::new(Arc::new(StackSnapshot::default())),
            events: EventHub::default(),
        }
    }

    /// Pushes a new full-page screen.
    ///
    /// Every visible context (the current screen and the popups above it) is
    /// hidden but stays resident, so a later [`back`](Self::back) restores the
    /// very same instances.
    #[tracing::instrument(level = "debug", skip(self, args), fields(widget = %widget_type))]
    pub fn push_screen(
        &self,
        widget_type: WidgetTypeId,
        args: WidgetArgs,
    ) -> Result<ContextInfo, NavigationError> {
        self.push(ContextKind::Screen, widget_type, &args)
    }

    /// Pushes an overlay popup. Nothing beneath it is hidden.
    #[tracing::instrument(level = "debug", skip(self, args), fields(widget = %widget_type))]
    pub fn push_popup(
        &self,
        widget_type: WidgetTypeId,
        args: WidgetArgs,
    ) -> Result<ContextInfo, NavigationError> {
        self.push(ContextKind::Popup, widget_type, &args)
    }

    /// Removes the tail context, whatever its kind.
    ///
    /// Returns `Ok(false)` on an empty stack.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn pop(&self) -> Result<bool, NavigationError> {
        self.transact(NavigationOp::Pop, |stack, events| {
            let removed = self.remove_tail(stack, events);
            self.settle(stack, removed).map(|info| info.is_some())
        })
    }

    /// User-facing back navigation.
    ///
    /// Pops the tail unless it is the last remaining context. `Ok(false)`
    /// means there is nowhere to go back to; what happens then (an exit
    /// prompt, ...) is the caller's decision.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn back(&self) -> Result<bool, NavigationError> {
        self.transact(NavigationOp::Back, |stack, events| match stack.tail_kind() {
            None => Ok(false),
            Some(ContextKind::Screen) if stack.len() == 1 => {
                tracing::debug!("cannot go back further");
                Ok(false)
            }
            Some(_) => {
                let removed = self.remove_tail(stack, events);
                self.settle(stack, removed).map(|info| info.is_some())
            }
        })
    }

    /// Closes the popups stacked contiguously at the tail, newest first.
    ///
    /// Screens are never touched. Returns the number of popups closed.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn close_all_popups(&self) -> Result<usize, NavigationError> {
        self.transact(NavigationOp::CloseAllPopups, |stack, events| {
            let before = stack.len();
            let mut outcome = Ok(());
            for _ in 0..stack.tail_popup_run() {
                if let Err(err) = self.remove_tail(stack, events) {
                    outcome = Err(err);
                    break;
                }
            }

            let closed = before - stack.len();
            if closed > 0 {
                events.push(NavigationEvent::PopupsClosed { count: closed });
            }
            self.settle(stack, outcome).map(|()| closed)
        })
    }

    /// Pops every context above `target`, which becomes current.
    ///
    /// Returns the number of contexts removed; an id that is not on the stack
    /// removes nothing.
    #[tracing::instrument(level = "debug", skip(self, target), fields(context = %target))]
    pub fn pop_to(&self, target: ContextId) -> Result<usize, NavigationError> {
        self.transact(NavigationOp::PopTo, |stack, events| {
            let Some(index) = stack.position(target) else {
                tracing::debug!("context not on stack");
                return Ok(0);
            };

            let before = stack.len();
            let mut outcome = Ok(());
            while stack.len() > index + 1 {
                if let Err(err) = self.remove_tail(stack, events) {
                    outcome = Err(err);
                    break;
                }
            }

            let popped = before - stack.len();
            self.settle(stack, outcome).map(|()| popped)
        })
    }

    /// The last published state of the stack.
    pub fn snapshot(&self) -> Arc<StackSnapshot> {
        Arc::clone(
            &self
                .published
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    pub fn stack_count(&self) -> usize {
        self.snapshot().stack_count()
    }

    pub fn screen_count(&self) -> usize {
        self.snapshot().screen_count()
    }

    pub fn popup_count(&self) -> usize {
        self.snapshot().popup_count()
    }

    pub fn current_screen(&self) -> Option<ContextInfo> {
        self.snapshot().current_screen()
    }

    pub fn current_context(&self) -> Option<ContextInfo> {
        self.snapshot().current_context()
    }

    pub fn has_popup_on_top(&self) -> bool {
        self.snapshot().has_popup_on_top()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_transitioning()
    }

    pub fn transition_state(&self) -> TransitionState {
        self.transition.current()
    }

    /// `Kind:WidgetTypeId` tokens in stack order, e.g.
    /// `Screen:Title > Screen:Lobby > Popup:GachaResult`.
    pub fn stack_debug_string(&self) -> String {
        self.snapshot().debug_string()
    }

    pub fn registered_widgets(&self) -> Vec<WidgetTypeId> {
        self.registry.ids().collect()
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Receives a [`NavigationEvent`] for every completed or rejected operation.
    pub fn subscribe(&self) -> Receiver<NavigationEvent> {
        self.events.subscribe()
    }

    /// Runs `f` against the live widget of context `id`.
    ///
    /// Returns `None` when the context is gone, the widget is not a `W`, or a
    /// transition currently owns the stack. Never waits.
    ///
    /// `f` runs while holding the transition lock as [`NavigationOp::Inspect`],
    /// so navigating from inside it is rejected with
    /// [`NavigationError::TransitionInProgress`].
    pub fn inspect_widget<W, R>(&self, id: ContextId, f: impl FnOnce(&W) -> R) -> Option<R>
    where
        W: Widget,
    {
        let _guard = self.transition.try_begin(NavigationOp::Inspect).ok()?;
        let stack = self.lock_stack();
        let index = stack.position(id)?;
        stack.get(index)?.view().downcast_ref::<W>().map(f)
    }

    fn begin(&self, op: NavigationOp) -> Result<TransitionGuard<'_>, NavigationError> {
        self.transition.try_begin(op).map_err(|running| {
            tracing::warn!(op = %op, running = %running, "navigation rejected during transition");
            self.events
                .send_all(vec![NavigationEvent::Rejected { op, running }]);
            NavigationError::TransitionInProgress { op: running }
        })
    }

    fn lock_stack(&self) -> MutexGuard<'_, NavigationStack> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `body` inside a transition, then publishes and notifies.
    fn transact<T>(
        &self,
        op: NavigationOp,
        body: impl FnOnce(&mut NavigationStack, &mut Vec<NavigationEvent>) -> Result<T, NavigationError>,
    ) -> Result<T, NavigationError> {
        let mut events = Vec::new();
        let result = {
            let _guard = self.begin(op)?;
            let mut stack = self.lock_stack();
            let result = body(&mut *stack, &mut events);
            self.publish(&stack);
            if let Err(err) = &result {
                tracing::warn!(op = %op, error = %err, stack = %self.stack_debug_string(), "navigation failed");
            }
            result
        };
        self.events.send_all(events);
        result
    }

    fn publish(&self, stack: &NavigationStack) {
        let snapshot = Arc::new(StackSnapshot::new(stack.infos()));
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    fn push(
        &self,
        kind: ContextKind,
        widget_type: WidgetTypeId,
        args: &WidgetArgs,
    ) -> Result<ContextInfo, NavigationError> {
        let op = match kind {
            ContextKind::Screen => NavigationOp::PushScreen,
            ContextKind::Popup => NavigationOp::PushPopup,
        };
        self.transact(op, |stack, events| {
            let info = self.push_locked(stack, kind, widget_type, args)?;
            tracing::info!(
                context = %info.id,
                token = %info.token(),
                depth = stack.len(),
                "pushed context"
            );
            events.push(NavigationEvent::Pushed(info));
            Ok(info)
        })
    }

    fn push_locked(
        &self,
        stack: &mut NavigationStack,
        kind: ContextKind,
        widget_type: WidgetTypeId,
        args: &WidgetArgs,
    ) -> Result<ContextInfo, NavigationError> {
        let max_depth = self.settings.max_depth;
        if max_depth > 0 && stack.len() >= max_depth {
            return Err(NavigationError::StackFull { max_depth });
        }

        let view = self
            .registry
            .instantiate(widget_type)
            .ok_or(NavigationError::UnknownWidget(widget_type))?;
        let mut context = NavigationContext::new(kind, widget_type, view);

        let hidden = match kind {
            ContextKind::Screen => self.conceal_layer(stack)?,
            ContextKind::Popup => Vec::new(),
        };

        tracing::debug!(context = %context.id(), widget = %widget_type, "initializing widget");
        if let Err(source) = context.initialize(args) {
            self.restore(stack, &hidden);
            return Err(NavigationError::lifecycle(
                widget_type,
                LifecyclePhase::Initialize,
                source,
            ));
        }

        if let Err(source) = context.show() {
            if let Err(err) = context.release() {
                tracing::warn!(widget = %widget_type, error = %err, "can't release widget after failed show");
            }
            self.restore(stack, &hidden);
            return Err(NavigationError::lifecycle(
                widget_type,
                LifecyclePhase::Show,
                source,
            ));
        }

        let info = context.info();
        stack.push(context);
        Ok(info)
    }

    /// Hides the visible layer tail first.
    ///
    /// Returns the indices actually hidden. On failure the contexts hidden so
    /// far are shown again.
    fn conceal_layer(&self, stack: &mut NavigationStack) -> Result<Vec<usize>, NavigationError> {
        let start = stack.visible_layer_start();
        let mut hidden = Vec::new();
        for index in (start..stack.len()).rev() {
            let Some(context) = stack.get_mut(index) else {
                continue;
            };
            match context.conceal() {
                Ok(true) => hidden.push(index),
                Ok(false) => {}
                Err(source) => {
                    let widget = context.widget_type();
                    self.restore(stack, &hidden);
                    return Err(NavigationError::lifecycle(
                        widget,
                        LifecyclePhase::Hide,
                        source,
                    ));
                }
            }
        }
        Ok(hidden)
    }

    /// Best-effort re-show of contexts hidden by a push that failed.
    fn restore(&self, stack: &mut NavigationStack, hidden: &[usize]) {
        for &index in hidden.iter().rev() {
            if let Some(context) = stack.get_mut(index) {
                if let Err(err) = context.reveal() {
                    tracing::warn!(
                        widget = %context.widget_type(),
                        error = %err,
                        "can't restore widget after failed push"
                    );
                }
            }
        }
    }

    /// Hides, removes and releases the tail context.
    ///
    /// A failed `hide` leaves the stack untouched. After that the removal is
    /// committed even if `release` fails.
    fn remove_tail(
        &self,
        stack: &mut NavigationStack,
        events: &mut Vec<NavigationEvent>,
    ) -> Result<Option<ContextInfo>, NavigationError> {
        let Some(tail) = stack.tail_mut() else {
            return Ok(None);
        };
        let widget = tail.widget_type();
        if let Err(source) = tail.dismiss() {
            return Err(NavigationError::lifecycle(
                widget,
                LifecyclePhase::Hide,
                source,
            ));
        }

        let Some(context) = stack.pop() else {
            return Ok(None);
        };
        let info = context.info();
        tracing::info!(
            context = %info.id,
            token = %info.token(),
            depth = stack.len(),
            "popped context"
        );
        events.push(NavigationEvent::Popped(info));

        context
            .release()
            .map_err(|source| NavigationError::lifecycle(widget, LifecyclePhase::Release, source))?;
        Ok(Some(info))
    }

    /// Shows whatever became the visible layer after removals.
    fn reveal_layer(&self, stack: &mut NavigationStack) -> Result<(), NavigationError> {
        for context in stack.visible_layer_mut() {
            let widget = context.widget_type();
            context
                .reveal()
                .map_err(|source| NavigationError::lifecycle(widget, LifecyclePhase::Show, source))?;
        }
        Ok(())
    }

    /// Reveals the new visible layer and merges its outcome with `outcome`.
    ///
    /// The first error wins.
    fn settle<T>(
        &self,
        stack: &mut NavigationStack,
        outcome: Result<T, NavigationError>,
    ) -> Result<T, NavigationError> {
        let revealed = self.reveal_layer(stack);
        match (outcome, revealed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(reveal_err)) => {
                tracing::warn!(error = %reveal_err, "can't reveal visible layer");
                Err(err)
            }
        }
    }
}

impl fmt::Debug for NavigationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationEngine")
            .field("stack", &self.stack_debug_string())
            .field("state", &self.transition_state())
            .field("registry", &self.registry)
            .finish()
    }
}
