//! Engine module - Core orchestration of message dispatch and rendering
//!
//! The engine owns the control/component graph and is the explicit context
//! object for everything that would otherwise be ambient state:
//! - Control registration and pattern-based inbound dispatch
//! - Component registration, activation transitions, and mode switching
//! - The outbound render pipeline with equality-based suppression
//! - Timer scheduling and revocation
//! - Lifecycle events (init, mode activation)
//!
//! The state graph lives behind one mutex: message dispatch, timer
//! callbacks, and remote-value deliveries each take the lock and run to
//! completion, so a timer firing is indistinguishable from an externally
//! delivered message.

mod activation;
mod dispatch;
mod render;


use crate::component::{Component, ComponentId};
use crate::config::EngineConfig;
use crate::control::{Control, ControlId, ControlSpec};
use crate::event::{Event, EventError};
use crate::midi::{ChannelMessage, Message, SysExMessage};
use crate::pattern::PatternError;
use crate::state::{ControlState, StatePatch};
use crate::timer::{TimerKey, TimerService};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace};

/// A registered component plus its binding metadata.
pub(crate) struct ComponentEntry {
    pub(crate) component: Box<dyn Component>,
    /// Mode tag scoping when this component is eligible to become active.
    pub(crate) mode: String,
    /// Controls this component drives (it renders only through those whose
    /// active slot currently points back at it).
    pub(crate) controls: Vec<ControlId>,
    pub(crate) remote: Option<Arc<dyn crate::transport::RemoteValue>>,
    /// Whether `on_init` has run.
    pub(crate) initialized: bool,
}

/// Lifecycle notifications emitted by the engine.
pub(crate) struct LifecycleEvents {
    pub(crate) init: Event<()>,
    pub(crate) mode_activated: Event<String>,
}

/// Engine internals; only ever touched with the engine lock held.
pub(crate) struct EngineInner {
    pub(crate) config: EngineConfig,
    pub(crate) transport: Arc<dyn crate::transport::Transport>,
    pub(crate) controls: Vec<Control>,
    pub(crate) components: Vec<ComponentEntry>,
    pub(crate) events: LifecycleEvents,
    /// Remote commands queued during dispatch; issued after the lock drops.
    pub(crate) pending_remote: Vec<(ComponentId, f64)>,
    pub(crate) self_ref: Weak<Mutex<EngineInner>>,
    pub(crate) initialized: bool,
}

impl EngineInner {
    /// Run a component hook with a fresh context.
    pub(crate) fn with_component_ctx(
        &mut self,
        id: ComponentId,
        timers: &TimerService,
        f: impl FnOnce(&mut dyn Component, &mut crate::component::ComponentCtx<'_>),
    ) {
        let config = self.config;
        let engine = self.self_ref.clone();
        let Some(entry) = self.components.get_mut(id.0) else {
            return;
        };
        let mut ctx = crate::component::ComponentCtx {
            component: id,
            config,
            timers,
            engine,
            outbox: &mut self.pending_remote,
        };
        f(entry.component.as_mut(), &mut ctx);
    }

    /// Drain queued remote commands, resolving each to its connected
    /// observable. Commands from components without a connected remote are
    /// dropped.
    pub(crate) fn take_outbox(&mut self) -> Vec<(Arc<dyn crate::transport::RemoteValue>, f64)> {
        std::mem::take(&mut self.pending_remote)
            .into_iter()
            .filter_map(|(id, value)| {
                let remote = self.components.get(id.0).and_then(|e| e.remote.clone());
                if remote.is_none() {
                    trace!(component = id.0, "remote command dropped, no observable connected");
                }
                remote.map(|r| (r, value))
            })
            .collect()
    }
}

/// Entry point for expired timer tasks.
///
/// The epoch is validated *after* taking the engine lock: a timer cancelled
/// or replaced while this task was in flight is revoked here and never
/// observes the component.
pub(crate) fn fire_timer(
    engine: Weak<Mutex<EngineInner>>,
    timers: &TimerService,
    key: TimerKey,
    epoch: u64,
) {
    let Some(inner_arc) = engine.upgrade() else {
        return;
    };
    let mut inner = inner_arc.lock();
    if !timers.take_if_current(key, epoch) {
        trace!(?key, "stale timer discarded");
        return;
    }
    inner.handle_timer(key, timers);
    let outbox = inner.take_outbox();
    drop(inner);
    for (remote, value) in outbox {
        remote.set(value);
    }
}

/// The control-binding and gesture-dispatch engine.
///
/// Cloning is cheap; clones share the same graph. All methods may be called
/// from any thread, but dispatch itself is serialized and runs each inbound
/// message, timer callback, or remote delivery to completion before the
/// next one is processed. Timer scheduling requires a tokio runtime.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Mutex<EngineInner>>,
    timers: TimerService,
}

impl Engine {
    /// Create an engine with the given timing configuration and transport.
    pub fn new(config: EngineConfig, transport: Arc<dyn crate::transport::Transport>) -> Self {
        let inner = Arc::new(Mutex::new(EngineInner {
            config,
            transport,
            controls: Vec::new(),
            components: Vec::new(),
            events: LifecycleEvents {
                init: Event::new(),
                mode_activated: Event::new(),
            },
            pending_remote: Vec::new(),
            self_ref: Weak::new(),
            initialized: false,
        }));
        inner.lock().self_ref = Arc::downgrade(&inner);
        Self {
            inner,
            timers: TimerService::new(),
        }
    }

    /// Lock, run, then deliver any remote commands queued during `f`.
    fn with_inner<R>(&self, f: impl FnOnce(&mut EngineInner, &TimerService) -> R) -> R {
        let mut inner = self.inner.lock();
        let result = f(&mut inner, &self.timers);
        let outbox = inner.take_outbox();
        drop(inner);
        for (remote, value) in outbox {
            remote.set(value);
        }
        result
    }

    /// Register a control. Malformed patterns fail here, at construction.
    pub fn add_control(&self, spec: ControlSpec) -> Result<ControlId, PatternError> {
        let control = Control::from_spec(spec)?;
        let mut inner = self.inner.lock();
        let id = ControlId(inner.controls.len());
        debug!(control = %control.name, patterns = control.patterns.len(), "control registered");
        inner.controls.push(control);
        Ok(id)
    }

    /// Register a component under a mode, bound to one or more controls.
    pub fn add_component(
        &self,
        component: impl Component + 'static,
        mode: impl Into<String>,
        controls: &[ControlId],
    ) -> ComponentId {
        let mut inner = self.inner.lock();
        let id = ComponentId(inner.components.len());
        inner.components.push(ComponentEntry {
            component: Box::new(component),
            mode: mode.into(),
            controls: controls.to_vec(),
            remote: None,
            initialized: false,
        });
        id
    }

    /// Dispatch an inbound message to every control whose listening set
    /// matches it. Non-matching traffic is a no-op, not an error.
    pub fn on_message(&self, message: &Message) {
        self.with_inner(|inner, timers| inner.dispatch_message(message, timers));
    }

    /// Parse raw wire bytes from a port and dispatch them. Unparseable
    /// bytes are logged and dropped.
    pub fn on_raw(&self, port: u8, bytes: &[u8]) {
        if bytes.first() == Some(&0xF0) {
            match SysExMessage::new(port, bytes.to_vec()) {
                Ok(message) => self.on_message(&message.into()),
                Err(e) => debug!("unparseable sysex from port {}: {}", port, e),
            }
        } else {
            match ChannelMessage::from_raw(port, bytes) {
                Ok(message) => self.on_message(&message.into()),
                Err(e) => debug!("unparseable MIDI from port {}: {}", port, e),
            }
        }
    }

    /// Merge a partial state into a control, optionally propagating to its
    /// active component and re-rendering (the inbound `setState` leg).
    pub fn set_state(&self, control: ControlId, patch: StatePatch, propagate: bool) {
        self.with_inner(|inner, timers| inner.apply_patch(control, patch, propagate, timers));
    }

    /// Install (or clear) a control's active component. Idempotent when the
    /// component is already active on that control.
    pub fn set_active_component(&self, control: ControlId, component: Option<ComponentId>) {
        self.with_inner(|inner, timers| inner.set_active(control, component, timers));
    }

    /// Activate every component tagged with `mode` on its bound controls and
    /// deactivate components of other modes, then emit the mode event.
    pub fn activate_mode(&self, mode: &str) {
        self.with_inner(|inner, timers| inner.activate_mode(mode, timers));
    }

    /// Re-render the whole surface, bypassing suppression when `force`.
    pub fn render_all(&self, force: bool) {
        self.with_inner(|inner, _| inner.render_all(force));
    }

    /// Connect a component to a remote observable. The observable's current
    /// and future values are routed into `on_remote_value`; commands the
    /// component queues are issued back through `set`.
    pub fn connect_remote(
        &self,
        component: ComponentId,
        remote: Arc<dyn crate::transport::RemoteValue>,
    ) {
        {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.components.get_mut(component.0) else {
                return;
            };
            entry.remote = Some(remote.clone());
        }
        // Subscribe outside the lock so observables that deliver their
        // current value synchronously land through the normal path.
        let engine = Arc::downgrade(&self.inner);
        let timers = self.timers.clone();
        remote.subscribe(Box::new(move |value| {
            let Some(inner_arc) = engine.upgrade() else {
                return;
            };
            let mut inner = inner_arc.lock();
            inner.handle_remote(component, value, &timers);
            let outbox = inner.take_outbox();
            drop(inner);
            for (remote, value) in outbox {
                remote.set(value);
            }
        }));
    }

    /// Feed a remote value to a component directly (observable-less setups
    /// and tests).
    pub fn push_remote(&self, component: ComponentId, value: f64) {
        self.with_inner(|inner, timers| inner.handle_remote(component, value, timers));
    }

    /// Mark the engine initialized and emit the init event (once).
    pub fn init(&self) {
        let mut inner = self.inner.lock();
        if inner.initialized {
            return;
        }
        inner.initialized = true;
        info!("engine initialized");
        inner.events.init.emit(&());
    }

    /// Subscribe to the one-shot init event.
    pub fn subscribe_init(
        &self,
        key: impl Into<String>,
        callback: impl Fn(&()) + Send + 'static,
    ) -> Result<(), EventError> {
        self.inner.lock().events.init.subscribe(key, callback)
    }

    /// Subscribe to mode activations.
    pub fn subscribe_mode_activated(
        &self,
        key: impl Into<String>,
        callback: impl Fn(&String) + Send + 'static,
    ) -> Result<(), EventError> {
        self.inner.lock().events.mode_activated.subscribe(key, callback)
    }

    /// Current logical state of a control.
    pub fn control_state(&self, control: ControlId) -> Option<ControlState> {
        self.inner.lock().controls.get(control.0).map(|c| c.state)
    }

    /// The component currently active on a control, if any.
    pub fn active_component(&self, control: ControlId) -> Option<ComponentId> {
        self.inner.lock().controls.get(control.0).and_then(|c| c.active)
    }
}
