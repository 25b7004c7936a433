//! Component contract
//!
//! A component is a stateful logical behavior (toggle, button, fader) bound
//! to one or more controls under a named mode. The engine owns the
//! control/component graph; components interact with the outside world only
//! through the [`ComponentCtx`] handed to their hooks.
//!
//! The capability surface is explicit: input handling is required, output
//! and every lifecycle hook are optional with no-op defaults, so an
//! input-only component is a perfectly valid one.

mod button;
mod range;
mod toggle;

pub use button::{Button, ButtonHandler, ButtonProps};
pub use range::Range;
pub use toggle::Toggle;

use crate::config::EngineConfig;
use crate::control::ControlId;
use crate::state::{ControlState, StatePatch};
use crate::timer::{TimerKey, TimerPurpose, TimerService};
use parking_lot::Mutex;
use std::sync::Weak;
use std::time::Duration;

/// Opaque handle to a registered component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) usize);

/// A read-only view of the control asking for input routing or output,
/// letting one component drive several controls heterogeneously.
#[derive(Debug, Clone, Copy)]
pub struct ControlView {
    pub id: ControlId,
    pub port: u8,
    pub min_value: u8,
    pub max_value: u8,
}

/// Context passed into component hooks: timer scheduling and queued remote
/// commands. Remote commands are delivered after the current dispatch
/// completes, so observables are never re-entered from inside the engine.
pub struct ComponentCtx<'a> {
    pub(crate) component: ComponentId,
    pub(crate) config: EngineConfig,
    pub(crate) timers: &'a TimerService,
    pub(crate) engine: Weak<Mutex<crate::engine::EngineInner>>,
    pub(crate) outbox: &'a mut Vec<(ComponentId, f64)>,
}

impl ComponentCtx<'_> {
    /// The id of the component this context belongs to.
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Engine timing configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start (or restart) this component's timer of the given purpose.
    /// A pending timer with the same purpose is revoked first.
    pub fn schedule(&self, purpose: TimerPurpose, duration: Duration) {
        self.timers.schedule(
            self.engine.clone(),
            TimerKey { component: self.component, purpose },
            duration,
        );
    }

    /// Cancel this component's timer of the given purpose, if pending.
    pub fn cancel(&self, purpose: TimerPurpose) {
        self.timers.cancel(TimerKey { component: self.component, purpose });
    }

    /// Whether a timer of the given purpose is pending for this component.
    pub fn is_pending(&self, purpose: TimerPurpose) -> bool {
        self.timers.is_pending(TimerKey { component: self.component, purpose })
    }

    /// Queue a command for the component's connected remote value. The
    /// command is issued once the current dispatch has run to completion.
    pub fn send_remote(&mut self, value: f64) {
        self.outbox.push((self.component, value));
    }
}

/// A logical behavior bound to one or more controls.
///
/// All hooks run on the engine's dispatch path with run-to-completion
/// semantics; a timer callback is indistinguishable from an externally
/// delivered message.
pub trait Component: Send {
    /// Receive decoded input from a bound, active control.
    fn on_input(&mut self, control: &ControlView, input: StatePatch, ctx: &mut ComponentCtx<'_>);

    /// Compute the desired output for one bound control. `None` means this
    /// component has no output for that control and render is a no-op.
    fn get_output(&self, _control: &ControlView) -> Option<ControlState> {
        None
    }

    /// Invoked exactly once, the first time this component becomes active
    /// on any control, before any input is routed to it.
    fn on_init(&mut self, _ctx: &mut ComponentCtx<'_>) {}

    /// Invoked when this component becomes a control's active component.
    fn on_activate(&mut self, _ctx: &mut ComponentCtx<'_>) {}

    /// Invoked when this component is displaced from a control. All of the
    /// component's timers are revoked before this hook runs.
    fn on_deactivate(&mut self, _ctx: &mut ComponentCtx<'_>) {}

    /// A timer scheduled through [`ComponentCtx::schedule`] fired.
    fn on_timer(&mut self, _purpose: TimerPurpose, _ctx: &mut ComponentCtx<'_>) {}

    /// A value arrived from the component's connected remote observable.
    fn on_remote_value(&mut self, _value: f64, _ctx: &mut ComponentCtx<'_>) {}

    /// While true, outbound render for this component's controls is
    /// deferred (the last-sent record is left untouched).
    fn defer_render(&self) -> bool {
        false
    }
}
