//! Inbound message dispatch and state routing

use super::EngineInner;
use crate::component::ComponentId;
use crate::control::ControlId;
use crate::midi::Message;
use crate::state::StatePatch;
use crate::timer::{TimerKey, TimerService};
use tracing::trace;

impl EngineInner {
    /// Match a message against every control's listening set and apply the
    /// decoded patch to each match.
    ///
    /// Decode → route-to-component → component-state-update → render runs
    /// to completion here before the caller's next message is processed.
    pub(crate) fn dispatch_message(&mut self, message: &Message, timers: &TimerService) {
        for index in 0..self.controls.len() {
            let Some(patch) = self.controls[index].decode(message) else {
                continue;
            };
            trace!(control = %self.controls[index].name, %message, "matched");
            self.apply_patch(ControlId(index), patch, true, timers);
        }
    }

    /// Merge a patch into a control and, when propagating, forward it to
    /// the control's active component and re-render.
    pub(crate) fn apply_patch(
        &mut self,
        id: ControlId,
        patch: StatePatch,
        propagate: bool,
        timers: &TimerService,
    ) {
        let Some(control) = self.controls.get_mut(id.0) else {
            return;
        };
        control.merge_state(&patch);
        if !propagate {
            return;
        }
        let Some(component) = self.controls[id.0].active else {
            // No active component: nothing to route to, render is skipped.
            return;
        };
        let view = self.controls[id.0].view(id);
        self.with_component_ctx(component, timers, |c, ctx| c.on_input(&view, patch, ctx));
        self.render_component(component, false);
    }

    /// A validated timer fired for a component.
    pub(crate) fn handle_timer(&mut self, key: TimerKey, timers: &TimerService) {
        if self.components.get(key.component.0).is_none() {
            return;
        }
        self.with_component_ctx(key.component, timers, |c, ctx| c.on_timer(key.purpose, ctx));
        self.render_component(key.component, false);
    }

    /// A value arrived from a component's remote observable.
    pub(crate) fn handle_remote(&mut self, id: ComponentId, value: f64, timers: &TimerService) {
        if self.components.get(id.0).is_none() {
            return;
        }
        self.with_component_ctx(id, timers, |c, ctx| c.on_remote_value(value, ctx));
        self.render_component(id, false);
    }
}
