//! Activation transitions and mode switching
//!
//! A control's `active` slot is the only runtime-mutable relation in the
//! graph. The transition ordering below guarantees a component never
//! receives input after its deactivation hook and never renders before its
//! activation hook.

use super::EngineInner;
use crate::component::ComponentId;
use crate::control::ControlId;
use crate::timer::TimerService;
use tracing::debug;

impl EngineInner {
    /// Install (or clear) a control's active component.
    ///
    /// No-op when `next` is already active on the control. Otherwise:
    /// (1) revoke the previous component's timers and run its deactivation
    /// hook, (2) install the new component, (3) run `on_init` once per
    /// component lifetime, then the activation hook, (4) reset the
    /// control's state to its initial snapshot, (5) force a render.
    pub(crate) fn set_active(
        &mut self,
        control: ControlId,
        next: Option<ComponentId>,
        timers: &TimerService,
    ) {
        let Some(slot) = self.controls.get(control.0) else {
            return;
        };
        let current = slot.active;
        if current == next {
            return; // idempotent assignment
        }

        if let Some(previous) = current {
            // Revoke timers before the hook: nothing may fire into the
            // component once deactivation has begun.
            timers.cancel_component(previous);
            self.with_component_ctx(previous, timers, |c, ctx| c.on_deactivate(ctx));
            self.controls[control.0].active = None;
            debug!(
                control = %self.controls[control.0].name,
                component = previous.0,
                "component deactivated"
            );
        }

        let Some(next_id) = next else {
            return;
        };

        self.controls[control.0].active = Some(next_id);

        if !self.components[next_id.0].initialized {
            self.components[next_id.0].initialized = true;
            self.with_component_ctx(next_id, timers, |c, ctx| c.on_init(ctx));
        }
        self.with_component_ctx(next_id, timers, |c, ctx| c.on_activate(ctx));

        self.controls[control.0].reset_to_initial();
        debug!(
            control = %self.controls[control.0].name,
            component = next_id.0,
            "component activated"
        );
        self.render_control(control, true);
    }

    /// Switch the surface to `mode`: deactivate components of other modes,
    /// then install every component tagged with `mode` on its bound
    /// controls, then emit the mode event.
    pub(crate) fn activate_mode(&mut self, mode: &str, timers: &TimerService) {
        debug!(mode, "activating mode");

        for index in 0..self.components.len() {
            if self.components[index].mode == mode {
                continue;
            }
            let component = ComponentId(index);
            let bound = self.components[index].controls.clone();
            for control in bound {
                if self.controls.get(control.0).map(|c| c.active) == Some(Some(component)) {
                    self.set_active(control, None, timers);
                }
            }
        }

        for index in 0..self.components.len() {
            if self.components[index].mode != mode {
                continue;
            }
            let component = ComponentId(index);
            let bound = self.components[index].controls.clone();
            for control in bound {
                self.set_active(control, Some(component), timers);
            }
        }

        self.events.mode_activated.emit(&mode.to_string());
    }
}
