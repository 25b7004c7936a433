//! Outbound render pipeline with equality-based suppression

use super::EngineInner;
use crate::component::ComponentId;
use crate::control::ControlId;
use tracing::{trace, warn};

impl EngineInner {
    /// Render one control: ask its active component for output, encode, and
    /// send unless the encoded message equals the last one physically sent.
    ///
    /// Suppression is by value equality, not by time. `force` bypasses both
    /// the equality check and a component's render deferral.
    pub(crate) fn render_control(&mut self, id: ControlId, force: bool) {
        let Some(component) = self.controls[id.0].active else {
            return; // nothing to ask for output
        };
        let entry = &self.components[component.0];
        if entry.component.defer_render() && !force {
            // Deferred renders leave the last-sent record untouched so the
            // eventual resync still sees the real hardware state.
            trace!(control = %self.controls[id.0].name, "render deferred");
            return;
        }
        let view = self.controls[id.0].view(id);
        let Some(output) = entry.component.get_output(&view) else {
            return; // input-only component, render is a no-op
        };
        let Some(message) = self.controls[id.0].encode(&output) else {
            return;
        };
        let control = &mut self.controls[id.0];
        if !force && control.last_sent.as_ref() == Some(&message) {
            trace!(control = %control.name, "send suppressed, value unchanged");
            return;
        }
        control.last_sent = Some(message.clone());
        trace!(control = %control.name, %message, "→ send");
        if let Err(e) = self.transport.send(&message) {
            warn!(control = %self.controls[id.0].name, "transport send failed: {:#}", e);
        }
    }

    /// Render every control bound to `component` whose active slot points
    /// back at it. Ownership is checked by identity here, at render time,
    /// never cached.
    pub(crate) fn render_component(&mut self, component: ComponentId, force: bool) {
        let Some(entry) = self.components.get(component.0) else {
            return;
        };
        let bound = entry.controls.clone();
        for control in bound {
            if self.controls.get(control.0).map(|c| c.active) == Some(Some(component)) {
                self.render_control(control, force);
            }
        }
    }

    /// Re-render the whole surface.
    pub(crate) fn render_all(&mut self, force: bool) {
        for index in 0..self.controls.len() {
            self.render_control(ControlId(index), force);
        }
    }
}
