//! Toggle component - press-to-flip boolean behavior
//!
//! Flips its boolean state on every press edge, renders it as LED output on
//! its bound controls, and keeps it in sync with a remote observable:
//! presses issue a command toward the application, application feedback
//! lands through `on_remote_value`.

use super::{Component, ComponentCtx, ControlView};
use crate::state::{Color, ControlState, StatePatch};
use tracing::trace;

/// A latching on/off behavior.
pub struct Toggle {
    on: bool,
    on_color: Option<Color>,
    off_color: Option<Color>,
    pressed: bool,
}

impl Toggle {
    pub fn new() -> Self {
        Self {
            on: false,
            on_color: None,
            off_color: None,
            pressed: false,
        }
    }

    /// LED colors for the two states.
    pub fn with_colors(on_color: Color, off_color: Color) -> Self {
        Self {
            on: false,
            on_color: Some(on_color),
            off_color: Some(off_color),
            pressed: false,
        }
    }

    /// Current logical state.
    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Toggle {
    fn on_input(&mut self, control: &ControlView, input: StatePatch, ctx: &mut ComponentCtx<'_>) {
        let Some(value) = input.value else {
            return;
        };
        let pressed = value > control.min_value;
        if pressed == self.pressed {
            return;
        }
        self.pressed = pressed;
        if pressed {
            self.on = !self.on;
            trace!(on = self.on, "toggle flipped");
            ctx.send_remote(if self.on { 1.0 } else { 0.0 });
        }
    }

    fn get_output(&self, control: &ControlView) -> Option<ControlState> {
        Some(ControlState {
            value: if self.on { control.max_value } else { control.min_value },
            color: if self.on { self.on_color } else { self.off_color },
            flashing: false,
        })
    }

    fn on_remote_value(&mut self, value: f64, _ctx: &mut ComponentCtx<'_>) {
        self.on = value >= 0.5;
    }

    fn on_deactivate(&mut self, _ctx: &mut ComponentCtx<'_>) {
        self.pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentId;
    use crate::config::EngineConfig;
    use crate::control::ControlId;
    use crate::timer::TimerService;

    fn view(min: u8, max: u8) -> ControlView {
        ControlView { id: ControlId(0), port: 0, min_value: min, max_value: max }
    }

    #[test]
    fn test_press_edges_flip_releases_do_not() {
        let timers = TimerService::new();
        let mut outbox = Vec::new();
        let mut ctx = ComponentCtx {
            component: ComponentId(0),
            config: EngineConfig::default(),
            timers: &timers,
            engine: std::sync::Weak::new(),
            outbox: &mut outbox,
        };

        let mut toggle = Toggle::new();
        toggle.on_input(&view(0, 127), StatePatch::with_value(127), &mut ctx);
        assert!(toggle.is_on());
        toggle.on_input(&view(0, 127), StatePatch::with_value(0), &mut ctx);
        assert!(toggle.is_on());
        toggle.on_input(&view(0, 127), StatePatch::with_value(127), &mut ctx);
        assert!(!toggle.is_on());

        // Each press queued a remote command mirroring the new state.
        assert_eq!(outbox, vec![(ComponentId(0), 1.0), (ComponentId(0), 0.0)]);
    }

    #[test]
    fn test_output_tracks_state_and_range() {
        let toggle = {
            let timers = TimerService::new();
            let mut outbox = Vec::new();
            let mut ctx = ComponentCtx {
                component: ComponentId(0),
                config: EngineConfig::default(),
                timers: &timers,
                engine: std::sync::Weak::new(),
                outbox: &mut outbox,
            };
            let mut t = Toggle::with_colors(Color::new(0, 255, 0), Color::new(16, 16, 16));
            t.on_input(&view(10, 100), StatePatch::with_value(99), &mut ctx);
            t
        };

        let output = toggle.get_output(&view(10, 100)).unwrap();
        assert_eq!(output.value, 100);
        assert_eq!(output.color, Some(Color::new(0, 255, 0)));
    }

    #[test]
    fn test_remote_value_overrides_state() {
        let timers = TimerService::new();
        let mut outbox = Vec::new();
        let mut ctx = ComponentCtx {
            component: ComponentId(0),
            config: EngineConfig::default(),
            timers: &timers,
            engine: std::sync::Weak::new(),
            outbox: &mut outbox,
        };

        let mut toggle = Toggle::new();
        toggle.on_remote_value(1.0, &mut ctx);
        assert!(toggle.is_on());
        toggle.on_remote_value(0.0, &mut ctx);
        assert!(!toggle.is_on());
    }
}
