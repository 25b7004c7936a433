//! Range component - debounced continuous control
//!
//! An absolute fader/knob behavior that defers outbound render while the
//! user is actively moving the control: every input starts or refreshes a
//! "recently touched" timer, and while that timer is pending the render
//! pipeline skips sends for this component so the hardware's own feedback
//! is not fought. Once the timer lapses with no further input, rendering
//! resumes and the normal equality diff resynchronizes the surface.

use super::{Component, ComponentCtx, ControlView};
use crate::midi::convert;
use crate::state::{ControlState, StatePatch};
use crate::timer::TimerPurpose;
use tracing::trace;

/// An absolute continuous-value behavior synced with a remote observable.
pub struct Range {
    value: u8,
    touched: bool,
}

impl Range {
    pub fn new() -> Self {
        Self { value: 0, touched: false }
    }

    /// Current 7-bit value.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Whether the control is inside its "recently touched" window.
    pub fn is_touched(&self) -> bool {
        self.touched
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Range {
    fn on_input(&mut self, _control: &ControlView, input: StatePatch, ctx: &mut ComponentCtx<'_>) {
        let Some(value) = input.value else {
            return;
        };
        self.value = value;
        self.touched = true;
        // Restarted on every input, even while already suppressing.
        ctx.schedule(TimerPurpose::InputDebounce, ctx.config.touch_debounce());
        ctx.send_remote(convert::to_normalized(value));
    }

    fn get_output(&self, _control: &ControlView) -> Option<ControlState> {
        Some(ControlState::with_value(self.value))
    }

    fn on_timer(&mut self, purpose: TimerPurpose, _ctx: &mut ComponentCtx<'_>) {
        if purpose == TimerPurpose::InputDebounce {
            trace!("touch window lapsed, rendering resumes");
            self.touched = false;
        }
    }

    fn on_remote_value(&mut self, value: f64, _ctx: &mut ComponentCtx<'_>) {
        self.value = convert::from_normalized(value);
    }

    fn defer_render(&self) -> bool {
        self.touched
    }

    fn on_deactivate(&mut self, _ctx: &mut ComponentCtx<'_>) {
        self.touched = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentId;
    use crate::config::EngineConfig;
    use crate::control::ControlId;
    use crate::timer::TimerService;

    fn view() -> ControlView {
        ControlView { id: ControlId(0), port: 0, min_value: 0, max_value: 127 }
    }

    #[tokio::test]
    async fn input_marks_touched_and_forwards_normalized_value() {
        let timers = TimerService::new();
        let mut outbox = Vec::new();
        let mut ctx = ComponentCtx {
            component: ComponentId(0),
            config: EngineConfig::default(),
            timers: &timers,
            engine: std::sync::Weak::new(),
            outbox: &mut outbox,
        };

        let mut range = Range::new();
        assert!(!range.defer_render());

        range.on_input(&view(), StatePatch::with_value(127), &mut ctx);
        assert_eq!(range.value(), 127);
        assert!(range.defer_render());
        assert_eq!(outbox, vec![(ComponentId(0), 1.0)]);
    }

    #[tokio::test]
    async fn touch_window_lapse_resumes_rendering() {
        let timers = TimerService::new();
        let mut outbox = Vec::new();
        let mut ctx = ComponentCtx {
            component: ComponentId(0),
            config: EngineConfig::default(),
            timers: &timers,
            engine: std::sync::Weak::new(),
            outbox: &mut outbox,
        };

        let mut range = Range::new();
        range.on_input(&view(), StatePatch::with_value(64), &mut ctx);
        assert!(range.is_touched());

        range.on_timer(TimerPurpose::InputDebounce, &mut ctx);
        assert!(!range.is_touched());
        assert!(range.get_output(&view()).unwrap().value == 64);
    }

    #[tokio::test]
    async fn remote_value_updates_without_touching() {
        let timers = TimerService::new();
        let mut outbox = Vec::new();
        let mut ctx = ComponentCtx {
            component: ComponentId(0),
            config: EngineConfig::default(),
            timers: &timers,
            engine: std::sync::Weak::new(),
            outbox: &mut outbox,
        };

        let mut range = Range::new();
        range.on_remote_value(0.5, &mut ctx);
        assert_eq!(range.value(), 64);
        assert!(!range.is_touched());
        assert!(outbox.is_empty());
    }
}
