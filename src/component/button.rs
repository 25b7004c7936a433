//! Button gesture state machine
//!
//! Turns a boolean (or thresholded analog) input stream into press /
//! release / long-press / double-press / double-release callbacks using two
//! cooperating timer windows.
//!
//! The pressed boolean is `raw value > control.min_value` (strict): the
//! minimum value is always "released" and any strictly greater value counts
//! as "pressed", which matters for controls with continuous input ranges.

use super::{Component, ComponentCtx, ControlView};
use crate::state::StatePatch;
use crate::timer::TimerPurpose;
use tracing::trace;

/// Gesture callbacks. Every hook defaults to a no-op so handlers implement
/// only the gestures they care about.
pub trait ButtonHandler: Send {
    fn on_press(&mut self, _ctx: &mut ComponentCtx<'_>) {}
    fn on_release(&mut self, _ctx: &mut ComponentCtx<'_>) {}
    fn on_long_press(&mut self, _ctx: &mut ComponentCtx<'_>) {}
    fn on_double_press(&mut self, _ctx: &mut ComponentCtx<'_>) {}
    fn on_double_release(&mut self, _ctx: &mut ComponentCtx<'_>) {}
}

/// Per-button timing overrides; unset fields fall back to the engine
/// configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonProps {
    pub long_press_ms: Option<u64>,
    pub double_gesture_ms: Option<u64>,
}

/// A button component: input-only by default (no output), gesture callbacks
/// through a [`ButtonHandler`].
pub struct Button {
    handler: Box<dyn ButtonHandler>,
    props: ButtonProps,
    pressed: bool,
    /// "Recent press" window is open: the next press edge is a double.
    press_window_open: bool,
    /// "Recent release" window is open: the next release edge is a double.
    release_window_open: bool,
}

impl Button {
    pub fn new(handler: impl ButtonHandler + 'static) -> Self {
        Self::with_props(handler, ButtonProps::default())
    }

    pub fn with_props(handler: impl ButtonHandler + 'static, props: ButtonProps) -> Self {
        Self {
            handler: Box::new(handler),
            props,
            pressed: false,
            press_window_open: false,
            release_window_open: false,
        }
    }

    fn long_press(&self, ctx: &ComponentCtx<'_>) -> std::time::Duration {
        std::time::Duration::from_millis(
            self.props.long_press_ms.unwrap_or(ctx.config.long_press_ms),
        )
    }

    fn double_gesture(&self, ctx: &ComponentCtx<'_>) -> std::time::Duration {
        std::time::Duration::from_millis(
            self.props
                .double_gesture_ms
                .unwrap_or(ctx.config.double_gesture_ms),
        )
    }

    fn press_edge(&mut self, ctx: &mut ComponentCtx<'_>) {
        if self.press_window_open {
            trace!("double press");
            self.handler.on_double_press(ctx);
        } else {
            trace!("press");
            self.handler.on_press(ctx);
        }
        // Cancel-and-restart: only the two most recent press edges within
        // the window count as a double.
        self.press_window_open = true;
        ctx.schedule(TimerPurpose::PressWindow, self.double_gesture(ctx));
        ctx.schedule(TimerPurpose::LongPress, self.long_press(ctx));
    }

    fn release_edge(&mut self, ctx: &mut ComponentCtx<'_>) {
        ctx.cancel(TimerPurpose::LongPress);
        if self.release_window_open {
            trace!("double release");
            self.handler.on_double_release(ctx);
        } else {
            trace!("release");
            self.handler.on_release(ctx);
        }
        self.release_window_open = true;
        ctx.schedule(TimerPurpose::ReleaseWindow, self.double_gesture(ctx));
    }
}

impl Component for Button {
    fn on_input(&mut self, control: &ControlView, input: StatePatch, ctx: &mut ComponentCtx<'_>) {
        let Some(value) = input.value else {
            return;
        };
        let pressed = value > control.min_value;
        if pressed == self.pressed {
            return; // not an edge
        }
        self.pressed = pressed;
        if pressed {
            self.press_edge(ctx);
        } else {
            self.release_edge(ctx);
        }
    }

    fn on_timer(&mut self, purpose: TimerPurpose, ctx: &mut ComponentCtx<'_>) {
        match purpose {
            TimerPurpose::LongPress => {
                if self.pressed {
                    trace!("long press");
                    self.handler.on_long_press(ctx);
                }
            }
            TimerPurpose::PressWindow => self.press_window_open = false,
            TimerPurpose::ReleaseWindow => self.release_window_open = false,
            TimerPurpose::InputDebounce => {}
        }
    }

    fn on_deactivate(&mut self, _ctx: &mut ComponentCtx<'_>) {
        // Gesture state is ephemeral; timers were already revoked by the
        // engine before this hook ran.
        self.pressed = false;
        self.press_window_open = false;
        self.release_window_open = false;
    }
}
