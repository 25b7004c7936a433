//! Engine configuration
//!
//! Gesture timing constants with serde defaults, so embedding applications
//! can deserialize the engine section straight out of their own config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing configuration for the gesture and render machinery.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a control must stay pressed before a long-press fires.
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,

    /// Window after a press/release edge during which a second edge of the
    /// same polarity counts as a double gesture.
    #[serde(default = "default_double_gesture_ms")]
    pub double_gesture_ms: u64,

    /// How long after the last analog input a control is considered
    /// "recently touched" and outbound render stays deferred.
    #[serde(default = "default_touch_debounce_ms")]
    pub touch_debounce_ms: u64,
}

fn default_long_press_ms() -> u64 {
    350
}

fn default_double_gesture_ms() -> u64 {
    450
}

fn default_touch_debounce_ms() -> u64 {
    350
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            long_press_ms: default_long_press_ms(),
            double_gesture_ms: default_double_gesture_ms(),
            touch_debounce_ms: default_touch_debounce_ms(),
        }
    }
}

impl EngineConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn double_gesture(&self) -> Duration {
        Duration::from_millis(self.double_gesture_ms)
    }

    pub fn touch_debounce(&self) -> Duration {
        Duration::from_millis(self.touch_debounce_ms)
    }
}
