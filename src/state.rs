//! Control state and the typed patch operation
//!
//! State updates throughout the engine use "patch" semantics: a partial
//! state is merged into the current one field-by-field at the top level.
//! Nested structures such as [`Color`] are replaced wholesale, never
//! deep-merged; consumers rely on replacing whole sub-objects.

use serde::{Deserialize, Serialize};

/// An RGB color for controls with color-capable LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The logical state of a control: its 7-bit value plus optional LED
/// attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// 7-bit control value (position, velocity, LED brightness).
    #[serde(default)]
    pub value: u8,
    /// LED color, where the hardware supports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// LED flashing flag.
    #[serde(default)]
    pub flashing: bool,
}

impl ControlState {
    pub fn with_value(value: u8) -> Self {
        Self { value, ..Self::default() }
    }

    /// Merge a patch into this state, returning true when anything changed.
    pub fn apply(&mut self, patch: &StatePatch) -> bool {
        let before = *self;
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(color) = patch.color {
            // Whole-object replacement: Some(None) clears the color.
            self.color = color;
        }
        if let Some(flashing) = patch.flashing {
            self.flashing = flashing;
        }
        *self != before
    }
}

/// A partial [`ControlState`]: the same shape with every field optional.
///
/// `color` is doubly optional so a patch can distinguish "leave the color
/// alone" (`None`) from "clear the color" (`Some(None)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashing: Option<bool>,
}

impl StatePatch {
    /// An empty patch; applying it never changes state.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_value(value: u8) -> Self {
        Self { value: Some(value), ..Self::default() }
    }

    pub fn value(mut self, value: u8) -> Self {
        self.value = Some(value);
        self
    }

    pub fn color(mut self, color: Option<Color>) -> Self {
        self.color = Some(color);
        self
    }

    pub fn flashing(mut self, flashing: bool) -> Self {
        self.flashing = Some(flashing);
        self
    }

    /// Whether the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<ControlState> for StatePatch {
    /// A full-state patch: every field present.
    fn from(state: ControlState) -> Self {
        Self {
            value: Some(state.value),
            color: Some(state.color),
            flashing: Some(state.flashing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_field_by_field() {
        let mut state = ControlState {
            value: 10,
            color: Some(Color::new(255, 0, 0)),
            flashing: false,
        };

        let changed = state.apply(&StatePatch::with_value(64));
        assert!(changed);
        assert_eq!(state.value, 64);
        // Untouched fields survive.
        assert_eq!(state.color, Some(Color::new(255, 0, 0)));
        assert!(!state.flashing);
    }

    #[test]
    fn test_color_replaced_wholesale() {
        let mut state = ControlState {
            value: 0,
            color: Some(Color::new(255, 0, 0)),
            flashing: false,
        };

        state.apply(&StatePatch::empty().color(Some(Color::new(0, 0, 255))));
        assert_eq!(state.color, Some(Color::new(0, 0, 255)));

        // Some(None) clears; None leaves alone.
        state.apply(&StatePatch::empty().color(None));
        assert_eq!(state.color, None);

        state.apply(&StatePatch::with_value(1));
        assert_eq!(state.color, None);
    }

    #[test]
    fn test_empty_patch_is_idempotent() {
        let mut state = ControlState::with_value(42);
        let snapshot = state;

        assert!(!state.apply(&StatePatch::empty()));
        assert!(!state.apply(&StatePatch::empty()));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_apply_reports_no_change_for_equal_values() {
        let mut state = ControlState::with_value(42);
        assert!(!state.apply(&StatePatch::with_value(42)));
        assert!(state.apply(&StatePatch::with_value(43)));
    }

    #[test]
    fn test_full_patch_from_state() {
        let state = ControlState {
            value: 7,
            color: None,
            flashing: true,
        };
        let patch = StatePatch::from(state);
        let mut other = ControlState::with_value(99);
        other.apply(&patch);
        assert_eq!(other, state);
    }
}
