//! Control - stateful proxy for one physical control address
//!
//! A control owns its listening set of compiled patterns, its logical
//! state, and the render-suppression record. It converts inbound messages
//! to partial state and outbound state to messages; the engine drives the
//! activation transitions and the render pipeline around it.

use crate::component::{ComponentId, ControlView};
use crate::midi::Message;
use crate::pattern::{Pattern, PatternError};
use crate::state::{ControlState, StatePatch};
use tracing::trace;

/// Opaque handle to a registered control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub(crate) usize);

/// Declarative description of a control: its address patterns and value
/// range. Compiled into a [`Control`] at registration.
#[derive(Debug, Clone)]
pub struct ControlSpec {
    pub name: String,
    pub patterns: Vec<String>,
    pub port: u8,
    pub min_value: u8,
    pub max_value: u8,
}

impl ControlSpec {
    /// A control listening on a single pattern, port 0, full 7-bit range.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patterns: vec![pattern.into()],
            port: 0,
            min_value: 0,
            max_value: 127,
        }
    }

    /// Add another address pattern to the listening set.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    pub fn range(mut self, min_value: u8, max_value: u8) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }
}

/// A registered control. Fields are engine-internal; consumers observe
/// controls through [`ControlView`] and the engine accessors.
pub(crate) struct Control {
    pub(crate) name: String,
    pub(crate) patterns: Vec<Pattern>,
    pub(crate) port: u8,
    pub(crate) min_value: u8,
    pub(crate) max_value: u8,
    pub(crate) state: ControlState,
    /// Pre-mutation snapshot, captured lazily on the first state merge and
    /// restored when a new component is activated.
    pub(crate) initial_state: Option<ControlState>,
    /// The single runtime-mutable relation: at most one active component.
    pub(crate) active: Option<ComponentId>,
    /// Last message physically sent; equal re-sends are suppressed.
    pub(crate) last_sent: Option<Message>,
}

impl Control {
    /// Compile a spec. Pattern errors are construction-time fatal.
    pub(crate) fn from_spec(spec: ControlSpec) -> Result<Self, PatternError> {
        let patterns = spec
            .patterns
            .iter()
            .map(|p| Pattern::compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: spec.name,
            patterns,
            port: spec.port,
            min_value: spec.min_value,
            max_value: spec.max_value,
            state: ControlState::default(),
            initial_state: None,
            active: None,
            last_sent: None,
        })
    }

    /// Decode an inbound message into a partial state.
    ///
    /// Returns `Some` only when one of the listening patterns matches;
    /// `None` for all other traffic. Mismatches are expected on the hot
    /// path and are never an error.
    pub(crate) fn decode(&self, message: &Message) -> Option<StatePatch> {
        if message.port() != self.port {
            return None;
        }
        for pattern in &self.patterns {
            match (pattern, message) {
                (Pattern::Channel(p), Message::Channel(m)) if p.matches(m) => {
                    let value = m.byte(p.value_byte_index()).unwrap_or(self.min_value);
                    return Some(StatePatch::with_value(value));
                }
                (Pattern::SysEx(p), Message::SysEx(m)) if p.matches(m) => {
                    // Equality match carries no value of its own.
                    return Some(StatePatch::empty());
                }
                _ => {}
            }
        }
        None
    }

    /// Merge a patch into the control state, snapshotting the pre-mutation
    /// state on the first call. Returns whether anything changed.
    pub(crate) fn merge_state(&mut self, patch: &StatePatch) -> bool {
        if self.initial_state.is_none() {
            self.initial_state = Some(self.state);
        }
        let changed = self.state.apply(patch);
        if changed {
            trace!(control = %self.name, state = ?self.state, "state merged");
        }
        changed
    }

    /// Restore the lazily captured initial state, if one was taken.
    pub(crate) fn reset_to_initial(&mut self) {
        if let Some(initial) = self.initial_state {
            self.state = initial;
        }
    }

    /// Encode a desired output state into a physical message via the first
    /// channel pattern. `None` when the control has no channel pattern
    /// (sysex-only controls are input-only).
    pub(crate) fn encode(&self, output: &ControlState) -> Option<Message> {
        let pattern = self.patterns.iter().find_map(Pattern::as_channel)?;
        let value = output.value.clamp(self.min_value, self.max_value);
        Some(Message::Channel(pattern.realize(self.port, value)))
    }

    pub(crate) fn view(&self, id: ControlId) -> ControlView {
        ControlView {
            id,
            port: self.port,
            min_value: self.min_value,
            max_value: self.max_value,
        }
    }
}
