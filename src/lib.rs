//! surface-engine - control-binding and gesture-dispatch for hardware
//! control surfaces
//!
//! The engine matches raw hardware messages against wildcard address
//! patterns, routes each match to the single component active on that
//! control, disambiguates press/release streams into semantic gestures
//! (press, release, long-press, double-press, double-release), and renders
//! logical state back out to the hardware with equality-based suppression.
//!
//! ```no_run
//! use std::sync::Arc;
//! use surface_engine::{
//!     Button, ButtonHandler, ComponentCtx, ConsoleTransport, ControlSpec, Engine, EngineConfig,
//! };
//!
//! struct PlayButton;
//!
//! impl ButtonHandler for PlayButton {
//!     fn on_press(&mut self, _ctx: &mut ComponentCtx<'_>) {
//!         println!("play");
//!     }
//!     fn on_long_press(&mut self, _ctx: &mut ComponentCtx<'_>) {
//!         println!("stop");
//!     }
//! }
//!
//! # async fn run() -> anyhow::Result<()> {
//! let engine = Engine::new(
//!     EngineConfig::default(),
//!     Arc::new(ConsoleTransport::new("surface")),
//! );
//! let control = engine.add_control(ControlSpec::new("play", "905E??"))?;
//! let button = engine.add_component(Button::new(PlayButton), "transport", &[control]);
//! engine.set_active_component(control, Some(button));
//! engine.init();
//!
//! // The surrounding dispatch layer feeds inbound bytes:
//! engine.on_raw(0, &[0x90, 0x5E, 0x7F]);
//! # Ok(())
//! # }
//! ```

pub mod component;
pub mod config;
pub mod control;
pub mod engine;
pub mod event;
pub mod midi;
pub mod pattern;
pub mod state;
pub mod timer;
pub mod transport;

pub use component::{
    Button, ButtonHandler, ButtonProps, Component, ComponentCtx, ComponentId, ControlView, Range,
    Toggle,
};
pub use config::EngineConfig;
pub use control::{ControlId, ControlSpec};
pub use engine::Engine;
pub use event::{Event, EventError};
pub use midi::{ChannelMessage, Message, MessageError, SysExMessage};
pub use pattern::{MessagePattern, Pattern, PatternError, SysExPattern};
pub use state::{Color, ControlState, StatePatch};
pub use timer::TimerPurpose;
pub use transport::{
    ConsoleTransport, MemoryTransport, MidirTransport, RemoteValue, Transport, ValueCallback,
};
