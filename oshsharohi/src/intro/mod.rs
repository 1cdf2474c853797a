//! Cockpit gate and intro sequence
//!
//! [`GateState`] decides whether the intro plays on this page load,
//! [`IntroTimeline`] is its step table and [`IntroController`] ties them to
//! a [`TimedSequencer`](crate::sequence::TimedSequencer) run.

pub mod controller;
pub mod gate;
pub mod timeline;
pub mod wind;

pub use controller::{IntroController, IntroOptions};
pub use gate::{FileSessionStore, GateState, MemorySessionStore, SessionStore};
pub use timeline::{IntroStage, IntroTimeline, TimelineEntry};
