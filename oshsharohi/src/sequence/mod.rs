//! Timed sequencing
//!
//! Runs an ordered table of `(offset, action)` steps against one start
//! instant, with cooperative cancellation.
//!
//! # Architecture
//!
//! - [`SequenceStep`]: one row of the step table (offset, label, action)
//! - [`TimedSequencer`]: spawns the driver task for a run
//! - [`SequenceHandle`]: cancellation and progress of a run
//! - [`RunContext`]: handed to actions; owns tickers and follow-ups whose
//!   lifetime is bounded by the run
//! - [`gauge`]: numeric ramp and dial geometry of the intro speed gauge

pub mod context;
pub mod gauge;
pub mod sequencer;
pub mod step;

pub use context::{FRAME_INTERVAL, RunContext, Ticker};
pub use sequencer::{SequenceHandle, TimedSequencer};
pub use step::SequenceStep;
