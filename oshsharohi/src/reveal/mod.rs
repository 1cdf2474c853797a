//! Scroll-driven one-shot animations
//!
//! The host reports viewport intersections; each watched element animates
//! exactly once, the first time it is visible enough.

pub mod animator;
pub mod counter;
pub mod trigger;

pub use animator::{RevealAnimator, RevealStep};
pub use counter::{CounterAnimator, SpecCounter, StatCounter};
pub use trigger::{IntersectionEntry, VisibilityEvent, VisibilityTrigger};
