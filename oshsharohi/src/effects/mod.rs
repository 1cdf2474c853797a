//! Scroll, pointer and overlay embellishments
//!
//! Every effect is a pure function from input state to render instructions.
//! Hosts call them from their own event handlers.

pub mod overlays;
pub mod particles;
pub mod pointer;
pub mod scroll;

pub use overlays::{DepartmentAccordion, MemberCard, MemberModal, MobileMenu};
pub use particles::{HeroParticle, PARTICLE_COUNT, hero_particles};
pub use pointer::{CursorGlow, Rect};
pub use scroll::ScrollMetrics;
