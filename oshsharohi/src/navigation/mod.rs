//! Page navigation
//!
//! Classifies clicked links, keeps the active nav marker in sync, and plays
//! the flash, exit and enter transitions.

pub mod controller;
pub mod page;

pub use controller::{Interception, LinkClick, NavigationController};
pub use page::{ActiveLinks, LinkKind, NavLink, classify, is_same_page, resolve_page};
