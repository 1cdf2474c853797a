//! `Oshsharohi` - client-side runtime for the Oshsharohi site
//!
//! Timed intro sequencing behind a once-per-session gate, one-shot
//! scroll reveals and counters, and page transitions. Effects compute
//! render instructions; a host applies them through the traits in
//! [`surface`].

pub mod chrome;
pub mod cli;
pub mod config;
pub mod effects;
pub mod error;
pub mod intro;
pub mod navigation;
pub mod observability;
pub mod reveal;
pub mod sequence;
pub mod surface;
