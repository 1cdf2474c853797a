//! Configuration module
//!
//! YAML loading with environment substitution, plus validation of the
//! resulting [`SiteConfig`](schema::SiteConfig).

pub mod loader;
pub mod validation;

pub use oshsharohi_core::config::schema;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use validation::{ValidationResult, Validator};
