//! Site configuration schema.

pub mod schema;
