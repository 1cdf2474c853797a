//! `Oshsharohi` Core - shared configuration schema and error types
//!
//! This crate holds the site configuration types and the configuration
//! error types shared by the `oshsharohi` runtime and its CLI.

pub mod config;
pub mod error;
