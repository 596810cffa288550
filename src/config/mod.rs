//! Configuration module for taskline
//!
//! Provides types, discovery and parsing for `taskline.toml` project
//! configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
