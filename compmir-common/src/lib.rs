//! # compmir Common Library
//!
//! Shared code for the compmir crates:
//! - Error type used by configuration loading
//! - TOML configuration discovery and credential resolution
//! - Registry of the tools the workspace provides

pub mod config;
pub mod error;
pub mod tools;

pub use error::{Error, Result};
