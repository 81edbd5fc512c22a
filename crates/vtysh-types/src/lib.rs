//! Foundation types for the vtysh grammar engine.
//!
//! This crate holds what every other crate in the workspace shares: the
//! error type and the shell configuration, including the schema of the
//! TOML command definition tables.

pub mod config;
pub mod error;
