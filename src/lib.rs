#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # rebtest
//!
//! Dependency-guided prioritized test generation for actor models.
//!
//! This library re-exports the workspace crates and exposes the CLI
//! commands so they can be driven from tests.

pub use rebtest_core;
pub use rebtest_engine;

pub mod cli;
pub mod commands;
