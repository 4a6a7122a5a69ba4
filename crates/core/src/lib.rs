//! # rebtest-core
//!
//! Core types shared by the rebtest crates: the error type, the analysis
//! input model, and the generator configuration.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod error;
pub mod model;
pub mod result;

pub use config::{CyclePolicy, GeneratorConfig};
pub use error::Error;
pub use model::{
    ActorClass, AnalysisResult, InstanceDecl, MethodSummary, OrderedMap, SendStatement,
    is_constructor,
};
pub use result::Result;
