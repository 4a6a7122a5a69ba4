//! Result type definition.

use crate::error::Error;

/// The standard Result type for rebtest operations.
pub type Result<T> = std::result::Result<T, Error>;
