//! Configuration for test generation.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How the group graph handles cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Break cycles edge by edge until the group graph is acyclic.
    #[default]
    Resolve,
    /// Fail with the groups of the first cycle found.
    Reject,
}

impl fmt::Display for CyclePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve => write!(f, "resolve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for CyclePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "resolve" => Ok(Self::Resolve),
            "reject" => Ok(Self::Reject),
            other => Err(Error::invalid_config(format!(
                "unknown cycle policy '{other}' (expected 'resolve' or 'reject')"
            ))),
        }
    }
}

/// Configuration for the generator.
///
/// Loaded from TOML; every field has a default so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Cap on permutations enumerated for a single actor group or handler
    /// component. `None` enumerates all of them.
    #[serde(default)]
    pub max_permutations_per_group: Option<usize>,

    /// Cap on emitted test cases. `None` emits the full cross product.
    #[serde(default)]
    pub max_test_cases: Option<usize>,

    /// Group-graph cycle handling.
    #[serde(default)]
    pub cycle_policy: CyclePolicy,

    /// Treat a common target that is one of the two senders as no dependency.
    #[serde(default = "default_ignore_self_targets")]
    pub ignore_self_targets: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_permutations_per_group: None,
            max_test_cases: None,
            cycle_policy: CyclePolicy::default(),
            ignore_self_targets: default_ignore_self_targets(),
        }
    }
}

impl GeneratorConfig {
    /// Create a new config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_max_permutations_per_group(mut self, cap: usize) -> Self {
        self.max_permutations_per_group = Some(cap);
        self
    }

    #[must_use]
    pub const fn with_max_test_cases(mut self, cap: usize) -> Self {
        self.max_test_cases = Some(cap);
        self
    }

    #[must_use]
    pub const fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_ignore_self_targets(mut self, ignore: bool) -> Self {
        self.ignore_self_targets = ignore;
        self
    }

    /// Parse and validate a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TomlParseFailed`] for malformed TOML and
    /// [`Error::InvalidConfig`] when validation fails.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| Error::toml_parse_failed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileReadFailed`] if the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a cap is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_permutations_per_group == Some(0) {
            return Err(Error::invalid_config(
                "max_permutations_per_group must be greater than 0",
            ));
        }

        if self.max_test_cases == Some(0) {
            return Err(Error::invalid_config("max_test_cases must be greater than 0"));
        }

        Ok(())
    }
}

const fn default_ignore_self_targets() -> bool {
    false
}
