//! Structured diagnostics for a generation run.
//!
//! Every recoverable problem the engine works around is recorded here and
//! emitted through `tracing`. Nothing is skipped silently.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How a diagnostic should be treated by downstream tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// Kind of state-variable access that would have produced a data dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataAccess {
    WriteAfterWrite,
    ReadAfterWrite,
}

impl fmt::Display for DataAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteAfterWrite => write!(f, "write-after-write"),
            Self::ReadAfterWrite => write!(f, "read-after-write"),
        }
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A send target matched no instance name and no class.
    UnresolvedTarget {
        instance: String,
        handler: String,
        target: String,
        message: String,
    },
    /// The resolved target does not declare the sent message.
    UnknownMessage {
        instance: String,
        handler: String,
        target_instance: String,
        target_class: String,
        message: String,
    },
    /// An instance names a class absent from the analysis.
    MissingActorClass { instance: String, class_name: String },
    /// A data dependency touching a constructor was not added.
    ConstructorEdgeSkipped {
        instance: String,
        variable: String,
        from: String,
        to: String,
        access: DataAccess,
    },
    /// A group-graph cycle was broken by removing one edge.
    CycleResolved {
        groups: Vec<usize>,
        removed_from: usize,
        removed_to: usize,
    },
    /// Permutations of a group or component were cut off at the cap.
    PermutationsTruncated {
        scope: String,
        members: Vec<String>,
        limit: usize,
    },
    /// Test-case emission stopped at the cap.
    TestCasesTruncated { limit: usize },
}

impl Diagnostic {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ConstructorEdgeSkipped { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnresolvedTarget { .. } => "unresolved_target",
            Self::UnknownMessage { .. } => "unknown_message",
            Self::MissingActorClass { .. } => "missing_actor_class",
            Self::ConstructorEdgeSkipped { .. } => "constructor_edge_skipped",
            Self::CycleResolved { .. } => "cycle_resolved",
            Self::PermutationsTruncated { .. } => "permutations_truncated",
            Self::TestCasesTruncated { .. } => "test_cases_truncated",
        }
    }

    fn emit(&self) {
        match self.severity() {
            Severity::Warning => warn!(kind = self.kind(), "{self}"),
            Severity::Info => debug!(kind = self.kind(), "{self}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedTarget {
                instance,
                handler,
                target,
                message,
            } => write!(
                f,
                "unknown target actor '{target}' in send {target}!{message} from {instance}.{handler}"
            ),
            Self::UnknownMessage {
                instance,
                handler,
                target_instance,
                target_class,
                message,
            } => write!(
                f,
                "message '{message}' sent from {instance}.{handler} is not a handler of '{target_instance}' (class {target_class})"
            ),
            Self::MissingActorClass {
                instance,
                class_name,
            } => write!(
                f,
                "actor class '{class_name}' of instance '{instance}' not found in analysis"
            ),
            Self::ConstructorEdgeSkipped {
                instance,
                variable,
                from,
                to,
                access,
            } => write!(
                f,
                "skipped {access} edge {instance}.{from} -> {instance}.{to} on '{variable}' (constructor)"
            ),
            Self::CycleResolved {
                groups,
                removed_from,
                removed_to,
            } => write!(
                f,
                "cycle between groups {groups:?} resolved by dropping edge {removed_from} -> {removed_to}"
            ),
            Self::PermutationsTruncated {
                scope,
                members,
                limit,
            } => write!(
                f,
                "permutations of {scope} {members:?} truncated at {limit}"
            ),
            Self::TestCasesTruncated { limit } => {
                write!(f, "test case emission truncated at {limit}")
            }
        }
    }
}

/// Diagnostics in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a diagnostic and emit it through `tracing`.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics of the given kind, e.g. `"unresolved_target"`.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.kind() == kind)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        iter.into_iter().for_each(|d| self.record(d));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn given_mixed_diagnostics_when_counted_then_info_is_not_a_warning() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(Diagnostic::MissingActorClass {
            instance: "a".to_string(),
            class_name: "A".to_string(),
        });
        diagnostics.record(Diagnostic::ConstructorEdgeSkipped {
            instance: "a".to_string(),
            variable: "x".to_string(),
            from: "A".to_string(),
            to: "go".to_string(),
            access: DataAccess::ReadAfterWrite,
        });

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.of_kind("missing_actor_class").count(), 1);
    }

    #[test]
    fn given_diagnostic_when_serialized_then_tagged_by_kind() {
        let diagnostic = Diagnostic::TestCasesTruncated { limit: 10 };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["kind"], "test_cases_truncated");
        assert_eq!(json["limit"], 10);
    }

    #[test]
    fn given_unresolved_target_when_displayed_then_names_sender() {
        let diagnostic = Diagnostic::UnresolvedTarget {
            instance: "client".to_string(),
            handler: "start".to_string(),
            target: "sevrer".to_string(),
            message: "req".to_string(),
        };
        let text = diagnostic.to_string();
        assert!(text.contains("'sevrer'"));
        assert!(text.contains("client.start"));
    }
}
