//! Intra-instance data dependencies.
//!
//! Per state variable, handlers are walked in declaration order tracking the
//! last writer. A later write or read of the variable depends on that writer.
//! The constructor takes the writer slot but never appears on an edge.

use rebtest_core::{ActorClass, AnalysisResult, is_constructor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EdgeKind, Erdg, ErdgNode, MessageServerNode};
use crate::diagnostics::{DataAccess, Diagnostic, Diagnostics};

/// An ordering constraint between two handlers of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDependency {
    pub instance: String,
    pub variable: String,
    pub from: String,
    pub to: String,
    pub access: DataAccess,
}

/// Scan one instance's handlers for data dependencies.
///
/// Returns the dependencies in discovery order together with the
/// constructor edges that were skipped. A handler that writes and then reads
/// the same variable depends on itself.
pub fn scan_instance(
    instance: &str,
    class_name: &str,
    class: &ActorClass,
) -> (Vec<DataDependency>, Vec<Diagnostic>) {
    let mut dependencies = Vec::new();
    let mut skipped = Vec::new();

    for variable in &class.statevars {
        let mut last_writer: Option<&str> = None;

        for (handler, method) in class.methods.iter() {
            let handler_is_ctor = is_constructor(class_name, handler);
            let mut edge = |from: &str, access: DataAccess| {
                let from_is_ctor = is_constructor(class_name, from);
                if handler_is_ctor || from_is_ctor {
                    skipped.push(Diagnostic::ConstructorEdgeSkipped {
                        instance: instance.to_string(),
                        variable: variable.clone(),
                        from: from.to_string(),
                        to: handler.to_string(),
                        access,
                    });
                } else {
                    dependencies.push(DataDependency {
                        instance: instance.to_string(),
                        variable: variable.clone(),
                        from: from.to_string(),
                        to: handler.to_string(),
                        access,
                    });
                }
            };

            if method.writes_var(variable) {
                if let Some(writer) = last_writer {
                    edge(writer, DataAccess::WriteAfterWrite);
                }
                last_writer = Some(handler);
                if handler_is_ctor {
                    continue;
                }
            }

            if method.reads_var(variable) {
                if let Some(writer) = last_writer {
                    edge(writer, DataAccess::ReadAfterWrite);
                }
            }
        }
    }

    (dependencies, skipped)
}

/// Add `DataDep` edges for every instance whose class is known.
pub(super) fn add_data_dependencies(
    erdg: &mut Erdg,
    analysis: &AnalysisResult,
    diagnostics: &mut Diagnostics,
) {
    for instance in &analysis.main_instances {
        let Some(class) = analysis.class(&instance.class_name) else {
            continue;
        };

        let (dependencies, skipped) = scan_instance(&instance.name, &instance.class_name, class);
        diagnostics.extend(skipped);

        for dependency in dependencies {
            let from = ErdgNode::MessageServer(MessageServerNode::new(&instance.name, &dependency.from));
            let to = ErdgNode::MessageServer(MessageServerNode::new(&instance.name, &dependency.to));
            let (Some(from), Some(to)) = (erdg.node_index(&from), erdg.node_index(&to)) else {
                continue;
            };
            if erdg.add_edge(from, to, EdgeKind::DataDep) {
                debug!(
                    instance = %dependency.instance,
                    variable = %dependency.variable,
                    from = %dependency.from,
                    to = %dependency.to,
                    access = %dependency.access,
                    "Added data dependency"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rebtest_core::MethodSummary;

    use super::*;

    fn edges(dependencies: &[DataDependency]) -> Vec<(&str, &str)> {
        dependencies
            .iter()
            .map(|d| (d.from.as_str(), d.to.as_str()))
            .collect()
    }

    #[test]
    fn given_write_then_read_when_scanned_then_read_after_write_edge() {
        let class = ActorClass::new()
            .with_statevar("x")
            .with_method("put", MethodSummary::new().writing("x"))
            .with_method("get", MethodSummary::new().reading("x"));
        let (deps, skipped) = scan_instance("c", "Cell", &class);

        assert_eq!(edges(&deps), vec![("put", "get")]);
        assert_eq!(deps[0].access, DataAccess::ReadAfterWrite);
        assert!(skipped.is_empty());
    }

    #[test]
    fn given_two_writers_when_scanned_then_write_after_write_edge() {
        let class = ActorClass::new()
            .with_statevar("x")
            .with_method("first", MethodSummary::new().writing("x"))
            .with_method("second", MethodSummary::new().writing("x"));
        let (deps, _) = scan_instance("c", "Cell", &class);

        assert_eq!(edges(&deps), vec![("first", "second")]);
        assert_eq!(deps[0].access, DataAccess::WriteAfterWrite);
    }

    #[test]
    fn given_constructor_writes_when_scanned_then_no_edge_touches_it() {
        let class = ActorClass::new()
            .with_statevar("x")
            .with_method("cell", MethodSummary::new().writing("x"))
            .with_method("get", MethodSummary::new().reading("x"))
            .with_method("put", MethodSummary::new().writing("x"));
        let (deps, skipped) = scan_instance("c", "Cell", &class);

        assert!(deps.is_empty());
        assert_eq!(skipped.len(), 2);
    }

    #[test]
    fn given_constructor_declared_late_when_scanned_then_it_resets_the_chain() {
        let class = ActorClass::new()
            .with_statevar("x")
            .with_method("a", MethodSummary::new().writing("x"))
            .with_method("Cell", MethodSummary::new().writing("x"))
            .with_method("b", MethodSummary::new().reading("x"));
        let (deps, skipped) = scan_instance("c", "Cell", &class);

        assert!(deps.is_empty());
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().all(|d| d.kind() == "constructor_edge_skipped"));
    }

    #[test]
    fn given_read_write_handler_when_scanned_then_self_loop_kept() {
        let class = ActorClass::new()
            .with_statevar("x")
            .with_method("first", MethodSummary::new().writing("x"))
            .with_method("bump", MethodSummary::new().reading("x").writing("x"));
        let (deps, _) = scan_instance("c", "Cell", &class);

        assert_eq!(edges(&deps), vec![("first", "bump"), ("bump", "bump")]);
        assert_eq!(deps[1].access, DataAccess::ReadAfterWrite);
    }

    #[test]
    fn given_read_write_handler_when_added_then_erdg_self_loop_present() {
        let analysis = AnalysisResult::new()
            .with_class(
                "Cell",
                ActorClass::new()
                    .with_statevar("x")
                    .with_method("bump", MethodSummary::new().reading("x").writing("x")),
            )
            .with_instance(rebtest_core::InstanceDecl::new("c", "Cell"));
        let erdg = Erdg::build(&analysis, &mut Diagnostics::new());

        let loops: Vec<String> = erdg
            .data_dependencies()
            .map(|(from, to)| format!("{from} -> {to}"))
            .collect();
        assert_eq!(loops, vec!["c.bump -> c.bump"]);
    }

    #[test]
    fn given_unrelated_variables_when_scanned_then_no_edges() {
        let class = ActorClass::new()
            .with_statevar("x")
            .with_statevar("y")
            .with_method("a", MethodSummary::new().writing("x"))
            .with_method("b", MethodSummary::new().reading("y"));
        let (deps, skipped) = scan_instance("c", "Cell", &class);
        assert!(deps.is_empty());
        assert!(skipped.is_empty());
    }
}
