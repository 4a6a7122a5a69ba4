//! # Grouping & Ordering
//!
//! Connected components of the actor-dependency graph become actor groups.
//! The [`GroupGraph`] orders them by send interference.

mod group_graph;

use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};

pub use group_graph::GroupGraph;

use crate::dependency::ActorDependencyGraph;

/// A connected component of the actor-dependency graph.
///
/// Members are listed in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorGroup {
    pub index: usize,
    pub members: Vec<String>,
}

impl ActorGroup {
    #[must_use]
    pub fn contains(&self, instance: &str) -> bool {
        self.members.iter().any(|member| member == instance)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Split the actor-dependency graph into connected components.
///
/// Components are numbered by their first-declared member, so group 0
/// always contains the first instance.
#[must_use]
pub fn find_actor_groups(ag: &ActorDependencyGraph) -> Vec<ActorGroup> {
    let graph = ag.graph();
    let mut assigned = vec![false; graph.node_count()];
    let mut groups = Vec::new();

    for start in graph.node_indices() {
        if assigned.get(start.index()).copied().unwrap_or(true) {
            continue;
        }

        let mut component = Vec::new();
        let mut dfs = Dfs::new(graph, start);
        while let Some(node) = dfs.next(graph) {
            if let Some(slot) = assigned.get_mut(node.index()) {
                *slot = true;
            }
            component.push(node);
        }
        component.sort_unstable();

        groups.push(ActorGroup {
            index: groups.len(),
            members: component
                .into_iter()
                .filter_map(|node| graph.node_weight(node).cloned())
                .collect(),
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rebtest_core::{ActorClass, AnalysisResult, InstanceDecl, MethodSummary};

    use super::*;
    use crate::dependency::NoKnownCausalPath;
    use crate::diagnostics::Diagnostics;
    use crate::erdg::Erdg;

    fn groups_of(analysis: &AnalysisResult) -> Vec<ActorGroup> {
        let erdg = Erdg::build(analysis, &mut Diagnostics::new());
        find_actor_groups(&ActorDependencyGraph::build(&erdg, &NoKnownCausalPath, false))
    }

    #[test]
    fn given_independent_instances_when_grouped_then_all_singletons() {
        let analysis = AnalysisResult::new()
            .with_class("A", ActorClass::new())
            .with_instance(InstanceDecl::new("x", "A"))
            .with_instance(InstanceDecl::new("y", "A"));
        let groups = groups_of(&analysis);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec!["x"]);
        assert_eq!(groups[1].members, vec!["y"]);
    }

    #[test]
    fn given_shared_target_when_grouped_then_senders_share_a_group() {
        let analysis = AnalysisResult::new()
            .with_class(
                "Client",
                ActorClass::new().with_method("go", MethodSummary::new().with_send("server", "serve")),
            )
            .with_class("Server", ActorClass::new().with_method("serve", MethodSummary::new()))
            .with_instance(InstanceDecl::new("server", "Server"))
            .with_instance(InstanceDecl::new("c1", "Client"))
            .with_instance(InstanceDecl::new("c2", "Client"));
        let groups = groups_of(&analysis);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec!["server"]);
        assert_eq!(groups[1].members, vec!["c1", "c2"]);
        assert!(groups[1].contains("c2"));
        assert_eq!(groups[1].index, 1);
    }
}
