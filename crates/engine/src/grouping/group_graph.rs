//! Group interference graph (HAG).
//!
//! Edge `i -> j` means an instance of group `i` sends to an instance of group
//! `j`. Cycles are broken one edge at a time until the graph is acyclic,
//! then groups are ordered with Kahn's algorithm.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rebtest_core::{AnalysisResult, CyclePolicy};
use tap::Pipe;
use tracing::{debug, info};

use super::ActorGroup;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::erdg::Erdg;
use crate::error::{EngineError, EngineResult};

/// Directed graph over group indices. Node `i` is group `i`.
#[derive(Debug, Clone, Default)]
pub struct GroupGraph {
    graph: DiGraph<usize, ()>,
    self_sending: Vec<bool>,
    removed: Vec<(usize, usize)>,
}

impl GroupGraph {
    /// Build the interference graph of `groups` from the activations of `erdg`.
    ///
    /// A group is self-sending when one of its members' class constructor
    /// sends to `self`.
    pub fn build(groups: &[ActorGroup], erdg: &Erdg, analysis: &AnalysisResult) -> Self {
        let group_of: HashMap<&str, usize> = groups
            .iter()
            .flat_map(|group| group.members.iter().map(move |m| (m.as_str(), group.index)))
            .collect();

        let edges: BTreeSet<(usize, usize)> = erdg
            .activations()
            .filter_map(|activation| {
                let from = group_of.get(activation.sender.as_str())?;
                let to = group_of.get(activation.target.as_str())?;
                (from != to).then_some((*from, *to))
            })
            .collect();

        let mut graph = DiGraph::with_capacity(groups.len(), edges.len());
        for group in groups {
            graph.add_node(group.index);
        }
        for (from, to) in &edges {
            graph.add_edge(NodeIndex::new(*from), NodeIndex::new(*to), ());
        }

        let self_sending = groups
            .iter()
            .map(|group| {
                group.members.iter().any(|member| {
                    analysis.instance(member).is_some_and(|instance| {
                        analysis
                            .class(&instance.class_name)
                            .is_some_and(|class| class.constructor_sends_to_self(&instance.class_name))
                    })
                })
            })
            .collect();

        info!(groups = groups.len(), edges = edges.len(), "Built group graph");
        Self {
            graph,
            self_sending,
            removed: Vec::new(),
        }
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Current edges in ascending (from, to) order.
    #[must_use]
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index()))
            .collect::<Vec<_>>()
            .pipe(|mut edges| {
                edges.sort_unstable();
                edges
            })
    }

    /// Edges dropped by cycle resolution, in removal order.
    #[must_use]
    pub fn removed_edges(&self) -> &[(usize, usize)] {
        &self.removed
    }

    #[must_use]
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.graph
            .find_edge(NodeIndex::new(from), NodeIndex::new(to))
            .is_some()
    }

    #[must_use]
    pub fn is_self_sending(&self, group: usize) -> bool {
        self.self_sending.get(group).copied().unwrap_or(false)
    }

    /// Make the graph acyclic and return the group order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CycleDetected`] under [`CyclePolicy::Reject`]
    /// when a cycle exists.
    pub fn order(
        &mut self,
        groups: &[ActorGroup],
        policy: CyclePolicy,
        diagnostics: &mut Diagnostics,
    ) -> EngineResult<Vec<usize>> {
        self.resolve_cycles(groups, policy, diagnostics)?;
        self.topological_order()
    }

    /// Break cycles until none remain.
    ///
    /// The cycle holding the lowest group index goes first. Its groups are
    /// ranked self-sending first, then by index, and the first edge running
    /// against that rank is removed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CycleDetected`] under [`CyclePolicy::Reject`].
    pub fn resolve_cycles(
        &mut self,
        groups: &[ActorGroup],
        policy: CyclePolicy,
        diagnostics: &mut Diagnostics,
    ) -> EngineResult<()> {
        while let Some(cycle) = self.first_cycle() {
            if policy == CyclePolicy::Reject {
                return Err(EngineError::cycle_detected(
                    cycle
                        .iter()
                        .map(|index| {
                            groups
                                .get(*index)
                                .map(|group| group.members.clone())
                                .unwrap_or_default()
                        })
                        .collect(),
                ));
            }

            let mut rank = cycle.clone();
            rank.sort_by_key(|group| (!self.is_self_sending(*group), *group));
            let position = |group: usize| rank.iter().position(|g| *g == group);

            let backward = self.edges().into_iter().find(|(from, to)| {
                matches!((position(*from), position(*to)), (Some(f), Some(t)) if f > t)
            });
            let Some((from, to)) = backward else {
                return Err(EngineError::unorderable_groups(cycle));
            };

            if let Some(edge) = self.graph.find_edge(NodeIndex::new(from), NodeIndex::new(to)) {
                self.graph.remove_edge(edge);
            }
            self.removed.push((from, to));
            diagnostics.record(Diagnostic::CycleResolved {
                groups: cycle,
                removed_from: from,
                removed_to: to,
            });
        }
        Ok(())
    }

    /// Strongly connected component with more than one group that contains
    /// the lowest group index, members ascending.
    fn first_cycle(&self) -> Option<Vec<usize>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(NodeIndex::index).collect();
                members.sort_unstable();
                members
            })
            .min_by_key(|members| members.first().copied())
    }

    /// Kahn's algorithm, ties broken by ascending group index.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnorderableGroups`] if a cycle remains.
    pub fn topological_order(&self) -> EngineResult<Vec<usize>> {
        let count = self.graph.node_count();
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|node| {
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(group, _)| Reverse(group))
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some(Reverse(group)) = ready.pop() {
            order.push(group);
            for next in self.graph.neighbors(NodeIndex::new(group)) {
                if let Some(degree) = in_degree.get_mut(next.index()) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.push(Reverse(next.index()));
                    }
                }
            }
        }

        if order.len() != count {
            let remaining = (0..count).filter(|group| !order.contains(group)).collect();
            return Err(EngineError::unorderable_groups(remaining));
        }

        debug!(?order, "Ordered groups");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use rebtest_core::{ActorClass, InstanceDecl, MethodSummary};

    use super::*;

    fn graph_with(edges: &[(usize, usize)], count: usize, self_sending: &[usize]) -> (GroupGraph, Vec<ActorGroup>) {
        let groups: Vec<ActorGroup> = (0..count)
            .map(|index| ActorGroup {
                index,
                members: vec![format!("g{index}")],
            })
            .collect();
        let mut graph = DiGraph::new();
        for group in &groups {
            graph.add_node(group.index);
        }
        for (from, to) in edges {
            graph.add_edge(NodeIndex::new(*from), NodeIndex::new(*to), ());
        }
        let flags = (0..count).map(|g| self_sending.contains(&g)).collect();
        (
            GroupGraph {
                graph,
                self_sending: flags,
                removed: Vec::new(),
            },
            groups,
        )
    }

    #[test]
    fn given_acyclic_graph_when_ordered_then_ties_break_by_index() {
        let (mut graph, groups) = graph_with(&[(2, 0)], 3, &[]);
        let order = graph
            .order(&groups, CyclePolicy::Resolve, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn given_two_cycle_without_self_send_when_resolved_then_lower_index_first() {
        let (mut graph, groups) = graph_with(&[(0, 1), (1, 0)], 2, &[]);
        let mut diagnostics = Diagnostics::new();
        let order = graph.order(&groups, CyclePolicy::Resolve, &mut diagnostics).unwrap();

        assert_eq!(order, vec![0, 1]);
        assert_eq!(graph.removed_edges(), &[(1, 0)]);
        assert_eq!(diagnostics.of_kind("cycle_resolved").count(), 1);
    }

    #[test]
    fn given_two_cycle_with_self_sending_target_when_resolved_then_it_goes_first() {
        let (mut graph, groups) = graph_with(&[(0, 1), (1, 0)], 2, &[1]);
        let order = graph
            .order(&groups, CyclePolicy::Resolve, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(order, vec![1, 0]);
        assert!(graph.has_edge(1, 0));
        assert!(!graph.has_edge(0, 1));
    }

    #[test]
    fn given_two_cycle_with_both_groups_self_sending_when_resolved_then_lower_index_first() {
        let (mut graph, groups) = graph_with(&[(0, 1), (1, 0)], 2, &[0, 1]);
        let order = graph
            .order(&groups, CyclePolicy::Resolve, &mut Diagnostics::new())
            .unwrap();

        assert_eq!(order, vec![0, 1]);
        assert_eq!(graph.removed_edges(), &[(1, 0)]);
    }

    /// `a` and `b` message each other; only `B`'s constructor sends to `self`.
    fn mutual_senders() -> AnalysisResult {
        AnalysisResult::new()
            .with_class(
                "A",
                ActorClass::new()
                    .with_method("go", MethodSummary::new().with_send("b", "serve"))
                    .with_method("ping", MethodSummary::new()),
            )
            .with_class(
                "B",
                ActorClass::new()
                    .with_method("B", MethodSummary::new().with_send("self", "tick"))
                    .with_method("serve", MethodSummary::new().with_send("a", "ping"))
                    .with_method("tick", MethodSummary::new()),
            )
            .with_instance(InstanceDecl::new("a", "A"))
            .with_instance(InstanceDecl::new("b", "B"))
    }

    #[test]
    fn given_higher_group_constructor_sends_to_self_when_built_then_it_is_ordered_first() {
        let analysis = mutual_senders();
        let erdg = Erdg::build(&analysis, &mut Diagnostics::new());
        let groups = vec![
            ActorGroup {
                index: 0,
                members: vec!["a".to_string()],
            },
            ActorGroup {
                index: 1,
                members: vec!["b".to_string()],
            },
        ];

        let mut graph = GroupGraph::build(&groups, &erdg, &analysis);
        assert!(!graph.is_self_sending(0));
        assert!(graph.is_self_sending(1));
        assert_eq!(graph.edges(), vec![(0, 1), (1, 0)]);

        let order = graph
            .order(&groups, CyclePolicy::Resolve, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(order, vec![1, 0]);
        assert_eq!(graph.removed_edges(), &[(0, 1)]);
    }

    #[test]
    fn given_self_send_spelled_in_capitals_when_built_then_group_not_self_sending() {
        let analysis = AnalysisResult::new()
            .with_class(
                "B",
                ActorClass::new().with_method("B", MethodSummary::new().with_send("SELF", "tick")),
            )
            .with_instance(InstanceDecl::new("b", "B"));
        let erdg = Erdg::build(&analysis, &mut Diagnostics::new());
        let groups = vec![ActorGroup {
            index: 0,
            members: vec!["b".to_string()],
        }];

        let graph = GroupGraph::build(&groups, &erdg, &analysis);
        assert!(!graph.is_self_sending(0));
    }

    #[test]
    fn given_three_cycle_when_resolved_then_every_group_is_ordered() {
        let (mut graph, groups) = graph_with(&[(0, 1), (1, 2), (2, 0), (3, 1)], 4, &[]);
        let mut diagnostics = Diagnostics::new();
        let order = graph.order(&groups, CyclePolicy::Resolve, &mut diagnostics).unwrap();

        assert_eq!(order, vec![0, 3, 1, 2]);
        assert_eq!(graph.removed_edges(), &[(2, 0)]);
    }

    #[test]
    fn given_two_disjoint_cycles_when_resolved_then_both_are_broken() {
        let (mut graph, groups) = graph_with(&[(0, 1), (1, 0), (2, 3), (3, 2)], 4, &[3]);
        let mut diagnostics = Diagnostics::new();
        let order = graph.order(&groups, CyclePolicy::Resolve, &mut diagnostics).unwrap();

        assert_eq!(order, vec![0, 1, 3, 2]);
        assert_eq!(graph.removed_edges(), &[(1, 0), (2, 3)]);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn given_cycle_when_policy_rejects_then_groups_are_named() {
        let (mut graph, groups) = graph_with(&[(0, 1), (1, 0)], 2, &[]);
        let err = graph
            .order(&groups, CyclePolicy::Reject, &mut Diagnostics::new())
            .unwrap_err();

        match err {
            EngineError::CycleDetected { groups } => {
                assert_eq!(groups, vec![vec!["g0".to_string()], vec!["g1".to_string()]]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
