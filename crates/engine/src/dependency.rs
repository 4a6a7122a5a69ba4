//! # Actor Dependency Analyzer
//!
//! Two instances are actor-dependent when both send to a common target and
//! no causal path is known to order their sends. The result is the
//! undirected actor-dependency graph (AG) over all instances.
//!
//! Causality is delegated to a [`CausalityOracle`]. The default
//! [`NoKnownCausalPath`] never reports a path, so every pair with a common
//! target is treated as dependent. This over-approximates dependencies and
//! therefore enlarges groups and the number of generated test cases.

use std::collections::HashMap;

use itertools::Itertools;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::erdg::Erdg;

/// Decides whether a causal path orders two senders' messages to a target.
pub trait CausalityOracle {
    fn has_causal_path(&self, erdg: &Erdg, first: &str, second: &str, target: &str) -> bool;
}

/// Oracle that never knows a causal path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoKnownCausalPath;

impl CausalityOracle for NoKnownCausalPath {
    fn has_causal_path(&self, _erdg: &Erdg, _first: &str, _second: &str, _target: &str) -> bool {
        false
    }
}

/// An undirected AG edge and the common target that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorDependency {
    pub first: String,
    pub second: String,
    pub target: String,
}

/// Undirected actor-dependency graph.
///
/// Node indices follow instance declaration order.
#[derive(Debug, Clone, Default)]
pub struct ActorDependencyGraph {
    graph: UnGraph<String, String>,
    node_map: HashMap<String, NodeIndex>,
}

impl ActorDependencyGraph {
    /// Derive the AG from the activations of `erdg`.
    ///
    /// Pairs are visited in declaration order and at most one edge is added
    /// per pair, labelled with the first common target found. With
    /// `ignore_self_targets`, a common target that is one of the two senders
    /// does not count.
    pub fn build<O>(erdg: &Erdg, oracle: &O, ignore_self_targets: bool) -> Self
    where
        O: CausalityOracle + ?Sized,
    {
        let mut ag = Self::default();
        for rebec in erdg.rebecs() {
            let index = ag.graph.add_node(rebec.name.clone());
            ag.node_map.insert(rebec.name.clone(), index);
        }

        let mut targets: HashMap<&str, Vec<&str>> = HashMap::new();
        for activation in erdg.activations() {
            let sent = targets.entry(activation.sender.as_str()).or_default();
            if !sent.contains(&activation.target.as_str()) {
                sent.push(activation.target.as_str());
            }
        }

        let names: Vec<&str> = erdg.rebecs().map(|rebec| rebec.name.as_str()).collect();
        for (first, second) in names.iter().tuple_combinations() {
            let common = common_target(&targets, first, second, ignore_self_targets, |target| {
                !oracle.has_causal_path(erdg, first, second, target)
            });
            if let Some(target) = common {
                ag.add_dependency(first, second, target);
            }
        }

        info!(
            instances = ag.node_count(),
            dependencies = ag.edge_count(),
            "Built actor dependency graph"
        );
        ag
    }

    fn add_dependency(&mut self, first: &str, second: &str, target: &str) {
        if let (Some(a), Some(b)) = (self.node_map.get(first), self.node_map.get(second)) {
            debug!(first, second, target, "Actor dependency");
            self.graph.add_edge(*a, *b, target.to_string());
        }
    }

    /// Instance names in declaration order.
    pub fn instances(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<ActorDependency> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                Some(ActorDependency {
                    first: self.graph.node_weight(edge.source())?.clone(),
                    second: self.graph.node_weight(edge.target())?.clone(),
                    target: edge.weight().clone(),
                })
            })
            .collect()
    }

    #[must_use]
    pub fn are_dependent(&self, first: &str, second: &str) -> bool {
        match (self.node_map.get(first), self.node_map.get(second)) {
            (Some(a), Some(b)) => self.graph.find_edge(*a, *b).is_some(),
            _ => false,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) const fn graph(&self) -> &UnGraph<String, String> {
        &self.graph
    }
}

fn common_target<'a>(
    targets: &HashMap<&str, Vec<&'a str>>,
    first: &str,
    second: &str,
    ignore_self_targets: bool,
    mut unordered: impl FnMut(&str) -> bool,
) -> Option<&'a str> {
    let first_targets = targets.get(first)?;
    let second_targets = targets.get(second)?;
    first_targets.iter().copied().find(|target| {
        second_targets.contains(target)
            && !(ignore_self_targets && (*target == first || *target == second))
            && unordered(target)
    })
}
