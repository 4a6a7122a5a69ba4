//! Handler priority orderings, per actor class.
//!
//! Handlers joined by data dependencies form components whose internal order
//! is unknown, so every permutation is enumerated. The constructor is never
//! ordered here.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::UnGraph;
use petgraph::visit::Dfs;
use rebtest_core::{AnalysisResult, is_constructor};
use serde::{Deserialize, Serialize};

use super::product::{PermutationSlot, combination_count, flatten_choice, index_product};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::erdg::Erdg;

/// Handler name to priority for one class, numbered 1..=m.
pub type MethodOrdering = BTreeMap<String, u32>;

/// Class name to its [`MethodOrdering`].
pub type MethodPriorities = BTreeMap<String, MethodOrdering>;

/// Permutation slots of one class: dependency components first, then the
/// unconstrained handlers as singletons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMethodPlan {
    pub class_name: String,
    pub slots: Vec<PermutationSlot>,
}

impl ClassMethodPlan {
    /// Plan the orderings of `class_name` from its intra-class edges.
    #[must_use]
    pub fn new(
        class_name: &str,
        handlers: &[&str],
        edges: &[(&str, &str)],
        cap: Option<usize>,
    ) -> Self {
        let handlers: Vec<&str> = handlers
            .iter()
            .copied()
            .filter(|handler| !is_constructor(class_name, handler))
            .collect();

        let mut graph: UnGraph<&str, ()> = UnGraph::with_capacity(handlers.len(), edges.len());
        let nodes: HashMap<&str, _> = handlers
            .iter()
            .map(|handler| (*handler, graph.add_node(*handler)))
            .collect();
        for (from, to) in edges {
            if let (Some(a), Some(b)) = (nodes.get(from), nodes.get(to)) {
                if a != b && graph.find_edge(*a, *b).is_none() {
                    graph.add_edge(*a, *b, ());
                }
            }
        }

        let mut seen = vec![false; graph.node_count()];
        let mut components: Vec<Vec<String>> = Vec::new();
        for start in graph.node_indices() {
            if seen.get(start.index()).copied().unwrap_or(true) {
                continue;
            }
            let mut members = Vec::new();
            let mut dfs = Dfs::new(&graph, start);
            while let Some(node) = dfs.next(&graph) {
                if let Some(flag) = seen.get_mut(node.index()) {
                    *flag = true;
                }
                members.push(node);
            }
            members.sort_unstable();
            components.push(
                members
                    .into_iter()
                    .filter_map(|node| graph.node_weight(node).map(ToString::to_string))
                    .collect(),
            );
        }

        // Stable: dependency components keep declaration order, singletons follow.
        components.sort_by_key(|members| members.len() == 1);

        Self {
            class_name: class_name.to_string(),
            slots: components
                .into_iter()
                .map(|members| PermutationSlot::new(members, cap))
                .collect(),
        }
    }

    /// Components with more than one handler.
    pub fn components(&self) -> impl Iterator<Item = &[String]> {
        self.slots
            .iter()
            .filter(|slot| slot.members.len() > 1)
            .map(|slot| slot.members.as_slice())
    }

    #[must_use]
    pub fn ordering_count(&self) -> Option<u128> {
        combination_count(&self.slots)
    }

    /// Every ordering of this class, last component varying fastest.
    pub fn orderings(&self) -> impl Iterator<Item = MethodOrdering> + '_ {
        let radices = self.slots.iter().map(PermutationSlot::len).collect();
        index_product(radices).map(move |digits| self.ordering_for(&digits))
    }

    fn ordering_for(&self, digits: &[usize]) -> MethodOrdering {
        (1u32..)
            .zip(flatten_choice(&self.slots, digits))
            .map(|(priority, handler)| (handler.clone(), priority))
            .collect()
    }
}

/// Orderings of every class, in class declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodPriorityPlan {
    pub classes: Vec<ClassMethodPlan>,
}

impl MethodPriorityPlan {
    /// Plan every class of `analysis` from the `DataDep` edges of `erdg`.
    pub fn new(
        analysis: &AnalysisResult,
        erdg: &Erdg,
        cap: Option<usize>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut edges_by_class: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
        for (from, to) in erdg.data_dependencies() {
            let from_class = analysis.instance(&from.instance).map(|i| i.class_name.as_str());
            let to_class = analysis.instance(&to.instance).map(|i| i.class_name.as_str());
            if let (Some(class_name), true) = (from_class, from_class == to_class) {
                edges_by_class
                    .entry(class_name)
                    .or_default()
                    .push((from.handler.as_str(), to.handler.as_str()));
            }
        }

        let classes = analysis
            .actors
            .iter()
            .map(|(class_name, class)| {
                let handlers: Vec<&str> = class.methods.keys().collect();
                let edges = edges_by_class
                    .get(class_name)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let plan = ClassMethodPlan::new(class_name, &handlers, edges, cap);
                for slot in plan.slots.iter().filter(|slot| slot.truncated) {
                    diagnostics.record(Diagnostic::PermutationsTruncated {
                        scope: format!("handlers of class {class_name}"),
                        members: slot.members.clone(),
                        limit: slot.len(),
                    });
                }
                plan
            })
            .collect();

        Self { classes }
    }

    #[must_use]
    pub fn class(&self, class_name: &str) -> Option<&ClassMethodPlan> {
        self.classes.iter().find(|plan| plan.class_name == class_name)
    }

    /// Number of cross-class combinations, or `None` on overflow.
    #[must_use]
    pub fn combination_count(&self) -> Option<u128> {
        self.classes
            .iter()
            .try_fold(1u128, |total, class| total.checked_mul(class.ordering_count()?))
    }

    /// Every combination of one ordering per class, last class varying fastest.
    pub fn orderings(&self) -> impl Iterator<Item = MethodPriorities> + '_ {
        let radices = self
            .classes
            .iter()
            .flat_map(|class| class.slots.iter().map(PermutationSlot::len))
            .collect();

        index_product(radices).map(move |digits| {
            let mut rest = digits.as_slice();
            self.classes
                .iter()
                .map(|class| {
                    let (mine, tail) = rest.split_at(class.slots.len().min(rest.len()));
                    rest = tail;
                    (class.class_name.clone(), class.ordering_for(mine))
                })
                .collect::<MethodPriorities>()
        })
    }
}
