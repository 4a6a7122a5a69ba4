//! End-to-end generation.
//!
//! [`Generator::plan`] runs graph building, dependency analysis, grouping and
//! priority planning once. The resulting [`GenerationPlan`] emits test cases
//! lazily and summarizes every stage in a [`GenerationReport`].

use std::collections::BTreeMap;

use rebtest_core::{AnalysisResult, GeneratorConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dependency::{ActorDependency, ActorDependencyGraph, CausalityOracle, NoKnownCausalPath};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::emit::{TestCase, emit_test_cases};
use crate::erdg::{Erdg, ErdgSummary};
use crate::error::EngineResult;
use crate::grouping::{ActorGroup, GroupGraph, find_actor_groups};
use crate::priority::{ActorPriorityPlan, MethodPriorityPlan};

/// Runs the generation stages with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Generator<O = NoKnownCausalPath> {
    config: GeneratorConfig,
    oracle: O,
}

impl Generator {
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            oracle: NoKnownCausalPath,
        }
    }
}

impl<O: CausalityOracle> Generator<O> {
    /// Replace the causality oracle used by the dependency analyzer.
    #[must_use]
    pub fn with_oracle<P: CausalityOracle>(self, oracle: P) -> Generator<P> {
        Generator {
            config: self.config,
            oracle,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run every stage up to, but not including, test case emission.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the analysis violates its
    /// contract, or if the group graph has a cycle under the reject policy.
    pub fn plan(&self, analysis: &AnalysisResult) -> EngineResult<GenerationPlan> {
        self.config.validate()?;
        analysis.validate()?;

        let mut diagnostics = Diagnostics::new();
        let erdg = Erdg::build(analysis, &mut diagnostics);
        let dependencies =
            ActorDependencyGraph::build(&erdg, &self.oracle, self.config.ignore_self_targets);
        let groups = find_actor_groups(&dependencies);

        let mut group_graph = GroupGraph::build(&groups, &erdg, analysis);
        let group_order = group_graph.order(&groups, self.config.cycle_policy, &mut diagnostics)?;

        let cap = self.config.max_permutations_per_group;
        let actor_plan = ActorPriorityPlan::new(&groups, &group_order, cap, &mut diagnostics);
        let method_plan = MethodPriorityPlan::new(analysis, &erdg, cap, &mut diagnostics);

        let expected = actor_plan
            .assignment_count()
            .zip(method_plan.combination_count())
            .and_then(|(actors, methods)| actors.checked_mul(methods));
        if let Some(limit) = self.config.max_test_cases {
            let exceeds = expected.is_none_or(|count| count > limit as u128);
            if exceeds {
                diagnostics.record(Diagnostic::TestCasesTruncated { limit });
            }
        }

        info!(
            groups = groups.len(),
            order = ?group_order,
            expected_test_cases = ?expected,
            diagnostics = diagnostics.len(),
            "Planned test generation"
        );

        Ok(GenerationPlan {
            erdg,
            dependencies,
            groups,
            group_graph,
            group_order,
            actor_plan,
            method_plan,
            diagnostics,
            expected_test_cases: expected,
            max_test_cases: self.config.max_test_cases,
        })
    }
}

/// Everything derived from one analysis, ready to emit test cases.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    erdg: Erdg,
    dependencies: ActorDependencyGraph,
    groups: Vec<ActorGroup>,
    group_graph: GroupGraph,
    group_order: Vec<usize>,
    actor_plan: ActorPriorityPlan,
    method_plan: MethodPriorityPlan,
    diagnostics: Diagnostics,
    expected_test_cases: Option<u128>,
    max_test_cases: Option<usize>,
}

impl GenerationPlan {
    #[must_use]
    pub const fn erdg(&self) -> &Erdg {
        &self.erdg
    }

    #[must_use]
    pub const fn dependencies(&self) -> &ActorDependencyGraph {
        &self.dependencies
    }

    #[must_use]
    pub fn groups(&self) -> &[ActorGroup] {
        &self.groups
    }

    #[must_use]
    pub const fn group_graph(&self) -> &GroupGraph {
        &self.group_graph
    }

    #[must_use]
    pub fn group_order(&self) -> &[usize] {
        &self.group_order
    }

    #[must_use]
    pub const fn actor_plan(&self) -> &ActorPriorityPlan {
        &self.actor_plan
    }

    #[must_use]
    pub const fn method_plan(&self) -> &MethodPriorityPlan {
        &self.method_plan
    }

    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Size of the full cross product, or `None` if it overflows `u128`.
    #[must_use]
    pub const fn expected_test_cases(&self) -> Option<u128> {
        self.expected_test_cases
    }

    /// Test cases in emission order, stopping at `max_test_cases`.
    pub fn test_cases(&self) -> impl Iterator<Item = TestCase> + '_ {
        emit_test_cases(&self.actor_plan, &self.method_plan)
            .take(self.max_test_cases.unwrap_or(usize::MAX))
    }

    /// Summary of every stage for inspection.
    #[must_use]
    pub fn report(&self) -> GenerationReport {
        let handler_components = self
            .method_plan
            .classes
            .iter()
            .map(|class| {
                let components = class.components().map(<[String]>::to_vec).collect();
                (class.class_name.clone(), components)
            })
            .collect();

        let method_orderings = self
            .method_plan
            .classes
            .iter()
            .map(|class| (class.class_name.clone(), class.ordering_count()))
            .collect();

        GenerationReport {
            erdg: self.erdg.summary(),
            actor_dependencies: self.dependencies.dependencies(),
            actor_groups: self.groups.clone(),
            group_edges: self.group_graph.edges(),
            removed_group_edges: self.group_graph.removed_edges().to_vec(),
            group_order: self.group_order.clone(),
            handler_components,
            counts: GenerationCounts {
                actor_assignments: self.actor_plan.assignment_count(),
                method_orderings,
                expected_test_cases: self.expected_test_cases,
                emitted_test_cases: self.emitted_test_cases(),
            },
            diagnostics: self.diagnostics.clone(),
        }
    }

    fn emitted_test_cases(&self) -> Option<u128> {
        let limit = self.max_test_cases.map(|limit| limit as u128);
        match (self.expected_test_cases, limit) {
            (Some(expected), Some(limit)) => Some(expected.min(limit)),
            (expected, None) => expected,
            (None, limit) => limit,
        }
    }
}

/// Counts of every enumeration. `None` marks a count beyond `u128`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationCounts {
    pub actor_assignments: Option<u128>,
    pub method_orderings: BTreeMap<String, Option<u128>>,
    pub expected_test_cases: Option<u128>,
    pub emitted_test_cases: Option<u128>,
}

/// Serializable summary of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub erdg: ErdgSummary,
    pub actor_dependencies: Vec<ActorDependency>,
    pub actor_groups: Vec<ActorGroup>,
    pub group_edges: Vec<(usize, usize)>,
    pub removed_group_edges: Vec<(usize, usize)>,
    pub group_order: Vec<usize>,
    pub handler_components: BTreeMap<String, Vec<Vec<String>>>,
    pub counts: GenerationCounts,
    pub diagnostics: Diagnostics,
}
