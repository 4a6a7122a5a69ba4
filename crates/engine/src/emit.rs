//! # Test Case Emitter
//!
//! Crosses every actor assignment with every combination of class handler
//! orderings. Test cases are produced on demand and numbered from 1.
//! Identical test cases reached along different paths are kept.

use serde::{Deserialize, Serialize};

use crate::priority::{ActorPriorityPlan, MethodPriorities, MethodPriorityPlan, PriorityAssignment};

/// One concrete scheduling configuration to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u64,
    pub actor_priorities: PriorityAssignment,
    pub method_priorities: MethodPriorities,
}

/// Lazily emit all test cases, actor assignment outermost.
pub fn emit_test_cases<'a>(
    actors: &'a ActorPriorityPlan,
    methods: &'a MethodPriorityPlan,
) -> impl Iterator<Item = TestCase> + 'a {
    actors
        .assignments()
        .flat_map(move |assignment| {
            methods
                .orderings()
                .map(move |method_priorities| (assignment.clone(), method_priorities))
        })
        .zip(1u64..)
        .map(|((actor_priorities, method_priorities), id)| TestCase {
            id,
            actor_priorities,
            method_priorities,
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::grouping::ActorGroup;
    use crate::priority::ClassMethodPlan;

    #[test]
    fn given_two_assignments_and_two_orderings_when_emitted_then_four_sequential_cases() {
        let groups = vec![ActorGroup {
            index: 0,
            members: vec!["a".to_string(), "b".to_string()],
        }];
        let actors = ActorPriorityPlan::new(&groups, &[0], None, &mut Diagnostics::new());
        let methods = MethodPriorityPlan {
            classes: vec![ClassMethodPlan::new("C", &["x", "y"], &[("x", "y")], None)],
        };

        let cases: Vec<TestCase> = emit_test_cases(&actors, &methods).collect();

        assert_eq!(cases.len(), 4);
        assert_eq!(cases.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(cases[0].actor_priorities, cases[1].actor_priorities);
        assert_ne!(cases[0].method_priorities, cases[1].method_priorities);
        assert_eq!(cases[0].actor_priorities["a"], 1);
        assert_eq!(cases[2].actor_priorities["a"], 2);
    }

    #[test]
    fn given_test_case_when_serialized_then_maps_are_keyed_by_name() {
        let case = TestCase {
            id: 7,
            actor_priorities: PriorityAssignment::from([("a".to_string(), 1)]),
            method_priorities: MethodPriorities::from([(
                "C".to_string(),
                [("go".to_string(), 1)].into_iter().collect(),
            )]),
        };
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["actor_priorities"]["a"], 1);
        assert_eq!(json["method_priorities"]["C"]["go"], 1);
    }
}
