//! Actor priority assignments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::product::{PermutationSlot, combination_count, flatten_choice, index_product};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::grouping::ActorGroup;

/// Instance name to priority, numbered 1..=n.
pub type PriorityAssignment = BTreeMap<String, u32>;

/// Permutation slots of every actor group, in group order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorPriorityPlan {
    pub group_order: Vec<usize>,
    pub slots: Vec<PermutationSlot>,
}

impl ActorPriorityPlan {
    /// Plan the assignments for `groups` taken in `group_order`.
    ///
    /// Groups larger than one instance contribute every permutation of their
    /// members, up to `cap`.
    pub fn new(
        groups: &[ActorGroup],
        group_order: &[usize],
        cap: Option<usize>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let slots = group_order
            .iter()
            .filter_map(|index| groups.get(*index))
            .map(|group| {
                let slot = PermutationSlot::new(group.members.clone(), cap);
                if slot.truncated {
                    diagnostics.record(Diagnostic::PermutationsTruncated {
                        scope: format!("actor group {}", group.index),
                        members: group.members.clone(),
                        limit: slot.len(),
                    });
                }
                slot
            })
            .collect();

        Self {
            group_order: group_order.to_vec(),
            slots,
        }
    }

    /// Number of assignments, or `None` if it overflows `u128`.
    #[must_use]
    pub fn assignment_count(&self) -> Option<u128> {
        combination_count(&self.slots)
    }

    /// Every assignment, earliest group in group order varying fastest.
    ///
    /// Within one assignment, priorities run consecutively through the groups
    /// in group order, so group `k` always receives the same priority range.
    pub fn assignments(&self) -> impl Iterator<Item = PriorityAssignment> + '_ {
        let radices = self.slots.iter().rev().map(PermutationSlot::len).collect();
        index_product(radices).map(move |mut digits| {
            digits.reverse();
            (1u32..)
                .zip(flatten_choice(&self.slots, &digits))
                .map(|(priority, name)| (name.clone(), priority))
                .collect::<PriorityAssignment>()
        })
    }
}
