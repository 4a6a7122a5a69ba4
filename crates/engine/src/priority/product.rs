//! Lazy cross products over permutation slots.

use std::iter;

use itertools::{Either, Itertools};
use serde::{Deserialize, Serialize};

/// All orderings of one group or handler component, possibly capped.
///
/// Only the members are stored. The permutation for a given rank is built
/// on demand, so planning costs nothing per permutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationSlot {
    pub members: Vec<String>,
    /// `members.len()!`, or `None` beyond `u128`.
    pub total: Option<u128>,
    pub truncated: bool,
    len: usize,
}

impl PermutationSlot {
    /// Slot over the permutations of `members` in lexicographic index order,
    /// keeping at most `cap`.
    #[must_use]
    pub fn new(members: Vec<String>, cap: Option<usize>) -> Self {
        let total = factorial(members.len());
        let available = total.map_or(usize::MAX, |total| {
            usize::try_from(total).unwrap_or(usize::MAX)
        });
        let (len, truncated) = match cap {
            Some(cap) => (
                available.min(cap),
                total.is_none_or(|total| u128::try_from(cap).is_ok_and(|cap| total > cap)),
            ),
            None => (available, false),
        };

        Self {
            members,
            total,
            truncated,
            len,
        }
    }

    /// Number of permutations handed out.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of permutations counted, or `None` beyond `u128`.
    ///
    /// Equals [`Self::len`] unless the factorial exceeds `usize`.
    #[must_use]
    pub fn size(&self) -> Option<u128> {
        if self.truncated {
            u128::try_from(self.len).ok()
        } else {
            self.total
        }
    }

    /// The permutation of lexicographic rank `rank`, or `None` past the end.
    #[must_use]
    pub fn permutation(&self, rank: usize) -> Option<Vec<&String>> {
        (rank < self.len).then(|| unrank(&self.members, rank))
    }
}

/// `n!`, or `None` on overflow.
fn factorial(n: usize) -> Option<u128> {
    (1..=n).try_fold(1u128, |total, k| total.checked_mul(u128::try_from(k).ok()?))
}

/// Decode `rank` in the factorial number system. Leading blocks larger than
/// any `usize` rank always pick the first remaining member.
fn unrank(members: &[String], rank: usize) -> Vec<&String> {
    let mut pool: Vec<&String> = members.iter().collect();
    let mut rank = u128::try_from(rank).unwrap_or(0);
    let mut chosen = Vec::with_capacity(pool.len());

    while !pool.is_empty() {
        let remaining = pool.len().saturating_sub(1);
        let index = factorial(remaining)
            .and_then(|block| {
                let index = rank.checked_div(block)?;
                rank = rank.checked_rem(block)?;
                usize::try_from(index).ok()
            })
            .map_or(0, |index| index.min(remaining));
        chosen.push(pool.remove(index));
    }
    chosen
}

/// Every digit vector `d` with `d[i] < radices[i]`, last digit fastest.
///
/// An empty radix list yields exactly one empty vector.
pub(crate) fn index_product(radices: Vec<usize>) -> impl Iterator<Item = Vec<usize>> {
    if radices.is_empty() {
        Either::Left(iter::once(Vec::new()))
    } else {
        Either::Right(
            radices
                .into_iter()
                .map(|radix| 0..radix)
                .multi_cartesian_product(),
        )
    }
}

/// Concatenate the chosen permutation of each slot.
pub(crate) fn flatten_choice<'a>(
    slots: &'a [PermutationSlot],
    digits: &[usize],
) -> Vec<&'a String> {
    slots
        .iter()
        .zip(digits)
        .filter_map(|(slot, digit)| slot.permutation(*digit))
        .flatten()
        .collect()
}

/// Number of combinations across `slots`, or `None` on overflow.
pub(crate) fn combination_count(slots: &[PermutationSlot]) -> Option<u128> {
    slots
        .iter()
        .try_fold(1u128, |total, slot| total.checked_mul(slot.size()?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn ranked(slot: &PermutationSlot, rank: usize) -> Vec<&str> {
        slot.permutation(rank)
            .unwrap()
            .into_iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn given_three_members_when_permuted_then_six_in_lexicographic_order() {
        let slot = PermutationSlot::new(names(&["a", "b", "c"]), None);
        assert_eq!(slot.len(), 6);
        assert_eq!(ranked(&slot, 0), vec!["a", "b", "c"]);
        assert_eq!(ranked(&slot, 1), vec!["a", "c", "b"]);
        assert_eq!(ranked(&slot, 5), vec!["c", "b", "a"]);
        assert!(slot.permutation(6).is_none());
        assert!(!slot.truncated);
    }

    #[test]
    fn given_members_when_unranked_then_matches_itertools_order() {
        let members = names(&["a", "b", "c", "d"]);
        let slot = PermutationSlot::new(members.clone(), None);
        let expected: Vec<Vec<&String>> = members.iter().permutations(members.len()).collect();

        let unranked: Vec<Vec<&String>> = (0..slot.len())
            .map(|rank| slot.permutation(rank).unwrap())
            .collect();
        assert_eq!(unranked, expected);
    }

    #[test]
    fn given_thirty_members_when_planned_then_nothing_is_enumerated_up_front() {
        let members: Vec<String> = (0..30).map(|i| format!("m{i:02}")).collect();
        let slot = PermutationSlot::new(members, None);

        assert_eq!(slot.len(), usize::MAX);
        assert_eq!(slot.size(), (1..=30u128).try_fold(1u128, u128::checked_mul));
        assert_eq!(ranked(&slot, 0)[29], "m29");
        assert_eq!(ranked(&slot, 1)[28..], ["m29", "m28"]);
    }

    #[test]
    fn given_factorial_beyond_u128_when_capped_then_truncated_with_cap_size() {
        let members: Vec<String> = (0..40).map(|i| format!("m{i}")).collect();
        let slot = PermutationSlot::new(members, Some(3));

        assert_eq!(slot.total, None);
        assert!(slot.truncated);
        assert_eq!(slot.size(), Some(3));
    }

    #[test]
    fn given_cap_below_count_when_permuted_then_truncated() {
        let slot = PermutationSlot::new(names(&["a", "b", "c"]), Some(4));
        assert_eq!(slot.len(), 4);
        assert!(slot.truncated);

        let exact = PermutationSlot::new(names(&["a", "b"]), Some(2));
        assert!(!exact.truncated);
    }

    #[test]
    fn given_no_radices_when_multiplied_then_one_empty_combination() {
        let all: Vec<Vec<usize>> = index_product(Vec::new()).collect();
        assert_eq!(all, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn given_radices_when_multiplied_then_last_digit_varies_fastest() {
        let all: Vec<Vec<usize>> = index_product(vec![2, 3]).collect();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], vec![0, 0]);
        assert_eq!(all[1], vec![0, 1]);
        assert_eq!(all[3], vec![1, 0]);
    }

    #[test]
    fn given_slots_when_flattened_then_choices_concatenate() {
        let slots = vec![
            PermutationSlot::new(names(&["a", "b"]), None),
            PermutationSlot::new(names(&["c"]), None),
        ];
        let flat: Vec<&str> = flatten_choice(&slots, &[1, 0])
            .into_iter()
            .map(String::as_str)
            .collect();
        assert_eq!(flat, vec!["b", "a", "c"]);
        assert_eq!(combination_count(&slots), Some(2));
    }
}
