//! # Priority Enumerator
//!
//! Enumerates actor priority assignments and per-class handler orderings.
//!
//! Both enumerations are products of factorials: a group of `k` instances
//! contributes `k!` assignments and a handler component of size `s`
//! contributes `s!` orderings. That growth is what guarantees coverage of
//! every undetermined order, so nothing is materialized up front. Both
//! plans hand out lazy iterators, and [`PermutationSlot`] can be capped
//! through `max_permutations_per_group`.

mod actors;
mod methods;
mod product;

pub use actors::{ActorPriorityPlan, PriorityAssignment};
pub use methods::{ClassMethodPlan, MethodOrdering, MethodPriorities, MethodPriorityPlan};
pub use product::PermutationSlot;
