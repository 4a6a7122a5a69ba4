//! # rebtest-engine
//!
//! Dependency-guided prioritized test generation for actor models.
//!
//! Stages, each consuming the previous one's output:
//!
//! 1. [`erdg`]: graph of instances, handlers and send activations.
//! 2. [`dependency`]: undirected actor-dependency graph.
//! 3. [`grouping`]: actor groups and their interference order.
//! 4. [`priority`]: actor priority assignments and handler orderings.
//! 5. [`emit`]: the cross product as test cases.
//!
//! [`Generator`] runs them in order. Recoverable reference problems are
//! collected in [`Diagnostics`] rather than failing the run.
//!
//! ```
//! use rebtest_core::{ActorClass, AnalysisResult, GeneratorConfig, InstanceDecl, MethodSummary};
//! use rebtest_engine::Generator;
//!
//! let analysis = AnalysisResult::new()
//!     .with_class("Client", ActorClass::new().with_method("go", MethodSummary::new().with_send("server", "serve")))
//!     .with_class("Server", ActorClass::new().with_method("serve", MethodSummary::new()))
//!     .with_instance(InstanceDecl::new("c1", "Client"))
//!     .with_instance(InstanceDecl::new("c2", "Client"))
//!     .with_instance(InstanceDecl::new("server", "Server"));
//!
//! let plan = Generator::new(GeneratorConfig::default()).plan(&analysis)?;
//! assert_eq!(plan.test_cases().count(), 2);
//! # Ok::<(), rebtest_engine::EngineError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod dependency;
pub mod diagnostics;
pub mod emit;
pub mod erdg;
pub mod error;
pub mod grouping;
pub mod pipeline;
pub mod priority;

pub use dependency::{ActorDependency, ActorDependencyGraph, CausalityOracle, NoKnownCausalPath};
pub use diagnostics::{DataAccess, Diagnostic, Diagnostics, Severity};
pub use emit::{TestCase, emit_test_cases};
pub use erdg::{
    ActivationNode, EdgeKind, Erdg, ErdgNode, ErdgSummary, MessageServerNode, RebecNode,
};
pub use error::{EngineError, EngineResult};
pub use grouping::{ActorGroup, GroupGraph, find_actor_groups};
pub use pipeline::{GenerationCounts, GenerationPlan, GenerationReport, Generator};
pub use priority::{
    ActorPriorityPlan, ClassMethodPlan, MethodOrdering, MethodPriorities, MethodPriorityPlan,
    PermutationSlot, PriorityAssignment,
};
