//! # Event-Rebec Dependency Graph (ERDG)
//!
//! Directed graph of rebec instances, message servers and send activations
//! using petgraph. Five edge relations connect them:
//!
//! | kind       | from           | to             |
//! |------------|----------------|----------------|
//! | `Owns`     | rebec          | message server |
//! | `Triggers` | message server | activation     |
//! | `Targets`  | activation     | rebec          |
//! | `Invokes`  | activation     | message server |
//! | `DataDep`  | message server | message server |
//!
//! The graph is built once per run by [`Erdg::build`] and never mutated
//! afterwards.

mod builder;
mod data_dep;

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

pub use builder::resolve_target;
pub use data_dep::{DataDependency, scan_instance};

/// One actor instance.
///
/// Identity is the instance name.
#[derive(Debug, Clone, Serialize)]
pub struct RebecNode {
    pub name: String,
    pub class_name: String,
    pub priority: Option<i32>,
    pub arg: Option<String>,
}

impl RebecNode {
    /// Lookup key for the rebec named `name`.
    pub(crate) fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            class_name: String::new(),
            priority: None,
            arg: None,
        }
    }
}

impl PartialEq for RebecNode {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RebecNode {}

impl Hash for RebecNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for RebecNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One handler exposed by an instance.
///
/// Identity is the (instance, handler) pair.
#[derive(Debug, Clone, Serialize)]
pub struct MessageServerNode {
    pub instance: String,
    pub handler: String,
    pub priority: Option<i32>,
}

impl MessageServerNode {
    pub fn new(instance: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            handler: handler.into(),
            priority: None,
        }
    }
}

impl PartialEq for MessageServerNode {
    fn eq(&self, other: &Self) -> bool {
        self.instance == other.instance && self.handler == other.handler
    }
}

impl Eq for MessageServerNode {}

impl Hash for MessageServerNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instance.hash(state);
        self.handler.hash(state);
    }
}

impl fmt::Display for MessageServerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.instance, self.handler)
    }
}

/// One send statement occurrence.
///
/// `ordinal` is the position of the send in the sender handler's send list,
/// so repeated identical sends from one handler stay distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActivationNode {
    pub sender: String,
    pub sender_handler: String,
    pub target: String,
    pub message: String,
    pub ordinal: usize,
}

impl fmt::Display for ActivationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}[{}] -> {}.{}",
            self.sender, self.sender_handler, self.ordinal, self.target, self.message
        )
    }
}

/// A node of the ERDG.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErdgNode {
    Rebec(RebecNode),
    MessageServer(MessageServerNode),
    Activation(ActivationNode),
}

impl fmt::Display for ErdgNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rebec(node) => node.fmt(f),
            Self::MessageServer(node) => node.fmt(f),
            Self::Activation(node) => node.fmt(f),
        }
    }
}

/// Edge relations of the ERDG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Owns,
    Triggers,
    Targets,
    Invokes,
    DataDep,
}

/// Edge lists of one relation, rendered as display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSummary {
    pub owns: Vec<(String, String)>,
    pub triggers: Vec<(String, String)>,
    pub targets: Vec<(String, String)>,
    pub invokes: Vec<(String, String)>,
    pub data_dep: Vec<(String, String)>,
}

/// Human-readable view of the whole ERDG.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErdgSummary {
    pub rebec_nodes: Vec<String>,
    pub message_server_nodes: Vec<String>,
    pub activation_nodes: Vec<String>,
    pub edges: EdgeSummary,
}

/// The dependency graph of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct Erdg {
    graph: DiGraph<ErdgNode, EdgeKind>,
    node_map: HashMap<ErdgNode, NodeIndex>,
}

impl Erdg {
    /// Add a node, returning the existing index if an equal node is present.
    pub(crate) fn add_node(&mut self, node: ErdgNode) -> NodeIndex {
        if let Some(index) = self.node_map.get(&node) {
            return *index;
        }
        let index = self.graph.add_node(node.clone());
        self.node_map.insert(node, index);
        index
    }

    /// Add an edge unless one of the same kind already connects the nodes.
    pub(crate) fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> bool {
        if self
            .graph
            .edges_connecting(from, to)
            .any(|edge| *edge.weight() == kind)
        {
            return false;
        }
        self.graph.add_edge(from, to, kind);
        true
    }

    #[must_use]
    pub fn node_index(&self, node: &ErdgNode) -> Option<NodeIndex> {
        self.node_map.get(node).copied()
    }

    /// The rebec node of instance `name`.
    #[must_use]
    pub fn rebec(&self, name: &str) -> Option<&RebecNode> {
        let index = self.node_index(&ErdgNode::Rebec(RebecNode::named(name)))?;
        match self.graph.node_weight(index)? {
            ErdgNode::Rebec(rebec) => Some(rebec),
            _ => None,
        }
    }

    /// Rebec nodes in declaration order.
    pub fn rebecs(&self) -> impl Iterator<Item = &RebecNode> {
        self.graph.node_weights().filter_map(|node| match node {
            ErdgNode::Rebec(rebec) => Some(rebec),
            _ => None,
        })
    }

    /// Message server nodes in creation order.
    pub fn message_servers(&self) -> impl Iterator<Item = &MessageServerNode> {
        self.graph.node_weights().filter_map(|node| match node {
            ErdgNode::MessageServer(server) => Some(server),
            _ => None,
        })
    }

    /// Activation nodes in creation order.
    pub fn activations(&self) -> impl Iterator<Item = &ActivationNode> {
        self.graph.node_weights().filter_map(|node| match node {
            ErdgNode::Activation(activation) => Some(activation),
            _ => None,
        })
    }

    /// All edges in insertion order as (from, to, kind).
    pub fn edges(&self) -> impl Iterator<Item = (&ErdgNode, &ErdgNode, EdgeKind)> {
        self.graph.edge_references().filter_map(move |edge| {
            let from = self.graph.node_weight(edge.source())?;
            let to = self.graph.node_weight(edge.target())?;
            Some((from, to, *edge.weight()))
        })
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = (&ErdgNode, &ErdgNode)> {
        self.edges()
            .filter(move |(_, _, edge_kind)| *edge_kind == kind)
            .map(|(from, to, _)| (from, to))
    }

    /// `DataDep` edges as (writer, dependent) message server pairs.
    pub fn data_dependencies(
        &self,
    ) -> impl Iterator<Item = (&MessageServerNode, &MessageServerNode)> {
        self.edges_of_kind(EdgeKind::DataDep)
            .filter_map(|(from, to)| match (from, to) {
                (ErdgNode::MessageServer(from), ErdgNode::MessageServer(to)) => Some((from, to)),
                _ => None,
            })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn edge_count_of(&self, kind: EdgeKind) -> usize {
        self.edges_of_kind(kind).count()
    }

    #[must_use]
    pub fn summary(&self) -> ErdgSummary {
        let pairs = |kind| {
            self.edges_of_kind(kind)
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect()
        };

        ErdgSummary {
            rebec_nodes: self
                .rebecs()
                .map(|rebec| format!("{} ({})", rebec.name, rebec.class_name))
                .collect(),
            message_server_nodes: self.message_servers().map(ToString::to_string).collect(),
            activation_nodes: self.activations().map(ToString::to_string).collect(),
            edges: EdgeSummary {
                owns: pairs(EdgeKind::Owns),
                triggers: pairs(EdgeKind::Triggers),
                targets: pairs(EdgeKind::Targets),
                invokes: pairs(EdgeKind::Invokes),
                data_dep: pairs(EdgeKind::DataDep),
            },
        }
    }
}
