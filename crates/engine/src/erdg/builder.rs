//! ERDG construction from an [`AnalysisResult`].

use petgraph::graph::NodeIndex;
use rebtest_core::model::SELF_TARGET;
use rebtest_core::{AnalysisResult, InstanceDecl, SendStatement};
use tracing::{debug, info};

use super::{ActivationNode, EdgeKind, Erdg, ErdgNode, MessageServerNode, RebecNode, data_dep};
use crate::diagnostics::{Diagnostic, Diagnostics};

impl Erdg {
    /// Build the ERDG for one analysis.
    ///
    /// Unresolvable sends and missing classes are recorded in `diagnostics`
    /// and skipped; building never fails.
    pub fn build(analysis: &AnalysisResult, diagnostics: &mut Diagnostics) -> Self {
        let mut builder = ErdgBuilder {
            analysis,
            erdg: Self::default(),
            diagnostics,
        };
        builder.add_rebecs();
        builder.add_message_servers();
        builder.add_activations();
        data_dep::add_data_dependencies(&mut builder.erdg, analysis, builder.diagnostics);

        let erdg = builder.erdg;
        info!(
            rebecs = erdg.rebecs().count(),
            message_servers = erdg.message_servers().count(),
            activations = erdg.activations().count(),
            data_deps = erdg.edge_count_of(EdgeKind::DataDep),
            "Built ERDG"
        );
        erdg
    }
}

struct ErdgBuilder<'a> {
    analysis: &'a AnalysisResult,
    erdg: Erdg,
    diagnostics: &'a mut Diagnostics,
}

impl ErdgBuilder<'_> {
    fn add_rebecs(&mut self) {
        for instance in &self.analysis.main_instances {
            self.erdg.add_node(ErdgNode::Rebec(RebecNode {
                name: instance.name.clone(),
                class_name: instance.class_name.clone(),
                priority: instance.priority,
                arg: instance.arg.clone(),
            }));
        }
    }

    fn add_message_servers(&mut self) {
        let analysis = self.analysis;
        for instance in &analysis.main_instances {
            let Some(class) = analysis.class(&instance.class_name) else {
                self.diagnostics.record(Diagnostic::MissingActorClass {
                    instance: instance.name.clone(),
                    class_name: instance.class_name.clone(),
                });
                continue;
            };

            let Some(rebec) = self.rebec_index(&instance.name) else {
                continue;
            };

            for (handler, method) in class.methods.iter() {
                let server = self.erdg.add_node(ErdgNode::MessageServer(MessageServerNode {
                    instance: instance.name.clone(),
                    handler: handler.to_string(),
                    priority: method.priority,
                }));
                self.erdg.add_edge(rebec, server, EdgeKind::Owns);
                debug!(instance = %instance.name, handler, "Added message server");
            }
        }
    }

    fn add_activations(&mut self) {
        let analysis = self.analysis;
        for sender in &analysis.main_instances {
            // Already reported while adding message servers.
            let Some(class) = analysis.class(&sender.class_name) else {
                continue;
            };

            for (handler, method) in class.methods.iter() {
                for (ordinal, send) in method.sends.iter().enumerate() {
                    self.add_activation(sender, handler, ordinal, send);
                }
            }
        }
    }

    fn add_activation(
        &mut self,
        sender: &InstanceDecl,
        handler: &str,
        ordinal: usize,
        send: &SendStatement,
    ) {
        let Some(target) = resolve_target(self.analysis, sender, &send.target) else {
            self.diagnostics.record(Diagnostic::UnresolvedTarget {
                instance: sender.name.clone(),
                handler: handler.to_string(),
                target: send.target.clone(),
                message: send.message.clone(),
            });
            return;
        };

        let declared = self
            .analysis
            .class(&target.class_name)
            .is_some_and(|class| class.methods.contains_key(&send.message));
        if !declared {
            self.diagnostics.record(Diagnostic::UnknownMessage {
                instance: sender.name.clone(),
                handler: handler.to_string(),
                target_instance: target.name.clone(),
                target_class: target.class_name.clone(),
                message: send.message.clone(),
            });
            return;
        }

        let source_server = ErdgNode::MessageServer(MessageServerNode::new(&sender.name, handler));
        let target_server =
            ErdgNode::MessageServer(MessageServerNode::new(&target.name, &send.message));
        let (Some(source_server), Some(target_server), Some(target_rebec)) = (
            self.erdg.node_index(&source_server),
            self.erdg.node_index(&target_server),
            self.rebec_index(&target.name),
        ) else {
            return;
        };

        let activation = ActivationNode {
            sender: sender.name.clone(),
            sender_handler: handler.to_string(),
            target: target.name.clone(),
            message: send.message.clone(),
            ordinal,
        };
        debug!(%activation, "Added activation");
        let activation = self.erdg.add_node(ErdgNode::Activation(activation));
        self.erdg.add_edge(source_server, activation, EdgeKind::Triggers);
        self.erdg.add_edge(activation, target_rebec, EdgeKind::Targets);
        self.erdg.add_edge(activation, target_server, EdgeKind::Invokes);
    }

    fn rebec_index(&self, name: &str) -> Option<NodeIndex> {
        self.erdg.node_index(&ErdgNode::Rebec(RebecNode::named(name)))
    }
}

/// Resolve a textual send target to an instance.
///
/// Tried in order: the literal `self`, exact instance name, instance name
/// ignoring case, then the first instance whose class matches ignoring case.
pub fn resolve_target<'a>(
    analysis: &'a AnalysisResult,
    sender: &'a InstanceDecl,
    token: &str,
) -> Option<&'a InstanceDecl> {
    let instances = &analysis.main_instances;
    if token == SELF_TARGET {
        return Some(sender);
    }
    instances
        .iter()
        .find(|instance| instance.name == token)
        .or_else(|| {
            instances
                .iter()
                .find(|instance| instance.name.eq_ignore_ascii_case(token))
        })
        .or_else(|| {
            instances
                .iter()
                .find(|instance| instance.class_name.eq_ignore_ascii_case(token))
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rebtest_core::{ActorClass, MethodSummary};

    use super::*;

    fn ping_pong() -> AnalysisResult {
        AnalysisResult::new()
            .with_class(
                "Pinger",
                ActorClass::new()
                    .with_method("pinger", MethodSummary::new().with_send("self", "ping"))
                    .with_method("ping", MethodSummary::new().with_send("ponger", "pong")),
            )
            .with_class(
                "Ponger",
                ActorClass::new().with_method("pong", MethodSummary::new().with_send("Pinger", "ping")),
            )
            .with_instance(InstanceDecl::new("pinger", "Pinger"))
            .with_instance(InstanceDecl::new("ponger", "Ponger"))
    }

    #[test]
    fn given_each_target_form_when_resolved_then_chain_order_applies() {
        let analysis = ping_pong();
        let sender = &analysis.main_instances[0];

        assert_eq!(resolve_target(&analysis, sender, "self").unwrap().name, "pinger");
        assert_eq!(resolve_target(&analysis, sender, "ponger").unwrap().name, "ponger");
        assert_eq!(resolve_target(&analysis, sender, "PONGER").unwrap().name, "ponger");
        assert!(resolve_target(&analysis, sender, "pongr").is_none());
    }

    #[test]
    fn given_instance_named_upper_self_when_resolved_then_only_lowercase_means_sender() {
        let analysis = AnalysisResult::new()
            .with_class("Node", ActorClass::new())
            .with_instance(InstanceDecl::new("a", "Node"))
            .with_instance(InstanceDecl::new("SELF", "Node"));
        let sender = &analysis.main_instances[0];

        assert_eq!(resolve_target(&analysis, sender, "self").unwrap().name, "a");
        assert_eq!(resolve_target(&analysis, sender, "SELF").unwrap().name, "SELF");
        assert_eq!(resolve_target(&analysis, sender, "Self").unwrap().name, "SELF");
    }

    #[test]
    fn given_class_token_when_resolved_then_first_instance_of_class_wins() {
        let analysis = AnalysisResult::new()
            .with_class("Worker", ActorClass::new())
            .with_instance(InstanceDecl::new("boss", "Boss"))
            .with_instance(InstanceDecl::new("w1", "Worker"))
            .with_instance(InstanceDecl::new("w2", "Worker"));
        let sender = &analysis.main_instances[0];
        assert_eq!(resolve_target(&analysis, sender, "worker").unwrap().name, "w1");
    }

    #[test]
    fn given_ping_pong_when_built_then_all_edge_kinds_present() {
        let mut diagnostics = Diagnostics::new();
        let erdg = Erdg::build(&ping_pong(), &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(erdg.rebecs().count(), 2);
        assert_eq!(erdg.message_servers().count(), 3);
        assert_eq!(erdg.activations().count(), 3);
        assert_eq!(erdg.edge_count_of(EdgeKind::Owns), 3);
        assert_eq!(erdg.edge_count_of(EdgeKind::Triggers), 3);
        assert_eq!(erdg.edge_count_of(EdgeKind::Targets), 3);
        assert_eq!(erdg.edge_count_of(EdgeKind::Invokes), 3);
    }

    #[test]
    fn given_repeated_identical_sends_when_built_then_activations_stay_distinct() {
        let analysis = AnalysisResult::new()
            .with_class(
                "A",
                ActorClass::new().with_method(
                    "go",
                    MethodSummary::new().with_send("self", "go").with_send("self", "go"),
                ),
            )
            .with_instance(InstanceDecl::new("a", "A"));
        let mut diagnostics = Diagnostics::new();
        let erdg = Erdg::build(&analysis, &mut diagnostics);
        assert_eq!(erdg.activations().count(), 2);
        assert_eq!(erdg.edge_count_of(EdgeKind::Triggers), 2);
    }

    #[test]
    fn given_message_not_declared_on_target_when_built_then_send_skipped() {
        let analysis = AnalysisResult::new()
            .with_class("A", ActorClass::new().with_method("go", MethodSummary::new().with_send("b", "missing")))
            .with_class("B", ActorClass::new().with_method("run", MethodSummary::new()))
            .with_instance(InstanceDecl::new("a", "A"))
            .with_instance(InstanceDecl::new("b", "B"));
        let mut diagnostics = Diagnostics::new();
        let erdg = Erdg::build(&analysis, &mut diagnostics);

        assert_eq!(erdg.activations().count(), 0);
        assert_eq!(diagnostics.of_kind("unknown_message").count(), 1);
    }

    #[test]
    fn given_instance_of_unknown_class_when_built_then_only_its_rebec_exists() {
        let analysis = AnalysisResult::new()
            .with_class("A", ActorClass::new().with_method("go", MethodSummary::new().with_send("ghost", "boo")))
            .with_instance(InstanceDecl::new("a", "A"))
            .with_instance(InstanceDecl::new("ghost", "Ghost"));
        let mut diagnostics = Diagnostics::new();
        let erdg = Erdg::build(&analysis, &mut diagnostics);

        assert_eq!(erdg.rebecs().count(), 2);
        assert_eq!(erdg.rebec("ghost").unwrap().class_name, "Ghost");
        assert!(erdg.rebec("phantom").is_none());
        assert_eq!(erdg.message_servers().count(), 1);
        assert_eq!(diagnostics.of_kind("missing_actor_class").count(), 1);
        assert_eq!(diagnostics.of_kind("unknown_message").count(), 1);
    }
}
