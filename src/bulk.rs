//! Module-wide bulk registration
//!
//! A `RegisterAll` marker names a contract and asks for every concrete type in
//! the module that implements it. The contract may be closed
//! (`IHandler<Order>`) or unbound (`IHandler<>`); an unbound contract captures
//! every closed form separately. Class contracts are matched through the base
//! chain when no interface matched.
//!
//! Candidates are scanned in declaration order so repeated passes over the
//! same snapshot produce identical output.

use crate::config::HostProfile;
use crate::descriptor::Registration;
use crate::graph::{DeclaredType, TypeGraph, TypeRef};
use crate::marker::{Marker, MarkerKind};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Expands `RegisterAll` markers against one type graph.
#[derive(Debug, Clone, Copy)]
pub struct BulkRegistrationExpander<'a> {
    graph: &'a TypeGraph,
    host: &'a HostProfile,
}

impl<'a> BulkRegistrationExpander<'a> {
    pub fn new(graph: &'a TypeGraph, host: &'a HostProfile) -> Self {
        Self { graph, host }
    }

    /// Expand every module-level marker, in declaration order.
    pub fn expand_all(&self) -> Vec<Registration> {
        self.graph
            .module_markers()
            .iter()
            .filter(|m| m.kind() == MarkerKind::RegisterAll)
            .flat_map(|m| self.expand(m))
            .collect()
    }

    /// Registrations for one `RegisterAll` marker.
    pub fn expand(&self, marker: &Marker) -> Vec<Registration> {
        let Some(contract) = marker.explicit_contract() else {
            #[cfg(feature = "logging")]
            debug!(
                target: "dependency_wiring",
                "RegisterAll marker without a contract, skipping"
            );
            return Vec::new();
        };

        let lifetime = marker.lifetime();
        let include_name = marker.includes_service_name();
        let contract_is_interface = self.contract_is_interface(contract);

        let mut registrations = Vec::new();
        for candidate in self.graph.types() {
            if candidate.is_abstract() || candidate.reference().index_key() == contract.index_key() {
                continue;
            }

            let mut matches = self.interface_matches(candidate, contract);
            if matches.is_empty() && !contract_is_interface {
                matches.extend(self.ancestor_match(candidate, contract));
            }

            registrations.extend(
                matches
                    .iter()
                    .filter_map(|matched| self.registration(candidate, matched, lifetime, include_name)),
            );
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_wiring",
            contract = %contract,
            unbound = contract.is_unbound(),
            lifetime = %lifetime,
            registrations = registrations.len(),
            "Expanded RegisterAll marker"
        );

        registrations
    }

    /// A contract counts as an interface when the graph or the reference says
    /// so. Unknown (broken) contracts also get the base-chain walk.
    fn contract_is_interface(&self, contract: &TypeRef) -> bool {
        match self.graph.find(contract) {
            Some(decl) => decl.is_interface(),
            None => contract.is_interface(),
        }
    }

    /// Closed contracts match once by qualified name; unbound contracts match
    /// every distinct closed form sharing their unbound name.
    fn interface_matches(&self, candidate: &DeclaredType, contract: &TypeRef) -> Vec<TypeRef> {
        let interfaces = self.graph.all_interfaces(candidate);

        if contract.is_unbound() {
            let unbound = contract.unbound_name();
            interfaces
                .into_iter()
                .filter(|iface| iface.is_generic() && iface.unbound_name() == unbound)
                .collect()
        } else {
            let qualified = contract.qualified_name();
            interfaces
                .into_iter()
                .find(|iface| iface.qualified_name() == qualified)
                .into_iter()
                .collect()
        }
    }

    fn ancestor_match(&self, candidate: &DeclaredType, contract: &TypeRef) -> Option<TypeRef> {
        let unbound = contract.is_unbound();
        let wanted = if unbound {
            contract.unbound_name()
        } else {
            contract.qualified_name()
        };

        self.graph
            .ancestors(candidate)
            .into_iter()
            .filter(|ancestor| !self.host.is_root_object(ancestor))
            .find(|ancestor| {
                if unbound {
                    ancestor.is_generic() && ancestor.unbound_name() == wanted
                } else {
                    ancestor.qualified_name() == wanted
                }
            })
    }

    /// Registration for one match, or `None` when a generic definition
    /// closes the contract over something other than its own parameters.
    fn registration(
        &self,
        candidate: &DeclaredType,
        matched: &TypeRef,
        lifetime: crate::Lifetime,
        include_name: bool,
    ) -> Option<Registration> {
        let (service, implementation) = if candidate.reference().is_unbound() {
            // Open on both sides only if the contract is `C<T..>` over exactly
            // the candidate's parameters, in order.
            if !forwards_parameters(candidate, matched) {
                #[cfg(feature = "logging")]
                debug!(
                    target: "dependency_wiring",
                    candidate = %candidate.reference(),
                    contract = %matched,
                    "Generic candidate does not forward its parameters, skipping"
                );
                return None;
            }
            (matched.unbound_name(), candidate.reference().unbound_name())
        } else {
            (
                matched.display_name(Some(candidate.namespace())),
                candidate.qualified_name(),
            )
        };

        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_wiring",
            service = %service,
            implementation = %implementation,
            "Bulk registration match"
        );

        Some(Registration {
            service_type: Some(service),
            implementation_type_name: implementation,
            lifetime,
            service_name: include_name.then(|| candidate.name().to_owned()),
        })
    }
}

fn forwards_parameters(candidate: &DeclaredType, matched: &TypeRef) -> bool {
    let params = candidate.type_params();
    let args = matched.args();
    args.len() == params.len()
        && args
            .iter()
            .zip(params)
            .all(|(arg, param)| arg.is_parameter() && arg.name() == param.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lifetime;

    fn handler_of(namespace: &str, arg: &str) -> TypeRef {
        TypeRef::interface("App", "IHandler").with_args([TypeRef::class(namespace, arg)])
    }

    fn handler_graph(rule: Marker) -> TypeGraph {
        TypeGraph::builder("App")
            .declare(DeclaredType::interface("App", "IHandler").generic(["T"]))
            .declare(DeclaredType::class("App", "OrderHandler").implements(handler_of("App", "Order")))
            .declare(DeclaredType::class("App", "UserHandler").implements(handler_of("App", "User")))
            .declare(
                DeclaredType::class("App", "AuditOrderHandler").implements(handler_of("App", "Order")),
            )
            .declare(
                DeclaredType::class("App", "AbstractHandler")
                    .abstract_()
                    .implements(handler_of("App", "Order")),
            )
            .declare(DeclaredType::class("App", "Unrelated"))
            .module_marker(rule)
            .build()
            .unwrap()
    }

    fn pairs(regs: &[Registration]) -> Vec<(&str, &str)> {
        regs.iter()
            .map(|r| {
                (
                    r.service_type.as_deref().unwrap_or_default(),
                    r.implementation_type_name.as_str(),
                )
            })
            .collect()
    }

    #[test]
    fn test_unbound_contract_matches_every_closed_form() {
        let graph = handler_graph(Marker::register_all(TypeRef::interface("App", "IHandler").unbound(1)));
        let regs = BulkRegistrationExpander::new(&graph, HostProfile::microsoft()).expand_all();

        assert_eq!(
            pairs(&regs),
            vec![
                ("App.IHandler<App.Order>", "App.OrderHandler"),
                ("App.IHandler<App.User>", "App.UserHandler"),
                ("App.IHandler<App.Order>", "App.AuditOrderHandler"),
            ]
        );
        assert!(regs.iter().all(|r| r.lifetime == Lifetime::Transient));
        assert!(regs.iter().all(|r| r.service_name.is_none()));
    }

    #[test]
    fn test_closed_contract_matches_exactly() {
        let graph = handler_graph(
            Marker::register_all_of(handler_of("App", "User"))
                .with_lifetime(Lifetime::Singleton)
                .include_service_name(),
        );
        let regs = BulkRegistrationExpander::new(&graph, HostProfile::microsoft()).expand_all();

        assert_eq!(pairs(&regs), vec![("App.IHandler<App.User>", "App.UserHandler")]);
        assert_eq!(regs[0].lifetime, Lifetime::Singleton);
        assert_eq!(regs[0].service_name.as_deref(), Some("UserHandler"));
    }

    #[test]
    fn test_candidate_with_several_closed_forms() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "MultiHandler")
                    .implements(handler_of("App", "Order"))
                    .implements(handler_of("App", "User")),
            )
            .module_marker(Marker::register_all(TypeRef::interface("App", "IHandler").unbound(1)))
            .build()
            .unwrap();

        let regs = BulkRegistrationExpander::new(&graph, HostProfile::microsoft()).expand_all();
        assert_eq!(
            pairs(&regs),
            vec![
                ("App.IHandler<App.Order>", "App.MultiHandler"),
                ("App.IHandler<App.User>", "App.MultiHandler"),
            ]
        );
    }

    #[test]
    fn test_base_class_contract() {
        let graph = TypeGraph::builder("App")
            .declare(DeclaredType::class("App", "JobBase").abstract_())
            .declare(
                DeclaredType::class("App", "MiddleJob")
                    .abstract_()
                    .inherits(TypeRef::class("App", "JobBase")),
            )
            .declare(DeclaredType::class("App", "CleanupJob").inherits(TypeRef::class("App", "MiddleJob")))
            .declare(DeclaredType::class("App", "ReportJob").inherits(TypeRef::class("App", "JobBase")))
            .module_marker(
                Marker::register_all(TypeRef::class("App", "JobBase"))
                    .with_constructor_argument(Lifetime::Scoped),
            )
            .build()
            .unwrap();

        let regs = BulkRegistrationExpander::new(&graph, HostProfile::microsoft()).expand_all();
        assert_eq!(
            pairs(&regs),
            vec![("App.JobBase", "App.CleanupJob"), ("App.JobBase", "App.ReportJob")]
        );
        assert!(regs.iter().all(|r| r.lifetime == Lifetime::Scoped));
    }

    #[test]
    fn test_unbound_base_class_contract() {
        let graph = TypeGraph::builder("App")
            .declare(DeclaredType::class("App", "Consumer").generic(["T"]).abstract_())
            .declare(
                DeclaredType::class("App", "OrderConsumer")
                    .inherits(TypeRef::class("App", "Consumer").with_args([TypeRef::class("App", "Order")])),
            )
            .module_marker(Marker::register_all(TypeRef::class("App", "Consumer").unbound(1)))
            .build()
            .unwrap();

        let regs = BulkRegistrationExpander::new(&graph, HostProfile::microsoft()).expand_all();
        assert_eq!(pairs(&regs), vec![("App.Consumer<App.Order>", "App.OrderConsumer")]);
    }

    #[test]
    fn test_generic_definition_registers_open_forms() {
        let graph = TypeGraph::builder("App")
            .declare(DeclaredType::interface("App", "IRepository").generic(["T"]))
            .declare(
                DeclaredType::class("App", "Repository")
                    .generic(["T"])
                    .implements(TypeRef::interface("App", "IRepository").with_args([TypeRef::parameter("T")])),
            )
            .module_marker(Marker::register_all(TypeRef::interface("App", "IRepository").unbound(1)))
            .build()
            .unwrap();

        let regs = BulkRegistrationExpander::new(&graph, HostProfile::microsoft()).expand_all();
        assert_eq!(pairs(&regs), vec![("App.IRepository<>", "App.Repository<>")]);
    }

    #[test]
    fn test_generic_definition_must_forward_its_parameters() {
        let handler = TypeRef::interface("App", "IHandler");
        let graph = TypeGraph::builder("App")
            .declare(DeclaredType::interface("App", "IHandler").generic(["T"]))
            .declare(
                DeclaredType::class("App", "OrderOnly")
                    .generic(["T"])
                    .implements(handler.clone().with_args([TypeRef::class("App", "Order")])),
            )
            .declare(
                DeclaredType::class("App", "Pair")
                    .generic(["K", "V"])
                    .implements(handler.clone().with_args([TypeRef::parameter("K")])),
            )
            .declare(
                DeclaredType::class("App", "Swapped")
                    .generic(["K", "V"])
                    .implements(
                        TypeRef::interface("App", "IMap")
                            .with_args([TypeRef::parameter("V"), TypeRef::parameter("K")]),
                    ),
            )
            .declare(
                DeclaredType::class("App", "Forwarding")
                    .generic(["M"])
                    .implements(handler.clone().with_args([TypeRef::parameter("M")])),
            )
            .module_marker(Marker::register_all(handler.unbound(1)))
            .module_marker(Marker::register_all(TypeRef::interface("App", "IMap").unbound(2)))
            .build()
            .unwrap();

        let regs = BulkRegistrationExpander::new(&graph, HostProfile::microsoft()).expand_all();
        assert_eq!(pairs(&regs), vec![("App.IHandler<>", "App.Forwarding<>")]);
    }

    #[test]
    fn test_abstract_candidates_excluded() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "AbstractHandler")
                    .abstract_()
                    .implements(handler_of("App", "Order")),
            )
            .module_marker(Marker::register_all(TypeRef::interface("App", "IHandler").unbound(1)))
            .build()
            .unwrap();

        let regs = BulkRegistrationExpander::new(&graph, HostProfile::microsoft()).expand_all();
        assert!(regs.is_empty());
    }

    #[test]
    fn test_marker_without_contract_is_ignored() {
        let graph = TypeGraph::builder("App")
            .declare(DeclaredType::class("App", "Service"))
            .module_marker(Marker::new(MarkerKind::RegisterAll))
            .build()
            .unwrap();

        assert!(
            BulkRegistrationExpander::new(&graph, HostProfile::microsoft())
                .expand_all()
                .is_empty()
        );
    }
}
