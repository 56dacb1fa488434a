//! # Dependency Wiring - Deterministic DI Registration Resolution
//!
//! Turns a snapshot of annotated types into the ordered list of wiring
//! instructions a dependency-injection composition root needs: which concrete
//! type satisfies which contract, under which lifetime and optional name,
//! which contracts are decorated, and which user configuration hooks to call.
//!
//! Parsing source code and printing the generated composition code belong to
//! surrounding tooling. This crate is the part in between, and it is a pure
//! function: the same snapshot always resolves to the same output.
//!
//! ## Features
//!
//! - **Contract inference** - explicit contract, then first interface, then
//!   base type, then the type itself
//! - **Self-collapse** - `T as T` registrations collapse to a single type
//! - **Bulk rules** - register every implementation of a closed or unbound
//!   generic contract across the module
//! - **Decoration** - pair decorators with the contract they wrap
//! - **Extension hooks** - validate user configuration methods, accumulating
//!   every problem as a diagnostic
//! - **Host profiles** - Microsoft.Extensions.DependencyInjection and
//!   LightInject presets, or your own
//! - **Observable** - optional tracing integration with JSON or pretty output
//! - **Parallel** - optional rayon-backed per-type resolution
//!
//! ## Quick Start
//!
//! ```rust
//! use dependency_wiring::prelude::*;
//!
//! let graph = TypeGraph::builder("Shop")
//!     .declare(DeclaredType::interface("Shop", "IOrderService"))
//!     .declare(
//!         DeclaredType::class("Shop", "OrderService")
//!             .implements(TypeRef::interface("Shop", "IOrderService"))
//!             .with_marker(Marker::register().with_lifetime(Lifetime::Scoped)),
//!     )
//!     .declare(
//!         DeclaredType::class("Shop", "Clock")
//!             .with_marker(Marker::register().with_lifetime(Lifetime::Singleton)),
//!     )
//!     .build()?;
//!
//! let output = ResolutionEngine::default().resolve(&graph);
//! let registrations: Vec<_> = output.registrations().collect();
//!
//! assert_eq!(registrations[0].service_type.as_deref(), Some("Shop.IOrderService"));
//! assert_eq!(registrations[0].implementation_type_name, "Shop.OrderService");
//!
//! // No contract: collapses to a self-registration
//! assert!(registrations[1].is_self_registration());
//! # Ok::<(), dependency_wiring::WiringError>(())
//! ```
//!
//! ## Bulk Registration
//!
//! ```rust
//! use dependency_wiring::prelude::*;
//!
//! let handler = |msg: &str| {
//!     TypeRef::interface("Bus", "IHandler").with_args([TypeRef::class("Bus", msg)])
//! };
//!
//! let graph = TypeGraph::builder("Bus")
//!     .declare(DeclaredType::class("Bus", "OrderHandler").implements(handler("Order")))
//!     .declare(DeclaredType::class("Bus", "UserHandler").implements(handler("User")))
//!     .module_marker(Marker::register_all(TypeRef::interface("Bus", "IHandler").unbound(1)))
//!     .build()?;
//!
//! let output = ResolutionEngine::default().resolve(&graph);
//! let contracts: Vec<_> = output
//!     .registrations()
//!     .filter_map(|r| r.service_type.as_deref())
//!     .collect();
//!
//! assert_eq!(contracts, ["Bus.IHandler<Bus.Order>", "Bus.IHandler<Bus.User>"]);
//! # Ok::<(), dependency_wiring::WiringError>(())
//! ```

mod bulk;
mod config;
mod decoration;
mod descriptor;
mod diagnostics;
mod engine;
mod error;
mod extension;
mod graph;
#[cfg(feature = "logging")]
pub mod logging;
mod marker;
mod registration;
mod service_type;

pub use bulk::*;
pub use config::*;
pub use decoration::*;
pub use descriptor::*;
pub use diagnostics::*;
pub use engine::*;
pub use error::*;
pub use extension::*;
pub use graph::*;
pub use marker::{Marker, MarkerKind, MarkerValue, keys};
pub use registration::*;
pub use service_type::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Accessibility, DeclaredType, Descriptor, Diagnostic, DiagnosticCode, HostProfile, Lifetime,
        Marker, Member, Registration, ResolutionEngine, ResolutionOutput, ResolverConfig, Result,
        TypeGraph, TypeRef, WiringError,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(
        service_type: Option<&str>,
        implementation: &str,
        lifetime: Lifetime,
        service_name: Option<&str>,
    ) -> Registration {
        Registration {
            service_type: service_type.map(str::to_owned),
            implementation_type_name: implementation.to_owned(),
            lifetime,
            service_name: service_name.map(str::to_owned),
        }
    }

    fn services() -> TypeRef {
        TypeRef::interface("Microsoft.Extensions.DependencyInjection", "IServiceCollection")
    }

    /// A module touching every resolver.
    fn mixed_graph() -> TypeGraph {
        let handler = |msg: &str| TypeRef::interface("App", "IHandler").with_args([TypeRef::class("App", msg)]);

        TypeGraph::builder("App")
            .declare(DeclaredType::interface("App", "IService"))
            .declare(
                DeclaredType::class("App", "Service")
                    .implements(TypeRef::interface("App", "IService"))
                    .with_marker(Marker::register()),
            )
            .declare(
                DeclaredType::class("App", "CachedService")
                    .implements(TypeRef::interface("App", "IService"))
                    .with_marker(Marker::decorate()),
            )
            .declare(DeclaredType::class("App", "OrderHandler").implements(handler("Order")))
            .declare(DeclaredType::class("App", "UserHandler").implements(handler("User")))
            .declare(
                DeclaredType::class("App", "Setup").with_member(
                    Member::method("Configure")
                        .public()
                        .static_()
                        .with_parameter("services", services())
                        .with_marker(Marker::registration_extension()),
                ),
            )
            .module_marker(Marker::register_all(TypeRef::interface("App", "IHandler").unbound(1)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let graph = mixed_graph();
        let engine = ResolutionEngine::default();

        let first = engine.resolve(&graph);
        let second = engine.resolve(&graph);
        assert_eq!(first, second);
        assert_eq!(format!("{:?}", first), format!("{:?}", second));
        assert_eq!(first.descriptors.len(), 5);
    }

    #[test]
    fn test_self_collapse_without_contract() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "Clock")
                    .inherits(TypeRef::class("System", "Object"))
                    .with_marker(Marker::register()),
            )
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        assert_eq!(
            output.registrations().cloned().collect::<Vec<_>>(),
            vec![registration(None, "App.Clock", Lifetime::Transient, None)]
        );
    }

    #[test]
    fn test_first_declared_interface_wins() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "Service")
                    .implements(TypeRef::interface("App", "A"))
                    .implements(TypeRef::interface("App", "B"))
                    .with_marker(Marker::register()),
            )
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        let registration = output.registrations().next().unwrap();
        assert_eq!(registration.service_type.as_deref(), Some("App.A"));
    }

    #[test]
    fn test_bulk_unbound_rule_yields_one_registration_per_type() {
        let handler = |msg: &str| TypeRef::interface("App", "IHandler").with_args([TypeRef::class("App", msg)]);
        let graph = TypeGraph::builder("App")
            .declare(DeclaredType::class("App", "OrderHandler").implements(handler("Order")))
            .declare(DeclaredType::class("App", "UserHandler").implements(handler("User")))
            .declare(DeclaredType::class("App", "OrderAuditHandler").implements(handler("Order")))
            .module_marker(Marker::register_all(TypeRef::interface("App", "IHandler").unbound(1)))
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        let registrations: Vec<_> = output.registrations().cloned().collect();
        assert_eq!(
            registrations,
            vec![
                registration(Some("App.IHandler<App.Order>"), "App.OrderHandler", Lifetime::Transient, None),
                registration(Some("App.IHandler<App.User>"), "App.UserHandler", Lifetime::Transient, None),
                registration(
                    Some("App.IHandler<App.Order>"),
                    "App.OrderAuditHandler",
                    Lifetime::Transient,
                    None
                ),
            ]
        );
    }

    #[test]
    fn test_abstract_type_excluded_from_bulk_rule() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "HandlerBase")
                    .abstract_()
                    .implements(TypeRef::interface("App", "IHandler")),
            )
            .module_marker(Marker::register_all(TypeRef::interface("App", "IHandler")))
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        assert_eq!(output.registrations().count(), 0);
    }

    #[test]
    fn test_unmarked_type_is_a_no_op() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "Plain")
                    .implements(TypeRef::interface("App", "IPlain"))
                    .with_member(Member::method("Configure").public().static_()),
            )
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        assert!(output.descriptors.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_non_partial_root_is_fatal_to_pass() {
        let graph = TypeGraph::builder("App")
            .declare(DeclaredType::class("App", "CompositionRoot"))
            .declare(
                DeclaredType::class("App", "Service")
                    .implements(TypeRef::interface("App", "IService"))
                    .with_marker(Marker::register()),
            )
            .declare(
                DeclaredType::class("App", "Setup").with_member(
                    Member::method("Configure")
                        .public()
                        .static_()
                        .with_parameter("registry", TypeRef::interface("LightInject", "IServiceRegistry"))
                        .with_marker(Marker::registration_extension()),
                ),
            )
            .build()
            .unwrap();

        let engine = ResolutionEngine::new(ResolverConfig::for_host(HostProfile::light_inject().clone()));
        let output = engine.resolve(&graph);

        assert!(output.descriptors.is_empty());
        assert_eq!(output.diagnostics.len(), 1);
        let diagnostic = output.diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.code, DiagnosticCode::CompositionRootNotPartial);
        assert!(diagnostic.is_error());
    }

    #[test]
    fn test_extension_errors_accumulate() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "Setup").with_member(
                    Member::method("Configure")
                        .public()
                        .with_parameter("services", TypeRef::class("System", "String"))
                        .with_marker(Marker::registration_extension()),
                ),
            )
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        let codes: Vec<_> = output.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![DiagnosticCode::NotStatic, DiagnosticCode::InvalidParameterType]
        );
        assert_eq!(output.extensions().count(), 0);
    }

    #[test]
    fn test_service_scenario() {
        let graph = TypeGraph::builder("App")
            .declare(DeclaredType::interface("App", "IService"))
            .declare(
                DeclaredType::class("App", "Service")
                    .implements(TypeRef::interface("App", "IService"))
                    .with_marker(Marker::register()),
            )
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        assert_eq!(
            output.descriptors,
            vec![Descriptor::from(registration(
                Some("App.IService"),
                "App.Service",
                Lifetime::Transient,
                None
            ))]
        );
    }

    #[test]
    fn test_named_scoped_self_registration_scenario() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "Service2").with_marker(
                    Marker::register()
                        .with_lifetime(Lifetime::Scoped)
                        .with_service_name("Test"),
                ),
            )
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        assert_eq!(
            output.registrations().cloned().collect::<Vec<_>>(),
            vec![registration(None, "App.Service2", Lifetime::Scoped, Some("Test"))]
        );
    }

    #[test]
    fn test_lifetime_from_string_argument() {
        let graph = TypeGraph::builder("App")
            .declare(
                DeclaredType::class("App", "Cache")
                    .with_marker(Marker::register().with_argument(keys::LIFETIME, "Singleton")),
            )
            .declare(
                DeclaredType::class("App", "Broken")
                    .with_marker(Marker::register().with_argument(keys::LIFETIME, "Forever")),
            )
            .build()
            .unwrap();

        let output = ResolutionEngine::default().resolve(&graph);
        let lifetimes: Vec<_> = output.registrations().map(|r| r.lifetime).collect();
        assert_eq!(lifetimes, vec![Lifetime::Singleton, Lifetime::Transient]);
    }

    #[test]
    fn test_mixed_module_output() {
        let output = ResolutionEngine::default().resolve(&mixed_graph());

        assert_eq!(output.namespace, "App");
        assert_eq!(output.extension_method_name, "AddApp");
        assert_eq!(output.registrations().count(), 3);
        assert_eq!(
            output.decorations().cloned().collect::<Vec<_>>(),
            vec![Decoration {
                decorated_type_name: "App.IService".into(),
                decorator_type_name: "App.CachedService".into(),
            }]
        );
        assert_eq!(output.extensions().count(), 1);
        assert!(!output.is_aborted());
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let result = TypeGraph::builder("App")
            .declare(DeclaredType::class("App", "Service"))
            .declare(DeclaredType::class("App", "Service"))
            .build();

        assert_eq!(result.unwrap_err(), WiringError::duplicate_type("App.Service"));
    }
}
