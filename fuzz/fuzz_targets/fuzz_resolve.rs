#![no_main]

//! Fuzz target for resolution passes
//!
//! Builds arbitrary modules (including inheritance cycles, broken references
//! and malformed extension hooks) and checks that resolving never panics and
//! always produces the same output twice.

use arbitrary::Arbitrary;
use dependency_wiring::{
    Accessibility, DeclaredType, Lifetime, Marker, Member, ResolutionEngine, ResolverConfig,
    TypeGraph, TypeRef,
};
use libfuzzer_sys::fuzz_target;

const NAMESPACES: [&str; 3] = ["App", "App.Core", "Lib"];

/// Reference into a small fixed name pool so types actually relate.
#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzRef {
    Class(u8),
    Interface(u8),
    GenericInterface(u8, u8),
    Broken(u8),
    RootObject,
}

impl FuzzRef {
    fn to_ref(self) -> TypeRef {
        let ns = |i: u8| NAMESPACES[i as usize % NAMESPACES.len()];
        match self {
            Self::Class(i) => TypeRef::class(ns(i), format!("C{}", i % 8)),
            Self::Interface(i) => TypeRef::interface(ns(i), format!("I{}", i % 8)),
            Self::GenericInterface(i, arg) => TypeRef::interface(ns(i), format!("G{}", i % 4))
                .with_args([TypeRef::class(ns(arg), format!("C{}", arg % 8))]),
            Self::Broken(i) => TypeRef::error(format!("Missing{}", i % 4)),
            Self::RootObject => TypeRef::class("System", "Object"),
        }
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzMarker {
    Register {
        contract: Option<FuzzRef>,
        lifetime: u8,
        name: Option<u8>,
    },
    Decorate(Option<FuzzRef>),
}

impl FuzzMarker {
    fn to_marker(&self) -> Marker {
        match self {
            Self::Register {
                contract,
                lifetime,
                name,
            } => {
                let mut marker = Marker::register().with_lifetime(Lifetime::ALL[*lifetime as usize % 3]);
                if let Some(contract) = contract {
                    marker = marker.with_service_type(contract.to_ref());
                }
                if let Some(name) = name {
                    marker = marker.with_service_name(format!("n{name}"));
                }
                marker
            }
            Self::Decorate(contract) => match contract {
                Some(contract) => Marker::decorate().with_service_type(contract.to_ref()),
                None => Marker::decorate(),
            },
        }
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzMethod {
    public: bool,
    is_static: bool,
    takes_registry: bool,
    extra_parameter: bool,
    composition_source: bool,
}

#[derive(Debug, Arbitrary)]
struct FuzzType {
    id: u8,
    interface: bool,
    is_abstract: bool,
    partial: bool,
    base: Option<FuzzRef>,
    interfaces: Vec<FuzzRef>,
    markers: Vec<FuzzMarker>,
    methods: Vec<FuzzMethod>,
}

#[derive(Debug, Arbitrary)]
struct FuzzModule {
    light_inject: bool,
    warn_ambiguous: bool,
    parallel: bool,
    types: Vec<FuzzType>,
    rules: Vec<(FuzzRef, bool, u8)>,
}

fn build(module: &FuzzModule) -> Option<TypeGraph> {
    let mut builder = TypeGraph::builder("Fuzz.Module");

    for ty in module.types.iter().take(32) {
        let ns = NAMESPACES[ty.id as usize % NAMESPACES.len()];
        let mut decl = if ty.interface {
            DeclaredType::interface(ns, format!("I{}", ty.id % 8))
        } else if ty.id % 16 == 15 {
            DeclaredType::class(ns, "CompositionRoot")
        } else {
            DeclaredType::class(ns, format!("C{}", ty.id % 8))
        };

        if ty.is_abstract {
            decl = decl.abstract_();
        }
        if ty.partial {
            decl = decl.partial();
        }
        if let Some(base) = ty.base {
            decl = decl.inherits(base.to_ref());
        }
        for iface in ty.interfaces.iter().take(4) {
            decl = decl.implements(iface.to_ref());
        }
        for marker in ty.markers.iter().take(4) {
            decl = decl.with_marker(marker.to_marker());
        }
        for (i, method) in ty.methods.iter().take(3).enumerate() {
            let mut member = Member::method(format!("Configure{i}")).with_accessibility(if method.public {
                Accessibility::Public
            } else {
                Accessibility::Private
            });
            if method.is_static {
                member = member.static_();
            }
            if method.takes_registry {
                member = member.with_parameter(
                    "services",
                    TypeRef::interface("Microsoft.Extensions.DependencyInjection", "IServiceCollection"),
                );
            }
            if method.extra_parameter {
                member = member.with_parameter("extra", TypeRef::class("System", "String"));
            }
            let marker = if method.composition_source {
                Marker::registration_extension().as_composition_source()
            } else {
                Marker::registration_extension()
            };
            decl = decl.with_member(member.with_marker(marker));
        }

        builder = builder.declare(decl);
    }

    for (contract, include_name, lifetime) in module.rules.iter().take(4) {
        let mut rule = Marker::register_all(contract.to_ref())
            .with_constructor_argument(Lifetime::ALL[*lifetime as usize % 3]);
        if *include_name {
            rule = rule.include_service_name();
        }
        builder = builder.module_marker(rule);
    }

    // Duplicate declarations are rejected up front; nothing to resolve
    builder.build().ok()
}

fuzz_target!(|module: FuzzModule| {
    let Some(graph) = build(&module) else {
        return;
    };

    let mut config = ResolverConfig::builder();
    if module.light_inject {
        config = config.light_inject();
    }
    if module.warn_ambiguous {
        config = config.warn_on_ambiguous_contract();
    }
    if module.parallel {
        config = config.parallel();
    }
    let engine = ResolutionEngine::new(config.build());

    let first = engine.resolve(&graph);
    let second = engine.resolve(&graph);
    assert_eq!(first, second, "resolution must be deterministic");

    if first.is_aborted() {
        assert!(first.descriptors.is_empty());
        assert_eq!(first.diagnostics.len(), 1);
    }

    for registration in first.registrations() {
        assert!(!registration.implementation_type_name.is_empty());
    }

    for extension in first.extensions() {
        assert!(extension.is_valid());
    }
});
