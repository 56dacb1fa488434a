//! Resolve a small annotated module and print the wiring it produces
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example resolve --features logging-json
//! ```
//!
//! Run with pretty logging and the rayon pool:
//! ```bash
//! cargo run --example resolve --features logging-pretty,parallel
//! ```

use dependency_wiring::prelude::*;
use dependency_wiring::{Diagnostics, InvocationKind};

fn shop_module() -> dependency_wiring::Result<TypeGraph> {
    let handler = |msg: &str| {
        TypeRef::interface("Shop.Messaging", "IHandler").with_args([TypeRef::class("Shop.Orders", msg)])
    };
    let registry = TypeRef::interface("LightInject", "IServiceRegistry");

    TypeGraph::builder("Shop.Core")
        // The user-authored composition root the generated code extends
        .declare(
            DeclaredType::class("Shop", "CompositionRoot")
                .partial()
                .implements(TypeRef::interface("LightInject", "ICompositionRoot")),
        )
        .declare(DeclaredType::interface("Shop.Orders", "IOrderRepository"))
        .declare(
            DeclaredType::class("Shop.Orders", "SqlOrderRepository")
                .implements(TypeRef::interface("Shop.Orders", "IOrderRepository"))
                .with_marker(Marker::register().with_lifetime(Lifetime::Scoped)),
        )
        .declare(
            DeclaredType::class("Shop.Orders", "CachedOrderRepository")
                .implements(TypeRef::interface("Shop.Orders", "IOrderRepository"))
                .with_marker(Marker::decorate()),
        )
        .declare(
            DeclaredType::class("Shop", "SystemClock")
                .with_marker(Marker::register().with_lifetime(Lifetime::Singleton).with_service_name("utc")),
        )
        .declare(DeclaredType::class("Shop.Orders", "OrderPlacedHandler").implements(handler("OrderPlaced")))
        .declare(DeclaredType::class("Shop.Orders", "OrderShippedHandler").implements(handler("OrderShipped")))
        .declare(
            DeclaredType::class("Shop", "Startup")
                .with_member(
                    Member::method("AddLogging")
                        .public()
                        .static_()
                        .with_parameter("registry", registry.clone())
                        .with_marker(Marker::registration_extension()),
                )
                // Deliberately broken: instance method
                .with_member(
                    Member::method("AddMetrics")
                        .public()
                        .with_parameter("registry", registry)
                        .with_marker(Marker::registration_extension()),
                ),
        )
        .module_marker(
            Marker::register_all(TypeRef::interface("Shop.Messaging", "IHandler").unbound(1))
                .with_constructor_argument(Lifetime::Transient)
                .include_service_name(),
        )
        .build()
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        println!("  {diagnostic}");
    }
}

fn main() -> dependency_wiring::Result<()> {
    #[cfg(feature = "logging")]
    {
        dependency_wiring::logging::init();
    }

    println!("=== Dependency Wiring Demo ===\n");

    let graph = shop_module()?;
    let config = ResolverConfig::builder()
        .light_inject()
        .warn_on_ambiguous_contract()
        .parallel()
        .build();
    let output = ResolutionEngine::new(config).resolve(&graph);

    println!("namespace:        {}", output.namespace);
    println!("entry point:      {}", output.extension_method_name);
    println!("extends user root: {}\n", output.has_user_root);

    println!("descriptors:");
    for descriptor in &output.descriptors {
        match descriptor {
            Descriptor::Registration(r) => {
                let service = r.service_type.as_deref().unwrap_or("(self)");
                let name = r.service_name.as_deref().unwrap_or("-");
                println!(
                    "  register  {service} -> {} [{}] name={name}",
                    r.implementation_type_name, r.lifetime
                );
            }
            Descriptor::Decoration(d) => {
                println!("  decorate  {} with {}", d.decorated_type_name, d.decorator_type_name);
            }
            Descriptor::Extension(e) => {
                let how = match e.kind {
                    InvocationKind::StaticCall => "call",
                    InvocationKind::CompositionSource => "compose",
                };
                println!("  {how:<9} {}.{}", e.declaring_type_name, e.method_name);
            }
        }
    }

    println!("\ndiagnostics:");
    print_diagnostics(&output.diagnostics);

    println!("\n=== Demo Complete ===");
    Ok(())
}
