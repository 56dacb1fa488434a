//! One resolution pass over a type graph snapshot
//!
//! The engine runs the per-type resolvers over every declared type, then the
//! module-wide bulk expansion, and hands back an ordered descriptor list with
//! everything the emission layer needs.
//!
//! # Example
//!
//! ```rust
//! use dependency_wiring::{DeclaredType, Lifetime, Marker, ResolutionEngine, TypeGraph, TypeRef};
//!
//! let graph = TypeGraph::builder("Demo.App")
//!     .declare(
//!         DeclaredType::class("Demo.App", "Service")
//!             .implements(TypeRef::interface("Demo.App", "IService"))
//!             .with_marker(Marker::register().with_lifetime(Lifetime::Singleton)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let output = ResolutionEngine::default().resolve(&graph);
//!
//! assert_eq!(output.namespace, "Demo.App");
//! assert_eq!(output.extension_method_name, "AddDemoApp");
//! let registration = output.registrations().next().unwrap();
//! assert_eq!(registration.service_type.as_deref(), Some("Demo.App.IService"));
//! assert_eq!(registration.lifetime, Lifetime::Singleton);
//! ```

use crate::bulk::BulkRegistrationExpander;
use crate::config::ResolverConfig;
use crate::decoration::DecorationResolver;
use crate::descriptor::{Decoration, Descriptor, ExtensionInvocation, InvocationKind, Registration};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use crate::extension::ExtensionInvocationResolver;
use crate::graph::{DeclaredType, TypeGraph};
use crate::registration::RegistrationResolver;

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Everything one pass produces.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionOutput {
    /// Wiring instructions in emission order
    pub descriptors: Vec<Descriptor>,
    /// Namespace the generated composition code lives in
    pub namespace: String,
    /// A user-authored composition root exists and must be extended rather
    /// than declared
    pub has_user_root: bool,
    /// Name of the generated registration entry point (`Add{Module}`)
    pub extension_method_name: String,
    pub diagnostics: Diagnostics,
}

impl ResolutionOutput {
    fn new(graph: &TypeGraph, namespace: String, has_user_root: bool) -> Self {
        Self {
            descriptors: Vec::new(),
            namespace,
            has_user_root,
            extension_method_name: format!("Add{}", graph.module_name().replace('.', "")),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.descriptors.iter().filter_map(Descriptor::as_registration)
    }

    pub fn decorations(&self) -> impl Iterator<Item = &Decoration> {
        self.descriptors.iter().filter_map(Descriptor::as_decoration)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &ExtensionInvocation> {
        self.descriptors.iter().filter_map(Descriptor::as_extension)
    }

    /// True when the pass was aborted and nothing should be emitted.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.diagnostics.has_fatal()
    }
}

/// Per-type results, kept apart until they are merged in declaration order.
#[derive(Debug, Default)]
struct TypeOutput {
    descriptors: Vec<Descriptor>,
    diagnostics: Vec<Diagnostic>,
}

/// Runs resolution passes under one configuration.
///
/// The engine holds no state between passes; the same instance can resolve
/// any number of snapshots, from any thread.
#[derive(Debug, Clone, Default)]
pub struct ResolutionEngine {
    config: ResolverConfig,
}

impl ResolutionEngine {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a snapshot. Never fails; problems are reported in
    /// [`ResolutionOutput::diagnostics`].
    pub fn resolve(&self, graph: &TypeGraph) -> ResolutionOutput {
        let host = self.config.host();

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_wiring",
            module = graph.module_name(),
            host = %host.name,
            types = graph.len(),
            rules = graph.module_markers().len(),
            "Starting resolution pass"
        );

        let root = self.find_user_root(graph);
        let namespace = root
            .map(DeclaredType::namespace)
            .or_else(|| graph.default_namespace())
            .unwrap_or_else(|| graph.module_name())
            .to_owned();
        let mut output = ResolutionOutput::new(graph, namespace, root.is_some());

        if let Some(root) = root.filter(|root| !root.is_partial()) {
            #[cfg(feature = "logging")]
            warn!(
                target: "dependency_wiring",
                root = %root.reference(),
                "Composition root is not partial, aborting pass"
            );
            output.diagnostics.push(Diagnostic::new(
                DiagnosticCode::CompositionRootNotPartial,
                Location::of_type(root),
                &[root.name()],
            ));
            return output;
        }

        for type_output in self.resolve_types(graph) {
            output.descriptors.extend(type_output.descriptors);
            output.diagnostics.extend(type_output.diagnostics);
        }

        let bulk = BulkRegistrationExpander::new(graph, host).expand_all();
        output.descriptors.extend(bulk.into_iter().map(Descriptor::from));

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_wiring",
            module = graph.module_name(),
            descriptors = output.descriptors.len(),
            diagnostics = output.diagnostics.len(),
            "Resolution pass complete"
        );

        output
    }

    fn find_user_root<'g>(&self, graph: &'g TypeGraph) -> Option<&'g DeclaredType> {
        let name = self.config.host().composition_root_name.as_deref()?;
        graph
            .types()
            .iter()
            .find(|ty| !ty.is_interface() && ty.name() == name)
    }

    /// Per-type outputs in declaration order.
    fn resolve_types(&self, graph: &TypeGraph) -> Vec<TypeOutput> {
        #[cfg(feature = "parallel")]
        if self.config.is_parallel() {
            use rayon::prelude::*;

            let mut outputs: Vec<(usize, TypeOutput)> = graph
                .types()
                .par_iter()
                .enumerate()
                .map(|(idx, ty)| (idx, self.resolve_type(graph, ty)))
                .collect();
            outputs.sort_by_key(|(idx, _)| *idx);
            return outputs.into_iter().map(|(_, output)| output).collect();
        }

        graph
            .types()
            .iter()
            .map(|ty| self.resolve_type(graph, ty))
            .collect()
    }

    fn resolve_type(&self, graph: &TypeGraph, ty: &DeclaredType) -> TypeOutput {
        let mut output = TypeOutput::default();
        if ty.has_no_markers() {
            return output;
        }

        let host = self.config.host();
        let registrations = RegistrationResolver::new(host);

        output
            .descriptors
            .extend(registrations.resolve(ty).into_iter().map(Descriptor::from));

        if self.config.warns_on_ambiguous_contract() {
            output.diagnostics.extend(registrations.ambiguous_contract(ty));
        }

        if let Some(decoration) = DecorationResolver::new(host).resolve(ty) {
            output.descriptors.push(decoration.into());
        }

        for invocation in ExtensionInvocationResolver::new(host).resolve(ty) {
            if !invocation.is_valid() {
                output.diagnostics.extend(invocation.errors);
                continue;
            }
            if invocation.kind == InvocationKind::CompositionSource {
                if let Some(error) = self.check_composition_source(graph, ty, &invocation) {
                    output.diagnostics.push(error);
                    continue;
                }
            }
            output.descriptors.push(invocation.into());
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_wiring",
            ty = %ty.reference(),
            descriptors = output.descriptors.len(),
            diagnostics = output.diagnostics.len(),
            "Resolved type"
        );

        output
    }

    /// A composition source must implement the host's root contract.
    fn check_composition_source(
        &self,
        graph: &TypeGraph,
        ty: &DeclaredType,
        invocation: &ExtensionInvocation,
    ) -> Option<Diagnostic> {
        let contract = self.config.host().composition_root_contract.as_deref();
        if contract.is_some_and(|contract| graph.implements(ty, contract)) {
            return None;
        }

        #[cfg(feature = "logging")]
        warn!(
            target: "dependency_wiring",
            ty = %ty.reference(),
            method = %invocation.method_name,
            "Composition source does not implement the root contract, dropping entry"
        );

        let member = ty
            .members()
            .iter()
            .find(|member| member.name() == invocation.method_name);
        let location = match member {
            Some(member) => Location::of_member(ty, member),
            None => Location::of_type(ty),
        };
        Some(Diagnostic::new(
            DiagnosticCode::CompositionSourceNotRoot,
            location,
            &[
                invocation.method_name.as_str(),
                ty.name(),
                contract.unwrap_or("a composition root contract"),
            ],
        ))
    }
}
