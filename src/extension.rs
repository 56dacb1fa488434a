//! Registration extension entry points
//!
//! Methods marked `RegistrationExtension` are user-written configuration hooks
//! the generated composition root calls with the registry instance. Every
//! structural rule is checked on every method and all failures are kept;
//! any failure suppresses the call.

use crate::config::HostProfile;
use crate::descriptor::{ExtensionInvocation, InvocationKind};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Location};
use crate::graph::{Accessibility, DeclaredType, Member};
use crate::marker::MarkerKind;

#[cfg(feature = "logging")]
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ExtensionInvocationResolver<'a> {
    host: &'a HostProfile,
}

impl<'a> ExtensionInvocationResolver<'a> {
    pub fn new(host: &'a HostProfile) -> Self {
        Self { host }
    }

    /// One invocation per marked method, in member order. Invalid methods
    /// are returned too, carrying their errors.
    pub fn resolve(&self, ty: &DeclaredType) -> Vec<ExtensionInvocation> {
        ty.members()
            .iter()
            .filter_map(|member| {
                let marker = member.marker(MarkerKind::RegistrationExtension)?;
                let kind = if marker.is_composition_source() {
                    InvocationKind::CompositionSource
                } else {
                    InvocationKind::StaticCall
                };
                Some(self.validate(ty, member, kind))
            })
            .collect()
    }

    fn validate(&self, ty: &DeclaredType, member: &Member, kind: InvocationKind) -> ExtensionInvocation {
        let method = member.name();
        let registry = self.host.registry_type.as_str();
        let args = [method, ty.name(), registry];
        let error = |code| Diagnostic::new(code, Location::of_member(ty, member), &args);

        let mut errors = Vec::new();

        if !matches!(
            member.accessibility(),
            Accessibility::Public | Accessibility::Internal
        ) {
            errors.push(error(DiagnosticCode::InvalidAccessibility));
        }

        // Composition sources are instances of the root contract.
        if kind == InvocationKind::StaticCall && !member.is_static() {
            errors.push(error(DiagnosticCode::NotStatic));
        }

        if member.parameters().len() != 1 {
            errors.push(error(DiagnosticCode::InvalidParameterCount));
        }

        let takes_registry = member
            .parameters()
            .first()
            .is_some_and(|param| self.host.is_registry_type(&param.ty));
        if !takes_registry {
            errors.push(error(DiagnosticCode::InvalidParameterType));
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_wiring",
            ty = %ty.reference(),
            method,
            ?kind,
            errors = errors.len(),
            "Resolved extension invocation"
        );

        ExtensionInvocation {
            declaring_type_name: ty.qualified_name(),
            method_name: method.to_owned(),
            kind,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeRef;
    use crate::marker::Marker;

    fn services() -> TypeRef {
        TypeRef::interface("Microsoft.Extensions.DependencyInjection", "IServiceCollection")
    }

    fn codes(invocation: &ExtensionInvocation) -> Vec<&'static str> {
        invocation.errors.iter().map(Diagnostic::id).collect()
    }

    fn resolve(member: Member) -> ExtensionInvocation {
        let ty = DeclaredType::class("App", "Setup").with_member(member);
        let mut invocations = ExtensionInvocationResolver::new(HostProfile::microsoft()).resolve(&ty);
        assert_eq!(invocations.len(), 1);
        invocations.remove(0)
    }

    #[test]
    fn test_valid_extension() {
        let invocation = resolve(
            Member::method("Configure")
                .public()
                .static_()
                .with_parameter("services", services())
                .with_marker(Marker::registration_extension()),
        );

        assert!(invocation.is_valid());
        assert_eq!(invocation.declaring_type_name, "App.Setup");
        assert_eq!(invocation.method_name, "Configure");
        assert_eq!(invocation.kind, InvocationKind::StaticCall);
    }

    #[test]
    fn test_internal_is_accepted() {
        let invocation = resolve(
            Member::method("Configure")
                .internal()
                .static_()
                .with_parameter("services", services())
                .with_marker(Marker::registration_extension()),
        );
        assert!(invocation.is_valid());
    }

    #[test]
    fn test_errors_accumulate() {
        let invocation = resolve(
            Member::method("Configure")
                .public()
                .with_parameter("services", TypeRef::interface("App", "IOther"))
                .with_marker(Marker::registration_extension()),
        );

        assert_eq!(codes(&invocation), vec!["DIW0002", "DIW0004"]);
        assert_eq!(
            invocation.errors[1].message,
            "Method Configure on type Setup must have input parameter of type \
             Microsoft.Extensions.DependencyInjection.IServiceCollection"
        );
    }

    #[test]
    fn test_every_rule_violated() {
        let invocation = resolve(Member::method("Configure").with_marker(Marker::registration_extension()));
        assert_eq!(codes(&invocation), vec!["DIW0001", "DIW0002", "DIW0003", "DIW0004"]);
    }

    #[test]
    fn test_too_many_parameters() {
        let invocation = resolve(
            Member::method("Configure")
                .public()
                .static_()
                .with_parameter("services", services())
                .with_parameter("extra", TypeRef::class("System", "String"))
                .with_marker(Marker::registration_extension()),
        );
        assert_eq!(codes(&invocation), vec!["DIW0003"]);
    }

    #[test]
    fn test_composition_source_may_be_instance() {
        let ty = DeclaredType::class("App", "FeatureRoot").with_member(
            Member::method("Compose")
                .public()
                .with_parameter("registry", TypeRef::interface("LightInject", "IServiceRegistry"))
                .with_marker(Marker::registration_extension().as_composition_source()),
        );

        let invocations = ExtensionInvocationResolver::new(HostProfile::light_inject()).resolve(&ty);
        assert_eq!(invocations.len(), 1);
        assert!(invocations[0].is_valid());
        assert_eq!(invocations[0].kind, InvocationKind::CompositionSource);
    }

    #[test]
    fn test_unmarked_members_ignored() {
        let ty = DeclaredType::class("App", "Setup")
            .with_member(Member::method("Helper").public().static_())
            .with_member(
                Member::method("Configure")
                    .public()
                    .static_()
                    .with_parameter("services", services())
                    .with_marker(Marker::registration_extension()),
            );

        let invocations = ExtensionInvocationResolver::new(HostProfile::microsoft()).resolve(&ty);
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].method_name, "Configure");
    }
}
