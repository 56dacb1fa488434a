//! Per-type registration resolution
//!
//! Every `Register` marker on a type yields one [`Registration`]. Types
//! without one yield nothing, which is the common case.

use crate::config::HostProfile;
use crate::descriptor::Registration;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Location};
use crate::graph::DeclaredType;
use crate::marker::{Marker, MarkerKind};
use crate::service_type::{ServiceTypeResolver, is_same_type};

#[cfg(feature = "logging")]
use tracing::trace;

/// Turns `Register` markers into registration descriptors.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationResolver<'a> {
    service_types: ServiceTypeResolver<'a>,
}

impl<'a> RegistrationResolver<'a> {
    pub fn new(host: &'a HostProfile) -> Self {
        Self {
            service_types: ServiceTypeResolver::new(host),
        }
    }

    /// One registration per `Register` marker, in marker order.
    pub fn resolve(&self, ty: &DeclaredType) -> Vec<Registration> {
        ty.markers_of(MarkerKind::Register)
            .map(|marker| self.resolve_marker(ty, marker))
            .collect()
    }

    fn resolve_marker(&self, ty: &DeclaredType, marker: &Marker) -> Registration {
        let service_type = self.service_types.resolve(ty, marker);

        // A contract naming the type itself registers the contract's form.
        let implementation = if is_same_type(ty, &service_type.contract) {
            service_type.name.clone()
        } else {
            ty.qualified_name()
        };
        let registration = Registration::new(
            Some(service_type.name),
            implementation,
            marker.lifetime(),
            marker.service_name().map(str::to_owned),
        );

        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_wiring",
            implementation = %registration.implementation_type_name,
            service = ?registration.service_type,
            lifetime = %registration.lifetime,
            "Resolved registration"
        );

        registration
    }

    /// Warning for a `Register` marker whose contract was inferred from
    /// several candidate interfaces. The first declared interface still wins.
    pub fn ambiguous_contract(&self, ty: &DeclaredType) -> Option<Diagnostic> {
        let implicit = ty
            .markers_of(MarkerKind::Register)
            .any(|marker| marker.explicit_contract().is_none());
        if !implicit {
            return None;
        }

        let candidates: Vec<_> = self.service_types.eligible_interfaces(ty).collect();
        if candidates.len() < 2 {
            return None;
        }

        let type_name = ty.qualified_name();
        let count = candidates.len().to_string();
        let chosen = candidates[0].display_name(Some(ty.namespace()));
        Some(Diagnostic::new(
            DiagnosticCode::AmbiguousContract,
            Location::of_type(ty),
            &[type_name.as_str(), count.as_str(), chosen.as_str()],
        ))
    }
}
