//! Decoration pairing
//!
//! A `Decorate` marker wraps an existing contract with the marked type. The
//! decorated contract is resolved like a registration contract. A type that
//! would decorate itself yields nothing.

use crate::config::HostProfile;
use crate::descriptor::Decoration;
use crate::graph::DeclaredType;
use crate::marker::MarkerKind;
use crate::service_type::{ServiceTypeResolver, is_same_type};

#[cfg(feature = "logging")]
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct DecorationResolver<'a> {
    service_types: ServiceTypeResolver<'a>,
}

impl<'a> DecorationResolver<'a> {
    pub fn new(host: &'a HostProfile) -> Self {
        Self {
            service_types: ServiceTypeResolver::new(host),
        }
    }

    /// Decoration for the first `Decorate` marker on `ty`, if a contract other
    /// than `ty` itself can be found.
    pub fn resolve(&self, ty: &DeclaredType) -> Option<Decoration> {
        let marker = ty.markers_of(MarkerKind::Decorate).next()?;
        let service_type = self.service_types.resolve(ty, marker);

        if is_same_type(ty, &service_type.contract) {
            #[cfg(feature = "logging")]
            debug!(
                target: "dependency_wiring",
                decorator = %ty.reference(),
                "No decorated contract found, skipping decoration"
            );
            return None;
        }

        Some(Decoration {
            decorated_type_name: service_type.name,
            decorator_type_name: ty.qualified_name(),
        })
    }
}
