//! Service contract inference
//!
//! Given a declared type and one of its markers, decide which type other code
//! will depend on. First match wins:
//!
//! 1. an explicit contract on the marker,
//! 2. the first declared interface (the equality interface never counts),
//! 3. the base type, unless it is the universal root object,
//! 4. the type itself.

use crate::config::HostProfile;
use crate::graph::{DeclaredType, TypeRef};
use crate::marker::Marker;

/// Which precedence rule produced a [`ServiceType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractSource {
    Explicit,
    Interface,
    BaseType,
    SelfType,
}

/// A resolved contract and the name it is emitted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceType {
    pub contract: TypeRef,
    pub name: String,
    pub source: ContractSource,
}

impl ServiceType {
    fn new(contract: TypeRef, name: String, source: ContractSource) -> Self {
        Self {
            contract,
            name,
            source,
        }
    }
}

/// Resolves service contracts against a host profile.
#[derive(Debug, Clone, Copy)]
pub struct ServiceTypeResolver<'a> {
    host: &'a HostProfile,
}

impl<'a> ServiceTypeResolver<'a> {
    pub fn new(host: &'a HostProfile) -> Self {
        Self { host }
    }

    pub fn resolve(&self, ty: &DeclaredType, marker: &Marker) -> ServiceType {
        let namespace = Some(ty.namespace());

        if let Some(contract) = marker.explicit_contract() {
            let name = contract.display_name(namespace);
            return ServiceType::new(contract.clone(), name, ContractSource::Explicit);
        }

        if let Some(contract) = self.eligible_interfaces(ty).next() {
            let name = contract.display_name(namespace);
            return ServiceType::new(contract.clone(), name, ContractSource::Interface);
        }

        if let Some(base) = ty.base().filter(|base| !self.host.is_root_object(base)) {
            let name = base.display_name(namespace);
            return ServiceType::new(base.clone(), name, ContractSource::BaseType);
        }

        ServiceType::new(
            ty.reference().clone(),
            ty.qualified_name(),
            ContractSource::SelfType,
        )
    }

    /// Directly implemented interfaces that may serve as a contract.
    pub fn eligible_interfaces<'t>(
        &self,
        ty: &'t DeclaredType,
    ) -> impl Iterator<Item = &'t TypeRef> + use<'t, 'a> {
        let host = self.host;
        ty.interfaces()
            .iter()
            .filter(move |iface| !host.is_equality_contract(iface))
    }
}

/// Whether a resolved contract is the implementation itself, by qualified
/// name or, when both are generic, by unbound form.
pub fn is_same_type(ty: &DeclaredType, contract: &TypeRef) -> bool {
    let namespace = Some(ty.namespace());
    if ty.qualified_name() == contract.display_name(namespace) {
        return true;
    }
    ty.is_generic() && contract.is_generic() && ty.reference().unbound_name() == contract.unbound_name()
}
