//! Registration markers
//!
//! Markers are the declarative annotations the accessor found on types,
//! members and the module. Generic and non-generic spellings of the same
//! annotation collapse into one representation: the explicit contract may sit
//! in a named argument, in the marker's own type argument, or in a
//! constructor argument, and the engine does not care which.

use crate::descriptor::Lifetime;
use crate::graph::TypeRef;

/// Well-known marker argument names.
pub mod keys {
    pub const SERVICE_TYPE: &str = "ServiceType";
    pub const LIFETIME: &str = "Lifetime";
    pub const SERVICE_NAME: &str = "ServiceName";
    pub const INCLUDE_SERVICE_NAME: &str = "IncludeServiceName";
    pub const COMPOSITION_SOURCE: &str = "CompositionSource";
}

/// What a marker asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerKind {
    /// Register the annotated type
    Register,
    /// Module-wide: register every implementation of a contract
    RegisterAll,
    /// Decorate a contract with the annotated type
    Decorate,
    /// Call the annotated static method from the composition root
    RegistrationExtension,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "Register",
            Self::RegisterAll => "RegisterAll",
            Self::Decorate => "Decorate",
            Self::RegistrationExtension => "RegistrationExtension",
        }
    }

    #[inline]
    pub(crate) fn applies_to_types(&self) -> bool {
        matches!(self, Self::Register | Self::Decorate)
    }

    #[inline]
    pub(crate) fn applies_to_members(&self) -> bool {
        matches!(self, Self::RegistrationExtension)
    }

    #[inline]
    pub(crate) fn applies_to_module(&self) -> bool {
        matches!(self, Self::RegisterAll)
    }
}

/// A resolved marker argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Lifetime(Lifetime),
    Type(TypeRef),
}

impl MarkerValue {
    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            Self::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Booleans, or strings that parse as one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(s) => s.trim().to_ascii_lowercase().parse().ok(),
            _ => None,
        }
    }

    /// Lifetime enumerants, their names, or their integer tags.
    pub fn as_lifetime(&self) -> Option<Lifetime> {
        match self {
            Self::Lifetime(lifetime) => Some(*lifetime),
            Self::Str(s) => s.parse().ok(),
            Self::Int(tag) => u8::try_from(*tag)
                .ok()
                .and_then(|tag| Lifetime::try_from(tag).ok()),
            _ => None,
        }
    }
}

impl From<bool> for MarkerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MarkerValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for MarkerValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for MarkerValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Lifetime> for MarkerValue {
    fn from(value: Lifetime) -> Self {
        Self::Lifetime(value)
    }
}

impl From<TypeRef> for MarkerValue {
    fn from(value: TypeRef) -> Self {
        Self::Type(value)
    }
}

/// A marker instance attached to a type, a member or the module.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    kind: MarkerKind,
    arguments: Vec<(String, MarkerValue)>,
    type_argument: Option<TypeRef>,
    constructor_arguments: Vec<MarkerValue>,
}

impl Marker {
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            kind,
            arguments: Vec::new(),
            type_argument: None,
            constructor_arguments: Vec::new(),
        }
    }

    /// `[Register]`
    pub fn register() -> Self {
        Self::new(MarkerKind::Register)
    }

    /// `[Decorate]`
    pub fn decorate() -> Self {
        Self::new(MarkerKind::Decorate)
    }

    /// `[RegistrationExtension]`
    pub fn registration_extension() -> Self {
        Self::new(MarkerKind::RegistrationExtension)
    }

    /// `[assembly: RegisterAll(typeof(T))]`
    pub fn register_all(contract: TypeRef) -> Self {
        Self::new(MarkerKind::RegisterAll).with_constructor_argument(contract)
    }

    /// `[assembly: RegisterAll<T>]`
    pub fn register_all_of(contract: TypeRef) -> Self {
        Self::new(MarkerKind::RegisterAll).with_type_argument(contract)
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<MarkerValue>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    /// The marker's own generic argument (`[Register<IService>]`).
    pub fn with_type_argument(mut self, contract: TypeRef) -> Self {
        self.type_argument = Some(contract);
        self
    }

    pub fn with_constructor_argument(mut self, value: impl Into<MarkerValue>) -> Self {
        self.constructor_arguments.push(value.into());
        self
    }

    pub fn with_service_type(self, contract: TypeRef) -> Self {
        self.with_argument(keys::SERVICE_TYPE, contract)
    }

    pub fn with_lifetime(self, lifetime: Lifetime) -> Self {
        self.with_argument(keys::LIFETIME, lifetime)
    }

    pub fn with_service_name(self, name: impl Into<String>) -> Self {
        self.with_argument(keys::SERVICE_NAME, name.into())
    }

    pub fn include_service_name(self) -> Self {
        self.with_argument(keys::INCLUDE_SERVICE_NAME, true)
    }

    pub fn as_composition_source(self) -> Self {
        self.with_argument(keys::COMPOSITION_SOURCE, true)
    }

    #[inline]
    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    #[inline]
    pub fn arguments(&self) -> &[(String, MarkerValue)] {
        &self.arguments
    }

    #[inline]
    pub fn type_argument(&self) -> Option<&TypeRef> {
        self.type_argument.as_ref()
    }

    #[inline]
    pub fn constructor_arguments(&self) -> &[MarkerValue] {
        &self.constructor_arguments
    }

    /// First named argument with the given key.
    pub fn argument(&self, name: &str) -> Option<&MarkerValue> {
        self.arguments
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Explicitly supplied contract: named `ServiceType`, then the marker's
    /// type argument, then the first constructor argument.
    pub fn explicit_contract(&self) -> Option<&TypeRef> {
        if let Some(contract) = self.argument(keys::SERVICE_TYPE).and_then(MarkerValue::as_type) {
            return Some(contract);
        }
        if let Some(contract) = &self.type_argument {
            return Some(contract);
        }
        self.constructor_arguments.first().and_then(MarkerValue::as_type)
    }

    /// Requested lifetime. Named argument first, then any constructor
    /// argument carrying one; Transient when absent or unparsable.
    pub fn lifetime(&self) -> Lifetime {
        if let Some(lifetime) = self.argument(keys::LIFETIME).and_then(MarkerValue::as_lifetime) {
            return lifetime;
        }
        self.constructor_arguments
            .iter()
            .filter(|value| matches!(value, MarkerValue::Lifetime(_)))
            .find_map(MarkerValue::as_lifetime)
            .unwrap_or_default()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.argument(keys::SERVICE_NAME).and_then(MarkerValue::as_str)
    }

    pub fn includes_service_name(&self) -> bool {
        self.argument(keys::INCLUDE_SERVICE_NAME)
            .and_then(MarkerValue::as_bool)
            .unwrap_or(false)
    }

    pub fn is_composition_source(&self) -> bool {
        self.argument(keys::COMPOSITION_SOURCE)
            .and_then(MarkerValue::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_contract_precedence() {
        let named = TypeRef::interface("App", "INamed");
        let generic = TypeRef::interface("App", "IGeneric");
        let ctor = TypeRef::interface("App", "ICtor");

        let marker = Marker::register()
            .with_constructor_argument(ctor.clone())
            .with_type_argument(generic.clone())
            .with_service_type(named.clone());
        assert_eq!(marker.explicit_contract(), Some(&named));

        let marker = Marker::register()
            .with_constructor_argument(ctor.clone())
            .with_type_argument(generic.clone());
        assert_eq!(marker.explicit_contract(), Some(&generic));

        let marker = Marker::register_all(ctor.clone());
        assert_eq!(marker.explicit_contract(), Some(&ctor));

        assert!(Marker::register().explicit_contract().is_none());
    }

    #[test]
    fn test_lifetime_defaults_and_parsing() {
        assert_eq!(Marker::register().lifetime(), Lifetime::Transient);
        assert_eq!(
            Marker::register().with_lifetime(Lifetime::Scoped).lifetime(),
            Lifetime::Scoped
        );
        assert_eq!(
            Marker::register().with_argument(keys::LIFETIME, "Singleton").lifetime(),
            Lifetime::Singleton
        );
        assert_eq!(
            Marker::register().with_argument(keys::LIFETIME, 1i64).lifetime(),
            Lifetime::Scoped
        );
        assert_eq!(
            Marker::register().with_argument(keys::LIFETIME, "Forever").lifetime(),
            Lifetime::Transient
        );
        assert_eq!(
            Marker::register().with_argument(keys::LIFETIME, 9i64).lifetime(),
            Lifetime::Transient
        );
    }

    #[test]
    fn test_lifetime_from_constructor_argument() {
        let marker = Marker::register_all(TypeRef::interface("App", "IService"))
            .with_constructor_argument(Lifetime::Singleton);
        assert_eq!(marker.lifetime(), Lifetime::Singleton);
    }

    #[test]
    fn test_flags() {
        let marker = Marker::register_all(TypeRef::interface("App", "IService")).include_service_name();
        assert!(marker.includes_service_name());
        assert!(!Marker::register_all(TypeRef::interface("App", "IService")).includes_service_name());

        let marker = Marker::registration_extension().with_argument(keys::COMPOSITION_SOURCE, "True");
        assert!(marker.is_composition_source());
    }
}
