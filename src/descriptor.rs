//! Wiring descriptors handed to the emission layer
//!
//! These are the only outputs of a resolution pass besides diagnostics. They
//! carry names, not references into the graph, so they outlive the snapshot.

use crate::diagnostics::Diagnostic;
use crate::{Result, WiringError};
use std::fmt;
use std::str::FromStr;

/// Service lifetime specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// New instance on every resolve
    #[default]
    Transient,

    /// One instance per scope
    Scoped,

    /// Single instance shared across all resolves
    Singleton,
}

impl Lifetime {
    pub const ALL: [Lifetime; 3] = [Self::Transient, Self::Scoped, Self::Singleton];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "Transient",
            Self::Scoped => "Scoped",
            Self::Singleton => "Singleton",
        }
    }

    /// Numeric tag, matching declaration order.
    #[inline]
    pub fn tag(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for Lifetime {
    type Error = WiringError;

    fn try_from(tag: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(tag))
            .copied()
            .ok_or(WiringError::InvalidLifetimeTag(tag))
    }
}

impl FromStr for Lifetime {
    type Err = WiringError;

    /// Accepts enumerant names and their numeric tags.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(lifetime) = Self::ALL.iter().find(|l| l.as_str() == s) {
            return Ok(*lifetime);
        }
        match s.parse::<u8>() {
            Ok(tag) => Self::try_from(tag),
            Err(_) => Err(WiringError::UnknownLifetime(s.to_owned())),
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register a contract with an implementation.
///
/// `service_type` is absent for self-registrations, in which case the
/// implementation is emitted as the sole type argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registration {
    pub service_type: Option<String>,
    pub implementation_type_name: String,
    pub lifetime: Lifetime,
    pub service_name: Option<String>,
}

impl Registration {
    /// Build a registration, collapsing `contract == implementation` into a
    /// self-registration.
    pub fn new(
        service_type: Option<String>,
        implementation_type_name: impl Into<String>,
        lifetime: Lifetime,
        service_name: Option<String>,
    ) -> Self {
        let implementation_type_name = implementation_type_name.into();
        let service_type = service_type.filter(|s| *s != implementation_type_name);
        Self {
            service_type,
            implementation_type_name,
            lifetime,
            service_name,
        }
    }

    #[inline]
    pub fn is_self_registration(&self) -> bool {
        self.service_type.is_none()
    }

    /// Generic arguments for the emitted registration call.
    pub fn type_arguments(&self) -> Vec<&str> {
        match &self.service_type {
            Some(service) => vec![service.as_str(), self.implementation_type_name.as_str()],
            None => vec![self.implementation_type_name.as_str()],
        }
    }
}

/// Decorate a contract with a decorator implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decoration {
    pub decorated_type_name: String,
    pub decorator_type_name: String,
}

/// How an extension entry is wired into the composition root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvocationKind {
    /// Direct static call passing the registry through
    #[default]
    StaticCall,
    /// The declaring type is itself a composition root to register from
    CompositionSource,
}

/// A user-supplied configuration method to call from the composition root.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtensionInvocation {
    pub declaring_type_name: String,
    pub method_name: String,
    pub kind: InvocationKind,
    /// Validation failures. Non-empty suppresses the call.
    pub errors: Vec<Diagnostic>,
}

impl ExtensionInvocation {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One emitted wiring instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Descriptor {
    Registration(Registration),
    Decoration(Decoration),
    Extension(ExtensionInvocation),
}

impl Descriptor {
    pub fn as_registration(&self) -> Option<&Registration> {
        match self {
            Self::Registration(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_decoration(&self) -> Option<&Decoration> {
        match self {
            Self::Decoration(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&ExtensionInvocation> {
        match self {
            Self::Extension(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Registration> for Descriptor {
    fn from(value: Registration) -> Self {
        Self::Registration(value)
    }
}

impl From<Decoration> for Descriptor {
    fn from(value: Decoration) -> Self {
        Self::Decoration(value)
    }
}

impl From<ExtensionInvocation> for Descriptor {
    fn from(value: ExtensionInvocation) -> Self {
        Self::Extension(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_parse() {
        assert_eq!("Scoped".parse::<Lifetime>().unwrap(), Lifetime::Scoped);
        assert_eq!("2".parse::<Lifetime>().unwrap(), Lifetime::Singleton);
        assert_eq!(
            "scoped".parse::<Lifetime>().unwrap_err(),
            WiringError::UnknownLifetime("scoped".into())
        );
        assert_eq!(
            "7".parse::<Lifetime>().unwrap_err(),
            WiringError::InvalidLifetimeTag(7)
        );
    }

    #[test]
    fn test_lifetime_tags_round_trip() {
        for lifetime in Lifetime::ALL {
            assert_eq!(Lifetime::try_from(lifetime.tag()).unwrap(), lifetime);
        }
        assert_eq!(Lifetime::default(), Lifetime::Transient);
    }

    #[test]
    fn test_registration_collapses_self() {
        let reg = Registration::new(
            Some("App.Service".into()),
            "App.Service",
            Lifetime::Transient,
            None,
        );
        assert!(reg.is_self_registration());
        assert_eq!(reg.type_arguments(), vec!["App.Service"]);

        let reg = Registration::new(
            Some("App.IService".into()),
            "App.Service",
            Lifetime::Transient,
            None,
        );
        assert_eq!(reg.type_arguments(), vec!["App.IService", "App.Service"]);
    }
}
