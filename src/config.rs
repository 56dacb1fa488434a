//! Host framework profiles and resolver configuration
//!
//! The engine is framework-agnostic: every name it compares against (the
//! registry abstraction, the composition-root contract, the universal root
//! object) comes from a [`HostProfile`].
//!
//! # Example
//!
//! ```rust
//! use dependency_wiring::{HostProfile, ResolverConfig};
//!
//! let config = ResolverConfig::builder()
//!     .host(HostProfile::light_inject().clone())
//!     .warn_on_ambiguous_contract()
//!     .build();
//!
//! assert_eq!(config.host().registry_type, "LightInject.IServiceRegistry");
//! assert!(config.warns_on_ambiguous_contract());
//! ```

use crate::graph::TypeRef;
use once_cell::sync::Lazy;

static MICROSOFT: Lazy<HostProfile> = Lazy::new(|| HostProfile {
    name: "Microsoft.Extensions.DependencyInjection".into(),
    registry_type: "Microsoft.Extensions.DependencyInjection.IServiceCollection".into(),
    composition_root_name: None,
    composition_root_contract: None,
    equality_contract: "System.IEquatable".into(),
    root_object: "System.Object".into(),
});

static LIGHT_INJECT: Lazy<HostProfile> = Lazy::new(|| HostProfile {
    name: "LightInject".into(),
    registry_type: "LightInject.IServiceRegistry".into(),
    composition_root_name: Some("CompositionRoot".into()),
    composition_root_contract: Some("LightInject.ICompositionRoot".into()),
    equality_contract: "System.IEquatable".into(),
    root_object: "System.Object".into(),
});

/// Names the engine needs from the target injection framework.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostProfile {
    /// Human-readable framework name, used in logs
    pub name: String,
    /// Qualified name of the registry/collection abstraction that extension
    /// methods must accept
    pub registry_type: String,
    /// Simple name of a user-authored composition root, if the host has one
    pub composition_root_name: Option<String>,
    /// Qualified name of the host's composition-root contract
    pub composition_root_contract: Option<String>,
    /// Definition name of the equality interface, never a contract
    pub equality_contract: String,
    /// Definition name of the universal root object, never a contract
    pub root_object: String,
}

impl HostProfile {
    /// `Microsoft.Extensions.DependencyInjection` preset.
    pub fn microsoft() -> &'static HostProfile {
        &MICROSOFT
    }

    /// `LightInject` preset.
    pub fn light_inject() -> &'static HostProfile {
        &LIGHT_INJECT
    }

    #[inline]
    pub fn is_registry_type(&self, ty: &TypeRef) -> bool {
        ty.qualified_name() == self.registry_type
    }

    #[inline]
    pub fn is_equality_contract(&self, ty: &TypeRef) -> bool {
        ty.definition_name() == self.equality_contract
    }

    #[inline]
    pub fn is_root_object(&self, ty: &TypeRef) -> bool {
        ty.definition_name() == self.root_object
    }
}

impl Default for HostProfile {
    fn default() -> Self {
        MICROSOFT.clone()
    }
}

/// Configuration for one [`ResolutionEngine`](crate::ResolutionEngine).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverConfig {
    host: HostProfile,
    warn_on_ambiguous_contract: bool,
    parallel: bool,
}

impl ResolverConfig {
    /// Start a configuration builder
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }

    /// Default configuration for a host
    pub fn for_host(host: HostProfile) -> Self {
        Self {
            host,
            ..Self::default()
        }
    }

    #[inline]
    pub fn host(&self) -> &HostProfile {
        &self.host
    }

    /// Emit a warning when a contract is inferred from several interfaces
    #[inline]
    pub fn warns_on_ambiguous_contract(&self) -> bool {
        self.warn_on_ambiguous_contract
    }

    /// Resolve types on the rayon pool (needs the `parallel` feature)
    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }
}

/// Builder for [`ResolverConfig`]
#[derive(Debug, Clone, Default)]
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    /// Set the host profile
    pub fn host(mut self, host: HostProfile) -> Self {
        self.config.host = host;
        self
    }

    /// Target Microsoft.Extensions.DependencyInjection
    pub fn microsoft(self) -> Self {
        self.host(HostProfile::microsoft().clone())
    }

    /// Target LightInject
    pub fn light_inject(self) -> Self {
        self.host(HostProfile::light_inject().clone())
    }

    /// Warn when an implicit contract is chosen among several interfaces
    pub fn warn_on_ambiguous_contract(mut self) -> Self {
        self.config.warn_on_ambiguous_contract = true;
        self
    }

    /// Resolve independent types in parallel
    pub fn parallel(mut self) -> Self {
        self.config.parallel = true;
        self
    }

    pub fn build(self) -> ResolverConfig {
        self.config
    }
}
