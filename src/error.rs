//! Error types for wiring resolution

use thiserror::Error;

/// Errors that can occur while building a type graph snapshot or decoding
/// engine-generated values.
///
/// Data-dependent resolution problems (an unresolvable contract, an
/// unparsable lifetime) never surface here. They produce empty results or
/// [`Diagnostic`](crate::Diagnostic) records instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WiringError {
    /// The same type was declared twice in one module snapshot
    #[error("Type declared more than once: {type_name}")]
    DuplicateType { type_name: String },

    /// A marker kind was attached somewhere it cannot appear
    #[error("Marker {marker} cannot be attached to {target}")]
    MisplacedMarker {
        marker: &'static str,
        target: String,
    },

    /// A lifetime name did not match any enumerant
    #[error("Unknown lifetime: {0}")]
    UnknownLifetime(String),

    /// A lifetime tag produced by the engine itself is out of range
    #[error("Invalid lifetime tag: {0}")]
    InvalidLifetimeTag(u8),
}

impl WiringError {
    /// Create a DuplicateType error
    #[inline]
    pub fn duplicate_type(type_name: impl Into<String>) -> Self {
        Self::DuplicateType {
            type_name: type_name.into(),
        }
    }

    /// Create a MisplacedMarker error
    #[inline]
    pub fn misplaced_marker(marker: &'static str, target: impl Into<String>) -> Self {
        Self::MisplacedMarker {
            marker,
            target: target.into(),
        }
    }
}

/// Result type alias for wiring operations
pub type Result<T> = std::result::Result<T, WiringError>;
