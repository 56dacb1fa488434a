//! Structured diagnostics produced by a resolution pass
//!
//! Resolvers never fail across their boundary. Anything the user should hear
//! about becomes a [`Diagnostic`] and the host decides how to surface it.

use crate::graph::{DeclaredType, Member, SourceSpan};
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Stable diagnostic identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticCode {
    /// Extension method is neither public nor module-internal
    InvalidAccessibility,
    /// Extension method is not static
    NotStatic,
    /// Extension method does not take exactly one parameter
    InvalidParameterCount,
    /// Extension method parameter is not the host registry type
    InvalidParameterType,
    /// A user composition root exists but is not partial
    CompositionRootNotPartial,
    /// Composition source does not implement the host root contract
    CompositionSourceNotRoot,
    /// Implicit contract picked from several candidate interfaces
    AmbiguousContract,
}

impl DiagnosticCode {
    pub fn id(&self) -> &'static str {
        match self {
            Self::InvalidAccessibility => "DIW0001",
            Self::NotStatic => "DIW0002",
            Self::InvalidParameterCount => "DIW0003",
            Self::InvalidParameterType => "DIW0004",
            Self::CompositionRootNotPartial => "DIW0005",
            Self::CompositionSourceNotRoot => "DIW0006",
            Self::AmbiguousContract => "DIW0101",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidAccessibility => "Invalid method accessor",
            Self::NotStatic => "Method must be static",
            Self::InvalidParameterCount => "Invalid parameter count",
            Self::InvalidParameterType => "Invalid parameter type",
            Self::CompositionRootNotPartial => "Composition root not partial",
            Self::CompositionSourceNotRoot => "Composition source is not a composition root",
            Self::AmbiguousContract => "Ambiguous implicit contract",
        }
    }

    /// Message template with positional `{n}` placeholders.
    pub fn template(&self) -> &'static str {
        match self {
            Self::InvalidAccessibility => "Method {0} on type {1} must be public or internal",
            Self::NotStatic => "Method {0} on type {1} must be static",
            Self::InvalidParameterCount => {
                "Method {0} on type {1} must have exactly one parameter of type {2}"
            }
            Self::InvalidParameterType => "Method {0} on type {1} must have input parameter of type {2}",
            Self::CompositionRootNotPartial => "{0} must be partial",
            Self::CompositionSourceNotRoot => {
                "Method {0} marks type {1} as a composition source but {1} does not implement {2}"
            }
            Self::AmbiguousContract => {
                "Type {0} implements {1} interfaces and no explicit contract was given; {2} was used"
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::AmbiguousContract => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this diagnostic aborts the whole pass.
    #[inline]
    pub fn is_fatal_to_pass(&self) -> bool {
        matches!(self, Self::CompositionRootNotPartial)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Where a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub type_name: String,
    pub member: Option<String>,
    pub span: Option<SourceSpan>,
}

impl Location {
    pub fn of_type(ty: &DeclaredType) -> Self {
        Self {
            type_name: ty.qualified_name(),
            member: None,
            span: ty.span().cloned(),
        }
    }

    pub fn of_member(ty: &DeclaredType, member: &Member) -> Self {
        Self {
            type_name: ty.qualified_name(),
            member: Some(member.name().to_owned()),
            span: member.span().or(ty.span()).cloned(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)?;
        if let Some(member) = &self.member {
            write!(f, ".{member}")?;
        }
        if let Some(span) = &self.span {
            write!(f, " ({span})")?;
        }
        Ok(())
    }
}

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    /// Create a diagnostic, filling the code's template with `args`.
    pub fn new(code: DiagnosticCode, location: Location, args: &[&str]) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: format_template(code.template(), args),
            location,
        }
    }

    #[inline]
    pub fn id(&self) -> &'static str {
        self.code.id()
    }

    #[inline]
    pub fn title(&self) -> &'static str {
        self.code.title()
    }

    #[inline]
    pub fn template(&self) -> &'static str {
        self.code.template()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {} at {}",
            self.severity,
            self.code,
            self.code.title(),
            self.message,
            self.location
        )
    }
}

fn format_template(template: &str, args: &[&str]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_owned(), |message, (i, arg)| {
            message.replace(&format!("{{{i}}}"), arg)
        })
}

/// Accumulates diagnostics for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.records.push(diagnostic);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.records.iter()
    }

    /// True if any recorded diagnostic aborts the pass.
    pub fn has_fatal(&self) -> bool {
        self.records.iter().any(|d| d.code.is_fatal_to_pass())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(move |d| d.code == code)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.records
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
