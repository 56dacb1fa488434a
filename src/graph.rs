//! Type graph snapshot consumed by the resolution engine
//!
//! The graph is produced by whatever tooling parses the host language. The
//! engine only reads it: every resolver borrows a [`TypeGraph`] immutably for
//! the duration of one pass.
//!
//! # Example
//!
//! ```rust
//! use dependency_wiring::{DeclaredType, Marker, TypeGraph, TypeRef};
//!
//! let graph = TypeGraph::builder("Demo")
//!     .declare(DeclaredType::interface("Demo", "IService"))
//!     .declare(
//!         DeclaredType::class("Demo", "Service")
//!             .implements(TypeRef::interface("Demo", "IService"))
//!             .with_marker(Marker::register()),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(graph.len(), 2);
//! assert!(graph.find(&TypeRef::class("Demo", "Service")).is_some());
//! ```

use crate::marker::{Marker, MarkerKind};
use crate::{Result, WiringError};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use std::fmt;

#[cfg(feature = "logging")]
use tracing::trace;

// =============================================================================
// Type References
// =============================================================================

/// Kind of a referenced or declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    /// A generic type parameter such as `T`
    Parameter,
    /// A symbol the accessor could not fully resolve
    Error,
}

/// Generic arguments carried by a [`TypeRef`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Generics {
    #[default]
    None,
    /// Closed (or parameterised) argument list
    Bound(Vec<TypeRef>),
    /// Arguments erased, only the arity is known
    Unbound(usize),
}

/// A reference to a type, as it appears in a base list, an interface list,
/// a parameter or a marker argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRef {
    namespace: String,
    name: String,
    kind: TypeKind,
    generics: Generics,
}

impl TypeRef {
    /// Create a reference of the given kind with no generic arguments.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            generics: Generics::None,
        }
    }

    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, TypeKind::Class)
    }

    pub fn structure(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, TypeKind::Struct)
    }

    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, TypeKind::Interface)
    }

    /// A generic type parameter (`T` in `Handler<T>`).
    pub fn parameter(name: impl Into<String>) -> Self {
        Self::new(String::new(), name, TypeKind::Parameter)
    }

    /// A broken or partially resolved symbol. Only the simple name is known.
    pub fn error(name: impl Into<String>) -> Self {
        Self::new(String::new(), name, TypeKind::Error)
    }

    /// Attach closed generic arguments.
    pub fn with_args(mut self, args: impl IntoIterator<Item = TypeRef>) -> Self {
        let args: Vec<_> = args.into_iter().collect();
        self.generics = if args.is_empty() {
            Generics::None
        } else {
            Generics::Bound(args)
        };
        self
    }

    /// Erase the arguments, keeping only the arity (`IHandler<>`).
    pub fn unbound(mut self, arity: usize) -> Self {
        self.generics = if arity == 0 {
            Generics::None
        } else {
            Generics::Unbound(arity)
        };
        self
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Simple name without namespace or arguments.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn generics(&self) -> &Generics {
        &self.generics
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind == TypeKind::Error
    }

    #[inline]
    pub fn is_parameter(&self) -> bool {
        self.kind == TypeKind::Parameter
    }

    /// Number of generic parameters, bound or not.
    pub fn arity(&self) -> usize {
        match &self.generics {
            Generics::None => 0,
            Generics::Bound(args) => args.len(),
            Generics::Unbound(arity) => *arity,
        }
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.arity() > 0
    }

    /// True for erased generics and for generic definitions whose arguments
    /// are all still type parameters.
    pub fn is_unbound(&self) -> bool {
        match &self.generics {
            Generics::None => false,
            Generics::Unbound(_) => true,
            Generics::Bound(args) => args.iter().all(TypeRef::is_parameter),
        }
    }

    /// Bound arguments, empty for non-generic and erased references.
    pub fn args(&self) -> &[TypeRef] {
        match &self.generics {
            Generics::Bound(args) => args,
            _ => &[],
        }
    }

    /// `Namespace.Name` without generic arguments.
    pub fn definition_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Fully qualified name including closed arguments: `Ns.Handler<Ns.Order>`.
    pub fn qualified_name(&self) -> String {
        let mut out = self.definition_name();
        match &self.generics {
            Generics::None => {}
            Generics::Bound(args) => {
                out.push('<');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&arg.qualified_name());
                }
                out.push('>');
            }
            Generics::Unbound(arity) => push_unbound_suffix(&mut out, *arity),
        }
        out
    }

    /// Qualified name with arguments erased: `Ns.Handler<>`, `Ns.Map<,>`.
    pub fn unbound_name(&self) -> String {
        let mut out = self.definition_name();
        let arity = self.arity();
        if arity > 0 {
            push_unbound_suffix(&mut out, arity);
        }
        out
    }

    /// Display name used in descriptors.
    ///
    /// Broken symbols cannot be qualified, so they fall back to
    /// `{fallback_namespace}.{name}` when a fallback is supplied.
    pub fn display_name(&self, fallback_namespace: Option<&str>) -> String {
        if !self.is_error() {
            return self.qualified_name();
        }
        match fallback_namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }

    /// Replace type parameters named in `params` with the matching `args`.
    pub fn substitute(&self, params: &[TypeRef], args: &[TypeRef]) -> TypeRef {
        if self.is_parameter() {
            return params
                .iter()
                .position(|p| p.name == self.name)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone());
        }

        match &self.generics {
            Generics::Bound(own) => TypeRef {
                namespace: self.namespace.clone(),
                name: self.name.clone(),
                kind: self.kind,
                generics: Generics::Bound(own.iter().map(|a| a.substitute(params, args)).collect()),
            },
            _ => self.clone(),
        }
    }

    /// Index key shared by every closed form of one definition.
    #[inline]
    pub(crate) fn index_key(&self) -> String {
        self.unbound_name()
    }
}

fn push_unbound_suffix(out: &mut String, arity: usize) {
    out.push('<');
    for _ in 1..arity {
        out.push(',');
    }
    out.push('>');
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// Source position supplied by the accessor, carried into diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceSpan {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceSpan {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Declared accessibility of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Accessibility {
    Public,
    /// Visible within the declaring module only
    Internal,
    ProtectedInternal,
    Protected,
    PrivateProtected,
    #[default]
    Private,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A method declared on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    name: String,
    accessibility: Accessibility,
    is_static: bool,
    parameters: Vec<Parameter>,
    markers: Vec<Marker>,
    span: Option<SourceSpan>,
}

impl Member {
    /// A private instance method with no parameters.
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accessibility: Accessibility::Private,
            is_static: false,
            parameters: Vec::new(),
            markers: Vec::new(),
            span: None,
        }
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn public(self) -> Self {
        self.with_accessibility(Accessibility::Public)
    }

    pub fn internal(self) -> Self {
        self.with_accessibility(Accessibility::Internal)
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.parameters.push(Parameter::new(name, ty));
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn at(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn accessibility(&self) -> Accessibility {
        self.accessibility
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[inline]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[inline]
    pub fn span(&self) -> Option<&SourceSpan> {
        self.span.as_ref()
    }

    /// First marker of the given kind.
    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind() == kind)
    }
}

/// A type declared in the module under resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    reference: TypeRef,
    base: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    is_abstract: bool,
    is_partial: bool,
    members: Vec<Member>,
    markers: Vec<Marker>,
    span: Option<SourceSpan>,
}

impl DeclaredType {
    fn new(reference: TypeRef) -> Self {
        Self {
            reference,
            base: None,
            interfaces: Vec::new(),
            is_abstract: false,
            is_partial: false,
            members: Vec::new(),
            markers: Vec::new(),
            span: None,
        }
    }

    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeRef::class(namespace, name))
    }

    pub fn structure(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeRef::structure(namespace, name))
    }

    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeRef::interface(namespace, name))
    }

    /// Declare generic parameters: `Repository<T>`.
    pub fn generic<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference = self
            .reference
            .with_args(params.into_iter().map(TypeRef::parameter));
        self
    }

    pub fn inherits(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    pub fn implements(mut self, contract: TypeRef) -> Self {
        self.interfaces.push(contract);
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn partial(mut self) -> Self {
        self.is_partial = true;
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn at(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// The type as a reference, generic parameters included.
    #[inline]
    pub fn reference(&self) -> &TypeRef {
        &self.reference
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        self.reference.namespace()
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.reference.name()
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.reference.kind()
    }

    #[inline]
    pub fn qualified_name(&self) -> String {
        self.reference.qualified_name()
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.reference.is_interface()
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.reference.is_generic()
    }

    /// Interfaces are implicitly abstract.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract || self.is_interface()
    }

    #[inline]
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }

    #[inline]
    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// Directly implemented interfaces in declaration order.
    #[inline]
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// Generic parameters of the declaration.
    #[inline]
    pub fn type_params(&self) -> &[TypeRef] {
        self.reference.args()
    }

    #[inline]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    #[inline]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[inline]
    pub fn span(&self) -> Option<&SourceSpan> {
        self.span.as_ref()
    }

    /// All markers of the given kind, in attachment order.
    pub fn markers_of(&self, kind: MarkerKind) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |m| m.kind() == kind)
    }

    /// True when nothing on the type or its members asks for wiring.
    pub fn has_no_markers(&self) -> bool {
        self.markers.is_empty() && self.members.iter().all(|m| m.markers().is_empty())
    }
}

// =============================================================================
// Graph
// =============================================================================

/// Immutable snapshot of one module's declared types.
///
/// Types keep their declaration order, which is the order descriptors are
/// emitted in. A hashed index over unbound names backs the inheritance walks.
#[derive(Debug, Clone)]
pub struct TypeGraph {
    module_name: String,
    types: Vec<DeclaredType>,
    module_markers: Vec<Marker>,
    index: AHashMap<String, usize>,
}

impl TypeGraph {
    /// Start building a snapshot for the named module.
    pub fn builder(module_name: impl Into<String>) -> TypeGraphBuilder {
        TypeGraphBuilder::new(module_name)
    }

    #[inline]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Declared types in declaration order.
    #[inline]
    pub fn types(&self) -> &[DeclaredType] {
        &self.types
    }

    /// Module-level markers (bulk registration rules) in declaration order.
    #[inline]
    pub fn module_markers(&self) -> &[Marker] {
        &self.module_markers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up the declaration behind a reference. Any closed form finds its
    /// generic definition.
    pub fn find(&self, reference: &TypeRef) -> Option<&DeclaredType> {
        self.index
            .get(&reference.index_key())
            .map(|&idx| &self.types[idx])
    }

    /// Lexically smallest namespace declared in the module.
    pub fn default_namespace(&self) -> Option<&str> {
        self.types
            .iter()
            .map(DeclaredType::namespace)
            .filter(|ns| !ns.is_empty())
            .min()
    }

    /// Every interface `ty` implements, directly, through interface
    /// inheritance or through its base chain. Closed forms are substituted
    /// along the way. Breadth-first, declared interfaces first, no duplicates.
    ///
    /// A declaration is never expanded twice along one inheritance path, so
    /// recursive generic bases (`Node<T> : Node<Wrap<T>>`) terminate.
    pub fn all_interfaces(&self, ty: &DeclaredType) -> Vec<TypeRef> {
        let mut result = Vec::new();
        let mut seen_interfaces = AHashSet::new();
        let mut visited = AHashSet::new();
        let mut queue = VecDeque::from([(ty.reference().clone(), Vec::<String>::new())]);

        while let Some((current, path)) = queue.pop_front() {
            if !visited.insert(current.qualified_name()) {
                continue;
            }
            let Some(decl) = self.find(&current) else {
                continue;
            };
            let key = current.index_key();
            if path.contains(&key) {
                #[cfg(feature = "logging")]
                trace!(
                    target: "dependency_wiring",
                    ty = %ty.reference(),
                    recursive = %current,
                    "Recursive generic inheritance, stopping interface walk"
                );
                continue;
            }

            let mut path = path;
            path.push(key);
            let params = decl.type_params();
            let args = current.args();

            for iface in decl.interfaces() {
                let closed = iface.substitute(params, args);
                if seen_interfaces.insert(closed.qualified_name()) {
                    result.push(closed.clone());
                }
                queue.push_back((closed, path.clone()));
            }
            if let Some(base) = decl.base() {
                queue.push_back((base.substitute(params, args), path));
            }
        }

        result
    }

    /// Base-type chain of `ty`, nearest first, with closed forms substituted.
    ///
    /// The walk stops after the first ancestor that is not declared in the
    /// module (typically the universal root object) or on a cycle.
    pub fn ancestors(&self, ty: &DeclaredType) -> Vec<TypeRef> {
        let mut chain = Vec::new();
        let mut visited = AHashSet::new();
        visited.insert(ty.reference().index_key());

        let mut current = ty.base().cloned();
        let mut decl = ty;
        let mut current_args = ty.reference().args().to_vec();

        while let Some(base) = current {
            let closed = base.substitute(decl.type_params(), &current_args);
            if !visited.insert(closed.index_key()) {
                #[cfg(feature = "logging")]
                trace!(
                    target: "dependency_wiring",
                    ty = %ty.reference(),
                    ancestor = %closed,
                    "Inheritance cycle detected, stopping base walk"
                );
                break;
            }
            chain.push(closed.clone());

            match self.find(&closed) {
                Some(next) => {
                    current = next.base().cloned();
                    current_args = closed.args().to_vec();
                    decl = next;
                }
                None => break,
            }
        }

        chain
    }

    /// Whether `ty` implements the interface named `contract` (qualified or
    /// definition name).
    pub fn implements(&self, ty: &DeclaredType, contract: &str) -> bool {
        self.all_interfaces(ty)
            .iter()
            .any(|i| i.qualified_name() == contract || i.definition_name() == contract)
    }
}

/// Builder for [`TypeGraph`] snapshots.
#[derive(Debug, Clone)]
pub struct TypeGraphBuilder {
    module_name: String,
    types: Vec<DeclaredType>,
    module_markers: Vec<Marker>,
}

impl TypeGraphBuilder {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            types: Vec::new(),
            module_markers: Vec::new(),
        }
    }

    /// Add a declared type. Declaration order is preserved.
    pub fn declare(mut self, ty: DeclaredType) -> Self {
        self.types.push(ty);
        self
    }

    /// Add a module-level marker.
    pub fn module_marker(mut self, marker: Marker) -> Self {
        self.module_markers.push(marker);
        self
    }

    /// Validate and freeze the snapshot.
    ///
    /// Fails on duplicate declarations and on markers attached to a target
    /// their kind does not support.
    pub fn build(self) -> Result<TypeGraph> {
        let mut index = AHashMap::with_capacity(self.types.len());

        for (idx, ty) in self.types.iter().enumerate() {
            if index.insert(ty.reference().index_key(), idx).is_some() {
                return Err(WiringError::duplicate_type(ty.qualified_name()));
            }

            for marker in ty.markers() {
                if !marker.kind().applies_to_types() {
                    return Err(WiringError::misplaced_marker(
                        marker.kind().as_str(),
                        ty.qualified_name(),
                    ));
                }
            }

            for member in ty.members() {
                for marker in member.markers() {
                    if !marker.kind().applies_to_members() {
                        return Err(WiringError::misplaced_marker(
                            marker.kind().as_str(),
                            format!("{}.{}", ty.qualified_name(), member.name()),
                        ));
                    }
                }
            }
        }

        for marker in &self.module_markers {
            if !marker.kind().applies_to_module() {
                return Err(WiringError::misplaced_marker(
                    marker.kind().as_str(),
                    self.module_name.clone(),
                ));
            }
        }

        Ok(TypeGraph {
            module_name: self.module_name,
            types: self.types,
            module_markers: self.module_markers,
            index,
        })
    }
}
