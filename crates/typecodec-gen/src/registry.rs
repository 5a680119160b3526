//! Registered strategies and most-specific selection.
//!
//! Every entry declares a type pattern whose free variables are the
//! strategy's own parameters (`List<E>`), plus the nested patterns it needs
//! codecs for (`E`). Lookup differs by direction:
//!
//! | Direction | Match | Choice among matches |
//! |-----------|-------|----------------------|
//! | deserialize | `infer_exact` | first registered |
//! | serialize | `infer_contravariant` | most specific declared type, then first registered |
//!
//! "Most specific" compares the substituted declared types with strict
//! assignability: a candidate loses if its declared type is a proper
//! supertype of another candidate's. Unrelated maximal candidates are
//! resolved by registration order, so lookup is deterministic.

use crate::linker::Direction;
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};
use typecodec_common::ProblemCode;
use typecodec_types::{
    ClassTable, InferenceError, Substitution, TypeExpr, VarOwner, try_infer_contravariant,
    try_infer_exact, well_known,
};

/// The strategy family an entry stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StrategyKind {
    Primitive,
    String,
    Enum,
    Iterable,
    StringMap,
    Optional,
    /// A codec generated for a serializable bean.
    Generated,
    /// Untyped values through `decode_arbitrary`/`encode_arbitrary`.
    Arbitrary,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub pattern: TypeExpr,
    pub kind: StrategyKind,
    /// Nested patterns, over the pattern's variables, that need codecs too.
    pub dependencies: Vec<TypeExpr>,
    pub serialize: bool,
    pub deserialize: bool,
}

impl RegistryEntry {
    pub fn new(pattern: TypeExpr, kind: StrategyKind) -> Self {
        Self {
            pattern,
            kind,
            dependencies: Vec::new(),
            serialize: true,
            deserialize: true,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<TypeExpr>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn serialize_only(mut self) -> Self {
        self.deserialize = false;
        self
    }

    pub fn deserialize_only(mut self) -> Self {
        self.serialize = false;
        self
    }

    pub fn supports(&self, direction: Direction) -> bool {
        match direction {
            Direction::Serialize => self.serialize,
            Direction::Deserialize => self.deserialize,
        }
    }
}

/// A matched entry with the bindings that made it match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selected {
    pub index: usize,
    pub substitution: Substitution,
    /// The entry pattern with the bindings applied.
    pub declared: TypeExpr,
}

/// Failure to find or instantiate a codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeResolutionError {
    NoCodec { ty: String, direction: Direction },
    /// A pattern variable matched two different types.
    InconsistentBinding { ty: String, variable: String },
    /// A dependency still mentions a variable after substitution.
    UnboundVariable { ty: String, dependency: String },
}

impl TypeResolutionError {
    pub fn code(&self) -> ProblemCode {
        match self {
            Self::NoCodec { .. } => ProblemCode::NoCodec,
            Self::InconsistentBinding { .. } => ProblemCode::InconsistentBinding,
            Self::UnboundVariable { .. } => ProblemCode::UnboundVariable,
        }
    }
}

impl fmt::Display for TypeResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCodec { ty, direction } => write!(f, "No {direction} found for type {ty}"),
            Self::InconsistentBinding { ty, variable } => {
                write!(f, "Inconsistent binding of {variable} while matching {ty}")
            }
            Self::UnboundVariable { ty, dependency } => {
                write!(f, "Dependency {dependency} of {ty} has unbound type variables")
            }
        }
    }
}

impl std::error::Error for TypeResolutionError {}

// =============================================================================
// Registry
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in strategies, in priority order:
    ///
    /// 1. `Object` (arbitrary values)
    /// 2. primitives, boxes, `BigInteger`, `BigDecimal`
    /// 3. `String`, `CharSequence`
    /// 4. `Iterable`, `Collection`, `List`, `ArrayList`, `Set`, arrays
    /// 5. `Map`, `HashMap`, `LinkedHashMap` with `String` keys
    /// 6. `Optional`
    /// 7. `Enum<E>` (serialization only)
    pub fn standard(table: &ClassTable) -> Self {
        use well_known::*;

        let mut registry = Self::new();
        registry.register(RegistryEntry::new(TypeExpr::Raw(OBJECT), StrategyKind::Arbitrary));

        for id in [BOOLEAN, BYTE, SHORT, CHAR, INT, LONG, FLOAT, DOUBLE] {
            registry.register(RegistryEntry::new(TypeExpr::Raw(id), StrategyKind::Primitive));
        }
        for (_, boxed) in BOXES {
            registry.register(RegistryEntry::new(TypeExpr::Raw(boxed), StrategyKind::Primitive));
        }
        for id in [BIG_INTEGER, BIG_DECIMAL] {
            registry.register(RegistryEntry::new(TypeExpr::Raw(id), StrategyKind::Primitive));
        }
        for id in [STRING, CHAR_SEQUENCE] {
            registry.register(RegistryEntry::new(TypeExpr::Raw(id), StrategyKind::String));
        }

        for id in [ITERABLE, COLLECTION, LIST, ARRAY_LIST, SET] {
            let pattern = table.parameterize_with_own_variables(id);
            let element = pattern.params()[0].clone();
            registry.register(
                RegistryEntry::new(pattern, StrategyKind::Iterable).with_dependencies(vec![element]),
            );
        }
        let component = TypeExpr::variable(
            VarOwner::Method {
                class: OBJECT,
                method: "<array>".into(),
            },
            "T",
        );
        registry.register(
            RegistryEntry::new(TypeExpr::array(component.clone()), StrategyKind::Iterable)
                .with_dependencies(vec![component]),
        );

        for id in [MAP, HASH_MAP, LINKED_HASH_MAP] {
            let own = table.parameterize_with_own_variables(id);
            let value = own.params()[1].clone();
            let pattern = TypeExpr::parameterized(id, vec![TypeExpr::Raw(STRING), value.clone()]);
            registry.register(
                RegistryEntry::new(pattern, StrategyKind::StringMap).with_dependencies(vec![value]),
            );
        }

        let optional = table.parameterize_with_own_variables(OPTIONAL);
        let inner = optional.params()[0].clone();
        registry.register(
            RegistryEntry::new(optional, StrategyKind::Optional).with_dependencies(vec![inner]),
        );

        registry.register(
            RegistryEntry::new(table.parameterize_with_own_variables(ENUM), StrategyKind::Enum)
                .serialize_only(),
        );
        registry
    }

    /// [`standard`](Self::standard) plus a generated codec for every
    /// serializable class and an exact decoder for every user enum.
    pub fn for_model(table: &ClassTable) -> Self {
        let mut registry = Self::standard(table);
        for id in table.user_ids() {
            let decl = table.class(id);
            if table.is_enum(id) {
                registry.register(
                    RegistryEntry::new(TypeExpr::Raw(id), StrategyKind::Enum).deserialize_only(),
                );
            } else if decl.annotations.serializable {
                registry.register(RegistryEntry::new(
                    table.parameterize_with_own_variables(id),
                    StrategyKind::Generated,
                ));
            }
        }
        debug!(target: "typecodec::registry", entries = registry.len(), "Registry::for_model");
        registry
    }

    pub fn register(&mut self, entry: RegistryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> &RegistryEntry {
        &self.entries[index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(
        &self,
        table: &ClassTable,
        ty: &TypeExpr,
        direction: Direction,
    ) -> Result<Selected, TypeResolutionError> {
        match direction {
            Direction::Serialize => self.resolve_serializer(table, ty),
            Direction::Deserialize => self.resolve_deserializer(table, ty),
        }
    }

    /// First entry whose pattern unifies exactly with `ty`.
    pub fn resolve_deserializer(&self, table: &ClassTable, ty: &TypeExpr) -> Result<Selected, TypeResolutionError> {
        let mut conflict = None;
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.deserialize {
                continue;
            }
            match try_infer_exact(table, &entry.pattern, ty) {
                Ok(substitution) => {
                    trace!(target: "typecodec::registry", ty = %ty.display(table), index, "deserializer match");
                    return Ok(Selected {
                        index,
                        declared: entry.pattern.substitute(&substitution),
                        substitution,
                    });
                }
                Err(InferenceError::Conflict { var, .. }) => conflict = conflict.or(Some(var)),
                Err(_) => {}
            }
        }
        Err(self.no_match(table, ty, Direction::Deserialize, conflict.map(|var| var.name.to_string())))
    }

    /// Most specific entry whose pattern is a supertype of `ty`.
    pub fn resolve_serializer(&self, table: &ClassTable, ty: &TypeExpr) -> Result<Selected, TypeResolutionError> {
        let mut conflict = None;
        let mut candidates = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.serialize {
                continue;
            }
            match try_infer_contravariant(table, &entry.pattern, ty) {
                Ok(substitution) => candidates.push(Selected {
                    index,
                    declared: entry.pattern.substitute(&substitution),
                    substitution,
                }),
                Err(InferenceError::Conflict { var, .. }) => conflict = conflict.or(Some(var)),
                Err(_) => {}
            }
        }

        let most_specific = candidates.iter().position(|candidate| {
            !candidates.iter().any(|other| {
                other.declared != candidate.declared
                    && candidate.declared.is_assignable_from(table, &other.declared, true)
            })
        });
        match most_specific {
            Some(position) => {
                let selected = candidates.swap_remove(position);
                debug!(
                    target: "typecodec::registry",
                    ty = %ty.display(table),
                    declared = %selected.declared.display(table),
                    kind = ?self.entries[selected.index].kind,
                    "selected serializer"
                );
                Ok(selected)
            }
            None => Err(self.no_match(table, ty, Direction::Serialize, conflict.map(|var| var.name.to_string()))),
        }
    }

    fn no_match(
        &self,
        table: &ClassTable,
        ty: &TypeExpr,
        direction: Direction,
        conflict: Option<String>,
    ) -> TypeResolutionError {
        let rendered = ty.display(table).to_string();
        match conflict {
            Some(variable) => TypeResolutionError::InconsistentBinding { ty: rendered, variable },
            None => TypeResolutionError::NoCodec { ty: rendered, direction },
        }
    }
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod registry_tests;
