//! Strategy lookup and codec resolution.
//!
//! The [`Linker`] is built once per generation round from the class table,
//! the registry and the generator defaults, and is never mutated, so it can
//! be shared across threads.
//!
//! Two questions are answered here:
//!
//! - [`Linker::find_symbol`]: which inline strategy handles a type at a use
//!   site. Types no inline strategy accepts become injected codecs.
//! - [`Linker::resolve`]: which registered codec serves an injected type,
//!   together with every codec its dependencies need. Results are memoised
//!   per `(type, direction)` for one call; a dependency already on the
//!   resolution path becomes a [`Link::Deferred`] instead of being resolved
//!   again.

use crate::config::GeneratorConfig;
use crate::registry::{Registry, StrategyKind, TypeResolutionError};
use crate::symbols::Symbol;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};
use typecodec_common::{RecursionGuard, RecursionProfile, RecursionResult};
use typecodec_types::{ClassTable, TypeExpr};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Direction {
    Serialize,
    Deserialize,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Serialize => "serializer",
            Direction::Deserialize => "deserializer",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CodecKey {
    pub ty: TypeExpr,
    pub direction: Direction,
}

/// Edge from a resolved codec to one of its dependencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Link {
    Resolved(CodecKey),
    /// The dependency is an ancestor on the resolution path and is looked up
    /// by key when used.
    Deferred(CodecKey),
}

impl Link {
    pub fn key(&self) -> &CodecKey {
        match self {
            Link::Resolved(key) | Link::Deferred(key) => key,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCodec {
    pub key: CodecKey,
    /// Index of the registry entry.
    pub entry: usize,
    pub kind: StrategyKind,
    /// Entry pattern with the inferred bindings applied.
    pub declared: TypeExpr,
    pub dependencies: Vec<Link>,
}

/// Every codec reached while resolving one root key.
#[derive(Clone, Debug)]
pub struct Resolution {
    root: CodecKey,
    codecs: IndexMap<CodecKey, ResolvedCodec>,
}

impl Resolution {
    pub fn root(&self) -> &ResolvedCodec {
        &self.codecs[&self.root]
    }

    pub fn get(&self, key: &CodecKey) -> Option<&ResolvedCodec> {
        self.codecs.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedCodec> {
        self.codecs.values()
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

/// Replace wildcard arguments by the type they stand for: the lower bound
/// if any, else the first upper bound.
pub fn capture_wildcards(ty: &TypeExpr) -> TypeExpr {
    ty.fold(&mut |t| match &t {
        TypeExpr::Wildcard(w) => w
            .lower
            .first()
            .or_else(|| w.upper.first())
            .cloned()
            .unwrap_or(t),
        _ => t,
    })
}

// =============================================================================
// Linker
// =============================================================================

pub struct Linker<'a> {
    table: &'a ClassTable,
    registry: &'a Registry,
    config: GeneratorConfig,
}

impl<'a> Linker<'a> {
    pub fn new(table: &'a ClassTable, registry: &'a Registry, config: GeneratorConfig) -> Self {
        Self {
            table,
            registry,
            config,
        }
    }

    #[inline]
    pub fn table(&self) -> &'a ClassTable {
        self.table
    }

    #[inline]
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    #[inline]
    pub fn config(&self) -> GeneratorConfig {
        self.config
    }

    /// The inline strategy for `ty`, or an injected codec if none applies.
    pub fn find_symbol(&self, ty: &TypeExpr) -> Symbol {
        let symbol = Symbol::inline_candidates()
            .into_iter()
            .find(|symbol| symbol.can_serialize(self.table, ty))
            .unwrap_or(Symbol::Injected { provider: false });
        trace!(target: "typecodec::linker", ty = %ty.display(self.table), ?symbol, "find_symbol");
        symbol
    }

    /// Resolve the registered codec for `(ty, direction)` and, recursively,
    /// its dependencies.
    pub fn resolve(&self, ty: &TypeExpr, direction: Direction) -> Result<Resolution, TypeResolutionError> {
        let root = CodecKey {
            ty: capture_wildcards(ty),
            direction,
        };
        let mut resolution = Resolution {
            root: root.clone(),
            codecs: IndexMap::new(),
        };
        let mut path = RecursionGuard::with_profile(RecursionProfile::Linking);
        self.resolve_into(root, &mut resolution, &mut path)?;
        Ok(resolution)
    }

    fn resolve_into(
        &self,
        key: CodecKey,
        resolution: &mut Resolution,
        path: &mut RecursionGuard<CodecKey>,
    ) -> Result<Link, TypeResolutionError> {
        if resolution.codecs.contains_key(&key) {
            return Ok(Link::Resolved(key));
        }
        match path.enter(key.clone()) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return Ok(Link::Deferred(key)),
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                debug!(target: "typecodec::linker", ty = %key.ty.display(self.table), "resolution depth exceeded");
                return Err(TypeResolutionError::NoCodec {
                    ty: key.ty.display(self.table).to_string(),
                    direction: key.direction,
                });
            }
        }
        let result = self.resolve_entered(&key, resolution, path);
        path.leave(&key);
        let codec = result?;
        resolution.codecs.insert(key.clone(), codec);
        Ok(Link::Resolved(key))
    }

    fn resolve_entered(
        &self,
        key: &CodecKey,
        resolution: &mut Resolution,
        path: &mut RecursionGuard<CodecKey>,
    ) -> Result<ResolvedCodec, TypeResolutionError> {
        let selected = self.registry.resolve(self.table, &key.ty, key.direction)?;
        let entry = self.registry.entry(selected.index);
        let mut dependencies = Vec::with_capacity(entry.dependencies.len());
        for dependency in &entry.dependencies {
            let concrete = capture_wildcards(&dependency.substitute(&selected.substitution));
            if concrete.has_free_variables() {
                return Err(TypeResolutionError::UnboundVariable {
                    ty: key.ty.display(self.table).to_string(),
                    dependency: concrete.display(self.table).to_string(),
                });
            }
            let dependency_key = CodecKey {
                ty: concrete,
                direction: key.direction,
            };
            dependencies.push(self.resolve_into(dependency_key, resolution, path)?);
        }
        debug!(
            target: "typecodec::linker",
            ty = %key.ty.display(self.table),
            direction = %key.direction,
            kind = ?entry.kind,
            dependencies = dependencies.len(),
            "resolved codec"
        );
        Ok(ResolvedCodec {
            key: key.clone(),
            entry: selected.index,
            kind: entry.kind,
            declared: selected.declared,
            dependencies,
        })
    }
}

#[cfg(test)]
#[path = "../tests/linker_tests.rs"]
mod linker_tests;
