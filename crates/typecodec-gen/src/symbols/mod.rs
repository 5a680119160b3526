//! Strategies, one per structural shape.
//!
//! A [`Symbol`] knows how to encode and decode one shape of type at a use
//! site. Dispatch is an exhaustive match, so a new shape has to be handled
//! at every site.
//!
//! | Symbol | Accepts | Null on the wire |
//! |--------|---------|------------------|
//! | `Primitive` | primitives, boxes, `BigInteger`, `BigDecimal` | via `Nullable` |
//! | `String` | `String`, `CharSequence` | via `Nullable` |
//! | `Enum` | user enums | via `Nullable` |
//! | `Iterable` | `Iterable` family, arrays | via `Nullable` |
//! | `StringMap` | `Map` family with `String` keys | via `Nullable` |
//! | `Optional` | `Optional<T>` | empty optional |
//! | `Bean` | serializable + inline classes | via `Nullable` |
//! | `Injected` | everything else, through a separate codec | the codec's own |
//!
//! ## Setters
//!
//! `deserialize` receives a [`Setter`]: given the expression for the decoded
//! value, it returns the statements that store it. Every strategy calls it
//! exactly once. Strategies whose value is only known after branching
//! decode into a temporary local first and pass that local to the setter.

mod condition;
mod containers;
mod enums;
mod indirect;
mod scalar;

pub use condition::{Check, Condition};

use crate::bean;
use crate::context::GeneratorContext;
use crate::linker::Linker;
use crate::plan::{Block, Expr, Local};
use typecodec_types::{ClassTable, Inclusion, TypeExpr, well_known};

/// Single-use store for a decoded value.
pub type Setter<'a> = Box<dyn FnOnce(Expr) -> Block + 'a>;

/// Receives the nested types a symbol needs, one level at a time.
pub trait DependencyVisitor {
    /// A nested type that is planned as part of the current structure.
    /// `segment` names it in readable paths.
    fn visit_structure_element(&mut self, symbol: &Symbol, ty: &TypeExpr, segment: &str);

    /// A nested type served by a separately generated codec.
    fn visit_injected(&mut self, ty: &TypeExpr, provider: bool);
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Primitive,
    String,
    Enum,
    /// `recursive` makes nested beans injected instead of inline.
    Iterable { recursive: bool },
    StringMap { recursive: bool },
    Optional { recursive: bool },
    Bean,
    Injected { provider: bool },
    /// Null guard around a symbol without null support.
    Nullable(Box<Symbol>),
}

impl Symbol {
    /// Inline symbols in lookup order.
    pub fn inline_candidates() -> [Symbol; 7] {
        [
            Symbol::Primitive,
            Symbol::String,
            Symbol::Enum,
            Symbol::Iterable { recursive: false },
            Symbol::StringMap { recursive: false },
            Symbol::Optional { recursive: false },
            Symbol::Bean,
        ]
    }

    pub fn can_serialize(&self, table: &ClassTable, ty: &TypeExpr) -> bool {
        match self {
            Symbol::Primitive => scalar::is_primitive_like(ty),
            Symbol::String => scalar::is_string(ty),
            Symbol::Enum => matches!(ty, TypeExpr::Raw(id) if table.is_enum(*id)),
            Symbol::Iterable { .. } => containers::is_iterable(ty),
            Symbol::StringMap { .. } => containers::is_string_map(table, ty),
            Symbol::Optional { .. } => ty.class_id() == Some(well_known::OPTIONAL),
            Symbol::Bean => bean::is_inline_bean(table, ty),
            Symbol::Injected { .. } => true,
            Symbol::Nullable(inner) => inner.can_serialize(table, ty),
        }
    }

    /// A variant that tolerates being part of a reference cycle.
    pub fn with_recursive_serialization(self) -> Symbol {
        match self {
            Symbol::Iterable { .. } => Symbol::Iterable { recursive: true },
            Symbol::StringMap { .. } => Symbol::StringMap { recursive: true },
            Symbol::Optional { .. } => Symbol::Optional { recursive: true },
            Symbol::Bean | Symbol::Injected { .. } => Symbol::Injected { provider: true },
            Symbol::Nullable(inner) => {
                let inner = inner.with_recursive_serialization();
                if inner.supports_null_deserialization() {
                    inner
                } else {
                    Symbol::Nullable(Box::new(inner))
                }
            }
            other @ (Symbol::Primitive | Symbol::String | Symbol::Enum) => other,
        }
    }

    pub fn supports_null_deserialization(&self) -> bool {
        matches!(
            self,
            Symbol::Optional { .. } | Symbol::Injected { .. } | Symbol::Nullable(_)
        )
    }

    /// Wrap in [`Symbol::Nullable`] unless null is already handled.
    pub fn nullable(self) -> Symbol {
        if self.supports_null_deserialization() {
            self
        } else {
            Symbol::Nullable(Box::new(self))
        }
    }

    pub fn visit_dependencies(&self, linker: &Linker<'_>, ty: &TypeExpr, visitor: &mut dyn DependencyVisitor) {
        match self {
            Symbol::Primitive | Symbol::String | Symbol::Enum => {}
            Symbol::Iterable { recursive } => {
                let element = containers::element_type(linker.table(), ty);
                let symbol = containers::element_symbol(linker, &element, *recursive);
                visitor.visit_structure_element(&symbol, &element, "[*]");
            }
            Symbol::StringMap { recursive } => {
                let value = containers::map_value_type(linker.table(), ty);
                let symbol = containers::element_symbol(linker, &value, *recursive);
                visitor.visit_structure_element(&symbol, &value, "[*]");
            }
            Symbol::Optional { recursive } => {
                let inner = indirect::optional_inner(ty);
                let symbol = indirect::optional_symbol(linker, &inner, *recursive);
                visitor.visit_structure_element(&symbol, &inner, "[*]");
            }
            Symbol::Bean => bean::visit_bean_dependencies(linker, ty, visitor),
            Symbol::Injected { provider } => visitor.visit_injected(ty, *provider),
            Symbol::Nullable(inner) => inner.visit_dependencies(linker, ty, visitor),
        }
    }

    /// Statements that write `value` to `encoder`.
    pub fn serialize(&self, ctx: &mut GeneratorContext<'_>, ty: &TypeExpr, encoder: Local, value: Expr) -> Block {
        match self {
            Symbol::Primitive | Symbol::String => scalar::serialize(ty, encoder, value),
            Symbol::Enum => enums::serialize(ctx, ty, encoder, value),
            Symbol::Iterable { recursive } => containers::serialize_iterable(ctx, ty, encoder, value, *recursive),
            Symbol::StringMap { recursive } => containers::serialize_map(ctx, ty, encoder, value, *recursive),
            Symbol::Optional { recursive } => indirect::serialize_optional(ctx, ty, encoder, value, *recursive),
            Symbol::Bean => bean::serialize_bean(ctx, ty, encoder, value),
            Symbol::Injected { provider } => indirect::serialize_injected(ctx, ty, encoder, value, *provider),
            Symbol::Nullable(inner) => indirect::serialize_nullable(ctx, inner, ty, encoder, value),
        }
    }

    /// Statements that read one value from `decoder` and hand it to
    /// `setter`.
    pub fn deserialize(
        &self,
        ctx: &mut GeneratorContext<'_>,
        ty: &TypeExpr,
        decoder: Local,
        setter: Setter<'_>,
    ) -> Block {
        match self {
            Symbol::Primitive | Symbol::String => scalar::deserialize(ty, decoder, setter),
            Symbol::Enum => enums::deserialize(ctx, ty, decoder, setter),
            Symbol::Iterable { recursive } => {
                containers::deserialize_iterable(ctx, ty, decoder, setter, *recursive)
            }
            Symbol::StringMap { recursive } => containers::deserialize_map(ctx, ty, decoder, setter, *recursive),
            Symbol::Optional { recursive } => indirect::deserialize_optional(ctx, ty, decoder, setter, *recursive),
            Symbol::Bean => bean::deserialize_bean(ctx, ty, decoder, setter),
            Symbol::Injected { provider } => indirect::deserialize_injected(ctx, ty, decoder, setter, *provider),
            Symbol::Nullable(inner) => indirect::deserialize_nullable(ctx, inner, ty, decoder, setter),
        }
    }

    /// The value a property holds when its key is absent.
    pub fn default_expr(&self, table: &ClassTable, ty: &TypeExpr) -> Expr {
        match self {
            Symbol::Primitive => scalar::default_value(table, ty),
            Symbol::Optional { .. } => Expr::EmptyOptional,
            Symbol::Nullable(inner) => inner.default_expr(table, ty),
            _ => Expr::Const(typecodec_runtime::Value::Null),
        }
    }

    /// Guard deciding whether a property value is written under `inclusion`.
    pub fn should_include(&self, ctx: &mut GeneratorContext<'_>, ty: &TypeExpr, inclusion: Inclusion) -> Condition {
        condition::should_include(self, ctx, ty, inclusion)
    }
}

#[cfg(test)]
#[path = "../../tests/symbols_tests.rs"]
mod symbols_tests;
