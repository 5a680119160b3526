//! Inclusion guards for bean serialization.
//!
//! A [`Condition`] is a conjunction of [`Check`]s against the property
//! value. The empty condition always holds and produces no `If` at all.
//!
//! | Policy | Adds |
//! |--------|------|
//! | `NON_NULL` | not null |
//! | `NON_ABSENT` | + optional present |
//! | `NON_EMPTY` | + string/container/injected not empty |
//! | `NON_DEFAULT` | + primitive differs from its zero value |

use super::Symbol;
use crate::context::GeneratorContext;
use crate::linker::Direction;
use crate::plan::{Expr, InjectionId};
use typecodec_runtime::Value;
use typecodec_types::{Inclusion, TypeExpr};

#[derive(Clone, Debug, PartialEq)]
pub enum Check {
    NotNull,
    NotEmpty,
    Present,
    NotDefault(Value),
    InjectedNotEmpty(InjectionId),
}

impl Check {
    fn build(&self, value: &Expr) -> Expr {
        let value = Box::new(value.clone());
        match self {
            Check::NotNull => Expr::IsNull(value).not(),
            Check::NotEmpty => Expr::IsEmpty(value).not(),
            Check::Present => Expr::IsPresent(value),
            Check::NotDefault(default) => Expr::Equals(value, default.clone()).not(),
            Check::InjectedNotEmpty(injection) => Expr::InjectedIsEmpty {
                injection: *injection,
                value,
            }
            .not(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Condition {
    checks: Vec<Check>,
}

impl Condition {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn is_always(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn with(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn prepend(mut self, check: Check) -> Self {
        self.checks.insert(0, check);
        self
    }

    /// The guard expression, or `None` when the condition always holds.
    pub fn build(&self, value: &Expr) -> Option<Expr> {
        match self.checks.as_slice() {
            [] => None,
            [single] => Some(single.build(value)),
            checks => Some(Expr::And(checks.iter().map(|check| check.build(value)).collect())),
        }
    }
}

fn rank(inclusion: Inclusion) -> u8 {
    match inclusion {
        Inclusion::Always => 0,
        Inclusion::NonNull => 1,
        Inclusion::NonAbsent => 2,
        Inclusion::NonEmpty => 3,
        Inclusion::NonDefault => 4,
    }
}

fn at_least(inclusion: Inclusion, threshold: Inclusion) -> bool {
    rank(inclusion) >= rank(threshold)
}

pub(super) fn should_include(
    symbol: &Symbol,
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    inclusion: Inclusion,
) -> Condition {
    let condition = Condition::always();
    match symbol {
        Symbol::Nullable(inner) => {
            let condition = should_include(inner, ctx, ty, inclusion);
            if at_least(inclusion, Inclusion::NonNull) {
                condition.prepend(Check::NotNull)
            } else {
                condition
            }
        }
        Symbol::Primitive => match symbol.default_expr(ctx.table(), ty) {
            Expr::Const(default) if !default.is_null() && at_least(inclusion, Inclusion::NonDefault) => {
                condition.with(Check::NotDefault(default))
            }
            _ => condition,
        },
        Symbol::String | Symbol::Iterable { .. } | Symbol::StringMap { .. } => {
            if at_least(inclusion, Inclusion::NonEmpty) {
                condition.with(Check::NotEmpty)
            } else {
                condition
            }
        }
        Symbol::Optional { .. } => {
            let condition = if at_least(inclusion, Inclusion::NonNull) {
                condition.with(Check::NotNull)
            } else {
                condition
            };
            if at_least(inclusion, Inclusion::NonAbsent) {
                condition.with(Check::Present)
            } else {
                condition
            }
        }
        Symbol::Injected { provider } => {
            let condition = if at_least(inclusion, Inclusion::NonNull) {
                condition.with(Check::NotNull)
            } else {
                condition
            };
            if at_least(inclusion, Inclusion::NonEmpty) {
                let injection = ctx.request_injection(ty, Direction::Serialize, *provider);
                condition.with(Check::InjectedNotEmpty(injection))
            } else {
                condition
            }
        }
        Symbol::Enum | Symbol::Bean => condition,
    }
}
