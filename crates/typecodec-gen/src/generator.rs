//! Codec generation driver.
//!
//! [`SingletonGenerator::generate`] produces the plans for one serializable
//! bean:
//!
//! 1. the dependency checker approves the inline graph,
//! 2. the serializer plan is built,
//! 3. the deserializer plan is built if the bean has a creator or subtypes,
//! 4. every injection the plans requested is resolved through the linker.
//!
//! Any recorded problem fails the type; its partial plans are dropped.
//! [`SingletonGenerator::generate_all`] runs a worklist over root types and
//! the generated codecs they inject, collecting the problems of every
//! failed type while the others proceed.

use crate::bean::{self, introspect};
use crate::context::{GeneratorContext, Injection};
use crate::dependency_check::DependencyGraphChecker;
use crate::eval::CodecSet;
use crate::linker::{Direction, Linker};
use crate::plan::{Block, Expr, InjectionId, Local, Plan, PlanKind, Stmt};
use crate::registry::StrategyKind;
use crate::symbols::Symbol;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use typecodec_common::{Problem, ProblemCode, ProblemReporter};
use typecodec_runtime::Value;
use typecodec_types::TypeExpr;

/// An injection bound to the registered codec that serves it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedInjection {
    pub ty: TypeExpr,
    pub direction: Direction,
    pub provider: bool,
    pub kind: StrategyKind,
    /// The type the serving codec was declared for. For a generated codec
    /// this is the key into the [`CodecSet`].
    pub declared: TypeExpr,
}

#[derive(Clone, Debug)]
pub struct GeneratedCodec {
    pub ty: TypeExpr,
    pub serializer: Option<Plan>,
    /// `None` when the bean cannot be created from JSON.
    pub deserializer: Option<Plan>,
    /// Indexed by [`InjectionId`].
    pub injections: Vec<ResolvedInjection>,
}

impl GeneratedCodec {
    pub fn plan(&self, direction: Direction) -> Option<&Plan> {
        match direction {
            Direction::Serialize => self.serializer.as_ref(),
            Direction::Deserialize => self.deserializer.as_ref(),
        }
    }

    pub fn injection(&self, id: InjectionId) -> Option<&ResolvedInjection> {
        self.injections.get(id.0 as usize)
    }

    /// Declared types of the generated codecs this codec injects. These
    /// must be generated too before the codec can run.
    pub fn generated_dependencies(&self) -> impl Iterator<Item = &TypeExpr> {
        self.injections
            .iter()
            .filter(|injection| injection.kind == StrategyKind::Generated)
            .map(|injection| &injection.declared)
    }
}

/// Result of a generation round.
#[derive(Debug, Default)]
pub struct GenerationOutput {
    pub codecs: CodecSet,
    pub problems: Vec<Problem>,
    /// Types skipped because of problems.
    pub skipped: Vec<TypeExpr>,
}

impl GenerationOutput {
    pub fn is_ok(&self) -> bool {
        !self.problems.iter().any(Problem::is_error)
    }
}

pub struct SingletonGenerator<'l, 'a> {
    linker: &'l Linker<'a>,
}

impl<'l, 'a> SingletonGenerator<'l, 'a> {
    pub fn new(linker: &'l Linker<'a>) -> Self {
        Self { linker }
    }

    /// Generate the codec of the bean type `ty`.
    pub fn generate(&self, ty: &TypeExpr) -> Result<GeneratedCodec, Vec<Problem>> {
        let table = self.linker.table();
        let element = ty.display(table).to_string();
        let mut problems = ProblemReporter::new();

        let is_bean = ty
            .class_id()
            .is_some_and(|id| !ty.is_array() && table.class(id).annotations.serializable && !table.is_enum(id));
        if !is_bean {
            problems.fail(ProblemCode::UnsupportedType, &element, "Not a serializable bean");
            return Err(problems.take_problems());
        }
        if ty.has_free_variables() {
            problems.fail(
                ProblemCode::UnboundVariable,
                &element,
                "Generic beans are generated only for concrete type arguments",
            );
            return Err(problems.take_problems());
        }

        let mut checker = DependencyGraphChecker::new(self.linker);
        checker.check_root(ty);
        if !checker.is_ok() {
            checker.report(&element, &mut problems);
            return Err(problems.take_problems());
        }

        let mut ctx = GeneratorContext::new(self.linker, ty);
        let serializer = Self::serializer_plan(&mut ctx, ty);

        let mut scratch = ProblemReporter::new();
        let deserializable = introspect(table, self.linker.config(), ty, Direction::Deserialize, &mut scratch)
            .is_some_and(|def| bean::supports_deserialization(&def));
        let deserializer = if deserializable {
            Some(Self::deserializer_plan(&mut ctx, ty))
        } else {
            debug!(target: "typecodec::generator", ty = %element, "no creator, skipping deserializer");
            None
        };

        let (requested, reporter) = ctx.into_parts();
        problems.absorb(reporter);
        let injections = self.resolve_injections(&element, requested, &mut problems);

        if problems.is_failed() {
            return Err(dedup(problems.take_problems()));
        }
        info!(
            target: "typecodec::generator",
            ty = %element,
            injections = injections.len(),
            deserializer = deserializer.is_some(),
            "generated codec"
        );
        Ok(GeneratedCodec {
            ty: ty.clone(),
            serializer: Some(serializer),
            deserializer,
            injections,
        })
    }

    fn serializer_plan(ctx: &mut GeneratorContext<'_>, ty: &TypeExpr) -> Plan {
        ctx.begin_plan();
        let encoder = ctx.new_local("encoder");
        let value = ctx.new_local("value");
        let body = Symbol::Bean.serialize(ctx, ty, encoder, Expr::Local(value));
        let guarded = Block::of(Stmt::If {
            cond: Expr::Local(value).is_null(),
            then: Block::of(Stmt::EncodeNull(encoder)),
            otherwise: body,
        });
        ctx.finish_plan(PlanKind::Encode, vec![encoder, value], guarded)
    }

    fn deserializer_plan(ctx: &mut GeneratorContext<'_>, ty: &TypeExpr) -> Plan {
        ctx.begin_plan();
        let decoder: Local = ctx.new_local("decoder");
        let mut body = Block::of(Stmt::If {
            cond: Expr::DecodeNull(decoder),
            then: Block::of(Stmt::Return(Expr::Const(Value::Null))),
            otherwise: Block::new(),
        });
        body.append(Symbol::Bean.deserialize(
            ctx,
            ty,
            decoder,
            Box::new(|value| Block::of(Stmt::Return(value))),
        ));
        ctx.finish_plan(PlanKind::Decode, vec![decoder], body)
    }

    fn resolve_injections(
        &self,
        element: &str,
        requested: Vec<Injection>,
        problems: &mut ProblemReporter,
    ) -> Vec<ResolvedInjection> {
        let table = self.linker.table();
        let mut resolved = Vec::with_capacity(requested.len());
        for injection in requested {
            match self.linker.resolve(&injection.ty, injection.direction) {
                Ok(resolution) => {
                    let root = resolution.root();
                    resolved.push(ResolvedInjection {
                        ty: injection.ty,
                        direction: injection.direction,
                        provider: injection.provider,
                        kind: root.kind,
                        declared: root.declared.clone(),
                    });
                }
                Err(error) => {
                    problems.fail(
                        error.code(),
                        format!("{element}->{}", injection.ty.display(table)),
                        error.to_string(),
                    );
                }
            }
        }
        resolved
    }

    /// Generate `roots` and every generated codec they inject.
    pub fn generate_all(&self, roots: &[TypeExpr]) -> GenerationOutput {
        let table = self.linker.table();
        let mut output = GenerationOutput::default();
        let mut seen: FxHashSet<TypeExpr> = FxHashSet::default();
        let mut queue: VecDeque<TypeExpr> = roots.iter().cloned().collect();

        while let Some(ty) = queue.pop_front() {
            if !seen.insert(ty.clone()) {
                continue;
            }
            match self.generate(&ty) {
                Ok(codec) => {
                    for declared in codec.generated_dependencies() {
                        if !seen.contains(declared) {
                            queue.push_back(declared.clone());
                        }
                    }
                    output.codecs.insert(codec);
                }
                Err(problems) => {
                    warn!(
                        target: "typecodec::generator",
                        ty = %ty.display(table),
                        problems = problems.len(),
                        "skipping type"
                    );
                    output.problems.extend(problems);
                    output.skipped.push(ty);
                }
            }
        }
        output
    }
}

fn dedup(problems: Vec<Problem>) -> Vec<Problem> {
    let mut unique: Vec<Problem> = Vec::with_capacity(problems.len());
    for problem in problems {
        if !unique.contains(&problem) {
            unique.push(problem);
        }
    }
    unique
}

#[cfg(test)]
#[path = "../tests/generator_tests.rs"]
mod generator_tests;
