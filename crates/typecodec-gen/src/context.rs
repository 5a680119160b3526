//! Per-type generation state.
//!
//! A [`GeneratorContext`] lives for the generation of one root type. It
//! tracks where in the value tree the strategies currently are (for error
//! messages), hands out local names for the plan being built, collects the
//! injected codecs the plans refer to and records problems.

use crate::config::GeneratorConfig;
use crate::linker::{Direction, Linker};
use crate::plan::{Block, InjectionId, Local, Plan, PlanKind};
use rustc_hash::FxHashMap;
use typecodec_common::{ProblemCode, ProblemReporter};
use typecodec_types::{ClassTable, Name, TypeExpr};

/// A codec a plan calls instead of inlining.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Injection {
    pub ty: TypeExpr,
    pub direction: Direction,
    /// Requested lazily to break a recursive reference.
    pub provider: bool,
}

pub struct GeneratorContext<'a> {
    linker: &'a Linker<'a>,
    path: Vec<String>,
    locals: Vec<Name>,
    local_counts: FxHashMap<String, u32>,
    injections: Vec<Injection>,
    injection_ids: FxHashMap<(TypeExpr, Direction), InjectionId>,
    problems: ProblemReporter,
}

impl<'a> GeneratorContext<'a> {
    pub fn new(linker: &'a Linker<'a>, root: &TypeExpr) -> Self {
        let root_name = root.display(linker.table()).to_string();
        Self {
            linker,
            path: vec![root_name],
            locals: Vec::new(),
            local_counts: FxHashMap::default(),
            injections: Vec::new(),
            injection_ids: FxHashMap::default(),
            problems: ProblemReporter::new(),
        }
    }

    #[inline]
    pub fn linker(&self) -> &'a Linker<'a> {
        self.linker
    }

    #[inline]
    pub fn table(&self) -> &'a ClassTable {
        self.linker.table()
    }

    pub fn config(&self) -> GeneratorConfig {
        self.linker.config()
    }

    // -------------------------------------------------------------------------
    // Path
    // -------------------------------------------------------------------------

    /// `com.example.Outer->inner->[*]`
    pub fn readable_path(&self) -> String {
        self.path.join("->")
    }

    /// Run `f` one level deeper in the value tree.
    pub fn with_sub_path<T>(&mut self, segment: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment.to_owned());
        let result = f(self);
        self.path.pop();
        result
    }

    // -------------------------------------------------------------------------
    // Locals
    // -------------------------------------------------------------------------

    /// Start a new plan with an empty local table.
    pub fn begin_plan(&mut self) {
        self.locals.clear();
        self.local_counts.clear();
    }

    /// Allocate a local. Names are unique within a plan: `value`, `value2`...
    pub fn new_local(&mut self, hint: &str) -> Local {
        let count = self.local_counts.entry(hint.to_owned()).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            Name::from(hint)
        } else {
            Name::from(format!("{hint}{count}"))
        };
        let local = Local(self.locals.len() as u32);
        self.locals.push(name);
        local
    }

    pub fn finish_plan(&mut self, kind: PlanKind, params: Vec<Local>, body: Block) -> Plan {
        self.local_counts.clear();
        Plan {
            kind,
            params,
            body,
            locals: std::mem::take(&mut self.locals),
        }
    }

    // -------------------------------------------------------------------------
    // Injections
    // -------------------------------------------------------------------------

    /// Id of the injected codec for `(ty, direction)`, requesting it on first
    /// use.
    pub fn request_injection(&mut self, ty: &TypeExpr, direction: Direction, provider: bool) -> InjectionId {
        let key = (ty.clone(), direction);
        if let Some(&id) = self.injection_ids.get(&key) {
            let injection = &mut self.injections[id.0 as usize];
            injection.provider |= provider;
            return id;
        }
        let id = InjectionId(self.injections.len() as u32);
        self.injections.push(Injection {
            ty: ty.clone(),
            direction,
            provider,
        });
        self.injection_ids.insert(key, id);
        id
    }

    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }

    // -------------------------------------------------------------------------
    // Problems
    // -------------------------------------------------------------------------

    /// Record an error against the current path.
    pub fn fail(&mut self, code: ProblemCode, message: impl Into<String>) {
        let element = self.readable_path();
        self.problems.fail(code, element, message);
    }

    pub fn problems_mut(&mut self) -> &mut ProblemReporter {
        &mut self.problems
    }

    pub fn is_failed(&self) -> bool {
        self.problems.is_failed()
    }

    pub fn into_parts(self) -> (Vec<Injection>, ProblemReporter) {
        (self.injections, self.problems)
    }
}
