//! Plan IR.
//!
//! A plan is the logical body of one generated encode or decode method: a
//! tree of [`Stmt`] and [`Expr`] over numbered locals. Nothing here knows
//! about a target language. The [`Evaluator`](crate::eval::Evaluator) runs
//! plans directly, and [`PlanDisplay`] renders them as Java-like pseudo code
//! for inspection.
//!
//! ## Locals
//!
//! | Holds | Created by |
//! |-------|------------|
//! | runtime value | `Let`, loop variables |
//! | decoder / encoder handle | plan parameters, `OpenDecoder`, `OpenEncoder` |
//! | 64-bit mask word | `Let` with an integer constant, then bit statements |

use std::fmt;
use typecodec_runtime::Value;
use typecodec_types::{ClassId, Name, well_known};

/// A local slot of one plan.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Local(pub u32);

impl Local {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the injection list of the codec that owns the plan.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InjectionId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StructureKind {
    Array,
    Object,
}

/// Scalar shapes with a dedicated decoder/encoder call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    String,
}

impl ScalarKind {
    /// Scalar kind of a primitive, box, big number or `String` class.
    pub fn of_class(id: ClassId) -> Option<Self> {
        use well_known::*;
        Some(match id {
            BOOLEAN | BOXED_BOOLEAN => Self::Boolean,
            BYTE | BOXED_BYTE => Self::Byte,
            SHORT | BOXED_SHORT => Self::Short,
            CHAR | CHARACTER => Self::Char,
            INT | INTEGER => Self::Int,
            LONG | BOXED_LONG => Self::Long,
            FLOAT | BOXED_FLOAT => Self::Float,
            DOUBLE | BOXED_DOUBLE => Self::Double,
            BIG_INTEGER => Self::BigInteger,
            BIG_DECIMAL => Self::BigDecimal,
            STRING | CHAR_SEQUENCE => Self::String,
            _ => return None,
        })
    }

    /// The zero value of the primitive form.
    pub fn zero(self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Byte => Value::Byte(0),
            Self::Short => Value::Short(0),
            Self::Char => Value::Char('\0'),
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
            Self::BigInteger | Self::BigDecimal | Self::String => Value::Null,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Char => "Char",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::BigInteger => "BigInteger",
            Self::BigDecimal => "BigDecimal",
            Self::String => "String",
        }
    }
}

/// How a bean instance is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreatorCall {
    Constructor,
    /// Static factory method on the bean class.
    Factory { method: Name },
}

/// Typed failure raised by a plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    DuplicateProperty { name: Name },
    MissingProperty { name: Name },
    UnknownProperty { type_name: String, key: Local },
    BadEnumValue { path: String, value: Local },
    AmbiguousType,
    NoMatchingType,
    AmbiguousProperty { name: Name },
    PropertyNotAllowed { name: Name },
    UnknownTypeTag { tag: Local },
    MissingTypeTag,
    /// Encoding met an enum constant that did not exist at generation time.
    UnknownEnumConstant { class: Name },
    /// Encoding met a polymorphic value of an undeclared subtype.
    UnknownSubtype { type_name: String },
    /// The direction is disabled for this type.
    Unsupported { message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Local(Local),
    Const(Value),
    Decode { decoder: Local, kind: ScalarKind },
    /// Next key as a string, or null at the end of the object.
    DecodeKey(Local),
    /// Consumes a null token if present.
    DecodeNull(Local),
    DecodeArbitrary(Local),
    HasNextArrayValue(Local),
    DecodeInjected { decoder: Local, injection: InjectionId },
    Not(Box<Expr>),
    /// Short-circuit conjunction. Empty is `true`.
    And(Vec<Expr>),
    /// Short-circuit disjunction. Empty is `false`.
    Or(Vec<Expr>),
    IsNull(Box<Expr>),
    Equals(Box<Expr>, Value),
    /// Empty string, list or map.
    IsEmpty(Box<Expr>),
    InjectedIsEmpty { injection: InjectionId, value: Box<Expr> },
    /// `(mask & bits) != 0`
    AnyBits { mask: Local, bits: u64 },
    /// `(mask & bits) == bits`
    AllBits { mask: Local, bits: u64 },
    /// More than one bit set across all the words.
    MultipleBits(Vec<Local>),
    EnumConstant { class: Name, constant: Name },
    /// Constant name of an enum value.
    EnumName(Box<Expr>),
    Present(Box<Expr>),
    EmptyOptional,
    IsPresent(Box<Expr>),
    OptionalGet(Box<Expr>),
    NewList,
    NewMap,
    GetField { target: Box<Expr>, field: Name },
    CallGetter { target: Box<Expr>, method: Name },
    /// Create a bean. Each argument names the slot it initialises.
    Construct { class: Name, creator: CreatorCall, args: Vec<(Name, Expr)> },
    InstanceOf { value: Box<Expr>, class: Name },
    ToString(Box<Expr>),
}

impl Expr {
    pub fn local(local: Local) -> Self {
        Expr::Local(local)
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn is_null(self) -> Self {
        Expr::IsNull(Box::new(self))
    }

    pub fn string(text: &str) -> Self {
        Expr::Const(Value::String(text.to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    pub labels: Vec<Name>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// Declare or overwrite a value local.
    Let { local: Local, value: Expr },
    OpenDecoder { child: Local, parent: Local, kind: StructureKind },
    FinishDecoder(Local),
    SkipValue(Local),
    OpenEncoder { child: Local, parent: Local, kind: StructureKind },
    FinishEncoder(Local),
    EncodeKey { encoder: Local, key: Expr },
    Encode { encoder: Local, kind: ScalarKind, value: Expr },
    EncodeNull(Local),
    EncodeArbitrary { encoder: Local, value: Expr },
    EncodeInjected { encoder: Local, injection: InjectionId, value: Expr },
    If { cond: Expr, then: Block, otherwise: Block },
    Loop(Block),
    /// Leave the innermost `Loop`. A `Switch` does not catch it.
    Break,
    Switch { on: Expr, cases: Vec<SwitchCase>, default: Block },
    ForEach { item: Local, iterable: Expr, body: Block },
    ForEachEntry { key: Local, value: Local, map: Expr, body: Block },
    /// Append to a list. `distinct` skips values already present.
    Push { list: Local, value: Expr, distinct: bool },
    Put { map: Local, key: Expr, value: Expr },
    /// `mask |= bits`
    SetBits { mask: Local, bits: u64 },
    /// `mask &= bits`
    KeepBits { mask: Local, bits: u64 },
    SetField { target: Local, field: Name, value: Expr },
    CallSetter { target: Local, method: Name, value: Expr },
    Fail(Failure),
    Return(Expr),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(stmt: Stmt) -> Self {
        Self { stmts: vec![stmt] }
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn append(&mut self, mut other: Block) {
        self.stmts.append(&mut other.stmts);
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }
}

impl From<Vec<Stmt>> for Block {
    fn from(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

/// Whether a plan reads or writes JSON.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlanKind {
    /// Parameters: `[encoder, value]`.
    Encode,
    /// Parameters: `[decoder]`. The body ends in `Return`.
    Decode,
}

/// One generated method.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub kind: PlanKind,
    pub params: Vec<Local>,
    pub body: Block,
    /// Local names, indexed by [`Local`].
    pub locals: Vec<Name>,
}

impl Plan {
    pub fn local_name(&self, local: Local) -> &str {
        self.locals.get(local.index()).map_or("?", |n| n)
    }

    pub fn display(&self) -> PlanDisplay<'_> {
        PlanDisplay { plan: self }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Java-like pseudo code for a plan.
pub struct PlanDisplay<'a> {
    plan: &'a Plan,
}

impl PlanDisplay<'_> {
    fn name(&self, local: Local) -> &str {
        self.plan.local_name(local)
    }

    fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("    ")?;
        }
        Ok(())
    }

    fn block(&self, f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
        for stmt in &block.stmts {
            self.stmt(f, stmt, depth)?;
        }
        Ok(())
    }

    fn stmt(&self, f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
        Self::indent(f, depth)?;
        match stmt {
            Stmt::Let { local, value } => {
                write!(f, "{} = ", self.name(*local))?;
                self.expr(f, value)?;
                writeln!(f, ";")
            }
            Stmt::OpenDecoder { child, parent, kind } => writeln!(
                f,
                "{} = {}.decode{}();",
                self.name(*child),
                self.name(*parent),
                structure_name(*kind)
            ),
            Stmt::FinishDecoder(decoder) => writeln!(f, "{}.finishStructure();", self.name(*decoder)),
            Stmt::SkipValue(decoder) => writeln!(f, "{}.skipValue();", self.name(*decoder)),
            Stmt::OpenEncoder { child, parent, kind } => writeln!(
                f,
                "{} = {}.encode{}();",
                self.name(*child),
                self.name(*parent),
                structure_name(*kind)
            ),
            Stmt::FinishEncoder(encoder) => writeln!(f, "{}.finishStructure();", self.name(*encoder)),
            Stmt::EncodeKey { encoder, key } => {
                write!(f, "{}.encodeKey(", self.name(*encoder))?;
                self.expr(f, key)?;
                writeln!(f, ");")
            }
            Stmt::Encode { encoder, kind, value } => {
                write!(f, "{}.encode{}(", self.name(*encoder), kind.name())?;
                self.expr(f, value)?;
                writeln!(f, ");")
            }
            Stmt::EncodeNull(encoder) => writeln!(f, "{}.encodeNull();", self.name(*encoder)),
            Stmt::EncodeArbitrary { encoder, value } => {
                write!(f, "{}.encodeArbitrary(", self.name(*encoder))?;
                self.expr(f, value)?;
                writeln!(f, ");")
            }
            Stmt::EncodeInjected { encoder, injection, value } => {
                write!(f, "injected{}.encode({}, ", injection.0, self.name(*encoder))?;
                self.expr(f, value)?;
                writeln!(f, ");")
            }
            Stmt::If { cond, then, otherwise } => {
                f.write_str("if (")?;
                self.expr(f, cond)?;
                writeln!(f, ") {{")?;
                self.block(f, then, depth + 1)?;
                if !otherwise.is_empty() {
                    Self::indent(f, depth)?;
                    writeln!(f, "}} else {{")?;
                    self.block(f, otherwise, depth + 1)?;
                }
                Self::indent(f, depth)?;
                writeln!(f, "}}")
            }
            Stmt::Loop(body) => {
                writeln!(f, "while (true) {{")?;
                self.block(f, body, depth + 1)?;
                Self::indent(f, depth)?;
                writeln!(f, "}}")
            }
            Stmt::Break => writeln!(f, "break;"),
            Stmt::Switch { on, cases, default } => {
                f.write_str("switch (")?;
                self.expr(f, on)?;
                writeln!(f, ") {{")?;
                for case in cases {
                    for label in &case.labels {
                        Self::indent(f, depth + 1)?;
                        writeln!(f, "case {label:?}:")?;
                    }
                    self.block(f, &case.body, depth + 2)?;
                }
                Self::indent(f, depth + 1)?;
                writeln!(f, "default:")?;
                self.block(f, default, depth + 2)?;
                Self::indent(f, depth)?;
                writeln!(f, "}}")
            }
            Stmt::ForEach { item, iterable, body } => {
                write!(f, "for ({} : ", self.name(*item))?;
                self.expr(f, iterable)?;
                writeln!(f, ") {{")?;
                self.block(f, body, depth + 1)?;
                Self::indent(f, depth)?;
                writeln!(f, "}}")
            }
            Stmt::ForEachEntry { key, value, map, body } => {
                write!(f, "for (({}, {}) : ", self.name(*key), self.name(*value))?;
                self.expr(f, map)?;
                writeln!(f, ") {{")?;
                self.block(f, body, depth + 1)?;
                Self::indent(f, depth)?;
                writeln!(f, "}}")
            }
            Stmt::Push { list, value, distinct } => {
                let op = if *distinct { "addDistinct" } else { "add" };
                write!(f, "{}.{op}(", self.name(*list))?;
                self.expr(f, value)?;
                writeln!(f, ");")
            }
            Stmt::Put { map, key, value } => {
                write!(f, "{}.put(", self.name(*map))?;
                self.expr(f, key)?;
                f.write_str(", ")?;
                self.expr(f, value)?;
                writeln!(f, ");")
            }
            Stmt::SetBits { mask, bits } => writeln!(f, "{} |= {bits:#x};", self.name(*mask)),
            Stmt::KeepBits { mask, bits } => writeln!(f, "{} &= {bits:#x};", self.name(*mask)),
            Stmt::SetField { target, field, value } => {
                write!(f, "{}.{field} = ", self.name(*target))?;
                self.expr(f, value)?;
                writeln!(f, ";")
            }
            Stmt::CallSetter { target, method, value } => {
                write!(f, "{}.{method}(", self.name(*target))?;
                self.expr(f, value)?;
                writeln!(f, ");")
            }
            Stmt::Fail(failure) => {
                f.write_str("throw ")?;
                self.failure(f, failure)?;
                writeln!(f, ";")
            }
            Stmt::Return(value) => {
                f.write_str("return ")?;
                self.expr(f, value)?;
                writeln!(f, ";")
            }
        }
    }

    fn failure(&self, f: &mut fmt::Formatter<'_>, failure: &Failure) -> fmt::Result {
        match failure {
            Failure::DuplicateProperty { name } => write!(f, "parseError(\"Duplicate property {name}\")"),
            Failure::MissingProperty { name } => write!(f, "parseError(\"Missing property {name}\")"),
            Failure::UnknownProperty { type_name, key } => write!(
                f,
                "parseError(\"Unknown property for type {type_name}: \" + {})",
                self.name(*key)
            ),
            Failure::BadEnumValue { path, value } => write!(
                f,
                "parseError(\"Bad enum value for field {path}: \" + {})",
                self.name(*value)
            ),
            Failure::AmbiguousType => f.write_str("parseError(\"Ambiguous type\")"),
            Failure::NoMatchingType => f.write_str("parseError(\"No matching type candidate\")"),
            Failure::AmbiguousProperty { name } => write!(f, "parseError(\"Ambiguous property {name}\")"),
            Failure::PropertyNotAllowed { name } => {
                write!(f, "parseError(\"Property not allowed for these types: {name}\")")
            }
            Failure::UnknownTypeTag { tag } => {
                write!(f, "parseError(\"Unknown type tag \" + {})", self.name(*tag))
            }
            Failure::MissingTypeTag => f.write_str("parseError(\"Expected type tag, but got object end\")"),
            Failure::UnknownEnumConstant { class } => {
                write!(f, "new IncompatibleClassChangeError(\"{class}\")")
            }
            Failure::UnknownSubtype { type_name } => {
                write!(f, "new IncompatibleClassChangeError(\"subtype of {type_name}\")")
            }
            Failure::Unsupported { message } => write!(f, "new UnsupportedOperationException({message:?})"),
        }
    }

    fn expr(&self, f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
        match expr {
            Expr::Local(local) => f.write_str(self.name(*local)),
            Expr::Const(value) => write_const(f, value),
            Expr::Decode { decoder, kind } => write!(f, "{}.decode{}()", self.name(*decoder), kind.name()),
            Expr::DecodeKey(decoder) => write!(f, "{}.decodeKey()", self.name(*decoder)),
            Expr::DecodeNull(decoder) => write!(f, "{}.decodeNull()", self.name(*decoder)),
            Expr::DecodeArbitrary(decoder) => write!(f, "{}.decodeArbitrary()", self.name(*decoder)),
            Expr::HasNextArrayValue(decoder) => write!(f, "{}.hasNextArrayValue()", self.name(*decoder)),
            Expr::DecodeInjected { decoder, injection } => {
                write!(f, "injected{}.decode({})", injection.0, self.name(*decoder))
            }
            Expr::Not(inner) => {
                f.write_str("!(")?;
                self.expr(f, inner)?;
                f.write_str(")")
            }
            Expr::And(terms) => {
                if terms.is_empty() {
                    return f.write_str("true");
                }
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    f.write_str("(")?;
                    self.expr(f, term)?;
                    f.write_str(")")?;
                }
                Ok(())
            }
            Expr::Or(terms) => {
                if terms.is_empty() {
                    return f.write_str("false");
                }
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" || ")?;
                    }
                    f.write_str("(")?;
                    self.expr(f, term)?;
                    f.write_str(")")?;
                }
                Ok(())
            }
            Expr::IsNull(inner) => {
                self.expr(f, inner)?;
                f.write_str(" == null")
            }
            Expr::Equals(inner, value) => {
                self.expr(f, inner)?;
                f.write_str(" == ")?;
                write_const(f, value)
            }
            Expr::IsEmpty(inner) => {
                self.expr(f, inner)?;
                f.write_str(".isEmpty()")
            }
            Expr::InjectedIsEmpty { injection, value } => {
                write!(f, "injected{}.isEmpty(", injection.0)?;
                self.expr(f, value)?;
                f.write_str(")")
            }
            Expr::AnyBits { mask, bits } => write!(f, "({} & {bits:#x}) != 0", self.name(*mask)),
            Expr::AllBits { mask, bits } => write!(f, "({} & {bits:#x}) == {bits:#x}", self.name(*mask)),
            Expr::MultipleBits(masks) => {
                for (i, mask) in masks.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "Long.bitCount({})", self.name(*mask))?;
                }
                f.write_str(" > 1")
            }
            Expr::EnumConstant { class, constant } => write!(f, "{class}.{constant}"),
            Expr::EnumName(inner) => {
                self.expr(f, inner)?;
                f.write_str(".name()")
            }
            Expr::Present(inner) => {
                f.write_str("Optional.of(")?;
                self.expr(f, inner)?;
                f.write_str(")")
            }
            Expr::EmptyOptional => f.write_str("Optional.empty()"),
            Expr::IsPresent(inner) => {
                self.expr(f, inner)?;
                f.write_str(".isPresent()")
            }
            Expr::OptionalGet(inner) => {
                self.expr(f, inner)?;
                f.write_str(".get()")
            }
            Expr::NewList => f.write_str("new ArrayList<>()"),
            Expr::NewMap => f.write_str("new LinkedHashMap<>()"),
            Expr::GetField { target, field } => {
                self.expr(f, target)?;
                write!(f, ".{field}")
            }
            Expr::CallGetter { target, method } => {
                self.expr(f, target)?;
                write!(f, ".{method}()")
            }
            Expr::Construct { class, creator, args } => {
                match creator {
                    CreatorCall::Constructor => write!(f, "new {class}(")?,
                    CreatorCall::Factory { method } => write!(f, "{class}.{method}(")?,
                }
                for (i, (_, arg)) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.expr(f, arg)?;
                }
                f.write_str(")")
            }
            Expr::InstanceOf { value, class } => {
                self.expr(f, value)?;
                write!(f, " instanceof {class}")
            }
            Expr::ToString(inner) => {
                self.expr(f, inner)?;
                f.write_str(".toString()")
            }
        }
    }
}

fn structure_name(kind: StructureKind) -> &'static str {
    match kind {
        StructureKind::Array => "Array",
        StructureKind::Object => "Object",
    }
}

fn write_const(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(v) => write!(f, "{v}"),
        Value::Byte(v) => write!(f, "(byte) {v}"),
        Value::Short(v) => write!(f, "(short) {v}"),
        Value::Char(v) => write!(f, "{v:?}"),
        Value::Int(v) => write!(f, "{v}"),
        Value::Long(v) => write!(f, "{v}L"),
        Value::Float(v) => write!(f, "{v:?}f"),
        Value::Double(v) => write!(f, "{v:?}"),
        Value::String(v) => write!(f, "{v:?}"),
        other => write!(f, "<{}>", other.kind_name()),
    }
}

impl fmt::Display for PlanDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, params) = match self.plan.kind {
            PlanKind::Encode => ("encode", self.plan.params.as_slice()),
            PlanKind::Decode => ("decode", self.plan.params.as_slice()),
        };
        write!(f, "{name}(")?;
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(self.name(*param))?;
        }
        writeln!(f, ") {{")?;
        self.block(f, &self.plan.body, 1)?;
        writeln!(f, "}}")
    }
}

#[cfg(test)]
#[path = "../tests/plan_tests.rs"]
mod plan_tests;
