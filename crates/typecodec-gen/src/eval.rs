//! Plan interpreter.
//!
//! The [`Evaluator`] runs generated plans against the runtime
//! [`Decoder`]/[`Encoder`] protocols, standing in for compiled codecs.
//! Every plan call gets its own slot table indexed by [`Local`]; a slot
//! holds a runtime [`Value`], a decoder handle or an encoder handle.
//!
//! Bean values are slot maps: constructors, fields and accessors all read
//! and write the slot named after the member, so `getName()`, `name` and
//! `setName(..)` refer to the same slot.
//!
//! Injected codecs are looked up through the owning codec's resolved
//! injections:
//!
//! | Kind | Served by |
//! |------|-----------|
//! | `Generated` | the codec in the [`CodecSet`] keyed by the declared type |
//! | `Arbitrary` | `decode_arbitrary` / `encode_arbitrary` |
//! | anything else | nothing; these shapes are always planned inline |

use crate::bean::member_name_of_accessor;
use crate::generator::GeneratedCodec;
use crate::linker::Direction;
use crate::plan::{Block, Expr, Failure, InjectionId, Local, Plan, ScalarKind, Stmt, StructureKind};
use crate::registry::StrategyKind;
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::trace;
use typecodec_common::limits::MAX_DOCUMENT_DEPTH;
use typecodec_runtime::{
    BeanValue, DecodeError, Decoder, EncodeError, Encoder, JsonDecoder, JsonEncoder, ParseError, Value,
};
use typecodec_types::{ClassTable, TypeExpr};

// =============================================================================
// Codec set
// =============================================================================

/// Generated codecs keyed by bean type.
#[derive(Clone, Debug, Default)]
pub struct CodecSet {
    codecs: FxHashMap<TypeExpr, GeneratedCodec>,
}

impl CodecSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, codec: GeneratedCodec) {
        self.codecs.insert(codec.ty.clone(), codec);
    }

    pub fn get(&self, ty: &TypeExpr) -> Option<&GeneratedCodec> {
        self.codecs.get(ty)
    }

    pub fn contains(&self, ty: &TypeExpr) -> bool {
        self.codecs.contains_key(ty)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedCodec> {
        self.codecs.values()
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalError {
    Decode(DecodeError),
    Encode(EncodeError),
    /// The value was produced by a class version the plan does not know.
    IncompatibleChange { message: String },
    Unsupported { message: String },
    NoCodec { ty: String, direction: Direction },
    /// A value of the wrong runtime shape reached an encode call.
    TypeMismatch { expected: &'static str, found: &'static str },
    /// The plan is malformed, e.g. it reads a local it never wrote.
    InvalidPlan { message: String },
    TooDeep,
}

impl EvalError {
    /// The parse error if the input document was rejected.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            EvalError::Decode(err) => err.as_parse(),
            _ => None,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        EvalError::InvalidPlan {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Decode(err) => write!(f, "{err}"),
            EvalError::Encode(err) => write!(f, "{err}"),
            EvalError::IncompatibleChange { message } => write!(f, "Incompatible class change: {message}"),
            EvalError::Unsupported { message } => write!(f, "Unsupported: {message}"),
            EvalError::NoCodec { ty, direction } => write!(f, "No {direction} generated for {ty}"),
            EvalError::TypeMismatch { expected, found } => write!(f, "Expected {expected} value, found {found}"),
            EvalError::InvalidPlan { message } => write!(f, "Invalid plan: {message}"),
            EvalError::TooDeep => f.write_str("Codec nesting too deep"),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<DecodeError> for EvalError {
    fn from(err: DecodeError) -> Self {
        EvalError::Decode(err)
    }
}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        EvalError::Decode(DecodeError::Parse(err))
    }
}

impl From<EncodeError> for EvalError {
    fn from(err: EncodeError) -> Self {
        EvalError::Encode(err)
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Observer of member writes: `(class name, field or setter name)`.
pub type WriteHook<'c> = &'c dyn Fn(&str, &str);

pub struct Evaluator<'c> {
    table: &'c ClassTable,
    codecs: &'c CodecSet,
    max_depth: u32,
    on_write: Option<WriteHook<'c>>,
}

impl<'c> Evaluator<'c> {
    pub fn new(table: &'c ClassTable, codecs: &'c CodecSet) -> Self {
        Self {
            table,
            codecs,
            max_depth: MAX_DOCUMENT_DEPTH,
            on_write: None,
        }
    }

    /// Limit the number of nested codec invocations per document.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Report every field assignment and setter call made while decoding,
    /// including those of nested codecs.
    pub fn with_write_hook(mut self, hook: WriteHook<'c>) -> Self {
        self.on_write = Some(hook);
        self
    }

    fn plan(&self, ty: &TypeExpr, direction: Direction) -> Result<(&'c GeneratedCodec, &'c Plan), EvalError> {
        let no_codec = || EvalError::NoCodec {
            ty: ty.display(self.table).to_string(),
            direction,
        };
        let codec = self.codecs.get(ty).ok_or_else(no_codec)?;
        let plan = codec.plan(direction).ok_or_else(no_codec)?;
        Ok((codec, plan))
    }

    /// Decode one `ty` value from `decoder`.
    pub fn decode<D: Decoder>(&self, ty: &TypeExpr, decoder: D) -> Result<Value, EvalError> {
        let (codec, plan) = self.plan(ty, Direction::Deserialize)?;
        let machine: Machine<'c, D, JsonEncoder> = Machine::new(self, codec, plan, 0)?;
        machine.run_decode(decoder).map(|(value, _)| value)
    }

    /// Encode `value` as a `ty` to `encoder`.
    pub fn encode<E: Encoder>(&self, ty: &TypeExpr, encoder: E, value: &Value) -> Result<(), EvalError> {
        let (codec, plan) = self.plan(ty, Direction::Serialize)?;
        let machine: Machine<'c, JsonDecoder, E> = Machine::new(self, codec, plan, 0)?;
        machine.run_encode(encoder, value.clone()).map(|_| ())
    }

    pub fn decode_str(&self, ty: &TypeExpr, text: &str) -> Result<Value, EvalError> {
        let decoder = JsonDecoder::from_str(text)?;
        self.decode(ty, decoder)
    }

    pub fn encode_to_json(&self, ty: &TypeExpr, value: &Value) -> Result<serde_json::Value, EvalError> {
        let (codec, plan) = self.plan(ty, Direction::Serialize)?;
        let machine: Machine<'c, JsonDecoder, JsonEncoder> = Machine::new(self, codec, plan, 0)?;
        let encoder = machine.run_encode(JsonEncoder::new(), value.clone())?;
        Ok(encoder.into_value()?)
    }

    pub fn encode_to_string(&self, ty: &TypeExpr, value: &Value) -> Result<String, EvalError> {
        let (codec, plan) = self.plan(ty, Direction::Serialize)?;
        let machine: Machine<'c, JsonDecoder, JsonEncoder> = Machine::new(self, codec, plan, 0)?;
        let encoder = machine.run_encode(JsonEncoder::new(), value.clone())?;
        Ok(encoder.into_string()?)
    }
}

// =============================================================================
// Machine
// =============================================================================

enum Slot<D, E> {
    Empty,
    Value(Value),
    Decoder(D),
    Encoder(E),
}

enum Flow {
    Next,
    Break,
    Return(Value),
}

/// One running plan. A decode plan never touches an encoder slot and vice
/// versa, so the unused handle type is a placeholder.
struct Machine<'c, D, E> {
    table: &'c ClassTable,
    codecs: &'c CodecSet,
    codec: &'c GeneratedCodec,
    plan: &'c Plan,
    slots: Vec<Slot<D, E>>,
    depth: u32,
    max_depth: u32,
    on_write: Option<WriteHook<'c>>,
}

impl<'c, D: Decoder, E: Encoder> Machine<'c, D, E> {
    fn new(
        evaluator: &Evaluator<'c>,
        codec: &'c GeneratedCodec,
        plan: &'c Plan,
        depth: u32,
    ) -> Result<Self, EvalError> {
        if depth > evaluator.max_depth {
            return Err(EvalError::TooDeep);
        }
        trace!(
            target: "typecodec::eval",
            ty = %codec.ty.display(evaluator.table),
            kind = ?plan.kind,
            depth,
            "enter plan"
        );
        Ok(Self {
            table: evaluator.table,
            codecs: evaluator.codecs,
            codec,
            plan,
            slots: (0..plan.locals.len()).map(|_| Slot::Empty).collect(),
            depth,
            max_depth: evaluator.max_depth,
            on_write: evaluator.on_write,
        })
    }

    fn nested<D2: Decoder, E2: Encoder>(
        &self,
        codec: &'c GeneratedCodec,
        plan: &'c Plan,
    ) -> Result<Machine<'c, D2, E2>, EvalError> {
        let evaluator = Evaluator {
            table: self.table,
            codecs: self.codecs,
            max_depth: self.max_depth,
            on_write: self.on_write,
        };
        Machine::new(&evaluator, codec, plan, self.depth + 1)
    }

    fn run_decode(mut self, decoder: D) -> Result<(Value, D), EvalError> {
        let plan = self.plan;
        let [param] = plan.params.as_slice() else {
            return Err(EvalError::invalid("decode plan takes one decoder"));
        };
        self.put(*param, Slot::Decoder(decoder))?;
        let value = match self.exec_block(&plan.body)? {
            Flow::Return(value) => value,
            Flow::Next | Flow::Break => return Err(EvalError::invalid("decode plan ended without a value")),
        };
        let decoder = self.take_decoder(*param)?;
        Ok((value, decoder))
    }

    fn run_encode(mut self, encoder: E, value: Value) -> Result<E, EvalError> {
        let plan = self.plan;
        let [encoder_param, value_param] = plan.params.as_slice() else {
            return Err(EvalError::invalid("encode plan takes an encoder and a value"));
        };
        self.put(*encoder_param, Slot::Encoder(encoder))?;
        self.put(*value_param, Slot::Value(value))?;
        self.exec_block(&plan.body)?;
        self.take_encoder(*encoder_param)
    }

    // -------------------------------------------------------------------------
    // Slots
    // -------------------------------------------------------------------------

    fn local_name(&self, local: Local) -> String {
        self.plan.local_name(local).to_owned()
    }

    fn slot_mut(&mut self, local: Local) -> Result<&mut Slot<D, E>, EvalError> {
        let name = self.local_name(local);
        self.slots
            .get_mut(local.index())
            .ok_or_else(|| EvalError::invalid(format!("unknown local {name}")))
    }

    fn put(&mut self, local: Local, slot: Slot<D, E>) -> Result<(), EvalError> {
        *self.slot_mut(local)? = slot;
        Ok(())
    }

    fn value(&self, local: Local) -> Result<&Value, EvalError> {
        match self.slots.get(local.index()) {
            Some(Slot::Value(value)) => Ok(value),
            _ => Err(EvalError::invalid(format!("{} is not a value", self.local_name(local)))),
        }
    }

    fn value_mut(&mut self, local: Local) -> Result<&mut Value, EvalError> {
        let name = self.local_name(local);
        match self.slots.get_mut(local.index()) {
            Some(Slot::Value(value)) => Ok(value),
            _ => Err(EvalError::invalid(format!("{name} is not a value"))),
        }
    }

    fn decoder(&mut self, local: Local) -> Result<&mut D, EvalError> {
        let name = self.local_name(local);
        match self.slots.get_mut(local.index()) {
            Some(Slot::Decoder(decoder)) => Ok(decoder),
            _ => Err(EvalError::invalid(format!("{name} is not a decoder"))),
        }
    }

    fn encoder(&mut self, local: Local) -> Result<&mut E, EvalError> {
        let name = self.local_name(local);
        match self.slots.get_mut(local.index()) {
            Some(Slot::Encoder(encoder)) => Ok(encoder),
            _ => Err(EvalError::invalid(format!("{name} is not an encoder"))),
        }
    }

    fn take_decoder(&mut self, local: Local) -> Result<D, EvalError> {
        match std::mem::replace(self.slot_mut(local)?, Slot::Empty) {
            Slot::Decoder(decoder) => Ok(decoder),
            _ => Err(EvalError::invalid(format!("{} is not a decoder", self.local_name(local)))),
        }
    }

    fn take_encoder(&mut self, local: Local) -> Result<E, EvalError> {
        match std::mem::replace(self.slot_mut(local)?, Slot::Empty) {
            Slot::Encoder(encoder) => Ok(encoder),
            _ => Err(EvalError::invalid(format!("{} is not an encoder", self.local_name(local)))),
        }
    }

    fn mask(&self, local: Local) -> Result<u64, EvalError> {
        match self.value(local)? {
            Value::Long(bits) => Ok(*bits as u64),
            other => Err(EvalError::TypeMismatch {
                expected: "long",
                found: other.kind_name(),
            }),
        }
    }

    fn set_mask(&mut self, local: Local, bits: u64) -> Result<(), EvalError> {
        *self.value_mut(local)? = Value::Long(bits as i64);
        Ok(())
    }

    fn bean_mut(&mut self, local: Local) -> Result<&mut BeanValue, EvalError> {
        match self.value_mut(local)? {
            Value::Bean(bean) => Ok(bean),
            other => Err(EvalError::TypeMismatch {
                expected: "bean",
                found: other.kind_name(),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------

    fn exec_block(&mut self, block: &'c Block) -> Result<Flow, EvalError> {
        for stmt in &block.stmts {
            match self.exec(stmt)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, stmt: &'c Stmt) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Let { local, value } => {
                let value = self.eval(value)?;
                self.put(*local, Slot::Value(value))?;
            }
            Stmt::OpenDecoder { child, parent, kind } => {
                let parent = self.decoder(*parent)?;
                let opened = match kind {
                    StructureKind::Array => parent.decode_array()?,
                    StructureKind::Object => parent.decode_object()?,
                };
                self.put(*child, Slot::Decoder(opened))?;
            }
            Stmt::FinishDecoder(decoder) => self.decoder(*decoder)?.finish_structure()?,
            Stmt::SkipValue(decoder) => self.decoder(*decoder)?.skip_value()?,
            Stmt::OpenEncoder { child, parent, kind } => {
                let parent = self.encoder(*parent)?;
                let opened = match kind {
                    StructureKind::Array => parent.encode_array()?,
                    StructureKind::Object => parent.encode_object()?,
                };
                self.put(*child, Slot::Encoder(opened))?;
            }
            Stmt::FinishEncoder(encoder) => self.encoder(*encoder)?.finish_structure()?,
            Stmt::EncodeKey { encoder, key } => {
                let key = self.eval(key)?;
                let Value::String(key) = key else {
                    return Err(EvalError::TypeMismatch {
                        expected: "String",
                        found: key.kind_name(),
                    });
                };
                self.encoder(*encoder)?.encode_key(&key)?;
            }
            Stmt::Encode { encoder, kind, value } => {
                let value = self.eval(value)?;
                encode_scalar(self.encoder(*encoder)?, *kind, &value)?;
            }
            Stmt::EncodeNull(encoder) => self.encoder(*encoder)?.encode_null()?,
            Stmt::EncodeArbitrary { encoder, value } => {
                let value = self.eval(value)?;
                self.encoder(*encoder)?.encode_arbitrary(&value)?;
            }
            Stmt::EncodeInjected {
                encoder,
                injection,
                value,
            } => {
                let value = self.eval(value)?;
                self.encode_injected(*encoder, *injection, value)?;
            }
            Stmt::If { cond, then, otherwise } => {
                let branch = if self.eval_bool(cond)? { then } else { otherwise };
                return self.exec_block(branch);
            }
            Stmt::Loop(body) => loop {
                match self.exec_block(body)? {
                    Flow::Next => {}
                    Flow::Break => break,
                    flow @ Flow::Return(_) => return Ok(flow),
                }
            },
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Switch { on, cases, default } => {
                let on = self.eval(on)?;
                let text = on.as_str();
                let body = cases
                    .iter()
                    .find(|case| text.is_some_and(|text| case.labels.iter().any(|label| &**label == text)))
                    .map_or(default, |case| &case.body);
                return self.exec_block(body);
            }
            Stmt::ForEach { item, iterable, body } => {
                let items = match self.eval(iterable)? {
                    Value::List(items) => items,
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "list",
                            found: other.kind_name(),
                        });
                    }
                };
                for value in items {
                    self.put(*item, Slot::Value(value))?;
                    match self.exec_block(body)? {
                        Flow::Next => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            Stmt::ForEachEntry { key, value, map, body } => {
                let entries = match self.eval(map)? {
                    Value::Map(entries) => entries,
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "map",
                            found: other.kind_name(),
                        });
                    }
                };
                for (entry_key, entry_value) in entries {
                    self.put(*key, Slot::Value(Value::String(entry_key)))?;
                    self.put(*value, Slot::Value(entry_value))?;
                    match self.exec_block(body)? {
                        Flow::Next => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            Stmt::Push { list, value, distinct } => {
                let value = self.eval(value)?;
                match self.value_mut(*list)? {
                    Value::List(items) => {
                        if !*distinct || !items.contains(&value) {
                            items.push(value);
                        }
                    }
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "list",
                            found: other.kind_name(),
                        });
                    }
                }
            }
            Stmt::Put { map, key, value } => {
                let key = self.eval(key)?;
                let value = self.eval(value)?;
                let Value::String(key) = key else {
                    return Err(EvalError::TypeMismatch {
                        expected: "String",
                        found: key.kind_name(),
                    });
                };
                match self.value_mut(*map)? {
                    Value::Map(entries) => {
                        entries.insert(key, value);
                    }
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "map",
                            found: other.kind_name(),
                        });
                    }
                }
            }
            Stmt::SetBits { mask, bits } => {
                let current = self.mask(*mask)?;
                self.set_mask(*mask, current | bits)?;
            }
            Stmt::KeepBits { mask, bits } => {
                let current = self.mask(*mask)?;
                self.set_mask(*mask, current & bits)?;
            }
            Stmt::SetField { target, field, value } => {
                let value = self.eval(value)?;
                let on_write = self.on_write;
                let bean = self.bean_mut(*target)?;
                bean.set(field, value);
                if let Some(hook) = on_write {
                    hook(&bean.class, field);
                }
            }
            Stmt::CallSetter { target, method, value } => {
                let value = self.eval(value)?;
                let member = member_name_of_accessor(method);
                let on_write = self.on_write;
                let bean = self.bean_mut(*target)?;
                bean.set(&member, value);
                if let Some(hook) = on_write {
                    hook(&bean.class, method);
                }
            }
            Stmt::Fail(failure) => return Err(self.failure(failure)),
            Stmt::Return(value) => return Ok(Flow::Return(self.eval(value)?)),
        }
        Ok(Flow::Next)
    }

    fn failure(&self, failure: &Failure) -> EvalError {
        let text = |local: Local| match self.value(local) {
            Ok(Value::String(text)) => text.clone(),
            Ok(other) => other.kind_name().to_owned(),
            Err(_) => self.local_name(local),
        };
        let parse = match failure {
            Failure::DuplicateProperty { name } => ParseError::DuplicateProperty { name: name.to_string() },
            Failure::MissingProperty { name } => ParseError::MissingProperty { name: name.to_string() },
            Failure::UnknownProperty { type_name, key } => ParseError::UnknownProperty {
                type_name: type_name.clone(),
                name: text(*key),
            },
            Failure::BadEnumValue { path, value } => ParseError::BadEnumValue {
                path: path.clone(),
                value: text(*value),
            },
            Failure::AmbiguousType => ParseError::AmbiguousType,
            Failure::NoMatchingType => ParseError::NoMatchingType,
            Failure::AmbiguousProperty { name } => ParseError::AmbiguousProperty { name: name.to_string() },
            Failure::PropertyNotAllowed { name } => ParseError::PropertyNotAllowed { name: name.to_string() },
            Failure::UnknownTypeTag { tag } => ParseError::UnknownTypeTag { tag: text(*tag) },
            Failure::MissingTypeTag => ParseError::MissingTypeTag,
            Failure::UnknownEnumConstant { class } => {
                return EvalError::IncompatibleChange {
                    message: format!("unknown constant of {class}"),
                };
            }
            Failure::UnknownSubtype { type_name } => {
                return EvalError::IncompatibleChange {
                    message: format!("unknown subtype of {type_name}"),
                };
            }
            Failure::Unsupported { message } => {
                return EvalError::Unsupported {
                    message: message.clone(),
                };
            }
        };
        EvalError::from(parse)
    }

    // -------------------------------------------------------------------------
    // Injections
    // -------------------------------------------------------------------------

    fn injection(&self, id: InjectionId) -> Result<(StrategyKind, &'c TypeExpr), EvalError> {
        let codec = self.codec;
        let injection = codec
            .injection(id)
            .ok_or_else(|| EvalError::invalid(format!("unknown injection {}", id.0)))?;
        Ok((injection.kind, &injection.declared))
    }

    fn generated(&self, declared: &TypeExpr, direction: Direction) -> Result<(&'c GeneratedCodec, &'c Plan), EvalError> {
        let no_codec = || EvalError::NoCodec {
            ty: declared.display(self.table).to_string(),
            direction,
        };
        let codecs = self.codecs;
        let codec = codecs.get(declared).ok_or_else(no_codec)?;
        let plan = codec.plan(direction).ok_or_else(no_codec)?;
        Ok((codec, plan))
    }

    fn decode_injected(&mut self, decoder: Local, id: InjectionId) -> Result<Value, EvalError> {
        let (kind, declared) = self.injection(id)?;
        match kind {
            StrategyKind::Arbitrary => Ok(self.decoder(decoder)?.decode_arbitrary()?),
            StrategyKind::Generated => {
                let (codec, plan) = self.generated(declared, Direction::Deserialize)?;
                let machine: Machine<'c, D, E> = self.nested(codec, plan)?;
                let handle = self.take_decoder(decoder)?;
                let (value, handle) = machine.run_decode(handle)?;
                self.put(decoder, Slot::Decoder(handle))?;
                Ok(value)
            }
            other => Err(EvalError::Unsupported {
                message: format!("{other:?} codecs are not injected"),
            }),
        }
    }

    fn encode_injected(&mut self, encoder: Local, id: InjectionId, value: Value) -> Result<(), EvalError> {
        let (kind, declared) = self.injection(id)?;
        match kind {
            StrategyKind::Arbitrary => Ok(self.encoder(encoder)?.encode_arbitrary(&value)?),
            StrategyKind::Generated => {
                let (codec, plan) = self.generated(declared, Direction::Serialize)?;
                let machine: Machine<'c, D, E> = self.nested(codec, plan)?;
                let handle = self.take_encoder(encoder)?;
                let handle = machine.run_encode(handle, value)?;
                self.put(encoder, Slot::Encoder(handle))
            }
            other => Err(EvalError::Unsupported {
                message: format!("{other:?} codecs are not injected"),
            }),
        }
    }

    fn injected_is_empty(&self, id: InjectionId, value: &Value) -> Result<bool, EvalError> {
        let (kind, _) = self.injection(id)?;
        Ok(match kind {
            StrategyKind::Arbitrary => value.is_null() || is_empty(value),
            _ => value.is_null(),
        })
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    fn eval_bool(&mut self, expr: &'c Expr) -> Result<bool, EvalError> {
        match self.eval(expr)? {
            Value::Bool(value) => Ok(value),
            other => Err(EvalError::TypeMismatch {
                expected: "boolean",
                found: other.kind_name(),
            }),
        }
    }

    fn eval(&mut self, expr: &'c Expr) -> Result<Value, EvalError> {
        Ok(match expr {
            Expr::Local(local) => self.value(*local)?.clone(),
            Expr::Const(value) => value.clone(),
            Expr::Decode { decoder, kind } => decode_scalar(self.decoder(*decoder)?, *kind)?,
            Expr::DecodeKey(decoder) => match self.decoder(*decoder)?.decode_key()? {
                Some(key) => Value::String(key),
                None => Value::Null,
            },
            Expr::DecodeNull(decoder) => Value::Bool(self.decoder(*decoder)?.decode_null()?),
            Expr::DecodeArbitrary(decoder) => self.decoder(*decoder)?.decode_arbitrary()?,
            Expr::HasNextArrayValue(decoder) => Value::Bool(self.decoder(*decoder)?.has_next_array_value()?),
            Expr::DecodeInjected { decoder, injection } => self.decode_injected(*decoder, *injection)?,
            Expr::Not(inner) => Value::Bool(!self.eval_bool(inner)?),
            Expr::And(terms) => {
                for term in terms {
                    if !self.eval_bool(term)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Value::Bool(true)
            }
            Expr::Or(terms) => {
                for term in terms {
                    if self.eval_bool(term)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Value::Bool(false)
            }
            Expr::IsNull(inner) => Value::Bool(self.eval(inner)?.is_null()),
            Expr::Equals(inner, value) => Value::Bool(self.eval(inner)? == *value),
            Expr::IsEmpty(inner) => Value::Bool(is_empty(&self.eval(inner)?)),
            Expr::InjectedIsEmpty { injection, value } => {
                let value = self.eval(value)?;
                Value::Bool(self.injected_is_empty(*injection, &value)?)
            }
            Expr::AnyBits { mask, bits } => Value::Bool(self.mask(*mask)? & bits != 0),
            Expr::AllBits { mask, bits } => Value::Bool(self.mask(*mask)? & bits == *bits),
            Expr::MultipleBits(masks) => {
                let mut count = 0;
                for mask in masks {
                    count += self.mask(*mask)?.count_ones();
                }
                Value::Bool(count > 1)
            }
            Expr::EnumConstant { class, constant } => Value::enum_constant(class, constant),
            Expr::EnumName(inner) => match self.eval(inner)? {
                Value::Enum { constant, .. } => Value::String(constant),
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "enum",
                        found: other.kind_name(),
                    });
                }
            },
            Expr::Present(inner) => Value::present(self.eval(inner)?),
            Expr::EmptyOptional => Value::empty_optional(),
            Expr::IsPresent(inner) => Value::Bool(matches!(self.eval(inner)?, Value::Optional(Some(_)))),
            Expr::OptionalGet(inner) => match self.eval(inner)? {
                Value::Optional(Some(value)) => *value,
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "present Optional",
                        found: other.kind_name(),
                    });
                }
            },
            Expr::NewList => Value::List(Vec::new()),
            Expr::NewMap => Value::Map(Default::default()),
            Expr::GetField { target, field } => read_slot(self.eval(target)?, field)?,
            Expr::CallGetter { target, method } => {
                let member = member_name_of_accessor(method);
                read_slot(self.eval(target)?, &member)?
            }
            Expr::Construct { class, args, .. } => {
                let mut bean = BeanValue::new(class);
                for (slot, arg) in args {
                    let value = self.eval(arg)?;
                    bean.set(slot, value);
                }
                Value::Bean(bean)
            }
            Expr::InstanceOf { value, class } => {
                let value = self.eval(value)?;
                Value::Bool(value.as_bean().is_some_and(|bean| *bean.class == **class))
            }
            Expr::ToString(inner) => match self.eval(inner)? {
                Value::String(text) => Value::String(text),
                Value::Char(c) => Value::String(c.to_string()),
                Value::Enum { constant, .. } => Value::String(constant),
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "String",
                        found: other.kind_name(),
                    });
                }
            },
        })
    }
}

fn read_slot(target: Value, member: &str) -> Result<Value, EvalError> {
    match target {
        Value::Bean(bean) => Ok(bean.get(member).clone()),
        other => Err(EvalError::TypeMismatch {
            expected: "bean",
            found: other.kind_name(),
        }),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(text) => text.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        _ => false,
    }
}

fn decode_scalar<D: Decoder>(decoder: &mut D, kind: ScalarKind) -> Result<Value, DecodeError> {
    Ok(match kind {
        ScalarKind::Boolean => Value::Bool(decoder.decode_boolean()?),
        ScalarKind::Byte => Value::Byte(decoder.decode_byte()?),
        ScalarKind::Short => Value::Short(decoder.decode_short()?),
        ScalarKind::Char => Value::Char(decoder.decode_char()?),
        ScalarKind::Int => Value::Int(decoder.decode_int()?),
        ScalarKind::Long => Value::Long(decoder.decode_long()?),
        ScalarKind::Float => Value::Float(decoder.decode_float()?),
        ScalarKind::Double => Value::Double(decoder.decode_double()?),
        ScalarKind::BigInteger => Value::BigInteger(decoder.decode_big_integer()?),
        ScalarKind::BigDecimal => Value::BigDecimal(decoder.decode_big_decimal()?),
        ScalarKind::String => Value::String(decoder.decode_string()?),
    })
}

/// Write `value` with the call for `kind`. Narrower integer and float
/// values widen; anything else is a mismatch.
fn encode_scalar<E: Encoder>(encoder: &mut E, kind: ScalarKind, value: &Value) -> Result<(), EvalError> {
    match (kind, value) {
        (ScalarKind::Boolean, Value::Bool(v)) => encoder.encode_boolean(*v)?,
        (ScalarKind::Byte, Value::Byte(v)) => encoder.encode_byte(*v)?,
        (ScalarKind::Short, Value::Short(v)) => encoder.encode_short(*v)?,
        (ScalarKind::Short, Value::Byte(v)) => encoder.encode_short(i16::from(*v))?,
        (ScalarKind::Char, Value::Char(v)) => encoder.encode_char(*v)?,
        (ScalarKind::Int, Value::Int(v)) => encoder.encode_int(*v)?,
        (ScalarKind::Int, Value::Short(v)) => encoder.encode_int(i32::from(*v))?,
        (ScalarKind::Int, Value::Byte(v)) => encoder.encode_int(i32::from(*v))?,
        (ScalarKind::Long, Value::Long(v)) => encoder.encode_long(*v)?,
        (ScalarKind::Long, Value::Int(v)) => encoder.encode_long(i64::from(*v))?,
        (ScalarKind::Long, Value::Short(v)) => encoder.encode_long(i64::from(*v))?,
        (ScalarKind::Long, Value::Byte(v)) => encoder.encode_long(i64::from(*v))?,
        (ScalarKind::Float, Value::Float(v)) => encoder.encode_float(*v)?,
        (ScalarKind::Double, Value::Double(v)) => encoder.encode_double(*v)?,
        (ScalarKind::Double, Value::Float(v)) => encoder.encode_double(f64::from(*v))?,
        (ScalarKind::BigInteger, Value::BigInteger(digits)) => encoder.encode_big_integer(digits)?,
        (ScalarKind::BigInteger, Value::Int(v)) => encoder.encode_big_integer(&v.to_string())?,
        (ScalarKind::BigInteger, Value::Long(v)) => encoder.encode_big_integer(&v.to_string())?,
        (ScalarKind::BigDecimal, Value::BigDecimal(text) | Value::BigInteger(text)) => {
            encoder.encode_big_decimal(text)?
        }
        (ScalarKind::String, Value::String(text)) => encoder.encode_string(text)?,
        (kind, other) => {
            return Err(EvalError::TypeMismatch {
                expected: kind.name(),
                found: other.kind_name(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/eval_tests.rs"]
mod eval_tests;
