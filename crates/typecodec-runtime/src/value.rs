//! Dynamic runtime values.
//!
//! [`Value`] stands in for the objects a generated codec reads and writes.
//! Scalars keep their declared width, so a `short` property decodes to
//! [`Value::Short`], and big numbers keep their exact decimal text.
//! Beans are plain slot maps keyed by property name.

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Decimal digits with optional leading `-`.
    BigInteger(String),
    /// JSON number text.
    BigDecimal(String),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Enum { class: Arc<str>, constant: String },
    /// `None` is an empty `Optional`, distinct from a null reference.
    Optional(Option<Box<Value>>),
    Bean(BeanValue),
}

static NULL: Value = Value::Null;

/// An instance of a bean class.
#[derive(Clone, Debug, PartialEq)]
pub struct BeanValue {
    pub class: Arc<str>,
    pub slots: IndexMap<String, Value>,
}

impl BeanValue {
    pub fn new(class: &str) -> Self {
        BeanValue {
            class: Arc::from(class),
            slots: IndexMap::new(),
        }
    }

    pub fn with(mut self, slot: &str, value: impl Into<Value>) -> Self {
        self.slots.insert(slot.to_owned(), value.into());
        self
    }

    /// Missing slots read as null, like an unset field.
    pub fn get(&self, slot: &str) -> &Value {
        self.slots.get(slot).unwrap_or(&NULL)
    }

    pub fn set(&mut self, slot: &str, value: Value) {
        self.slots.insert(slot.to_owned(), value);
    }
}

impl Value {
    pub fn enum_constant(class: &str, constant: &str) -> Self {
        Value::Enum {
            class: Arc::from(class),
            constant: constant.to_owned(),
        }
    }

    pub fn empty_optional() -> Self {
        Value::Optional(None)
    }

    pub fn present(value: impl Into<Value>) -> Self {
        Value::Optional(Some(Box::new(value.into())))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bean(&self) -> Option<&BeanValue> {
        match self {
            Value::Bean(bean) => Some(bean),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::BigInteger(_) => "BigInteger",
            Value::BigDecimal(_) => "BigDecimal",
            Value::String(_) => "String",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Enum { .. } => "enum",
            Value::Optional(_) => "Optional",
            Value::Bean(_) => "bean",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<BeanValue> for Value {
    fn from(v: BeanValue) -> Self {
        Value::Bean(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Optional(None) => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Byte(v) => serializer.serialize_i8(*v),
            Value::Short(v) => serializer.serialize_i16(*v),
            Value::Char(v) => serializer.serialize_char(*v),
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::Long(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            // Generic serializers have no arbitrary-precision number; keep
            // the digits.
            Value::BigInteger(text) | Value::BigDecimal(text) => serializer.serialize_str(text),
            Value::String(v) => serializer.serialize_str(v),
            Value::Enum { constant, .. } => serializer.serialize_str(constant),
            Value::Optional(Some(inner)) => inner.serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Bean(bean) => {
                let mut map = serializer.serialize_map(Some(bean.slots.len()))?;
                for (key, value) in &bean.slots {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
