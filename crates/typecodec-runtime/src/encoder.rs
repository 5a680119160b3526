//! Encoder protocol and its JSON implementation.
//!
//! Mirrors the decoder: `encode_array`/`encode_object` return a child
//! handle, and only the innermost open handle may write. Inside an object
//! every value must be preceded by exactly one `encode_key`.

use crate::error::{EncodeError, ProtocolViolation};
use crate::value::Value;
use serde_json::{Map, Number, Value as JsonValue};
use std::cell::RefCell;
use std::rc::Rc;
use typecodec_common::limits::MAX_DOCUMENT_DEPTH;

/// Push-style writer of one JSON document.
pub trait Encoder: Sized {
    fn encode_array(&mut self) -> Result<Self, EncodeError>;
    fn encode_object(&mut self) -> Result<Self, EncodeError>;
    fn finish_structure(&mut self) -> Result<(), EncodeError>;
    fn encode_key(&mut self, key: &str) -> Result<(), EncodeError>;
    fn encode_string(&mut self, value: &str) -> Result<(), EncodeError>;
    fn encode_boolean(&mut self, value: bool) -> Result<(), EncodeError>;
    fn encode_byte(&mut self, value: i8) -> Result<(), EncodeError>;
    fn encode_short(&mut self, value: i16) -> Result<(), EncodeError>;
    fn encode_char(&mut self, value: char) -> Result<(), EncodeError>;
    fn encode_int(&mut self, value: i32) -> Result<(), EncodeError>;
    fn encode_long(&mut self, value: i64) -> Result<(), EncodeError>;
    fn encode_float(&mut self, value: f32) -> Result<(), EncodeError>;
    fn encode_double(&mut self, value: f64) -> Result<(), EncodeError>;
    fn encode_big_integer(&mut self, digits: &str) -> Result<(), EncodeError>;
    fn encode_big_decimal(&mut self, text: &str) -> Result<(), EncodeError>;
    fn encode_null(&mut self) -> Result<(), EncodeError>;

    /// Write a dynamic value with its natural JSON shape.
    fn encode_arbitrary(&mut self, value: &Value) -> Result<(), EncodeError> {
        encode_arbitrary_at(self, value, 0)
    }
}

fn encode_arbitrary_at<E: Encoder>(encoder: &mut E, value: &Value, depth: u32) -> Result<(), EncodeError> {
    if depth > MAX_DOCUMENT_DEPTH {
        return Err(EncodeError::TooDeep);
    }
    match value {
        Value::Null | Value::Optional(None) => encoder.encode_null(),
        Value::Bool(v) => encoder.encode_boolean(*v),
        Value::Byte(v) => encoder.encode_byte(*v),
        Value::Short(v) => encoder.encode_short(*v),
        Value::Char(v) => encoder.encode_char(*v),
        Value::Int(v) => encoder.encode_int(*v),
        Value::Long(v) => encoder.encode_long(*v),
        Value::Float(v) => encoder.encode_float(*v),
        Value::Double(v) => encoder.encode_double(*v),
        Value::BigInteger(v) => encoder.encode_big_integer(v),
        Value::BigDecimal(v) => encoder.encode_big_decimal(v),
        Value::String(v) => encoder.encode_string(v),
        Value::Enum { constant, .. } => encoder.encode_string(constant),
        Value::Optional(Some(inner)) => encode_arbitrary_at(encoder, inner, depth + 1),
        Value::List(items) => {
            let mut array = encoder.encode_array()?;
            for item in items {
                encode_arbitrary_at(&mut array, item, depth + 1)?;
            }
            array.finish_structure()
        }
        Value::Map(entries) => {
            let mut object = encoder.encode_object()?;
            for (key, item) in entries {
                object.encode_key(key)?;
                encode_arbitrary_at(&mut object, item, depth + 1)?;
            }
            object.finish_structure()
        }
        Value::Bean(bean) => {
            let mut object = encoder.encode_object()?;
            for (key, item) in &bean.slots {
                object.encode_key(key)?;
                encode_arbitrary_at(&mut object, item, depth + 1)?;
            }
            object.finish_structure()
        }
    }
}

// =============================================================================
// JsonEncoder
// =============================================================================

enum Frame {
    Root(Option<JsonValue>),
    Array(Vec<JsonValue>),
    Object {
        members: Map<String, JsonValue>,
        key: Option<String>,
    },
}

impl Frame {
    /// Whether a value may be written into this frame now.
    fn has_slot(&self) -> Result<(), ProtocolViolation> {
        match self {
            Frame::Root(Some(_)) => Err(ProtocolViolation::RootAlreadyWritten),
            Frame::Object { key: None, .. } => Err(ProtocolViolation::MissingKey),
            _ => Ok(()),
        }
    }

    fn put(&mut self, value: JsonValue) -> Result<(), ProtocolViolation> {
        match self {
            Frame::Root(slot @ None) => *slot = Some(value),
            Frame::Root(Some(_)) => return Err(ProtocolViolation::RootAlreadyWritten),
            Frame::Array(items) => items.push(value),
            Frame::Object { members, key } => {
                let key = key.take().ok_or(ProtocolViolation::MissingKey)?;
                members.insert(key, value);
            }
        }
        Ok(())
    }
}

struct Output {
    /// `(frame id, frame)`, innermost last. The root frame is never popped.
    frames: Vec<(u32, Frame)>,
    next_frame: u32,
}

/// [`Encoder`] that builds a `serde_json::Value`.
pub struct JsonEncoder {
    output: Rc<RefCell<Output>>,
    frame: u32,
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonEncoder {
    pub fn new() -> Self {
        JsonEncoder {
            output: Rc::new(RefCell::new(Output {
                frames: vec![(0, Frame::Root(None))],
                next_frame: 1,
            })),
            frame: 0,
        }
    }

    /// The finished document. Fails if a structure is still open or nothing
    /// was written.
    pub fn into_value(self) -> Result<JsonValue, EncodeError> {
        let mut output = self.output.borrow_mut();
        match output.frames.as_mut_slice() {
            [(_, Frame::Root(slot))] => slot.take().ok_or(ProtocolViolation::Incomplete.into()),
            _ => Err(ProtocolViolation::Incomplete.into()),
        }
    }

    pub fn into_string(self) -> Result<String, EncodeError> {
        Ok(self.into_value()?.to_string())
    }

    fn check_child(&self, output: &Output) -> Result<(), ProtocolViolation> {
        match output.frames.last() {
            Some((top, _)) if *top == self.frame => Ok(()),
            _ if output.frames.iter().any(|(id, _)| *id == self.frame) => {
                Err(ProtocolViolation::UnfinishedChild)
            }
            _ => Err(ProtocolViolation::ChildCompleted),
        }
    }

    fn write(&mut self, value: JsonValue) -> Result<(), EncodeError> {
        let mut output = self.output.borrow_mut();
        self.check_child(&output)?;
        match output.frames.last_mut() {
            Some((_, frame)) => frame.put(value)?,
            None => return Err(ProtocolViolation::ChildCompleted.into()),
        }
        Ok(())
    }

    fn open(&mut self, frame: Frame) -> Result<Self, EncodeError> {
        let mut output = self.output.borrow_mut();
        self.check_child(&output)?;
        if let Some((_, parent)) = output.frames.last() {
            parent.has_slot()?;
        }
        let id = output.next_frame;
        output.next_frame += 1;
        output.frames.push((id, frame));
        Ok(JsonEncoder {
            output: Rc::clone(&self.output),
            frame: id,
        })
    }

    /// Write a number literal. `serde_json` keeps the validated text as-is,
    /// so big values are written with every digit.
    fn write_number(&mut self, text: &str) -> Result<(), EncodeError> {
        let number: Number = serde_json::from_str(text).map_err(|_| EncodeError::InvalidNumber {
            text: text.to_owned(),
        })?;
        self.write(JsonValue::Number(number))
    }
}

impl Encoder for JsonEncoder {
    fn encode_array(&mut self) -> Result<Self, EncodeError> {
        self.open(Frame::Array(Vec::new()))
    }

    fn encode_object(&mut self) -> Result<Self, EncodeError> {
        self.open(Frame::Object {
            members: Map::new(),
            key: None,
        })
    }

    fn finish_structure(&mut self) -> Result<(), EncodeError> {
        let mut output = self.output.borrow_mut();
        self.check_child(&output)?;
        let value = match output.frames.pop() {
            Some((_, Frame::Array(items))) => JsonValue::Array(items),
            Some((_, Frame::Object { members, key: None })) => JsonValue::Object(members),
            Some(frame @ (_, Frame::Object { .. })) => {
                output.frames.push(frame);
                return Err(ProtocolViolation::MissingKey.into());
            }
            Some(frame @ (_, Frame::Root(_))) => {
                output.frames.push(frame);
                return Err(ProtocolViolation::NotInStructure.into());
            }
            None => return Err(ProtocolViolation::ChildCompleted.into()),
        };
        match output.frames.last_mut() {
            Some((_, parent)) => parent.put(value)?,
            None => return Err(ProtocolViolation::ChildCompleted.into()),
        }
        Ok(())
    }

    fn encode_key(&mut self, key: &str) -> Result<(), EncodeError> {
        let mut output = self.output.borrow_mut();
        self.check_child(&output)?;
        match output.frames.last_mut() {
            Some((_, Frame::Object { key: slot @ None, .. })) => {
                *slot = Some(key.to_owned());
                Ok(())
            }
            _ => Err(ProtocolViolation::UnexpectedKey.into()),
        }
    }

    fn encode_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write(JsonValue::String(value.to_owned()))
    }

    fn encode_boolean(&mut self, value: bool) -> Result<(), EncodeError> {
        self.write(JsonValue::Bool(value))
    }

    fn encode_byte(&mut self, value: i8) -> Result<(), EncodeError> {
        self.write(JsonValue::from(value))
    }

    fn encode_short(&mut self, value: i16) -> Result<(), EncodeError> {
        self.write(JsonValue::from(value))
    }

    /// Chars are written as one-character strings.
    fn encode_char(&mut self, value: char) -> Result<(), EncodeError> {
        self.write(JsonValue::String(value.to_string()))
    }

    fn encode_int(&mut self, value: i32) -> Result<(), EncodeError> {
        self.write(JsonValue::from(value))
    }

    fn encode_long(&mut self, value: i64) -> Result<(), EncodeError> {
        self.write(JsonValue::from(value))
    }

    fn encode_float(&mut self, value: f32) -> Result<(), EncodeError> {
        self.encode_double(f64::from(value))
    }

    /// Non-finite values are written as the strings `NaN`, `Infinity` and
    /// `-Infinity`, which `decode_double` reads back.
    fn encode_double(&mut self, value: f64) -> Result<(), EncodeError> {
        let json = match Number::from_f64(value) {
            Some(number) => JsonValue::Number(number),
            None if value.is_nan() => JsonValue::String("NaN".to_owned()),
            None if value > 0.0 => JsonValue::String("Infinity".to_owned()),
            None => JsonValue::String("-Infinity".to_owned()),
        };
        self.write(json)
    }

    fn encode_big_integer(&mut self, digits: &str) -> Result<(), EncodeError> {
        self.write_number(digits)
    }

    fn encode_big_decimal(&mut self, text: &str) -> Result<(), EncodeError> {
        self.write_number(text)
    }

    fn encode_null(&mut self) -> Result<(), EncodeError> {
        self.write(JsonValue::Null)
    }
}

#[cfg(test)]
#[path = "../tests/encoder_tests.rs"]
mod encoder_tests;
