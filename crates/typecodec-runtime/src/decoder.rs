//! Decoder protocol and its JSON implementation.
//!
//! A decoder is a cursor into a token stream. `decode_array`/`decode_object`
//! return a child handle positioned on the first member; the parent may not
//! be touched again until the child's `finish_structure` has consumed the end
//! marker.
//!
//! ```text
//! let mut object = decoder.decode_object()?;
//! while let Some(key) = object.decode_key()? {
//!     match key.as_str() {
//!         "x" => x = object.decode_int()?,
//!         _ => object.skip_value()?,
//!     }
//! }
//! object.finish_structure()?;
//! ```
//!
//! `JsonDecoder` handles share one cursor (`Rc<RefCell<..>>`) and a stack of
//! open frame ids; a handle may act only while its frame is on top.

use crate::config::DecoderConfig;
use crate::error::{DecodeError, ParseError, ProtocolViolation};
use crate::token::{Token, TokenKind, tokenize};
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Pull-style reader over one JSON document.
pub trait Decoder: Sized {
    /// Enter an array; the child is positioned on the first element.
    fn decode_array(&mut self) -> Result<Self, DecodeError>;
    fn has_next_array_value(&mut self) -> Result<bool, DecodeError>;
    /// Enter an object; the child is positioned on the first key.
    fn decode_object(&mut self) -> Result<Self, DecodeError>;
    /// Next key, or `None` at the end of the object (the end marker is left
    /// for `finish_structure`).
    fn decode_key(&mut self) -> Result<Option<String>, DecodeError>;
    fn decode_string(&mut self) -> Result<String, DecodeError>;
    fn decode_boolean(&mut self) -> Result<bool, DecodeError>;
    fn decode_byte(&mut self) -> Result<i8, DecodeError>;
    fn decode_short(&mut self) -> Result<i16, DecodeError>;
    fn decode_char(&mut self) -> Result<char, DecodeError>;
    fn decode_int(&mut self) -> Result<i32, DecodeError>;
    fn decode_long(&mut self) -> Result<i64, DecodeError>;
    fn decode_float(&mut self) -> Result<f32, DecodeError>;
    fn decode_double(&mut self) -> Result<f64, DecodeError>;
    /// Integer digits, normalized (no `+`, no leading zeros).
    fn decode_big_integer(&mut self) -> Result<String, DecodeError>;
    /// Decimal number text.
    fn decode_big_decimal(&mut self) -> Result<String, DecodeError>;
    /// Consume a null literal if present. Never fails on a non-null token;
    /// the cursor is left unchanged instead.
    fn decode_null(&mut self) -> Result<bool, DecodeError>;
    fn decode_arbitrary(&mut self) -> Result<Value, DecodeError>;
    fn skip_value(&mut self) -> Result<(), DecodeError>;
    /// Leave the current array/object. The cursor must be on its end marker.
    fn finish_structure(&mut self) -> Result<(), DecodeError>;
}

// =============================================================================
// JsonDecoder
// =============================================================================

const ROOT_FRAME: u32 = 0;

static END_OF_INPUT: Token = Token::EndOfInput;

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    /// Open frames, innermost last. The root frame is never popped.
    open: Vec<u32>,
    next_frame: u32,
    config: DecoderConfig,
}

impl Cursor {
    fn current(&self) -> &Token {
        // The stream always ends with EndOfInput and the cursor never moves
        // past it.
        self.tokens.get(self.pos).unwrap_or(&END_OF_INPUT)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        } else {
            self.pos = self.tokens.len().saturating_sub(1);
        }
    }
}

/// [`Decoder`] over a tokenized JSON document.
pub struct JsonDecoder {
    cursor: Rc<RefCell<Cursor>>,
    frame: u32,
}

impl JsonDecoder {
    pub fn from_str(text: &str) -> Result<Self, ParseError> {
        Self::with_config(text, DecoderConfig::default())
    }

    pub fn with_config(text: &str, config: DecoderConfig) -> Result<Self, ParseError> {
        Ok(Self::from_tokens(tokenize(text)?, config))
    }

    pub fn from_tokens(mut tokens: Vec<Token>, config: DecoderConfig) -> Self {
        if tokens.last() != Some(&Token::EndOfInput) {
            tokens.push(Token::EndOfInput);
        }
        JsonDecoder {
            cursor: Rc::new(RefCell::new(Cursor {
                tokens,
                pos: 0,
                open: vec![ROOT_FRAME],
                next_frame: ROOT_FRAME + 1,
                config,
            })),
            frame: ROOT_FRAME,
        }
    }

    /// Kind of the token under the cursor.
    pub fn current_kind(&self) -> TokenKind {
        self.cursor.borrow().current().kind()
    }

    /// Whether the root value has been fully consumed.
    pub fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::EndOfInput
    }

    fn check_child(&self, cursor: &Cursor) -> Result<(), ProtocolViolation> {
        match cursor.open.last() {
            Some(&top) if top == self.frame => Ok(()),
            _ if cursor.open.contains(&self.frame) => Err(ProtocolViolation::UnfinishedChild),
            _ => Err(ProtocolViolation::ChildCompleted),
        }
    }

    fn pre_decode_value(&self, cursor: &Cursor) -> Result<(), ProtocolViolation> {
        self.check_child(cursor)?;
        if matches!(cursor.current(), Token::FieldName(_)) {
            return Err(ProtocolViolation::KeyNotConsumed);
        }
        Ok(())
    }

    fn enter(&mut self, start: TokenKind, expected: &'static str) -> Result<Self, DecodeError> {
        let mut cursor = self.cursor.borrow_mut();
        self.pre_decode_value(&cursor)?;
        let found = cursor.current().kind();
        if found != start {
            return Err(ParseError::UnexpectedToken { expected, found }.into());
        }
        cursor.advance();
        let frame = cursor.next_frame;
        cursor.next_frame += 1;
        cursor.open.push(frame);
        Ok(JsonDecoder {
            cursor: Rc::clone(&self.cursor),
            frame,
        })
    }

    /// Read the current scalar token with `read` and advance past it.
    fn scalar<T>(
        &mut self,
        expected: &'static str,
        read: impl FnOnce(&Token) -> Option<Result<T, ParseError>>,
    ) -> Result<T, DecodeError> {
        let mut cursor = self.cursor.borrow_mut();
        self.pre_decode_value(&cursor)?;
        let token = cursor.current();
        let value = match read(token) {
            Some(result) => result?,
            None => {
                return Err(ParseError::UnexpectedToken {
                    expected,
                    found: token.kind(),
                }
                .into());
            }
        };
        cursor.advance();
        Ok(value)
    }

    fn decode_integer(&mut self, min: i64, max: i64, target: &'static str) -> Result<i64, DecodeError> {
        self.scalar("integer", |token| {
            let value = match token {
                Token::Number(n) => number_to_i64(n, target),
                Token::String(s) => parse_integer_text(s.trim(), target),
                Token::Bool(b) => Ok(i64::from(*b)),
                _ => return None,
            };
            Some(value.and_then(|v| {
                if v < min || v > max {
                    Err(ParseError::NumberOutOfRange {
                        text: v.to_string(),
                        target,
                    })
                } else {
                    Ok(v)
                }
            }))
        })
    }

    fn decode_arbitrary_map(&mut self) -> Result<Value, DecodeError> {
        let mut object = self.decode_object()?;
        let mut entries = IndexMap::new();
        while let Some(key) = object.decode_key()? {
            let value = object.decode_arbitrary()?;
            entries.insert(key, value);
        }
        object.finish_structure()?;
        Ok(Value::Map(entries))
    }

    fn decode_arbitrary_list(&mut self) -> Result<Value, DecodeError> {
        let mut array = self.decode_array()?;
        let mut items = Vec::new();
        while array.has_next_array_value()? {
            items.push(array.decode_arbitrary()?);
        }
        array.finish_structure()?;
        Ok(Value::List(items))
    }
}

impl Decoder for JsonDecoder {
    fn decode_array(&mut self) -> Result<Self, DecodeError> {
        self.enter(TokenKind::StartArray, "array")
    }

    fn has_next_array_value(&mut self) -> Result<bool, DecodeError> {
        let cursor = self.cursor.borrow();
        self.check_child(&cursor)?;
        Ok(!matches!(cursor.current(), Token::EndArray | Token::EndOfInput))
    }

    fn decode_object(&mut self) -> Result<Self, DecodeError> {
        self.enter(TokenKind::StartObject, "object")
    }

    fn decode_key(&mut self) -> Result<Option<String>, DecodeError> {
        let mut cursor = self.cursor.borrow_mut();
        self.check_child(&cursor)?;
        let key = match cursor.current() {
            Token::EndObject => return Ok(None),
            Token::FieldName(name) => name.clone(),
            _ => return Err(ProtocolViolation::NotAtKey.into()),
        };
        cursor.advance();
        Ok(Some(key))
    }

    fn decode_string(&mut self) -> Result<String, DecodeError> {
        self.scalar("string", |token| match token {
            Token::String(s) => Some(Ok(s.clone())),
            Token::Number(n) => Some(Ok(n.to_string())),
            Token::Bool(b) => Some(Ok(b.to_string())),
            _ => None,
        })
    }

    fn decode_boolean(&mut self) -> Result<bool, DecodeError> {
        self.scalar("boolean", |token| match token {
            Token::Bool(b) => Some(Ok(*b)),
            Token::Number(n) => Some(Ok(n.as_f64().is_some_and(|v| v != 0.0))),
            Token::String(s) => Some(match s.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(ParseError::InvalidBoolean {
                    text: other.to_owned(),
                }),
            }),
            _ => None,
        })
    }

    fn decode_byte(&mut self) -> Result<i8, DecodeError> {
        let v = self.decode_integer(i8::MIN.into(), i8::MAX.into(), "byte")?;
        Ok(v as i8)
    }

    fn decode_short(&mut self) -> Result<i16, DecodeError> {
        let v = self.decode_integer(i16::MIN.into(), i16::MAX.into(), "short")?;
        Ok(v as i16)
    }

    fn decode_char(&mut self) -> Result<char, DecodeError> {
        {
            let mut cursor = self.cursor.borrow_mut();
            self.pre_decode_value(&cursor)?;
            if let Token::String(s) = cursor.current() {
                let mut chars = s.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    cursor.advance();
                    return Ok(c);
                }
            }
        }
        let code = self.decode_integer(0, 0xFFFF, "char")?;
        char::from_u32(code as u32).ok_or_else(|| {
            ParseError::NumberOutOfRange {
                text: code.to_string(),
                target: "char",
            }
            .into()
        })
    }

    fn decode_int(&mut self) -> Result<i32, DecodeError> {
        let v = self.decode_integer(i32::MIN.into(), i32::MAX.into(), "int")?;
        Ok(v as i32)
    }

    fn decode_long(&mut self) -> Result<i64, DecodeError> {
        self.decode_integer(i64::MIN, i64::MAX, "long")
    }

    fn decode_float(&mut self) -> Result<f32, DecodeError> {
        Ok(self.decode_double()? as f32)
    }

    fn decode_double(&mut self) -> Result<f64, DecodeError> {
        self.scalar("float", |token| match token {
            Token::Number(n) => Some(n.as_f64().ok_or_else(|| ParseError::NumberOutOfRange {
                text: n.to_string(),
                target: "double",
            })),
            Token::String(s) => Some(s.trim().parse::<f64>().map_err(|_| ParseError::MalformedNumber {
                text: s.clone(),
                target: "double",
            })),
            Token::Bool(b) => Some(Ok(if *b { 1.0 } else { 0.0 })),
            _ => None,
        })
    }

    fn decode_big_integer(&mut self) -> Result<String, DecodeError> {
        self.scalar("integer", |token| match token {
            Token::Number(n) => Some(number_integer_text(n).ok_or_else(|| ParseError::NumberOutOfRange {
                text: n.to_string(),
                target: "BigInteger",
            })),
            Token::String(s) => Some(normalize_integer_text(s.trim()).ok_or_else(|| {
                ParseError::MalformedNumber {
                    text: s.clone(),
                    target: "BigInteger",
                }
            })),
            Token::Bool(b) => Some(Ok(if *b { "1" } else { "0" }.to_owned())),
            _ => None,
        })
    }

    fn decode_big_decimal(&mut self) -> Result<String, DecodeError> {
        self.scalar("float", |token| match token {
            Token::Number(n) => Some(Ok(n.to_string())),
            Token::String(s) => {
                let text = s.trim();
                Some(if is_decimal_text(text) {
                    Ok(text.trim_start_matches('+').to_owned())
                } else {
                    Err(ParseError::MalformedNumber {
                        text: s.clone(),
                        target: "BigDecimal",
                    })
                })
            }
            Token::Bool(b) => Some(Ok(if *b { "1" } else { "0" }.to_owned())),
            _ => None,
        })
    }

    fn decode_null(&mut self) -> Result<bool, DecodeError> {
        let mut cursor = self.cursor.borrow_mut();
        self.pre_decode_value(&cursor)?;
        if matches!(cursor.current(), Token::Null) {
            cursor.advance();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn decode_arbitrary(&mut self) -> Result<Value, DecodeError> {
        let (kind, number, config) = {
            let cursor = self.cursor.borrow();
            self.pre_decode_value(&cursor)?;
            let number = match cursor.current() {
                Token::Number(n) => Some(n.clone()),
                _ => None,
            };
            (cursor.current().kind(), number, cursor.config)
        };
        match kind {
            TokenKind::StartObject => self.decode_arbitrary_map(),
            TokenKind::StartArray => self.decode_arbitrary_list(),
            TokenKind::String => Ok(Value::String(self.decode_string()?)),
            TokenKind::True | TokenKind::False => Ok(Value::Bool(self.decode_boolean()?)),
            TokenKind::Null => {
                self.decode_null()?;
                Ok(Value::Null)
            }
            TokenKind::Int if config.use_big_integer_for_ints => {
                Ok(Value::BigInteger(self.decode_big_integer()?))
            }
            TokenKind::Int => {
                let fits = number.as_ref().and_then(serde_json::Number::as_i64);
                match fits {
                    Some(v) if i32::try_from(v).is_ok() => Ok(Value::Int(self.decode_int()?)),
                    Some(_) => Ok(Value::Long(self.decode_long()?)),
                    None => Ok(Value::BigInteger(self.decode_big_integer()?)),
                }
            }
            TokenKind::Float if config.use_big_decimal_for_floats => {
                Ok(Value::BigDecimal(self.decode_big_decimal()?))
            }
            TokenKind::Float => Ok(Value::Double(self.decode_double()?)),
            found => Err(ParseError::UnexpectedToken {
                expected: "value",
                found,
            }
            .into()),
        }
    }

    fn skip_value(&mut self) -> Result<(), DecodeError> {
        let mut cursor = self.cursor.borrow_mut();
        self.pre_decode_value(&cursor)?;
        if let found @ (TokenKind::EndObject | TokenKind::EndArray) = cursor.current().kind() {
            return Err(ParseError::UnexpectedToken {
                expected: "value",
                found,
            }
            .into());
        }
        let mut depth = 0usize;
        loop {
            match cursor.current() {
                Token::StartObject | Token::StartArray => depth += 1,
                Token::EndObject | Token::EndArray => depth = depth.saturating_sub(1),
                Token::EndOfInput => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "value",
                        found: TokenKind::EndOfInput,
                    }
                    .into());
                }
                _ => {}
            }
            cursor.advance();
            if depth == 0 {
                return Ok(());
            }
        }
    }

    fn finish_structure(&mut self) -> Result<(), DecodeError> {
        let mut cursor = self.cursor.borrow_mut();
        self.check_child(&cursor)?;
        if self.frame == ROOT_FRAME {
            return Err(ProtocolViolation::NotInStructure.into());
        }
        if !matches!(cursor.current(), Token::EndArray | Token::EndObject) {
            return Err(ProtocolViolation::NotAllConsumed.into());
        }
        cursor.open.pop();
        cursor.advance();
        Ok(())
    }
}

fn number_to_i64(n: &serde_json::Number, target: &'static str) -> Result<i64, ParseError> {
    if let Some(v) = n.as_i64() {
        return Ok(v);
    }
    match n.as_f64() {
        Some(v) if n.is_f64() && v.is_finite() && v.trunc().abs() < 9.223_372_036_854_776e18 => {
            Ok(v.trunc() as i64)
        }
        _ => Err(ParseError::NumberOutOfRange {
            text: n.to_string(),
            target,
        }),
    }
}

fn parse_integer_text(text: &str, target: &'static str) -> Result<i64, ParseError> {
    if let Ok(v) = text.parse::<i64>() {
        return Ok(v);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v.trunc().abs() < 9.223_372_036_854_776e18 => Ok(v.trunc() as i64),
        Ok(_) => Err(ParseError::NumberOutOfRange {
            text: text.to_owned(),
            target,
        }),
        Err(_) => Err(ParseError::MalformedNumber {
            text: text.to_owned(),
            target,
        }),
    }
}

/// Integer part of a number literal. Plain literals keep every digit;
/// exponent forms go through `f64`.
fn number_integer_text(n: &serde_json::Number) -> Option<String> {
    let text = n.to_string();
    if text.contains(['e', 'E']) {
        return n.as_f64().map(|v| format!("{:.0}", v.trunc()));
    }
    let whole = text.split_once('.').map_or(text.as_str(), |(whole, _)| whole);
    normalize_integer_text(whole)
}

/// `[+-]digits` with leading zeros and `+` removed.
fn normalize_integer_text(text: &str) -> Option<String> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(match (trimmed.is_empty(), negative) {
        (true, _) => "0".to_owned(),
        (false, true) => format!("-{trimmed}"),
        (false, false) => trimmed.to_owned(),
    })
}

fn is_decimal_text(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        && text.parse::<f64>().is_ok()
}

#[cfg(test)]
#[path = "../tests/decoder_tests.rs"]
mod decoder_tests;
