//! JSON token stream.
//!
//! The decoder works on a flat token list rather than on a parsed
//! `serde_json::Value`: a value tree would collapse duplicate object keys,
//! and detecting those is part of decoding. Tokens are produced by feeding
//! the text through `serde_json`'s deserializer with a visitor that records
//! every event in document order.
//!
//! `serde_json` is built with `arbitrary_precision`: integers that fit 64
//! bits arrive through `visit_i64`/`visit_u64`, every other number arrives
//! as a one-entry map keyed by [`NUMBER_KEY`] whose value is the literal
//! text. Tokens keep that text, so big integers and decimals lose no digits.

use crate::error::ParseError;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use std::fmt;
use tracing::trace;

/// Key `serde_json` uses to hand over the text of a number it did not
/// convert to a machine integer.
const NUMBER_KEY: &str = "$serde_json::private::Number";

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
    /// Sentinel after the last real token.
    EndOfInput,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::StartObject => TokenKind::StartObject,
            Token::EndObject => TokenKind::EndObject,
            Token::StartArray => TokenKind::StartArray,
            Token::EndArray => TokenKind::EndArray,
            Token::FieldName(_) => TokenKind::FieldName,
            Token::String(_) => TokenKind::String,
            Token::Number(n) if n.is_f64() => TokenKind::Float,
            Token::Number(_) => TokenKind::Int,
            Token::Bool(true) => TokenKind::True,
            Token::Bool(false) => TokenKind::False,
            Token::Null => TokenKind::Null,
            Token::EndOfInput => TokenKind::EndOfInput,
        }
    }
}

/// Payload-free token kind, used in error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName,
    String,
    Int,
    Float,
    True,
    False,
    Null,
    EndOfInput,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::StartObject => "START_OBJECT",
            TokenKind::EndObject => "END_OBJECT",
            TokenKind::StartArray => "START_ARRAY",
            TokenKind::EndArray => "END_ARRAY",
            TokenKind::FieldName => "FIELD_NAME",
            TokenKind::String => "VALUE_STRING",
            TokenKind::Int => "VALUE_NUMBER_INT",
            TokenKind::Float => "VALUE_NUMBER_FLOAT",
            TokenKind::True => "VALUE_TRUE",
            TokenKind::False => "VALUE_FALSE",
            TokenKind::Null => "VALUE_NULL",
            TokenKind::EndOfInput => "end of input",
        })
    }
}

/// Tokenize one JSON document. Trailing non-whitespace is an error.
///
/// The returned list always ends with [`Token::EndOfInput`].
pub fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut deserializer = serde_json::Deserializer::from_str(text);
    TokenSink { out: &mut tokens }
        .deserialize(&mut deserializer)
        .and_then(|()| deserializer.end())
        .map_err(|err| ParseError::Syntax {
            message: err.to_string(),
        })?;
    tokens.push(Token::EndOfInput);
    trace!(target: "typecodec::runtime", tokens = tokens.len(), "tokenize");
    Ok(tokens)
}

struct TokenSink<'a> {
    out: &'a mut Vec<Token>,
}

impl<'de> DeserializeSeed<'de> for TokenSink<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for TokenSink<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<(), E> {
        self.out.push(Token::Bool(v));
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<(), E> {
        self.out.push(Token::Number(v.into()));
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<(), E> {
        self.out.push(Token::Number(v.into()));
        Ok(())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<(), E> {
        self.out.push(Token::String(v.to_owned()));
        Ok(())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<(), E> {
        self.out.push(Token::String(v));
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        self.out.push(Token::Null);
        Ok(())
    }

    fn visit_none<E: de::Error>(self) -> Result<(), E> {
        self.visit_unit()
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        self.out.push(Token::StartArray);
        while seq.next_element_seed(TokenSink { out: self.out })?.is_some() {}
        self.out.push(Token::EndArray);
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let mut key = map.next_key::<String>()?;
        if key.as_deref() == Some(NUMBER_KEY) {
            let text: String = map.next_value()?;
            let number = serde_json::from_str(&text).map_err(de::Error::custom)?;
            self.out.push(Token::Number(number));
            return Ok(());
        }
        self.out.push(Token::StartObject);
        while let Some(name) = key {
            self.out.push(Token::FieldName(name));
            map.next_value_seed(TokenSink { out: self.out })?;
            key = map.next_key()?;
        }
        self.out.push(Token::EndObject);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/token_tests.rs"]
mod token_tests;
