//! Runtime errors.
//!
//! [`ParseError`] is about the input document and is always surfaced to the
//! caller of a generated decoder. [`ProtocolViolation`] means the decoder or
//! encoder was driven incorrectly, which is a bug in the plan (or in a hand
//! written codec), not in the data.

use crate::token::TokenKind;
use std::fmt;

/// The input document does not match what the decoder expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The text is not valid JSON.
    Syntax { message: String },
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
    },
    /// A string that should have been a number.
    MalformedNumber { text: String, target: &'static str },
    NumberOutOfRange { text: String, target: &'static str },
    /// A string that should have been a boolean.
    InvalidBoolean { text: String },
    DuplicateProperty { name: String },
    MissingProperty { name: String },
    UnknownProperty { type_name: String, name: String },
    BadEnumValue { path: String, value: String },
    AmbiguousType,
    NoMatchingType,
    AmbiguousProperty { name: String },
    PropertyNotAllowed { name: String },
    UnknownTypeTag { tag: String },
    MissingTypeTag,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax { message } => write!(f, "Malformed JSON: {message}"),
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "Unexpected token {found}, expected {expected}")
            }
            ParseError::MalformedNumber { text, target } => {
                write!(f, "Cannot parse '{text}' as {target}")
            }
            ParseError::NumberOutOfRange { text, target } => {
                write!(f, "Numeric value {text} out of range of {target}")
            }
            ParseError::InvalidBoolean { text } => write!(f, "Cannot parse '{text}' as boolean"),
            ParseError::DuplicateProperty { name } => write!(f, "Duplicate property {name}"),
            ParseError::MissingProperty { name } => write!(f, "Missing property {name}"),
            ParseError::UnknownProperty { type_name, name } => {
                write!(f, "Unknown property for type {type_name}: {name}")
            }
            ParseError::BadEnumValue { path, value } => {
                write!(f, "Bad enum value for field {path}: {value}")
            }
            ParseError::AmbiguousType => f.write_str("Ambiguous type"),
            ParseError::NoMatchingType => f.write_str("No matching type candidate"),
            ParseError::AmbiguousProperty { name } => write!(f, "Ambiguous property {name}"),
            ParseError::PropertyNotAllowed { name } => {
                write!(f, "Property not allowed for these types: {name}")
            }
            ParseError::UnknownTypeTag { tag } => write!(f, "Unknown type tag {tag}"),
            ParseError::MissingTypeTag => f.write_str("Expected type tag, but got object end"),
        }
    }
}

impl std::error::Error for ParseError {}

/// A decoder or encoder handle was used out of order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A child handle was opened and not finished yet.
    UnfinishedChild,
    /// This child handle was already finished.
    ChildCompleted,
    /// A value was requested while the cursor is on an object key.
    KeyNotConsumed,
    /// `decode_key` was called while the cursor is not on a key.
    NotAtKey,
    /// `finish_structure` was called before the end marker.
    NotAllConsumed,
    /// `finish_structure` on a root handle.
    NotInStructure,
    /// An object member value without a preceding key.
    MissingKey,
    /// `encode_key` outside an object, or twice in a row.
    UnexpectedKey,
    /// A second top-level value.
    RootAlreadyWritten,
    /// The output was taken while structures were still open or nothing
    /// was written.
    Incomplete,
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtocolViolation::UnfinishedChild => "There is still an unfinished child handle",
            ProtocolViolation::ChildCompleted => "This child handle has already completed",
            ProtocolViolation::KeyNotConsumed => "Haven't parsed field name yet",
            ProtocolViolation::NotAtKey => "Not at a field name",
            ProtocolViolation::NotAllConsumed => "Not all elements have been consumed yet",
            ProtocolViolation::NotInStructure => "Not in structure",
            ProtocolViolation::MissingKey => "Object member written without a key",
            ProtocolViolation::UnexpectedKey => "Key written outside of an object member slot",
            ProtocolViolation::RootAlreadyWritten => "Top-level value already written",
            ProtocolViolation::Incomplete => "Output is incomplete",
        })
    }
}

impl std::error::Error for ProtocolViolation {}

/// Error returned by [`Decoder`](crate::Decoder) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    Parse(ParseError),
    Protocol(ProtocolViolation),
}

impl DecodeError {
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            DecodeError::Parse(err) => Some(err),
            DecodeError::Protocol(_) => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Parse(err) => write!(f, "{err}"),
            DecodeError::Protocol(err) => write!(f, "decoder protocol violation: {err}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Parse(err) => Some(err),
            DecodeError::Protocol(err) => Some(err),
        }
    }
}

impl From<ParseError> for DecodeError {
    fn from(err: ParseError) -> Self {
        DecodeError::Parse(err)
    }
}

impl From<ProtocolViolation> for DecodeError {
    fn from(err: ProtocolViolation) -> Self {
        DecodeError::Protocol(err)
    }
}

/// Error returned by [`Encoder`](crate::Encoder) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    Protocol(ProtocolViolation),
    /// Big number text that is not a JSON number.
    InvalidNumber { text: String },
    /// Value nesting exceeded the document depth limit.
    TooDeep,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Protocol(err) => write!(f, "encoder protocol violation: {err}"),
            EncodeError::InvalidNumber { text } => write!(f, "'{text}' is not a valid number"),
            EncodeError::TooDeep => f.write_str("Value nesting too deep"),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<ProtocolViolation> for EncodeError {
    fn from(err: ProtocolViolation) -> Self {
        EncodeError::Protocol(err)
    }
}
