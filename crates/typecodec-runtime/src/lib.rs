//! Runtime side of generated codecs.
//!
//! Plans produced by `typecodec-gen` talk to JSON only through two
//! push-down protocols:
//!
//! | Trait | JSON implementation | Produces / consumes |
//! |-------|---------------------|---------------------|
//! | [`Decoder`] | [`JsonDecoder`] | token stream from JSON text |
//! | [`Encoder`] | [`JsonEncoder`] | `serde_json::Value` tree |
//!
//! Both hand out child handles for nested arrays and objects. Only the most
//! recently opened child may be used until it is finished; breaking that
//! rule is a [`ProtocolViolation`], never a [`ParseError`].
//!
//! Decoded data that is not bound to a generated type is represented by the
//! dynamic [`Value`] model.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod token;
pub mod value;

pub use config::DecoderConfig;
pub use decoder::{Decoder, JsonDecoder};
pub use encoder::{Encoder, JsonEncoder};
pub use error::{DecodeError, EncodeError, ParseError, ProtocolViolation};
pub use token::{Token, TokenKind, tokenize};
pub use value::{BeanValue, Value};
