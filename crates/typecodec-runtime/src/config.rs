//! Decoder configuration.

use serde::{Deserialize, Serialize};

/// Number handling for untyped (`decode_arbitrary`) decoding.
///
/// Typed decoding is unaffected: a `long` property always decodes as a
/// long.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecoderConfig {
    /// Decode every floating point number as `BigDecimal`, keeping the
    /// literal digits instead of rounding to a double.
    pub use_big_decimal_for_floats: bool,
    /// Decode every integer as `BigInteger`, regardless of its size.
    pub use_big_integer_for_ints: bool,
}
