use super::*;

fn decoder(text: &str) -> JsonDecoder {
    JsonDecoder::from_str(text).unwrap()
}

#[test]
fn test_decode_object_members() {
    let mut root = decoder(r#"{"a": 1, "b": "two"}"#);
    let mut object = root.decode_object().unwrap();
    assert_eq!(object.decode_key().unwrap().as_deref(), Some("a"));
    assert_eq!(object.decode_int().unwrap(), 1);
    assert_eq!(object.decode_key().unwrap().as_deref(), Some("b"));
    assert_eq!(object.decode_string().unwrap(), "two");
    assert_eq!(object.decode_key().unwrap(), None);
    object.finish_structure().unwrap();
    assert!(root.is_at_end());
}

#[test]
fn test_decode_empty_array_is_positioned_at_end() {
    let mut root = decoder("[]");
    let mut array = root.decode_array().unwrap();
    assert!(!array.has_next_array_value().unwrap());
    array.finish_structure().unwrap();
}

#[test]
fn test_parent_unusable_while_child_open() {
    let mut root = decoder("[[1]]");
    let mut outer = root.decode_array().unwrap();
    let mut inner = outer.decode_array().unwrap();
    assert_eq!(
        outer.decode_int(),
        Err(DecodeError::Protocol(ProtocolViolation::UnfinishedChild))
    );
    assert_eq!(inner.decode_int().unwrap(), 1);
    inner.finish_structure().unwrap();
    assert_eq!(
        inner.decode_int(),
        Err(DecodeError::Protocol(ProtocolViolation::ChildCompleted))
    );
    outer.finish_structure().unwrap();
}

#[test]
fn test_finish_before_end_is_protocol_violation() {
    let mut root = decoder("[1, 2]");
    let mut array = root.decode_array().unwrap();
    array.decode_int().unwrap();
    assert_eq!(
        array.finish_structure(),
        Err(DecodeError::Protocol(ProtocolViolation::NotAllConsumed))
    );
    assert_eq!(
        root.finish_structure(),
        Err(DecodeError::Protocol(ProtocolViolation::UnfinishedChild))
    );
}

#[test]
fn test_value_before_key_is_protocol_violation() {
    let mut root = decoder(r#"{"a": 1}"#);
    let mut object = root.decode_object().unwrap();
    assert_eq!(
        object.decode_int(),
        Err(DecodeError::Protocol(ProtocolViolation::KeyNotConsumed))
    );
}

#[test]
fn test_wrong_token_is_parse_error() {
    let mut root = decoder(r#""text""#);
    let err = root.decode_object().err().unwrap();
    assert_eq!(
        err,
        DecodeError::Parse(ParseError::UnexpectedToken {
            expected: "object",
            found: TokenKind::String,
        })
    );
    assert_eq!(err.to_string(), "Unexpected token VALUE_STRING, expected object");
}

#[test]
fn test_decode_null_peeks_without_consuming() {
    let mut root = decoder("[null, 5]");
    let mut array = root.decode_array().unwrap();
    assert!(array.decode_null().unwrap());
    assert!(!array.decode_null().unwrap());
    assert_eq!(array.decode_long().unwrap(), 5);
    array.finish_structure().unwrap();
}

#[test]
fn test_scalar_coercions() {
    let mut root = decoder(r#"["42", 7, true, "2.5", 3.9, "x"]"#);
    let mut array = root.decode_array().unwrap();
    assert_eq!(array.decode_int().unwrap(), 42);
    assert_eq!(array.decode_string().unwrap(), "7");
    assert_eq!(array.decode_int().unwrap(), 1);
    assert_eq!(array.decode_double().unwrap(), 2.5);
    assert_eq!(array.decode_int().unwrap(), 3);
    assert_eq!(array.decode_char().unwrap(), 'x');
    array.finish_structure().unwrap();
}

#[test]
fn test_malformed_number_string() {
    let mut root = decoder(r#""twelve""#);
    assert_eq!(
        root.decode_int(),
        Err(DecodeError::Parse(ParseError::MalformedNumber {
            text: "twelve".into(),
            target: "int",
        }))
    );
}

#[test]
fn test_integer_range_is_checked() {
    let mut root = decoder("300");
    assert!(matches!(
        root.decode_byte(),
        Err(DecodeError::Parse(ParseError::NumberOutOfRange { target: "byte", .. }))
    ));
}

#[test]
fn test_big_numbers_keep_digits() {
    let mut root = decoder(r#"["+007", "-1.50e3", 12]"#);
    let mut array = root.decode_array().unwrap();
    assert_eq!(array.decode_big_integer().unwrap(), "7");
    assert_eq!(array.decode_big_decimal().unwrap(), "-1.50e3");
    assert_eq!(array.decode_big_integer().unwrap(), "12");
    array.finish_structure().unwrap();

    let mut root = decoder(r#""1x""#);
    assert!(matches!(
        root.decode_big_integer(),
        Err(DecodeError::Parse(ParseError::MalformedNumber { .. }))
    ));
}

#[test]
fn test_skip_value_skips_nested_structure() {
    let mut root = decoder(r#"{"skip": {"a": [1, {"b": 2}]}, "keep": 3}"#);
    let mut object = root.decode_object().unwrap();
    assert_eq!(object.decode_key().unwrap().as_deref(), Some("skip"));
    object.skip_value().unwrap();
    assert_eq!(object.decode_key().unwrap().as_deref(), Some("keep"));
    assert_eq!(object.decode_int().unwrap(), 3);
    assert_eq!(object.decode_key().unwrap(), None);
    object.finish_structure().unwrap();
}

#[test]
fn test_decode_arbitrary_sizes_numbers() {
    let mut root = decoder(r#"{"i": 1, "l": 10000000000, "b": 18446744073709551615, "d": 0.5, "s": "x", "n": null, "a": [true]}"#);
    let value = root.decode_arbitrary().unwrap();
    let Value::Map(entries) = value else { panic!("expected map") };
    assert_eq!(entries["i"], Value::Int(1));
    assert_eq!(entries["l"], Value::Long(10_000_000_000));
    assert_eq!(entries["b"], Value::BigInteger("18446744073709551615".into()));
    assert_eq!(entries["d"], Value::Double(0.5));
    assert_eq!(entries["s"], Value::String("x".into()));
    assert_eq!(entries["n"], Value::Null);
    assert_eq!(entries["a"], Value::List(vec![Value::Bool(true)]));
    assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["i", "l", "b", "d", "s", "n", "a"]);
}

#[test]
fn test_decode_arbitrary_with_big_number_config() {
    let config = DecoderConfig {
        use_big_decimal_for_floats: true,
        use_big_integer_for_ints: true,
    };
    let mut root = JsonDecoder::with_config("[1, 0.25]", config).unwrap();
    assert_eq!(
        root.decode_arbitrary().unwrap(),
        Value::List(vec![
            Value::BigInteger("1".into()),
            Value::BigDecimal("0.25".into())
        ])
    );
}

#[test]
fn test_big_number_literals_are_exact() {
    let mut root = decoder("[123456789012345678901234567890, 0.10000000000000000000001, -98765432109876543210.75]");
    let mut array = root.decode_array().unwrap();
    assert_eq!(array.decode_big_integer().unwrap(), "123456789012345678901234567890");
    assert_eq!(array.decode_big_decimal().unwrap(), "0.10000000000000000000001");
    assert_eq!(array.decode_big_integer().unwrap(), "-98765432109876543210");
    array.finish_structure().unwrap();

    let mut root = decoder("123456789012345678901234567890");
    assert!(matches!(
        root.decode_long(),
        Err(DecodeError::Parse(ParseError::NumberOutOfRange { target: "long", .. }))
    ));
}

#[test]
fn test_decode_arbitrary_keeps_big_literals() {
    let mut root = decoder("[123456789012345678901234567890, 0.10000000000000000000001]");
    assert_eq!(
        root.decode_arbitrary().unwrap(),
        Value::List(vec![
            Value::BigInteger("123456789012345678901234567890".into()),
            Value::Double(0.1),
        ])
    );

    let config = DecoderConfig {
        use_big_decimal_for_floats: true,
        use_big_integer_for_ints: false,
    };
    let mut root = JsonDecoder::with_config("0.10000000000000000000001", config).unwrap();
    assert_eq!(
        root.decode_arbitrary().unwrap(),
        Value::BigDecimal("0.10000000000000000000001".into())
    );
}
