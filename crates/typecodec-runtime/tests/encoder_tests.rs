use super::*;
use crate::value::BeanValue;

#[test]
fn test_encode_object_preserves_key_order() {
    let mut root = JsonEncoder::new();
    let mut object = root.encode_object().unwrap();
    object.encode_key("b").unwrap();
    object.encode_int(2).unwrap();
    object.encode_key("a").unwrap();
    object.encode_int(1).unwrap();
    object.finish_structure().unwrap();
    assert_eq!(root.into_string().unwrap(), r#"{"b":2,"a":1}"#);
}

#[test]
fn test_encode_nested_array() {
    let mut root = JsonEncoder::new();
    let mut outer = root.encode_array().unwrap();
    let mut inner = outer.encode_array().unwrap();
    inner.encode_string("x").unwrap();
    inner.finish_structure().unwrap();
    outer.encode_null().unwrap();
    outer.finish_structure().unwrap();
    assert_eq!(root.into_string().unwrap(), r#"[["x"],null]"#);
}

#[test]
fn test_parent_unusable_while_child_open() {
    let mut root = JsonEncoder::new();
    let mut array = root.encode_array().unwrap();
    let _child = array.encode_object().unwrap();
    assert_eq!(
        array.encode_int(1),
        Err(EncodeError::Protocol(ProtocolViolation::UnfinishedChild))
    );
}

#[test]
fn test_object_value_requires_key() {
    let mut root = JsonEncoder::new();
    let mut object = root.encode_object().unwrap();
    assert_eq!(
        object.encode_int(1),
        Err(EncodeError::Protocol(ProtocolViolation::MissingKey))
    );
    assert_eq!(
        root.encode_key("x"),
        Err(EncodeError::Protocol(ProtocolViolation::UnfinishedChild))
    );
    object.encode_key("x").unwrap();
    assert_eq!(
        object.encode_key("y"),
        Err(EncodeError::Protocol(ProtocolViolation::UnexpectedKey))
    );
}

#[test]
fn test_root_finish_and_incomplete_output() {
    let mut root = JsonEncoder::new();
    assert_eq!(
        root.finish_structure(),
        Err(EncodeError::Protocol(ProtocolViolation::NotInStructure))
    );
    assert_eq!(
        root.into_value(),
        Err(EncodeError::Protocol(ProtocolViolation::Incomplete))
    );

    let mut root = JsonEncoder::new();
    let _array = root.encode_array().unwrap();
    assert_eq!(
        root.into_value(),
        Err(EncodeError::Protocol(ProtocolViolation::Incomplete))
    );
}

#[test]
fn test_encode_numbers() {
    let mut root = JsonEncoder::new();
    let mut array = root.encode_array().unwrap();
    array.encode_big_integer("123").unwrap();
    array.encode_big_decimal("0.5").unwrap();
    array.encode_double(f64::NAN).unwrap();
    array.encode_char('q').unwrap();
    assert_eq!(
        array.encode_big_integer("12a"),
        Err(EncodeError::InvalidNumber { text: "12a".into() })
    );
    array.finish_structure().unwrap();
    assert_eq!(root.into_string().unwrap(), r#"[123,0.5,"NaN","q"]"#);
}

#[test]
fn test_encode_arbitrary_bean() {
    let bean = BeanValue::new("com.example.Point")
        .with("x", 1)
        .with("tags", Value::List(vec!["a".into()]))
        .with("color", Value::enum_constant("com.example.Color", "RED"));
    let mut root = JsonEncoder::new();
    root.encode_arbitrary(&Value::Bean(bean)).unwrap();
    assert_eq!(
        root.into_string().unwrap(),
        r#"{"x":1,"tags":["a"],"color":"RED"}"#
    );
}

#[test]
fn test_big_numbers_are_written_verbatim() {
    let mut root = JsonEncoder::new();
    let mut array = root.encode_array().unwrap();
    array.encode_big_integer("123456789012345678901234567890").unwrap();
    array.encode_big_decimal("-0.10000000000000000000001").unwrap();
    array
        .encode_arbitrary(&Value::BigInteger("98765432109876543210".into()))
        .unwrap();
    array.finish_structure().unwrap();
    assert_eq!(
        root.into_string().unwrap(),
        "[123456789012345678901234567890,-0.10000000000000000000001,98765432109876543210]"
    );
}
