//! Container bookkeeping: frame kinds, element accounting, depth limits,
//! close-time termination.

mod common;

use cborgen::{CborEncoder, EncoderFeatures, ErrorCode, ErrorKind, WriteLimits};
use common::Value;

#[test]
fn sized_array_accepts_exact_count() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_array_sized(3).unwrap();
    for i in 0..3 {
        enc.write_i32(i).unwrap();
    }
    enc.write_end_array().unwrap();
    let bytes = enc.into_sink().unwrap();
    assert_eq!(bytes, [0x83, 0x00, 0x01, 0x02]);
}

#[test]
fn sized_array_underflow_fails_on_end() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_array_sized(3).unwrap();
    enc.write_i32(0).unwrap();
    enc.write_i32(1).unwrap();
    let err = enc.write_end_array().unwrap_err();
    assert_eq!(err.code(), ErrorCode::ContainerUnderflow(1));
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
}

#[test]
fn sized_array_overrun_fails_on_extra_element() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_array_sized(1).unwrap();
    enc.write_i32(0).unwrap();
    let err = enc.write_i32(1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ContainerOverrun);
}

#[test]
fn sized_object_counts_names_and_values() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_object_sized(2).unwrap();
    enc.write_field_name("a").unwrap();
    enc.write_i32(1).unwrap();
    enc.write_field_name("b").unwrap();
    enc.write_i32(2).unwrap();
    enc.write_end_object().unwrap();
    let bytes = enc.into_sink().unwrap();
    assert_eq!(
        common::decode(&bytes),
        Value::Map(vec![
            (Value::text("a"), Value::UInt(1)),
            (Value::text("b"), Value::UInt(2)),
        ])
    );
}

#[test]
fn sized_object_extra_entry_overruns() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_object_sized(1).unwrap();
    enc.write_field_name("a").unwrap();
    enc.write_i32(1).unwrap();
    let err = enc.write_field_name("b").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ContainerOverrun);
}

#[test]
fn value_in_name_position_fails() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_object().unwrap();
    let err = enc.write_i32(1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExpectingFieldName);
    assert_eq!(err.kind(), ErrorKind::Context);
}

#[test]
fn name_in_value_position_fails() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_object().unwrap();
    enc.write_field_name("a").unwrap();
    let err = enc.write_field_name("b").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExpectingValue);
}

#[test]
fn field_name_outside_object_fails() {
    let mut enc = CborEncoder::new(Vec::new());
    let err = enc.write_field_name("a").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExpectingValue);

    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_array().unwrap();
    let err = enc.write_field_name("a").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExpectingValue);
}

#[test]
fn end_kind_mismatch_fails() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_array().unwrap();
    let err = enc.write_end_object().unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotInObject);

    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_object().unwrap();
    let err = enc.write_end_array().unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotInArray);
}

#[test]
fn root_frame_cannot_be_closed() {
    let mut enc = CborEncoder::new(Vec::new());
    let err = enc.write_end_array().unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotInArray);
}

#[test]
fn deep_nesting_hits_depth_limit() {
    let limits = WriteLimits::with_max_depth(4);
    let mut enc = CborEncoder::with_options(
        Vec::new(),
        EncoderFeatures::default_set(),
        limits,
        cborgen::DEFAULT_BUFFER_LENGTH,
    )
    .unwrap();
    for _ in 0..4 {
        enc.write_start_array().unwrap();
    }
    let err = enc.write_start_array().unwrap_err();
    assert_eq!(err.code(), ErrorCode::DepthLimitExceeded);
    assert_eq!(err.kind(), ErrorKind::Constraint);
}

#[test]
fn nested_mixed_structure_decodes() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_object_sized(2).unwrap();
    enc.write_field_name("list").unwrap();
    enc.write_start_array_sized(2).unwrap();
    enc.write_i32(1).unwrap();
    enc.write_start_object().unwrap();
    enc.write_field_name("x").unwrap();
    enc.write_null().unwrap();
    enc.write_end_object().unwrap();
    enc.write_end_array().unwrap();
    enc.write_field_name("flag").unwrap();
    enc.write_bool(false).unwrap();
    enc.write_end_object().unwrap();
    let bytes = enc.into_sink().unwrap();
    assert_eq!(
        common::decode(&bytes),
        Value::Map(vec![
            (
                Value::text("list"),
                Value::Array(vec![
                    Value::UInt(1),
                    Value::Map(vec![(Value::text("x"), Value::Null)]),
                ])
            ),
            (Value::text("flag"), Value::Bool(false)),
        ])
    );
}

#[test]
fn close_terminates_open_indefinite_containers() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_array().unwrap();
    enc.write_start_object().unwrap();
    enc.write_field_name("a").unwrap();
    enc.write_start_array().unwrap();
    enc.write_i32(1).unwrap();
    let bytes = enc.into_sink().unwrap();
    assert_eq!(
        common::decode(&bytes),
        Value::Array(vec![Value::Map(vec![(
            Value::text("a"),
            Value::Array(vec![Value::UInt(1)])
        )])])
    );
}

#[test]
fn close_without_auto_close_leaves_content_open() {
    let features = EncoderFeatures::default_set() - EncoderFeatures::AUTO_CLOSE_CONTENT;
    let mut enc = CborEncoder::with_features(Vec::new(), features);
    enc.write_start_array().unwrap();
    enc.write_i32(1).unwrap();
    let bytes = enc.into_sink().unwrap();
    // no break byte at the end
    assert_eq!(bytes, [0x9f, 0x01]);
}

#[test]
fn close_propagates_sized_underflow() {
    let mut enc = CborEncoder::new(Vec::new());
    enc.write_start_array_sized(2).unwrap();
    enc.write_i32(1).unwrap();
    let err = enc.close().unwrap_err();
    assert_eq!(err.code(), ErrorCode::ContainerUnderflow(1));
    // buffer was released regardless; further closes are no-ops
    enc.close().unwrap();
}

#[test]
fn oversized_map_length_overflows() {
    let mut enc = CborEncoder::new(Vec::new());
    let err = enc.write_start_object_sized(u64::MAX).unwrap_err();
    assert_eq!(err.code(), ErrorCode::LengthOverflow);
    assert_eq!(err.kind(), ErrorKind::Argument);
}
