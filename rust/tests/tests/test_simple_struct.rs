// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use chrono::{NaiveDate, NaiveDateTime};
use fory_xlang::{
    EnumDescriptor, EnumValue, FieldDescriptor, Fory, Record, ShapeKind, StructDescriptor,
    TypeId, Value,
};
use tests::{init_logging, test_roundtrip, user_descriptor};

fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_micro_opt(10, 20, 30, 123_456)
        .unwrap()
}

fn order_fory() -> Fory {
    let mut fory = Fory::default();
    fory.register_enum(
        10,
        EnumDescriptor::new("demo", "Status", &["Pending", "Shipped", "Delivered"]),
    )
    .unwrap();
    fory.register_struct(11, user_descriptor()).unwrap();
    fory.register_struct(
        12,
        StructDescriptor::new("demo", "Order")
            .field(FieldDescriptor::new("id", TypeId::INT64))
            .field(FieldDescriptor::new("buyer", ShapeKind::named("demo.User")))
            .field(FieldDescriptor::new("status", ShapeKind::named("demo.Status")))
            .field(FieldDescriptor::new("total", TypeId::FLOAT64))
            .field(FieldDescriptor::new("quantity", TypeId::UINT16))
            .field(FieldDescriptor::new("created", TypeId::TIMESTAMP))
            .field(FieldDescriptor::new("due", TypeId::DATE).nullable(true))
            .field(FieldDescriptor::new("ttl", TypeId::DURATION))
            .field(FieldDescriptor::new("note", TypeId::STRING).nullable(true))
            .field(FieldDescriptor::new("payload", TypeId::BINARY))
            .field(FieldDescriptor::new(
                "tags",
                ShapeKind::list(TypeId::STRING.into()),
            ))
            .field(FieldDescriptor::new(
                "flags",
                ShapeKind::set(TypeId::INT32.into()),
            ))
            .field(FieldDescriptor::new(
                "attrs",
                ShapeKind::map(TypeId::STRING.into(), TypeId::INT64.into()),
            )),
    )
    .unwrap();
    fory
}

fn order_value() -> Value {
    let buyer = Record::new("demo.User")
        .with("name", "alice")
        .with("age", 31)
        .into_value();
    Record::new("demo.Order")
        .with("id", 9_000_000_001i64)
        .with("buyer", buyer)
        .with("status", Value::Enum(EnumValue::new("demo.Status", 1)))
        .with("total", 99.5f64)
        .with("quantity", 3u16)
        .with("created", Value::Timestamp(timestamp()))
        .with(
            "due",
            Value::Date(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()),
        )
        .with(
            "ttl",
            Value::Duration(chrono::Duration::seconds(90) + chrono::Duration::milliseconds(250)),
        )
        .with("payload", Value::binary(&[1, 2, 3, 255]))
        .with(
            "tags",
            Value::list(vec!["fragile".into(), "gift".into()]),
        )
        .with("flags", Value::set(vec![Value::Int32(1), Value::Int32(-7)]))
        .with(
            "attrs",
            Value::map(vec![
                ("weight".into(), Value::Int64(1200)),
                ("volume".into(), Value::Int64(-3)),
            ]),
        )
        .into_value()
}

#[test]
fn test_struct_roundtrip() {
    init_logging();
    let fory = order_fory();
    test_roundtrip(&fory, &order_value());
}

#[test]
fn test_serialize_is_deterministic() {
    let first = order_fory().serialize(&order_value()).unwrap();
    let second = order_fory().serialize(&order_value()).unwrap();
    let fory = order_fory();
    assert_eq!(first, second);
    assert_eq!(fory.serialize(&order_value()).unwrap(), first);
    assert_eq!(fory.serialize(&order_value()).unwrap(), first);
}

#[test]
fn test_declaration_order_does_not_change_layout() {
    let fields = [
        FieldDescriptor::new("count", TypeId::INT32),
        FieldDescriptor::new("name", TypeId::STRING),
        FieldDescriptor::new("big", TypeId::INT64),
        FieldDescriptor::new("maybe", TypeId::INT64).nullable(true),
        FieldDescriptor::new("ratio", TypeId::FLOAT32),
    ];
    let mut forward = Fory::default();
    let desc = fields
        .iter()
        .cloned()
        .fold(StructDescriptor::new("demo", "Mixed"), |d, f| d.field(f));
    forward.register_struct(20, desc).unwrap();
    let mut backward = Fory::default();
    let desc = fields
        .iter()
        .rev()
        .cloned()
        .fold(StructDescriptor::new("demo", "Mixed"), |d, f| d.field(f));
    backward.register_struct(20, desc).unwrap();

    let value = Record::new("demo.Mixed")
        .with("count", 5)
        .with("name", "x")
        .with("big", 1i64 << 40)
        .with("maybe", 7i64)
        .with("ratio", 0.5f32)
        .into_value();
    let bytes = forward.serialize(&value).unwrap();
    assert_eq!(backward.serialize(&value).unwrap(), bytes);
    assert_eq!(backward.deserialize(&bytes).unwrap(), value);
}

#[test]
fn test_nullable_field_absent() {
    let fory = order_fory();
    let user = Record::new("demo.User").with("age", 1).into_value();
    let bytes = test_roundtrip(&fory, &user);
    let decoded = fory.deserialize(&bytes).unwrap();
    assert!(!decoded.as_record().unwrap().borrow().contains("name"));
}

#[test]
fn test_missing_non_nullable_field() {
    if fory_xlang_core::error::should_panic_on_error() {
        return;
    }
    let fory = order_fory();
    let user = Record::new("demo.User").with("name", "bob").into_value();
    assert!(fory.serialize(&user).is_err());
}

#[test]
fn test_inherited_fields() {
    let mut fory = Fory::default();
    fory.register_struct(
        30,
        StructDescriptor::new("demo", "Base")
            .field(FieldDescriptor::new("id", TypeId::INT32))
            .field(FieldDescriptor::new("name", TypeId::STRING)),
    )
    .unwrap();
    fory.register_struct(
        31,
        StructDescriptor::new("demo", "Derived")
            .extends("demo.Base")
            .field(FieldDescriptor::new("id", TypeId::INT64))
            .field(FieldDescriptor::new("extra", TypeId::BOOL)),
    )
    .unwrap();
    let meta = fory.get_type_resolver().get_struct("demo.Derived").unwrap();
    let mut names: Vec<_> = meta.fields.iter().map(|f| f.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["extra", "id", "name"]);
    let id = meta.fields.iter().find(|f| f.name == "id").unwrap();
    assert_eq!(id.type_id, TypeId::INT64 as u32);
    assert_eq!(id.declaring_type, "demo.Derived");

    let value = Record::new("demo.Derived")
        .with("id", 5i64)
        .with("name", "n")
        .with("extra", true)
        .into_value();
    test_roundtrip(&fory, &value);
}

#[test]
fn test_redeclared_field_across_three_levels() {
    let mut fory = Fory::default();
    fory.register_struct(
        32,
        StructDescriptor::new("demo", "Root")
            .field(FieldDescriptor::new("id", TypeId::INT32))
            .field(FieldDescriptor::new("created", TypeId::INT64)),
    )
    .unwrap();
    fory.register_struct(
        33,
        StructDescriptor::new("demo", "Middle")
            .extends("demo.Root")
            .field(FieldDescriptor::new("id", TypeId::INT16)),
    )
    .unwrap();
    fory.register_struct(
        34,
        StructDescriptor::new("demo", "Leaf")
            .extends("demo.Middle")
            .field(FieldDescriptor::new("id", TypeId::INT64)),
    )
    .unwrap();
    let meta = fory.get_type_resolver().get_struct("demo.Leaf").unwrap();
    let ids: Vec<_> = meta
        .fields
        .iter()
        .filter(|f| f.name == "id")
        .map(|f| (f.type_id, f.declaring_type.as_str()))
        .collect();
    assert_eq!(ids, [(TypeId::INT64 as u32, "demo.Leaf")]);
    assert_eq!(meta.fields.len(), 2);

    let value = Record::new("demo.Leaf")
        .with("id", 9i64)
        .with("created", 1i64)
        .into_value();
    test_roundtrip(&fory, &value);
}

#[test]
fn test_integer_coercion_and_overflow() {
    let mut fory = Fory::default();
    fory.register_struct(
        40,
        StructDescriptor::new("demo", "Small").field(FieldDescriptor::new("v", TypeId::INT8)),
    )
    .unwrap();
    let bytes = fory
        .serialize(&Record::new("demo.Small").with("v", 5).into_value())
        .unwrap();
    let decoded = fory.deserialize(&bytes).unwrap();
    assert_eq!(
        decoded.as_record().unwrap().borrow().get("v"),
        Some(&Value::Int8(5))
    );
    if fory_xlang_core::error::should_panic_on_error() {
        return;
    }
    let err = fory
        .serialize(&Record::new("demo.Small").with("v", 300).into_value())
        .unwrap_err();
    assert!(matches!(err, fory_xlang::Error::Overflow(_)));
}

#[test]
fn test_root_scalars() {
    let fory = Fory::default();
    for value in [
        Value::Bool(false),
        Value::Int8(-8),
        Value::Int16(300),
        Value::Int32(i32::MIN),
        Value::Int64(i64::MAX),
        Value::UInt8(200),
        Value::UInt32(u32::MAX),
        Value::UInt64(u64::MAX),
        Value::Float32(1.25),
        Value::Float64(-0.5),
        Value::String("héllo".to_string()),
        Value::Date(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()),
        Value::Timestamp(timestamp()),
        Value::Duration(chrono::Duration::seconds(-5) + chrono::Duration::nanoseconds(7)),
    ] {
        test_roundtrip(&fory, &value);
    }
}
