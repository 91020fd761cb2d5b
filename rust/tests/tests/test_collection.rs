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

use fory_xlang::{
    EnumDescriptor, EnumValue, FieldDescriptor, Fory, Record, ShapeKind, StructDescriptor,
    TypeId, Value,
};
use tests::test_roundtrip;

fn point_fory(compatible: bool) -> Fory {
    let mut fory = Fory::default().compatible(compatible);
    fory.register_enum(70, EnumDescriptor::new("demo", "Axis", &["X", "Y"]))
        .unwrap();
    fory.register_struct(
        71,
        StructDescriptor::new("demo", "Point")
            .field(FieldDescriptor::new("x", TypeId::INT32).default_value(0))
            .field(FieldDescriptor::new("y", TypeId::INT32).default_value(0)),
    )
    .unwrap();
    fory.register_struct(
        72,
        StructDescriptor::new("demo", "Shape")
            .field(
                FieldDescriptor::new("points", ShapeKind::list(ShapeKind::named("demo.Point")))
                    .nullable(true),
            )
            .field(
                FieldDescriptor::new("axes", ShapeKind::set(ShapeKind::named("demo.Axis")))
                    .nullable(true),
            )
            .field(
                FieldDescriptor::new(
                    "labels",
                    ShapeKind::map(TypeId::STRING.into(), ShapeKind::list(TypeId::INT64.into())),
                )
                .nullable(true),
            )
            .field(
                FieldDescriptor::new("maybe", ShapeKind::list(TypeId::STRING.into()))
                    .nullable(true),
            ),
    )
    .unwrap();
    fory
}

fn point(x: i32, y: i32) -> Value {
    Record::new("demo.Point").with("x", x).with("y", y).into_value()
}

#[test]
fn test_declared_element_types() {
    for compatible in [false, true] {
        let fory = point_fory(compatible);
        let shape = Record::new("demo.Shape")
            .with("points", Value::list(vec![point(1, 2), point(-3, 4)]))
            .with(
                "axes",
                Value::set(vec![
                    Value::Enum(EnumValue::new("demo.Axis", 0)),
                    Value::Enum(EnumValue::new("demo.Axis", 1)),
                ]),
            )
            .with(
                "labels",
                Value::map(vec![
                    ("a".into(), Value::list(vec![Value::Int64(1)])),
                    ("b".into(), Value::list(vec![])),
                ]),
            )
            .with(
                "maybe",
                Value::list(vec!["x".into(), Value::Null, "z".into()]),
            )
            .into_value();
        test_roundtrip(&fory, &shape);
    }
}

#[test]
fn test_empty_collections() {
    let fory = point_fory(false);
    let shape = Record::new("demo.Shape")
        .with("points", Value::list(vec![]))
        .with("axes", Value::set(vec![]))
        .with("labels", Value::map(vec![]))
        .into_value();
    test_roundtrip(&fory, &shape);
}

#[test]
fn test_dynamic_collections() {
    let fory = point_fory(false);
    let mixed = Value::list(vec![
        Value::Int32(1),
        Value::from("two"),
        Value::Null,
        point(3, 3),
        Value::map(vec![
            (Value::Int64(1), Value::Null),
            (Value::from("k"), Value::list(vec![Value::Bool(true)])),
        ]),
        Value::set(vec![Value::Float64(0.5)]),
    ]);
    test_roundtrip(&fory, &mixed);
}

#[test]
fn test_empty_list_layout() {
    let fory = Fory::default();
    let bytes = fory.serialize(&Value::list(vec![])).unwrap();
    // magic, bitmap, NotNullValue, LIST, length 0 and no element header
    assert_eq!(bytes.len(), 6);
    assert_eq!(bytes[5], 0);
}
