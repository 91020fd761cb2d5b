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
    EnumDescriptor, EnumValue, Error, FieldDescriptor, Fory, Record, ShapeKind,
    StructDescriptor, TypeId, Value,
};
use fory_xlang_core::error::should_panic_on_error;
use tests::{init_logging, test_roundtrip, user_descriptor};

fn item_v3() -> StructDescriptor {
    StructDescriptor::new("demo", "Item")
        .field(FieldDescriptor::new("id", TypeId::INT64).default_value(0i64))
        .field(FieldDescriptor::new("name", TypeId::STRING).nullable(true))
        .field(FieldDescriptor::new("price", TypeId::FLOAT64).default_value(0.0))
}

fn item_v4() -> StructDescriptor {
    item_v3().field(FieldDescriptor::new("stock", TypeId::INT32).default_value(5))
}

fn compatible_fory(desc: StructDescriptor) -> Fory {
    let mut fory = Fory::default().compatible(true);
    fory.register_struct_by_name(desc).unwrap();
    fory
}

#[test]
fn test_compatible_roundtrip() {
    init_logging();
    let fory = compatible_fory(user_descriptor());
    let user = Record::new("demo.User")
        .with("name", "carol")
        .with("age", 44)
        .into_value();
    test_roundtrip(&fory, &user);
}

#[test]
fn test_older_writer_newer_reader() {
    let writer = compatible_fory(item_v3());
    let reader = compatible_fory(item_v4());
    let item = Record::new("demo.Item")
        .with("id", 1i64)
        .with("name", "lamp")
        .with("price", 12.5)
        .into_value();
    let bytes = writer.serialize(&item).unwrap();
    let decoded = reader.deserialize(&bytes).unwrap();
    let record = decoded.as_record().unwrap().borrow();
    assert_eq!(record.get("id"), Some(&Value::Int64(1)));
    assert_eq!(record.get("name"), Some(&Value::from("lamp")));
    assert_eq!(record.get("price"), Some(&Value::Float64(12.5)));
    assert_eq!(record.get("stock"), Some(&Value::Int32(5)));
}

#[test]
fn test_newer_writer_older_reader() {
    let writer = compatible_fory(item_v4());
    let reader = compatible_fory(item_v3());
    let item = Record::new("demo.Item")
        .with("id", 2i64)
        .with("price", 3.0)
        .with("stock", 17)
        .into_value();
    let bytes = writer.serialize(&item).unwrap();
    let decoded = reader.deserialize(&bytes).unwrap();
    let expected = Record::new("demo.Item")
        .with("id", 2i64)
        .with("price", 3.0)
        .into_value();
    assert_eq!(decoded, expected);
}

#[test]
fn test_null_for_non_nullable_field_takes_default() {
    let writer = compatible_fory(
        StructDescriptor::new("demo", "Person")
            .field(FieldDescriptor::new("age", TypeId::INT32).nullable(true)),
    );
    let reader = compatible_fory(
        StructDescriptor::new("demo", "Person")
            .field(FieldDescriptor::new("age", TypeId::INT32).default_value(7)),
    );
    let bytes = writer
        .serialize(&Record::new("demo.Person").into_value())
        .unwrap();
    let decoded = reader.deserialize(&bytes).unwrap();
    assert_eq!(
        decoded.as_record().unwrap().borrow().get("age"),
        Some(&Value::Int32(7))
    );
    // the reader can write back what it decoded
    let again = reader.serialize(&decoded).unwrap();
    assert_eq!(reader.deserialize(&again).unwrap(), decoded);

    let sent = writer
        .serialize(&Record::new("demo.Person").with("age", 30).into_value())
        .unwrap();
    assert_eq!(
        reader.deserialize(&sent).unwrap(),
        Record::new("demo.Person").with("age", 30).into_value()
    );
}

#[test]
fn test_missing_enum_field_takes_first_member() {
    let status = || EnumDescriptor::new("demo", "Level", &["Low", "High"]);
    let writer = compatible_fory(item_v3());
    let mut reader = Fory::default().compatible(true);
    reader.register_enum_by_name(status()).unwrap();
    reader
        .register_struct_by_name(
            item_v3().field(FieldDescriptor::new("level", ShapeKind::named("demo.Level"))),
        )
        .unwrap();
    let bytes = writer
        .serialize(&Record::new("demo.Item").with("id", 3i64).with("price", 1.0).into_value())
        .unwrap();
    let decoded = reader.deserialize(&bytes).unwrap();
    assert_eq!(
        decoded.as_record().unwrap().borrow().get("level"),
        Some(&Value::Enum(EnumValue::new("demo.Level", 0)))
    );
}

#[test]
fn test_tagged_fields_match_by_tag() {
    let writer = compatible_fory(
        StructDescriptor::new("demo", "Tagged")
            .field(FieldDescriptor::new("age", TypeId::INT32).tag(1).default_value(0))
            .field(FieldDescriptor::new("name", TypeId::STRING).tag(2).nullable(true)),
    );
    let reader = compatible_fory(
        StructDescriptor::new("demo", "Tagged")
            .field(FieldDescriptor::new("years", TypeId::INT32).tag(1).default_value(0))
            .field(FieldDescriptor::new("label", TypeId::STRING).tag(2).nullable(true)),
    );
    let bytes = writer
        .serialize(
            &Record::new("demo.Tagged")
                .with("age", 30)
                .with("name", "dora")
                .into_value(),
        )
        .unwrap();
    let expected = Record::new("demo.Tagged")
        .with("years", 30)
        .with("label", "dora")
        .into_value();
    assert_eq!(reader.deserialize(&bytes).unwrap(), expected);
}

#[test]
fn test_type_def_written_once_per_call() {
    let fory = compatible_fory(user_descriptor());
    let type_def = fory
        .get_type_resolver()
        .get_struct("demo.User")
        .unwrap()
        .type_def
        .clone()
        .unwrap();
    let users: Vec<Value> = (0..3)
        .map(|i| {
            Record::new("demo.User")
                .with("name", format!("user{i}"))
                .with("age", i)
                .into_value()
        })
        .collect();
    let list = Value::list(users);
    let bytes = test_roundtrip(&fory, &list);
    let occurrences = bytes
        .windows(type_def.len())
        .filter(|w| *w == type_def.as_slice())
        .count();
    assert_eq!(occurrences, 1);
    // a second call shares the definition again
    let again = fory.serialize(&list).unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn test_unknown_type_def_decodes_as_generic_record() {
    let writer = compatible_fory(user_descriptor());
    let lenient = Fory::default()
        .compatible(true)
        .require_type_registration(false);
    let user = Record::new("demo.User")
        .with("name", "erin")
        .with("age", 52)
        .into_value();
    let bytes = writer.serialize(&user).unwrap();
    assert_eq!(lenient.deserialize(&bytes).unwrap(), user);

    if should_panic_on_error() {
        return;
    }
    let strict_reader = Fory::default().compatible(true);
    assert!(strict_reader.deserialize(&bytes).is_err());
}

#[test]
fn test_unregistered_record_in_lenient_mode() {
    let fory = Fory::default()
        .compatible(true)
        .require_type_registration(false);
    let value = Value::list(vec![
        Record::new("demo.Adhoc")
            .with("a", 1)
            .with("b", "x")
            .into_value(),
        Record::new("demo.Adhoc")
            .with("a", 2)
            .with("b", "y")
            .into_value(),
    ]);
    test_roundtrip(&fory, &value);

    if should_panic_on_error() {
        return;
    }
    let inconsistent = Value::list(vec![
        Record::new("demo.Adhoc").with("a", 1).into_value(),
        Record::new("demo.Adhoc").with("b", 2).into_value(),
    ]);
    assert!(matches!(
        fory.serialize(&inconsistent),
        Err(Error::NotAllowed(_))
    ));
}

#[test]
fn test_unregistered_record_is_rejected() {
    if should_panic_on_error() {
        return;
    }
    for fory in [Fory::default(), Fory::default().compatible(true)] {
        let err = fory
            .serialize(&Record::new("demo.Nobody").with("a", 1).into_value())
            .unwrap_err();
        assert!(matches!(err, Error::TypeUnregistered(_)));
    }
}

#[test]
fn test_non_nullable_field_needs_default() {
    if should_panic_on_error() {
        return;
    }
    let mut fory = Fory::default().compatible(true);
    let err = fory
        .register_struct_by_name(
            StructDescriptor::new("demo", "Bare").field(FieldDescriptor::new("n", TypeId::INT32)),
        )
        .unwrap_err();
    assert!(err.to_string().contains("neither nullable nor has a default"));
    // the failed registration leaves no trace
    assert!(fory.get_type_resolver().get_struct("demo.Bare").is_none());
}

#[test]
fn test_strict_payload_rejected_by_compatible_reader() {
    if should_panic_on_error() {
        return;
    }
    let mut writer = Fory::default();
    writer.register_struct(7, user_descriptor()).unwrap();
    let mut reader = Fory::default().compatible(true);
    reader.register_struct(7, user_descriptor()).unwrap();
    let bytes = writer
        .serialize(&Record::new("demo.User").with("age", 1).into_value())
        .unwrap();
    assert!(matches!(
        reader.deserialize(&bytes),
        Err(Error::TypeError(_))
    ));
}
