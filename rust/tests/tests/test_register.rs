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
    EnumDescriptor, Error, FieldDescriptor, Fory, IdAssignment, Record, ShapeKind,
    StructDescriptor, TypeId, TypeNaming,
};
use fory_xlang_core::error::should_panic_on_error;
use fory_xlang_core::meta::{compute_fingerprint, compute_registered_type_id};
use tests::{test_roundtrip, user_descriptor};

#[test]
fn test_registered_type_ids() {
    assert_eq!(compute_registered_type_id("demo.User"), 89059757);
    assert_eq!(compute_registered_type_id("demo.PersonAlias"), 501439402);
}

#[test]
fn test_register_auto() {
    let mut fory = Fory::default();
    let assignment = fory.register_struct_auto(user_descriptor()).unwrap();
    assert_eq!(
        assignment,
        IdAssignment::Generated {
            id: 89059757,
            source: "demo.User".to_string()
        }
    );
    let alias = StructDescriptor::from_naming(TypeNaming::new("demo", "Person").alias("PersonAlias"))
        .field(FieldDescriptor::new("id", TypeId::INT32));
    assert_eq!(
        fory.register_struct_auto(alias).unwrap().type_id(),
        Some(501439402)
    );
    let explicit = StructDescriptor::from_naming(TypeNaming::new("demo", "Fixed").id(77));
    assert_eq!(
        fory.register_struct_auto(explicit).unwrap(),
        IdAssignment::Explicit(77)
    );
    let user = Record::new("demo.User").with("age", 20).into_value();
    test_roundtrip(&fory, &user);
}

#[test]
fn test_generated_id_collision_falls_back_to_name() {
    let mut fory = Fory::default();
    fory.register_struct(
        89059757,
        StructDescriptor::new("other", "Taken").field(FieldDescriptor::new("x", TypeId::INT8)),
    )
    .unwrap();
    let assignment = fory.register_struct_auto(user_descriptor()).unwrap();
    assert_eq!(assignment, IdAssignment::ByName);
    let meta = fory.get_type_resolver().get_struct("demo.User").unwrap();
    assert_eq!(meta.user_type_id, None);
    test_roundtrip(&fory, &Record::new("demo.User").with("age", 3).into_value());
}

#[test]
fn test_enum_auto_id() {
    let mut fory = Fory::default();
    let assignment = fory
        .register_enum_auto(EnumDescriptor::new("demo", "Color", &["Red", "Green"]))
        .unwrap();
    assert!(assignment.is_generated());
}

#[test]
fn test_user_version_hash() {
    let mut fory = Fory::default();
    fory.register_struct(1, user_descriptor()).unwrap();
    let meta = fory.get_type_resolver().get_struct("demo.User").unwrap();
    assert_eq!(compute_fingerprint(&meta.fields), "age,4,0,0;name,21,0,1;");
    assert_eq!(meta.version_hash, 1942837588);
}

#[test]
fn test_version_mismatch_in_strict_mode() {
    if should_panic_on_error() {
        return;
    }
    let mut writer = Fory::default();
    writer.register_struct(1, user_descriptor()).unwrap();
    let mut reader = Fory::default();
    reader
        .register_struct(
            1,
            StructDescriptor::new("demo", "User")
                .field(FieldDescriptor::new("name", TypeId::STRING).nullable(true))
                .field(FieldDescriptor::new("age", TypeId::INT64)),
        )
        .unwrap();
    let bytes = writer
        .serialize(&Record::new("demo.User").with("age", 1).into_value())
        .unwrap();
    assert!(matches!(
        reader.deserialize(&bytes),
        Err(Error::StructVersionMismatch(_))
    ));
}

#[test]
fn test_invalid_registrations() {
    if should_panic_on_error() {
        return;
    }
    let mut fory = Fory::default();
    fory.register_struct(1, user_descriptor()).unwrap();
    // same name twice
    assert!(fory.register_struct(2, user_descriptor()).is_err());
    // same id twice
    assert!(fory
        .register_struct(1, StructDescriptor::new("demo", "Other"))
        .is_err());
    // negative tag
    assert!(fory
        .register_struct(
            3,
            StructDescriptor::new("demo", "Neg").field(FieldDescriptor::new("x", TypeId::INT32).tag(-1)),
        )
        .is_err());
    // duplicate tags
    assert!(fory
        .register_struct(
            4,
            StructDescriptor::new("demo", "Dup")
                .field(FieldDescriptor::new("x", TypeId::INT32).tag(1))
                .field(FieldDescriptor::new("y", TypeId::INT32).tag(1)),
        )
        .is_err());
    // unknown parent
    assert!(fory
        .register_struct(5, StructDescriptor::new("demo", "Orphan").extends("demo.Missing"))
        .is_err());
    // enum without members
    assert!(fory
        .register_enum(6, EnumDescriptor::new("demo", "Empty", &[]))
        .is_err());
    // failed registrations release their ids
    fory.register_struct(3, StructDescriptor::new("demo", "Neg"))
        .unwrap();
    assert!(fory.get_type_resolver().get_struct("demo.Dup").is_none());
}

#[test]
fn test_switching_mode_rebuilds_registered_types() {
    let mut fory = Fory::default();
    fory.register_struct(1, user_descriptor()).unwrap();
    assert!(fory.get_type_resolver().get_struct("demo.User").unwrap().type_def.is_none());
    let fory = fory.compatible(true);
    let meta = fory.get_type_resolver().get_struct("demo.User").unwrap();
    assert!(meta.is_compatible());
    test_roundtrip(&fory, &Record::new("demo.User").with("age", 8).into_value());
}

#[test]
fn test_mode_switch_that_invalidates_types() {
    if should_panic_on_error() {
        return;
    }
    let mut fory = Fory::default();
    fory.register_struct(
        1,
        StructDescriptor::new("demo", "Bare").field(FieldDescriptor::new(
            "items",
            ShapeKind::list(TypeId::INT32.into()),
        )),
    )
    .unwrap();
    let fory = fory.compatible(true);
    let err = fory
        .serialize(&Record::new("demo.Bare").into_value())
        .unwrap_err();
    assert!(matches!(err, Error::NotAllowed(_)));
}
