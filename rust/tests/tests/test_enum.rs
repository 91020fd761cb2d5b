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

use fory_xlang::{EnumDescriptor, EnumValue, Error, Fory, Value};
use fory_xlang_core::error::should_panic_on_error;
use tests::test_roundtrip;

fn color() -> EnumDescriptor {
    EnumDescriptor::new("demo", "Color", &["Red", "Green", "Blue"])
}

#[test]
fn test_enum_by_id_and_by_name() {
    let mut by_id = Fory::default();
    by_id.register_enum(5, color()).unwrap();
    let mut by_name = Fory::default();
    by_name.register_enum_by_name(color()).unwrap();
    let green = Value::Enum(EnumValue::new("demo.Color", 1));
    let id_bytes = test_roundtrip(&by_id, &green);
    let name_bytes = test_roundtrip(&by_name, &green);
    assert!(id_bytes.len() < name_bytes.len());
}

#[test]
fn test_enum_ordinal_out_of_range() {
    if should_panic_on_error() {
        return;
    }
    let mut fory = Fory::default();
    fory.register_enum(5, color()).unwrap();
    let bad = Value::Enum(EnumValue::new("demo.Color", 3));
    assert!(matches!(fory.serialize(&bad), Err(Error::UnknownEnum(_))));

    // a peer that knows a fourth member
    let mut wider = Fory::default();
    wider
        .register_enum(5, EnumDescriptor::new("demo", "Color", &["Red", "Green", "Blue", "Black"]))
        .unwrap();
    let bytes = wider.serialize(&bad).unwrap();
    assert!(matches!(fory.deserialize(&bytes), Err(Error::UnknownEnum(_))));
}

#[test]
fn test_unregistered_enum() {
    let mood = Value::Enum(EnumValue::new("demo.Mood", 2));
    let lenient = Fory::default().require_type_registration(false);
    test_roundtrip(&lenient, &mood);
    if should_panic_on_error() {
        return;
    }
    assert!(matches!(
        Fory::default().serialize(&mood),
        Err(Error::TypeUnregistered(_))
    ));
}
