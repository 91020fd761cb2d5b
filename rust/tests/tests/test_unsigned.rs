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

use fory_xlang::{FieldDescriptor, Fory, Record, StructDescriptor, TypeId, Value};
use tests::test_roundtrip;

fn encodings_fory() -> Fory {
    let mut fory = Fory::default();
    fory.register_struct(
        80,
        StructDescriptor::new("demo", "Encodings")
            .field(FieldDescriptor::new("tagged", TypeId::TAGGED_INT64))
            .field(FieldDescriptor::new("tagged_u", TypeId::TAGGED_UINT64))
            .field(FieldDescriptor::new("var_u32", TypeId::VAR_UINT32))
            .field(FieldDescriptor::new("var_u64", TypeId::VAR_UINT64))
            .field(FieldDescriptor::new("var_i32", TypeId::VARINT32))
            .field(FieldDescriptor::new("fixed_u64", TypeId::UINT64)),
    )
    .unwrap();
    fory
}

fn encodings(small: bool) -> Value {
    let (i, u) = if small { (1i64, 1u64) } else { (i64::MIN, u64::MAX) };
    Record::new("demo.Encodings")
        .with("tagged", i)
        .with("tagged_u", u)
        .with("var_u32", if small { 1u32 } else { u32::MAX })
        .with("var_u64", u)
        .with("var_i32", if small { -1 } else { i32::MIN })
        .with("fixed_u64", u)
        .into_value()
}

#[test]
fn test_variable_length_fields() {
    let fory = encodings_fory();
    let small = test_roundtrip(&fory, &encodings(true));
    let large = test_roundtrip(&fory, &encodings(false));
    // tagged 4+4, varints 1+1+1, fixed 8 against 9+9+5+9+5+8
    assert_eq!(large.len() - small.len(), 45 - 19);
}

#[test]
fn test_unsigned_root_values() {
    let fory = Fory::default();
    for value in [
        Value::UInt8(u8::MAX),
        Value::UInt16(u16::MAX),
        Value::UInt32(0),
        Value::UInt64(1 << 63),
    ] {
        test_roundtrip(&fory, &value);
    }
}
