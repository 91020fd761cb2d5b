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
    Error, FieldDescriptor, Fory, Record, ShapeKind, StructDescriptor, TypeId, Value,
};
use fory_xlang_core::error::{should_panic_on_error, LimitKind};

fn ints(n: usize) -> Value {
    Value::list((0..n as i32).map(Value::Int32).collect())
}

fn entries(n: usize) -> Value {
    Value::map(
        (0..n as i32)
            .map(|i| (Value::Int32(i), Value::from(format!("v{i}"))))
            .collect(),
    )
}

fn assert_limit(result: Result<Value, Error>, expected: LimitKind, len: usize, max: usize) {
    match result {
        Err(Error::SizeLimitExceeded { kind, len: l, limit }) => {
            assert_eq!(kind, expected);
            assert_eq!(l, len);
            assert_eq!(limit, max);
        }
        other => panic!("expected a size limit error, got {other:?}"),
    }
}

#[test]
fn test_collection_limit() {
    let writer = Fory::default();
    let reader = Fory::default().max_collection_size(Some(4));
    let at_limit = writer.serialize(&ints(4)).unwrap();
    assert_eq!(reader.deserialize(&at_limit).unwrap(), ints(4));
    if should_panic_on_error() {
        return;
    }
    let over = writer.serialize(&ints(5)).unwrap();
    assert_limit(reader.deserialize(&over), LimitKind::Collection, 5, 4);
}

#[test]
fn test_zero_limit_admits_only_empty() {
    let writer = Fory::default();
    let reader = Fory::default()
        .max_collection_size(Some(0))
        .max_string_bytes(Some(0));
    assert_eq!(
        reader.deserialize(&writer.serialize(&ints(0)).unwrap()).unwrap(),
        ints(0)
    );
    assert_eq!(
        reader
            .deserialize(&writer.serialize(&Value::from("")).unwrap())
            .unwrap(),
        Value::from("")
    );
    if should_panic_on_error() {
        return;
    }
    assert_limit(
        reader.deserialize(&writer.serialize(&ints(1)).unwrap()),
        LimitKind::Collection,
        1,
        0,
    );
    assert_limit(
        reader.deserialize(&writer.serialize(&Value::from("a")).unwrap()),
        LimitKind::String,
        1,
        0,
    );
}

#[test]
fn test_disabled_limits() {
    let writer = Fory::default();
    let reader = Fory::default()
        .max_collection_size(None)
        .max_map_size(None)
        .max_binary_size(None)
        .max_string_bytes(None);
    let big = ints(20_000);
    assert_eq!(reader.deserialize(&writer.serialize(&big).unwrap()).unwrap(), big);
    let blob = Value::Binary(vec![7u8; 100_000]);
    assert_eq!(reader.deserialize(&writer.serialize(&blob).unwrap()).unwrap(), blob);
}

#[test]
fn test_map_limit() {
    let writer = Fory::default();
    let reader = Fory::default().max_map_size(Some(3));
    assert_eq!(
        reader.deserialize(&writer.serialize(&entries(3)).unwrap()).unwrap(),
        entries(3)
    );
    if should_panic_on_error() {
        return;
    }
    assert_limit(
        reader.deserialize(&writer.serialize(&entries(4)).unwrap()),
        LimitKind::Map,
        4,
        3,
    );
}

#[test]
fn test_default_map_limit() {
    let fory = Fory::default();
    let int_entries =
        |n: i32| Value::map((0..n).map(|i| (Value::Int32(i), Value::Int32(i))).collect());
    let at_limit = fory.serialize(&int_entries(1_000_000)).unwrap();
    assert!(fory.deserialize(&at_limit).is_ok());
    drop(at_limit);
    if should_panic_on_error() {
        return;
    }
    let over = fory.serialize(&int_entries(1_000_001)).unwrap();
    assert_limit(fory.deserialize(&over), LimitKind::Map, 1_000_001, 1_000_000);
}

#[test]
fn test_nested_violation_aborts_the_call() {
    let tagged = || {
        StructDescriptor::new("demo", "Tagged").field(FieldDescriptor::new(
            "tags",
            ShapeKind::list(TypeId::STRING.into()),
        ))
    };
    let mut writer = Fory::default();
    writer.register_struct(60, tagged()).unwrap();
    let mut reader = Fory::default().max_collection_size(Some(2));
    reader.register_struct(60, tagged()).unwrap();
    let record = |tags: &[&str]| {
        Record::new("demo.Tagged")
            .with("tags", Value::list(tags.iter().map(|t| Value::from(*t)).collect()))
            .into_value()
    };
    let fits = Value::list(vec![record(&["a"]), record(&["b", "c"])]);
    assert_eq!(reader.deserialize(&writer.serialize(&fits).unwrap()).unwrap(), fits);
    if should_panic_on_error() {
        return;
    }
    let nested = Value::list(vec![record(&["a"]), record(&["b", "c", "d"])]);
    assert_limit(
        reader.deserialize(&writer.serialize(&nested).unwrap()),
        LimitKind::Collection,
        3,
        2,
    );
}

#[test]
fn test_string_and_binary_limits() {
    let writer = Fory::default();
    let reader = Fory::default()
        .max_string_bytes(Some(5))
        .max_binary_size(Some(2));
    let hello = Value::from("hello");
    assert_eq!(reader.deserialize(&writer.serialize(&hello).unwrap()).unwrap(), hello);
    let two = Value::binary(&[1, 2]);
    assert_eq!(reader.deserialize(&writer.serialize(&two).unwrap()).unwrap(), two);
    if should_panic_on_error() {
        return;
    }
    assert_limit(
        reader.deserialize(&writer.serialize(&Value::from("hello!")).unwrap()),
        LimitKind::String,
        6,
        5,
    );
    assert_limit(
        reader.deserialize(&writer.serialize(&Value::binary(&[1, 2, 3])).unwrap()),
        LimitKind::Binary,
        3,
        2,
    );
}

#[test]
fn test_declared_length_beyond_input() {
    if should_panic_on_error() {
        return;
    }
    let fory = Fory::default().max_collection_size(None);
    let mut bytes = fory.serialize(&ints(2)).unwrap();
    // claim a huge list while only two elements follow
    let len_pos = 5;
    assert_eq!(bytes[len_pos], 2);
    bytes.splice(len_pos..len_pos + 1, [0xff, 0xff, 0xff, 0xff, 0x0f]);
    assert!(fory.deserialize(&bytes).is_err());
}

fn nested_lists(depth: usize) -> Value {
    let mut value = Value::Int32(0);
    for _ in 0..depth {
        value = Value::list(vec![value]);
    }
    value
}

#[test]
fn test_depth_limit() {
    let writer = Fory::default();
    let reader = Fory::default().max_depth(3);
    let shallow = nested_lists(3);
    assert_eq!(
        reader.deserialize(&writer.serialize(&shallow).unwrap()).unwrap(),
        shallow
    );
    if should_panic_on_error() {
        return;
    }
    let deep = writer.serialize(&nested_lists(4)).unwrap();
    assert!(matches!(reader.deserialize(&deep), Err(Error::DepthExceed(_))));
    assert!(matches!(
        reader.serialize(&nested_lists(4)),
        Err(Error::DepthExceed(_))
    ));
}
