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

use fory_xlang::{Error, FieldDescriptor, Fory, Record, ShapeKind, StructDescriptor, TypeId, Value};
use fory_xlang_core::error::should_panic_on_error;

fn node_descriptor() -> StructDescriptor {
    StructDescriptor::new("demo", "Node")
        .field(FieldDescriptor::new("id", TypeId::INT64))
        .field(
            FieldDescriptor::new("next", ShapeKind::named("demo.Node"))
                .nullable(true)
                .track_ref(true),
        )
}

fn node_fory(compatible: bool) -> Fory {
    let mut fory = Fory::default().compatible(compatible).track_ref(true);
    let desc = if compatible {
        StructDescriptor::new("demo", "Node")
            .field(FieldDescriptor::new("id", TypeId::INT64).default_value(0i64))
            .field(
                FieldDescriptor::new("next", ShapeKind::named("demo.Node"))
                    .nullable(true)
                    .track_ref(true),
            )
    } else {
        node_descriptor()
    };
    fory.register_struct(50, desc).unwrap();
    fory
}

fn node(id: i64) -> Value {
    Record::new("demo.Node").with("id", id).into_value()
}

fn link(from: &Value, to: &Value) {
    from.as_record().unwrap().borrow_mut().set("next", to.clone());
}

fn next_of(value: &Value) -> Value {
    value
        .as_record()
        .unwrap()
        .borrow()
        .get("next")
        .cloned()
        .unwrap_or(Value::Null)
}

#[test]
fn test_self_cycle() {
    for compatible in [false, true] {
        let fory = node_fory(compatible);
        let a = node(1);
        link(&a, &a);
        let bytes = fory.serialize(&a).unwrap();
        let decoded = fory.deserialize(&bytes).unwrap();
        assert!(next_of(&decoded).ptr_eq(&decoded));
        // break the cycles so the test does not leak
        link(&a, &Value::Null);
        link(&decoded, &Value::Null);
    }
}

#[test]
fn test_two_node_cycle() {
    let fory = node_fory(false);
    let a = node(1);
    let b = node(2);
    link(&a, &b);
    link(&b, &a);
    let decoded = fory.deserialize(&fory.serialize(&a).unwrap()).unwrap();
    let decoded_b = next_of(&decoded);
    assert_eq!(
        decoded_b.as_record().unwrap().borrow().get("id"),
        Some(&Value::Int64(2))
    );
    assert!(next_of(&decoded_b).ptr_eq(&decoded));
    link(&a, &Value::Null);
    link(&decoded, &Value::Null);
}

#[test]
fn test_shared_identity_in_list() {
    let fory = node_fory(false);
    let shared = node(9);
    let list = Value::list(vec![shared.clone(), shared.clone(), node(9)]);
    let decoded = fory.deserialize(&fory.serialize(&list).unwrap()).unwrap();
    let items = decoded.as_list().unwrap().borrow();
    assert_eq!(items.len(), 3);
    assert!(items[0].ptr_eq(&items[1]));
    assert!(!items[0].ptr_eq(&items[2]));
    assert_eq!(items[0], items[2]);
}

#[test]
fn test_list_containing_itself() {
    let fory = Fory::default().track_ref(true);
    let list = Value::list(vec![Value::Int32(1)]);
    if let Value::List(items) = &list {
        items.borrow_mut().push(list.clone());
    }
    let decoded = fory.deserialize(&fory.serialize(&list).unwrap()).unwrap();
    let inner = decoded.as_list().unwrap().borrow()[1].clone();
    assert!(inner.ptr_eq(&decoded));
    for value in [&list, &decoded] {
        value.as_list().unwrap().borrow_mut().clear();
    }
}

#[test]
fn test_shared_values_copied_without_tracking() {
    let fory = Fory::default();
    let shared = Value::list(vec![Value::Int32(1)]);
    let outer = Value::list(vec![shared.clone(), shared]);
    let decoded = fory.deserialize(&fory.serialize(&outer).unwrap()).unwrap();
    let items = decoded.as_list().unwrap().borrow();
    assert_eq!(items[0], items[1]);
    assert!(!items[0].ptr_eq(&items[1]));
}

#[test]
fn test_invalid_back_reference() {
    if should_panic_on_error() {
        return;
    }
    let fory = Fory::default().track_ref(true);
    // header, Ref flag, slot 5 which was never assigned
    let bytes = [0xd4, 0x62, 0b110, 0xfe, 5];
    assert!(matches!(fory.deserialize(&bytes), Err(Error::InvalidRef(_))));
}

#[test]
fn test_node_fingerprint() {
    let mut fory = Fory::default();
    fory.register_struct(50, node_descriptor()).unwrap();
    let meta = fory.get_type_resolver().get_struct("demo.Node").unwrap();
    assert_eq!(meta.version_hash, -79034236);
}
