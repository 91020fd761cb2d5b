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

use fory_xlang::{CodecStrategy, FieldDescriptor, Fory, Record, ShapeKind, StructDescriptor, TypeId, Value};

fn sample_descriptor() -> StructDescriptor {
    StructDescriptor::new("demo", "Sample")
        .field(FieldDescriptor::new("a", TypeId::INT64).default_value(0i64))
        .field(FieldDescriptor::new("b", TypeId::INT32).default_value(0))
        .field(FieldDescriptor::new("c", TypeId::BOOL).default_value(false))
        .field(FieldDescriptor::new("d", TypeId::FLOAT64).default_value(0.0))
        .field(FieldDescriptor::new("e", TypeId::UINT16).default_value(0u16))
        .field(FieldDescriptor::new("f", TypeId::VARINT64).default_value(0i64))
        .field(FieldDescriptor::new("g", TypeId::STRING).nullable(true))
        .field(FieldDescriptor::new("h", TypeId::INT32).nullable(true))
        .field(FieldDescriptor::new("i", ShapeKind::list(TypeId::FLOAT32.into())).nullable(true))
        .field(FieldDescriptor::new("j", ShapeKind::Dynamic).nullable(true))
}

fn sample() -> Value {
    Record::new("demo.Sample")
        .with("a", -5i64)
        .with("b", i32::MAX)
        .with("c", true)
        .with("d", 2.75)
        .with("e", 65535u16)
        .with("f", 1i64 << 50)
        .with("g", "text")
        .with("h", 12)
        .with("i", Value::list(vec![Value::Float32(0.5), Value::Float32(-1.0)]))
        .with("j", Value::map(vec![("k".into(), Value::Int64(3))]))
        .into_value()
}

fn build(compatible: bool, strategy: CodecStrategy) -> Fory {
    let mut fory = Fory::default().compatible(compatible).codec_strategy(strategy);
    fory.register_struct(60, sample_descriptor()).unwrap();
    fory
}

#[test]
fn test_strategies_produce_identical_bytes() {
    for compatible in [false, true] {
        let interpreted = build(compatible, CodecStrategy::Interpreted);
        let compiled = build(compatible, CodecStrategy::Compiled);
        let value = sample();
        let a = interpreted.serialize(&value).unwrap();
        let b = compiled.serialize(&value).unwrap();
        assert_eq!(a, b);
        assert_eq!(interpreted.deserialize(&b).unwrap(), value);
        assert_eq!(compiled.deserialize(&a).unwrap(), value);
    }
}

#[test]
fn test_compiled_plan_covers_fixed_fields() {
    let fory = build(false, CodecStrategy::Compiled);
    let meta = fory.get_type_resolver().get_struct("demo.Sample").unwrap();
    let runs = meta
        .plan
        .steps()
        .iter()
        .filter(|step| matches!(step, fory_xlang_core::serializer::PlanStep::FixedRun { .. }))
        .count();
    assert!(runs >= 1);
}

#[test]
fn test_dynamic_field_keeps_concrete_type() {
    let fory = build(false, CodecStrategy::Compiled);
    for j in [Value::Int32(1), Value::from("s"), Value::Bool(false)] {
        let value = sample();
        value.as_record().unwrap().borrow_mut().set("j", j.clone());
        let decoded = fory.deserialize(&fory.serialize(&value).unwrap()).unwrap();
        assert_eq!(decoded.as_record().unwrap().borrow().get("j"), Some(&j));
    }
}
