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

//! Shared helpers for the integration tests.

use fory_xlang::{FieldDescriptor, Fory, StructDescriptor, TypeId, Value};

/// Routes `log` output through the test harness; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Serializes `value`, decodes it again and checks the result is equal.
pub fn test_roundtrip(fory: &Fory, value: &Value) -> Vec<u8> {
    let bytes = fory.serialize(value).unwrap();
    let decoded = fory.deserialize(&bytes).unwrap();
    assert_eq!(&decoded, value);
    bytes
}

/// `demo.User` with a nullable `name` and an `age` defaulting to 0.
pub fn user_descriptor() -> StructDescriptor {
    StructDescriptor::new("demo", "User")
        .field(FieldDescriptor::new("name", TypeId::STRING).nullable(true))
        .field(FieldDescriptor::new("age", TypeId::INT32).default_value(0))
}
