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

//! # Fory xlang core
//!
//! The schema-driven core of the Fory cross-language object protocol. Records,
//! enums and containers are described at runtime through descriptors and
//! exchanged as dynamic [`value::Value`] graphs.
//!
//! ## Architecture
//!
//! - **`fory`**: configuration, registration and the serialize/deserialize entry points
//! - **`buffer`**: little-endian Reader/Writer with varint codecs
//! - **`meta`**: type identity, field classification, struct fingerprints and TypeDef
//! - **`resolver`**: the type registry, shared-meta resolvers, reference tables,
//!   decode guardrails and per-call contexts
//! - **`serializer`**: the value, collection and struct codecs
//! - **`types`**: wire type ids and protocol constants
//! - **`error`**: error type and construction helpers
//!
//! ## Serialization modes
//!
//! - **Strict**: both peers declare identical types. Every record carries the
//!   32-bit version hash of its field layout and a mismatch is rejected.
//! - **Compatible**: every record type ships a TypeDef once per call. Peers
//!   reconcile fields by tag or by name and may evolve independently.
//!
//! ```rust
//! use fory_xlang_core::fory::Fory;
//! use fory_xlang_core::meta::{FieldDescriptor, StructDescriptor};
//! use fory_xlang_core::types::TypeId;
//! use fory_xlang_core::value::{Record, Value};
//!
//! let mut fory = Fory::default().compatible(true);
//! fory.register_struct_by_name(
//!     StructDescriptor::new("demo", "User")
//!         .field(FieldDescriptor::new("name", TypeId::STRING).nullable(true))
//!         .field(FieldDescriptor::new("age", TypeId::INT32).default_value(0)),
//! )
//! .unwrap();
//!
//! let user = Record::new("demo.User")
//!     .with("name", "alice")
//!     .with("age", 30)
//!     .into_value();
//! let bytes = fory.serialize(&user).unwrap();
//! assert_eq!(fory.deserialize(&bytes).unwrap(), user);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod fory;
pub mod meta;
pub mod resolver;
pub mod serializer;
pub mod types;
pub mod util;
pub mod value;
