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

//! # Fory xlang
//!
//! Cross-language object serialization driven by runtime type descriptors.
//!
//! Types are described once with [`StructDescriptor`] and [`EnumDescriptor`]
//! and registered on a [`Fory`] instance, either under a numeric id, by
//! namespace and name, or under an id derived from the name. Values travel as
//! dynamic [`Value`] graphs; lists, sets, maps and records are shared handles
//! so shared and circular references survive a round trip when reference
//! tracking is enabled.
//!
//! ```rust
//! use fory_xlang::{FieldDescriptor, Fory, IdAssignment, Record, StructDescriptor, TypeId};
//!
//! let mut fory = Fory::default();
//! let assignment = fory
//!     .register_struct_auto(
//!         StructDescriptor::new("demo", "User")
//!             .field(FieldDescriptor::new("id", TypeId::INT64))
//!             .field(FieldDescriptor::new("name", TypeId::STRING)),
//!     )
//!     .unwrap();
//! assert!(matches!(assignment, IdAssignment::Generated { id: 89059757, .. }));
//!
//! let user = Record::new("demo.User")
//!     .with("id", 7i64)
//!     .with("name", "bob")
//!     .into_value();
//! let bytes = fory.serialize(&user).unwrap();
//! assert_eq!(fory.deserialize(&bytes).unwrap(), user);
//! ```
//!
//! ## Decode guardrails
//!
//! Declared sizes are checked before any allocation. The ceilings are set on
//! the builder and `None` disables one:
//!
//! ```rust
//! use fory_xlang::Fory;
//!
//! let fory = Fory::default()
//!     .max_collection_size(Some(1024))
//!     .max_map_size(Some(1024))
//!     .max_string_bytes(Some(1 << 20))
//!     .max_binary_size(None);
//! ```

pub use fory_xlang_core::{
    config::{CodecStrategy, Config},
    error::Error,
    fory::Fory,
    meta::{
        DefaultValue, EnumDescriptor, FieldDescriptor, IdAssignment, ShapeKind,
        StructDescriptor, TypeNaming,
    },
    resolver::guardrail::SizeLimits,
    types::TypeId,
    value::{EnumValue, Record, Value},
};
