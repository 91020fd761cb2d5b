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

mod field_groups;
mod field_info;
mod fingerprint;
mod murmurhash;
mod type_def;
mod type_identity;

pub use field_groups::{group_fields, sort_fields, FieldGroup};
pub use field_info::{
    flatten_fields, resolve_fields, shape_type_id, DefaultFactory, DefaultValue, EnumDescriptor,
    FieldDescriptor, FieldInfo, NamedTypeInfo, ShapeKind, StructDescriptor,
};
pub(crate) use field_info::is_supported_primitive;
pub use fingerprint::{
    check_struct_version, compute_fingerprint, compute_struct_version, fingerprint_hash,
};
pub use murmurhash::{murmurhash3_x64_128, murmurhash3_x86_32};
pub use type_def::{FieldDef, FieldType, Reconciliation, TypeDef};
pub use type_identity::{compute_registered_type_id, IdAssignment, TypeIdAllocator, TypeNaming};
pub(crate) use type_identity::{qualify, split_qualified};
