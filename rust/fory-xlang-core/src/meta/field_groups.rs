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

//! Canonical on-wire field order.
//!
//! Fields fall into seven groups, written in this order:
//!
//! 1. non-nullable primitives
//! 2. nullable primitives
//! 3. other built-ins below [`BOUND`](crate::types::BOUND)
//! 4. lists
//! 5. sets
//! 6. maps
//! 7. everything else: enums, unions, structs, ext types, unknown types
//!
//! Primitive groups are sorted by compressed flag (fixed width first), byte
//! width descending, type id descending and finally the tie-break key of
//! [`FieldInfo::sort_key`]. Every other group is sorted by the tie-break key
//! alone, so declaration order never changes the layout.

use crate::meta::field_info::FieldInfo;
use crate::types::{
    is_compressed_type, is_internal_type, is_primitive_type, primitive_type_size, LIST, MAP, SET,
};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldGroup {
    Primitive,
    NullablePrimitive,
    Internal,
    List,
    Set,
    Map,
    Other,
}

impl FieldGroup {
    pub fn of(field: &FieldInfo) -> FieldGroup {
        let type_id = field.type_id;
        if is_primitive_type(type_id) {
            if field.nullable {
                FieldGroup::NullablePrimitive
            } else {
                FieldGroup::Primitive
            }
        } else if type_id == LIST {
            FieldGroup::List
        } else if type_id == SET {
            FieldGroup::Set
        } else if type_id == MAP {
            FieldGroup::Map
        } else if is_internal_type(type_id) {
            FieldGroup::Internal
        } else {
            FieldGroup::Other
        }
    }
}

fn primitive_sorter(a: &FieldInfo, b: &FieldInfo) -> Ordering {
    let (a_id, b_id) = (a.type_id, b.type_id);
    is_compressed_type(a_id)
        .cmp(&is_compressed_type(b_id))
        .then_with(|| primitive_type_size(b_id).cmp(&primitive_type_size(a_id)))
        .then_with(|| b_id.cmp(&a_id))
        .then_with(|| a.sort_key().cmp(&b.sort_key()))
}

fn key_sorter(a: &FieldInfo, b: &FieldInfo) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

/// Partitions `fields` into the seven groups and sorts each one.
pub fn group_fields(fields: &[FieldInfo]) -> Vec<(FieldGroup, Vec<FieldInfo>)> {
    let mut groups: Vec<(FieldGroup, Vec<FieldInfo>)> = [
        FieldGroup::Primitive,
        FieldGroup::NullablePrimitive,
        FieldGroup::Internal,
        FieldGroup::List,
        FieldGroup::Set,
        FieldGroup::Map,
        FieldGroup::Other,
    ]
    .into_iter()
    .map(|g| (g, Vec::new()))
    .collect();
    for field in fields {
        groups[FieldGroup::of(field) as usize].1.push(field.clone());
    }
    for (group, members) in groups.iter_mut() {
        match group {
            FieldGroup::Primitive | FieldGroup::NullablePrimitive => {
                members.sort_by(primitive_sorter)
            }
            _ => members.sort_by(key_sorter),
        }
    }
    groups
}

/// The canonical field order of a record type.
pub fn sort_fields(fields: &[FieldInfo]) -> Vec<FieldInfo> {
    group_fields(fields)
        .into_iter()
        .flat_map(|(_, members)| members)
        .collect()
}
