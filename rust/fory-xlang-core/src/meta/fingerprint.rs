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

use crate::ensure;
use crate::error::Error;
use crate::meta::field_info::FieldInfo;
use crate::meta::murmurhash::murmurhash3_x64_128;
use crate::types::{is_enum_type, is_polymorphic_type, is_union_type, UNKNOWN};

const FINGERPRINT_SEED: u64 = 47;

/// Type id contributed to the fingerprint. Kinds whose concrete type another
/// language may not know at compile time all collapse to `UNKNOWN`.
fn fingerprint_type_id(type_id: u32) -> u32 {
    if is_polymorphic_type(type_id) || is_enum_type(type_id) || is_union_type(type_id) {
        UNKNOWN
    } else {
        type_id
    }
}

/// Builds `<tag-or-name>,<type_id>,<ref>,<nullable>;` for every field, ordered
/// by tie-break key.
pub fn compute_fingerprint(fields: &[FieldInfo]) -> String {
    let mut sorted: Vec<&FieldInfo> = fields.iter().collect();
    sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    let mut text = String::new();
    for field in sorted {
        let (_, id) = field.sort_key();
        text.push_str(&format!(
            "{},{},{},{};",
            id,
            fingerprint_type_id(field.type_id),
            field.ref_eligible as u8,
            field.nullable as u8
        ));
    }
    text
}

/// Low 32 bits of MurmurHash3 x64_128 over the fingerprint, seed 47. Empty
/// text hashes to the seed.
pub fn fingerprint_hash(text: &str) -> i32 {
    if text.is_empty() {
        return FINGERPRINT_SEED as i32;
    }
    murmurhash3_x64_128(text.as_bytes(), FINGERPRINT_SEED).0 as u32 as i32
}

/// Version hash of a record type, checked in strict mode before its fields.
pub fn compute_struct_version(type_name: &str, fields: &[FieldInfo]) -> Result<i32, Error> {
    let text = compute_fingerprint(fields);
    let hash = fingerprint_hash(&text);
    log::debug!("struct {type_name} version fingerprint=\"{text}\" version hash={hash}");
    ensure!(
        hash != 0,
        Error::invalid_data(format!("struct {type_name} has a zero version hash"))
    );
    Ok(hash)
}

/// Fails when the version hash read from the payload differs from the local one.
#[inline(always)]
pub fn check_struct_version(
    read_version: i32,
    local_version: i32,
    type_name: &str,
) -> Result<(), Error> {
    if read_version != local_version {
        return Err(Error::struct_version_mismatch(format!(
            "type not compatible: read {type_name} version {read_version} but local version is \
             {local_version}, align struct field types and names or enable compatible mode"
        )));
    }
    Ok(())
}
