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

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::types::RefFlag;
use crate::value::Value;
use std::collections::HashMap;

/// Reference writer for tracking shared references during serialization.
///
/// RefWriter maps the address of every identity-bearing value it has seen in
/// the current call to a slot id, so that a repeated occurrence is written as a
/// back-reference instead of a second copy. This is what lets shared and
/// circular graphs round-trip.
///
/// # Examples
///
/// ```rust
/// use fory_xlang_core::buffer::Writer;
/// use fory_xlang_core::resolver::ref_resolver::RefWriter;
/// use fory_xlang_core::value::Value;
///
/// let mut ref_writer = RefWriter::new();
/// let mut writer = Writer::default();
/// let list = Value::list(vec![]);
///
/// // First encounter, the value itself must follow
/// assert!(!ref_writer.try_write_ref(&mut writer, &list));
///
/// // Second encounter, a back-reference was written
/// assert!(ref_writer.try_write_ref(&mut writer, &list.clone()));
/// ```
#[derive(Default)]
pub struct RefWriter {
    /// Maps value addresses to slot ids
    refs: HashMap<usize, u32>,
    next_ref_id: u32,
}

impl RefWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the ref marker of `value`.
    ///
    /// Returns true when nothing more must be written: the value is null or
    /// was already written in this call. Identity-bearing values seen for the
    /// first time take the next slot; scalars are never tracked.
    pub fn try_write_ref(&mut self, writer: &mut Writer, value: &Value) -> bool {
        let Some(ptr_addr) = value.identity() else {
            if value.is_null() {
                writer.write_i8(RefFlag::Null as i8);
                return true;
            }
            writer.write_i8(RefFlag::NotNullValue as i8);
            return false;
        };
        if let Some(&ref_id) = self.refs.get(&ptr_addr) {
            writer.write_i8(RefFlag::Ref as i8);
            writer.write_varuint32(ref_id);
            true
        } else {
            let ref_id = self.next_ref_id;
            self.next_ref_id += 1;
            self.refs.insert(ptr_addr, ref_id);
            writer.write_i8(RefFlag::RefValue as i8);
            false
        }
    }

    /// Clear all stored references.
    ///
    /// This is useful for reusing the RefWriter for multiple serialization operations.
    pub fn reset(&mut self) {
        self.refs.clear();
        self.next_ref_id = 0;
    }
}

/// Reference reader for resolving shared references during deserialization.
///
/// Slots are reserved in the order the writer assigned them. Containers and
/// records fill their slot as soon as they are allocated, before their
/// contents are decoded, so a back-reference from inside them resolves.
///
/// # Examples
///
/// ```rust
/// use fory_xlang_core::resolver::ref_resolver::RefReader;
/// use fory_xlang_core::value::Value;
///
/// let mut ref_reader = RefReader::new();
/// let list = Value::list(vec![]);
/// let ref_id = ref_reader.reserve_ref();
/// ref_reader.set_ref(ref_id, list.clone());
/// assert!(ref_reader.get_ref(ref_id).unwrap().ptr_eq(&list));
/// ```
#[derive(Default)]
pub struct RefReader {
    refs: Vec<Option<Value>>,
}

impl RefReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next slot and returns its id.
    pub fn reserve_ref(&mut self) -> u32 {
        let ref_id = self.refs.len() as u32;
        self.refs.push(None);
        ref_id
    }

    pub fn set_ref(&mut self, ref_id: u32, value: Value) {
        if let Some(slot) = self.refs.get_mut(ref_id as usize) {
            *slot = Some(value);
        }
    }

    /// Resolves a back-reference.
    pub fn get_ref(&self, ref_id: u32) -> Result<Value, Error> {
        match self.refs.get(ref_id as usize) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(Error::invalid_ref(format!(
                "invalid reference id {ref_id}: value is not available yet"
            ))),
            None => Err(Error::invalid_ref(format!(
                "invalid reference id {ref_id}: only {} slots are populated",
                self.refs.len()
            ))),
        }
    }

    /// Reads a ref marker.
    pub fn read_ref_flag(&self, reader: &mut Reader) -> Result<RefFlag, Error> {
        let flag_value = reader.read_i8()?;
        RefFlag::try_from(flag_value)
            .map_err(|_| Error::invalid_data(format!("invalid reference flag: {flag_value}")))
    }

    pub fn read_ref_id(&self, reader: &mut Reader) -> Result<u32, Error> {
        reader.read_varuint32()
    }

    pub fn reset(&mut self) {
        self.refs.clear();
    }
}
