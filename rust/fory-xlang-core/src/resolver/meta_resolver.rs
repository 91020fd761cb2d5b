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
use crate::meta::{qualify, ShapeKind, TypeDef};
use crate::resolver::type_resolver::{NamedType, StructMeta, TypeResolver};
use crate::types::{is_user_type, UNKNOWN};
use std::collections::HashMap;
use std::sync::Arc;

const MAX_PARSED_NUM_TYPE_DEFS: usize = 8192;

/// Streaming meta writer that writes a TypeDef inline the first time its type
/// appears in a call:
/// - `(index << 1) | 0` for a new type definition, followed by its bytes
/// - `(index << 1) | 1` for a reference to a previously written type
#[derive(Default)]
pub struct MetaWriterResolver {
    type_index_map: HashMap<String, usize>,
}

impl MetaWriterResolver {
    #[inline(always)]
    pub fn write_type_meta(&mut self, writer: &mut Writer, meta: &StructMeta) -> Result<(), Error> {
        match self.type_index_map.get(&meta.qualified_name) {
            Some(&index) => {
                writer.write_varuint32(((index as u32) << 1) | 1);
            }
            None => {
                let type_def = meta.type_def.as_deref().ok_or_else(|| {
                    Error::type_error(format!(
                        "type {} has no type definition outside compatible mode",
                        meta.qualified_name
                    ))
                })?;
                let index = self.type_index_map.len();
                writer.write_varuint32((index as u32) << 1);
                self.type_index_map.insert(meta.qualified_name.clone(), index);
                writer.write_bytes(type_def);
                log::debug!(
                    "shared type definition of {} at index {index}",
                    meta.qualified_name
                );
            }
        }
        Ok(())
    }

    #[inline(always)]
    pub fn reset(&mut self) {
        self.type_index_map.clear();
    }
}

/// How one remote field is read.
#[derive(Debug)]
pub struct RemoteField {
    /// Local canonical index the value is stored under, `None` to discard it.
    pub local: Option<usize>,
    pub name: String,
    pub shape: ShapeKind,
    pub nullable: bool,
    pub track_ref: bool,
    /// Whether the value is preceded by type info.
    pub has_type_info: bool,
}

/// A type definition read from the stream, paired with the local type it
/// describes when there is one.
#[derive(Debug)]
pub struct RemoteStruct {
    pub type_def: TypeDef,
    /// Qualified name records of this type carry once decoded.
    pub type_name: String,
    pub local: Option<Arc<StructMeta>>,
    /// True when both peers describe the same layout, so the local plan applies.
    pub same_layout: bool,
    pub fields: Vec<RemoteField>,
    /// Local canonical indexes absent from the payload.
    pub missing: Vec<usize>,
}

impl RemoteStruct {
    fn new(type_def: TypeDef, header: i64, type_resolver: &TypeResolver) -> RemoteStruct {
        let local = if type_def.is_registered_by_name() {
            type_resolver.get_by_name(type_def.namespace(), type_def.type_name())
        } else {
            type_resolver.get_by_id(type_def.user_type_id())
        };
        let local = match local {
            Some(NamedType::Struct(meta)) => Some(meta),
            _ => None,
        };
        let type_name = match &local {
            Some(meta) => meta.qualified_name.clone(),
            None if type_def.is_registered_by_name() => {
                qualify(type_def.namespace(), type_def.type_name())
            }
            None => format!("type#{}", type_def.user_type_id()),
        };
        let same_layout = local
            .as_ref()
            .is_some_and(|meta| meta.type_def_header() == Some(header));
        let (matched, missing) = match &local {
            Some(meta) => {
                let reconciliation = type_def.reconcile(&meta.fields);
                (reconciliation.matched, reconciliation.missing)
            }
            None => (vec![None; type_def.fields().len()], Vec::new()),
        };
        let fields: Vec<RemoteField> = type_def
            .fields()
            .iter()
            .zip(matched)
            .map(|(def, slot)| {
                let field_type = &def.field_type;
                let shape = match (slot, &local) {
                    (Some(i), Some(meta)) => meta.fields[i].declared_type.clone(),
                    _ => field_type.to_shape(),
                };
                RemoteField {
                    local: slot,
                    name: match def.tag_id {
                        Some(tag) => tag.to_string(),
                        None => def.name.clone(),
                    },
                    shape,
                    nullable: field_type.nullable,
                    track_ref: field_type.track_ref,
                    has_type_info: field_type.type_id == UNKNOWN
                        || is_user_type(field_type.type_id),
                }
            })
            .collect();
        if let Some(meta) = &local {
            for field in fields.iter().filter(|f: &&RemoteField| f.local.is_none()) {
                log::warn!(
                    "skipping field {} of {}: no matching local field",
                    field.name,
                    meta.qualified_name
                );
            }
        }
        RemoteStruct {
            type_def,
            type_name,
            local,
            same_layout,
            fields,
            missing,
        }
    }
}

/// Streaming meta reader, the counterpart of [`MetaWriterResolver`].
///
/// Parsed definitions are cached by header across calls; the per-call index
/// table is cleared by [`MetaReaderResolver::reset`].
#[derive(Default)]
pub struct MetaReaderResolver {
    reading: Vec<Arc<RemoteStruct>>,
    parsed: HashMap<i64, Arc<RemoteStruct>>,
}

impl MetaReaderResolver {
    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&Arc<RemoteStruct>> {
        self.reading.get(index)
    }

    pub fn read_type_meta(
        &mut self,
        reader: &mut Reader,
        type_resolver: &TypeResolver,
    ) -> Result<Arc<RemoteStruct>, Error> {
        let index_marker = reader.read_varuint32()?;
        let is_ref = (index_marker & 1) == 1;
        let index = (index_marker >> 1) as usize;
        if is_ref {
            return self.reading.get(index).cloned().ok_or_else(|| {
                Error::invalid_data(format!("type definition index {index} was never sent"))
            });
        }
        if index != self.reading.len() {
            return Err(Error::invalid_data(format!(
                "type definition index {index} is out of order, expected {}",
                self.reading.len()
            )));
        }
        let meta_header = reader.read_i64()?;
        let remote = match self.parsed.get(&meta_header) {
            Some(remote) => {
                TypeDef::skip_bytes(reader, meta_header)?;
                remote.clone()
            }
            None => {
                let type_def = TypeDef::from_bytes_with_header(reader, meta_header)?;
                let remote = Arc::new(RemoteStruct::new(type_def, meta_header, type_resolver));
                if self.parsed.len() < MAX_PARSED_NUM_TYPE_DEFS {
                    self.parsed.insert(meta_header, remote.clone());
                }
                remote
            }
        };
        self.reading.push(remote.clone());
        Ok(remote)
    }

    #[inline(always)]
    pub fn reset(&mut self) {
        self.reading.clear();
    }
}
