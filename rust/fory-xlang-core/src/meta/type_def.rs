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

//! Compatible-mode type definitions.
//!
//! ```text
//! | header: i64 | layer |
//! header: | hash: 50 bits | reserved: 1 bit | has_fields: 1 bit | size: 12 bits |
//! layer:  | meta: u8 | user id or namespace + type name | field entries |
//! field:  | header: u8 | field type | name bytes |
//! ```

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::meta::field_info::{FieldInfo, ShapeKind};
use crate::meta::murmurhash::murmurhash3_x64_128;
use crate::types::{TypeId, LIST, MAP, SET};
use std::cmp::min;

const SMALL_NUM_FIELDS_THRESHOLD: usize = 0b11111;
const REGISTER_BY_NAME_FLAG: u8 = 0b100000;
const FIELD_NAME_SIZE_THRESHOLD: usize = 0b1111;
const BIG_NAME_THRESHOLD: usize = 0b111111;

const META_SIZE_MASK: i64 = 0xfff;
const HAS_FIELDS_META_FLAG: i64 = 0b1 << 12;
const NUM_HASH_BITS: i8 = 50;

const NAME_ENCODING_UTF8: u8 = 0;
const ENCODING_TAG_ID: u8 = 3;

/// Type of one field as carried by a type definition. Containers nest.
#[derive(Debug, Clone, Eq)]
pub struct FieldType {
    pub type_id: u32,
    pub nullable: bool,
    pub track_ref: bool,
    pub generics: Vec<FieldType>,
}

impl FieldType {
    pub fn new(type_id: u32, nullable: bool, generics: Vec<FieldType>) -> Self {
        FieldType {
            type_id,
            nullable,
            track_ref: false,
            generics,
        }
    }

    fn to_bytes(&self, writer: &mut Writer, write_flag: bool) {
        let mut header = self.type_id;
        if write_flag {
            header <<= 2;
            if self.nullable {
                header |= 2;
            }
            if self.track_ref {
                header |= 1;
            }
        }
        writer.write_varuint32(header);
        match self.type_id {
            LIST | SET => match self.generics.first() {
                Some(generic) => generic.to_bytes(writer, true),
                None => FieldType::new(TypeId::UNKNOWN.id(), true, vec![]).to_bytes(writer, true),
            },
            MAP => {
                let unknown = FieldType::new(TypeId::UNKNOWN.id(), true, vec![]);
                self.generics.first().unwrap_or(&unknown).to_bytes(writer, true);
                self.generics.get(1).unwrap_or(&unknown).to_bytes(writer, true);
            }
            _ => {}
        }
    }

    fn from_bytes(
        reader: &mut Reader,
        read_flag: bool,
        flags: (bool, bool),
        depth: u32,
    ) -> Result<Self, Error> {
        if depth > MAX_GENERIC_DEPTH {
            return Err(Error::depth_exceed(
                "field type nesting exceeds the supported depth",
            ));
        }
        let header = reader.read_varuint32()?;
        let (type_id, nullable, track_ref) = if read_flag {
            (header >> 2, (header & 2) != 0, (header & 1) != 0)
        } else {
            (header, flags.0, flags.1)
        };
        let generics = match type_id {
            LIST | SET => vec![Self::from_bytes(reader, true, (false, false), depth + 1)?],
            MAP => vec![
                Self::from_bytes(reader, true, (false, false), depth + 1)?,
                Self::from_bytes(reader, true, (false, false), depth + 1)?,
            ],
            _ => vec![],
        };
        Ok(FieldType {
            type_id,
            nullable,
            track_ref,
            generics,
        })
    }

    /// The shape a field of this type is decoded with when no local field
    /// matches it. Registered kinds become dynamic, as their values always
    /// carry type info in compatible mode.
    pub fn to_shape(&self) -> ShapeKind {
        let generic = |i: usize| {
            self.generics
                .get(i)
                .map_or(ShapeKind::Dynamic, FieldType::to_shape)
        };
        match self.type_id {
            LIST => ShapeKind::list(generic(0)),
            SET => ShapeKind::set(generic(0)),
            MAP => ShapeKind::map(generic(0), generic(1)),
            id => match TypeId::try_from(id) {
                Ok(t) if crate::meta::field_info::is_supported_primitive(t) => {
                    ShapeKind::Primitive(t)
                }
                _ => ShapeKind::Dynamic,
            },
        }
    }
}

const MAX_GENERIC_DEPTH: u32 = 64;

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.generics == other.generics
    }
}

/// One field entry of a type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Empty when the field is identified by its tag.
    pub name: String,
    pub tag_id: Option<i16>,
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn from_field_info(field: &FieldInfo) -> FieldDef {
        FieldDef {
            name: if field.tag_id.is_some() {
                String::new()
            } else {
                field.name.clone()
            },
            tag_id: field.tag_id,
            field_type: FieldType {
                track_ref: field.runtime_ref_tracking,
                ..field.field_type.clone()
            },
        }
    }

    fn write_size(writer: &mut Writer, header: u8, size: usize) {
        let header = header | ((min(FIELD_NAME_SIZE_THRESHOLD, size) as u8) << 2);
        writer.write_u8(header);
        if size >= FIELD_NAME_SIZE_THRESHOLD {
            writer.write_varuint32((size - FIELD_NAME_SIZE_THRESHOLD) as u32);
        }
    }

    fn to_bytes(&self, writer: &mut Writer) -> Result<(), Error> {
        // header: | encoding:2bits | size:4bits | nullable:1bit | ref_tracking:1bit |
        let mut flags: u8 = 0;
        if self.field_type.nullable {
            flags |= 2;
        }
        if self.field_type.track_ref {
            flags |= 1;
        }
        match self.tag_id {
            Some(tag) => {
                let tag = usize::try_from(tag)
                    .map_err(|_| Error::invalid_data(format!("negative field tag {tag}")))?;
                Self::write_size(writer, flags | (ENCODING_TAG_ID << 6), tag);
                self.field_type.to_bytes(writer, false);
            }
            None => {
                let name = self.name.as_bytes();
                if name.is_empty() {
                    return Err(Error::invalid_data("field name must not be empty"));
                }
                Self::write_size(writer, flags | (NAME_ENCODING_UTF8 << 6), name.len() - 1);
                self.field_type.to_bytes(writer, false);
                writer.write_bytes(name);
            }
        }
        Ok(())
    }

    fn from_bytes(reader: &mut Reader) -> Result<FieldDef, Error> {
        let header = reader.read_u8()?;
        let nullable = (header & 2) != 0;
        let track_ref = (header & 1) != 0;
        let encoding = (header >> 6) & 0b11;
        let mut size = ((header >> 2) as usize) & FIELD_NAME_SIZE_THRESHOLD;
        if size == FIELD_NAME_SIZE_THRESHOLD {
            size += reader.read_varuint32()? as usize;
        }
        let field_type = FieldType::from_bytes(reader, false, (nullable, track_ref), 0)?;
        match encoding {
            ENCODING_TAG_ID => {
                let tag = i16::try_from(size)
                    .map_err(|_| Error::invalid_data(format!("field tag {size} out of range")))?;
                Ok(FieldDef {
                    name: String::new(),
                    tag_id: Some(tag),
                    field_type,
                })
            }
            NAME_ENCODING_UTF8 => {
                let bytes = reader.read_bytes(size + 1)?;
                let name = std::str::from_utf8(bytes)
                    .map_err(|e| Error::invalid_data(format!("invalid field name: {e}")))?;
                Ok(FieldDef {
                    name: name.to_string(),
                    tag_id: None,
                    field_type,
                })
            }
            other => Err(Error::unsupported(format!(
                "unsupported field name encoding {other} in type definition"
            ))),
        }
    }

    /// Tag text or name, for log output.
    pub fn label(&self) -> String {
        match self.tag_id {
            Some(tag) => format!("#{tag}"),
            None => self.name.clone(),
        }
    }
}

/// The descriptor table one peer sends for a record type in compatible mode.
#[derive(Debug, Clone)]
pub struct TypeDef {
    hash: i64,
    user_type_id: u32,
    namespace: String,
    type_name: String,
    register_by_name: bool,
    fields: Vec<FieldDef>,
}

impl TypeDef {
    pub fn new(
        user_type_id: Option<u32>,
        namespace: &str,
        type_name: &str,
        fields: &[FieldInfo],
    ) -> TypeDef {
        TypeDef {
            hash: 0,
            user_type_id: user_type_id.unwrap_or(0),
            namespace: namespace.to_string(),
            type_name: type_name.to_string(),
            register_by_name: user_type_id.is_none(),
            fields: fields.iter().map(FieldDef::from_field_info).collect(),
        }
    }

    #[inline(always)]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// The user id, meaningful only when the type is not registered by name.
    #[inline(always)]
    pub fn user_type_id(&self) -> u32 {
        self.user_type_id
    }

    #[inline(always)]
    pub fn is_registered_by_name(&self) -> bool {
        self.register_by_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline(always)]
    pub fn hash(&self) -> i64 {
        self.hash
    }

    fn write_name(writer: &mut Writer, name: &str) {
        let bytes = name.as_bytes();
        if bytes.len() >= BIG_NAME_THRESHOLD {
            writer.write_u8((BIG_NAME_THRESHOLD << 2) as u8 | NAME_ENCODING_UTF8);
            writer.write_varuint32((bytes.len() - BIG_NAME_THRESHOLD) as u32);
        } else {
            writer.write_u8((bytes.len() << 2) as u8 | NAME_ENCODING_UTF8);
        }
        writer.write_bytes(bytes);
    }

    fn read_name(reader: &mut Reader) -> Result<String, Error> {
        let header = reader.read_u8()?;
        let encoding = header & 0b11;
        if encoding != NAME_ENCODING_UTF8 {
            return Err(Error::unsupported(format!(
                "unsupported type name encoding {encoding} in type definition"
            )));
        }
        let length = (header >> 2) as usize;
        let length = if length >= BIG_NAME_THRESHOLD {
            BIG_NAME_THRESHOLD + reader.read_varuint32()? as usize
        } else {
            length
        };
        let bytes = reader.read_bytes(length)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| Error::invalid_data(format!("invalid type name: {e}")))
    }

    fn layer_to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut writer = Writer::default();
        let num_fields = self.fields.len();
        let mut meta_header: u8 = min(num_fields, SMALL_NUM_FIELDS_THRESHOLD) as u8;
        if self.register_by_name {
            meta_header |= REGISTER_BY_NAME_FLAG;
        }
        writer.write_u8(meta_header);
        if num_fields >= SMALL_NUM_FIELDS_THRESHOLD {
            writer.write_varuint32((num_fields - SMALL_NUM_FIELDS_THRESHOLD) as u32);
        }
        if self.register_by_name {
            Self::write_name(&mut writer, &self.namespace);
            Self::write_name(&mut writer, &self.type_name);
        } else {
            writer.write_varuint32(self.user_type_id);
        }
        for field in self.fields.iter() {
            field.to_bytes(&mut writer)?;
        }
        Ok(writer.dump())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let layer = self.layer_to_bytes()?;
        let meta_size = layer.len() as i64;
        let mut header: i64 = min(META_SIZE_MASK, meta_size);
        if !self.fields.is_empty() {
            header |= HAS_FIELDS_META_FLAG;
        }
        let meta_hash = murmurhash3_x64_128(&layer, 47).0 as i64;
        header |= (meta_hash << (64 - NUM_HASH_BITS)) & i64::MAX;
        let mut writer = Writer::with_capacity(layer.len() + 12);
        writer.write_i64(header);
        if meta_size >= META_SIZE_MASK {
            writer.write_varuint32((meta_size - META_SIZE_MASK) as u32);
        }
        writer.write_bytes(&layer);
        Ok(writer.dump())
    }

    fn layer_size(reader: &mut Reader, header: i64) -> Result<usize, Error> {
        let mut meta_size = header & META_SIZE_MASK;
        if meta_size == META_SIZE_MASK {
            meta_size += reader.read_varuint32()? as i64;
        }
        Ok(meta_size as usize)
    }

    pub fn from_bytes(reader: &mut Reader) -> Result<TypeDef, Error> {
        let header = reader.read_i64()?;
        Self::from_bytes_with_header(reader, header)
    }

    /// Parses the rest of a type definition whose header was already read.
    pub fn from_bytes_with_header(reader: &mut Reader, header: i64) -> Result<TypeDef, Error> {
        let size = Self::layer_size(reader, header)?;
        let mut layer = Reader::new(reader.read_bytes(size)?);
        let meta_header = layer.read_u8()?;
        let register_by_name = (meta_header & REGISTER_BY_NAME_FLAG) != 0;
        let mut num_fields = meta_header as usize & SMALL_NUM_FIELDS_THRESHOLD;
        if num_fields == SMALL_NUM_FIELDS_THRESHOLD {
            num_fields += layer.read_varuint32()? as usize;
        }
        let (user_type_id, namespace, type_name) = if register_by_name {
            let namespace = Self::read_name(&mut layer)?;
            let type_name = Self::read_name(&mut layer)?;
            (0, namespace, type_name)
        } else {
            (layer.read_varuint32()?, String::new(), String::new())
        };
        // every entry takes at least two bytes
        let mut fields = Vec::with_capacity(min(num_fields, layer.remaining() / 2));
        for _ in 0..num_fields {
            fields.push(FieldDef::from_bytes(&mut layer)?);
        }
        Ok(TypeDef {
            hash: header >> (64 - NUM_HASH_BITS),
            user_type_id,
            namespace,
            type_name,
            register_by_name,
            fields,
        })
    }

    #[inline(always)]
    pub fn skip_bytes(reader: &mut Reader, header: i64) -> Result<(), Error> {
        let size = Self::layer_size(reader, header)?;
        reader.skip(size)
    }

    /// Matches the remote fields of this definition against the local
    /// canonical fields of the same type.
    pub fn reconcile(&self, local: &[FieldInfo]) -> Reconciliation {
        let mut taken = vec![false; local.len()];
        let mut matched = Vec::with_capacity(self.fields.len());
        for remote in &self.fields {
            let found = local.iter().enumerate().position(|(i, field)| {
                !taken[i]
                    && match remote.tag_id {
                        Some(tag) => field.tag_id == Some(tag),
                        None => field.tag_id.is_none() && field.name == remote.name,
                    }
            });
            let slot = match found {
                Some(i) if local[i].field_type == remote.field_type => {
                    taken[i] = true;
                    Some(i)
                }
                Some(i) => {
                    log::warn!(
                        "field {} of {} changed type from {:?} to {:?}, skipping it",
                        remote.label(),
                        self.type_name,
                        remote.field_type,
                        local[i].field_type
                    );
                    None
                }
                None => None,
            };
            matched.push(slot);
        }
        let missing = (0..local.len()).filter(|i| !taken[*i]).collect();
        Reconciliation { matched, missing }
    }
}

/// Outcome of [`TypeDef::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// For every remote field, the index of the matching local field.
    pub matched: Vec<Option<usize>>,
    /// Local fields that the remote peer did not send.
    pub missing: Vec<usize>,
}
