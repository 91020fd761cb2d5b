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

use crate::config::Config;
use crate::{ensure, not_allowed};
use crate::error::Error;
use crate::meta::{
    compute_struct_version, is_supported_primitive, qualify, resolve_fields, sort_fields,
    split_qualified, DefaultValue, EnumDescriptor, FieldDescriptor, FieldInfo, IdAssignment,
    NamedTypeInfo, ShapeKind, StructDescriptor, TypeDef, TypeIdAllocator,
};
use crate::serializer::struct_::FieldPlan;
use crate::types::{
    is_enum_type, COMPATIBLE_STRUCT, ENUM, NAMED_COMPATIBLE_STRUCT, NAMED_ENUM, NAMED_STRUCT,
    STRUCT, UNKNOWN,
};
use crate::value::Record;
use byteorder::{ByteOrder, LittleEndian};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Immutable metadata of one registered record type.
#[derive(Debug)]
pub struct StructMeta {
    pub qualified_name: String,
    pub namespace: String,
    pub type_name: String,
    /// Wire kind: one of the four struct kinds.
    pub type_id: u32,
    pub user_type_id: Option<u32>,
    pub is_abstract: bool,
    /// Fields in canonical order.
    pub fields: Vec<FieldInfo>,
    pub version_hash: i32,
    pub plan: FieldPlan,
    /// Encoded type definition, compatible mode only.
    pub type_def: Option<Vec<u8>>,
}

impl StructMeta {
    fn build(
        qualified_name: &str,
        user_type_id: Option<u32>,
        is_abstract: bool,
        fields: Vec<FieldInfo>,
        config: &Config,
    ) -> Result<StructMeta, Error> {
        let (namespace, type_name) = split_qualified(qualified_name);
        let version_hash = compute_struct_version(qualified_name, &fields)?;
        let fields = sort_fields(&fields);
        let type_def = if config.compatible {
            Some(TypeDef::new(user_type_id, namespace, type_name, &fields).to_bytes()?)
        } else {
            None
        };
        Ok(StructMeta {
            qualified_name: qualified_name.to_string(),
            namespace: namespace.to_string(),
            type_name: type_name.to_string(),
            type_id: struct_kind(user_type_id.is_some(), config.compatible),
            user_type_id,
            is_abstract,
            plan: FieldPlan::compile(&fields),
            fields,
            version_hash,
            type_def,
        })
    }

    /// Whether records of this type are written with a type definition.
    #[inline(always)]
    pub fn is_compatible(&self) -> bool {
        matches!(self.type_id, COMPATIBLE_STRUCT | NAMED_COMPATIBLE_STRUCT)
    }

    /// Header of the local type definition, equal to a remote header exactly
    /// when both peers describe the same layout.
    pub fn type_def_header(&self) -> Option<i64> {
        self.type_def
            .as_deref()
            .filter(|bytes| bytes.len() >= 8)
            .map(LittleEndian::read_i64)
    }
}

/// A registered enum.
#[derive(Debug)]
pub struct EnumMeta {
    pub qualified_name: String,
    pub namespace: String,
    pub type_name: String,
    /// `ENUM` or `NAMED_ENUM`.
    pub type_id: u32,
    pub user_type_id: Option<u32>,
    pub variants: Vec<String>,
}

/// What a named shape resolves to.
#[derive(Clone, Debug)]
pub enum NamedType {
    Struct(Arc<StructMeta>),
    Enum(Arc<EnumMeta>),
}

const fn struct_kind(by_id: bool, compatible: bool) -> u32 {
    match (by_id, compatible) {
        (true, false) => STRUCT,
        (true, true) => COMPATIBLE_STRUCT,
        (false, false) => NAMED_STRUCT,
        (false, true) => NAMED_COMPATIBLE_STRUCT,
    }
}

struct StructEntry {
    desc: StructDescriptor,
    user_type_id: Option<u32>,
    meta: Option<Arc<StructMeta>>,
}

/// Registry of the struct and enum types one `Fory` instance knows.
///
/// Metadata of every struct is recomputed whenever a type is registered, so a
/// struct may reference types registered after it.
#[derive(Default)]
pub struct TypeResolver {
    structs: HashMap<String, StructEntry>,
    enums: HashMap<String, Arc<EnumMeta>>,
    ids: TypeIdAllocator,
}

impl TypeResolver {
    pub fn register_struct(
        &mut self,
        user_type_id: Option<u32>,
        desc: StructDescriptor,
        config: &Config,
    ) -> Result<(), Error> {
        let name = desc.qualified_name();
        self.check_not_registered(&name)?;
        if let Some(id) = user_type_id {
            self.claim_id(id, &name)?;
        }
        self.structs.insert(
            name.clone(),
            StructEntry {
                desc,
                user_type_id,
                meta: None,
            },
        );
        if let Err(e) = self.rebuild(config) {
            self.structs.remove(&name);
            if let Some(id) = user_type_id {
                self.ids.release(id);
            }
            self.rebuild(config)?;
            return Err(e);
        }
        log::debug!(
            "registered struct {} {}",
            name,
            user_type_id.map_or_else(|| "by name".to_string(), |id| format!("with id {id}"))
        );
        Ok(())
    }

    /// Registers a struct under the id derived from its naming.
    pub fn register_struct_auto(
        &mut self,
        desc: StructDescriptor,
        config: &Config,
    ) -> Result<IdAssignment, Error> {
        if let Some(id) = desc.naming.explicit_id {
            self.register_struct(Some(id), desc, config)?;
            return Ok(IdAssignment::Explicit(id));
        }
        self.check_not_registered(&desc.qualified_name())?;
        let assignment = self.ids.assign(&desc.naming);
        // the assigned id is owned by this type already, so claiming it again succeeds
        if let Err(e) = self.register_struct(assignment.type_id(), desc, config) {
            if let Some(id) = assignment.type_id() {
                self.ids.release(id);
            }
            return Err(e);
        }
        Ok(assignment)
    }

    pub fn register_enum(
        &mut self,
        user_type_id: Option<u32>,
        desc: EnumDescriptor,
        config: &Config,
    ) -> Result<(), Error> {
        let name = desc.qualified_name();
        self.check_not_registered(&name)?;
        ensure!(
            !desc.variants.is_empty(),
            Error::not_allowed(format!("enum {name} has no members"))
        );
        if let Some(id) = user_type_id {
            self.claim_id(id, &name)?;
        }
        let (namespace, type_name) = desc.naming.registration_name();
        let meta = EnumMeta {
            qualified_name: name.clone(),
            namespace: namespace.to_string(),
            type_name: type_name.to_string(),
            type_id: if user_type_id.is_some() { ENUM } else { NAMED_ENUM },
            user_type_id,
            variants: desc.variants,
        };
        self.enums.insert(name.clone(), Arc::new(meta));
        if let Err(e) = self.rebuild(config) {
            self.enums.remove(&name);
            if let Some(id) = user_type_id {
                self.ids.release(id);
            }
            self.rebuild(config)?;
            return Err(e);
        }
        log::debug!("registered enum {name}");
        Ok(())
    }

    pub fn register_enum_auto(
        &mut self,
        desc: EnumDescriptor,
        config: &Config,
    ) -> Result<IdAssignment, Error> {
        if let Some(id) = desc.naming.explicit_id {
            self.register_enum(Some(id), desc, config)?;
            return Ok(IdAssignment::Explicit(id));
        }
        self.check_not_registered(&desc.qualified_name())?;
        let assignment = self.ids.assign(&desc.naming);
        if let Err(e) = self.register_enum(assignment.type_id(), desc, config) {
            if let Some(id) = assignment.type_id() {
                self.ids.release(id);
            }
            return Err(e);
        }
        Ok(assignment)
    }

    fn check_not_registered(&self, name: &str) -> Result<(), Error> {
        if self.structs.contains_key(name) || self.enums.contains_key(name) {
            not_allowed!("type {} is already registered", name);
        }
        Ok(())
    }

    fn claim_id(&mut self, id: u32, name: &str) -> Result<(), Error> {
        self.ids.claim(id, name).map_err(|owner| {
            Error::not_allowed(format!(
                "type id {id} of {name} is already used by {owner}"
            ))
        })
    }

    /// Recomputes the metadata of every registered struct under `config`.
    pub fn rebuild(&mut self, config: &Config) -> Result<(), Error> {
        let mut built = Vec::with_capacity(self.structs.len());
        for (name, entry) in &self.structs {
            built.push((name.clone(), Arc::new(self.build_struct(name, entry, config)?)));
        }
        for (name, meta) in built {
            if let Some(entry) = self.structs.get_mut(&name) {
                entry.meta = Some(meta);
            }
        }
        Ok(())
    }

    fn build_struct(
        &self,
        name: &str,
        entry: &StructEntry,
        config: &Config,
    ) -> Result<StructMeta, Error> {
        let mut chain = vec![&entry.desc];
        let mut parent = entry.desc.parent.as_deref();
        while let Some(parent_name) = parent {
            if chain.len() > self.structs.len() {
                return Err(Error::type_error(format!(
                    "inheritance chain of {name} contains a cycle"
                )));
            }
            let parent_entry = self.structs.get(parent_name).ok_or_else(|| {
                Error::type_error(format!(
                    "parent {parent_name} of {name} must be registered first"
                ))
            })?;
            chain.push(&parent_entry.desc);
            parent = parent_entry.desc.parent.as_deref();
        }
        chain.reverse();
        for desc in &chain {
            for field in &desc.fields {
                validate_descriptor(name, field)?;
            }
        }

        let lookup = |n: &str| self.named_info(n, config.compatible);
        let fields = resolve_fields(&chain, &lookup, config.track_ref);
        let mut tags = HashSet::new();
        for field in &fields {
            if let Some(tag) = field.tag_id {
                if !tags.insert(tag) {
                    return Err(Error::not_allowed(format!(
                        "tag {tag} is used by more than one field of {name}"
                    )));
                }
            }
            self.validate_default(name, field, config)?;
        }
        StructMeta::build(
            name,
            entry.user_type_id,
            entry.desc.is_abstract,
            fields,
            config,
        )
    }

    fn validate_default(&self, owner: &str, field: &FieldInfo, config: &Config) -> Result<(), Error> {
        if let Some(default) = &field.default_value {
            default.materialize(&field.declared_type)?;
            if let (DefaultValue::Enum(ordinal), ShapeKind::Named(enum_name)) =
                (default, &field.declared_type)
            {
                if let Some(meta) = self.enums.get(enum_name) {
                    if *ordinal as usize >= meta.variants.len() {
                        return Err(Error::not_allowed(format!(
                            "default ordinal {ordinal} of field {} in {owner} is not a member of {enum_name}",
                            field.name
                        )));
                    }
                }
            }
        }
        let needs_default = config.compatible
            && !field.nullable
            && !field.has_default()
            && !is_enum_type(field.type_id)
            && !matches!(field.declared_type, ShapeKind::Named(_) if field.type_id == UNKNOWN);
        if needs_default {
            return Err(Error::type_error(format!(
                "field {} of {owner} is neither nullable nor has a default, so it cannot be \
                 filled when a compatible payload omits it",
                field.name
            )));
        }
        Ok(())
    }

    fn named_info(&self, name: &str, compatible: bool) -> Option<NamedTypeInfo> {
        if let Some(entry) = self.structs.get(name) {
            return Some(NamedTypeInfo {
                type_id: struct_kind(entry.user_type_id.is_some(), compatible),
                registered_by_id: entry.user_type_id.is_some(),
                is_abstract: entry.desc.is_abstract,
            });
        }
        self.enums.get(name).map(|meta| NamedTypeInfo {
            type_id: meta.type_id,
            registered_by_id: meta.user_type_id.is_some(),
            is_abstract: false,
        })
    }

    /// Metadata of the record type `type_name`.
    pub fn resolve_record(&self, type_name: &str) -> Result<Arc<StructMeta>, Error> {
        self.get_struct(type_name).cloned().ok_or_else(|| {
            Error::type_unregistered(format!("record type {type_name} is not registered"))
        })
    }

    #[inline(always)]
    pub fn get_struct(&self, qualified_name: &str) -> Option<&Arc<StructMeta>> {
        self.structs
            .get(qualified_name)
            .and_then(|entry| entry.meta.as_ref())
    }

    #[inline(always)]
    pub fn get_enum(&self, qualified_name: &str) -> Option<&Arc<EnumMeta>> {
        self.enums.get(qualified_name)
    }

    pub fn get_named(&self, qualified_name: &str) -> Option<NamedType> {
        if let Some(meta) = self.get_struct(qualified_name) {
            return Some(NamedType::Struct(meta.clone()));
        }
        self.get_enum(qualified_name)
            .map(|meta| NamedType::Enum(meta.clone()))
    }

    pub fn get_by_id(&self, user_type_id: u32) -> Option<NamedType> {
        self.ids
            .owner(user_type_id)
            .and_then(|name| self.get_named(name))
    }

    pub fn get_by_name(&self, namespace: &str, type_name: &str) -> Option<NamedType> {
        self.get_named(&qualify(namespace, type_name))
    }

    /// Metadata for a record whose type was never registered: every field is
    /// dynamic and nullable, and the type is written by name.
    pub fn adhoc_struct(&self, record: &Record, config: &Config) -> Result<StructMeta, Error> {
        let name = record.type_name();
        let desc = record.fields().fold(
            StructDescriptor::new("", name),
            |desc, (field, _)| desc.field(FieldDescriptor::new(field, ShapeKind::Dynamic).nullable(true)),
        );
        let lookup = |n: &str| self.named_info(n, config.compatible);
        let fields = resolve_fields(&[&desc], &lookup, config.track_ref);
        StructMeta::build(name, None, false, fields, config)
    }
}

fn validate_descriptor(owner: &str, field: &FieldDescriptor) -> Result<(), Error> {
    if let Some(tag) = field.tag_id {
        if tag < 0 {
            return Err(Error::not_allowed(format!(
                "field {} of {owner} has negative tag {tag}",
                field.name
            )));
        }
    }
    validate_shape(owner, &field.name, &field.shape)
}

fn validate_shape(owner: &str, field: &str, shape: &ShapeKind) -> Result<(), Error> {
    match shape {
        ShapeKind::Primitive(t) if !is_supported_primitive(*t) => Err(Error::not_allowed(
            format!("field {field} of {owner} uses unsupported type {t:?}"),
        )),
        ShapeKind::List(e) | ShapeKind::Set(e) => validate_shape(owner, field, e),
        ShapeKind::Map(k, v) => {
            validate_shape(owner, field, k)?;
            validate_shape(owner, field, v)
        }
        _ => Ok(()),
    }
}
