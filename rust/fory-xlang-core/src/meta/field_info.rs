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

//! Declared record schemas and their resolved per-field metadata.
//!
//! A [`StructDescriptor`] is what a schema author hands to the registry. At
//! registration every declared field, inherited ones included, is resolved
//! once into a [`FieldInfo`] that the codec uses for the type's lifetime.

use crate::error::Error;
use crate::meta::type_def::FieldType;
use crate::meta::type_identity::{qualify, TypeNaming};
use crate::types::{
    is_polymorphic_type, RefMode, TypeId, BINARY, DATE, DURATION, FLOAT32, FLOAT64, LIST, MAP,
    SET, STRING, TIMESTAMP, UNKNOWN,
};
use crate::value::{integer_value, EnumValue, Value};
use chrono::{NaiveDate, NaiveDateTime};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Declared shape of a field or of a container element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// A built-in scalar: primitives, string, binary and temporals.
    Primitive(TypeId),
    List(Box<ShapeKind>),
    Set(Box<ShapeKind>),
    Map(Box<ShapeKind>, Box<ShapeKind>),
    /// A registered struct or enum, by qualified name.
    Named(String),
    /// Any value; its concrete type is written on the wire.
    Dynamic,
}

impl ShapeKind {
    pub fn list(element: ShapeKind) -> Self {
        ShapeKind::List(Box::new(element))
    }

    pub fn set(element: ShapeKind) -> Self {
        ShapeKind::Set(Box::new(element))
    }

    pub fn map(key: ShapeKind, value: ShapeKind) -> Self {
        ShapeKind::Map(Box::new(key), Box::new(value))
    }

    pub fn named(qualified_name: &str) -> Self {
        ShapeKind::Named(qualified_name.to_string())
    }
}

impl From<TypeId> for ShapeKind {
    fn from(type_id: TypeId) -> Self {
        ShapeKind::Primitive(type_id)
    }
}

/// A constant default for a field missing from a compatible payload.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Duration(chrono::Duration),
    /// Ordinal of an enum member.
    Enum(u32),
    EmptyList,
    EmptySet,
    EmptyMap,
}

impl DefaultValue {
    /// Converts the constant into a value of the declared shape.
    pub fn materialize(&self, shape: &ShapeKind) -> Result<Value, Error> {
        let mismatch = || {
            Error::type_error(format!(
                "default {self:?} does not match declared type {shape:?}"
            ))
        };
        let value = match (self, shape) {
            (DefaultValue::Bool(v), ShapeKind::Primitive(TypeId::BOOL) | ShapeKind::Dynamic) => {
                Value::Bool(*v)
            }
            (DefaultValue::Int(v), ShapeKind::Dynamic) => Value::Int64(*v),
            (DefaultValue::UInt(v), ShapeKind::Dynamic) => Value::UInt64(*v),
            (DefaultValue::Int(v), ShapeKind::Primitive(t)) => {
                Self::number(t.id(), *v as i128, *v as f64).ok_or_else(|| overflow(*v, *t))?
            }
            (DefaultValue::UInt(v), ShapeKind::Primitive(t)) => {
                Self::number(t.id(), *v as i128, *v as f64).ok_or_else(|| overflow(*v, *t))?
            }
            (DefaultValue::Float(v), ShapeKind::Primitive(TypeId::FLOAT32)) => {
                Value::Float32(*v as f32)
            }
            (
                DefaultValue::Float(v),
                ShapeKind::Primitive(TypeId::FLOAT64) | ShapeKind::Dynamic,
            ) => Value::Float64(*v),
            (
                DefaultValue::String(v),
                ShapeKind::Primitive(TypeId::STRING) | ShapeKind::Dynamic,
            ) => Value::String(v.clone()),
            (
                DefaultValue::Binary(v),
                ShapeKind::Primitive(TypeId::BINARY) | ShapeKind::Dynamic,
            ) => Value::Binary(v.clone()),
            (DefaultValue::Date(v), ShapeKind::Primitive(TypeId::DATE) | ShapeKind::Dynamic) => {
                Value::Date(*v)
            }
            (
                DefaultValue::Timestamp(v),
                ShapeKind::Primitive(TypeId::TIMESTAMP) | ShapeKind::Dynamic,
            ) => Value::Timestamp(*v),
            (
                DefaultValue::Duration(v),
                ShapeKind::Primitive(TypeId::DURATION) | ShapeKind::Dynamic,
            ) => Value::Duration(*v),
            (DefaultValue::Enum(ordinal), ShapeKind::Named(name)) => {
                Value::Enum(EnumValue::new(name, *ordinal))
            }
            (DefaultValue::EmptyList, ShapeKind::List(_) | ShapeKind::Dynamic) => {
                Value::list(Vec::new())
            }
            (DefaultValue::EmptySet, ShapeKind::Set(_) | ShapeKind::Dynamic) => {
                Value::set(Vec::new())
            }
            (DefaultValue::EmptyMap, ShapeKind::Map(..) | ShapeKind::Dynamic) => {
                Value::map(Vec::new())
            }
            _ => return Err(mismatch()),
        };
        Ok(value)
    }

    fn number(type_id: u32, int: i128, float: f64) -> Option<Value> {
        match type_id {
            FLOAT32 => Some(Value::Float32(float as f32)),
            FLOAT64 => Some(Value::Float64(float)),
            _ => integer_value(type_id, int),
        }
    }
}

fn overflow(v: impl fmt::Display, target: TypeId) -> Error {
    Error::overflow(format!("default {v} does not fit {target:?}"))
}

macro_rules! impl_default_from {
    ($($ty:ty => $variant:ident as $inner:ty),* $(,)?) => {
        $(
            impl From<$ty> for DefaultValue {
                fn from(v: $ty) -> Self {
                    DefaultValue::$variant(v as $inner)
                }
            }
        )*
    };
}

impl_default_from!(
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
);

impl From<bool> for DefaultValue {
    fn from(v: bool) -> Self {
        DefaultValue::Bool(v)
    }
}

impl From<&str> for DefaultValue {
    fn from(v: &str) -> Self {
        DefaultValue::String(v.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(v: String) -> Self {
        DefaultValue::String(v)
    }
}

impl From<NaiveDate> for DefaultValue {
    fn from(v: NaiveDate) -> Self {
        DefaultValue::Date(v)
    }
}

impl From<NaiveDateTime> for DefaultValue {
    fn from(v: NaiveDateTime) -> Self {
        DefaultValue::Timestamp(v)
    }
}

impl From<chrono::Duration> for DefaultValue {
    fn from(v: chrono::Duration) -> Self {
        DefaultValue::Duration(v)
    }
}

/// Produces a fresh default value each time a field is missing.
#[derive(Clone)]
pub struct DefaultFactory(Arc<dyn Fn() -> Value + Send + Sync>);

impl DefaultFactory {
    pub fn new(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        DefaultFactory(Arc::new(f))
    }

    pub fn produce(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for DefaultFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultFactory")
    }
}

/// One declared field.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) shape: ShapeKind,
    pub(crate) tag_id: Option<i16>,
    pub(crate) nullable: bool,
    pub(crate) ref_eligible: bool,
    pub(crate) dynamic: Option<bool>,
    pub(crate) default_value: Option<DefaultValue>,
    pub(crate) default_factory: Option<DefaultFactory>,
}

impl FieldDescriptor {
    pub fn new(name: &str, shape: impl Into<ShapeKind>) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            shape: shape.into(),
            tag_id: None,
            nullable: false,
            ref_eligible: false,
            dynamic: None,
            default_value: None,
            default_factory: None,
        }
    }

    /// Identifies the field on the wire by `tag` instead of its name.
    pub fn tag(mut self, tag: i16) -> Self {
        self.tag_id = Some(tag);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Marks the field as ref-eligible. It is ref tracked only when the
    /// codec also enables reference tracking.
    pub fn track_ref(mut self, track_ref: bool) -> Self {
        self.ref_eligible = track_ref;
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    pub fn default_value(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn default_with(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default_factory = Some(DefaultFactory::new(factory));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &ShapeKind {
        &self.shape
    }
}

/// A record type: its naming, optional parent and own fields.
#[derive(Clone, Debug)]
pub struct StructDescriptor {
    pub(crate) naming: TypeNaming,
    pub(crate) parent: Option<String>,
    pub(crate) is_abstract: bool,
    pub(crate) fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    pub fn new(namespace: &str, type_name: &str) -> Self {
        Self::from_naming(TypeNaming::new(namespace, type_name))
    }

    pub fn from_naming(naming: TypeNaming) -> Self {
        StructDescriptor {
            naming,
            parent: None,
            is_abstract: false,
            fields: Vec::new(),
        }
    }

    /// Inherits the fields of the registered struct `parent`.
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Fields declared with this type are always written with type info.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn naming(&self) -> &TypeNaming {
        &self.naming
    }

    pub fn qualified_name(&self) -> String {
        self.naming.qualified_name()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// An enum type, members listed in declaration order.
#[derive(Clone, Debug)]
pub struct EnumDescriptor {
    pub(crate) naming: TypeNaming,
    pub(crate) variants: Vec<String>,
}

impl EnumDescriptor {
    pub fn new(namespace: &str, type_name: &str, variants: &[&str]) -> Self {
        Self::from_naming(TypeNaming::new(namespace, type_name), variants)
    }

    pub fn from_naming(naming: TypeNaming, variants: &[&str]) -> Self {
        EnumDescriptor {
            naming,
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn qualified_name(&self) -> String {
        self.naming.qualified_name()
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

/// What the registry knows about a named type while fields are resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedTypeInfo {
    /// The wire kind, e.g. `STRUCT` or `NAMED_ENUM`.
    pub type_id: u32,
    pub registered_by_id: bool,
    pub is_abstract: bool,
}

/// Resolved metadata of one field, built once at registration.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: String,
    /// Position in the flattened declaration of the owning type.
    pub index: usize,
    pub declared_type: ShapeKind,
    pub tag_id: Option<i16>,
    pub nullable: bool,
    pub ref_eligible: bool,
    pub dynamic: bool,
    pub runtime_ref_tracking: bool,
    pub type_id: u32,
    pub declaring_type: String,
    pub field_type: FieldType,
    pub default_value: Option<DefaultValue>,
    pub default_factory: Option<DefaultFactory>,
}

impl FieldInfo {
    pub fn resolve(
        desc: &FieldDescriptor,
        index: usize,
        declaring_type: &str,
        lookup: &dyn Fn(&str) -> Option<NamedTypeInfo>,
        track_ref: bool,
    ) -> FieldInfo {
        let type_id = shape_type_id(&desc.shape, lookup);
        let dynamic = match &desc.shape {
            ShapeKind::Dynamic => true,
            ShapeKind::Named(name) => match lookup(name) {
                None => true,
                Some(info) if info.is_abstract => true,
                Some(info) => desc
                    .dynamic
                    .unwrap_or(is_polymorphic_type(info.type_id) && !info.registered_by_id),
            },
            _ => desc.dynamic.unwrap_or(false),
        };
        // a dynamic field carries its runtime type on the wire, so peers see it as UNKNOWN
        let field_type = if dynamic {
            FieldType {
                type_id: UNKNOWN,
                nullable: desc.nullable,
                track_ref: desc.ref_eligible,
                generics: Vec::new(),
            }
        } else {
            shape_field_type(&desc.shape, desc.nullable, desc.ref_eligible, lookup)
        };
        FieldInfo {
            name: desc.name.clone(),
            index,
            declared_type: desc.shape.clone(),
            tag_id: desc.tag_id,
            nullable: desc.nullable,
            ref_eligible: desc.ref_eligible,
            dynamic,
            runtime_ref_tracking: desc.ref_eligible && track_ref,
            type_id,
            declaring_type: declaring_type.to_string(),
            field_type,
            default_value: desc.default_value.clone(),
            default_factory: desc.default_factory.clone(),
        }
    }

    /// Ordering key shared by the classifier and the fingerprint: tagged
    /// fields first, compared by the tag's decimal text.
    pub fn sort_key(&self) -> (u8, Cow<'_, str>) {
        match self.tag_id {
            Some(tag) => (0, Cow::Owned(tag.to_string())),
            None => (1, Cow::Borrowed(self.name.as_str())),
        }
    }

    #[inline(always)]
    pub fn ref_mode(&self) -> RefMode {
        RefMode::from_flags(self.nullable, self.runtime_ref_tracking)
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some() || self.default_factory.is_some()
    }
}

/// Wire type id of a declared shape, `UNKNOWN` when a named type is not registered.
pub fn shape_type_id(shape: &ShapeKind, lookup: &dyn Fn(&str) -> Option<NamedTypeInfo>) -> u32 {
    match shape {
        ShapeKind::Primitive(t) => t.id(),
        ShapeKind::List(_) => LIST,
        ShapeKind::Set(_) => SET,
        ShapeKind::Map(..) => MAP,
        ShapeKind::Named(name) => lookup(name).map_or(UNKNOWN, |info| info.type_id),
        ShapeKind::Dynamic => UNKNOWN,
    }
}

fn shape_field_type(
    shape: &ShapeKind,
    nullable: bool,
    track_ref: bool,
    lookup: &dyn Fn(&str) -> Option<NamedTypeInfo>,
) -> FieldType {
    let generics = match shape {
        ShapeKind::List(e) | ShapeKind::Set(e) => {
            vec![shape_field_type(e, false, false, lookup)]
        }
        ShapeKind::Map(k, v) => vec![
            shape_field_type(k, false, false, lookup),
            shape_field_type(v, false, false, lookup),
        ],
        _ => Vec::new(),
    };
    FieldType {
        type_id: shape_type_id(shape, lookup),
        nullable,
        track_ref,
        generics,
    }
}

/// Whether `type_id` is a built-in a field may be declared with.
pub(crate) fn is_supported_primitive(type_id: TypeId) -> bool {
    match type_id {
        TypeId::FLOAT8 | TypeId::FLOAT16 | TypeId::BFLOAT16 => false,
        _ => {
            let id = type_id.id();
            crate::types::is_primitive_type(id)
                || matches!(id, STRING | BINARY | DATE | TIMESTAMP | DURATION)
        }
    }
}

/// Flattens an inheritance chain given from the most-ancestral type to the
/// most-derived one. A redefined name keeps its first position and takes the
/// most-derived definition.
pub fn flatten_fields<'a>(chain: &[&'a StructDescriptor]) -> Vec<(&'a FieldDescriptor, String)> {
    let mut flattened: Vec<(&'a FieldDescriptor, String)> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    for desc in chain {
        let declaring = qualify(&desc.naming.package, &desc.naming.type_name);
        for field in &desc.fields {
            match positions.get(field.name.as_str()) {
                Some(&pos) => flattened[pos] = (field, declaring.clone()),
                None => {
                    positions.insert(field.name.as_str(), flattened.len());
                    flattened.push((field, declaring.clone()));
                }
            }
        }
    }
    flattened
}

/// Resolves the flattened fields of an inheritance chain.
pub fn resolve_fields(
    chain: &[&StructDescriptor],
    lookup: &dyn Fn(&str) -> Option<NamedTypeInfo>,
    track_ref: bool,
) -> Vec<FieldInfo> {
    flatten_fields(chain)
        .into_iter()
        .enumerate()
        .map(|(index, (desc, declaring))| {
            FieldInfo::resolve(desc, index, &declaring, lookup, track_ref)
        })
        .collect()
}
