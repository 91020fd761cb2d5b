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

//! Lists, sets and maps.
//!
//! A collection is its varuint32 length followed, when not empty, by one
//! element header byte (two for maps: keys then values) and the elements.

use crate::error::Error;
use crate::meta::ShapeKind;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::type_resolver::{NamedType, TypeResolver};
use crate::serializer::{read_ref_info_data, write_ref_info_data};
use crate::types::RefMode;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

pub const TRACKING_REF: u8 = 0b1;
pub const HAS_NULL: u8 = 0b10;
/// Elements carry no type info; both peers know it from the declaration.
pub const DECL_ELEMENT_TYPE: u8 = 0b100;

const HEADER_MASK: u8 = TRACKING_REF | HAS_NULL | DECL_ELEMENT_TYPE;

/// Whether values of `shape` can be written without type info.
fn is_declared(resolver: &TypeResolver, compatible: bool, shape: &ShapeKind) -> bool {
    match shape {
        ShapeKind::Primitive(_) | ShapeKind::List(_) | ShapeKind::Set(_) | ShapeKind::Map(..) => {
            true
        }
        ShapeKind::Named(name) if !compatible => match resolver.get_named(name) {
            Some(NamedType::Enum(_)) => true,
            Some(NamedType::Struct(meta)) => meta.user_type_id.is_some() && !meta.is_abstract,
            None => false,
        },
        _ => false,
    }
}

/// Whether values of `shape` may carry an identity worth tracking.
fn may_share(resolver: &TypeResolver, shape: &ShapeKind) -> bool {
    match shape {
        ShapeKind::Primitive(_) => false,
        ShapeKind::Named(name) => resolver.get_enum(name).is_none(),
        _ => true,
    }
}

fn element_header<'v>(
    context: &WriteContext,
    shape: Option<&ShapeKind>,
    values: impl Iterator<Item = &'v Value>,
) -> u8 {
    let config = context.config();
    let resolver = context.type_resolver();
    let mut header = 0;
    let declared = shape.is_some_and(|s| is_declared(resolver, config.compatible, s));
    if declared {
        header |= DECL_ELEMENT_TYPE;
    }
    if config.track_ref && shape.map_or(true, |s| may_share(resolver, s)) {
        header |= TRACKING_REF;
    }
    for value in values {
        if value.is_null() {
            header |= HAS_NULL;
            break;
        }
    }
    header
}

#[inline(always)]
fn ref_mode(header: u8) -> RefMode {
    RefMode::from_flags(header & HAS_NULL != 0, header & TRACKING_REF != 0)
}

fn element_shapes(shape: &ShapeKind) -> (Option<&ShapeKind>, Option<&ShapeKind>) {
    match shape {
        ShapeKind::List(e) | ShapeKind::Set(e) => (Some(e.as_ref()), None),
        ShapeKind::Map(k, v) => (Some(k.as_ref()), Some(v.as_ref())),
        _ => (None, None),
    }
}

fn write_element(
    context: &mut WriteContext,
    value: &Value,
    header: u8,
    shape: Option<&ShapeKind>,
) -> Result<(), Error> {
    let dynamic = ShapeKind::Dynamic;
    let declared = header & DECL_ELEMENT_TYPE != 0;
    write_ref_info_data(
        value,
        context,
        ref_mode(header),
        !declared,
        shape.unwrap_or(&dynamic),
    )
}

fn read_header(context: &mut ReadContext, shape: Option<&ShapeKind>) -> Result<u8, Error> {
    let header = context.reader.read_u8()?;
    if header & !HEADER_MASK != 0 {
        return Err(Error::invalid_data(format!(
            "invalid collection header {header:#04x}"
        )));
    }
    let declared = header & DECL_ELEMENT_TYPE != 0;
    if declared && matches!(shape, None | Some(ShapeKind::Dynamic)) {
        return Err(Error::invalid_data(
            "collection declares its element type but none is known locally",
        ));
    }
    Ok(header)
}

fn read_element(
    context: &mut ReadContext,
    header: u8,
    shape: Option<&ShapeKind>,
) -> Result<Value, Error> {
    let dynamic = ShapeKind::Dynamic;
    let declared = header & DECL_ELEMENT_TYPE != 0;
    read_ref_info_data(context, ref_mode(header), !declared, shape.unwrap_or(&dynamic))
}

pub fn write_collection(
    context: &mut WriteContext,
    items: &[Value],
    shape: &ShapeKind,
) -> Result<(), Error> {
    context.writer.write_varuint32(items.len() as u32);
    if items.is_empty() {
        return Ok(());
    }
    let (elem_shape, _) = element_shapes(shape);
    let header = element_header(context, elem_shape, items.iter());
    context.writer.write_u8(header);
    for item in items {
        write_element(context, item, header, elem_shape)?;
    }
    Ok(())
}

/// Reads a list or a set. The container is published to `slot` before its
/// elements are read so that elements may refer back to it.
pub fn read_collection(
    context: &mut ReadContext,
    is_set: bool,
    shape: &ShapeKind,
    slot: Option<u32>,
) -> Result<Value, Error> {
    let len = context.reader.read_varuint32()? as usize;
    context.config().limits.check_collection(len)?;
    let items = Rc::new(RefCell::new(Vec::with_capacity(
        len.min(context.reader.remaining()),
    )));
    let value = if is_set {
        Value::Set(items.clone())
    } else {
        Value::List(items.clone())
    };
    if let Some(slot) = slot {
        context.ref_reader.set_ref(slot, value.clone());
    }
    if len == 0 {
        return Ok(value);
    }
    let (elem_shape, _) = element_shapes(shape);
    let header = read_header(context, elem_shape)?;
    for _ in 0..len {
        let item = read_element(context, header, elem_shape)?;
        items.borrow_mut().push(item);
    }
    Ok(value)
}

pub fn write_map(
    context: &mut WriteContext,
    entries: &[(Value, Value)],
    shape: &ShapeKind,
) -> Result<(), Error> {
    context.writer.write_varuint32(entries.len() as u32);
    if entries.is_empty() {
        return Ok(());
    }
    let (key_shape, value_shape) = element_shapes(shape);
    let key_header = element_header(context, key_shape, entries.iter().map(|(k, _)| k));
    let value_header = element_header(context, value_shape, entries.iter().map(|(_, v)| v));
    context.writer.write_u8(key_header);
    context.writer.write_u8(value_header);
    for (key, value) in entries {
        write_element(context, key, key_header, key_shape)?;
        write_element(context, value, value_header, value_shape)?;
    }
    Ok(())
}

pub fn read_map(
    context: &mut ReadContext,
    shape: &ShapeKind,
    slot: Option<u32>,
) -> Result<Value, Error> {
    let len = context.reader.read_varuint32()? as usize;
    context.config().limits.check_map(len)?;
    let entries = Rc::new(RefCell::new(Vec::with_capacity(
        len.min(context.reader.remaining() / 2),
    )));
    let value = Value::Map(entries.clone());
    if let Some(slot) = slot {
        context.ref_reader.set_ref(slot, value.clone());
    }
    if len == 0 {
        return Ok(value);
    }
    let (key_shape, value_shape) = element_shapes(shape);
    let key_header = read_header(context, key_shape)?;
    let value_header = read_header(context, value_shape)?;
    for _ in 0..len {
        let key = read_element(context, key_header, key_shape)?;
        let item = read_element(context, value_header, value_shape)?;
        entries.borrow_mut().push((key, item));
    }
    Ok(value)
}
