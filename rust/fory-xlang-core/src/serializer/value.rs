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

//! Encoding of single values: built-in kinds, enums and type info.

use crate::error::Error;
use crate::meta::{qualify, split_qualified, ShapeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::meta_resolver::RemoteStruct;
use crate::resolver::type_resolver::{EnumMeta, NamedType, StructMeta};
use crate::serializer::{collection, struct_};
use crate::types::{
    BINARY, BOOL, COMPATIBLE_STRUCT, DATE, DURATION, ENUM, FLOAT32, FLOAT64, INT16, INT32, INT64,
    INT8, LIST, MAP, NAMED_COMPATIBLE_STRUCT, NAMED_ENUM, NAMED_STRUCT, SET, STRING, STRUCT,
    TAGGED_INT64, TAGGED_UINT64, TIMESTAMP, UINT16, UINT32, UINT64, UINT8, VARINT32, VARINT64,
    VAR_UINT32, VAR_UINT64,
};
use crate::util::{EPOCH, EPOCH_DATETIME};
use crate::value::{integer_value, EnumValue, Value};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::sync::Arc;

/// What follows on the wire once a value's type is known.
#[derive(Clone, Debug)]
pub enum WireType {
    Builtin(u32),
    Struct { meta: Arc<StructMeta>, strict: bool },
    Remote(Arc<RemoteStruct>),
    Enum { type_name: String, variants: Option<usize> },
}

/// Wire type id a value is written with when nothing declares it.
pub fn infer_type_id(value: &Value) -> Option<u32> {
    Some(match value {
        Value::Bool(_) => BOOL,
        Value::Int8(_) => INT8,
        Value::Int16(_) => INT16,
        Value::Int32(_) => VARINT32,
        Value::Int64(_) => VARINT64,
        Value::UInt8(_) => UINT8,
        Value::UInt16(_) => UINT16,
        Value::UInt32(_) => VAR_UINT32,
        Value::UInt64(_) => VAR_UINT64,
        Value::Float32(_) => FLOAT32,
        Value::Float64(_) => FLOAT64,
        Value::String(_) => STRING,
        Value::Binary(_) => BINARY,
        Value::Date(_) => DATE,
        Value::Timestamp(_) => TIMESTAMP,
        Value::Duration(_) => DURATION,
        Value::List(_) => LIST,
        Value::Set(_) => SET,
        Value::Map(_) => MAP,
        Value::Null | Value::Enum(_) | Value::Record(_) => return None,
    })
}

fn enum_wire(meta: &EnumMeta) -> WireType {
    WireType::Enum {
        type_name: meta.qualified_name.clone(),
        variants: Some(meta.variants.len()),
    }
}

/// Writes the type info of `value` and returns how its data is encoded.
pub fn write_type_info(context: &mut WriteContext, value: &Value) -> Result<WireType, Error> {
    match value {
        Value::Record(record) => {
            let meta = context.record_meta(&record.borrow())?;
            context.writer.write_u8(meta.type_id as u8);
            match meta.type_id {
                STRUCT => context
                    .writer
                    .write_varuint32(meta.user_type_id.unwrap_or_default()),
                NAMED_STRUCT => {
                    context.writer.write_utf8_string(&meta.namespace);
                    context.writer.write_utf8_string(&meta.type_name);
                }
                _ => context.write_type_meta(&meta)?,
            }
            let strict = matches!(meta.type_id, STRUCT | NAMED_STRUCT);
            Ok(WireType::Struct { meta, strict })
        }
        Value::Enum(e) => {
            let resolver = context.type_resolver();
            match resolver.get_enum(&e.type_name) {
                Some(meta) => {
                    context.writer.write_u8(meta.type_id as u8);
                    match meta.user_type_id {
                        Some(id) => context.writer.write_varuint32(id),
                        None => {
                            context.writer.write_utf8_string(&meta.namespace);
                            context.writer.write_utf8_string(&meta.type_name);
                        }
                    }
                    Ok(enum_wire(meta))
                }
                None if !context.config().require_type_registration => {
                    let (namespace, type_name) = split_qualified(&e.type_name);
                    context.writer.write_u8(NAMED_ENUM as u8);
                    context.writer.write_utf8_string(namespace);
                    context.writer.write_utf8_string(type_name);
                    Ok(WireType::Enum {
                        type_name: e.type_name.clone(),
                        variants: None,
                    })
                }
                None => Err(Error::type_unregistered(format!(
                    "enum type {} is not registered",
                    e.type_name
                ))),
            }
        }
        _ => {
            let type_id = infer_type_id(value)
                .ok_or_else(|| Error::type_error("null value has no type info"))?;
            context.writer.write_u8(type_id as u8);
            Ok(WireType::Builtin(type_id))
        }
    }
}

fn read_name(context: &mut ReadContext) -> Result<(String, String), Error> {
    let namespace = read_string(context)?;
    let type_name = read_string(context)?;
    Ok((namespace, type_name))
}

fn named_wire(named: Option<NamedType>, name: &str, lenient: bool) -> Result<WireType, Error> {
    match named {
        Some(NamedType::Struct(meta)) if meta.is_compatible() => Err(Error::type_error(format!(
            "{} is registered for compatible mode but was written in strict mode",
            meta.qualified_name
        ))),
        Some(NamedType::Struct(meta)) => Ok(WireType::Struct { meta, strict: true }),
        Some(NamedType::Enum(meta)) => Ok(enum_wire(&meta)),
        None if lenient => Ok(WireType::Enum {
            type_name: name.to_string(),
            variants: None,
        }),
        None => Err(Error::type_unregistered(format!(
            "type {name} is not registered"
        ))),
    }
}

/// Reads type info and returns how the data that follows is decoded.
pub fn read_type_info(context: &mut ReadContext) -> Result<WireType, Error> {
    let type_id = context.reader.read_u8()? as u32;
    let lenient = !context.config().require_type_registration;
    let wire = match type_id {
        STRUCT | ENUM => {
            let user_id = context.reader.read_varuint32()?;
            let named = context.type_resolver().get_by_id(user_id);
            let name = format!("type#{user_id}");
            named_wire(named, &name, lenient && type_id == ENUM)?
        }
        NAMED_STRUCT | NAMED_ENUM => {
            let (namespace, type_name) = read_name(context)?;
            let named = context.type_resolver().get_by_name(&namespace, &type_name);
            let name = qualify(&namespace, &type_name);
            named_wire(named, &name, lenient && type_id == NAMED_ENUM)?
        }
        COMPATIBLE_STRUCT | NAMED_COMPATIBLE_STRUCT => {
            let remote = context.read_type_meta()?;
            if remote.local.is_none() && !lenient {
                return Err(Error::type_unregistered(format!(
                    "type {} is not registered",
                    remote.type_name
                )));
            }
            WireType::Remote(remote)
        }
        _ if infer_builtin(type_id) => WireType::Builtin(type_id),
        _ => {
            return Err(Error::invalid_data(format!(
                "unsupported type id {type_id} in type info"
            )))
        }
    };
    // a kind that disagrees with the registered type is malformed input
    match (&wire, type_id) {
        (WireType::Struct { meta, .. }, ENUM | NAMED_ENUM) => Err(Error::type_error(format!(
            "enum type info refers to struct {}",
            meta.qualified_name
        ))),
        (WireType::Enum { type_name, .. }, STRUCT | NAMED_STRUCT) => Err(Error::type_error(
            format!("struct type info refers to enum {type_name}"),
        )),
        _ => Ok(wire),
    }
}

fn infer_builtin(type_id: u32) -> bool {
    matches!(
        type_id,
        BOOL | INT8
            | INT16
            | INT32
            | VARINT32
            | INT64
            | VARINT64
            | TAGGED_INT64
            | UINT8
            | UINT16
            | UINT32
            | VAR_UINT32
            | UINT64
            | VAR_UINT64
            | TAGGED_UINT64
            | FLOAT32
            | FLOAT64
            | STRING
            | BINARY
            | DATE
            | TIMESTAMP
            | DURATION
            | LIST
            | SET
            | MAP
    )
}

/// Wire type of a value whose declared shape stands in for type info.
pub fn declared_wire_type(
    resolver: &crate::resolver::type_resolver::TypeResolver,
    shape: &ShapeKind,
) -> Result<WireType, Error> {
    match shape {
        ShapeKind::Primitive(t) => Ok(WireType::Builtin(t.id())),
        ShapeKind::List(_) => Ok(WireType::Builtin(LIST)),
        ShapeKind::Set(_) => Ok(WireType::Builtin(SET)),
        ShapeKind::Map(..) => Ok(WireType::Builtin(MAP)),
        ShapeKind::Named(name) => match resolver.get_named(name) {
            Some(NamedType::Struct(meta)) => Ok(WireType::Struct { meta, strict: true }),
            Some(NamedType::Enum(meta)) => Ok(enum_wire(&meta)),
            None => Err(Error::type_unregistered(format!(
                "type {name} is not registered"
            ))),
        },
        ShapeKind::Dynamic => Err(Error::invalid_data(
            "a dynamic value must be preceded by its type info",
        )),
    }
}

/// Writes type info when asked to, then the data of `value`.
pub fn write_value(
    context: &mut WriteContext,
    value: &Value,
    with_type_info: bool,
    shape: &ShapeKind,
) -> Result<(), Error> {
    let wire = if with_type_info {
        write_type_info(context, value)?
    } else {
        declared_wire_type(context.type_resolver(), shape)?
    };
    write_data(context, value, &wire, shape)
}

pub fn read_value(
    context: &mut ReadContext,
    with_type_info: bool,
    shape: &ShapeKind,
    slot: Option<u32>,
) -> Result<Value, Error> {
    let wire = if with_type_info {
        read_type_info(context)?
    } else {
        declared_wire_type(context.type_resolver(), shape)?
    };
    read_data(context, &wire, shape, slot)
}

fn mismatch(expected: &str, value: &Value) -> Error {
    Error::type_error(format!("expected {expected} but got {}", value.kind_name()))
}

pub fn write_data(
    context: &mut WriteContext,
    value: &Value,
    wire: &WireType,
    shape: &ShapeKind,
) -> Result<(), Error> {
    match wire {
        WireType::Builtin(type_id) => write_builtin(context, *type_id, value, shape),
        WireType::Struct { meta, strict } => {
            let Value::Record(record) = value else {
                return Err(mismatch(&meta.qualified_name, value));
            };
            if record.borrow().type_name() != meta.qualified_name {
                return Err(Error::type_error(format!(
                    "expected a record of {} but got {}",
                    meta.qualified_name,
                    record.borrow().type_name()
                )));
            }
            context.inc_depth()?;
            struct_::write_struct(context, meta, *strict, record)?;
            context.dec_depth();
            Ok(())
        }
        WireType::Remote(remote) => Err(Error::type_error(format!(
            "type definition of {} is read only",
            remote.type_name
        ))),
        WireType::Enum {
            type_name,
            variants,
        } => {
            let Value::Enum(e) = value else {
                return Err(mismatch(type_name, value));
            };
            if let Some(count) = variants {
                if e.ordinal as usize >= *count {
                    return Err(Error::unknown_enum(format!(
                        "ordinal {} is not a member of {type_name}",
                        e.ordinal
                    )));
                }
            }
            context.writer.write_varuint32(e.ordinal);
            Ok(())
        }
    }
}

pub fn read_data(
    context: &mut ReadContext,
    wire: &WireType,
    shape: &ShapeKind,
    slot: Option<u32>,
) -> Result<Value, Error> {
    match wire {
        WireType::Builtin(type_id) => read_builtin(context, *type_id, shape, slot),
        WireType::Struct { meta, strict } => {
            context.inc_depth()?;
            let value = struct_::read_struct(context, meta, *strict, slot)?;
            context.dec_depth();
            Ok(value)
        }
        WireType::Remote(remote) => {
            context.inc_depth()?;
            let value = struct_::read_compatible(context, remote, slot)?;
            context.dec_depth();
            Ok(value)
        }
        WireType::Enum {
            type_name,
            variants,
        } => {
            let ordinal = context.reader.read_varuint32()?;
            if let Some(count) = variants {
                if ordinal as usize >= *count {
                    return Err(Error::unknown_enum(format!(
                        "ordinal {ordinal} is not a member of {type_name}"
                    )));
                }
            }
            Ok(Value::Enum(EnumValue::new(type_name, ordinal)))
        }
    }
}

#[inline(always)]
fn integer(type_id: u32, value: &Value) -> Result<Value, Error> {
    let v = value
        .as_integer()
        .ok_or_else(|| mismatch("an integer", value))?;
    integer_value(type_id, v).ok_or_else(|| {
        Error::overflow(format!(
            "value {v} does not fit {}",
            crate::types::type_name(type_id)
        ))
    })
}

/// Converts `value` into the variant stored for the fixed-width kind
/// `type_id`, rejecting values that do not fit.
pub(crate) fn coerce_fixed(type_id: u32, value: &Value) -> Result<Value, Error> {
    match type_id {
        BOOL => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(mismatch("bool", value)),
        },
        FLOAT32 => match value {
            Value::Float32(_) => Ok(value.clone()),
            _ => Err(mismatch("float32", value)),
        },
        FLOAT64 => match value {
            Value::Float64(_) => Ok(value.clone()),
            Value::Float32(v) => Ok(Value::Float64(*v as f64)),
            _ => Err(mismatch("float64", value)),
        },
        _ => integer(type_id, value),
    }
}

fn write_builtin(
    context: &mut WriteContext,
    type_id: u32,
    value: &Value,
    shape: &ShapeKind,
) -> Result<(), Error> {
    let writer = &mut *context.writer;
    match (type_id, value) {
        (STRING, Value::String(s)) => writer.write_utf8_string(s),
        (BINARY, Value::Binary(b)) => writer.write_binary(b),
        (DATE, Value::Date(d)) => {
            let days = d.signed_duration_since(EPOCH).num_days();
            let days = i32::try_from(days)
                .map_err(|_| Error::overflow(format!("date {d} does not fit int32 days")))?;
            writer.write_i32(days);
        }
        (TIMESTAMP, Value::Timestamp(t)) => {
            let micros = t
                .signed_duration_since(EPOCH_DATETIME)
                .num_microseconds()
                .ok_or_else(|| {
                    Error::overflow(format!("timestamp {t} does not fit int64 microseconds"))
                })?;
            writer.write_i64(micros);
        }
        (DURATION, Value::Duration(d)) => {
            writer.write_varint64(d.num_seconds());
            writer.write_i32(d.subsec_nanos());
        }
        (LIST, Value::List(items)) | (SET, Value::Set(items)) => {
            context.inc_depth()?;
            collection::write_collection(context, &items.borrow(), shape)?;
            context.dec_depth();
        }
        (MAP, Value::Map(entries)) => {
            context.inc_depth()?;
            collection::write_map(context, &entries.borrow(), shape)?;
            context.dec_depth();
        }
        (STRING | BINARY | DATE | TIMESTAMP | DURATION | LIST | SET | MAP, _) => {
            return Err(mismatch(crate::types::type_name(type_id), value));
        }
        _ => {
            let v = coerce_fixed(type_id, value)?;
            write_scalar(writer, type_id, &v)?;
        }
    }
    Ok(())
}

/// Writes a value already coerced by [`coerce_fixed`].
fn write_scalar(writer: &mut crate::buffer::Writer, type_id: u32, v: &Value) -> Result<(), Error> {
    match (type_id, v) {
        (BOOL, Value::Bool(v)) => writer.write_bool(*v),
        (INT8, Value::Int8(v)) => writer.write_i8(*v),
        (INT16, Value::Int16(v)) => writer.write_i16(*v),
        (INT32, Value::Int32(v)) => writer.write_i32(*v),
        (VARINT32, Value::Int32(v)) => writer.write_varint32(*v),
        (INT64, Value::Int64(v)) => writer.write_i64(*v),
        (VARINT64, Value::Int64(v)) => writer.write_varint64(*v),
        (TAGGED_INT64, Value::Int64(v)) => writer.write_tagged_int64(*v),
        (UINT8, Value::UInt8(v)) => writer.write_u8(*v),
        (UINT16, Value::UInt16(v)) => writer.write_u16(*v),
        (UINT32, Value::UInt32(v)) => writer.write_u32(*v),
        (VAR_UINT32, Value::UInt32(v)) => writer.write_varuint32(*v),
        (UINT64, Value::UInt64(v)) => writer.write_u64(*v),
        (VAR_UINT64, Value::UInt64(v)) => writer.write_varuint64(*v),
        (TAGGED_UINT64, Value::UInt64(v)) => writer.write_tagged_uint64(*v),
        (FLOAT32, Value::Float32(v)) => writer.write_f32(*v),
        (FLOAT64, Value::Float64(v)) => writer.write_f64(*v),
        _ => {
            return Err(Error::unsupported(format!(
                "type id {type_id} cannot be written as a scalar"
            )))
        }
    }
    Ok(())
}

/// Reads a string after checking its declared byte length.
pub fn read_string(context: &mut ReadContext) -> Result<String, Error> {
    let (encoding, len) = context.reader.read_string_header()?;
    context.config().limits.check_string(len)?;
    context.reader.read_string_payload(encoding, len)
}

fn read_builtin(
    context: &mut ReadContext,
    type_id: u32,
    shape: &ShapeKind,
    slot: Option<u32>,
) -> Result<Value, Error> {
    let reader = &mut context.reader;
    let value = match type_id {
        BOOL => Value::Bool(reader.read_bool()?),
        INT8 => Value::Int8(reader.read_i8()?),
        INT16 => Value::Int16(reader.read_i16()?),
        INT32 => Value::Int32(reader.read_i32()?),
        VARINT32 => Value::Int32(reader.read_varint32()?),
        INT64 => Value::Int64(reader.read_i64()?),
        VARINT64 => Value::Int64(reader.read_varint64()?),
        TAGGED_INT64 => Value::Int64(reader.read_tagged_int64()?),
        UINT8 => Value::UInt8(reader.read_u8()?),
        UINT16 => Value::UInt16(reader.read_u16()?),
        UINT32 => Value::UInt32(reader.read_u32()?),
        VAR_UINT32 => Value::UInt32(reader.read_varuint32()?),
        UINT64 => Value::UInt64(reader.read_u64()?),
        VAR_UINT64 => Value::UInt64(reader.read_varuint64()?),
        TAGGED_UINT64 => Value::UInt64(reader.read_tagged_uint64()?),
        FLOAT32 => Value::Float32(reader.read_f32()?),
        FLOAT64 => Value::Float64(reader.read_f64()?),
        STRING => Value::String(read_string(context)?),
        BINARY => {
            let len = reader.read_varuint32()? as usize;
            context.config().limits.check_binary(len)?;
            Value::Binary(context.reader.read_bytes(len)?.to_vec())
        }
        DATE => Value::Date(date_from_days(reader.read_i32()?)?),
        TIMESTAMP => Value::Timestamp(timestamp_from_micros(reader.read_i64()?)?),
        DURATION => {
            let seconds = reader.read_varint64()?;
            let nanos = reader.read_i32()?;
            Value::Duration(duration_from_parts(seconds, nanos)?)
        }
        LIST | SET => {
            context.inc_depth()?;
            let value = collection::read_collection(context, type_id == SET, shape, slot)?;
            context.dec_depth();
            value
        }
        MAP => {
            context.inc_depth()?;
            let value = collection::read_map(context, shape, slot)?;
            context.dec_depth();
            value
        }
        _ => {
            return Err(Error::unsupported(format!(
                "type id {type_id} cannot be read as a built-in value"
            )))
        }
    };
    Ok(value)
}

/// Decodes one fixed-width scalar from `bytes`, which holds exactly its width.
pub(crate) fn read_scalar(type_id: u32, bytes: &[u8]) -> Result<Value, Error> {
    let mut reader = crate::buffer::Reader::new(bytes);
    Ok(match type_id {
        BOOL => Value::Bool(reader.read_bool()?),
        INT8 => Value::Int8(reader.read_i8()?),
        INT16 => Value::Int16(reader.read_i16()?),
        INT32 => Value::Int32(reader.read_i32()?),
        INT64 => Value::Int64(reader.read_i64()?),
        UINT8 => Value::UInt8(reader.read_u8()?),
        UINT16 => Value::UInt16(reader.read_u16()?),
        UINT32 => Value::UInt32(reader.read_u32()?),
        UINT64 => Value::UInt64(reader.read_u64()?),
        FLOAT32 => Value::Float32(reader.read_f32()?),
        FLOAT64 => Value::Float64(reader.read_f64()?),
        _ => {
            return Err(Error::unsupported(format!(
                "type id {type_id} is not a fixed-width scalar"
            )))
        }
    })
}

fn date_from_days(days: i32) -> Result<NaiveDate, Error> {
    EPOCH
        .checked_add_signed(TimeDelta::days(days as i64))
        .ok_or_else(|| Error::invalid_data(format!("date {days} days from epoch is out of range")))
}

fn timestamp_from_micros(micros: i64) -> Result<NaiveDateTime, Error> {
    EPOCH_DATETIME
        .checked_add_signed(TimeDelta::microseconds(micros))
        .ok_or_else(|| Error::invalid_data(format!("timestamp {micros}us is out of range")))
}

fn duration_from_parts(seconds: i64, nanos: i32) -> Result<TimeDelta, Error> {
    if nanos.unsigned_abs() >= 1_000_000_000 {
        return Err(Error::invalid_data(format!(
            "duration nanoseconds {nanos} out of range"
        )));
    }
    TimeDelta::try_seconds(seconds)
        .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos as i64)))
        .ok_or_else(|| Error::invalid_data(format!("duration of {seconds}s is out of range")))
}
