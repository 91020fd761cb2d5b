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

//! Record payloads and the two strategies that walk their fields.
//!
//! A record's data is its version hash (strict kinds only) followed by its
//! fields in canonical order. Both strategies emit identical bytes; the
//! compiled one writes runs of fixed-width primitives into a single reserved
//! block.

use crate::error::Error;
use crate::meta::{check_struct_version, FieldInfo, ShapeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::meta_resolver::RemoteStruct;
use crate::resolver::type_resolver::StructMeta;
use crate::serializer::value::{coerce_fixed, read_scalar};
use crate::serializer::{read_ref_info_data, write_ref_info_data};
use crate::types::{
    is_enum_type, primitive_type_size, RefMode, BOOL, FLOAT32, FLOAT64, INT16, INT32, INT64, INT8,
    UINT16, UINT32, UINT64, UINT8,
};
use crate::value::{EnumValue, Record, RecordRef, Value};
use byteorder::{ByteOrder, LittleEndian};
use std::cell::RefCell;
use std::rc::Rc;

/// Walks the fields of one record. Selected once per `Fory`.
pub trait StructCodec: Send + Sync {
    fn write_fields(
        &self,
        context: &mut WriteContext,
        meta: &StructMeta,
        record: &Record,
    ) -> Result<(), Error>;

    /// Reads the fields into `record`, which is already visible to back-references.
    fn read_fields(
        &self,
        context: &mut ReadContext,
        meta: &StructMeta,
        record: &RecordRef,
    ) -> Result<(), Error>;
}

/// One step of a compiled [`FieldPlan`], indexing the canonical fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanStep {
    /// Adjacent non-null fixed-width primitives written as one block of `width` bytes.
    FixedRun { fields: Vec<usize>, width: usize },
    Field(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPlan {
    steps: Vec<PlanStep>,
}

impl FieldPlan {
    pub fn compile(fields: &[FieldInfo]) -> FieldPlan {
        let mut steps = Vec::new();
        let mut run: Vec<usize> = Vec::new();
        let mut width = 0;
        for (i, field) in fields.iter().enumerate() {
            match fixed_width(field) {
                Some(w) => {
                    run.push(i);
                    width += w;
                }
                None => {
                    if !run.is_empty() {
                        steps.push(PlanStep::FixedRun {
                            fields: std::mem::take(&mut run),
                            width: std::mem::take(&mut width),
                        });
                    }
                    steps.push(PlanStep::Field(i));
                }
            }
        }
        if !run.is_empty() {
            steps.push(PlanStep::FixedRun { fields: run, width });
        }
        FieldPlan { steps }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }
}

fn fixed_width(field: &FieldInfo) -> Option<usize> {
    match field.declared_type {
        ShapeKind::Primitive(t)
            if field.ref_mode() == RefMode::None
                && !field.dynamic
                && matches!(
                    t.id(),
                    BOOL | INT8
                        | INT16
                        | INT32
                        | INT64
                        | UINT8
                        | UINT16
                        | UINT32
                        | UINT64
                        | FLOAT32
                        | FLOAT64
                ) =>
        {
            Some(primitive_type_size(t.id()))
        }
        _ => None,
    }
}

/// Whether a field's value is preceded by type info.
#[inline(always)]
fn has_type_info(field: &FieldInfo, compatible: bool) -> bool {
    field.dynamic || (compatible && matches!(field.declared_type, ShapeKind::Named(_)))
}

fn missing_value(field: &FieldInfo, record: &Record) -> Error {
    Error::type_error(format!(
        "field {} of {} is not nullable but has no value",
        field.name,
        record.type_name()
    ))
}

fn write_field(context: &mut WriteContext, meta: &StructMeta, field: &FieldInfo, record: &Record) -> Result<(), Error> {
    let null = Value::Null;
    let value = record.get(&field.name).unwrap_or(&null);
    let ref_mode = field.ref_mode();
    if ref_mode == RefMode::None && value.is_null() {
        return Err(missing_value(field, record));
    }
    write_ref_info_data(
        value,
        context,
        ref_mode,
        has_type_info(field, meta.is_compatible()),
        &field.declared_type,
    )
}

fn read_field(
    context: &mut ReadContext,
    meta: &StructMeta,
    field: &FieldInfo,
    record: &RecordRef,
) -> Result<(), Error> {
    let value = read_ref_info_data(
        context,
        field.ref_mode(),
        has_type_info(field, meta.is_compatible()),
        &field.declared_type,
    )?;
    if !value.is_null() {
        record.borrow_mut().set(&field.name, value);
    }
    Ok(())
}

/// Dispatches on each field's descriptor for every record.
pub struct InterpretedCodec;

impl StructCodec for InterpretedCodec {
    fn write_fields(
        &self,
        context: &mut WriteContext,
        meta: &StructMeta,
        record: &Record,
    ) -> Result<(), Error> {
        for field in &meta.fields {
            write_field(context, meta, field, record)?;
        }
        Ok(())
    }

    fn read_fields(
        &self,
        context: &mut ReadContext,
        meta: &StructMeta,
        record: &RecordRef,
    ) -> Result<(), Error> {
        for field in &meta.fields {
            read_field(context, meta, field, record)?;
        }
        Ok(())
    }
}

/// Follows the [`FieldPlan`] compiled at registration.
pub struct CompiledCodec;

fn encode_fixed(value: &Value, out: &mut [u8]) -> usize {
    match value {
        Value::Bool(v) => {
            out[0] = *v as u8;
            1
        }
        Value::Int8(v) => {
            out[0] = *v as u8;
            1
        }
        Value::UInt8(v) => {
            out[0] = *v;
            1
        }
        Value::Int16(v) => {
            LittleEndian::write_i16(out, *v);
            2
        }
        Value::UInt16(v) => {
            LittleEndian::write_u16(out, *v);
            2
        }
        Value::Int32(v) => {
            LittleEndian::write_i32(out, *v);
            4
        }
        Value::UInt32(v) => {
            LittleEndian::write_u32(out, *v);
            4
        }
        Value::Float32(v) => {
            LittleEndian::write_f32(out, *v);
            4
        }
        Value::Int64(v) => {
            LittleEndian::write_i64(out, *v);
            8
        }
        Value::UInt64(v) => {
            LittleEndian::write_u64(out, *v);
            8
        }
        Value::Float64(v) => {
            LittleEndian::write_f64(out, *v);
            8
        }
        _ => 0,
    }
}

impl StructCodec for CompiledCodec {
    fn write_fields(
        &self,
        context: &mut WriteContext,
        meta: &StructMeta,
        record: &Record,
    ) -> Result<(), Error> {
        for step in meta.plan.steps() {
            match step {
                PlanStep::Field(i) => write_field(context, meta, &meta.fields[*i], record)?,
                PlanStep::FixedRun { fields, width } => {
                    let offset = context.writer.skip(*width);
                    let block = context.writer.slice_mut(offset, *width)?;
                    let mut pos = 0;
                    for &i in fields {
                        let field = &meta.fields[i];
                        let value = record
                            .get(&field.name)
                            .filter(|v| !v.is_null())
                            .ok_or_else(|| missing_value(field, record))?;
                        let value = coerce_fixed(field.type_id, value)?;
                        pos += encode_fixed(&value, &mut block[pos..]);
                    }
                }
            }
        }
        Ok(())
    }

    fn read_fields(
        &self,
        context: &mut ReadContext,
        meta: &StructMeta,
        record: &RecordRef,
    ) -> Result<(), Error> {
        for step in meta.plan.steps() {
            match step {
                PlanStep::Field(i) => read_field(context, meta, &meta.fields[*i], record)?,
                PlanStep::FixedRun { fields, width } => {
                    let block = context.reader.read_bytes(*width)?;
                    let mut pos = 0;
                    let mut record = record.borrow_mut();
                    for &i in fields {
                        let field = &meta.fields[i];
                        let size = primitive_type_size(field.type_id);
                        let value = read_scalar(field.type_id, &block[pos..pos + size])?;
                        record.set(&field.name, value);
                        pos += size;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Writes a record's payload: the version hash for strict kinds, then its fields.
pub fn write_struct(
    context: &mut WriteContext,
    meta: &StructMeta,
    strict: bool,
    record: &RecordRef,
) -> Result<(), Error> {
    if strict {
        context.writer.write_i32(meta.version_hash);
    }
    let record = record.borrow();
    context.codec().write_fields(context, meta, &record)
}

fn new_record(context: &mut ReadContext, type_name: &str, slot: Option<u32>) -> (RecordRef, Value) {
    let record = Rc::new(RefCell::new(Record::new(type_name)));
    let value = Value::Record(record.clone());
    if let Some(slot) = slot {
        context.ref_reader.set_ref(slot, value.clone());
    }
    (record, value)
}

/// Reads a record laid out exactly as the local type describes it.
pub fn read_struct(
    context: &mut ReadContext,
    meta: &StructMeta,
    strict: bool,
    slot: Option<u32>,
) -> Result<Value, Error> {
    if strict {
        let read_version = context.reader.read_i32()?;
        check_struct_version(read_version, meta.version_hash, &meta.qualified_name)?;
    }
    let (record, value) = new_record(context, &meta.qualified_name, slot);
    context.codec().read_fields(context, meta, &record)?;
    Ok(value)
}

/// Reads a compatible-mode record described by a remote type definition.
///
/// Matched fields land under their local names, remote-only fields are read
/// and dropped, and local fields the peer did not send are filled from their
/// defaults. A type unknown locally decodes into a generic record keeping
/// every remote field.
pub fn read_compatible(
    context: &mut ReadContext,
    remote: &RemoteStruct,
    slot: Option<u32>,
) -> Result<Value, Error> {
    if let (true, Some(local)) = (remote.same_layout, &remote.local) {
        return read_struct(context, local, false, slot);
    }
    let (record, value) = new_record(context, &remote.type_name, slot);
    for field in &remote.fields {
        let ref_mode = RefMode::from_flags(field.nullable, field.track_ref);
        let item = read_ref_info_data(context, ref_mode, field.has_type_info, &field.shape)?;
        if item.is_null() {
            // a null sent for a local non-null field reads as absent
            if let (Some(i), Some(local)) = (field.local, &remote.local) {
                let local_field = &local.fields[i];
                if !local_field.nullable {
                    if let Some(default) = missing_default(local_field)? {
                        record.borrow_mut().set(&local_field.name, default);
                    }
                }
            }
            continue;
        }
        match (field.local, &remote.local) {
            (Some(i), Some(local)) => record.borrow_mut().set(&local.fields[i].name, item),
            (None, None) => record.borrow_mut().set(&field.name, item),
            _ => {}
        }
    }
    if let Some(local) = &remote.local {
        for &i in &remote.missing {
            let field = &local.fields[i];
            if let Some(default) = missing_default(field)? {
                record.borrow_mut().set(&field.name, default);
            }
        }
    }
    Ok(value)
}

/// Value of a local field absent from the payload, `None` to leave it unset.
fn missing_default(field: &FieldInfo) -> Result<Option<Value>, Error> {
    if let Some(default) = &field.default_value {
        return default.materialize(&field.declared_type).map(Some);
    }
    if let Some(factory) = &field.default_factory {
        return Ok(Some(factory.produce()));
    }
    match &field.declared_type {
        ShapeKind::Named(name) if is_enum_type(field.type_id) && !field.nullable => {
            Ok(Some(Value::Enum(EnumValue::new(name, 0))))
        }
        _ => Ok(None),
    }
}
