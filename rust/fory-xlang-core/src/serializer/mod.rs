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

use crate::error::Error;
use crate::meta::ShapeKind;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::{RefFlag, RefMode};
use crate::value::Value;

pub mod collection;
pub mod struct_;
pub mod value;

pub use struct_::{CompiledCodec, FieldPlan, InterpretedCodec, PlanStep, StructCodec};

/// Writes the marker selected by `ref_mode`, then type info when asked to,
/// then the data of `value`.
pub fn write_ref_info_data(
    value: &Value,
    context: &mut WriteContext,
    ref_mode: RefMode,
    write_type_info: bool,
    shape: &ShapeKind,
) -> Result<(), Error> {
    match ref_mode {
        RefMode::Tracking => {
            if context.ref_writer.try_write_ref(context.writer, value) {
                return Ok(());
            }
        }
        RefMode::NullOnly => {
            if value.is_null() {
                context.writer.write_i8(RefFlag::Null as i8);
                return Ok(());
            }
            context.writer.write_i8(RefFlag::NotNullValue as i8);
        }
        RefMode::None => {
            if value.is_null() {
                return Err(Error::type_error(
                    "null value where no null marker is written",
                ));
            }
        }
    }
    value::write_value(context, value, write_type_info, shape)
}

/// Counterpart of [`write_ref_info_data`]. Decodes to [`Value::Null`] for a
/// null marker.
pub fn read_ref_info_data(
    context: &mut ReadContext,
    ref_mode: RefMode,
    read_type_info: bool,
    shape: &ShapeKind,
) -> Result<Value, Error> {
    if ref_mode == RefMode::None {
        return value::read_value(context, read_type_info, shape, None);
    }
    let ref_flag = context.ref_reader.read_ref_flag(&mut context.reader)?;
    match (ref_flag, ref_mode) {
        (RefFlag::Null, _) => Ok(Value::Null),
        (RefFlag::NotNullValue, _) => value::read_value(context, read_type_info, shape, None),
        (RefFlag::Ref, RefMode::Tracking) => {
            let ref_id = context.ref_reader.read_ref_id(&mut context.reader)?;
            context.ref_reader.get_ref(ref_id)
        }
        (RefFlag::RefValue, RefMode::Tracking) => {
            let slot = context.ref_reader.reserve_ref();
            let value = value::read_value(context, read_type_info, shape, Some(slot))?;
            context.ref_reader.set_ref(slot, value.clone());
            Ok(value)
        }
        (flag, _) => Err(Error::invalid_data(format!(
            "reference flag {flag:?} where references are not tracked"
        ))),
    }
}
