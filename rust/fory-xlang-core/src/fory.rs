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
use crate::config::{CodecStrategy, Config};
use crate::ensure;
use crate::error::Error;
use crate::meta::{EnumDescriptor, IdAssignment, ShapeKind, StructDescriptor};
use crate::resolver::context::{ReadContext, ReadState, WriteContext, WriteState};
use crate::resolver::pool::Pool;
use crate::resolver::type_resolver::TypeResolver;
use crate::serializer::{
    read_ref_info_data, write_ref_info_data, CompiledCodec, InterpretedCodec, StructCodec,
};
use crate::types::config_flags::{IS_CROSS_LANGUAGE_FLAG, IS_LITTLE_ENDIAN_FLAG, IS_NULL_FLAG};
use crate::types::{RefMode, MAGIC_NUMBER};
use crate::value::Value;

/// The serialization framework instance.
///
/// `Fory` owns its configuration, its type registry and the pools of per-call
/// state. Register types through `&mut self` first, then share the instance
/// (for example behind an `Arc`) and call [`Fory::serialize`] and
/// [`Fory::deserialize`] from any thread.
///
/// # Examples
///
/// ```rust
/// use fory_xlang_core::fory::Fory;
/// use fory_xlang_core::meta::{FieldDescriptor, StructDescriptor};
/// use fory_xlang_core::types::TypeId;
/// use fory_xlang_core::value::{Record, Value};
///
/// let mut fory = Fory::default();
/// fory.register_struct(
///     100,
///     StructDescriptor::new("demo", "Point")
///         .field(FieldDescriptor::new("x", TypeId::INT32))
///         .field(FieldDescriptor::new("y", TypeId::INT32)),
/// )
/// .unwrap();
///
/// let point = Record::new("demo.Point").with("x", 1).with("y", 2).into_value();
/// let bytes = fory.serialize(&point).unwrap();
/// let decoded: Value = fory.deserialize(&bytes).unwrap();
/// assert_eq!(decoded, point);
/// ```
///
/// Custom configuration:
///
/// ```rust
/// use fory_xlang_core::fory::Fory;
///
/// let fory = Fory::default()
///     .compatible(true)
///     .track_ref(true)
///     .max_depth(16)
///     .max_collection_size(Some(10_000));
/// ```
pub struct Fory {
    config: Config,
    type_resolver: TypeResolver,
    codec: Box<dyn StructCodec>,
    /// Set when a mode change could not be applied to the registered types.
    config_error: Option<String>,
    write_state_pool: Pool<WriteState>,
    read_state_pool: Pool<ReadState>,
}

impl Default for Fory {
    fn default() -> Self {
        let config = Config::default();
        Fory {
            codec: codec_for(config.codec_strategy),
            config,
            type_resolver: TypeResolver::default(),
            config_error: None,
            write_state_pool: Pool::new(WriteState::default),
            read_state_pool: Pool::new(ReadState::default),
        }
    }
}

fn codec_for(strategy: CodecStrategy) -> Box<dyn StructCodec> {
    match strategy {
        CodecStrategy::Interpreted => Box::new(InterpretedCodec),
        CodecStrategy::Compiled => Box::new(CompiledCodec),
    }
}

impl Fory {
    /// Sets the serialization mode.
    ///
    /// - `false`: strict mode. Both peers must declare identical types; every
    ///   record is prefixed by its version hash.
    /// - `true`: compatible mode. Records carry a type definition shared once
    ///   per call, and peers may add or remove fields independently.
    pub fn compatible(mut self, compatible: bool) -> Self {
        self.config.compatible = compatible;
        self.rebuild();
        self
    }

    /// Enables reference tracking for ref-eligible fields and for elements of
    /// collections, so that shared and circular references round-trip.
    pub fn track_ref(mut self, track_ref: bool) -> Self {
        self.config.track_ref = track_ref;
        self.rebuild();
        self
    }

    /// Sets the maximum nesting depth of records and containers, 50 by default.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Ceiling on the declared length of a binary value. `None` disables it.
    pub fn max_binary_size(mut self, limit: Option<usize>) -> Self {
        self.config.limits.max_binary_size = limit;
        self
    }

    pub fn max_collection_size(mut self, limit: Option<usize>) -> Self {
        self.config.limits.max_collection_size = limit;
        self
    }

    pub fn max_map_size(mut self, limit: Option<usize>) -> Self {
        self.config.limits.max_map_size = limit;
        self
    }

    pub fn max_string_bytes(mut self, limit: Option<usize>) -> Self {
        self.config.limits.max_string_bytes = limit;
        self
    }

    /// When disabled in compatible mode, unregistered records are written with
    /// an ad-hoc descriptor and unknown type definitions decode into generic
    /// records instead of failing.
    pub fn require_type_registration(mut self, require: bool) -> Self {
        self.config.require_type_registration = require;
        self
    }

    pub fn codec_strategy(mut self, strategy: CodecStrategy) -> Self {
        self.config.codec_strategy = strategy;
        self.codec = codec_for(strategy);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_compatible(&self) -> bool {
        self.config.compatible
    }

    pub fn get_type_resolver(&self) -> &TypeResolver {
        &self.type_resolver
    }

    fn rebuild(&mut self) {
        self.config_error = self
            .type_resolver
            .rebuild(&self.config)
            .err()
            .map(|e| e.to_string());
        self.reset_pools();
    }

    /// Cached type definitions refer to the metadata of registered types, so
    /// they are dropped whenever the registry changes.
    fn reset_pools(&mut self) {
        self.write_state_pool = Pool::new(WriteState::default);
        self.read_state_pool = Pool::new(ReadState::default);
    }

    /// Registers a record type under a numeric user type id.
    pub fn register_struct(&mut self, id: u32, desc: StructDescriptor) -> Result<(), Error> {
        self.type_resolver
            .register_struct(Some(id), desc, &self.config)?;
        self.reset_pools();
        Ok(())
    }

    /// Registers a record type by its namespace and type name.
    pub fn register_struct_by_name(&mut self, desc: StructDescriptor) -> Result<(), Error> {
        self.type_resolver.register_struct(None, desc, &self.config)?;
        self.reset_pools();
        Ok(())
    }

    /// Registers a record type under the id derived from its naming, falling
    /// back to registration by name when that id is taken.
    pub fn register_struct_auto(&mut self, desc: StructDescriptor) -> Result<IdAssignment, Error> {
        let assignment = self.type_resolver.register_struct_auto(desc, &self.config)?;
        self.reset_pools();
        Ok(assignment)
    }

    pub fn register_enum(&mut self, id: u32, desc: EnumDescriptor) -> Result<(), Error> {
        self.type_resolver.register_enum(Some(id), desc, &self.config)?;
        self.reset_pools();
        Ok(())
    }

    pub fn register_enum_by_name(&mut self, desc: EnumDescriptor) -> Result<(), Error> {
        self.type_resolver.register_enum(None, desc, &self.config)?;
        self.reset_pools();
        Ok(())
    }

    pub fn register_enum_auto(&mut self, desc: EnumDescriptor) -> Result<IdAssignment, Error> {
        let assignment = self.type_resolver.register_enum_auto(desc, &self.config)?;
        self.reset_pools();
        Ok(assignment)
    }

    fn check_config(&self) -> Result<(), Error> {
        match &self.config_error {
            Some(message) => Err(Error::not_allowed(message.clone())),
            None => Ok(()),
        }
    }

    #[inline(always)]
    fn root_ref_mode(&self) -> RefMode {
        RefMode::from_flags(true, self.config.track_ref)
    }

    fn write_head(&self, is_none: bool, writer: &mut Writer) {
        writer.write_u16(MAGIC_NUMBER);
        let mut bitmap = IS_LITTLE_ENDIAN_FLAG | IS_CROSS_LANGUAGE_FLAG;
        if is_none {
            bitmap |= IS_NULL_FLAG;
        }
        writer.write_u8(bitmap);
    }

    fn read_head(&self, reader: &mut Reader) -> Result<bool, Error> {
        let magic_number = reader.read_u16()?;
        ensure!(
            magic_number == MAGIC_NUMBER,
            Error::invalid_data(format!(
                "the fory xlang serialization must start with magic number {MAGIC_NUMBER:X}. \
                 Please check whether the data is based on the xlang protocol and is not corrupted"
            ))
        );
        let bitmap = reader.read_u8()?;
        ensure!(
            bitmap & IS_CROSS_LANGUAGE_FLAG != 0,
            Error::invalid_data("header bitmap mismatch at xlang bit")
        );
        ensure!(
            bitmap & IS_LITTLE_ENDIAN_FLAG != 0,
            Error::invalid_data("big endian payloads are not supported")
        );
        Ok(bitmap & IS_NULL_FLAG != 0)
    }

    /// Serializes `value` into a fresh byte vector.
    ///
    /// Any failure aborts the whole call; no partial output is returned.
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, Error> {
        self.check_config()?;
        self.write_state_pool.borrow_mut(|state| {
            state.reset();
            let mut context = WriteContext::new(
                state,
                &self.type_resolver,
                &self.config,
                self.codec.as_ref(),
            );
            self.write_head(value.is_null(), context.writer);
            if !value.is_null() {
                write_ref_info_data(
                    value,
                    &mut context,
                    self.root_ref_mode(),
                    true,
                    &ShapeKind::Dynamic,
                )?;
            }
            Ok(context.writer.dump())
        })
    }

    /// Decodes one value from `bf`, which must hold exactly one frame.
    pub fn deserialize(&self, bf: &[u8]) -> Result<Value, Error> {
        self.check_config()?;
        self.read_state_pool.borrow_mut(|state| {
            let mut context = ReadContext::new(
                Reader::new(bf),
                state,
                &self.type_resolver,
                &self.config,
                self.codec.as_ref(),
            );
            let value = if self.read_head(&mut context.reader)? {
                Value::Null
            } else {
                read_ref_info_data(&mut context, self.root_ref_mode(), true, &ShapeKind::Dynamic)?
            };
            let remaining = context.reader.remaining();
            ensure!(
                remaining == 0,
                Error::invalid_data(format!("{remaining} trailing bytes after the root value"))
            );
            Ok(value)
        })
    }
}
