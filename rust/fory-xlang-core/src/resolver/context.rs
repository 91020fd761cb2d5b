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
use crate::config::Config;
use crate::error::Error;
use crate::resolver::meta_resolver::{MetaReaderResolver, MetaWriterResolver};
use crate::resolver::ref_resolver::{RefReader, RefWriter};
use crate::resolver::type_resolver::{StructMeta, TypeResolver};
use crate::serializer::StructCodec;
use crate::value::Record;
use std::collections::HashMap;
use std::sync::Arc;

/// Write-side state reused across calls on one thread.
#[derive(Default)]
pub struct WriteState {
    pub writer: Writer,
    pub ref_writer: RefWriter,
    pub meta_resolver: MetaWriterResolver,
}

impl WriteState {
    pub fn reset(&mut self) {
        self.writer.reset();
        self.ref_writer.reset();
        self.meta_resolver.reset();
    }
}

/// Read-side state reused across calls on one thread. Only the TypeDef cache
/// is pooled; decoded values are not `Send`.
#[derive(Default)]
pub struct ReadState {
    pub meta_resolver: MetaReaderResolver,
}

pub struct WriteContext<'a> {
    pub writer: &'a mut Writer,
    pub ref_writer: &'a mut RefWriter,
    meta_resolver: &'a mut MetaWriterResolver,
    type_resolver: &'a TypeResolver,
    config: &'a Config,
    codec: &'a dyn StructCodec,
    adhoc: HashMap<String, Arc<StructMeta>>,
    current_depth: u32,
}

impl<'a> WriteContext<'a> {
    pub fn new(
        state: &'a mut WriteState,
        type_resolver: &'a TypeResolver,
        config: &'a Config,
        codec: &'a dyn StructCodec,
    ) -> WriteContext<'a> {
        WriteContext {
            writer: &mut state.writer,
            ref_writer: &mut state.ref_writer,
            meta_resolver: &mut state.meta_resolver,
            type_resolver,
            config,
            codec,
            adhoc: HashMap::new(),
            current_depth: 0,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &'a Config {
        self.config
    }

    #[inline(always)]
    pub fn type_resolver(&self) -> &'a TypeResolver {
        self.type_resolver
    }

    #[inline(always)]
    pub fn codec(&self) -> &'a dyn StructCodec {
        self.codec
    }

    pub fn write_type_meta(&mut self, meta: &StructMeta) -> Result<(), Error> {
        self.meta_resolver.write_type_meta(self.writer, meta)
    }

    /// Metadata used to write `record`: its registered type, or in lenient
    /// compatible mode an ad-hoc descriptor built from the record's own fields.
    pub fn record_meta(&mut self, record: &Record) -> Result<Arc<StructMeta>, Error> {
        if let Some(meta) = self.type_resolver.get_struct(record.type_name()) {
            return Ok(meta.clone());
        }
        if self.config.require_type_registration || !self.config.compatible {
            return self.type_resolver.resolve_record(record.type_name());
        }
        if let Some(meta) = self.adhoc.get(record.type_name()) {
            let same_fields = meta.fields.len() == record.len()
                && meta.fields.iter().all(|f| record.contains(&f.name));
            if !same_fields {
                return Err(Error::not_allowed(format!(
                    "records of unregistered type {} must share one field set within a call",
                    record.type_name()
                )));
            }
            return Ok(meta.clone());
        }
        let meta = Arc::new(self.type_resolver.adhoc_struct(record, self.config)?);
        self.adhoc
            .insert(record.type_name().to_string(), meta.clone());
        Ok(meta)
    }

    #[inline(always)]
    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.current_depth += 1;
        check_depth(self.current_depth, self.config.max_depth)
    }

    #[inline(always)]
    pub fn dec_depth(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }
}

pub struct ReadContext<'a, 'bf> {
    pub reader: Reader<'bf>,
    pub ref_reader: RefReader,
    meta_resolver: &'a mut MetaReaderResolver,
    type_resolver: &'a TypeResolver,
    config: &'a Config,
    codec: &'a dyn StructCodec,
    current_depth: u32,
}

impl<'a, 'bf> ReadContext<'a, 'bf> {
    pub fn new(
        reader: Reader<'bf>,
        state: &'a mut ReadState,
        type_resolver: &'a TypeResolver,
        config: &'a Config,
        codec: &'a dyn StructCodec,
    ) -> ReadContext<'a, 'bf> {
        state.meta_resolver.reset();
        ReadContext {
            reader,
            ref_reader: RefReader::new(),
            meta_resolver: &mut state.meta_resolver,
            type_resolver,
            config,
            codec,
            current_depth: 0,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &'a Config {
        self.config
    }

    #[inline(always)]
    pub fn type_resolver(&self) -> &'a TypeResolver {
        self.type_resolver
    }

    #[inline(always)]
    pub fn codec(&self) -> &'a dyn StructCodec {
        self.codec
    }

    pub fn read_type_meta(
        &mut self,
    ) -> Result<Arc<crate::resolver::meta_resolver::RemoteStruct>, Error> {
        self.meta_resolver
            .read_type_meta(&mut self.reader, self.type_resolver)
    }

    #[inline(always)]
    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.current_depth += 1;
        check_depth(self.current_depth, self.config.max_depth)
    }

    #[inline(always)]
    pub fn dec_depth(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }
}

#[inline(always)]
fn check_depth(current: u32, max: u32) -> Result<(), Error> {
    if current > max {
        return Err(Error::depth_exceed(format!(
            "maximum nesting depth ({max}) exceeded. This may indicate a circular reference \
             with reference tracking disabled or an overly deep object graph"
        )));
    }
    Ok(())
}
