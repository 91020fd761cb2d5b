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

use crate::resolver::guardrail::SizeLimits;

/// How struct payloads are walked. Chosen once when a [`crate::fory::Fory`]
/// is configured; both strategies produce identical bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CodecStrategy {
    /// Dispatch on each field's descriptor for every record.
    Interpreted,
    /// Use the field plan compiled at registration, which writes runs of
    /// fixed-width primitives in a single reserved block.
    #[default]
    Compiled,
}

/// Configuration for serialization.
///
/// Shared by the `Fory` instance and every per-call context so that both ends of
/// one call agree on mode, reference tracking and decode ceilings.
#[derive(Clone, Debug)]
pub struct Config {
    /// Whether compatible mode is enabled for schema evolution support.
    pub compatible: bool,
    /// Whether reference tracking is enabled.
    /// When enabled, fields declared ref-eligible and ref-tracked container
    /// elements preserve shared and circular references.
    pub track_ref: bool,
    /// Maximum nesting depth of records and containers.
    pub max_depth: u32,
    /// Ceilings applied to declared sizes while decoding.
    pub limits: SizeLimits,
    /// Fail on record types that were never registered.
    pub require_type_registration: bool,
    pub codec_strategy: CodecStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            compatible: false,
            track_ref: false,
            max_depth: 50,
            limits: SizeLimits::default(),
            require_type_registration: true,
            codec_strategy: CodecStrategy::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn is_compatible(&self) -> bool {
        self.compatible
    }

    #[inline(always)]
    pub fn is_track_ref(&self) -> bool {
        self.track_ref
    }

    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline(always)]
    pub fn limits(&self) -> &SizeLimits {
        &self.limits
    }
}
