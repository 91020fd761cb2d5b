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

//! Decode-time ceilings on declared sizes.
//!
//! Every check runs on the length prefix read from the stream, before storage
//! for the container is allocated. Checks are per container and never summed
//! across a payload. A `None` ceiling disables its check.

use crate::error::{Error, LimitKind};

pub const DEFAULT_MAX_BINARY_SIZE: usize = 64 * 1024 * 1024;
pub const DEFAULT_MAX_COLLECTION_SIZE: usize = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeLimits {
    pub max_binary_size: Option<usize>,
    pub max_string_bytes: Option<usize>,
    pub max_collection_size: Option<usize>,
    pub max_map_size: Option<usize>,
}

impl Default for SizeLimits {
    fn default() -> Self {
        SizeLimits {
            max_binary_size: Some(DEFAULT_MAX_BINARY_SIZE),
            max_string_bytes: None,
            max_collection_size: Some(DEFAULT_MAX_COLLECTION_SIZE),
            max_map_size: Some(DEFAULT_MAX_COLLECTION_SIZE),
        }
    }
}

impl SizeLimits {
    pub const UNLIMITED: SizeLimits = SizeLimits {
        max_binary_size: None,
        max_string_bytes: None,
        max_collection_size: None,
        max_map_size: None,
    };

    #[inline(always)]
    pub fn check_collection(&self, len: usize) -> Result<(), Error> {
        check(LimitKind::Collection, len, self.max_collection_size)
    }

    #[inline(always)]
    pub fn check_map(&self, len: usize) -> Result<(), Error> {
        check(LimitKind::Map, len, self.max_map_size)
    }

    #[inline(always)]
    pub fn check_string(&self, len: usize) -> Result<(), Error> {
        check(LimitKind::String, len, self.max_string_bytes)
    }

    #[inline(always)]
    pub fn check_binary(&self, len: usize) -> Result<(), Error> {
        check(LimitKind::Binary, len, self.max_binary_size)
    }
}

#[inline(always)]
fn check(kind: LimitKind, len: usize, limit: Option<usize>) -> Result<(), Error> {
    match limit {
        Some(limit) if len > limit => Err(Error::size_limit_exceeded(kind, len, limit)),
        _ => Ok(()),
    }
}
