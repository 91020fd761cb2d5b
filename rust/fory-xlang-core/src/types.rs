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

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i8)]
pub enum RefFlag {
    Null = -3,
    // Ref indicates that object is a not-null value.
    // We don't use another byte to indicate REF, so that we can save one byte.
    Ref = -2,
    // NotNullValue indicates that the object is a non-null value.
    NotNullValue = -1,
    // RefValue indicates that the object is a referencable and first read.
    RefValue = 0,
}

/// Which marker precedes a value on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefMode {
    /// No marker, the value is written as is.
    None,
    /// `Null` or `NotNullValue`.
    NullOnly,
    /// Full ref protocol: `Null`, `Ref` + slot, or `RefValue`.
    Tracking,
}

impl RefMode {
    #[inline(always)]
    pub const fn from_flags(nullable: bool, track_ref: bool) -> RefMode {
        if track_ref {
            RefMode::Tracking
        } else if nullable {
            RefMode::NullOnly
        } else {
            RefMode::None
        }
    }
}

/// Cross-language type ids. Ids at or above [`BOUND`] are never internal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[allow(non_camel_case_types)]
#[repr(u32)]
pub enum TypeId {
    UNKNOWN = 0,
    BOOL = 1,
    INT8 = 2,
    INT16 = 3,
    INT32 = 4,
    VARINT32 = 5,
    INT64 = 6,
    VARINT64 = 7,
    TAGGED_INT64 = 8,
    UINT8 = 9,
    UINT16 = 10,
    UINT32 = 11,
    VAR_UINT32 = 12,
    UINT64 = 13,
    VAR_UINT64 = 14,
    TAGGED_UINT64 = 15,
    FLOAT8 = 16,
    FLOAT16 = 17,
    BFLOAT16 = 18,
    FLOAT32 = 19,
    FLOAT64 = 20,
    STRING = 21,
    LIST = 22,
    SET = 23,
    MAP = 24,
    ENUM = 25,
    NAMED_ENUM = 26,
    STRUCT = 27,
    COMPATIBLE_STRUCT = 28,
    NAMED_STRUCT = 29,
    NAMED_COMPATIBLE_STRUCT = 30,
    EXT = 31,
    NAMED_EXT = 32,
    UNION = 33,
    TYPED_UNION = 34,
    NAMED_UNION = 35,
    NONE = 36,
    DURATION = 37,
    TIMESTAMP = 38,
    DATE = 39,
    DECIMAL = 40,
    BINARY = 41,
    ARRAY = 42,
    BOOL_ARRAY = 43,
    INT8_ARRAY = 44,
    INT16_ARRAY = 45,
    INT32_ARRAY = 46,
    INT64_ARRAY = 47,
    UINT8_ARRAY = 48,
    UINT16_ARRAY = 49,
    UINT32_ARRAY = 50,
    UINT64_ARRAY = 51,
    FLOAT8_ARRAY = 52,
    FLOAT16_ARRAY = 53,
    BFLOAT16_ARRAY = 54,
    FLOAT32_ARRAY = 55,
    FLOAT64_ARRAY = 56,
}

impl TypeId {
    #[inline(always)]
    pub const fn id(self) -> u32 {
        self as u32
    }
}

pub const UNKNOWN: u32 = TypeId::UNKNOWN as u32;
pub const BOOL: u32 = TypeId::BOOL as u32;
pub const INT8: u32 = TypeId::INT8 as u32;
pub const INT16: u32 = TypeId::INT16 as u32;
pub const INT32: u32 = TypeId::INT32 as u32;
pub const VARINT32: u32 = TypeId::VARINT32 as u32;
pub const INT64: u32 = TypeId::INT64 as u32;
pub const VARINT64: u32 = TypeId::VARINT64 as u32;
pub const TAGGED_INT64: u32 = TypeId::TAGGED_INT64 as u32;
pub const UINT8: u32 = TypeId::UINT8 as u32;
pub const UINT16: u32 = TypeId::UINT16 as u32;
pub const UINT32: u32 = TypeId::UINT32 as u32;
pub const VAR_UINT32: u32 = TypeId::VAR_UINT32 as u32;
pub const UINT64: u32 = TypeId::UINT64 as u32;
pub const VAR_UINT64: u32 = TypeId::VAR_UINT64 as u32;
pub const TAGGED_UINT64: u32 = TypeId::TAGGED_UINT64 as u32;
pub const FLOAT8: u32 = TypeId::FLOAT8 as u32;
pub const FLOAT16: u32 = TypeId::FLOAT16 as u32;
pub const BFLOAT16: u32 = TypeId::BFLOAT16 as u32;
pub const FLOAT32: u32 = TypeId::FLOAT32 as u32;
pub const FLOAT64: u32 = TypeId::FLOAT64 as u32;
pub const STRING: u32 = TypeId::STRING as u32;
pub const LIST: u32 = TypeId::LIST as u32;
pub const SET: u32 = TypeId::SET as u32;
pub const MAP: u32 = TypeId::MAP as u32;
pub const ENUM: u32 = TypeId::ENUM as u32;
pub const NAMED_ENUM: u32 = TypeId::NAMED_ENUM as u32;
pub const STRUCT: u32 = TypeId::STRUCT as u32;
pub const COMPATIBLE_STRUCT: u32 = TypeId::COMPATIBLE_STRUCT as u32;
pub const NAMED_STRUCT: u32 = TypeId::NAMED_STRUCT as u32;
pub const NAMED_COMPATIBLE_STRUCT: u32 = TypeId::NAMED_COMPATIBLE_STRUCT as u32;
pub const EXT: u32 = TypeId::EXT as u32;
pub const NAMED_EXT: u32 = TypeId::NAMED_EXT as u32;
pub const UNION: u32 = TypeId::UNION as u32;
pub const TYPED_UNION: u32 = TypeId::TYPED_UNION as u32;
pub const NAMED_UNION: u32 = TypeId::NAMED_UNION as u32;
pub const DURATION: u32 = TypeId::DURATION as u32;
pub const TIMESTAMP: u32 = TypeId::TIMESTAMP as u32;
pub const DATE: u32 = TypeId::DATE as u32;
pub const BINARY: u32 = TypeId::BINARY as u32;

/// First id that is not an internal type id.
pub const BOUND: u32 = 72;

/// Scalar kinds that fill groups one and two of the field layout.
#[inline(always)]
pub const fn is_primitive_type(type_id: u32) -> bool {
    type_id >= BOOL && type_id <= FLOAT64
}

/// Variable-width encodings of integer kinds.
#[inline(always)]
pub const fn is_compressed_type(type_id: u32) -> bool {
    matches!(
        type_id,
        VARINT32 | VARINT64 | TAGGED_INT64 | VAR_UINT32 | VAR_UINT64 | TAGGED_UINT64
    )
}

/// Declared width in bytes of a primitive kind, zero for anything else.
#[inline(always)]
pub const fn primitive_type_size(type_id: u32) -> usize {
    match type_id {
        BOOL | INT8 | UINT8 | FLOAT8 => 1,
        INT16 | UINT16 | FLOAT16 | BFLOAT16 => 2,
        INT32 | VARINT32 | UINT32 | VAR_UINT32 | FLOAT32 => 4,
        INT64 | VARINT64 | TAGGED_INT64 | UINT64 | VAR_UINT64 | TAGGED_UINT64 | FLOAT64 => 8,
        _ => 0,
    }
}

#[inline(always)]
pub const fn is_enum_type(type_id: u32) -> bool {
    matches!(type_id, ENUM | NAMED_ENUM)
}

#[inline(always)]
pub const fn is_union_type(type_id: u32) -> bool {
    matches!(type_id, UNION | TYPED_UNION | NAMED_UNION)
}

#[inline(always)]
pub const fn is_struct_type(type_id: u32) -> bool {
    matches!(
        type_id,
        STRUCT | COMPATIBLE_STRUCT | NAMED_STRUCT | NAMED_COMPATIBLE_STRUCT
    )
}

/// Kinds whose concrete type cannot be known from a declaration alone.
#[inline(always)]
pub const fn is_polymorphic_type(type_id: u32) -> bool {
    is_struct_type(type_id) || matches!(type_id, EXT | NAMED_EXT | UNKNOWN)
}

#[inline(always)]
pub const fn is_user_type(type_id: u32) -> bool {
    is_enum_type(type_id)
        || is_union_type(type_id)
        || is_struct_type(type_id)
        || matches!(type_id, EXT | NAMED_EXT)
}

#[inline(always)]
pub const fn is_container_type(type_id: u32) -> bool {
    matches!(type_id, LIST | SET | MAP)
}

/// Internal types are the ids in `0 < id < BOUND` that are neither user kinds nor containers.
#[inline(always)]
pub const fn is_internal_type(type_id: u32) -> bool {
    type_id != UNKNOWN
        && type_id < BOUND
        && !is_user_type(type_id)
        && !is_container_type(type_id)
}

/// Lower-case name of a built-in kind, used in error messages.
pub const fn type_name(type_id: u32) -> &'static str {
    match type_id {
        BOOL => "bool",
        INT8 => "int8",
        INT16 => "int16",
        INT32 | VARINT32 => "int32",
        INT64 | VARINT64 | TAGGED_INT64 => "int64",
        UINT8 => "uint8",
        UINT16 => "uint16",
        UINT32 | VAR_UINT32 => "uint32",
        UINT64 | VAR_UINT64 | TAGGED_UINT64 => "uint64",
        FLOAT32 => "float32",
        FLOAT64 => "float64",
        STRING => "string",
        BINARY => "binary",
        DATE => "date",
        TIMESTAMP => "timestamp",
        DURATION => "duration",
        LIST => "list",
        SET => "set",
        MAP => "map",
        ENUM | NAMED_ENUM => "enum",
        _ if is_struct_type(type_id) => "struct",
        _ => "unknown",
    }
}

pub mod config_flags {
    pub const IS_NULL_FLAG: u8 = 1 << 0;
    pub const IS_LITTLE_ENDIAN_FLAG: u8 = 1 << 1;
    pub const IS_CROSS_LANGUAGE_FLAG: u8 = 1 << 2;
}

pub const MAGIC_NUMBER: u16 = 0x62d4;
