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
use byteorder::{ByteOrder, LittleEndian};

const HALF_MIN_INT_VALUE: i64 = -(1 << 30);
const HALF_MAX_INT_VALUE: i64 = (1 << 30) - 1;
const TAGGED_UINT_MAX: u64 = i32::MAX as u64;
const TAGGED_LONG_FLAG: u8 = 0b1;

/// String payload encodings recognised in a string header.
pub const LATIN1: u64 = 0;
pub const UTF16: u64 = 1;
pub const UTF8: u64 = 2;

/// Growable little-endian byte sink.
#[derive(Default)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn with_capacity(capacity: usize) -> Writer {
        Writer {
            bf: Vec::with_capacity(capacity),
        }
    }

    pub fn reset(&mut self) {
        // keep capacity and reset len to 0
        self.bf.clear();
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.bf.reserve(additional);
    }

    /// Appends `len` zero bytes and returns the offset of the first one.
    pub fn skip(&mut self, len: usize) -> usize {
        let offset = self.bf.len();
        self.bf.resize(offset + len, 0);
        offset
    }

    /// Mutable view over already written bytes, used to fill space taken by [`Writer::skip`].
    pub(crate) fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], Error> {
        let capacity = self.bf.len();
        self.bf
            .get_mut(offset..offset + len)
            .ok_or_else(|| Error::buffer_out_of_bound(offset, len, capacity))
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    #[inline(always)]
    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    #[inline(always)]
    pub fn write_i8(&mut self, value: i8) {
        self.bf.push(value as u8);
    }

    #[inline(always)]
    pub fn write_bool(&mut self, value: bool) {
        self.bf.push(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.bf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.bf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.bf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.bf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.bf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.bf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.bf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_varint32(&mut self, value: i32) {
        let zigzag = ((value << 1) ^ (value >> 31)) as u32;
        self.write_varuint32(zigzag)
    }

    pub fn write_varuint32(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.bf.push(((value as u8) & 0x7F) | 0x80);
            value >>= 7;
        }
        self.bf.push(value as u8);
    }

    pub fn write_varint64(&mut self, value: i64) {
        let zigzag = ((value << 1) ^ (value >> 63)) as u64;
        self.write_varuint64(zigzag)
    }

    /// At most nine bytes; the ninth byte carries a full eight bits.
    pub fn write_varuint64(&mut self, mut value: u64) {
        for _ in 0..8 {
            if value < 0x80 {
                self.bf.push(value as u8);
                return;
            }
            self.bf.push(((value as u8) & 0x7F) | 0x80);
            value >>= 7;
        }
        self.bf.push(value as u8);
    }

    /// Values in `[-2^30, 2^30)` take four bytes with a clear low bit,
    /// anything else takes a flag byte plus eight bytes.
    pub fn write_tagged_int64(&mut self, value: i64) {
        if (HALF_MIN_INT_VALUE..=HALF_MAX_INT_VALUE).contains(&value) {
            self.write_i32((value as i32) << 1);
        } else {
            self.write_u8(TAGGED_LONG_FLAG);
            self.write_i64(value);
        }
    }

    pub fn write_tagged_uint64(&mut self, value: u64) {
        if value <= TAGGED_UINT_MAX {
            self.write_u32((value as u32) << 1);
        } else {
            self.write_u8(TAGGED_LONG_FLAG);
            self.write_u64(value);
        }
    }

    /// Writes a string as `varuint64(byte_len << 2 | UTF8)` followed by its bytes.
    pub fn write_utf8_string(&mut self, s: &str) {
        let header = ((s.len() as u64) << 2) | UTF8;
        self.write_varuint64(header);
        self.write_bytes(s.as_bytes());
    }

    /// Length-prefixed raw bytes.
    pub fn write_binary(&mut self, bytes: &[u8]) {
        self.write_varuint32(bytes.len() as u32);
        self.write_bytes(bytes);
    }
}

/// Bounds-checked little-endian cursor over an input slice.
///
/// Every read fails with [`Error::BufferOutOfBound`] rather than returning
/// bytes past the end of the slice.
pub struct Reader<'a> {
    bf: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader { bf, cursor: 0 }
    }

    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    #[inline(always)]
    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|end| *end <= self.bf.len())
            .ok_or_else(|| Error::buffer_out_of_bound(self.cursor, len, self.bf.len()))?;
        let bf: &'a [u8] = self.bf;
        let slice = &bf[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.take(len).map(|_| ())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.take(len)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        let mut result = 0u32;
        for shift in (0..35).step_by(7) {
            let b = self.read_u8()? as u32;
            result |= (b & 0x7F) << shift;
            if b < 0x80 {
                return Ok(result);
            }
        }
        Err(Error::invalid_data("varuint32 is longer than 5 bytes"))
    }

    pub fn read_varint32(&mut self) -> Result<i32, Error> {
        let encoded = self.read_varuint32()?;
        Ok(((encoded >> 1) as i32) ^ -((encoded & 1) as i32))
    }

    pub fn read_varuint64(&mut self) -> Result<u64, Error> {
        let mut result = 0u64;
        for shift in (0..56).step_by(7) {
            let b = self.read_u8()? as u64;
            result |= (b & 0x7F) << shift;
            if b < 0x80 {
                return Ok(result);
            }
        }
        let last = self.read_u8()? as u64;
        Ok(result | (last << 56))
    }

    pub fn read_varint64(&mut self) -> Result<i64, Error> {
        let encoded = self.read_varuint64()?;
        Ok(((encoded >> 1) as i64) ^ -((encoded & 1) as i64))
    }

    pub fn read_tagged_int64(&mut self) -> Result<i64, Error> {
        let head = self.read_u8()?;
        if head & TAGGED_LONG_FLAG == 0 {
            self.cursor -= 1;
            let v = self.read_i32()?;
            Ok((v >> 1) as i64)
        } else {
            self.read_i64()
        }
    }

    pub fn read_tagged_uint64(&mut self) -> Result<u64, Error> {
        let head = self.read_u8()?;
        if head & TAGGED_LONG_FLAG == 0 {
            self.cursor -= 1;
            let v = self.read_u32()?;
            Ok((v >> 1) as u64)
        } else {
            self.read_u64()
        }
    }

    /// Reads a string header and returns `(encoding, byte_len)`.
    pub fn read_string_header(&mut self) -> Result<(u64, usize), Error> {
        let header = self.read_varuint64()?;
        Ok((header & 0b11, (header >> 2) as usize))
    }

    /// Decodes `len` payload bytes of a string already described by its header.
    pub fn read_string_payload(&mut self, encoding: u64, len: usize) -> Result<String, Error> {
        let bytes = self.take(len)?;
        match encoding {
            UTF8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| Error::invalid_data(format!("invalid utf8 string: {e}"))),
            LATIN1 => Ok(bytes.iter().map(|b| *b as char).collect()),
            UTF16 => {
                if len % 2 != 0 {
                    return Err(Error::invalid_data("utf16 string has odd byte length"));
                }
                let units: Vec<u16> = bytes.chunks_exact(2).map(LittleEndian::read_u16).collect();
                String::from_utf16(&units)
                    .map_err(|e| Error::invalid_data(format!("invalid utf16 string: {e}")))
            }
            other => Err(Error::unsupported(format!(
                "unsupported string encoding {other}"
            ))),
        }
    }

    pub fn read_utf8_string(&mut self) -> Result<String, Error> {
        let (encoding, len) = self.read_string_header()?;
        self.read_string_payload(encoding, len)
    }
}
