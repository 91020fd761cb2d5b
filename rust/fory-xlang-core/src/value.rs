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

//! Dynamic values exchanged with the codec.
//!
//! Lists, sets, maps and records are shared handles so that one value can
//! appear at several places of a graph, including inside itself.

use crate::types::{
    INT16, INT32, INT64, INT8, TAGGED_INT64, TAGGED_UINT64, UINT16, UINT32, UINT64, UINT8,
    VARINT32, VARINT64, VAR_UINT32, VAR_UINT64,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type MapRef = Rc<RefCell<Vec<(Value, Value)>>>;
pub type RecordRef = Rc<RefCell<Record>>;

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Duration(chrono::Duration),
    List(ListRef),
    Set(ListRef),
    Map(MapRef),
    Enum(EnumValue),
    Record(RecordRef),
}

/// One member of a registered enum, identified by its declaration ordinal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: String,
    pub ordinal: u32,
}

impl EnumValue {
    pub fn new(type_name: &str, ordinal: u32) -> Self {
        EnumValue {
            type_name: type_name.to_string(),
            ordinal,
        }
    }
}

/// A record instance: its qualified type name and the fields that are set.
#[derive(Clone, Default)]
pub struct Record {
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Record {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Record(Rc::new(RefCell::new(self)))
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn set(items: Vec<Value>) -> Value {
        Value::Set(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn binary(bytes: &[u8]) -> Value {
        Value::Binary(bytes.to_vec())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Elements of a list or a set.
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(l) | Value::Set(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn as_integer(&self) -> Option<i128> {
        Some(match self {
            Value::Int8(v) => *v as i128,
            Value::Int16(v) => *v as i128,
            Value::Int32(v) => *v as i128,
            Value::Int64(v) => *v as i128,
            Value::UInt8(v) => *v as i128,
            Value::UInt16(v) => *v as i128,
            Value::UInt32(v) => *v as i128,
            Value::UInt64(v) => *v as i128,
            _ => return None,
        })
    }

    /// Address of the shared allocation behind identity-bearing values.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::List(l) | Value::Set(l) => Some(Rc::as_ptr(l) as *const u8 as usize),
            Value::Map(m) => Some(Rc::as_ptr(m) as *const u8 as usize),
            Value::Record(r) => Some(Rc::as_ptr(r) as *const u8 as usize),
            _ => None,
        }
    }

    pub fn is_identity_bearing(&self) -> bool {
        self.identity().is_some()
    }

    /// Whether two values are the same shared allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt8(_) => "uint8",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Duration(_) => "duration",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Enum(_) => "enum",
            Value::Record(_) => "record",
        }
    }
}

/// Builds the integer variant that matches `type_id`, or `None` when `v` does
/// not fit or `type_id` is not an integer type.
pub(crate) fn integer_value(type_id: u32, v: i128) -> Option<Value> {
    Some(match type_id {
        INT8 => Value::Int8(i8::try_from(v).ok()?),
        INT16 => Value::Int16(i16::try_from(v).ok()?),
        INT32 | VARINT32 => Value::Int32(i32::try_from(v).ok()?),
        INT64 | VARINT64 | TAGGED_INT64 => Value::Int64(i64::try_from(v).ok()?),
        UINT8 => Value::UInt8(u8::try_from(v).ok()?),
        UINT16 => Value::UInt16(u16::try_from(v).ok()?),
        UINT32 | VAR_UINT32 => Value::UInt32(u32::try_from(v).ok()?),
        UINT64 | VAR_UINT64 | TAGGED_UINT64 => Value::UInt64(u64::try_from(v).ok()?),
        _ => return None,
    })
}

/// Structural equality. Shared handles that point at the same allocation are
/// equal without being walked; distinct cyclic graphs must not be compared.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int8(a), Int8(b)) => a == b,
            (Int16(a), Int16(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (UInt8(a), UInt8(b)) => a == b,
            (UInt16(a), UInt16(b)) => a == b,
            (UInt32(a), UInt32(b)) => a == b,
            (UInt64(a), UInt64(b)) => a == b,
            (Float32(a), Float32(b)) => a == b,
            (Float64(a), Float64(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Binary(a), Binary(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Duration(a), Duration(b)) => a == b,
            (List(a), List(b)) | (Set(a), Set(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Map(a), Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Enum(a), Enum(b)) => a == b,
            (Record(a), Record(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => false,
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.fields == other.fields
    }
}

const DEBUG_DEPTH: usize = 8;

thread_local! {
    static DEBUG_NESTING: Cell<usize> = const { Cell::new(0) };
}

/// Runs `f` one level deeper, printing `..` instead once cycles would recurse forever.
fn nested(
    f: &mut fmt::Formatter<'_>,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    let depth = DEBUG_NESTING.with(|d| d.get());
    if depth >= DEBUG_DEPTH {
        return f.write_str("..");
    }
    DEBUG_NESTING.with(|d| d.set(depth + 1));
    let result = body(f);
    DEBUG_NESTING.with(|d| d.set(depth));
    result
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int8(v) => write!(f, "Int8({v})"),
            Value::Int16(v) => write!(f, "Int16({v})"),
            Value::Int32(v) => write!(f, "Int32({v})"),
            Value::Int64(v) => write!(f, "Int64({v})"),
            Value::UInt8(v) => write!(f, "UInt8({v})"),
            Value::UInt16(v) => write!(f, "UInt16({v})"),
            Value::UInt32(v) => write!(f, "UInt32({v})"),
            Value::UInt64(v) => write!(f, "UInt64({v})"),
            Value::Float32(v) => write!(f, "Float32({v:?})"),
            Value::Float64(v) => write!(f, "Float64({v:?})"),
            Value::String(v) => write!(f, "String({v:?})"),
            Value::Binary(v) => write!(f, "Binary({v:?})"),
            Value::Date(v) => write!(f, "Date({v})"),
            Value::Timestamp(v) => write!(f, "Timestamp({v})"),
            Value::Duration(v) => write!(f, "Duration({v})"),
            Value::List(l) => nested(f, |f| {
                f.write_str("List")?;
                f.debug_list().entries(l.borrow().iter()).finish()
            }),
            Value::Set(l) => nested(f, |f| {
                f.write_str("Set")?;
                f.debug_set().entries(l.borrow().iter()).finish()
            }),
            Value::Map(m) => nested(f, |f| {
                f.write_str("Map")?;
                f.debug_map()
                    .entries(m.borrow().iter().map(|(k, v)| (k, v)))
                    .finish()
            }),
            Value::Enum(e) => write!(f, "Enum({}#{})", e.type_name, e.ordinal),
            Value::Record(r) => nested(f, |f| fmt::Debug::fmt(&*r.borrow(), f)),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(&self.type_name);
        for (name, value) in &self.fields {
            s.field(name, value);
        }
        s.finish()
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from!(
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    chrono::Duration => Duration,
    EnumValue => Enum,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        r.into_value()
    }
}

impl From<RecordRef> for Value {
    fn from(r: RecordRef) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
