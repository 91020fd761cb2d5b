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

//! Error type shared by every encode, decode and registration path.
//!
//! Constructors are kept `#[cold]` so the success paths that call them stay
//! small enough to inline. Build with `FORY_PANIC_ON_ERROR=1` to turn every
//! error into a panic at the place it was created.

use std::borrow::Cow;

use thiserror::Error;

/// Set `FORY_PANIC_ON_ERROR` at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("FORY_PANIC_ON_ERROR").is_some();

/// Whether errors panic at their creation site instead of being returned.
#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Which guardrail ceiling a declared size ran into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitKind {
    Collection,
    Map,
    String,
    Binary,
}

impl LimitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKind::Collection => "collection length",
            LimitKind::Map => "map entry count",
            LimitKind::String => "string byte length",
            LimitKind::Binary => "binary size",
        }
    }
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for registration, serialization and deserialization.
///
/// Always build errors through the static constructors ([`Error::invalid_ref`],
/// [`Error::size_limit_exceeded`], ...) rather than the variants, so that the
/// `FORY_PANIC_ON_ERROR` switch sees every error.
///
/// ```rust
/// use fory_xlang_core::error::Error;
///
/// let err = Error::invalid_ref(format!("invalid reference id {}", 7));
/// assert!(err.to_string().contains("invalid reference id"));
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Read or skip past the end of the input.
    #[error("Buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// Back-reference to a slot that was never populated.
    #[error("{0}")]
    InvalidRef(Cow<'static, str>),

    #[error("{0}")]
    UnknownEnum(Cow<'static, str>),

    #[error("{0}")]
    TypeError(Cow<'static, str>),

    /// Nesting went deeper than `Config::max_depth`.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    #[error("{0}")]
    Unsupported(Cow<'static, str>),

    #[error("{0}")]
    NotAllowed(Cow<'static, str>),

    /// Strict-mode version hash disagreement.
    #[error("{0}")]
    StructVersionMismatch(Cow<'static, str>),

    /// A record type was used without being registered.
    #[error("{0}")]
    TypeUnregistered(Cow<'static, str>),

    /// A declared size was larger than the configured ceiling.
    #[error("{kind} {len} exceeds the configured limit of {limit}")]
    SizeLimitExceeded {
        kind: LimitKind,
        len: usize,
        limit: usize,
    },

    /// A value does not fit the fixed-width wire type declared for it.
    #[error("{0}")]
    Overflow(Cow<'static, str>),
}

macro_rules! cold_error {
    ($err:expr) => {{
        let err = $err;
        if PANIC_ON_ERROR {
            panic!("FORY_PANIC_ON_ERROR: {}", err);
        }
        err
    }};
}

impl Error {
    /// Creates a new [`Error::BufferOutOfBound`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        cold_error!(Error::BufferOutOfBound(offset, length, capacity))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::InvalidData(s.into()))
    }

    /// Creates a new [`Error::InvalidRef`].
    ///
    /// Decoders raise this for a back-reference outside the populated slot
    /// range; such a reference is never read as null.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_ref<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::InvalidRef(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_enum<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::UnknownEnum(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_error<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::TypeError(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn depth_exceed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::DepthExceed(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unsupported<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::Unsupported(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn not_allowed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::NotAllowed(s.into()))
    }

    /// Creates a new [`Error::StructVersionMismatch`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn struct_version_mismatch<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::StructVersionMismatch(s.into()))
    }

    /// Creates a new [`Error::TypeUnregistered`] naming the missing type.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_unregistered<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::TypeUnregistered(s.into()))
    }

    /// Creates a new [`Error::SizeLimitExceeded`].
    ///
    /// ```
    /// use fory_xlang_core::error::{Error, LimitKind};
    ///
    /// let err = Error::size_limit_exceeded(LimitKind::Collection, 11, 10);
    /// assert_eq!(
    ///     err.to_string(),
    ///     "collection length 11 exceeds the configured limit of 10"
    /// );
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn size_limit_exceeded(kind: LimitKind, len: usize, limit: usize) -> Self {
        cold_error!(Error::SizeLimitExceeded { kind, len, limit })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn overflow<S: Into<Cow<'static, str>>>(s: S) -> Self {
        cold_error!(Error::Overflow(s.into()))
    }
}

/// Ensures a condition is true; otherwise returns the given [`enum@Error`].
///
/// ```
/// use fory_xlang_core::ensure;
/// use fory_xlang_core::error::Error;
///
/// fn check_value(n: i32) -> Result<(), Error> {
///     ensure!(n > 0, Error::invalid_data("value must be positive"));
///     ensure!(n < 10, Error::invalid_data(format!("value {n} too large")));
///     Ok(())
/// }
/// assert!(check_value(3).is_ok());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// Returns early with an [`Error::NotAllowed`].
///
/// ```
/// use fory_xlang_core::not_allowed;
/// use fory_xlang_core::error::Error;
///
/// fn register_twice(name: &str) -> Result<(), Error> {
///     not_allowed!("type {} is already registered", name);
/// }
/// ```
#[macro_export]
macro_rules! not_allowed {
    ($err:expr) => {
        return Err($crate::error::Error::not_allowed($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::not_allowed(format!($fmt, $($arg)*)))
    };
}
