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

//! Stable 31-bit type ids derived from qualified type names.
//!
//! The same pure function runs in schema compilers and at runtime
//! registration, so it must never change. Which inputs feed the hash is fixed
//! by this table:
//!
//! | input          | hashed into the id                  | used for by-name registration |
//! |----------------|-------------------------------------|-------------------------------|
//! | package        | yes, as the `package.` prefix       | yes, as the namespace         |
//! | package alias  | no                                  | no                            |
//! | type name      | yes, unless a type alias is present | yes, as the type name         |
//! | type alias     | yes, in place of the type name      | no                            |
//! | explicit id    | replaces the hash entirely          | no                            |
//!
//! When two types hash to the same generated id the first one keeps it and the
//! later one gets no id at all, falling back to registration by name.

use crate::meta::murmurhash::murmurhash3_x86_32;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Hashes a fully qualified name into a non-negative 31-bit id.
///
/// ```
/// use fory_xlang_core::meta::compute_registered_type_id;
///
/// assert_eq!(compute_registered_type_id("demo.User"), 89059757);
/// ```
pub fn compute_registered_type_id(full_name: &str) -> u32 {
    murmurhash3_x86_32(full_name.as_bytes(), 0) & 0x7FFF_FFFF
}

/// Naming inputs of one declared type, as written by a schema author.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeNaming {
    pub package: String,
    pub package_alias: Option<String>,
    pub type_name: String,
    pub type_alias: Option<String>,
    pub explicit_id: Option<u32>,
}

impl TypeNaming {
    pub fn new(package: &str, type_name: &str) -> Self {
        TypeNaming {
            package: package.to_string(),
            type_name: type_name.to_string(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.type_alias = Some(alias.to_string());
        self
    }

    pub fn package_alias(mut self, alias: &str) -> Self {
        self.package_alias = Some(alias.to_string());
        self
    }

    pub fn id(mut self, id: u32) -> Self {
        self.explicit_id = Some(id);
        self
    }

    /// The string fed to [`compute_registered_type_id`].
    pub fn id_source(&self) -> String {
        let name = self.type_alias.as_deref().unwrap_or(&self.type_name);
        qualify(&self.package, name)
    }

    /// Namespace and type name used when the type is registered by name.
    pub fn registration_name(&self) -> (&str, &str) {
        (&self.package, &self.type_name)
    }

    /// `package.type_name`, the name records of this type carry.
    pub fn qualified_name(&self) -> String {
        qualify(&self.package, &self.type_name)
    }
}

pub(crate) fn qualify(namespace: &str, type_name: &str) -> String {
    if namespace.is_empty() {
        type_name.to_string()
    } else {
        format!("{namespace}.{type_name}")
    }
}

/// Splits `a.b.C` into `("a.b", "C")`.
pub(crate) fn split_qualified(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    }
}

/// Outcome of assigning an id to one type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdAssignment {
    /// Declared by the schema author and used as is.
    Explicit(u32),
    /// Computed from `source`.
    Generated { id: u32, source: String },
    /// The generated id was already taken; the type registers by name.
    ByName,
}

impl IdAssignment {
    pub fn type_id(&self) -> Option<u32> {
        match self {
            IdAssignment::Explicit(id) => Some(*id),
            IdAssignment::Generated { id, .. } => Some(*id),
            IdAssignment::ByName => None,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, IdAssignment::Generated { .. })
    }
}

/// Assigns ids within one registry session, remembering which type owns each id.
#[derive(Debug, Default)]
pub struct TypeIdAllocator {
    owners: HashMap<u32, String>,
}

impl TypeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, naming: &TypeNaming) -> IdAssignment {
        if let Some(id) = naming.explicit_id {
            self.owners
                .entry(id)
                .or_insert_with(|| naming.qualified_name());
            return IdAssignment::Explicit(id);
        }
        let source = naming.id_source();
        let id = compute_registered_type_id(&source);
        match self.owners.entry(id) {
            Entry::Occupied(owner) => {
                log::warn!(
                    "generated type id {} for {} is already used by {}, registering by name",
                    id,
                    source,
                    owner.get()
                );
                IdAssignment::ByName
            }
            Entry::Vacant(slot) => {
                slot.insert(naming.qualified_name());
                IdAssignment::Generated { id, source }
            }
        }
    }

    /// The qualified name of the type that owns `id`, if any.
    pub fn owner(&self, id: u32) -> Option<&str> {
        self.owners.get(&id).map(String::as_str)
    }

    /// Records `owner` as the holder of `id`. Returns the current holder when
    /// the id is already taken by another type.
    pub fn claim(&mut self, id: u32, owner: &str) -> Result<(), String> {
        match self.owners.entry(id) {
            Entry::Occupied(existing) if existing.get() != owner => Err(existing.get().clone()),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(owner.to_string());
                Ok(())
            }
        }
    }

    pub fn release(&mut self, id: u32) {
        self.owners.remove(&id);
    }
}
