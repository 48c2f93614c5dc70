// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct schemas: raw provider input and the bound, typed form.

use crate::error::{Error, Result, TypeError};
use crate::types::{FieldType, NamedTypes, TypeDesc};
use std::collections::HashSet;

/// One field as supplied by an input provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub ty: TypeDesc,
    /// Element count expression; only valid on sequences.
    pub len: Option<String>,
}

impl RawField {
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            len: None,
        }
    }

    #[must_use]
    pub fn with_len(mut self, expr: impl Into<String>) -> Self {
        self.len = Some(expr.into());
        self
    }
}

/// One struct as supplied by an input provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStruct {
    pub name: String,
    pub fields: Vec<RawField>,
}

impl RawStruct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: RawField) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<RawField>) -> Self {
        self.fields = fields;
        self
    }
}

/// Everything a provider hands over for one invocation.
#[derive(Debug, Clone, Default)]
pub struct RawSchema {
    pub aliases: NamedTypes,
    pub structs: Vec<RawStruct>,
}

/// A classified field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    name: String,
    ty: FieldType,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }
}

/// A bound struct: fields in declaration (= wire) order, all validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputStruct {
    name: String,
    fields: Vec<StructField>,
}

impl InputStruct {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn field(&self, idx: usize) -> Option<&StructField> {
        self.fields.get(idx)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Bind provider fields.
    ///
    /// The first failing field aborts the whole struct.
    pub fn bind(raw: &RawStruct, aliases: &NamedTypes) -> Result<Self> {
        if !is_identifier(&raw.name) {
            return Err(Error::Struct {
                name: raw.name.clone(),
                reason: "name is not a valid identifier".into(),
            });
        }

        let mut fields: Vec<StructField> = Vec::with_capacity(raw.fields.len());
        let mut seen = HashSet::new();

        for rf in &raw.fields {
            let fail = |source: TypeError| Error::field(&raw.name, &rf.name, source);

            if !is_identifier(&rf.name) {
                return Err(fail(TypeError::schema("name is not a valid identifier")));
            }
            if !seen.insert(rf.name.as_str()) {
                return Err(fail(TypeError::schema("duplicate field name")));
            }

            let ty = aliases.classify(&rf.ty, rf.len.as_deref()).map_err(fail)?;
            if let FieldType::Sequence { len, .. } = &ty {
                for name in len.fields() {
                    check_len_reference(&fields, name).map_err(fail)?;
                }
            }
            fields.push(StructField::new(rf.name.clone(), ty));
        }

        Ok(Self {
            name: raw.name.clone(),
            fields,
        })
    }
}

/// A length expression may only read unsigned Simple fields decoded earlier.
fn check_len_reference(earlier: &[StructField], name: &str) -> std::result::Result<(), TypeError> {
    let Some(field) = earlier.iter().find(|f| f.name == name) else {
        return Err(TypeError::schema(format!(
            "length expression references '{name}', which is not a preceding field"
        )));
    };
    match field.ty() {
        FieldType::Simple(s) if s.kind().is_unsigned() => Ok(()),
        other => Err(TypeError::schema(format!(
            "length expression references '{name}' of type {other}; only unsigned integer fields can supply a length"
        ))),
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !matches!(name, "_" | "self" | "Self" | "super" | "crate")
}
