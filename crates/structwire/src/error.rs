// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generation-time errors.
//!
//! Everything here is detected while a schema is compiled. Errors raised by
//! the generated procedures themselves are plain `std::io::Error`s (or
//! [`crate::runtime::CodecError`] for the interpreter).

use thiserror::Error;

/// Failure to classify a single type or expression.
///
/// Carries no field name; the assembler wraps it into [`Error::Field`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The type cannot be represented on the wire.
    #[error("unsupported type: {0}")]
    Unsupported(String),

    /// The type is representable but its declaration is malformed.
    #[error("schema error: {0}")]
    Schema(String),
}

impl TypeError {
    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported(reason.into())
    }

    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        Self::Schema(reason.into())
    }
}

/// Errors returned by the schema assembler.
#[derive(Debug, Error)]
pub enum Error {
    /// A field could not be bound. `field` is qualified as `Struct.field`.
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: TypeError,
    },

    /// Struct-level problem (bad name, ...).
    #[error("struct '{name}': {reason}")]
    Struct { name: String, reason: String },

    /// The selection named types that the schema does not contain.
    #[error("types {0:?} were requested but not found")]
    MissingTypes(Vec<String>),

    /// The selection matched nothing.
    #[error("no structs selected")]
    NoStructs,

    /// The output sink rejected a compiled unit.
    #[error("output sink: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn field(strukt: &str, field: &str, source: TypeError) -> Self {
        Self::Field {
            field: format!("{strukt}.{field}"),
            source,
        }
    }

    /// True when the root cause is an unsupported type.
    pub fn is_unsupported_type(&self) -> bool {
        matches!(
            self,
            Self::Field {
                source: TypeError::Unsupported(_),
                ..
            }
        )
    }

    /// True when the root cause is a malformed declaration.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            Self::Field {
                source: TypeError::Schema(_),
                ..
            } | Self::Struct { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
