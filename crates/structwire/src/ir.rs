// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Statement IR produced by the emitter.
//!
//! Procedures are flat, ordered statement lists with no target syntax. The
//! Rust renderer turns them into source; the runtime interpreter executes
//! them directly.
//!
//! Decode state: one scratch buffer. Each `ReadBytes` overwrites it from
//! offset 0, and every following `EmitByteOr` reads at an offset resolved at
//! emit time. Element `i` of an `Elements` place lives at
//! `offset + i * scalar.size()`.
//!
//! Encode state: one output buffer, appended to in declaration order and
//! written once by `WriteAll`.

use crate::expr::LenExpr;
use crate::plan::SizeGroup;
use crate::schema::StructField;
use crate::types::SimpleType;
use std::fmt;

/// Where a scalar value goes to (decode) or comes from (encode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Place {
    /// A Simple field.
    Field(String),
    /// Every element of an array or sequence field, in order.
    Elements(String),
}

impl Place {
    pub fn field(&self) -> &str {
        match self {
            Self::Field(name) | Self::Elements(name) => name,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Elements(name) => write!(f, "{name}[..]"),
        }
    }
}

/// Largest step a counted read grows the scratch buffer by.
///
/// Sequence counts come off the wire, so the buffer only grows as bytes
/// actually arrive.
pub const READ_CHUNK: usize = 64 * 1024;

/// Byte count of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLen {
    Fixed(usize),
    /// `len(field) * unit` bytes, using the count bound by `EvalLen`.
    Counted { field: String, unit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStmt {
    /// Allocate the scratch buffer.
    Scratch(usize),
    /// Evaluate a sequence's element count and bind it to `field`.
    EvalLen { field: String, expr: LenExpr },
    /// Fill the scratch buffer from the reader; grows it when needed, at
    /// most `READ_CHUNK` bytes ahead of the data read so far.
    ReadBytes(ReadLen),
    /// Create a fixed-length container for `field`.
    AllocArray {
        field: String,
        len: usize,
        elem: SimpleType,
    },
    /// Create a container for `field` holding its bound element count.
    AllocSequence { field: String, elem: SimpleType },
    /// Rebuild a scalar from little-endian bytes at `offset`.
    EmitByteOr {
        place: Place,
        scalar: SimpleType,
        offset: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeStmt {
    /// Evaluate a sequence's expected element count and bind it to `field`.
    EvalLen { field: String, expr: LenExpr },
    /// Fail unless `field` holds exactly its bound element count.
    CheckLen { field: String },
    /// Allocate the output buffer: `fixed` plus `len(f) * unit` per counted field.
    Reserve {
        fixed: usize,
        counted: Vec<(String, usize)>,
    },
    /// Append the little-endian bytes of a scalar.
    AppendBytes { place: Place, scalar: SimpleType },
    /// Write the output buffer and report its length.
    WriteAll,
}

impl fmt::Display for DecodeStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scratch(n) => write!(f, "scratch {n}"),
            Self::EvalLen { field, expr } => write!(f, "len {field} = {expr}"),
            Self::ReadBytes(ReadLen::Fixed(n)) => write!(f, "read {n}"),
            Self::ReadBytes(ReadLen::Counted { field, unit }) => {
                write!(f, "read len({field}) * {unit}")
            }
            Self::AllocArray { field, len, elem } => {
                write!(f, "alloc {field}: [{}; {len}]", elem.display_name())
            }
            Self::AllocSequence { field, elem } => {
                write!(f, "alloc {field}: Vec<{}>", elem.display_name())
            }
            Self::EmitByteOr {
                place,
                scalar,
                offset,
            } => write!(f, "load {place}: {} @{offset}", scalar.display_name()),
        }
    }
}

impl fmt::Display for EncodeStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvalLen { field, expr } => write!(f, "len {field} = {expr}"),
            Self::CheckLen { field } => write!(f, "check len({field})"),
            Self::Reserve { fixed, counted } => {
                write!(f, "reserve {fixed}")?;
                for (field, unit) in counted {
                    write!(f, " + len({field}) * {unit}")?;
                }
                Ok(())
            }
            Self::AppendBytes { place, scalar } => {
                write!(f, "store {place}: {}", scalar.display_name())
            }
            Self::WriteAll => f.write_str("write"),
        }
    }
}

/// Compiled codec for one struct; what an output sink receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecUnit {
    pub name: String,
    pub fields: Vec<StructField>,
    pub groups: Vec<SizeGroup>,
    pub decode: Vec<DecodeStmt>,
    pub encode: Vec<EncodeStmt>,
    /// Sum of all fixed-size groups.
    pub fixed_size: usize,
}

impl CodecUnit {
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// True when every field has a size known at generation time.
    pub fn is_fixed_size(&self) -> bool {
        self.groups.iter().all(SizeGroup::is_fixed)
    }
}
