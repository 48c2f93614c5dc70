// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic codec runtime.
//!
//! Executes a [`CodecUnit`]'s statement lists directly against [`Record`]
//! values, without generating code. Produces exactly the bytes the rendered
//! Rust procedures produce.

use crate::expr::EvalError;
use crate::ir::{CodecUnit, DecodeStmt, EncodeStmt, Place, ReadLen, READ_CHUNK};
use crate::types::{BasicKind, FieldType, SimpleType};
use std::collections::HashMap;
use std::io::{Read, Write};
use thiserror::Error;

/// Runtime value of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Array(Vec<Value>),
    Sequence(Vec<Value>),
}

impl Value {
    /// Zero value of a basic kind.
    pub fn zero(kind: BasicKind) -> Self {
        Self::from_bits(kind, 0)
    }

    /// Reinterpret the low `kind.size()` bytes of `bits`.
    pub fn from_bits(kind: BasicKind, bits: u64) -> Self {
        match kind {
            BasicKind::U8 => Self::U8(bits as u8),
            BasicKind::I8 => Self::I8(bits as u8 as i8),
            BasicKind::U16 => Self::U16(bits as u16),
            BasicKind::I16 => Self::I16(bits as u16 as i16),
            BasicKind::U32 => Self::U32(bits as u32),
            BasicKind::I32 => Self::I32(bits as u32 as i32),
            BasicKind::U64 => Self::U64(bits),
            BasicKind::I64 => Self::I64(bits as i64),
            BasicKind::F32 => Self::F32(f32::from_bits(bits as u32)),
            BasicKind::F64 => Self::F64(f64::from_bits(bits)),
        }
    }

    /// Basic kind of a scalar value.
    pub fn kind(&self) -> Option<BasicKind> {
        let kind = match self {
            Self::U8(_) => BasicKind::U8,
            Self::I8(_) => BasicKind::I8,
            Self::U16(_) => BasicKind::U16,
            Self::I16(_) => BasicKind::I16,
            Self::U32(_) => BasicKind::U32,
            Self::I32(_) => BasicKind::I32,
            Self::U64(_) => BasicKind::U64,
            Self::I64(_) => BasicKind::I64,
            Self::F32(_) => BasicKind::F32,
            Self::F64(_) => BasicKind::F64,
            Self::Array(_) | Self::Sequence(_) => return None,
        };
        Some(kind)
    }

    /// Unsigned bit pattern of a scalar, zero-extended to 64 bits.
    pub fn to_bits(&self) -> Option<u64> {
        let bits = match *self {
            Self::U8(v) => u64::from(v),
            Self::I8(v) => u64::from(v as u8),
            Self::U16(v) => u64::from(v),
            Self::I16(v) => u64::from(v as u16),
            Self::U32(v) => u64::from(v),
            Self::I32(v) => u64::from(v as u32),
            Self::U64(v) => v,
            Self::I64(v) => v as u64,
            Self::F32(v) => u64::from(v.to_bits()),
            Self::F64(v) => v.to_bits(),
            Self::Array(_) | Self::Sequence(_) => return None,
        };
        Some(bits)
    }

    /// Value of an unsigned integer scalar.
    pub fn as_unsigned(&self) -> Option<u64> {
        match *self {
            Self::U8(v) => Some(u64::from(v)),
            Self::U16(v) => Some(u64::from(v)),
            Self::U32(v) => Some(u64::from(v)),
            Self::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) | Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    fn as_elements_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(v) | Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    fn type_name(&self) -> String {
        match self {
            Self::Array(v) => format!("array of {}", v.len()),
            Self::Sequence(v) => format!("sequence of {}", v.len()),
            scalar => scalar
                .kind()
                .map(|k| k.name().to_string())
                .unwrap_or_default(),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    u8 => U8, i8 => I8, u16 => U16, i16 => I16, u32 => U32,
    i32 => I32, u64 => U64, i64 => I64, f32 => F32, f64 => F64,
}

/// Field values in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a field, keeping the original position on replace.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Errors raised while executing a codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record has no field '{0}'")]
    MissingField(String),

    #[error("field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("field '{field}' holds {found} elements, {expected} required")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("length of '{field}': {reason}")]
    Length { field: String, reason: String },
}

impl CodecError {
    fn length(field: &str, reason: impl ToString) -> Self {
        Self::Length {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True when the stream ended before the record was complete.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

/// Executes one compiled unit.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'a> {
    unit: &'a CodecUnit,
}

impl<'a> Codec<'a> {
    pub fn new(unit: &'a CodecUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> &'a CodecUnit {
        self.unit
    }

    /// Run the decode procedure.
    pub fn decode<R: Read + ?Sized>(&self, r: &mut R) -> Result<Record, CodecError> {
        let mut buf: Vec<u8> = Vec::new();
        let mut lens: HashMap<&str, usize> = HashMap::new();
        let mut values: HashMap<&str, Value> = HashMap::new();

        for stmt in &self.unit.decode {
            match stmt {
                DecodeStmt::Scratch(n) => buf = vec![0u8; *n],
                DecodeStmt::EvalLen { field, expr } => {
                    let count = expr.eval(&mut |name| values.get(name).and_then(Value::as_unsigned));
                    lens.insert(field, to_count(field, count)?);
                }
                DecodeStmt::ReadBytes(ReadLen::Fixed(n)) => {
                    if buf.len() < *n {
                        buf.resize(*n, 0);
                    }
                    r.read_exact(&mut buf[..*n])?;
                }
                DecodeStmt::ReadBytes(ReadLen::Counted { field, unit }) => {
                    let n = bound_len(&lens, field)?
                        .checked_mul(*unit)
                        .ok_or_else(|| CodecError::length(field, "byte length overflows usize"))?;
                    read_counted(r, &mut buf, n)?;
                }
                DecodeStmt::AllocArray { field, len, elem } => {
                    values.insert(field, Value::Array(vec![Value::zero(elem.kind()); *len]));
                }
                DecodeStmt::AllocSequence { field, elem } => {
                    let count = bound_len(&lens, field)?;
                    values.insert(field, Value::Sequence(vec![Value::zero(elem.kind()); count]));
                }
                DecodeStmt::EmitByteOr {
                    place: Place::Field(field),
                    scalar,
                    offset,
                } => {
                    let bits = byte_or(&buf, *offset, scalar.size())
                        .ok_or_else(|| CodecError::length(field, "scratch buffer underrun"))?;
                    values.insert(field, Value::from_bits(scalar.kind(), bits));
                }
                DecodeStmt::EmitByteOr {
                    place: Place::Elements(field),
                    scalar,
                    offset,
                } => {
                    let elems = values
                        .get_mut(field.as_str())
                        .and_then(Value::as_elements_mut)
                        .ok_or_else(|| CodecError::MissingField(field.clone()))?;
                    let size = scalar.size();
                    for (i, v) in elems.iter_mut().enumerate() {
                        let bits = byte_or(&buf, offset + i * size, size)
                            .ok_or_else(|| CodecError::length(field, "scratch buffer underrun"))?;
                        *v = Value::from_bits(scalar.kind(), bits);
                    }
                }
            }
        }

        let mut record = Record::new();
        for field in &self.unit.fields {
            let value = values
                .remove(field.name())
                .ok_or_else(|| CodecError::MissingField(field.name().to_string()))?;
            record.set(field.name(), value);
        }
        log::trace!("decoded {} ({} fields)", self.unit.name, record.len());
        Ok(record)
    }

    /// Run the encode procedure; returns the number of bytes written.
    pub fn encode<W: Write + ?Sized>(&self, record: &Record, w: &mut W) -> Result<usize, CodecError> {
        let mut lens: HashMap<&str, usize> = HashMap::new();
        let mut buf: Vec<u8> = Vec::new();

        for stmt in &self.unit.encode {
            match stmt {
                EncodeStmt::EvalLen { field, expr } => {
                    let count = expr.eval(&mut |name| record.get(name).and_then(Value::as_unsigned));
                    lens.insert(field, to_count(field, count)?);
                }
                EncodeStmt::CheckLen { field } => {
                    let expected = bound_len(&lens, field)?;
                    let found = elements(record, field)?.len();
                    if found != expected {
                        return Err(CodecError::LengthMismatch {
                            field: field.clone(),
                            expected,
                            found,
                        });
                    }
                }
                EncodeStmt::Reserve { fixed, counted } => {
                    let mut capacity = *fixed;
                    for (field, unit) in counted {
                        let count = bound_len(&lens, field)?;
                        capacity = capacity.saturating_add(count.saturating_mul(*unit));
                    }
                    buf = Vec::with_capacity(capacity);
                }
                EncodeStmt::AppendBytes {
                    place: Place::Field(field),
                    scalar,
                } => {
                    let value = record
                        .get(field)
                        .ok_or_else(|| CodecError::MissingField(field.clone()))?;
                    append(&mut buf, field, scalar, value)?;
                }
                EncodeStmt::AppendBytes {
                    place: Place::Elements(field),
                    scalar,
                } => {
                    let elems = elements(record, field)?;
                    if let Some(FieldType::Array { len, .. }) = self.unit.field(field).map(|f| f.ty()) {
                        if elems.len() != *len {
                            return Err(CodecError::LengthMismatch {
                                field: field.clone(),
                                expected: *len,
                                found: elems.len(),
                            });
                        }
                    }
                    for value in elems {
                        append(&mut buf, field, scalar, value)?;
                    }
                }
                EncodeStmt::WriteAll => {
                    w.write_all(&buf)?;
                }
            }
        }
        log::trace!("encoded {} into {} bytes", self.unit.name, buf.len());
        Ok(buf.len())
    }

    pub fn encode_to_vec(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        self.encode(record, &mut out)?;
        Ok(out)
    }

    pub fn decode_from_slice(&self, mut bytes: &[u8]) -> Result<Record, CodecError> {
        self.decode(&mut bytes)
    }
}

/// Fill `buf[..n]`, growing it at most `READ_CHUNK` bytes past what was read.
fn read_counted<R: Read + ?Sized>(r: &mut R, buf: &mut Vec<u8>, n: usize) -> std::io::Result<()> {
    let mut filled = 0;
    while filled < n {
        let end = n.min(filled.saturating_add(READ_CHUNK));
        if buf.len() < end {
            buf.resize(end, 0);
        }
        r.read_exact(&mut buf[filled..end])?;
        filled = end;
    }
    Ok(())
}

fn to_count(field: &str, count: Result<u64, EvalError>) -> Result<usize, CodecError> {
    let count = count.map_err(|e| CodecError::length(field, e))?;
    usize::try_from(count).map_err(|_| CodecError::length(field, format!("{count} does not fit in usize")))
}

fn bound_len(lens: &HashMap<&str, usize>, field: &str) -> Result<usize, CodecError> {
    lens.get(field)
        .copied()
        .ok_or_else(|| CodecError::length(field, "not evaluated"))
}

fn elements<'r>(record: &'r Record, field: &str) -> Result<&'r [Value], CodecError> {
    let value = record
        .get(field)
        .ok_or_else(|| CodecError::MissingField(field.to_string()))?;
    value.as_elements().ok_or_else(|| CodecError::TypeMismatch {
        field: field.to_string(),
        expected: "array or sequence".into(),
        found: value.type_name(),
    })
}

/// Little-endian OR of `size` bytes at `offset`.
fn byte_or(buf: &[u8], offset: usize, size: usize) -> Option<u64> {
    let bytes = buf.get(offset..offset.checked_add(size)?)?;
    Some(
        bytes
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | u64::from(*b) << (8 * i)),
    )
}

fn append(buf: &mut Vec<u8>, field: &str, scalar: &SimpleType, value: &Value) -> Result<(), CodecError> {
    let bits = match value.kind() {
        Some(kind) if kind == scalar.kind() => value.to_bits(),
        _ => None,
    };
    let Some(bits) = bits else {
        return Err(CodecError::TypeMismatch {
            field: field.to_string(),
            expected: scalar.kind().name().to_string(),
            found: value.type_name(),
        });
    };
    for i in 0..scalar.size() {
        buf.push((bits >> (8 * i)) as u8);
    }
    Ok(())
}
