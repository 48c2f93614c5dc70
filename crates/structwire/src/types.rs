// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field type model.
//!
//! Every field of a wire struct is exactly one of:
//!
//! - **Simple**: a 1/2/4/8 byte integer or float, optionally behind a named alias
//! - **Array**: a fixed number of Simple elements
//! - **Sequence**: a runtime number of Simple elements, counted by a [`LenExpr`]
//!
//! Constructors validate; once built a `FieldType` is always encodable.

use crate::error::TypeError;
use crate::expr::LenExpr;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Primitive wire kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl BasicKind {
    pub const ALL: [BasicKind; 10] = [
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::U64,
        Self::I64,
        Self::F32,
        Self::F64,
    ];

    /// Look up a basic kind by its Rust name.
    ///
    /// Returns `Ok(None)` for names that are not basic kinds at all (they may
    /// still be aliases), and an error for primitives that cannot go on the
    /// wire.
    pub fn lookup(name: &str) -> Result<Option<Self>, TypeError> {
        let kind = match name {
            "u8" => Self::U8,
            "i8" => Self::I8,
            "u16" => Self::U16,
            "i16" => Self::I16,
            "u32" => Self::U32,
            "i32" => Self::I32,
            "u64" => Self::U64,
            "i64" => Self::I64,
            "f32" => Self::F32,
            "f64" => Self::F64,
            "usize" | "isize" => {
                return Err(TypeError::unsupported(format!(
                    "{name}: type size differs based on platform, please choose an exact-sized one"
                )))
            }
            "bool" | "char" | "str" | "String" | "u128" | "i128" => {
                return Err(TypeError::unsupported(format!("{name} has no wire representation")))
            }
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }

    /// Build a kind from its bit width and classification.
    pub fn from_width(bits: u32, integer: bool, signed: bool) -> Result<Self, TypeError> {
        let kind = match (bits, integer, signed) {
            (8, true, false) => Self::U8,
            (8, true, true) => Self::I8,
            (16, true, false) => Self::U16,
            (16, true, true) => Self::I16,
            (32, true, false) => Self::U32,
            (32, true, true) => Self::I32,
            (64, true, false) => Self::U64,
            (64, true, true) => Self::I64,
            (32, false, _) => Self::F32,
            (64, false, _) => Self::F64,
            (bits, true, _) => {
                return Err(TypeError::schema(format!(
                    "integer width of {bits} bits is not one of 8, 16, 32, 64"
                )))
            }
            (bits, false, _) => {
                return Err(TypeError::unsupported(format!("{bits}-bit float")))
            }
        };
        Ok(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    pub fn bit_width(self) -> u32 {
        self.size() as u32 * 8
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    pub fn is_unsigned(self) -> bool {
        self.is_integer() && !self.is_signed()
    }

    /// Unsigned kind of the same width; bytes are always extracted through it.
    pub fn unsigned(self) -> Self {
        match self.size() {
            1 => Self::U8,
            2 => Self::U16,
            4 => Self::U32,
            _ => Self::U64,
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar field type, possibly behind a named alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleType {
    alias: Option<String>,
    kind: BasicKind,
}

impl SimpleType {
    pub fn basic(kind: BasicKind) -> Self {
        Self { alias: None, kind }
    }

    pub fn named(alias: impl Into<String>, kind: BasicKind) -> Self {
        Self {
            alias: Some(alias.into()),
            kind,
        }
    }

    /// The name used in generated code (alias name if any).
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.kind.name())
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Underlying basic kind.
    pub fn kind(&self) -> BasicKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.kind.size()
    }

    /// Integer-like types need no bit reinterpretation when packed.
    pub fn is_integer(&self) -> bool {
        self.kind.is_integer()
    }
}

/// Textual size of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeExpr {
    Const(usize),
    /// `unit * (count)` bytes.
    Scaled { unit: usize, count: LenExpr },
}

impl fmt::Display for SizeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(n) => write!(f, "{n}"),
            Self::Scaled { unit, count } => match count {
                LenExpr::Binary(..) => write!(f, "{unit} * ({count})"),
                _ => write!(f, "{unit} * {count}"),
            },
        }
    }
}

/// Wire classification of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Simple(SimpleType),
    Array { elem: SimpleType, len: usize },
    Sequence { elem: SimpleType, len: LenExpr },
}

impl FieldType {
    pub fn array(elem: SimpleType, len: usize) -> Result<Self, TypeError> {
        if elem.size().checked_mul(len).is_none() {
            return Err(TypeError::schema(format!(
                "array of {len} x {} does not fit in memory",
                elem.display_name()
            )));
        }
        Ok(Self::Array { elem, len })
    }

    pub fn sequence(elem: SimpleType, len: LenExpr) -> Self {
        Self::Sequence { elem, len }
    }

    /// Total byte size, `None` when only known at runtime.
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Simple(s) => Some(s.size()),
            Self::Array { elem, len } => elem.size().checked_mul(*len),
            Self::Sequence { .. } => None,
        }
    }

    pub fn is_fixed_size(&self) -> bool {
        self.size().is_some()
    }

    pub fn size_expr(&self) -> SizeExpr {
        match self {
            Self::Simple(s) => SizeExpr::Const(s.size()),
            Self::Array { elem, len } => match elem.size().checked_mul(*len) {
                Some(n) => SizeExpr::Const(n),
                None => SizeExpr::Scaled {
                    unit: elem.size(),
                    count: LenExpr::Const(*len as u64),
                },
            },
            Self::Sequence { elem, len } => SizeExpr::Scaled {
                unit: elem.size(),
                count: len.clone(),
            },
        }
    }

    /// Scalar type of the field or of its elements.
    pub fn scalar(&self) -> &SimpleType {
        match self {
            Self::Simple(s) => s,
            Self::Array { elem, .. } | Self::Sequence { elem, .. } => elem,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Simple(s) if s.is_integer())
    }

    /// True for arrays and sequences.
    pub fn is_sequence(&self) -> bool {
        !matches!(self, Self::Simple(_))
    }

    /// Rust spelling of the type.
    pub fn rust_type(&self) -> String {
        match self {
            Self::Simple(s) => s.display_name().to_string(),
            Self::Array { elem, len } => format!("[{}; {len}]", elem.display_name()),
            Self::Sequence { elem, .. } => format!("Vec<{}>", elem.display_name()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rust_type())
    }
}

/// Declared type as written by a provider, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// Basic kind or alias name.
    Named(String),
    Array { elem: Box<TypeDesc>, len: usize },
    /// Runtime-length collection; the count comes from the field's length expression.
    Sequence { elem: Box<TypeDesc> },
}

impl TypeDesc {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn array(elem: TypeDesc, len: usize) -> Self {
        Self::Array {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn sequence(elem: TypeDesc) -> Self {
        Self::Sequence {
            elem: Box::new(elem),
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence { .. })
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            Self::Sequence { elem } => write!(f, "Vec<{elem}>"),
        }
    }
}

/// Parses `u8`, `Alias`, `[T; N]` and `Vec<T>`.
impl FromStr for TypeDesc {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let (elem, len) = inner
                .rsplit_once(';')
                .ok_or_else(|| TypeError::schema(format!("array type '{s}' lacks a length")))?;
            let len = len.trim().replace('_', "");
            let len: usize = len
                .parse()
                .map_err(|_| TypeError::schema(format!("invalid array length in '{s}'")))?;
            return Ok(Self::array(elem.parse()?, len));
        }
        if let Some(inner) = s.strip_prefix("Vec<").and_then(|r| r.strip_suffix('>')) {
            return Ok(Self::sequence(inner.parse()?));
        }
        let valid = s.chars().next().is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
            && s.chars().all(|c| c == '_' || c.is_ascii_alphanumeric());
        if !valid {
            return Err(TypeError::unsupported(format!("'{s}'")));
        }
        Ok(Self::named(s))
    }
}

/// Alias table mapping named types to their underlying representation.
///
/// A target may be a basic kind or another alias; chains are resolved to a
/// basic kind once, when a field is classified.
#[derive(Debug, Clone, Default)]
pub struct NamedTypes {
    aliases: HashMap<String, String>,
}

impl NamedTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, underlying: impl Into<String>) {
        self.aliases.insert(name.into(), underlying.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, underlying: impl Into<String>) -> Self {
        self.insert(name, underlying);
        self
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Resolve a type name to a Simple type.
    pub fn resolve(&self, name: &str) -> Result<SimpleType, TypeError> {
        if let Some(kind) = BasicKind::lookup(name)? {
            return Ok(SimpleType::basic(kind));
        }

        let mut current = name;
        // Each hop visits a distinct alias, so a longer chain must loop.
        for _ in 0..=self.aliases.len() {
            let Some(next) = self.aliases.get(current) else {
                return Err(TypeError::unsupported(if current == name {
                    format!("unknown type '{name}'")
                } else {
                    format!("'{name}' resolves to unknown type '{current}'")
                }));
            };
            match BasicKind::lookup(next) {
                Ok(Some(kind)) => return Ok(SimpleType::named(name, kind)),
                Ok(None) => current = next,
                Err(TypeError::Unsupported(reason)) => {
                    return Err(TypeError::unsupported(format!(
                        "underlying type of '{name}': {reason}"
                    )))
                }
                Err(other) => return Err(other),
            }
        }
        Err(TypeError::unsupported(format!("alias cycle through '{name}'")))
    }

    /// Classify a declared type.
    ///
    /// `len_expr` is the field's length expression; it is required for
    /// sequences and rejected everywhere else.
    pub fn classify(&self, desc: &TypeDesc, len_expr: Option<&str>) -> Result<FieldType, TypeError> {
        if len_expr.is_some() && !desc.is_sequence() {
            return Err(TypeError::schema(format!(
                "length expression given for non-sequence type {desc}"
            )));
        }
        match desc {
            TypeDesc::Named(name) => Ok(FieldType::Simple(self.resolve(name)?)),
            TypeDesc::Array { elem, len } => FieldType::array(self.element(elem)?, *len),
            TypeDesc::Sequence { elem } => {
                let elem = self.element(elem)?;
                let Some(src) = len_expr else {
                    return Err(TypeError::schema(format!(
                        "length of Vec<{}> cannot be determined; supply a length expression",
                        elem.display_name()
                    )));
                };
                Ok(FieldType::sequence(elem, LenExpr::parse(src)?))
            }
        }
    }

    fn element(&self, desc: &TypeDesc) -> Result<SimpleType, TypeError> {
        match desc {
            TypeDesc::Named(name) => self.resolve(name),
            nested => Err(TypeError::unsupported(format!(
                "nested collection ({nested} as element)"
            ))),
        }
    }
}
