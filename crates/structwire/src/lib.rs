// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # structwire - struct schema to binary codec compiler
//!
//! Takes record types described as ordered, typed fields and produces a
//! decoder and an encoder for a compact, tag-free, little-endian layout.
//!
//! ## Quick Start
//!
//! ```rust
//! use structwire::{Assembler, RawField, RawStruct, RustRenderer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let packet = RawStruct::new("Packet")
//!     .field(RawField::new("n", "u8".parse()?))
//!     .field(RawField::new("a", "u16".parse()?))
//!     .field(RawField::new("c", "Vec<u8>".parse()?).with_len("n"));
//!
//! let mut units = Vec::new();
//! Assembler::default().run(&[packet], &mut units)?;
//!
//! let source = RustRenderer::new().render_unit(&units[0], true);
//! assert!(source.contains("pub fn read_from"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! provider -> Assembler::bind -> plan_fields -> emit -> OutputSink
//!  (RawStruct)   (InputStruct)    (SizeGroup)  (CodecUnit)
//! ```
//!
//! ## Wire format
//!
//! Fields are concatenated in declaration order. Multi-byte scalars are
//! little-endian, floats travel as their IEEE bit pattern. There are no type
//! tags and no length prefixes: a sequence's element count is computed from
//! earlier fields through its length expression.
//!
//! ## Modules Overview
//!
//! - [`types`] - field type model and alias resolution
//! - [`expr`] - length expressions
//! - [`plan`] - grouping of fields into reads
//! - [`ir`] / [`emit`] - decode and encode statement lists
//! - [`assemble`] - schema assembler and output sink trait
//! - [`render`] - Rust source output
//! - [`runtime`] - interpreter for compiled units

pub mod assemble;
pub mod emit;
pub mod error;
pub mod expr;
pub mod ir;
pub mod plan;
pub mod render;
pub mod runtime;
pub mod schema;
pub mod select;
pub mod types;

pub use assemble::{Assembler, OutputSink, Report};
pub use emit::compile;
pub use error::{Error, Result, TypeError};
pub use expr::{BinOp, EvalError, LenExpr};
pub use ir::{CodecUnit, DecodeStmt, EncodeStmt, Place, ReadLen, READ_CHUNK};
pub use plan::{plan_fields, GroupKind, Plan, SizeGroup};
pub use render::RustRenderer;
pub use runtime::{Codec, CodecError, Record, Value};
pub use schema::{InputStruct, RawField, RawSchema, RawStruct, StructField};
pub use select::Selection;
pub use types::{BasicKind, FieldType, NamedTypes, SimpleType, SizeExpr, TypeDesc};
