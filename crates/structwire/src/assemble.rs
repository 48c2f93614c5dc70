// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema assembler.
//!
//! Drives one invocation: select structs, bind them against the alias table,
//! plan and emit each, then hand the finished units to an [`OutputSink`].
//! Binding and compilation of every selected struct complete before the sink
//! sees the first unit, so a bad field anywhere leaves the sink untouched.

use crate::emit;
use crate::error::{Error, Result};
use crate::ir::CodecUnit;
use crate::schema::{InputStruct, RawSchema, RawStruct};
use crate::select::Selection;
use crate::types::NamedTypes;
use std::fmt;

/// Receives compiled codec units, one per selected struct, in schema order.
pub trait OutputSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn accept(&mut self, unit: CodecUnit) -> std::result::Result<(), Self::Error>;
}

/// Collecting sink.
impl OutputSink for Vec<CodecUnit> {
    type Error = std::convert::Infallible;

    fn accept(&mut self, unit: CodecUnit) -> std::result::Result<(), Self::Error> {
        self.push(unit);
        Ok(())
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// `(struct name, fixed byte size, fully fixed-size?)`, in schema order.
    pub structs: Vec<(String, usize, bool)>,
}

impl Report {
    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.structs.iter().map(|(name, _, _)| name.as_str())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, fixed, all_fixed) in &self.structs {
            let shape = if *all_fixed { "fixed" } else { "variable" };
            writeln!(f, "  [OK] {name:<24} {fixed:>6} bytes ({shape})")?;
        }
        write!(f, "  {} struct(s) generated", self.structs.len())
    }
}

/// Compiles a schema into codec units.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    selection: Selection,
    aliases: NamedTypes,
}

impl Assembler {
    pub fn new(selection: Selection, aliases: NamedTypes) -> Self {
        Self { selection, aliases }
    }

    /// Assembler for a provider-supplied schema.
    pub fn for_schema(schema: &RawSchema, selection: Selection) -> Self {
        Self::new(selection, schema.aliases.clone())
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn aliases(&self) -> &NamedTypes {
        &self.aliases
    }

    /// Bind one raw struct.
    pub fn bind(&self, raw: &RawStruct) -> Result<InputStruct> {
        InputStruct::bind(raw, &self.aliases)
    }

    /// Bind, plan and emit one raw struct.
    pub fn compile(&self, raw: &RawStruct) -> Result<CodecUnit> {
        let bound = self.bind(raw)?;
        Ok(emit::compile(&bound))
    }

    /// Compile every selected struct without touching any sink.
    pub fn compile_all(&self, structs: &[RawStruct]) -> Result<Vec<CodecUnit>> {
        let missing = self.selection.missing(structs.iter().map(|s| s.name.as_str()));
        if !missing.is_empty() {
            return Err(Error::MissingTypes(missing));
        }

        let mut units = Vec::new();
        for raw in structs.iter().filter(|s| self.selection.accepts(&s.name)) {
            log::info!("compiling {} ({} fields)", raw.name, raw.fields.len());
            units.push(self.compile(raw)?);
        }
        if units.is_empty() {
            return Err(Error::NoStructs);
        }
        Ok(units)
    }

    /// Compile every selected struct, then feed the units to `sink`.
    pub fn run<S: OutputSink>(&self, structs: &[RawStruct], sink: &mut S) -> Result<Report> {
        let units = self.compile_all(structs)?;

        let mut report = Report::default();
        for unit in units {
            report
                .structs
                .push((unit.name.clone(), unit.fixed_size, unit.is_fixed_size()));
            sink.accept(unit).map_err(|e| Error::Sink(Box::new(e)))?;
        }
        log::info!("{} struct(s) handed to output sink", report.len());
        Ok(report)
    }
}
