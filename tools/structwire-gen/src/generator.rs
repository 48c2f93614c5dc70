// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Output file assembly and persistence.
//!
//! The generated file holds only items with outer attributes, so it works
//! both as a module (`#[path = "..."] mod x;`) and through `include!`. With
//! struct definitions it is self-contained: every alias a selected struct
//! reaches is emitted as a `pub type`. Impl-only output expects the structs
//! and aliases to be in scope where it is included.

use crate::config::GeneratorConfig;
use crate::provider;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use structwire::{Assembler, BasicKind, CodecUnit, OutputSink, RawSchema, Report, RustRenderer};
use tera::Tera;
use thiserror::Error;

const FILE_TEMPLATE: &str = "\
// Code generated by structwire-gen; DO NOT EDIT.
// Source: {{ source }}
{% if not emit_structs %}//
// Impl blocks only: include!() this file where the structs are defined.
{% endif %}{% for alias in aliases %}
{{ alias | safe }}{% endfor %}{% for section in sections %}
{{ section | safe }}{% endfor %}";

const UNIT_TEMPLATE: &str = "\
{% if definition %}#[allow(dead_code)]
{{ definition | safe }}
{% endif %}{{ implementation | safe }}";

/// Output sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// Sink that renders each unit into a section of one generated file.
pub struct FileSink {
    tera: Tera,
    renderer: RustRenderer,
    emit_structs: bool,
    aliases: BTreeMap<String, BasicKind>,
    sections: Vec<String>,
}

impl FileSink {
    pub fn new(config: &GeneratorConfig) -> Result<Self, SinkError> {
        let mut tera = Tera::default();
        tera.add_raw_template("file", FILE_TEMPLATE)?;
        tera.add_raw_template("unit", UNIT_TEMPLATE)?;
        Ok(Self {
            tera,
            renderer: config.renderer(),
            emit_structs: config.emit_structs,
            aliases: BTreeMap::new(),
            sections: Vec::new(),
        })
    }

    /// Number of sections accepted so far.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Full file contents. `source` is recorded in the header.
    pub fn render(&self, source: &str) -> Result<String, SinkError> {
        let aliases: Vec<String> = self
            .aliases
            .iter()
            .map(|(name, kind)| self.renderer.render_alias(name, *kind))
            .collect();
        let mut ctx = tera::Context::new();
        ctx.insert("source", source);
        ctx.insert("emit_structs", &self.emit_structs);
        ctx.insert("aliases", &aliases);
        ctx.insert("sections", &self.sections);
        Ok(self.tera.render("file", &ctx)?)
    }
}

impl OutputSink for FileSink {
    type Error = SinkError;

    fn accept(&mut self, unit: CodecUnit) -> Result<(), SinkError> {
        if self.emit_structs {
            for field in &unit.fields {
                let scalar = field.ty().scalar();
                if let Some(alias) = scalar.alias() {
                    self.aliases.insert(alias.to_string(), scalar.kind());
                }
            }
        }
        let mut ctx = tera::Context::new();
        let definition = self
            .emit_structs
            .then(|| self.renderer.render_struct_def(&unit));
        ctx.insert("definition", &definition);
        ctx.insert("implementation", &self.renderer.render_impl(&unit));
        let section = self.tera.render("unit", &ctx)?;
        tracing::debug!("Rendered {} ({} bytes of source)", unit.name, section.len());
        self.sections.push(section);
        Ok(())
    }
}

/// `<stem>.wire.rs` next to the schema file.
pub fn default_output_path(schema: &Path) -> PathBuf {
    let stem = schema
        .file_stem()
        .map_or_else(|| "schema".into(), |s| s.to_string_lossy().into_owned());
    schema.with_file_name(format!("{stem}.wire.rs"))
}

/// Result of a `generate` run.
#[derive(Debug)]
pub struct Generation {
    pub report: Report,
    pub output: PathBuf,
}

/// Generator front-end shared by the CLI subcommands.
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn load(&self, schema_path: &Path) -> Result<(RawSchema, Assembler)> {
        let schema = provider::load_schema(schema_path)
            .with_context(|| format!("Failed to load schema {}", schema_path.display()))?;
        let assembler = Assembler::for_schema(&schema, self.config.selection());
        Ok((schema, assembler))
    }

    /// Compile and write the output file.
    ///
    /// Nothing is written unless every selected struct compiles.
    pub fn generate(&self, schema_path: &Path, output: Option<&Path>) -> Result<Generation> {
        let (schema, assembler) = self.load(schema_path)?;
        let output = output.map_or_else(|| default_output_path(schema_path), Path::to_path_buf);

        let mut sink = FileSink::new(&self.config).context("Failed to initialize templates")?;
        let report = assembler
            .run(&schema.structs, &mut sink)
            .with_context(|| format!("Failed to compile {}", schema_path.display()))?;

        let source = schema_path
            .file_name()
            .map_or_else(|| schema_path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let contents = sink
            .render(&source)
            .context("Failed to render output file")?;
        if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&output, contents)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        tracing::info!("[OK] Wrote {} struct(s) to {}", report.len(), output.display());
        Ok(Generation { report, output })
    }

    /// Compile without writing anything.
    pub fn check(&self, schema_path: &Path) -> Result<Report> {
        let units = self.plan(schema_path)?;
        Ok(Report {
            structs: units
                .iter()
                .map(|u| (u.name.clone(), u.fixed_size, u.is_fixed_size()))
                .collect(),
        })
    }

    /// Compiled units, for inspection.
    pub fn plan(&self, schema_path: &Path) -> Result<Vec<CodecUnit>> {
        let (schema, assembler) = self.load(schema_path)?;
        assembler
            .compile_all(&schema.structs)
            .with_context(|| format!("Failed to compile {}", schema_path.display()))
    }
}

/// Human-readable plan listing for one unit.
pub fn describe_unit(unit: &CodecUnit) -> String {
    let mut out = format!("struct {} (fixed {} bytes)\n", unit.name, unit.fixed_size);
    out.push_str("  groups:\n");
    for group in &unit.groups {
        let names: Vec<&str> = group
            .fields()
            .map(|i| unit.fields[i].name())
            .collect();
        let kind = match group.fixed_size() {
            Some(n) => format!("fixed {n}"),
            None => "variable".to_string(),
        };
        out.push_str(&format!("    [{kind}] {}\n", names.join(", ")));
    }
    out.push_str("  decode:\n");
    for stmt in &unit.decode {
        out.push_str(&format!("    {stmt}\n"));
    }
    out.push_str("  encode:\n");
    for stmt in &unit.encode {
        out.push_str(&format!("    {stmt}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use structwire::{NamedTypes, RawField, RawStruct, Selection, TypeDesc};

    fn packet() -> CodecUnit {
        let raw = RawStruct::new("Packet")
            .field(RawField::new("n", TypeDesc::named("u8")))
            .field(RawField::new("c", TypeDesc::sequence(TypeDesc::named("u8"))).with_len("n"));
        Assembler::default().compile(&raw).expect("compile")
    }

    fn sample() -> CodecUnit {
        let aliases = NamedTypes::new()
            .with("Celsius", "f32")
            .with("Temp", "Celsius")
            .with("Unused", "u8");
        let raw = RawStruct::new("Sample")
            .field(RawField::new("t", TypeDesc::named("Temp")))
            .field(RawField::new("hist", TypeDesc::array(TypeDesc::named("Celsius"), 2)));
        Assembler::new(Selection::All, aliases).compile(&raw).expect("compile")
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("schemas/sensor.toml")),
            PathBuf::from("schemas/sensor.wire.rs")
        );
        assert_eq!(
            default_output_path(Path::new("sensor.json")),
            PathBuf::from("sensor.wire.rs")
        );
    }

    #[test]
    fn test_file_layout() {
        let mut sink = FileSink::new(&GeneratorConfig::default()).expect("sink");
        sink.accept(packet()).expect("accept");
        assert_eq!(sink.len(), 1);

        let text = sink.render("packet.toml").expect("render");
        assert!(text.starts_with("// Code generated by structwire-gen; DO NOT EDIT.\n"));
        assert!(text.contains("// Source: packet.toml"));
        assert!(!text.contains("#!["));
        assert!(text.contains("#[allow(dead_code)]\n#[derive(Debug, Clone, PartialEq)]\npub struct Packet {"));
        assert!(text.contains("impl Packet {"));
        assert!(text.find("pub struct Packet").unwrap() < text.find("impl Packet").unwrap());
    }

    #[test]
    fn test_impl_only() {
        let config = GeneratorConfig {
            emit_structs: false,
            ..Default::default()
        };
        let mut sink = FileSink::new(&config).expect("sink");
        sink.accept(packet()).expect("accept");
        let text = sink.render("p.json").expect("render");
        assert!(!text.contains("pub struct Packet"));
        assert!(!text.contains("#!["));
        assert!(text.contains("// Impl blocks only: include!()"));
        assert!(text.contains("impl Packet {"));

        let mut sink = FileSink::new(&config).expect("sink");
        sink.accept(sample()).expect("accept");
        assert!(!sink.render("s.json").expect("render").contains("pub type"));
    }

    #[test]
    fn test_reached_aliases_are_emitted() {
        let mut sink = FileSink::new(&GeneratorConfig::default()).expect("sink");
        sink.accept(sample()).expect("accept");
        sink.accept(packet()).expect("accept");
        let text = sink.render("s.toml").expect("render");

        assert!(text.contains("#[allow(dead_code)]\npub type Celsius = f32;\n"));
        assert!(text.contains("#[allow(dead_code)]\npub type Temp = f32;\n"));
        assert!(!text.contains("Unused"));
        assert!(!text.contains("Impl blocks only"));
        assert!(text.find("pub type Celsius").unwrap() < text.find("pub type Temp").unwrap());
        assert!(text.find("pub type Temp").unwrap() < text.find("pub struct Sample").unwrap());
    }

    #[test]
    fn test_describe_unit() {
        let listing = describe_unit(&packet());
        assert!(listing.starts_with("struct Packet (fixed 1 bytes)"));
        assert!(listing.contains("[fixed 1] n"));
        assert!(listing.contains("[variable] c"));
        assert!(listing.contains("    write\n"));
    }
}
