// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema file provider.
//!
//! Reads struct schemas from TOML, YAML or JSON:
//!
//! ```toml
//! [aliases]
//! Celsius = "f32"
//!
//! [[structs]]
//! name = "Reading"
//!
//! [[structs.fields]]
//! name = "count"
//! type = "u8"
//!
//! [[structs.fields]]
//! name = "samples"
//! type = "Vec<Celsius>"
//! len = "count"
//! ```

use crate::config::is_ident;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use structwire::{NamedTypes, RawField, RawSchema, RawStruct, TypeDesc, TypeError};
use thiserror::Error;

/// Schema loading errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown schema format for {0} (expected .toml, .yaml, .yml or .json)")]
    UnknownFormat(PathBuf),

    #[error("{location}: bad type '{ty}': {source}")]
    Type {
        location: String,
        ty: String,
        #[source]
        source: TypeError,
    },

    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// Schema file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Toml,
    Yaml,
    Json,
}

impl SchemaFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    #[serde(default)]
    structs: Vec<StructEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructEntry {
    name: String,
    #[serde(default)]
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldEntry {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    len: Option<String>,
}

/// Load a schema file, choosing the format by extension.
pub fn load_schema(path: &Path) -> Result<RawSchema, ProviderError> {
    let format =
        SchemaFormat::from_path(path).ok_or_else(|| ProviderError::UnknownFormat(path.into()))?;
    let text = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.into(),
        source,
    })?;
    tracing::debug!("Loading {:?} schema from {}", format, path.display());
    parse_schema(&text, format)
}

/// Parse schema text.
pub fn parse_schema(text: &str, format: SchemaFormat) -> Result<RawSchema, ProviderError> {
    let file: SchemaFile = match format {
        SchemaFormat::Toml => toml::from_str(text)?,
        SchemaFormat::Yaml => serde_yaml::from_str(text)?,
        SchemaFormat::Json => serde_json::from_str(text)?,
    };
    convert(file)
}

fn convert(file: SchemaFile) -> Result<RawSchema, ProviderError> {
    let mut aliases = NamedTypes::new();
    for (name, underlying) in file.aliases {
        if !is_ident(&name) {
            return Err(ProviderError::Invalid(format!("alias name '{name}'")));
        }
        if !is_ident(underlying.trim()) {
            return Err(ProviderError::Invalid(format!(
                "alias '{name}' must name a primitive or another alias, not '{underlying}'"
            )));
        }
        aliases.insert(name, underlying.trim());
    }

    let mut structs = Vec::with_capacity(file.structs.len());
    for entry in file.structs {
        if !is_ident(&entry.name) {
            return Err(ProviderError::Invalid(format!(
                "struct name '{}'",
                entry.name
            )));
        }
        if structs.iter().any(|s: &RawStruct| s.name == entry.name) {
            return Err(ProviderError::Invalid(format!(
                "struct '{}' is defined twice",
                entry.name
            )));
        }

        let mut raw = RawStruct::new(&entry.name);
        for field in entry.fields {
            let location = format!("{}.{}", entry.name, field.name);
            if !is_ident(&field.name) {
                return Err(ProviderError::Invalid(format!("field name '{location}'")));
            }
            let ty: TypeDesc = field.ty.parse().map_err(|source| ProviderError::Type {
                location: location.clone(),
                ty: field.ty.clone(),
                source,
            })?;
            let mut raw_field = RawField::new(field.name, ty);
            if let Some(len) = field.len {
                raw_field = raw_field.with_len(len);
            }
            raw = raw.field(raw_field);
        }
        structs.push(raw);
    }

    tracing::debug!(
        "Schema holds {} struct(s) and {} alias(es)",
        structs.len(),
        aliases.len()
    );
    Ok(RawSchema { aliases, structs })
}
