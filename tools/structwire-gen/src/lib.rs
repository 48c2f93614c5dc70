// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! structwire-gen: schema files in, Rust wire codecs out.
//!
//! - [`provider`] reads TOML/YAML/JSON schema files into a [`structwire::RawSchema`]
//! - [`config`] holds generator settings
//! - [`generator`] drives the assembler and writes the output file

pub mod config;
pub mod generator;
pub mod provider;

pub use config::{ConfigError, GeneratorConfig};
pub use generator::{default_output_path, describe_unit, FileSink, Generation, Generator};
pub use provider::{load_schema, parse_schema, ProviderError, SchemaFormat};
