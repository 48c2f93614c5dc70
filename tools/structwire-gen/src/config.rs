// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generator configuration.
//!
//! Loaded from a TOML file; command-line flags override individual values.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use structwire::{RustRenderer, Selection};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

static IDENT: OnceLock<Regex> = OnceLock::new();
static DERIVE_PATH: OnceLock<Regex> = OnceLock::new();

/// Matches a plain Rust identifier.
pub(crate) fn is_ident(s: &str) -> bool {
    let re = IDENT.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex")
    });
    s != "_" && re.is_match(s)
}

fn is_derive_path(s: &str) -> bool {
    let re = DERIVE_PATH.get_or_init(|| {
        Regex::new(r"^(::)?[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("static regex")
    });
    re.is_match(s)
}

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Name of the generated decode function.
    #[serde(default = "default_read_fn")]
    pub read_fn: String,

    /// Name of the generated encode function.
    #[serde(default = "default_write_fn")]
    pub write_fn: String,

    /// Emit struct definitions ahead of the impls.
    #[serde(default = "default_true")]
    pub emit_structs: bool,

    /// Derives placed on emitted struct definitions.
    #[serde(default = "default_derives")]
    pub derives: Vec<String>,

    /// Structs to generate; empty means all.
    #[serde(default)]
    pub types: Vec<String>,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_read_fn() -> String {
    "read_from".to_string()
}

fn default_write_fn() -> String {
    "write_to".to_string()
}

fn default_true() -> bool {
    true
}

fn default_derives() -> Vec<String> {
    vec!["Debug".into(), "Clone".into(), "PartialEq".into()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            read_fn: default_read_fn(),
            write_fn: default_write_fn(),
            emit_structs: true,
            derives: default_derives(),
            types: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as commented TOML, for `gen-config`.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let body = toml::to_string_pretty(self)?;
        Ok(format!(
            "# structwire-gen configuration\n# Generated by structwire-gen gen-config\n\n{body}"
        ))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, name) in [("read_fn", &self.read_fn), ("write_fn", &self.write_fn)] {
            if !is_ident(name) {
                return Err(ConfigError::Invalid(format!(
                    "{key} '{name}' is not a valid function name"
                )));
            }
        }
        if self.read_fn == self.write_fn {
            return Err(ConfigError::Invalid(format!(
                "read_fn and write_fn are both '{}'",
                self.read_fn
            )));
        }

        if let Some(bad) = self.derives.iter().find(|d| !is_derive_path(d)) {
            return Err(ConfigError::Invalid(format!("invalid derive '{bad}'")));
        }
        if let Some(bad) = self.types.iter().find(|t| !is_ident(t)) {
            return Err(ConfigError::Invalid(format!("invalid type name '{bad}'")));
        }
        Ok(())
    }

    /// Struct selection for the assembler.
    pub fn selection(&self) -> Selection {
        if self.types.is_empty() || self.types.iter().any(|t| t == "all") {
            Selection::All
        } else {
            Selection::only(self.types.iter().cloned())
        }
    }

    /// Renderer with this configuration's names and derives.
    pub fn renderer(&self) -> RustRenderer {
        RustRenderer::new()
            .with_fn_names(self.read_fn.clone(), self.write_fn.clone())
            .with_derives(self.derives.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = GeneratorConfig::from_toml("").expect("empty config");
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.read_fn, "read_from");
        assert!(config.emit_structs);
        assert_eq!(config.selection(), Selection::All);
    }

    #[test]
    fn test_partial_override() {
        let config = GeneratorConfig::from_toml(
            r#"
            write_fn = "save_to"
            emit_structs = false
            types = ["Packet", "Header"]
            "#,
        )
        .expect("config");
        assert_eq!(config.read_fn, "read_from");
        assert_eq!(config.write_fn, "save_to");
        assert!(!config.emit_structs);
        assert!(config.selection().accepts("Header"));
        assert!(!config.selection().accepts("Body"));
    }

    #[test]
    fn test_validation() {
        let mut config = GeneratorConfig::default();
        assert!(config.validate().is_ok());

        config.read_fn = "read-from".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.read_fn = "write_to".into();
        assert!(config.validate().is_err()); // Same name twice

        config.read_fn = "read_from".into();
        config.derives.push("serde::Serialize".into());
        assert!(config.validate().is_ok());

        config.derives.push("Debug, Clone".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            GeneratorConfig::from_toml("read_function = \"x\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_to_toml_reparses() {
        let config = GeneratorConfig {
            types: vec!["Packet".into()],
            ..Default::default()
        };
        let text = config.to_toml().expect("encode");
        assert!(text.starts_with("# structwire-gen configuration"));
        assert_eq!(GeneratorConfig::from_toml(&text).expect("decode"), config);
    }

    #[test]
    fn test_is_ident() {
        assert!(is_ident("Packet"));
        assert!(is_ident("_tmp1"));
        assert!(!is_ident("_"));
        assert!(!is_ident("1st"));
        assert!(!is_ident(""));
    }
}
