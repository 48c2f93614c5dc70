// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! structwire-gen CLI
//!
//! # Usage
//!
//! ```bash
//! # Generate sensor.wire.rs next to the schema
//! structwire-gen generate --schema sensor.toml
//!
//! # Only some structs, impls only, custom method names
//! structwire-gen generate --schema sensor.yaml --types Header,Reading \
//!     --no-structs --read-fn-name decode --write-fn-name encode
//!
//! # Validate without writing anything
//! structwire-gen check --schema sensor.json
//!
//! # Show groups and statement lists
//! structwire-gen plan --schema sensor.toml
//!
//! # Write a starter configuration
//! structwire-gen gen-config --output structwire.toml
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use structwire::Report;
use structwire_gen::{describe_unit, Generator, GeneratorConfig};
use tracing_subscriber::EnvFilter;

/// structwire code generator
#[derive(Parser, Debug)]
#[command(name = "structwire-gen")]
#[command(about = "structwire code generator - struct schemas to binary codecs")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Schema file (.toml, .yaml, .yml or .json)
    #[arg(short, long)]
    schema: PathBuf,

    /// Generator configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Structs to process (comma-separated, or "all")
    #[arg(short, long, value_delimiter = ',')]
    types: Option<Vec<String>>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the codec source file
    Generate {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Output file (default: <schema stem>.wire.rs next to the schema)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name of the generated decode function
        #[arg(long)]
        read_fn_name: Option<String>,

        /// Name of the generated encode function
        #[arg(long)]
        write_fn_name: Option<String>,

        /// Emit impls only, for structs defined elsewhere
        #[arg(long)]
        no_structs: bool,
    },

    /// Compile the schema and report, without writing output
    Check {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Print size groups and statement lists
    Plan {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "structwire.toml")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("[ERROR] {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate {
            schema,
            output,
            read_fn_name,
            write_fn_name,
            no_structs,
        } => {
            let mut config = load_config(&schema)?;
            if let Some(name) = read_fn_name {
                config.read_fn = name;
            }
            if let Some(name) = write_fn_name {
                config.write_fn = name;
            }
            if no_structs {
                config.emit_structs = false;
            }
            init_tracing(cli.log_level.as_deref(), &config);
            config.validate().context("Invalid generator options")?;
            cmd_generate(config, &schema.schema, output)
        }
        Commands::Check { schema } => {
            let config = load_config(&schema)?;
            init_tracing(cli.log_level.as_deref(), &config);
            cmd_check(config, &schema.schema)
        }
        Commands::Plan { schema } => {
            let config = load_config(&schema)?;
            init_tracing(cli.log_level.as_deref(), &config);
            cmd_plan(config, &schema.schema)
        }
        Commands::GenConfig { output } => {
            init_tracing(cli.log_level.as_deref(), &GeneratorConfig::default());
            cmd_gen_config(output)
        }
    }
}

/// Config file first, then `--types`.
fn load_config(args: &SchemaArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(types) = &args.types {
        config.types = types
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        config.validate().context("Invalid --types")?;
    }
    Ok(config)
}

fn init_tracing(flag: Option<&str>, config: &GeneratorConfig) {
    let level = flag.unwrap_or(config.log_level.as_str());
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn cmd_generate(config: GeneratorConfig, schema: &Path, output: Option<PathBuf>) -> Result<()> {
    tracing::info!("Generating codecs from {}", schema.display());
    let generation = Generator::new(config).generate(schema, output.as_deref())?;
    summary("structwire-gen: Generation Report", &generation.report);
    println!("  Output: {}", generation.output.display());
    println!();
    println!("{}", "=".repeat(60));
    Ok(())
}

fn cmd_check(config: GeneratorConfig, schema: &Path) -> Result<()> {
    let report = Generator::new(config).check(schema)?;
    summary("structwire-gen: Schema Check", &report);
    println!("{}", "=".repeat(60));
    Ok(())
}

fn cmd_plan(config: GeneratorConfig, schema: &Path) -> Result<()> {
    for unit in Generator::new(config).plan(schema)? {
        println!("{}", describe_unit(&unit));
    }
    Ok(())
}

fn cmd_gen_config(output: PathBuf) -> Result<()> {
    let config = GeneratorConfig {
        types: vec!["all".into()],
        ..Default::default()
    };
    let content = config.to_toml()?;
    std::fs::write(&output, content)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn summary(title: &str, report: &Report) {
    println!("\n{}", "=".repeat(60));
    println!("  {title}");
    println!("{}", "=".repeat(60));
    println!();
    println!("{report}");
    println!();
}
