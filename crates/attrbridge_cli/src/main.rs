//! Command-line lookup of mapped attribute resolution.
//!
//! # Responsibility
//! - Load a mapping document and print the merged attribute set for one
//!   `(type, property)` query, one attribute per line.
//! - Keep output deterministic so it can be diffed in scripts.

use attrbridge_core::{
    core_version, default_log_level, init_logging, load_mapping_file, Attribute, AttributeQuery,
    DuplicatePolicy, TypeRef,
};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "attrbridge")]
#[command(about = "Print validation attributes inherited through a mapping configuration")]
#[command(version)]
struct Cli {
    /// Mapping document (JSON)
    #[arg(long)]
    mapping: PathBuf,

    /// Container type whose property is queried, e.g. `Demo.UserViewModel`
    #[arg(long = "type")]
    type_name: Option<String>,

    /// Property name to resolve
    #[arg(long)]
    property: String,

    /// JSON array of attributes the property already declares
    #[arg(long)]
    existing: Option<PathBuf>,

    /// Deduplication policy for attributes discovered through several maps
    #[arg(long, value_enum, default_value_t = PolicyArg::AgainstExisting)]
    policy: PolicyArg,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level; `debug` in debug builds and `info` in release builds when omitted
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    AgainstExisting,
    FirstDiscovered,
}

impl From<PolicyArg> for DuplicatePolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::AgainstExisting => DuplicatePolicy::AgainstExisting,
            PolicyArg::FirstDiscovered => DuplicatePolicy::FirstDiscovered,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("attrbridge: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Vec<String>, String> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or(default_log_level().as_str());
        init_logging(level, log_dir).map_err(|err| err.to_string())?;
        info!(
            "event=cli_start module=cli status=ok version={}",
            core_version()
        );
    }

    let loaded = load_mapping_file(&cli.mapping).map_err(|err| err.to_string())?;
    let existing = match &cli.existing {
        Some(path) => read_existing(path)?,
        None => Vec::new(),
    };

    let source_type = cli.type_name.as_deref().map(TypeRef::new);
    let merged = AttributeQuery::new(source_type.as_ref(), &cli.property, &existing)
        .with_policy(cli.policy.into())
        .collect(loaded.configuration.as_ref());

    merged.iter().map(format_attribute).collect()
}

fn read_existing(path: &Path) -> Result<Vec<Attribute>, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
    serde_json::from_str(&json)
        .map_err(|err| format!("`{}` is not a JSON attribute array: {err}", path.display()))
}

fn format_attribute(attribute: &Attribute) -> Result<String, String> {
    let params = serde_json::to_string(attribute).map_err(|err| err.to_string())?;
    Ok(format!("{}\t{params}", attribute.kind()))
}
