use clap::{ArgGroup, Parser};
use spdx_bom::application::dto::OutputFormat;
use std::path::PathBuf;

use crate::config::validate_workers;

/// Generate SPDX SBOMs for container images and verify them against provenance
#[derive(Parser, Debug)]
#[command(name = "spdx-bom")]
#[command(version)]
#[command(about = "Generate SPDX SBOMs for container images and verify them against provenance", long_about = None)]
#[command(group(
    ArgGroup::new("artifacts")
        .required(true)
        .multiple(true)
        .args(["image", "tarball"])
))]
pub struct Args {
    /// Image reference to pull (registry/repository:tag or @sha256:...)
    /// Can be specified multiple times: -i alpine:3.19 -i nginx:1.25
    #[arg(short, long, value_name = "REFERENCE")]
    pub image: Vec<String>,

    /// Local image tarball (docker save or OCI layout)
    #[arg(short, long, value_name = "PATH")]
    pub tarball: Vec<PathBuf>,

    /// In-toto provenance statement to verify the document against
    #[arg(short, long, value_name = "PATH")]
    pub provenance: Vec<PathBuf>,

    /// Describe every layer as its own package
    #[arg(long)]
    pub analyze_layers: bool,

    /// Output format: json or tag-value [default: json]
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Document namespace URI (derived from the artifact list by default)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Document name (defaults to the first artifact)
    #[arg(long)]
    pub name: Option<String>,

    /// Additional SPDX creator, e.g. "Organization: Example Inc."
    #[arg(long)]
    pub creator: Option<String>,

    /// Number of artifacts inspected concurrently (1-64) [default: 4]
    #[arg(short = 'j', long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Option passed to the inspection provider, e.g. platform=linux/arm64
    #[arg(long = "provider-option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub provider_options: Vec<(String, String)>,

    /// Config file path (defaults to ./spdx-bom.config.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

fn parse_workers(value: &str) -> Result<usize, String> {
    let workers: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    validate_workers(workers)
}

fn parse_key_value(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", value)),
    }
}
