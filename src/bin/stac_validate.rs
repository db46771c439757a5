//! Validate a generated catalog directory or a single STAC document.
//!
//! Usage:
//!   stac-validate catalog/
//!   stac-validate --file catalog/a/collection.json

use anyhow::{Context, Result, bail};
use bucket_stac::observability::{LogFormat, init_logging};
use bucket_stac::{DocumentKind, DocumentSchemas, validate_catalog_dir};
use clap::Parser;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, stdin};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stac-validate")]
#[command(about = "Check STAC documents against the bundled structural schemas")]
struct Cli {
    /// Catalog directory to check, including relative link targets.
    #[arg(conflicts_with = "file")]
    dir: Option<PathBuf>,
    /// Single document to check; reads stdin when neither a file nor a directory is given.
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, "warn");
    let schemas = DocumentSchemas::bundled().context("compiling bundled schemas")?;

    if let Some(dir) = cli.dir {
        let report = validate_catalog_dir(&dir, &schemas)
            .with_context(|| format!("validating {}", dir.display()))?;
        for violation in &report.violations {
            eprintln!("stac-validate: {violation}");
        }
        if !report.is_clean() {
            bail!(
                "{} of {} documents failed validation",
                report.violations.len(),
                report.checked
            );
        }
        println!(
            "{}: {} documents valid ({} other files skipped)",
            dir.display(),
            report.checked,
            report.skipped.len()
        );
        return Ok(());
    }

    let (name, input) = read_input(cli.file)?;
    let kind = DocumentKind::detect(&input)
        .with_context(|| format!("{name} has no recognised STAC \"type\""))?;
    schemas.check(kind, &name, &input)?;
    println!("{name}: valid {}", kind.as_str());
    Ok(())
}

fn read_input(file: Option<PathBuf>) -> Result<(String, Value)> {
    let mut buf = String::new();
    let name = if let Some(path) = file {
        File::open(&path)
            .with_context(|| format!("opening input file {}", path.display()))?
            .read_to_string(&mut buf)
            .with_context(|| format!("reading input file {}", path.display()))?;
        path.display().to_string()
    } else {
        stdin()
            .read_to_string(&mut buf)
            .context("reading stdin for input JSON")?;
        "<stdin>".to_string()
    };
    let value: Value = serde_json::from_str(&buf).context("parsing input JSON")?;
    Ok((name, value))
}
