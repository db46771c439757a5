//! Crawl a bucket listing and write a STAC catalog tree.
//!
//! Usage:
//!   bucket-stac --bucket swhm_data --manifest objects.json --output catalog
//!   bucket-stac --local-dir ./mirror --prefix public/layers/ --bounds bounds.json --clear
//!
//! Settings resolve in order: `--config` file, `BUCKET_STAC_*` environment
//! variables, then the flags below.

use anyhow::{Context, Result, bail};
use bucket_stac::config::CrawlConfig;
use bucket_stac::observability::{LogFormat, crawl_span, init_logging};
use bucket_stac::writer::clear_catalog_dir;
use bucket_stac::{
    BoundsManifestReader, BoundsReader, CrawlInputs, DocumentSchemas, LayerMetadataFile,
    LocalDirLister, ManifestLister, ObjectLister, UnavailableBoundsReader, run_crawl,
};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bucket-stac")]
#[command(about = "Crawl an object listing and generate a hierarchical STAC catalog")]
#[command(group(ArgGroup::new("source").required(true).args(["manifest", "local_dir"])))]
struct Cli {
    /// JSON config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Bucket name, used for public asset URLs and the summary.
    #[arg(long)]
    bucket: Option<String>,
    /// Key prefix to crawl (e.g. "public/layers/").
    #[arg(long)]
    prefix: Option<String>,
    /// Object manifest: JSON array, storage list response, or NDJSON.
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Local directory mirroring the bucket layout.
    #[arg(long)]
    local_dir: Option<PathBuf>,
    /// JSON map of object path or layer name to [west, south, east, north].
    #[arg(long)]
    bounds: Option<PathBuf>,
    /// Layer metadata file with "rasters" and "cocs" sections.
    #[arg(long)]
    metadata: Option<PathBuf>,
    /// Output directory for the catalog tree.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    /// Base URL for asset hrefs (defaults to the bucket's public endpoint).
    #[arg(long)]
    asset_base_url: Option<String>,
    /// Publish absolute links under this URL instead of relative ones.
    #[arg(long)]
    root_url: Option<String>,
    /// Worker threads for bounds resolution.
    #[arg(long)]
    workers: Option<usize>,
    /// Remove existing JSON files from the output directory first.
    #[arg(long)]
    clear: bool,
    /// Check each document against the bundled schemas before writing.
    #[arg(long)]
    validate: bool,
    /// Exit non-zero when any incident was recorded.
    #[arg(long)]
    strict: bool,
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
    /// Default log level when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level);

    let config = resolve_config(&cli)?;
    let span = crawl_span(&config.bucket, &config.prefix);
    let _guard = span.enter();

    if cli.clear {
        clear_catalog_dir(&config.output_dir)
            .with_context(|| format!("clearing {}", config.output_dir.display()))?;
    }

    let lister: Box<dyn ObjectLister> = match (&cli.manifest, &cli.local_dir) {
        (Some(path), _) => Box::new(ManifestLister::new(path)),
        (None, Some(dir)) => Box::new(LocalDirLister::new(dir)),
        (None, None) => bail!("one of --manifest or --local-dir is required"),
    };
    let bounds: Box<dyn BoundsReader> = match &cli.bounds {
        Some(path) => Box::new(
            BoundsManifestReader::load(path)
                .with_context(|| format!("loading bounds manifest {}", path.display()))?,
        ),
        None => Box::new(UnavailableBoundsReader),
    };
    let metadata = config
        .metadata_path
        .as_deref()
        .map(LayerMetadataFile::load_or_empty)
        .unwrap_or_default();
    let schemas = if cli.validate {
        Some(DocumentSchemas::bundled().context("compiling bundled schemas")?)
    } else {
        None
    };

    let report = run_crawl(
        &config,
        CrawlInputs {
            lister: lister.as_ref(),
            bounds: bounds.as_ref(),
            metadata: &metadata,
            schemas: schemas.as_ref(),
        },
    )
    .context("running crawl")?;

    let counts = &report.counts;
    println!(
        "{} items ({} vector, {} raster) in {} collections written to {}",
        counts.stac_items_generated,
        counts.vectors_found,
        counts.rasters_found,
        counts.collections_generated,
        report.output_dir.display()
    );
    if report.used_sample_data {
        println!("listing failed; catalog was built from sample data");
    }
    if !report.incidents.is_empty() {
        println!(
            "{} incidents recorded in {}",
            report.incident_count(),
            report
                .summary_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the run log".to_string())
        );
        if cli.strict {
            bail!("{} incidents recorded", report.incident_count());
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<CrawlConfig> {
    let mut config = match &cli.config {
        Some(path) => CrawlConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CrawlConfig::default(),
    };
    config
        .apply_env()
        .context("applying BUCKET_STAC_* environment overrides")?;

    if let Some(bucket) = &cli.bucket {
        config.bucket = bucket.clone();
    }
    if let Some(prefix) = &cli.prefix {
        config.prefix = prefix.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(metadata) = &cli.metadata {
        config.metadata_path = Some(metadata.clone());
    }
    if let Some(url) = &cli.asset_base_url {
        config.asset_base_url = Some(url.clone());
    }
    if let Some(url) = &cli.root_url {
        config.catalog_root_url = Some(url.clone());
    }
    if let Some(workers) = cli.workers {
        config.bounds_workers = Some(workers);
    }
    config.validate().context("validating configuration")?;
    Ok(config)
}
