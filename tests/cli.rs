// Smoke tests for the bucket-stac and stac-validate binaries.
mod support;

use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::process::{Command, Output};
use support::{hrefs_with_rel, read_json, write_json};
use tempfile::TempDir;

fn bucket_stac() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bucket-stac"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn stac_validate() -> Command {
    Command::new(env!("CARGO_BIN_EXE_stac-validate"))
}

fn run(mut cmd: Command) -> Result<Output> {
    cmd.output().context("failed to spawn binary")
}

#[test]
fn crawl_from_manifest_writes_catalog_tree() -> Result<()> {
    let temp = TempDir::new()?;
    let manifest = write_json(
        temp.path(),
        "objects.json",
        &json!([
            {"name": "public/layers/a/b/x.geojson", "size": 10},
            {"name": "public/layers/a/b/y.tif", "size": 20},
            {"name": "public/layers/notes.txt"},
            {"name": "other/ignored.tif"}
        ]),
    )?;
    let bounds = write_json(
        temp.path(),
        "bounds.json",
        &json!({"public/layers/a/b/y.tif": [-122.5, 47.0, -122.0, 47.5]}),
    )?;
    let output_dir = temp.path().join("catalog");

    let mut cmd = bucket_stac();
    cmd.arg("--bucket")
        .arg("swhm_data")
        .arg("--manifest")
        .arg(&manifest)
        .arg("--bounds")
        .arg(&bounds)
        .arg("--output")
        .arg(&output_dir)
        .arg("--validate")
        .arg("--strict");
    let output = run(cmd)?;
    assert!(
        output.status.success(),
        "bucket-stac failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 items (1 vector, 1 raster) in 1 collections"));

    let catalog = read_json(&output_dir.join("catalog.json"))?;
    assert_eq!(hrefs_with_rel(&catalog, "child"), vec!["./a/collection.json"]);
    let item = read_json(&output_dir.join("a/b/y.json"))?;
    assert_eq!(
        item["assets"]["data"]["href"],
        "https://storage.googleapis.com/swhm_data/public/layers/a/b/y.tif"
    );
    assert_eq!(item["geometry"]["type"], "Polygon");

    let mut check = stac_validate();
    check.arg(&output_dir);
    let output = run(check)?;
    assert!(
        output.status.success(),
        "stac-validate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("4 documents valid"));
    Ok(())
}

#[test]
fn strict_mode_fails_when_incidents_are_recorded() -> Result<()> {
    let temp = TempDir::new()?;
    let output_dir = temp.path().join("catalog");
    let mut cmd = bucket_stac();
    cmd.arg("--manifest")
        .arg(temp.path().join("missing.json"))
        .arg("--output")
        .arg(&output_dir)
        .arg("--strict");
    let output = run(cmd)?;

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sample data"), "stdout: {stdout}");
    assert!(output_dir.join("catalog.json").is_file());
    Ok(())
}

#[test]
fn crawl_requires_a_listing_source() -> Result<()> {
    let temp = TempDir::new()?;
    let mut cmd = bucket_stac();
    cmd.arg("--output").arg(temp.path());
    let output = run(cmd)?;
    assert!(!output.status.success());
    assert!(!temp.path().join("catalog.json").exists());
    Ok(())
}

#[test]
fn invalid_worker_count_is_rejected_before_crawling() -> Result<()> {
    let temp = TempDir::new()?;
    let manifest = write_json(temp.path(), "objects.json", &json!([]))?;
    let output_dir = temp.path().join("catalog");
    let mut cmd = bucket_stac();
    cmd.arg("--manifest")
        .arg(&manifest)
        .arg("--output")
        .arg(&output_dir)
        .arg("--workers")
        .arg("0");
    let output = run(cmd)?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("validating configuration"));
    assert!(!output_dir.exists());
    Ok(())
}

#[test]
fn validator_rejects_a_document_missing_required_fields() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("broken.json");
    fs::write(
        &path,
        serde_json::to_string(&json!({
            "type": "Collection",
            "stac_version": "1.0.0",
            "id": "a"
        }))?,
    )?;

    let mut cmd = stac_validate();
    cmd.arg("--file").arg(&path);
    let output = run(cmd)?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("broken.json"));
    Ok(())
}
