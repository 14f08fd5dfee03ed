//! End-to-end tests driving the commands through parsed configuration.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::fs;
use std::path::Path;

use clap::Parser;
use ocf_cli::{CliConfig, run};
use ocf_storage::FileCompression;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SCHEMA: &str = r#"{
    "type": "record",
    "name": "Event",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "name", "type": "string"}
    ]
}"#;

fn run_args(root: &Path, args: &[&str]) -> anyhow::Result<String> {
    let mut argv = vec!["ocf", "--root", root.to_str().unwrap()];
    argv.extend_from_slice(args);
    let config = CliConfig::try_parse_from(argv)?;
    let mut out = Vec::new();
    run(&config, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn input_lines(count: usize) -> Vec<serde_json::Value> {
    (0..count)
        .map(|i| serde_json::json!({"id": i, "name": format!("event-{i}")}))
        .collect()
}

/// Write `count` records into `partitions` files and return their paths.
fn write_dataset(dir: &TempDir, count: usize, partitions: usize, codec: &str) -> Vec<String> {
    let schema = dir.path().join("schema.json");
    let input = dir.path().join("input.jsonl");
    fs::write(&schema, SCHEMA).unwrap();
    let lines: Vec<String> = input_lines(count).iter().map(ToString::to_string).collect();
    fs::write(&input, lines.join("\n")).unwrap();

    let partitions = partitions.to_string();
    let out = run_args(
        dir.path(),
        &[
            "write",
            "--schema",
            schema.to_str().unwrap(),
            "--input",
            input.to_str().unwrap(),
            "--output",
            "data/part-*.avro",
            "--codec",
            codec,
            "--sync-interval",
            "3",
            "--partitions",
            &partitions,
            "--meta",
            "origin=tests",
        ],
    )
    .expect("write should succeed");
    out.lines().map(str::to_string).collect()
}

#[test]
fn write_names_one_file_per_partition() {
    let dir = TempDir::new().unwrap();
    let paths = write_dataset(&dir, 30, 3, "deflate");
    assert_eq!(
        paths,
        vec!["data/part-0.avro", "data/part-1.avro", "data/part-2.avro"]
    );
    for path in &paths {
        assert!(dir.path().join(path).is_file());
    }
}

#[test]
fn cat_prints_every_record_in_order() {
    let dir = TempDir::new().unwrap();
    let paths = write_dataset(&dir, 30, 3, "snappy");

    let mut args = vec!["cat", "--partition-size", "64"];
    args.extend(paths.iter().map(String::as_str));
    let out = run_args(dir.path(), &args).unwrap();

    let records: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records, input_lines(30));
}

#[test]
fn cat_respects_limit() {
    let dir = TempDir::new().unwrap();
    let paths = write_dataset(&dir, 10, 1, "null");

    let out = run_args(dir.path(), &["cat", "--limit", "4", &paths[0]]).unwrap();
    assert_eq!(out.lines().count(), 4);
}

#[test]
fn count_reports_windows_and_total() {
    let dir = TempDir::new().unwrap();
    let paths = write_dataset(&dir, 30, 2, "null");

    let mut args = vec!["count", "--partition-size", "50", "--threads", "2"];
    args.extend(paths.iter().map(String::as_str));
    let out = run_args(dir.path(), &args).unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert!(lines.len() > 3, "expected several windows, got {out}");
    assert_eq!(lines.last().copied(), Some("total\t30"));
}

#[test]
fn plan_lists_task_keys() {
    let dir = TempDir::new().unwrap();
    let paths = write_dataset(&dir, 12, 1, "null");

    let out = run_args(dir.path(), &["plan", "--whole-file", &paths[0]]).unwrap();
    assert!(out.contains("read-ocf-0-"));
    assert!(out.contains("\twhole"));
    assert!(out.trim_end().ends_with("1 tasks"));
}

#[test]
fn inspect_shows_header() {
    let dir = TempDir::new().unwrap();
    let paths = write_dataset(&dir, 5, 1, "deflate");

    let out = run_args(dir.path(), &["inspect", &paths[0]]).unwrap();
    assert!(out.contains("magic:         Obj (version 1)"));
    assert!(out.contains("codec:         deflate"));
    assert!(out.contains("  origin: tests"));
    assert!(out.contains("  avro.schema: {"));
}

#[test]
fn compressed_file_is_read_whole() {
    let dir = TempDir::new().unwrap();
    let paths = write_dataset(&dir, 8, 1, "null");
    let plain = fs::read(dir.path().join(&paths[0])).unwrap();
    fs::write(
        dir.path().join("packed.avro.gz"),
        FileCompression::Gzip.compress(&plain).unwrap(),
    )
    .unwrap();

    let out = run_args(
        dir.path(),
        &["count", "--whole-file", "--compression", "gzip", "packed.avro.gz"],
    )
    .unwrap();
    assert_eq!(out.lines().last(), Some("total\t8"));

    let chunked = run_args(
        dir.path(),
        &["count", "--compression", "gzip", "packed.avro.gz"],
    );
    assert!(chunked.is_err());
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(run_args(dir.path(), &["count", "absent.avro"]).is_err());
}
