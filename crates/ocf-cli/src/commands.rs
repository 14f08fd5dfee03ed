//! Command implementations.
//!
//! Reports go to the supplied writer; progress and per-window failures are
//! logged through `tracing`.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use ocf_format::{AvroCodec, AvroSchema, Header, MAGIC, record_to_json};
use ocf_storage::{
    DatasetOutput, DatasetReader, FileCompression, OutputNames, SourceReader, Storage, TaskKind,
    write_dataset,
};
use tracing::info;

use crate::config::{CliConfig, Command, ReadArgs, WriteArgs};

/// Run the configured command.
pub fn run<W: Write>(config: &CliConfig, out: &mut W) -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(config.storage());
    match &config.command {
        Command::Inspect { file, compression } => {
            inspect(storage.as_ref(), file, compression.as_deref(), out)
        }
        Command::Plan { files, read } => plan(storage, files, read, out),
        Command::Count { files, read } => count(storage, files, read, out),
        Command::Cat { files, read, limit } => cat(storage, files, read, *limit, out),
        Command::Write(args) => write(storage.as_ref(), args, out),
    }
}

/// Print a file's header.
pub fn inspect<W: Write>(
    storage: &dyn Storage,
    file: &str,
    compression: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let compression = compression.map(FileCompression::from_name).transpose()?;
    let source = storage
        .open_decoded(file, compression)
        .with_context(|| format!("failed to open {file}"))?;
    let size = source.len();
    let header = Header::read(&mut SourceReader::new(source))
        .with_context(|| format!("failed to read header of {file}"))?;

    writeln!(out, "file:          {file}")?;
    writeln!(
        out,
        "magic:         {} (version {})",
        String::from_utf8_lossy(&MAGIC[..3]),
        MAGIC[3]
    )?;
    writeln!(out, "size:          {size} bytes")?;
    writeln!(out, "header length: {} bytes", header.header_len())?;
    writeln!(out, "sync token:    {}", header.sync_hex())?;
    match header.codec() {
        Ok(codec) => writeln!(out, "codec:         {codec}")?,
        Err(e) => writeln!(out, "codec:         {e}")?,
    }
    writeln!(out, "metadata:      {} entries", header.metadata.len())?;
    for (key, value) in &header.metadata {
        writeln!(out, "  {key}: {}", printable(value))?;
    }
    Ok(())
}

/// Print the windows and task keys a read would schedule.
pub fn plan<W: Write>(
    storage: Arc<dyn Storage>,
    files: &[String],
    read: &ReadArgs,
    out: &mut W,
) -> Result<()> {
    let reader = DatasetReader::new(storage, read.to_options()?)?;
    let plan = reader.plan(files)?;

    for file in plan.files() {
        writeln!(
            out,
            "{}: {} bytes, header {} bytes, sync {}",
            file.path,
            file.size,
            file.header.header_len(),
            file.header.sync_hex()
        )?;
    }
    for task in plan.tasks() {
        writeln!(out, "{}\t{}\t{}", task.key, task.path, describe(task.kind))?;
    }
    writeln!(out, "{} tasks", plan.len())?;
    Ok(())
}

/// Count records per window.
pub fn count<W: Write>(
    storage: Arc<dyn Storage>,
    files: &[String],
    read: &ReadArgs,
    out: &mut W,
) -> Result<()> {
    let reader = DatasetReader::new(storage, read.to_options()?)?;
    let output = reader.count_records(files)?;

    let mut total = 0u64;
    for window in output.windows() {
        let span = describe(window.kind);
        match &window.result {
            Ok(count) => {
                total += count;
                writeln!(out, "{}\t{}\t{}", window.path, span, count)?;
            }
            Err(e) => writeln!(out, "{}\t{}\tFAILED: {}", window.path, span, e)?,
        }
    }
    writeln!(out, "total\t{total}")?;
    check_complete(&output)
}

/// Decode records and print them as JSON lines.
pub fn cat<W: Write>(
    storage: Arc<dyn Storage>,
    files: &[String],
    read: &ReadArgs,
    limit: Option<usize>,
    out: &mut W,
) -> Result<()> {
    let reader = DatasetReader::new(storage, read.to_options()?)?;
    let output = reader.read_records(files, &AvroCodec)?;
    check_complete(&output)?;

    let limit = limit.unwrap_or(usize::MAX);
    let mut printed = 0usize;
    for window in output.into_windows() {
        for record in window.result? {
            if printed == limit {
                return Ok(());
            }
            let json = record_to_json(record)?;
            writeln!(out, "{}", serde_json::to_string(&json)?)?;
            printed += 1;
        }
    }
    Ok(())
}

/// Write JSON lines as one container per partition.
pub fn write<W: Write>(storage: &dyn Storage, args: &WriteArgs, out: &mut W) -> Result<()> {
    let options = args.to_options()?;
    if args.partitions == 0 {
        bail!("--partitions must be at least 1");
    }

    let schema_text = fs::read_to_string(&args.schema)
        .with_context(|| format!("failed to read schema {}", args.schema.display()))?;
    let schema = AvroSchema::parse(&schema_text)?;

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open input {}", args.input.display()))?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(input).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let location = || format!("{}:{}", args.input.display(), index + 1);
        let json: serde_json::Value =
            serde_json::from_str(&line).with_context(|| format!("{}: invalid JSON", location()))?;
        let record = schema
            .record_from_json(json)
            .with_context(|| format!("{}: record does not match schema", location()))?;
        records.push(record);
    }

    let per_partition = records.len().div_ceil(args.partitions).max(1);
    let mut partitions: Vec<Vec<_>> = records.chunks(per_partition).map(<[_]>::to_vec).collect();
    partitions.resize_with(args.partitions, Vec::new);

    let paths = write_dataset(
        storage,
        &OutputNames::Pattern(args.output.clone()),
        &partitions,
        &AvroCodec,
        &schema,
        &options,
        None,
    )?;
    for path in &paths {
        writeln!(out, "{path}")?;
    }
    info!("Wrote {} records to {} files", records.len(), paths.len());
    Ok(())
}

fn check_complete<T>(output: &DatasetOutput<T>) -> Result<()> {
    let failed = output.failures().count();
    if failed > 0 {
        bail!("{failed} of {} windows failed", output.windows().len());
    }
    Ok(())
}

fn describe(kind: TaskKind) -> String {
    match kind {
        TaskKind::WholeFile => "whole".to_string(),
        TaskKind::Window(window) => format!("{}+{}", window.offset, window.length),
    }
}

fn printable(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(text) if text.chars().all(|c| !c.is_control() || c.is_whitespace()) => {
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        }
        _ => format!("0x{}", hex::encode(value)),
    }
}
