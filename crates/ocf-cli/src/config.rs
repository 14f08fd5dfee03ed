//! Command line configuration.
//!
//! Every option can also be supplied through an `OCF_*` environment
//! variable, so the tool can be configured from a job environment.
//!
//! # Example
//!
//! ```no_run
//! use ocf_cli::CliConfig;
//!
//! let config = CliConfig::from_args();
//! println!("verbose: {}", config.verbose);
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ocf_format::{DEFAULT_PARTITION_SIZE, DEFAULT_SYNC_INTERVAL, WriteOptions};
use ocf_storage::{FileCompression, LocalStorage, ReadOptions, StorageResult};

/// Top-level configuration parsed from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ocf",
    about = "Inspect, split, count, print and write object container files",
    version
)]
pub struct CliConfig {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true, env = "OCF_VERBOSE")]
    pub verbose: bool,

    /// Directory relative paths are resolved against
    #[arg(long, global = true, env = "OCF_ROOT")]
    pub root: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print a file's header: metadata, sync token and header length
    Inspect {
        /// Container file
        file: String,

        /// Whole-file compression wrapper (gzip or zlib)
        #[arg(long, env = "OCF_COMPRESSION")]
        compression: Option<String>,
    },

    /// Print the windows and task keys a read would schedule
    Plan {
        /// Container files
        #[arg(required = true)]
        files: Vec<String>,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Count records per window without decoding them
    Count {
        /// Container files
        #[arg(required = true)]
        files: Vec<String>,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Decode records and print them as JSON lines
    Cat {
        /// Container files
        #[arg(required = true)]
        files: Vec<String>,

        #[command(flatten)]
        read: ReadArgs,

        /// Stop after this many records
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Write JSON lines as one container per partition
    Write(WriteArgs),
}

/// Options shared by the read commands.
#[derive(Debug, Clone, Args)]
pub struct ReadArgs {
    /// Target window size in bytes
    #[arg(long, env = "OCF_PARTITION_SIZE", default_value_t = DEFAULT_PARTITION_SIZE)]
    pub partition_size: u64,

    /// Read every file as one partition
    #[arg(long, env = "OCF_WHOLE_FILE")]
    pub whole_file: bool,

    /// Whole-file compression wrapper (gzip or zlib); requires --whole-file
    #[arg(long, env = "OCF_COMPRESSION")]
    pub compression: Option<String>,

    /// Worker threads (defaults to one per core)
    #[arg(long, env = "OCF_THREADS")]
    pub threads: Option<usize>,
}

impl ReadArgs {
    /// Convert into reader options.
    pub fn to_options(&self) -> StorageResult<ReadOptions> {
        let compression = self
            .compression
            .as_deref()
            .map(FileCompression::from_name)
            .transpose()?;
        let partition_size = (!self.whole_file).then_some(self.partition_size);

        let mut options = ReadOptions::default()
            .with_partition_size(partition_size)
            .with_compression(compression);
        if let Some(threads) = self.threads {
            options = options.with_parallelism(threads);
        }
        Ok(options)
    }
}

/// Options for the write command.
#[derive(Debug, Clone, Args)]
pub struct WriteArgs {
    /// Schema JSON file
    #[arg(long, env = "OCF_SCHEMA")]
    pub schema: PathBuf,

    /// Input file with one JSON record per line
    #[arg(long)]
    pub input: PathBuf,

    /// Output pattern containing one '*', or a directory
    #[arg(long)]
    pub output: String,

    /// Block codec (null, deflate or snappy)
    #[arg(long, env = "OCF_CODEC", default_value = "null")]
    pub codec: String,

    /// Records per block
    #[arg(long, env = "OCF_SYNC_INTERVAL", default_value_t = DEFAULT_SYNC_INTERVAL)]
    pub sync_interval: usize,

    /// Number of output files
    #[arg(long, env = "OCF_PARTITIONS", default_value_t = 1)]
    pub partitions: usize,

    /// Extra header metadata as KEY=VALUE
    #[arg(long = "meta", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,
}

impl WriteArgs {
    /// Convert into writer options.
    pub fn to_options(&self) -> ocf_format::OcfResult<WriteOptions> {
        let mut options = WriteOptions::default()
            .with_codec_name(&self.codec)?
            .with_sync_interval(self.sync_interval);
        for (key, value) in &self.metadata {
            options = options.with_metadata(key.clone(), value.as_bytes());
        }
        options.validate()?;
        Ok(options)
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))?;
    Ok((key.to_string(), value.to_string()))
}

impl CliConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Storage backend for this configuration.
    pub fn storage(&self) -> LocalStorage {
        self.root
            .as_ref()
            .map_or_else(LocalStorage::new, LocalStorage::with_root)
    }
}
