//! Per-file task map
//!
//! A [`ReadPlan`] records, for every file, its decoded header, logical size
//! and partition plan, and derives one [`ChunkTask`] per unit of work. Task
//! keys are deterministic, so adding the same file twice schedules nothing
//! new. The plan is an ordinary value handed to the executor.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ocf_format::{Header, PartitionPlan, Window};
use tracing::debug;

use crate::compression::FileCompression;

/// Deterministic identifier of one unit of read work
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey(String);

impl TaskKey {
    /// Derive the key for a window of a file
    ///
    /// Format: `read-ocf-<offset>-<md5 hex>`, hashing the path, sync token,
    /// logical size, compression and offset.
    pub fn new(
        path: &str,
        header: &Header,
        size: u64,
        compression: Option<FileCompression>,
        offset: u64,
    ) -> Self {
        let mut input = Vec::with_capacity(path.len() + 48);
        input.extend_from_slice(path.as_bytes());
        input.push(0);
        input.extend_from_slice(&header.sync);
        input.extend_from_slice(&size.to_le_bytes());
        input.extend_from_slice(compression.map_or("none", FileCompression::name).as_bytes());
        input.push(0);
        input.extend_from_slice(&offset.to_le_bytes());

        let digest = md5::compute(&input);
        Self(format!("read-ocf-{}-{}", offset, hex::encode(digest.0)))
    }

    /// The key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a task reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// The complete file, without boundary location
    WholeFile,
    /// One byte window, cut on block boundaries
    Window(Window),
}

/// One independent unit of read work
#[derive(Debug, Clone)]
pub struct ChunkTask {
    /// Deterministic task key
    pub key: TaskKey,
    /// Storage path of the file
    pub path: String,
    /// Header shared by every task of the file
    pub header: Arc<Header>,
    /// Compression wrapping the file
    pub compression: Option<FileCompression>,
    /// Window or whole file
    pub kind: TaskKind,
}

/// Planning result for one file
#[derive(Debug, Clone)]
pub struct FilePlan {
    /// Storage path
    pub path: String,
    /// Decoded header
    pub header: Arc<Header>,
    /// Logical (decompressed) size
    pub size: u64,
    /// How the file is split
    pub partitions: PartitionPlan,
}

/// Task map for a whole dataset
#[derive(Debug, Clone, Default)]
pub struct ReadPlan {
    files: Vec<FilePlan>,
    tasks: Vec<ChunkTask>,
    index: HashMap<TaskKey, usize>,
}

impl ReadPlan {
    /// Create an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and its tasks, returning how many new tasks were scheduled
    pub fn add_file(
        &mut self,
        path: &str,
        header: Header,
        size: u64,
        partitions: PartitionPlan,
        compression: Option<FileCompression>,
    ) -> usize {
        let header = Arc::new(header);
        let kinds: Vec<(u64, TaskKind)> = match &partitions {
            PartitionPlan::WholeFile => vec![(0, TaskKind::WholeFile)],
            PartitionPlan::Windows(windows) => windows
                .iter()
                .map(|w| (w.offset, TaskKind::Window(*w)))
                .collect(),
        };

        let mut added = 0;
        for (offset, kind) in kinds {
            let key = TaskKey::new(path, &header, size, compression, offset);
            if self.index.contains_key(&key) {
                continue;
            }
            self.index.insert(key.clone(), self.tasks.len());
            self.tasks.push(ChunkTask {
                key,
                path: path.to_string(),
                header: Arc::clone(&header),
                compression,
                kind,
            });
            added += 1;
        }

        if added > 0 {
            self.files.push(FilePlan {
                path: path.to_string(),
                header,
                size,
                partitions,
            });
        }
        debug!("Planned {} ({} bytes): {} new tasks", path, size, added);
        added
    }

    /// Files in the order they were added
    pub fn files(&self) -> &[FilePlan] {
        &self.files
    }

    /// Tasks in file then window order
    pub fn tasks(&self) -> &[ChunkTask] {
        &self.tasks
    }

    /// Look up a task by key
    pub fn get(&self, key: &TaskKey) -> Option<&ChunkTask> {
        self.index.get(key).map(|&i| &self.tasks[i])
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no work is scheduled
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
