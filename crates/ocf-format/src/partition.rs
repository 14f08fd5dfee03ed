//! Byte-range partition planning
//!
//! Windows are cut without regard for block boundaries; the boundary
//! locator and chunk reconstruction make each window decodable on its own.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OcfError, OcfResult};

/// Default target partition size (100 MB)
pub const DEFAULT_PARTITION_SIZE: u64 = 100_000_000;

/// Byte window of the physical file assigned to one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Window {
    /// Start offset
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
}

impl Window {
    /// Create a window
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset
    pub const fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// How one file is split into units of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionPlan {
    /// Read the whole file as one partition without boundary location
    WholeFile,
    /// Contiguous windows covering the file
    Windows(Vec<Window>),
}

impl PartitionPlan {
    /// Windows of the plan (empty for whole-file plans)
    pub fn windows(&self) -> &[Window] {
        match self {
            Self::WholeFile => &[],
            Self::Windows(windows) => windows,
        }
    }

    /// Number of units of work
    pub fn len(&self) -> usize {
        match self {
            Self::WholeFile => 1,
            Self::Windows(windows) => windows.len(),
        }
    }

    /// Whether the plan schedules no work
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits files into windows of a target size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPlanner {
    partition_size: Option<u64>,
}

impl Default for PartitionPlanner {
    fn default() -> Self {
        Self {
            partition_size: Some(DEFAULT_PARTITION_SIZE),
        }
    }
}

impl PartitionPlanner {
    /// Create a planner; `None` disables chunking
    pub fn new(partition_size: Option<u64>) -> OcfResult<Self> {
        if partition_size == Some(0) {
            return Err(OcfError::InvalidPartitionSize(0));
        }
        Ok(Self { partition_size })
    }

    /// Planner that always reads whole files
    pub const fn whole_file() -> Self {
        Self {
            partition_size: None,
        }
    }

    /// Configured partition size
    pub const fn partition_size(&self) -> Option<u64> {
        self.partition_size
    }

    /// Plan the windows for a file of `size` logical bytes
    pub fn plan(&self, size: u64) -> PartitionPlan {
        let Some(partition_size) = self.partition_size else {
            return PartitionPlan::WholeFile;
        };

        let windows: Vec<Window> = (0..size)
            .step_by(usize::try_from(partition_size).unwrap_or(usize::MAX))
            .map(|offset| Window::new(offset, partition_size.min(size - offset)))
            .collect();

        debug!(
            "Planned {} windows of {} bytes for {} byte file",
            windows.len(),
            partition_size,
            size
        );
        PartitionPlan::Windows(windows)
    }
}
