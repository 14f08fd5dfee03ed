//! Parallel dataset reads
//!
//! Reading happens in two phases. Planning opens every file once (files in
//! parallel), decodes its header and splits it into windows. Execution then
//! runs every task as an independent unit: open a fresh view, locate the
//! window's blocks, reconstruct a standalone chunk and hand it to the
//! caller's decoder. Tasks share nothing mutable, and a failed window does
//! not affect any other.

use std::sync::Arc;

use ocf_format::{Chunk, Header, PartitionPlanner, RecordCodec, count_records};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, trace, warn};

use crate::options::ReadOptions;
use crate::plan::{ChunkTask, ReadPlan, TaskKey, TaskKind};
use crate::source::SourceReader;
use crate::storage::Storage;
use crate::{StorageError, StorageResult};

/// Result of one task
#[derive(Debug)]
pub struct WindowOutput<T> {
    /// Task key
    pub key: TaskKey,
    /// File the task read
    pub path: String,
    /// Window or whole file
    pub kind: TaskKind,
    /// Decoded value or the task's error
    pub result: StorageResult<T>,
}

/// Results of every task, in file then window order
#[derive(Debug)]
pub struct DatasetOutput<T> {
    windows: Vec<WindowOutput<T>>,
}

impl<T> DatasetOutput<T> {
    /// Per-task results
    pub fn windows(&self) -> &[WindowOutput<T>] {
        &self.windows
    }

    /// Tasks that failed
    pub fn failures(&self) -> impl Iterator<Item = &WindowOutput<T>> {
        self.windows.iter().filter(|w| w.result.is_err())
    }

    /// Whether every task succeeded
    pub fn is_complete(&self) -> bool {
        self.windows.iter().all(|w| w.result.is_ok())
    }

    /// Per-task results, by value
    pub fn into_windows(self) -> Vec<WindowOutput<T>> {
        self.windows
    }

    /// Successful values in order, failing on the first failed task
    pub fn into_results(self) -> StorageResult<Vec<T>> {
        self.windows.into_iter().map(|w| w.result).collect()
    }
}

impl<R> DatasetOutput<Vec<R>> {
    /// All records in window order, failing on the first failed task
    pub fn into_records(self) -> StorageResult<Vec<R>> {
        Ok(self.into_results()?.into_iter().flatten().collect())
    }
}

/// Reads container datasets from a storage backend
pub struct DatasetReader {
    storage: Arc<dyn Storage>,
    options: ReadOptions,
    planner: PartitionPlanner,
    pool: Option<ThreadPool>,
}

impl DatasetReader {
    /// Create a reader, validating the options
    pub fn new(storage: Arc<dyn Storage>, options: ReadOptions) -> StorageResult<Self> {
        options.validate()?;
        let planner = options.planner()?;
        let pool = match options.parallelism {
            Some(threads) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| StorageError::ThreadPool(e.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            storage,
            options,
            planner,
            pool,
        })
    }

    /// Options this reader was created with
    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Decode a file's header and report its logical size
    pub fn open_head(&self, path: &str) -> StorageResult<(Header, u64)> {
        let source = self.storage.open_decoded(path, self.options.compression)?;
        let size = source.len();
        let header = Header::read(&mut SourceReader::new(source))?;
        debug!(
            "Read header of {}: {} metadata entries, {} header bytes, {} bytes total",
            path,
            header.metadata.len(),
            header.header_len(),
            size
        );
        Ok((header, size))
    }

    /// Read every header and build the task map
    ///
    /// Any header failure fails the whole plan; there is no partial header.
    pub fn plan<P: AsRef<str> + Sync>(&self, paths: &[P]) -> StorageResult<ReadPlan> {
        let heads: Vec<StorageResult<(Header, u64)>> = self.install(|| {
            paths
                .par_iter()
                .map(|path| self.open_head(path.as_ref()))
                .collect()
        });

        let mut plan = ReadPlan::new();
        for (path, head) in paths.iter().zip(heads) {
            let (header, size) = head?;
            let partitions = self.planner.plan(size);
            plan.add_file(
                path.as_ref(),
                header,
                size,
                partitions,
                self.options.compression,
            );
        }
        info!("Planned {} tasks over {} files", plan.len(), plan.files().len());
        Ok(plan)
    }

    /// Locate and reconstruct the chunk for one task
    pub fn read_chunk(&self, task: &ChunkTask) -> StorageResult<Chunk> {
        let located = match task.kind {
            TaskKind::WholeFile => self
                .storage
                .open_decoded(&task.path, task.compression)?
                .as_slice()
                .to_vec(),
            TaskKind::Window(window) => {
                let source = self.storage.open(&task.path)?;
                self.storage.read_range(
                    source.as_ref(),
                    window.offset,
                    window.length,
                    &task.header.sync,
                )?
            }
        };
        trace!("{}: located {} bytes", task.key, located.len());
        Ok(Chunk::reconstruct(&task.header, located))
    }

    /// Run `decode` over every task of `plan` in parallel
    pub fn execute<T, F>(&self, plan: &ReadPlan, decode: F) -> DatasetOutput<T>
    where
        T: Send,
        F: Fn(&Chunk) -> StorageResult<T> + Sync,
    {
        let windows: Vec<WindowOutput<T>> = self.install(|| {
            plan.tasks()
                .par_iter()
                .map(|task| {
                    let result = self.read_chunk(task).and_then(|chunk| decode(&chunk));
                    if let Err(e) = &result {
                        warn!("Task {} on {} failed: {}", task.key, task.path, e);
                    }
                    WindowOutput {
                        key: task.key.clone(),
                        path: task.path.clone(),
                        kind: task.kind,
                        result,
                    }
                })
                .collect()
        });

        let failed = windows.iter().filter(|w| w.result.is_err()).count();
        info!("Finished {} tasks ({} failed)", windows.len(), failed);
        DatasetOutput { windows }
    }

    /// Decode every record of the dataset with `codec`
    pub fn read_records<C, P>(
        &self,
        paths: &[P],
        codec: &C,
    ) -> StorageResult<DatasetOutput<Vec<C::Record>>>
    where
        C: RecordCodec + Sync,
        C::Record: Send,
        P: AsRef<str> + Sync,
    {
        let plan = self.plan(paths)?;
        Ok(self.execute(&plan, |chunk| {
            Ok(codec.decode_records(chunk.as_bytes())?)
        }))
    }

    /// Count records per task without decoding them
    pub fn count_records<P: AsRef<str> + Sync>(
        &self,
        paths: &[P],
    ) -> StorageResult<DatasetOutput<u64>> {
        let plan = self.plan(paths)?;
        Ok(self.execute(&plan, |chunk| Ok(count_records(chunk.as_bytes())?)))
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::compression::FileCompression;
    use crate::storage::MemoryStorage;
    use ocf_format::{ContainerWriter, DEFAULT_PARTITION_SIZE, Header, OcfError, WriteOptions};
    use std::collections::BTreeMap;

    /// A container whose blocks hold the given number of records each
    fn container(blocks: &[u64]) -> Vec<u8> {
        let header = Header::build(BTreeMap::new(), [9u8; 16]);
        let mut data = header.header_bytes.clone();
        for &count in blocks {
            data.extend(ocf_format::block::frame_block(count as usize, &[]));
            data.extend_from_slice(&header.sync);
        }
        data
    }

    fn storage_with(files: &[(&str, Vec<u8>)]) -> Arc<MemoryStorage> {
        let storage = MemoryStorage::new();
        for (path, data) in files {
            storage.insert(*path, data.clone());
        }
        Arc::new(storage)
    }

    #[test]
    fn test_counts_whole_files() {
        let storage = storage_with(&[("a", container(&[3, 4])), ("b", container(&[5]))]);
        let reader = DatasetReader::new(storage, ReadOptions::default().whole_file()).unwrap();

        let output = reader.count_records(&["a", "b"]).unwrap();
        assert!(output.is_complete());
        assert_eq!(output.into_results().unwrap(), vec![7, 5]);
    }

    #[test]
    fn test_counts_windows() {
        let data = container(&[1, 2, 3, 4, 5, 6]);
        let size = data.len() as u64;
        let storage = storage_with(&[("a", data)]);
        let options = ReadOptions::default()
            .with_partition_size(Some(size / 4))
            .with_parallelism(2);
        let reader = DatasetReader::new(storage, options).unwrap();

        let counts = reader.count_records(&["a"]).unwrap().into_results().unwrap();
        assert!(counts.len() >= 4);
        assert_eq!(counts.iter().sum::<u64>(), 21);
    }

    #[test]
    fn test_bad_magic_fails_plan() {
        let storage = storage_with(&[("a", container(&[1])), ("bad", b"PAR1xxxx".to_vec())]);
        let reader = DatasetReader::new(storage, ReadOptions::default()).unwrap();
        assert!(matches!(
            reader.plan(&["a", "bad"]),
            Err(StorageError::Format(OcfError::BadMagic(_)))
        ));
    }

    #[test]
    fn test_chunked_compressed_rejected_before_io() {
        let storage = storage_with(&[]);
        let options = ReadOptions::default().with_compression(Some(FileCompression::Gzip));
        assert!(matches!(
            DatasetReader::new(storage, options),
            Err(StorageError::ChunkedCompressedInput(_))
        ));
    }

    #[test]
    fn test_compressed_whole_file() {
        let packed = FileCompression::Gzip.compress(&container(&[2, 2])).unwrap();
        let storage = storage_with(&[("a.gz", packed)]);
        let options = ReadOptions::default()
            .whole_file()
            .with_compression(Some(FileCompression::Gzip));
        let reader = DatasetReader::new(storage, options).unwrap();

        let (_, size) = reader.open_head("a.gz").unwrap();
        assert_eq!(size, container(&[2, 2]).len() as u64);
        let counts = reader.count_records(&["a.gz"]).unwrap().into_results().unwrap();
        assert_eq!(counts, vec![4]);
    }

    #[test]
    fn test_writer_output_with_default_partition() {
        let storage = MemoryStorage::new();
        let writer = ContainerWriter::new(WriteOptions::default()).unwrap();
        let schema = ocf_format::AvroSchema::parse(r#""long""#).unwrap();
        let records: Vec<_> = (0..10).map(apache_avro::types::Value::Long).collect();
        storage.create("x", &writer.to_vec(&ocf_format::AvroCodec, &schema, &records).unwrap()).unwrap();

        let reader = DatasetReader::new(Arc::new(storage), ReadOptions::default()).unwrap();
        assert_eq!(reader.options().partition_size, Some(DEFAULT_PARTITION_SIZE));
        let decoded = reader
            .read_records(&["x"], &ocf_format::AvroCodec)
            .unwrap()
            .into_records()
            .unwrap();
        assert_eq!(decoded, records);
    }
}
