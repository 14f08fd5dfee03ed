//! Dataset writes: one container per partition
//!
//! Output paths come either from a pattern or from an explicit list. A
//! pattern holds exactly one `*`, replaced by the partition's name; a
//! pattern without `*` is a directory that receives `<name>.part` files.

use ocf_format::{ContainerWriter, RecordCodec, WriteOptions};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::storage::Storage;
use crate::{StorageError, StorageResult};

/// Name function padding indices to the width of `max_index`
///
/// With `max_index = 12` the names are `00`, `01`, ..., `12`, so they sort
/// in partition order.
pub fn default_name_function(max_index: usize) -> impl Fn(usize) -> String + Send + Sync {
    let width = max_index.to_string().len();
    move |i| format!("{i:0width$}")
}

/// Where partitions are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNames {
    /// Pattern with one `*`, or a directory
    Pattern(String),
    /// One explicit path per partition
    Paths(Vec<String>),
}

impl OutputNames {
    /// Expand into exactly `count` paths
    ///
    /// `name_fn` defaults to [`default_name_function`] over `count - 1`.
    pub fn resolve(
        &self,
        count: usize,
        name_fn: Option<&(dyn Fn(usize) -> String + Sync)>,
    ) -> StorageResult<Vec<String>> {
        match self {
            Self::Paths(paths) => {
                if paths.len() != count {
                    return Err(StorageError::NameCount {
                        expected: count,
                        actual: paths.len(),
                    });
                }
                Ok(paths.clone())
            }
            Self::Pattern(pattern) => {
                let pattern = match pattern.matches('*').count() {
                    0 => format!("{}/*.part", pattern.trim_end_matches('/')),
                    1 => pattern.clone(),
                    _ => return Err(StorageError::InvalidPattern(pattern.clone())),
                };
                let default_fn = default_name_function(count.saturating_sub(1));
                let paths = (0..count)
                    .map(|i| {
                        let name = name_fn.map_or_else(|| default_fn(i), |f| f(i));
                        pattern.replace('*', &name)
                    })
                    .collect();
                Ok(paths)
            }
        }
    }
}

/// Write one container per partition, returning the written paths
///
/// Options and names are checked before anything is written. Each file gets
/// its own random sync token.
pub fn write_dataset<C>(
    storage: &dyn Storage,
    names: &OutputNames,
    partitions: &[Vec<C::Record>],
    codec: &C,
    schema: &C::Schema,
    options: &WriteOptions,
    name_fn: Option<&(dyn Fn(usize) -> String + Sync)>,
) -> StorageResult<Vec<String>>
where
    C: RecordCodec + Sync,
    C::Record: Sync,
    C::Schema: Sync,
{
    options.validate()?;
    let paths = names.resolve(partitions.len(), name_fn)?;

    paths
        .par_iter()
        .zip(partitions.par_iter())
        .map(|(path, records)| -> StorageResult<()> {
            let writer = ContainerWriter::new(options.clone())?;
            let data = writer.to_vec(codec, schema, records)?;
            storage.create(path, &data)?;
            debug!("Wrote {} records to {} ({} bytes)", records.len(), path, data.len());
            Ok(())
        })
        .collect::<StorageResult<()>>()?;

    info!("Wrote {} partitions", paths.len());
    Ok(paths)
}
