//! Multi-volume indexing.
//!
//! Volumes are independent, so they can be indexed in any order. Both entry
//! points return results in input order and stop at the first failure.
//!
//! The concurrent path runs a fixed set of workers on a dedicated rayon pool.
//! The calling thread feeds job indices through a bounded channel and stops
//! feeding as soon as any worker records an error; jobs already queued are
//! drained without being run, jobs already running finish and are dropped.

use std::io;
use std::path::Path;
use std::sync::OnceLock;

use crossbeam_channel::bounded;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::error::{RarError, Result};
use crate::file_media::FileSystem;
use crate::indexer::{index_volume, IndexOptions};
use crate::volume_index::VolumeIndex;

/// Write-once slot for the first error reported by any worker.
///
/// Later errors are discarded.
#[derive(Debug, Default)]
pub struct FirstError(OnceLock<RarError>);

impl FirstError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `err` if no error was recorded yet. Returns whether it was kept.
    pub fn record(&self, err: RarError) -> bool {
        self.0.set(err).is_ok()
    }

    pub fn is_set(&self) -> bool {
        self.0.get().is_some()
    }

    pub fn into_inner(self) -> Option<RarError> {
        self.0.into_inner()
    }
}

/// Index volumes one after another on the calling thread.
pub fn index_volumes<F, P>(fs: &F, paths: &[P], options: &IndexOptions) -> Result<Vec<VolumeIndex>>
where
    F: FileSystem + ?Sized,
    P: AsRef<Path>,
{
    paths
        .iter()
        .map(|path| index_volume(fs, path.as_ref(), options))
        .collect()
}

/// Index volumes on up to `workers` threads. `0` picks rayon's default
/// (one per available CPU).
///
/// Each worker opens its own handles. The returned error is the first one
/// recorded, which is not necessarily the first failing volume in input
/// order.
pub fn index_volumes_parallel<F, P>(
    fs: &F,
    paths: &[P],
    workers: usize,
    options: &IndexOptions,
) -> Result<Vec<VolumeIndex>>
where
    F: FileSystem + ?Sized,
    P: AsRef<Path> + Sync,
{
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("rar-index-{index}"))
        .build()
        .map_err(|e| RarError::Io(io::Error::other(e)))?;
    let workers = pool.current_num_threads().min(paths.len());
    debug!(volumes = paths.len(), workers, "indexing volumes");

    let results: Vec<OnceLock<VolumeIndex>> = paths.iter().map(|_| OnceLock::new()).collect();
    let first_error = FirstError::new();
    let (job_tx, job_rx) = bounded::<usize>(workers);

    pool.in_place_scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let (results, first_error) = (&results, &first_error);
            scope.spawn(move |_| {
                for index in job_rx {
                    if first_error.is_set() {
                        continue;
                    }
                    match index_volume(fs, paths[index].as_ref(), options) {
                        Ok(volume) => {
                            if results[index].set(volume).is_err() {
                                first_error.record(RarError::Io(io::Error::other(format!(
                                    "volume {index} indexed twice"
                                ))));
                            }
                        }
                        Err(err) => {
                            if first_error.record(err) {
                                debug!(index, "first volume error recorded");
                            }
                        }
                    }
                }
            });
        }
        drop(job_rx);

        for index in 0..paths.len() {
            if first_error.is_set() || job_tx.send(index).is_err() {
                break;
            }
        }
        drop(job_tx);
    });

    if let Some(err) = first_error.into_inner() {
        return Err(err);
    }
    results
        .into_iter()
        .map(OnceLock::into_inner)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| RarError::Io(io::Error::other("volume worker exited without a result")))
}
