//! Combined JSON-lines file sink
//!
//! Appends every record of the run to one file. Each line is serialized in
//! full before the file lock is taken and written straight to the file with
//! a single `write_all`, so lines from different completions never
//! interleave and every reported write is already in the file.

use crate::miner::Item;
use crate::output::traits::{Sink, SinkResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One JSON line per record, appended to a shared file
pub struct CombinedSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl CombinedSink {
    /// Opens `path` for appending, creating it if needed
    ///
    /// Existing content is kept, matching append semantics across runs.
    pub fn open(path: impl Into<PathBuf>) -> SinkResult<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, File> {
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for CombinedSink {
    fn write_item(&self, item: &Item) -> SinkResult<()> {
        let mut line = serde_json::to_vec(&item.metadata)?;
        line.push(b'\n');

        // Unbuffered: the line is in the file once this returns
        let mut file = self.lock();
        file.write_all(&line)?;
        Ok(())
    }

    fn finish(&self) -> SinkResult<()> {
        let file = self.lock();
        file.sync_data()?;
        tracing::debug!("Flushed combined output {}", self.path.display());
        Ok(())
    }
}
