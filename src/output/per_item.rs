//! Per-item file sink
//!
//! Writes each record to `<directory>/<identifier>_meta.json`, replacing any
//! existing file. The document is written to a temporary file in the same
//! directory and renamed into place, so a failed write never leaves a
//! truncated document under the final name.

use crate::miner::{Identifier, Item};
use crate::output::traits::{Sink, SinkError, SinkResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to the identifier to form the file name
pub const META_FILE_SUFFIX: &str = "_meta.json";

/// One JSON document per identifier
#[derive(Debug, Clone)]
pub struct PerItemSink {
    directory: PathBuf,
}

impl PerItemSink {
    /// Creates the sink, creating `directory` if it does not exist
    pub fn new(directory: impl Into<PathBuf>) -> SinkResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding the record for `identifier`
    pub fn path_for(&self, identifier: &Identifier) -> SinkResult<PathBuf> {
        let name = identifier.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
        {
            return Err(SinkError::InvalidFileName(name.to_string()));
        }
        Ok(self.directory.join(format!("{}{}", name, META_FILE_SUFFIX)))
    }
}

impl Sink for PerItemSink {
    fn write_item(&self, item: &Item) -> SinkResult<()> {
        let path = self.path_for(&item.identifier)?;
        let document = serde_json::to_vec(&item.metadata)?;

        let mut tmp_name = path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        if let Err(e) = fs::write(&tmp_path, &document) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}
