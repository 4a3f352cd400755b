use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::Builder;

use crate::error::{Error, Result};

/// One deduplicated image in the import manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    /// Perceptual hash string, unique within a manifest
    #[serde(rename = "image")]
    pub perceptual_hash: String,

    /// Hex content digest of the original payload
    #[serde(rename = "file")]
    pub content_digest: String,

    /// Bot that will own the imported item
    #[serde(rename = "bot")]
    pub bot_id: i64,

    /// Source message id
    #[serde(rename = "id")]
    pub message_id: i64,
}

/// Import entries keyed by perceptual hash, kept in first-seen order
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<ImportEntry>,
    seen: HashSet<String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry with this perceptual hash was already accepted
    pub fn contains(&self, perceptual_hash: &str) -> bool {
        self.seen.contains(perceptual_hash)
    }

    /// Append an entry unless its perceptual hash is already present.
    ///
    /// Returns `false` and leaves the existing entry untouched on a duplicate.
    pub fn insert(&mut self, entry: ImportEntry) -> bool {
        if !self.seen.insert(entry.perceptual_hash.clone()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the manifest to `path`, replacing any existing file.
    ///
    /// The document is serialized to a temporary file next to `path` and renamed into
    /// place, so readers never observe a partial manifest. The result gets the same
    /// permissions a plain `File::create` would give it.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let write_error = |source: std::io::Error| Error::ManifestWrite {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut builder = Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Same mode as File::create, before the umask
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let mut file = builder.tempfile_in(dir).map_err(write_error)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer(&mut writer, &self.entries)
                .map_err(|e| write_error(e.into()))?;
            writer.flush().map_err(write_error)?;
        }
        file.persist(path).map_err(|e| write_error(e.error))?;

        info!(
            "Wrote {} import entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Read back the entries of a manifest file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<ImportEntry>> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| Error::Io(e.into()))
    }
}
