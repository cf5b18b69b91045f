//! Named output blobs and archive assembly.

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::BatchError;

/// What to do when an entry name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The later entry replaces the earlier one under the same name.
    #[default]
    Replace,
    /// The later entry gets `_2`, `_3`, ... appended to its stem.
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Ordered collection of named blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveManifest {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blob as `<stem>.<extension>` and return the name it was stored under.
    pub fn insert(
        &mut self,
        stem: &str,
        extension: &str,
        bytes: Vec<u8>,
        policy: DuplicatePolicy,
    ) -> String {
        let mut name = format!("{}.{}", stem, extension);
        match policy {
            DuplicatePolicy::Replace => {
                if let Some(existing) = self.entries.iter_mut().find(|e| e.name == name) {
                    log::warn!("Duplicate file name {}, replacing earlier entry", name);
                    existing.bytes = bytes;
                    return name;
                }
            }
            DuplicatePolicy::Suffix => {
                let mut n = 2;
                while self.contains(&name) {
                    name = format!("{}_{}.{}", stem, n, extension);
                    n += 1;
                }
            }
        }
        self.entries.push(ArchiveEntry {
            name: name.clone(),
            bytes,
        });
        name
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Packs a manifest into a single downloadable blob.
pub trait ArchiveAssembler: Send + Sync {
    fn assemble(&self, manifest: &ArchiveManifest) -> Result<Vec<u8>, BatchError>;

    /// MIME type of the produced blob.
    fn mime_type(&self) -> &'static str;
}

/// ZIP archive writer.
#[derive(Debug, Clone, Copy)]
pub struct ZipAssembler {
    pub compression: CompressionMethod,
}

impl Default for ZipAssembler {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ZipAssembler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveAssembler for ZipAssembler {
    fn assemble(&self, manifest: &ArchiveManifest) -> Result<Vec<u8>, BatchError> {
        let options = SimpleFileOptions::default().compression_method(self.compression);
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

        for entry in manifest.entries() {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| BatchError::Assembly(format!("{}: {}", entry.name, e)))?;
            writer
                .write_all(&entry.bytes)
                .map_err(|e| BatchError::Assembly(format!("{}: {}", entry.name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| BatchError::Assembly(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn mime_type(&self) -> &'static str {
        "application/zip"
    }
}
