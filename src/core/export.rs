// fitbatch/src/core/export.rs
use super::Result;
use crate::utils::sanitize_filename;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A finished output ready to hand to a download or archive collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub file_name: String,
    pub bytes: Arc<[u8]>,
    pub mime_type: &'static str,
}

/// Receives named byte buffers. Archiving, uploading and the like live
/// behind this trait.
pub trait ExportSink {
    fn accept(&mut self, entry: &ExportEntry) -> Result<()>;

    fn accept_all(&mut self, entries: &[ExportEntry]) -> Result<usize> {
        for entry in entries {
            self.accept(entry)?;
        }
        Ok(entries.len())
    }
}

impl ExportSink for Vec<ExportEntry> {
    fn accept(&mut self, entry: &ExportEntry) -> Result<()> {
        self.push(entry.clone());
        Ok(())
    }
}

/// Writes every entry as a file in one directory. Clashing names get a
/// numeric suffix instead of overwriting each other.
pub struct DirectorySink {
    root: PathBuf,
    written: HashSet<String>,
}

impl DirectorySink {
    pub fn new(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            written: HashSet::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unique_name(&mut self, file_name: &str) -> String {
        let name = sanitize_filename(file_name);
        if self.written.insert(name.clone()) {
            return name;
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
            _ => (name.clone(), String::new()),
        };

        let mut counter = 1;
        loop {
            let candidate = format!("{}_{}{}", stem, counter, ext);
            if self.written.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

impl ExportSink for DirectorySink {
    fn accept(&mut self, entry: &ExportEntry) -> Result<()> {
        let name = self.unique_name(&entry.file_name);
        let path = self.root.join(&name);
        std::fs::write(&path, &entry.bytes)?;
        log::info!("Saved image: {} ({} bytes)", path.display(), entry.bytes.len());
        Ok(())
    }
}
