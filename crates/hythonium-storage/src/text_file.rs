//! Flat text resource

use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StorageError;
use crate::Result;

/// A UTF-8 text resource that is always read and rewritten as a whole.
///
/// Clones share a write guard so two handles on the same resource never
/// interleave a rewrite.
pub struct TextFile {
    path: PathBuf,
    guard: Arc<Mutex<()>>,
}

impl TextFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the whole resource. A missing file is `Ok(None)`, not an error.
    pub fn read_to_string(&self) -> Result<Option<String>> {
        let _guard = self.guard.lock();
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                Err(StorageError::InvalidEncoding(self.path.clone()))
            }
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    /// Read the resource as trimmed, non-blank lines.
    ///
    /// Lines that are not valid UTF-8 are skipped so the rest of the file
    /// survives a single damaged entry.
    pub fn read_lines(&self) -> Result<Vec<String>> {
        let bytes = {
            let _guard = self.guard.lock();
            match fs::read(&self.path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(StorageError::io(&self.path, e)),
            }
        };

        let mut skipped = 0usize;
        let lines: Vec<String> = bytes
            .split(|byte| *byte == b'\n')
            .filter_map(|raw| match std::str::from_utf8(raw) {
                Ok(line) => Some(line.trim()),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if skipped > 0 {
            tracing::warn!(
                path = %self.path.display(),
                skipped,
                "Skipped lines that are not valid UTF-8"
            );
        }

        Ok(lines)
    }

    /// Replace the resource content.
    ///
    /// The text is written to a sibling temp file and renamed over the
    /// target, so readers see either the old or the new content.
    pub fn write_string(&self, content: &str) -> Result<()> {
        let _guard = self.guard.lock();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let tmp_path = self.tmp_path();
        {
            let mut file = fs::File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
            file.write_all(content.as_bytes())
                .and_then(|_| file.flush())
                .map_err(|e| StorageError::io(&tmp_path, e))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        tracing::trace!(
            path = %self.path.display(),
            bytes = content.len(),
            "Rewrote text resource"
        );

        Ok(())
    }

    /// Replace the resource with one entry per line.
    pub fn write_lines<I, S>(&self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut content = String::new();
        for line in lines {
            content.push_str(line.as_ref());
            content.push('\n');
        }
        self.write_string(&content)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Clone for TextFile {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            guard: Arc::clone(&self.guard),
        }
    }
}
