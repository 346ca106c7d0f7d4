//! Files handed to the importer.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// MIME type accepted regardless of the file name.
pub const JSON_MIME_TYPE: &str = "application/json";

/// A selected file whose content can be read asynchronously.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Name shown to the user; its extension selects the parse strategy.
    fn name(&self) -> &str;

    /// Declared MIME type, if the selection surface provides one.
    fn mime_type(&self) -> Option<&str>;

    /// Size in bytes, if known without reading.
    fn size(&self) -> Option<u64>;

    /// Reads the whole content.
    async fn read(&self) -> io::Result<Vec<u8>>;
}

/// Whether a file may enter an import batch: a `.json` or `.csv` name, or a
/// declared JSON MIME type.
pub fn is_importable(source: &dyn FileSource) -> bool {
    let name = source.name().to_ascii_lowercase();
    name.ends_with(".json")
        || name.ends_with(".csv")
        || source
            .mime_type()
            .is_some_and(|mime| mime.eq_ignore_ascii_case(JSON_MIME_TYPE))
}

/// A file on the local disk.
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    size: Option<u64>,
}

impl DiskFile {
    /// Creates a handle without touching the file system.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self {
            path,
            name,
            size: None,
        }
    }

    /// Creates a handle and records the file size when metadata is available.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let mut file = Self::new(path);
        file.size = tokio::fs::metadata(&file.path).await.ok().map(|m| m.len());
        file
    }

    /// Location on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileSource for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> Option<&str> {
        None
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// A file already held in memory.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: Option<String>,
    contents: Vec<u8>,
}

impl MemoryFile {
    /// Creates an in-memory file.
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            contents: contents.into(),
        }
    }

    /// Sets the declared MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[async_trait]
impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn size(&self) -> Option<u64> {
        u64::try_from(self.contents.len()).ok()
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.contents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_admission_rules() {
        assert!(is_importable(&MemoryFile::new("StreamingHistory0.json", "")));
        assert!(is_importable(&MemoryFile::new("plays.CSV", "")));
        assert!(is_importable(
            &MemoryFile::new("download", "").with_mime_type("application/json")
        ));
        assert!(!is_importable(&MemoryFile::new("cover.png", "")));
        assert!(!is_importable(
            &MemoryFile::new("notes.txt", "").with_mime_type("text/plain")
        ));
    }

    #[tokio::test]
    async fn test_disk_file_reads_content_and_size() {
        let mut temp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        temp.write_all(b"endTime,artistName\n").unwrap();

        let file = DiskFile::open(temp.path()).await;
        assert!(file.name().ends_with(".csv"));
        assert_eq!(file.size(), Some(19));
        assert_eq!(file.read().await.unwrap(), b"endTime,artistName\n");
    }

    #[tokio::test]
    async fn test_missing_disk_file_fails_on_read() {
        let file = DiskFile::open("/definitely/not/here.json").await;
        assert_eq!(file.name(), "here.json");
        assert!(file.size().is_none());
        assert!(file.read().await.is_err());
    }
}
