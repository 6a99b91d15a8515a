//! Access to the files of an extracted book.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::dom::PageDocument;
use crate::error::{Error, Result};
use crate::util::{decode_text, extract_xml_encoding, read_text_file};

/// Read-only access to the content directory of an extracted book.
///
/// Paths are package-relative, `/`-separated and already percent-decoded
/// (an HtmlPath, not a raw href).
pub trait ContentSource {
    /// Returns true if the file exists.
    fn exists(&self, path: &str) -> bool;

    /// Read a text file, decoding it to UTF-8.
    fn read_text(&self, path: &str) -> Result<String>;

    /// Load and parse a content page.
    fn load_page(&self, path: &str) -> Result<PageDocument> {
        Ok(PageDocument::parse(&self.read_text(path)?))
    }
}

// --- Implementation: Directory on disk ---

/// Content directory on disk (the directory holding the OPF).
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a package-relative path.
    pub fn full_path(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty() && *p != ".") {
            full.push(part);
        }
        full
    }
}

impl ContentSource for DirSource {
    fn exists(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }

    fn read_text(&self, path: &str) -> Result<String> {
        read_text_file(&self.full_path(path))
    }
}

// --- Implementation: In-memory ---

/// In-memory file map, for building books without touching the disk.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), data.into());
    }

    pub fn with_file(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl ContentSource for MemorySource {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn read_text(&self, path: &str) -> Result<String> {
        let bytes = self
            .files
            .get(path)
            .ok_or_else(|| Error::MissingRequiredFile(PathBuf::from(path)))?;
        let hint = extract_xml_encoding(bytes);
        Ok(decode_text(bytes, hint).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_source_reads_nested_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Text")).unwrap();
        std::fs::write(dir.path().join("Text/a b.xhtml"), "<p>hi</p>").unwrap();

        let source = DirSource::new(dir.path());
        assert!(source.exists("Text/a b.xhtml"));
        assert!(source.exists("./Text/a b.xhtml"));
        assert!(!source.exists("Text/missing.xhtml"));
        assert_eq!(source.read_text("Text/a b.xhtml").unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_dir_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirSource::new(dir.path());
        assert!(matches!(
            source.read_text("nope.xhtml"),
            Err(Error::MissingRequiredFile(_))
        ));
    }

    #[test]
    fn test_memory_source_load_page() {
        let source = MemorySource::new()
            .with_file("a.xhtml", "<html><head><title>A</title></head><body/></html>");
        let page = source.load_page("a.xhtml").unwrap();
        assert_eq!(page.title().as_deref(), Some("A"));
        assert!(source.read_text("b.xhtml").is_err());
    }
}
