//! Source readers for an extracted EPUB.
//!
//! [`EpubDir::open`] follows `META-INF/container.xml` to the package document
//! and parses it. The table of contents readers return owned [`TocEntry`]
//! trees with hrefs relative to the package directory.

pub mod nav_doc;
pub mod parser;
mod source;

pub use nav_doc::parse_nav_document;
pub use parser::{parse_container_xml, parse_ncx, parse_opf};
pub use source::{ContentSource, DirSource, MemorySource};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::model::href::{dir_name, html_path};
use crate::model::{Package, TocEntry};
use crate::util::read_text_file;

/// Location of the container document inside an extracted book.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Conventional curated TOC filename, looked up next to the package document.
pub const DEFAULT_NCX: &str = "toc.ncx";

/// An extracted book on disk.
#[derive(Debug, Clone)]
pub struct EpubDir {
    package: Package,
    opf_path: PathBuf,
    source: DirSource,
}

impl EpubDir {
    /// Open an extracted book rooted at `workdir`.
    ///
    /// Fails with [`crate::Error::MissingRequiredFile`] when the container or
    /// the package document it names is absent.
    pub fn open(workdir: impl AsRef<Path>) -> Result<Self> {
        let workdir = workdir.as_ref();

        let container = read_text_file(&workdir.join(CONTAINER_PATH))?;
        let full_path = parse_container_xml(&container)?;

        let source = DirSource::new(workdir);
        let opf_path = source.full_path(&full_path);
        let package = parse_opf(&read_text_file(&opf_path)?)?;

        let content_dir = match dir_name(&full_path) {
            "." => workdir.to_path_buf(),
            dir => source.full_path(dir),
        };
        debug!(opf = %opf_path.display(), content = %content_dir.display(), "opened package");

        Ok(Self {
            package,
            opf_path,
            source: DirSource::new(content_dir),
        })
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Path of the package document.
    pub fn opf_path(&self) -> &Path {
        &self.opf_path
    }

    /// The directory holding the package document; all package hrefs are
    /// relative to it.
    pub fn content_dir(&self) -> &Path {
        self.source.root()
    }

    pub fn source(&self) -> &DirSource {
        &self.source
    }
}

/// Read the curated TOC (NCX), if the book has one.
///
/// The manifest item named by `<spine toc>` is tried first, then
/// [`DEFAULT_NCX`] next to the package document.
pub fn curated_toc(package: &Package, source: &dyn ContentSource) -> Result<Option<Vec<TocEntry>>> {
    let candidates = package.toc_href().into_iter().chain([DEFAULT_NCX]);
    for href in candidates {
        let path = html_path(href);
        if source.exists(&path) {
            debug!(href, "reading curated TOC");
            return parse_ncx(&source.read_text(&path)?, href).map(Some);
        }
    }
    Ok(None)
}

/// Read the navigation document's TOC, if the manifest declares one.
pub fn navigation_toc(package: &Package, source: &dyn ContentSource) -> Result<Option<Vec<TocEntry>>> {
    let Some(item) = package.navigation_document() else {
        return Ok(None);
    };
    debug!(href = %item.href, "reading navigation document");
    let content = source.read_text(&html_path(&item.href))?;
    parse_nav_document(&content, &item.href).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::ManifestItem;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Disk Book</dc:title>
  </metadata>
  <manifest>
    <item id="c1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="c1"/></spine>
</package>"#;

    const NCX: &str = r#"<ncx><navMap>
  <navPoint id="n1"><navLabel><text>One</text></navLabel><content src="ch1.xhtml"/></navPoint>
</navMap></ncx>"#;

    fn package_with(items: Vec<ManifestItem>, toc_id: Option<&str>) -> Package {
        Package {
            manifest: items,
            toc_id: toc_id.map(String::from),
            ..Package::default()
        }
    }

    fn item(id: &str, href: &str, nav: bool) -> ManifestItem {
        ManifestItem {
            id: id.to_string(),
            href: href.to_string(),
            media_type: "application/xhtml+xml".to_string(),
            is_navigation_document: nav,
        }
    }

    #[test]
    fn test_open_follows_container() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("META-INF")).unwrap();
        std::fs::create_dir_all(dir.path().join("OEBPS")).unwrap();
        std::fs::write(dir.path().join(CONTAINER_PATH), CONTAINER).unwrap();
        std::fs::write(dir.path().join("OEBPS/content.opf"), OPF).unwrap();

        let book = EpubDir::open(dir.path()).unwrap();
        assert_eq!(book.package().metadata.title, "Disk Book");
        assert_eq!(book.content_dir(), dir.path().join("OEBPS"));
    }

    #[test]
    fn test_open_missing_container() {
        let dir = tempfile::tempdir().unwrap();
        let err = EpubDir::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredFile(p) if p.ends_with("container.xml")));
    }

    #[test]
    fn test_open_missing_opf() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("META-INF")).unwrap();
        std::fs::write(dir.path().join(CONTAINER_PATH), CONTAINER).unwrap();

        let err = EpubDir::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredFile(p) if p.ends_with("content.opf")));
    }

    #[test]
    fn test_curated_toc_from_spine_attribute() {
        let package = package_with(vec![item("ncx", "nav/book.ncx", false)], Some("ncx"));
        let source = MemorySource::new().with_file("nav/book.ncx", NCX);

        let toc = curated_toc(&package, &source).unwrap().unwrap();
        // Resolved against the NCX's own directory
        assert_eq!(toc[0].href, "nav/ch1.xhtml");
    }

    #[test]
    fn test_curated_toc_default_name() {
        let package = package_with(vec![], None);
        let source = MemorySource::new().with_file(DEFAULT_NCX, NCX);
        assert_eq!(curated_toc(&package, &source).unwrap().unwrap().len(), 1);

        let empty = MemorySource::new();
        assert!(curated_toc(&package, &empty).unwrap().is_none());
    }

    #[test]
    fn test_navigation_toc() {
        let package = package_with(vec![item("nav", "Text/nav.xhtml", true)], None);
        let source = MemorySource::new().with_file(
            "Text/nav.xhtml",
            r#"<html><body><nav><ol><li><a href="ch1.xhtml">One</a></li></ol></nav></body></html>"#,
        );

        let toc = navigation_toc(&package, &source).unwrap().unwrap();
        assert_eq!(toc, vec![TocEntry::new("One", "Text/ch1.xhtml")]);
        assert!(navigation_toc(&package_with(vec![], None), &source).unwrap().is_none());
    }
}
