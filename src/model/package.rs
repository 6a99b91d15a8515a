//! Package document types: manifest, spine, guide.

use std::collections::HashMap;

/// Guide type reserved for the cover page.
pub const COVER_GUIDE_TYPE: &str = "cover";

/// An entry in the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Href relative to the package (OPF) directory.
    pub href: String,
    pub media_type: String,
    /// Set for the EPUB 3 navigation document (`properties="nav"`).
    pub is_navigation_document: bool,
}

/// An entry in the reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub idref: String,
}

/// A legacy guide reference (cover, toc, preface...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideEntry {
    pub kind: String,
    pub title: String,
    pub href: String,
}

impl GuideEntry {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            href: href.into(),
        }
    }

    pub fn is_cover(&self) -> bool {
        self.kind == COVER_GUIDE_TYPE
    }
}

/// Book metadata (the Dublin Core subset the site templates show).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
}

/// A parsed package document.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub metadata: Metadata,
    pub manifest: Vec<ManifestItem>,
    pub spine: Vec<SpineItem>,
    pub guide: Vec<GuideEntry>,
    /// Manifest id named by `<spine toc="...">`, if any.
    pub toc_id: Option<String>,
}

impl Package {
    pub fn manifest_item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// The EPUB 3 navigation document, if the manifest declares one.
    pub fn navigation_document(&self) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.is_navigation_document)
    }

    /// Href of the curated TOC named by the spine, if it is in the manifest.
    pub fn toc_href(&self) -> Option<&str> {
        self.toc_id
            .as_deref()
            .and_then(|id| self.manifest_item(id))
            .map(|item| item.href.as_str())
    }

    /// Spine hrefs in reading order. Idrefs missing from the manifest are
    /// dropped with a warning.
    pub fn spine_hrefs(&self) -> Vec<&str> {
        let by_id: HashMap<&str, &ManifestItem> = self
            .manifest
            .iter()
            .map(|item| (item.id.as_str(), item))
            .collect();

        self.spine
            .iter()
            .filter_map(|entry| match by_id.get(entry.idref.as_str()) {
                Some(item) => Some(item.href.as_str()),
                None => {
                    tracing::warn!(idref = %entry.idref, "spine item not in manifest, skipping");
                    None
                }
            })
            .collect()
    }
}
