//! Core data model for site generation.
//!
//! This module contains:
//! - Package types (manifest, spine, guide, metadata)
//! - The arena-backed navigation tree
//! - Href normalization and link classification

pub mod href;
mod nav;
mod package;

pub use href::Link;
pub use nav::{NavId, NavNode, NavTree, Origin, TocEntry};
pub use package::{GuideEntry, ManifestItem, Metadata, Package, SpineItem, COVER_GUIDE_TYPE};
