//! # epubweb
//!
//! Turn an extracted EPUB into a static website: one HTML page per physical
//! content page, a shared navigation menu, prev/next pagination across the
//! whole book, and a JSON full-text search index.
//!
//! ## Quick Start
//!
//! ```no_run
//! use epubweb::{convert, SiteConfig};
//!
//! let config = SiteConfig::new("site/").with_gitbook_url("https://cdn.example.com/gitbook");
//! let first_page = convert("extracted-book/", &config)?;
//! println!("open site/{first_page}");
//! # Ok::<(), epubweb::Error>(())
//! ```
//!
//! Archive extraction and copying non-page assets into the output directory
//! are left to the caller.
//!
//! ## Reading order
//!
//! The navigation tree comes from the curated TOC, the navigation document,
//! or the spine, in that order of preference. Guide entries are merged in
//! front (cover first), then every spine page the tree misses is inserted
//! next to its nearest predecessor ([`toc::reconcile`]). The tree is then
//! flattened into one pre-order sequence that drives pagination
//! ([`toc::LinearNav`]).
//!
//! ```
//! use epubweb::model::{NavTree, Origin, TocEntry};
//! use epubweb::toc::{reconcile, LinearNav};
//!
//! let mut tree = NavTree::from_entries(
//!     vec![TocEntry::new("A", "a.xhtml"), TocEntry::new("C", "c.xhtml")],
//!     Origin::CuratedToc,
//! );
//! reconcile(&mut tree, &["a.xhtml", "b.xhtml", "c.xhtml"], |href| Ok(href.to_string()))?;
//!
//! let linear = LinearNav::build(&tree)?;
//! let levels: Vec<&str> = linear.nodes().iter().map(|n| n.level.as_str()).collect();
//! assert_eq!(levels, ["1", "1.1", "2"]);
//! # Ok::<(), epubweb::Error>(())
//! ```

pub mod dom;
pub mod epub;
pub mod error;
pub mod model;
pub mod site;
pub mod toc;
pub(crate) mod util;

pub use epub::EpubDir;
pub use error::{Error, Result};
pub use site::{build_site, convert, SiteConfig, Templates};
