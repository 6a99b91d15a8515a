//! Static site generation.
//!
//! [`convert`] runs the whole pipeline over an extracted book:
//!
//! 1. read the package ([`crate::epub::EpubDir`])
//! 2. build, reconcile and flatten the navigation ([`crate::toc`])
//! 3. render every page, tail to head ([`SiteRenderer`])
//! 4. write the search index ([`build_index`])
//!
//! The run stops at the first error. Pages already written stay in the
//! output directory, which should then be considered invalid.

pub mod config;
pub mod index;
pub mod navigation;
pub mod render;
pub mod rewrite;

pub use config::{SiteConfig, Templates, DEFAULT_INDEX_FILENAME};
pub use index::{build_index, write_index, IndexEntry, SearchIndex};
pub use navigation::{NavEntry, Navigation};
pub use render::{PageContext, PageLink, SiteRenderer};
pub use rewrite::rewrite_page;

use std::path::Path;

use tracing::info;

use crate::epub::{ContentSource, EpubDir};
use crate::error::{Error, Result};
use crate::model::href::output_filename;
use crate::model::Package;
use crate::toc::build_navigation;

/// Convert the extracted book in `workdir` into a site in
/// `config.output_dir`.
///
/// Returns the output filename of the first page.
///
/// # Example
///
/// ```no_run
/// use epubweb::{convert, SiteConfig};
///
/// let first = convert("book/", &SiteConfig::new("site/"))?;
/// println!("{first}");
/// # Ok::<(), epubweb::Error>(())
/// ```
pub fn convert(workdir: impl AsRef<Path>, config: &SiteConfig) -> Result<String> {
    let book = EpubDir::open(workdir)?;
    info!(
        title = %book.package().metadata.title,
        spine = book.package().spine.len(),
        "converting book"
    );
    build_site(book.package(), book.source(), config)
}

/// Run the pipeline for an already parsed package.
pub fn build_site(package: &Package, source: &dyn ContentSource, config: &SiteConfig) -> Result<String> {
    let (tree, mut linear) = build_navigation(package, source)?;

    let first = linear
        .head()
        .and_then(|head| linear.get(head))
        .map(|node| output_filename(&node.src))
        .transpose()?
        .ok_or_else(|| Error::malformed("navigation tree", "no pages to render"))?;

    let renderer = SiteRenderer::new(config)?;
    renderer.render_all(&tree, &mut linear, source, &package.metadata)?;

    let index = build_index(&mut linear)?;
    write_index(&config.index_path(), &index)?;

    Ok(first)
}
