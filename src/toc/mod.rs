//! Table of contents construction.
//!
//! ```text
//! curated TOC / nav document / spine ──► builder ──► reconcile ──► linear
//!                 + guide                  NavTree    (grows tree)   LinearNav
//! ```

pub mod builder;
pub mod linear;
pub mod reconcile;

pub use builder::{build_initial, merge_guide, synthesize_from_spine};
pub use linear::{LinearNav, LinearNode};
pub use reconcile::{heading_title, reconcile};

use crate::epub::ContentSource;
use crate::error::Result;
use crate::model::{NavTree, Package};

/// Build, reconcile and flatten the navigation for a book.
///
/// The returned tree is final: nodes are only ever added before
/// linearization, never after.
pub fn build_navigation(package: &Package, source: &dyn ContentSource) -> Result<(NavTree, LinearNav)> {
    let spine = package.spine_hrefs();
    let mut tree = build_initial(package, &spine, source)?;
    reconcile(&mut tree, &spine, |href| heading_title(source, href))?;
    let linear = LinearNav::build(&tree)?;
    Ok((tree, linear))
}
