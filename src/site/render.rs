//! Page rendering.
//!
//! Pages are rendered tail to head. Several entries may point into one
//! physical page; each of them writes the file, so the copy left on disk is
//! the one rendered for the first entry, with that entry's title.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::SiteConfig;
use super::navigation::{Navigation, NAVIGATION};
use super::rewrite::rewrite_page;
use crate::epub::ContentSource;
use crate::error::{Error, Result};
use crate::model::href::{output_filename, page_link};
use crate::model::{Metadata, NavTree};
use crate::toc::{LinearNav, LinearNode};
use crate::util::now_iso8601;

const PAGE: &str = "page";

/// Target of a pagination control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub title: String,
    pub href: String,
}

impl PageLink {
    fn to(node: &LinearNode) -> Self {
        Self {
            title: node.title.clone(),
            href: page_link(&node.href),
        }
    }
}

/// Everything the page template can refer to.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub title: &'a str,
    pub book_title: &'a str,
    pub authors: &'a [String],
    pub language: &'a str,
    pub level: &'a str,
    pub depth: usize,
    pub filename: &'a str,
    pub navigation: String,
    pub head_links: String,
    pub body: &'a str,
    pub prev: Option<PageLink>,
    pub next: Option<PageLink>,
    pub generated_at: &'a str,
    pub gitbook_url: &'a str,
}

/// Renders and writes the pages of one book.
pub struct SiteRenderer<'a> {
    config: &'a SiteConfig,
    handlebars: Handlebars<'a>,
}

impl<'a> SiteRenderer<'a> {
    /// Register the configured templates.
    pub fn new(config: &'a SiteConfig) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string(PAGE, config.templates.page())
            .map_err(|e| Error::Template(e.to_string()))?;
        handlebars
            .register_template_string(NAVIGATION, config.templates.navigation())
            .map_err(|e| Error::Template(e.to_string()))?;

        Ok(Self { config, handlebars })
    }

    /// Render every node of `linear` to the output directory.
    ///
    /// Each node's rewritten body is left on the node for the index builder.
    /// Returns the number of distinct files written.
    pub fn render_all(
        &self,
        tree: &NavTree,
        linear: &mut LinearNav,
        source: &dyn ContentSource,
        metadata: &Metadata,
    ) -> Result<usize> {
        fs::create_dir_all(&self.config.output_dir)?;

        let navigation = Navigation::snapshot(tree, linear);
        let generated_at = now_iso8601();
        let mut written = BTreeSet::new();
        let mut stale = BTreeSet::new();

        for index in (0..linear.len()).rev() {
            let Some(node) = linear.get(index) else {
                continue;
            };
            let filename = output_filename(&node.src)?;

            let mut page = source.load_page(&node.html_path)?;
            let rewritten = rewrite_page(&mut page, &node.dir);
            let body = page.body_html();

            let context = PageContext {
                title: &node.title,
                book_title: &metadata.title,
                authors: &metadata.authors,
                language: &metadata.language,
                level: &node.level,
                depth: node.depth,
                filename: &filename,
                navigation: navigation.render(&self.handlebars, &filename)?,
                head_links: page.head_links_html(),
                body: &body,
                prev: linear.find_prev_html(index).and_then(|i| linear.get(i)).map(PageLink::to),
                next: linear.find_next_html(index).and_then(|i| linear.get(i)).map(PageLink::to),
                generated_at: &generated_at,
                gitbook_url: &self.config.gitbook_url,
            };
            let html = self
                .handlebars
                .render(PAGE, &context)
                .map_err(|e| Error::Template(e.to_string()))?;

            fs::write(self.config.output_dir.join(&filename), html)?;
            debug!(level = %node.level, file = %filename, rewritten, "wrote page");

            // Originals are only stale when their extension was normalized.
            if filename != node.src {
                for original in [&node.src, &node.html_path] {
                    if *original != filename {
                        stale.insert(original.clone());
                    }
                }
            }
            written.insert(filename);
            linear.set_body(index, body);
        }

        // Removed only once every page is rendered: the output directory may
        // be the one pages are read from.
        for original in stale.difference(&written) {
            remove_stale(&self.config.output_dir, original);
        }

        info!(pages = written.len(), entries = linear.len(), "rendered site");
        Ok(written.len())
    }
}

fn remove_stale(output_dir: &Path, original: &str) {
    let mut path = PathBuf::from(output_dir);
    for part in original.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if part == ".." {
            return;
        }
        path.push(part);
    }

    if path.is_file() {
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed stale page"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale page"),
        }
    }
}
