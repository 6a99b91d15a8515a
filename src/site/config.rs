//! Site generation settings.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::util::read_text_file;

/// Default name of the search index written to the output directory.
pub const DEFAULT_INDEX_FILENAME: &str = "search_index.json";

/// Filename of the page template inside a template directory.
pub const PAGE_TEMPLATE: &str = "page.hbs";

/// Filename of the navigation template inside a template directory.
pub const NAVIGATION_TEMPLATE: &str = "navigation.hbs";

/// Handlebars template bodies, loaded once before rendering starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    page: String,
    navigation: String,
}

impl Default for Templates {
    /// The built-in gitbook-style templates.
    fn default() -> Self {
        Self {
            page: include_str!("../../templates/page.hbs").to_string(),
            navigation: include_str!("../../templates/navigation.hbs").to_string(),
        }
    }
}

impl Templates {
    pub fn new(page: impl Into<String>, navigation: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            navigation: navigation.into(),
        }
    }

    /// Load `page.hbs` and `navigation.hbs` from `dir`. A template missing
    /// from the directory keeps its built-in body.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::MissingRequiredFile(dir.to_path_buf()));
        }

        let mut templates = Self::default();
        let page = dir.join(PAGE_TEMPLATE);
        if page.is_file() {
            templates.page = read_text_file(&page)?;
        }
        let navigation = dir.join(NAVIGATION_TEMPLATE);
        if navigation.is_file() {
            templates.navigation = read_text_file(&navigation)?;
        }
        Ok(templates)
    }

    /// Page template. Receives the per-page context.
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Navigation template. Rendered once per page with `{ items }`; it is
    /// also registered as the `navigation` partial so it can recurse into
    /// each item's `items`.
    pub fn navigation(&self) -> &str {
        &self.navigation
    }
}

/// Configuration for [`crate::convert`].
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory the pages and the search index are written to. Non-page
    /// assets are expected to have been copied there already.
    pub output_dir: PathBuf,
    /// Base URL of the gitbook assets, passed through to the templates.
    pub gitbook_url: String,
    /// Filename of the search index inside `output_dir`.
    pub index_filename: String,
    pub templates: Templates,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            gitbook_url: String::new(),
            index_filename: DEFAULT_INDEX_FILENAME.to_string(),
            templates: Templates::default(),
        }
    }
}

impl SiteConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_gitbook_url(mut self, url: impl Into<String>) -> Self {
        self.gitbook_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_index_filename(mut self, filename: impl Into<String>) -> Self {
        self.index_filename = filename.into();
        self
    }

    pub fn with_templates(mut self, templates: Templates) -> Self {
        self.templates = templates;
        self
    }

    /// Path of the search index.
    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(&self.index_filename)
    }
}
