//! Error types for epubweb operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while converting a book into a website.
///
/// Every variant is fatal for the run: there is no retry, and files already
/// written to the output directory are left in place.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required file: {}", .0.display())]
    MissingRequiredFile(PathBuf),

    #[error("Malformed markup in {path}: {reason}")]
    MalformedMarkup { path: String, reason: String },

    #[error("Spine page {0} has no anchor in the table of contents")]
    UnplaceableSpinePage(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Template error: {0}")]
    Template(String),
}

impl Error {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl ToString) -> Self {
        Error::MalformedMarkup {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
