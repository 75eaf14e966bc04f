//! Catalog Data Sources
//!
//! The catalog document is fetched exactly once per session. A source only
//! produces the raw response; parsing belongs to the catalog store.

use std::fs;
use std::path::PathBuf;

use crate::catalog::LoadError;

/// Raw response from a data source.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait CatalogSource {
    fn describe(&self) -> String;

    /// `Err` means the source could not be reached at all.
    fn fetch(&self) -> Result<FetchResponse, LoadError>;
}

/// Catalog document on the local filesystem.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<FetchResponse, LoadError> {
        let body = fs::read_to_string(&self.path)
            .map_err(|e| LoadError::Unreachable(format!("{}: {}", self.path.display(), e)))?;
        Ok(FetchResponse::ok(body))
    }
}

/// Pre-fetched response, e.g. handed over by an embedding host.
pub struct StaticSource {
    name: String,
    response: FetchResponse,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, response: FetchResponse) -> Self {
        Self { name: name.into(), response }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::new("inline", FetchResponse::ok(body))
    }
}

impl CatalogSource for StaticSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn fetch(&self) -> Result<FetchResponse, LoadError> {
        Ok(self.response.clone())
    }
}
