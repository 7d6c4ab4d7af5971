//! Fetching the upstream version catalog.

use std::path::Path;

use crate::core::{SetupError, SetupResult, VersionCatalog};
use crate::sources::http::HttpClient;

/// Download the manifest document at `url`.
pub fn fetch_catalog(http: &dyn HttpClient, url: &str) -> SetupResult<String> {
    tracing::info!("Fetching version catalog from {}", url);
    http.get_text(url)
}

/// Download and parse the catalog.
pub fn load_catalog(http: &dyn HttpClient, url: &str) -> SetupResult<VersionCatalog> {
    let document = fetch_catalog(http, url)?;
    let catalog = VersionCatalog::parse(&document);
    tracing::debug!("catalog lists {} versions", catalog.len());
    Ok(catalog)
}

/// Parse a catalog stored on disk.
pub fn read_catalog(path: &Path) -> SetupResult<VersionCatalog> {
    let document = std::fs::read_to_string(path).map_err(|e| SetupError::io(path, e))?;
    Ok(VersionCatalog::parse(&document))
}
