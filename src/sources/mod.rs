//! Remote sources.
//!
//! Everything the pipeline reads from or writes to the network: the version
//! catalog, upstream source archives and the release-hosting API.

pub mod catalog;
pub mod github;
pub mod http;
pub mod tarball;

pub use catalog::{fetch_catalog, load_catalog, read_catalog};
pub use github::{Asset, CreateRelease, GitHubReleases, Release, ReleaseApi, RepoRef};
pub use http::{build_client, HttpClient, ReqwestClient};
pub use tarball::{SourceFetcher, SourceTree};
