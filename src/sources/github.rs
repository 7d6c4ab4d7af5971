//! GitHub Releases REST client.
//!
//! Only the handful of endpoints the publisher needs are covered: release
//! lookup by tag, release creation, release listing, asset listing and asset
//! upload.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::{SetupError, SetupResult};

/// Page size used for list endpoints (GitHub's maximum).
const PER_PAGE: usize = 100;

/// `owner/repo` pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl FromStr for RepoRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(RepoRef {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(format!("invalid repository '{}': expected 'owner/repo'", s)),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A release as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    /// Hypermedia upload template, e.g. `https://uploads.github.com/.../assets{?name,label}`.
    pub upload_url: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// A release asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: Option<String>,
}

/// Outcome of a create-release request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRelease {
    Created(Release),
    /// Another job created the tag first.
    AlreadyExists,
}

/// Release-hosting operations used by the publisher.
pub trait ReleaseApi {
    /// Look up a release by tag; `None` when it does not exist.
    fn get_release_by_tag(&self, tag: &str) -> SetupResult<Option<Release>>;

    fn create_release(&self, tag: &str) -> SetupResult<CreateRelease>;

    fn list_releases(&self) -> SetupResult<Vec<Release>>;

    fn list_assets(&self, release: &Release) -> SetupResult<Vec<Asset>>;

    /// Upload `path` as asset `name` and return the asset the server recorded.
    fn upload_asset(&self, release: &Release, name: &str, path: &Path) -> SetupResult<Asset>;
}

#[derive(Serialize)]
struct NewRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
}

impl ApiErrorBody {
    fn is_already_exists(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.code.as_deref() == Some("already_exists"))
    }
}

/// [`ReleaseApi`] over the GitHub REST API.
pub struct GitHubReleases {
    client: Client,
    api_url: Url,
    repo: RepoRef,
    token: String,
}

impl GitHubReleases {
    pub fn new(client: Client, api_url: &str, repo: RepoRef, token: impl Into<String>) -> SetupResult<Self> {
        let api_url = Url::parse(api_url).map_err(|e| SetupError::Publish {
            reason: format!("invalid API URL '{}': {}", api_url, e),
        })?;

        Ok(GitHubReleases {
            client,
            api_url,
            repo,
            token: token.into(),
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// `<api>/repos/<owner>/<repo>/<segments...>`
    fn endpoint(&self, segments: &[&str]) -> SetupResult<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| SetupError::Publish {
                reason: format!("API URL '{}' cannot be a base", self.api_url),
            })?
            .pop_if_empty()
            .push("repos")
            .push(&self.repo.owner)
            .push(&self.repo.repo)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn send(&self, request: RequestBuilder, url: &Url) -> SetupResult<Response> {
        tracing::debug!("GitHub API {}", url);
        request.send().map_err(|e| SetupError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn get_paginated<T: for<'de> Deserialize<'de>>(&self, segments: &[&str]) -> SetupResult<Vec<T>> {
        let mut items = Vec::new();

        for page in 1.. {
            let mut url = self.endpoint(segments)?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let response = self.send(self.request(Method::GET, url.clone()), &url)?;
            let batch: Vec<T> = read_json(response, &url)?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }

        Ok(items)
    }
}

impl ReleaseApi for GitHubReleases {
    fn get_release_by_tag(&self, tag: &str) -> SetupResult<Option<Release>> {
        let url = self.endpoint(&["releases", "tags", tag])?;
        let response = self.send(self.request(Method::GET, url.clone()), &url)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response, &url).map(Some)
    }

    fn create_release(&self, tag: &str) -> SetupResult<CreateRelease> {
        let url = self.endpoint(&["releases"])?;
        let request = self.request(Method::POST, url.clone()).json(&NewRelease {
            tag_name: tag,
            name: tag,
        });
        let response = self.send(request, &url)?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().unwrap_or_default();
            let error: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
            if error.is_already_exists() {
                tracing::debug!("release {} already exists", tag);
                return Ok(CreateRelease::AlreadyExists);
            }
            return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, &url, &body));
        }

        read_json(response, &url).map(CreateRelease::Created)
    }

    fn list_releases(&self) -> SetupResult<Vec<Release>> {
        self.get_paginated(&["releases"])
    }

    fn list_assets(&self, release: &Release) -> SetupResult<Vec<Asset>> {
        let id = release.id.to_string();
        self.get_paginated(&["releases", &id, "assets"])
    }

    fn upload_asset(&self, release: &Release, name: &str, path: &Path) -> SetupResult<Asset> {
        let url = upload_url(&release.upload_url, name)?;
        let file = File::open(path).map_err(|e| SetupError::io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| SetupError::io(path, e))?
            .len();

        let request = self
            .request(Method::POST, url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(Body::sized(file, size));
        let response = self.send(request, &url)?;

        read_json(response, &url)
    }
}

/// Expand a release's `upload_url` template for asset `name`.
pub fn upload_url(template: &str, name: &str) -> SetupResult<Url> {
    let base = template.split('{').next().unwrap_or(template);
    let mut url = Url::parse(base).map_err(|e| SetupError::Publish {
        reason: format!("invalid upload URL '{}': {}", template, e),
    })?;
    url.query_pairs_mut().clear().append_pair("name", name);
    Ok(url)
}

fn read_json<T: for<'de> Deserialize<'de>>(response: Response, url: &Url) -> SetupResult<T> {
    let status = response.status();
    let body = response.text().map_err(|e| SetupError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(api_error(status, url, &body));
    }

    serde_json::from_str(&body).map_err(|e| SetupError::Publish {
        reason: format!("unexpected response from {}: {}", url, e),
    })
}

fn api_error(status: StatusCode, url: &Url, body: &str) -> SetupError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    SetupError::Publish {
        reason: format!("{} returned {}: {}", url, status, message),
    }
}
