//! HTTP access for manifests and archives.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::core::{SetupError, SetupResult};
use crate::util::config::Config;
use crate::util::Shell;

/// Default User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("setup-otp/", env!("CARGO_PKG_VERSION"));

/// Minimal HTTP surface the pipeline needs.
pub trait HttpClient {
    /// GET `url` and return the body as text.
    fn get_text(&self, url: &str) -> SetupResult<String>;

    /// GET `url` and stream the body into `dest`, returning the byte count.
    fn download(&self, url: &str, dest: &Path) -> SetupResult<u64>;
}

/// Build the blocking client shared by downloads and the release API.
pub fn build_client(config: &Config) -> reqwest::Result<Client> {
    let user_agent = config
        .net
        .user_agent
        .clone()
        .unwrap_or_else(|| USER_AGENT.to_string());

    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(secs) = config.net.timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    builder.build()
}

/// [`HttpClient`] backed by reqwest's blocking client.
pub struct ReqwestClient {
    client: Client,
    shell: Arc<Shell>,
}

impl ReqwestClient {
    pub fn new(client: Client, shell: Arc<Shell>) -> Self {
        ReqwestClient { client, shell }
    }

    fn send(&self, url: &str) -> SetupResult<reqwest::blocking::Response> {
        let fetch_error = |e: reqwest::Error| SetupError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        self.client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)
    }
}

impl HttpClient for ReqwestClient {
    fn get_text(&self, url: &str) -> SetupResult<String> {
        tracing::debug!("GET {}", url);
        self.send(url)?.text().map_err(|e| SetupError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn download(&self, url: &str, dest: &Path) -> SetupResult<u64> {
        tracing::debug!("downloading {} to {}", url, dest.display());
        let mut response = self.send(url)?;

        let file = File::create(dest).map_err(|e| SetupError::io(dest, e))?;
        let pb = self.shell.bytes_progress(url, response.content_length());
        let mut writer = pb.wrap_write(BufWriter::new(file));

        let copied = response
            .copy_to(&mut writer)
            .map_err(|e| e.to_string())
            .and_then(|n| writer.flush().map(|_| n).map_err(|e| e.to_string()));
        drop(writer);
        pb.finish_and_clear();

        match copied {
            Ok(n) => Ok(n),
            Err(reason) => {
                // partial downloads must not be mistaken for archives
                let _ = std::fs::remove_file(dest);
                Err(SetupError::Fetch {
                    url: url.to_string(),
                    reason,
                })
            }
        }
    }
}
