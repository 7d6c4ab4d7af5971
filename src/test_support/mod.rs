//! Test utilities and mocks for setup-otp unit tests.
//!
//! Mocks implement the pipeline's seams ([`HttpClient`], [`CommandRunner`],
//! [`ReleaseApi`]) so whole pipelines run without network or subprocesses.
//! They take `&self` like the traits they implement and record every call;
//! several mocks can share one [`CallLog`] to assert cross-component order.
//!
//! # Example
//!
//! ```rust,ignore
//! use setup_otp::test_support::{MockExecutor, MockOutput};
//!
//! #[test]
//! fn test_example() {
//!     let exec = MockExecutor::new();
//!     exec.expect("brew --prefix", MockOutput::stdout("/opt/homebrew\n"));
//!
//!     // Pass &exec wherever a &dyn CommandRunner is needed...
//!     assert_eq!(exec.commands(), vec!["brew --prefix openssl"]);
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::core::{SetupError, SetupResult};
use crate::sources::github::{Asset, CreateRelease, Release, ReleaseApi};
use crate::sources::http::HttpClient;
use crate::util::process::{CommandOutput, CommandRunner, ProcessBuilder};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Ordered record of calls shared between mocks.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        CallLog::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockOutput {
    /// Exit status code (`None` = killed by signal).
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// When set, the command fails to start with this message.
    pub spawn_error: Option<String>,
}

impl MockOutput {
    /// A successful run with no output.
    pub fn success() -> Self {
        MockOutput::stdout("")
    }

    /// A successful run printing `stdout`.
    pub fn stdout(stdout: impl Into<String>) -> Self {
        MockOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
            spawn_error: None,
        }
    }

    /// A failing run with the given exit code and stderr.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockOutput {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
            spawn_error: None,
        }
    }

    /// The program could not be started.
    pub fn spawn_error(message: impl Into<String>) -> Self {
        MockOutput {
            status: None,
            stdout: String::new(),
            stderr: String::new(),
            spawn_error: Some(message.into()),
        }
    }
}

impl Default for MockOutput {
    fn default() -> Self {
        MockOutput::success()
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
struct CommandExpectation {
    prefix: String,
    output: MockOutput,
}

/// Mock process executor.
///
/// Commands are matched by their short form: the program's file name
/// followed by its arguments (`configure --with-ssl ...`), so tests do not
/// depend on absolute source paths. The first expectation whose prefix
/// matches wins; unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct MockExecutor {
    expectations: Mutex<Vec<CommandExpectation>>,
    calls: Mutex<Vec<ProcessBuilder>>,
    log: Option<CallLog>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    /// Create an executor that also records into `log`.
    pub fn with_log(log: CallLog) -> Self {
        MockExecutor {
            log: Some(log),
            ..MockExecutor::default()
        }
    }

    /// Add an expectation for commands starting with `prefix`.
    pub fn expect(&self, prefix: &str, output: MockOutput) -> &Self {
        self.expectations.lock().unwrap().push(CommandExpectation {
            prefix: prefix.to_string(),
            output,
        });
        self
    }

    /// All executed commands.
    pub fn calls(&self) -> Vec<ProcessBuilder> {
        self.calls.lock().unwrap().clone()
    }

    /// Short forms of all executed commands.
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(short_command).collect()
    }
}

impl CommandRunner for MockExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<CommandOutput> {
        let short = short_command(cmd);
        self.calls.lock().unwrap().push(cmd.clone());
        if let Some(ref log) = self.log {
            log.record(format!("run {}", short));
        }

        let output = self
            .expectations
            .lock()
            .unwrap()
            .iter()
            .find(|exp| short.starts_with(&exp.prefix))
            .map(|exp| exp.output.clone())
            .unwrap_or_default();

        if let Some(message) = output.spawn_error {
            return Err(io::Error::new(io::ErrorKind::NotFound, message));
        }

        Ok(CommandOutput {
            status: output.status,
            stdout: output.stdout.into_bytes(),
            stderr: output.stderr.into_bytes(),
        })
    }
}

/// `<program file name> <args...>`
pub fn short_command(cmd: &ProcessBuilder) -> String {
    let program = cmd
        .get_program()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cmd.get_program().display().to_string());

    std::iter::once(program)
        .chain(cmd.get_args().iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Mock HTTP response for testing downloads.
#[derive(Debug, Clone)]
pub struct MockHttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockHttpResponse {
    /// Create a successful response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        MockHttpResponse {
            status: 200,
            body: body.into(),
        }
    }

    /// Create a not found response.
    pub fn not_found() -> Self {
        MockHttpResponse {
            status: 404,
            body: b"Not Found".to_vec(),
        }
    }

    /// Create a server error response.
    pub fn server_error(message: &str) -> Self {
        MockHttpResponse {
            status: 500,
            body: message.as_bytes().to_vec(),
        }
    }

    /// Check if this is a successful response.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Mock HTTP client serving canned responses by exact URL.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: Mutex<HashMap<String, MockHttpResponse>>,
    requests: Mutex<Vec<String>>,
    log: Option<CallLog>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        MockHttpClient::default()
    }

    /// Create a client that also records into `log`.
    pub fn with_log(log: CallLog) -> Self {
        MockHttpClient {
            log: Some(log),
            ..MockHttpClient::default()
        }
    }

    /// Add a response for a URL.
    pub fn mock_url(&self, url: &str, response: MockHttpResponse) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    /// Get all requested URLs.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn get(&self, url: &str) -> SetupResult<MockHttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        if let Some(ref log) = self.log {
            log.record(format!("GET {}", url));
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(MockHttpResponse::not_found);

        if !response.is_success() {
            return Err(SetupError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP status {}", response.status),
            });
        }
        Ok(response)
    }
}

impl HttpClient for MockHttpClient {
    fn get_text(&self, url: &str) -> SetupResult<String> {
        let response = self.get(url)?;
        Ok(String::from_utf8_lossy(&response.body).into_owned())
    }

    fn download(&self, url: &str, dest: &Path) -> SetupResult<u64> {
        let response = self.get(url)?;
        std::fs::write(dest, &response.body).map_err(|e| SetupError::io(dest, e))?;
        Ok(response.body.len() as u64)
    }
}

#[derive(Debug, Default)]
struct ReleaseState {
    releases: Vec<Release>,
    assets: HashMap<u64, Vec<Asset>>,
    next_id: u64,
    race_on_create: bool,
    stale_tag_lookup: bool,
    reported_size: Option<u64>,
}

impl ReleaseState {
    fn insert_release(&mut self, tag: &str) -> Release {
        self.next_id += 1;
        let release = Release {
            id: self.next_id,
            tag_name: tag.to_string(),
            upload_url: format!(
                "https://uploads.example.com/repos/o/r/releases/{}/assets{{?name,label}}",
                self.next_id
            ),
            html_url: None,
        };
        self.releases.push(release.clone());
        release
    }
}

/// In-memory release host.
#[derive(Debug, Default)]
pub struct MockReleaseApi {
    state: Mutex<ReleaseState>,
    log: Option<CallLog>,
}

impl MockReleaseApi {
    pub fn new() -> Self {
        MockReleaseApi::default()
    }

    pub fn with_log(log: CallLog) -> Self {
        MockReleaseApi {
            log: Some(log),
            ..MockReleaseApi::default()
        }
    }

    /// Seed an existing release.
    pub fn add_release(&self, tag: &str) -> Release {
        self.state.lock().unwrap().insert_release(tag)
    }

    /// Seed an existing asset on `release`.
    pub fn add_asset(&self, release: &Release, name: &str, size: u64) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id + 1000;
        state.assets.entry(release.id).or_default().push(Asset {
            id,
            name: name.to_string(),
            size,
            browser_download_url: None,
        });
    }

    /// Make the next create lose a race: another job creates the tag first.
    pub fn race_on_create(&self) {
        self.state.lock().unwrap().race_on_create = true;
    }

    /// Make tag lookups miss, as if the release appeared right after them.
    pub fn stale_tag_lookup(&self) {
        self.state.lock().unwrap().stale_tag_lookup = true;
    }

    /// Report uploaded assets with this size instead of the real one.
    pub fn report_upload_size(&self, size: u64) {
        self.state.lock().unwrap().reported_size = Some(size);
    }

    pub fn releases(&self) -> Vec<Release> {
        self.state.lock().unwrap().releases.clone()
    }

    pub fn assets(&self, release: &Release) -> Vec<Asset> {
        self.state
            .lock()
            .unwrap()
            .assets
            .get(&release.id)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, entry: String) {
        if let Some(ref log) = self.log {
            log.record(entry);
        }
    }
}

impl ReleaseApi for MockReleaseApi {
    fn get_release_by_tag(&self, tag: &str) -> SetupResult<Option<Release>> {
        self.record(format!("get_release_by_tag {}", tag));
        let state = self.state.lock().unwrap();
        if state.stale_tag_lookup {
            return Ok(None);
        }
        Ok(state
            .releases
            .iter()
            .find(|r| r.tag_name == tag)
            .cloned())
    }

    fn create_release(&self, tag: &str) -> SetupResult<CreateRelease> {
        self.record(format!("create_release {}", tag));
        let mut state = self.state.lock().unwrap();

        if state.race_on_create || state.releases.iter().any(|r| r.tag_name == tag) {
            state.race_on_create = false;
            if !state.releases.iter().any(|r| r.tag_name == tag) {
                state.insert_release(tag);
            }
            return Ok(CreateRelease::AlreadyExists);
        }

        Ok(CreateRelease::Created(state.insert_release(tag)))
    }

    fn list_releases(&self) -> SetupResult<Vec<Release>> {
        self.record("list_releases".to_string());
        Ok(self.releases())
    }

    fn list_assets(&self, release: &Release) -> SetupResult<Vec<Asset>> {
        self.record(format!("list_assets {}", release.tag_name));
        Ok(self.assets(release))
    }

    fn upload_asset(&self, release: &Release, name: &str, path: &Path) -> SetupResult<Asset> {
        self.record(format!("upload_asset {}", name));
        let size = std::fs::metadata(path)
            .map_err(|e| SetupError::io(path, e))?
            .len();

        let mut state = self.state.lock().unwrap();
        let asset = Asset {
            id: state.next_id + 2000,
            name: name.to_string(),
            size: state.reported_size.unwrap_or(size),
            browser_download_url: None,
        };
        state
            .assets
            .entry(release.id)
            .or_default()
            .push(asset.clone());
        Ok(asset)
    }
}
