//! Loading form HTML from a URL or the local filesystem.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use formfill_shared::{FormFillError, Result};

/// User-Agent string for form requests.
const USER_AGENT: &str = concat!("FormFill/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow when fetching a form.
const MAX_REDIRECTS: usize = 5;

/// Default timeout in seconds for fetching a form.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where a form's HTML comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSource {
    /// `http://` or `https://` page.
    Remote(Url),
    /// Local file, given as a path or a `file://` URL.
    Local(PathBuf),
}

impl FormSource {
    /// Classify a user-supplied form location.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(FormFillError::validation("form source is empty"));
        }

        match Url::parse(source) {
            // Single-letter schemes are Windows drive letters, not URLs.
            Ok(url) if url.scheme().len() == 1 => Ok(Self::Local(PathBuf::from(source))),
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Remote(url)),
                "file" => url.to_file_path().map(Self::Local).map_err(|()| {
                    FormFillError::validation(format!("not a usable file URL: {url}"))
                }),
                other => Err(FormFillError::validation(format!(
                    "unsupported form source scheme '{other}': expected http, https, or file"
                ))),
            },
            Err(_) => Ok(Self::Local(PathBuf::from(source))),
        }
    }
}

impl std::fmt::Display for FormSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read the HTML for a form source.
#[instrument(skip_all, fields(source = %source))]
pub async fn load_form_html(source: &FormSource) -> Result<String> {
    match source {
        FormSource::Local(path) => {
            debug!(path = %path.display(), "reading form from disk");
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| FormFillError::io(path, e))
        }
        FormSource::Remote(url) => {
            info!(%url, "fetching form");
            let client = build_client()?;
            fetch(&client, url).await
        }
    }
}

/// Build a reqwest client with appropriate settings.
fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| FormFillError::Network(format!("failed to build HTTP client: {e}")))
}

async fn fetch(client: &Client, url: &Url) -> Result<String> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| FormFillError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FormFillError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| FormFillError::Network(format!("{url}: failed to read body: {e}")))
}
