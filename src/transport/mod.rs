//! Byte transport for remote resources
//!
//! Release metadata and archives are fetched through the [`Transport`] trait so the
//! resolver and fetcher never talk to the network directly. [`DefaultTransport`]
//! serves `http(s)://` URLs through a blocking reqwest client and `file://` URLs from
//! the local filesystem (offline mirrors and tests).

mod file;
mod http;

pub use file::FileTransport;
pub use http::HttpTransport;

use crate::config::Config;
use crate::error::{AlbtError, Result};

/// Fetches remote resources
pub trait Transport: Send + Sync {
    /// Download the full body of `url`
    fn get(&self, url: &str) -> Result<Vec<u8>>;

    /// Check that `url` exists without downloading it
    ///
    /// Fails with `NotFound` when the resource is absent.
    fn probe(&self, url: &str) -> Result<()>;
}

/// Scheme-dispatching transport used by the binary
pub struct DefaultTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl DefaultTransport {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new(config.http_timeout, config.github_token.clone())?,
            file: FileTransport,
        })
    }

    fn select(&self, url: &str) -> Result<&dyn Transport> {
        if url.starts_with("file://") {
            Ok(&self.file)
        } else if url.starts_with("https://") || url.starts_with("http://") {
            Ok(&self.http)
        } else {
            Err(AlbtError::ConfigInvalid {
                message: format!("unsupported URL scheme: {url}"),
            })
        }
    }
}

impl Transport for DefaultTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.select(url)?.get(url)
    }

    fn probe(&self, url: &str) -> Result<()> {
        self.select(url)?.probe(url)
    }
}
