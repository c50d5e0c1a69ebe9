//! HTTP(S) transport over a blocking reqwest client

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION};

use super::Transport;
use crate::error::{AlbtError, Result, fetch};

const USER_AGENT: &str = concat!("albt/", env!("CARGO_PKG_VERSION"));
const GITHUB_API_HOST: &str = "https://api.github.com/";

/// Transport for `http://` and `https://` URLs
///
/// Redirects are followed (GitHub archive URLs redirect to codeload); every request is
/// bounded by the configured timeout.
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
    github_token: Option<String>,
}

impl HttpTransport {
    pub fn new(timeout: Duration, github_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AlbtError::Unknown {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            timeout,
            github_token,
        })
    }

    fn decorate(&self, url: &str, request: RequestBuilder) -> RequestBuilder {
        if !url.starts_with(GITHUB_API_HOST) {
            return request;
        }
        let request = request.header(ACCEPT, "application/vnd.github+json");
        match &self.github_token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    fn send(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        tracing::debug!(%url, "sending request");
        let response = self
            .decorate(url, request)
            .send()
            .map_err(|e| fetch::from_reqwest(url, &e, self.timeout.as_secs()))?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            tracing::debug!(%url, %status, "request failed");
            Err(fetch::from_status(url, status))
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url, self.client.get(url))?;
        let body = response
            .bytes()
            .map_err(|e| fetch::from_reqwest(url, &e, self.timeout.as_secs()))?;
        Ok(body.to_vec())
    }

    fn probe(&self, url: &str) -> Result<()> {
        self.send(url, self.client.head(url)).map(|_| ())
    }
}
