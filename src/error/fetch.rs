//! Transport error classification
//!
//! Maps HTTP client failures and response statuses onto the download taxonomy.
//! Each failure lands in exactly one category; the first matching rule wins.

use reqwest::StatusCode;

use super::AlbtError;

/// Failure classes a transport error can fall into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FailureClass {
    Timeout,
    NotFound,
    NetworkUnavailable,
    Corrupt,
    Other,
}

type FailureCheck = fn(&reqwest::Error) -> bool;

const FAILURE_CLASSIFICATIONS: &[(FailureCheck, FailureClass)] = &[
    (|e| e.is_timeout(), FailureClass::Timeout),
    (
        |e| e.status().is_some_and(is_not_found_status),
        FailureClass::NotFound,
    ),
    (
        |e| e.is_connect() || e.is_request() || e.is_redirect(),
        FailureClass::NetworkUnavailable,
    ),
    (|e| e.is_body() || e.is_decode(), FailureClass::Corrupt),
];

fn classify(err: &reqwest::Error) -> FailureClass {
    for (check, class) in FAILURE_CLASSIFICATIONS {
        if check(err) {
            return *class;
        }
    }
    FailureClass::Other
}

fn is_not_found_status(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

/// Convert a reqwest failure for `url` into a categorized error
pub fn from_reqwest(url: &str, err: &reqwest::Error, timeout_secs: u64) -> AlbtError {
    match classify(err) {
        FailureClass::Timeout => timeout(url, timeout_secs),
        FailureClass::NotFound => not_found(url),
        FailureClass::NetworkUnavailable => network_unavailable(url, err.to_string()),
        FailureClass::Corrupt => AlbtError::CorruptArchive {
            reason: format!("incomplete response body from {url}: {err}"),
        },
        FailureClass::Other => AlbtError::Unknown {
            message: format!("{url}: {err}"),
        },
    }
}

/// Convert a non-success HTTP status into a categorized error
pub fn from_status(url: &str, status: StatusCode) -> AlbtError {
    if is_not_found_status(status) {
        not_found(url)
    } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        AlbtError::Timeout {
            url: url.to_string(),
            seconds: 0,
        }
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        network_unavailable(url, format!("HTTP {status}"))
    } else {
        AlbtError::Unknown {
            message: format!("{url}: HTTP {status}"),
        }
    }
}

pub fn not_found(resource: impl Into<String>) -> AlbtError {
    AlbtError::NotFound {
        resource: resource.into(),
    }
}

pub fn timeout(url: impl Into<String>, seconds: u64) -> AlbtError {
    AlbtError::Timeout {
        url: url.into(),
        seconds,
    }
}

pub fn network_unavailable(url: impl Into<String>, reason: impl Into<String>) -> AlbtError {
    AlbtError::NetworkUnavailable {
        url: url.into(),
        reason: reason.into(),
    }
}

pub fn corrupt_archive(reason: impl Into<String>) -> AlbtError {
    AlbtError::CorruptArchive {
        reason: reason.into(),
    }
}
