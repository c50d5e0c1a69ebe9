//! Release artifact resolution
//!
//! Turns a user-supplied ref (or "latest") into the URL of a downloadable archive:
//!
//! - a literal ref is tried as a tag archive, then a branch archive, then a generic ref
//!   archive; the first candidate that exists wins
//! - without a ref, the newest non-draft, non-prerelease release is looked up and its
//!   primary asset selected
//!
//! Release metadata goes through a caller-owned [`MetadataCache`] and the shared retry
//! policy.

mod cache;
mod release;
mod remote;

pub use cache::MetadataCache;
pub use release::Release;
pub use remote::Remote;

use std::fmt;

use crate::error::{AlbtError, Result, fetch};
use crate::retry::{self, RetryPolicy};
use crate::transport::Transport;

/// How a reference was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Tag,
    Branch,
    Ref,
    Release,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tag => "tag",
            Self::Branch => "branch",
            Self::Ref => "ref",
            Self::Release => "release",
        })
    }
}

/// Outcome of a successful resolution; immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReference {
    /// Ref as requested, `None` for "latest release"
    pub reference: Option<String>,
    /// Tag or branch the archive was resolved to; never empty
    pub resolved_tag: String,
    /// Primary archive URL
    pub asset_url: String,
    /// Release asset id, when resolved from a release listing
    pub asset_id: Option<String>,
    /// Secondary (zip) archive URL tried when the primary fails
    pub fallback_url: Option<String>,
    pub kind: RefKind,
}

impl ReleaseReference {
    /// Requested ref for diagnostics
    pub fn label(&self) -> &str {
        self.reference.as_deref().unwrap_or(&self.resolved_tag)
    }
}

const PRIMARY_EXT: &str = "tar.gz";
const SECONDARY_EXT: &str = "zip";

/// Resolves refs against one remote
pub struct Resolver<'a> {
    transport: &'a dyn Transport,
    remote: Remote,
    retry: RetryPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(transport: &'a dyn Transport, remote: Remote, retry: RetryPolicy) -> Self {
        Self {
            transport,
            remote,
            retry,
        }
    }

    /// Resolve `reference`, or the latest stable release when `None`
    ///
    /// # Errors
    ///
    /// `NotFound` when no candidate exists; any other transport category aborts the
    /// search immediately.
    pub fn resolve(
        &self,
        reference: Option<&str>,
        cache: &mut MetadataCache,
    ) -> Result<ReleaseReference> {
        let resolved = match reference {
            Some(r) => self.resolve_literal(r)?,
            None => self.resolve_latest(cache)?,
        };
        tracing::info!(
            tag = %resolved.resolved_tag,
            kind = %resolved.kind,
            url = %resolved.asset_url,
            "reference resolved"
        );
        Ok(resolved)
    }

    fn resolve_literal(&self, reference: &str) -> Result<ReleaseReference> {
        let reference = reference.trim();
        if reference.is_empty() || reference.contains(char::is_whitespace) {
            return Err(AlbtError::ConfigInvalid {
                message: format!("invalid ref '{reference}'"),
            });
        }

        let candidates: [(RefKind, fn(&Remote, &str, &str) -> String); 3] = [
            (RefKind::Tag, Remote::tag_archive),
            (RefKind::Branch, Remote::branch_archive),
            (RefKind::Ref, Remote::ref_archive),
        ];

        for (kind, url_for) in candidates {
            let primary = url_for(&self.remote, reference, PRIMARY_EXT);
            let secondary = url_for(&self.remote, reference, SECONDARY_EXT);

            if let Some((asset_url, fallback_url)) = self.first_existing(&primary, &secondary)? {
                return Ok(ReleaseReference {
                    reference: Some(reference.to_string()),
                    resolved_tag: reference.to_string(),
                    asset_url,
                    asset_id: None,
                    fallback_url,
                    kind,
                });
            }
        }

        Err(fetch::not_found(format!(
            "ref '{reference}' on {}",
            self.remote.base()
        )))
    }

    /// Probe the primary URL, then its zip sibling; `None` when both are absent
    fn first_existing(
        &self,
        primary: &str,
        secondary: &str,
    ) -> Result<Option<(String, Option<String>)>> {
        match self.transport.probe(primary) {
            Ok(()) => return Ok(Some((primary.to_string(), Some(secondary.to_string())))),
            Err(AlbtError::NotFound { .. }) => {
                tracing::debug!(url = %primary, "candidate not found");
            }
            Err(e) => return Err(e),
        }
        match self.transport.probe(secondary) {
            Ok(()) => Ok(Some((secondary.to_string(), None))),
            Err(AlbtError::NotFound { .. }) => {
                tracing::debug!(url = %secondary, "candidate not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn resolve_latest(&self, cache: &mut MetadataCache) -> Result<ReleaseReference> {
        let url = self.remote.releases_url();
        let body = cache.get_or_fetch(&url, || {
            retry::with_retry(
                "release metadata",
                &self.retry,
                || self.transport.get(&url),
                retry::is_transient,
            )
        })?;

        let release = release::latest_stable(&body, &url)?;
        let choice = release
            .primary_asset()
            .ok_or_else(|| fetch::not_found(format!("archive for release {}", release.tag_name)))?;

        if release.tag_name.trim().is_empty() {
            return Err(AlbtError::Unknown {
                message: format!("release listing from {url} has an empty tag"),
            });
        }

        Ok(ReleaseReference {
            reference: None,
            resolved_tag: release.tag_name,
            asset_url: choice.url,
            asset_id: choice.id,
            fallback_url: choice.fallback_url,
            kind: RefKind::Release,
        })
    }
}
