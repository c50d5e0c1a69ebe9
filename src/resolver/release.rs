//! Published release listing

use serde::Deserialize;

use crate::error::{AlbtError, Result, fetch};

/// One entry of the GitHub releases listing (fields albt reads)
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    pub browser_download_url: String,
}

/// Download chosen for a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetChoice {
    pub url: String,
    pub id: Option<String>,
    pub fallback_url: Option<String>,
}

fn is_tarball(name: &str) -> bool {
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

fn is_zip(name: &str) -> bool {
    name.ends_with(".zip")
}

impl Release {
    pub fn is_stable(&self) -> bool {
        !self.draft && !self.prerelease
    }

    /// Primary asset: first tarball asset, else first zip asset, else the source tarball
    pub fn primary_asset(&self) -> Option<AssetChoice> {
        let tarball = self.assets.iter().find(|a| is_tarball(&a.name));
        let zip = self.assets.iter().find(|a| is_zip(&a.name));

        if let Some(asset) = tarball {
            return Some(AssetChoice {
                url: asset.browser_download_url.clone(),
                id: Some(asset.id.to_string()),
                fallback_url: zip
                    .map(|z| z.browser_download_url.clone())
                    .or_else(|| self.zipball_url.clone()),
            });
        }
        if let Some(asset) = zip {
            return Some(AssetChoice {
                url: asset.browser_download_url.clone(),
                id: Some(asset.id.to_string()),
                fallback_url: None,
            });
        }
        self.tarball_url.as_ref().map(|url| AssetChoice {
            url: url.clone(),
            id: None,
            fallback_url: self.zipball_url.clone(),
        })
    }
}

/// Parse a listing body and pick the newest stable release
pub fn latest_stable(body: &[u8], source: &str) -> Result<Release> {
    let releases: Vec<Release> = serde_json::from_slice(body).map_err(|e| AlbtError::Unknown {
        message: format!("unreadable release listing from {source}: {e}"),
    })?;
    releases
        .into_iter()
        .find(Release::is_stable)
        .ok_or_else(|| fetch::not_found(format!("stable release in {source}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"[
        {"tag_name": "v2.0.0-rc1", "draft": false, "prerelease": true, "assets": []},
        {"tag_name": "v1.9.0", "draft": true, "prerelease": false, "assets": []},
        {
            "tag_name": "v1.8.0",
            "draft": false,
            "prerelease": false,
            "tarball_url": "https://api.github.com/repos/o/r/tarball/v1.8.0",
            "zipball_url": "https://api.github.com/repos/o/r/zipball/v1.8.0",
            "assets": [
                {"id": 11, "name": "overlay.zip", "browser_download_url": "https://dl/overlay.zip"},
                {"id": 12, "name": "overlay.tar.gz", "browser_download_url": "https://dl/overlay.tar.gz"}
            ]
        },
        {"tag_name": "v1.7.0", "draft": false, "prerelease": false, "assets": []}
    ]"#;

    #[test]
    fn test_skips_drafts_and_prereleases() {
        let release = latest_stable(LISTING.as_bytes(), "test").unwrap();
        assert_eq!(release.tag_name, "v1.8.0");
    }

    #[test]
    fn test_prefers_tarball_asset() {
        let release = latest_stable(LISTING.as_bytes(), "test").unwrap();
        let choice = release.primary_asset().unwrap();
        assert_eq!(choice.url, "https://dl/overlay.tar.gz");
        assert_eq!(choice.id.as_deref(), Some("12"));
        assert_eq!(choice.fallback_url.as_deref(), Some("https://dl/overlay.zip"));
    }

    #[test]
    fn test_source_tarball_when_no_assets() {
        let release: Release = serde_json::from_str(
            r#"{"tag_name": "v1", "tarball_url": "https://t", "zipball_url": "https://z"}"#,
        )
        .unwrap();
        let choice = release.primary_asset().unwrap();
        assert_eq!(choice.url, "https://t");
        assert_eq!(choice.id, None);
        assert_eq!(choice.fallback_url.as_deref(), Some("https://z"));
    }

    #[test]
    fn test_no_stable_release_is_not_found() {
        let err = latest_stable(br#"[{"tag_name": "v1", "prerelease": true}]"#, "test").unwrap_err();
        assert!(matches!(err, AlbtError::NotFound { .. }));
    }

    #[test]
    fn test_garbage_listing() {
        assert!(latest_stable(b"<html>", "test").is_err());
    }
}
