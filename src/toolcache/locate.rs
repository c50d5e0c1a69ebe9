//! Finding the compiler executable

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Compiler executable names, in lookup order
#[cfg(windows)]
pub const BINARY_NAMES: &[&str] = &["al.exe", "AL.exe", "alc.exe"];
#[cfg(not(windows))]
pub const BINARY_NAMES: &[&str] = &["al", "AL", "alc"];

/// Relative directories the executable is expected in
const EXPECTED_SUBPATHS: &[&str] = &["", "tools", "tools/net8.0/any", "bin"];

/// Depth of the fallback search through the package store
const SEARCH_DEPTH: usize = 8;

/// Locate the compiler under an install root
pub fn find_executable(root: &Path) -> Option<PathBuf> {
    for subpath in EXPECTED_SUBPATHS {
        let dir = if subpath.is_empty() {
            root.to_path_buf()
        } else {
            root.join(subpath)
        };
        if let Some(found) = BINARY_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
        {
            return Some(found);
        }
    }

    WalkDir::new(root)
        .max_depth(SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| BINARY_NAMES.contains(&n))
        })
        .map(walkdir::DirEntry::into_path)
}

/// Default package id for the current platform
pub fn default_package_id() -> &'static str {
    if cfg!(target_os = "linux") {
        "microsoft.dynamics.businesscentral.development.tools.linux"
    } else if cfg!(target_os = "macos") {
        "microsoft.dynamics.businesscentral.development.tools.osx"
    } else {
        "microsoft.dynamics.businesscentral.development.tools"
    }
}

/// A globally installed .NET tool matching `package_id` and `version`
///
/// Global tools live in `<tools_dir>/<exe>` with their package under
/// `<tools_dir>/.store/<id>/<version>`.
pub fn find_global_tool(tools_dir: &Path, package_id: &str, version: &str) -> Option<PathBuf> {
    let store = tools_dir
        .join(".store")
        .join(package_id.to_lowercase())
        .join(version);
    if !store.is_dir() {
        return None;
    }
    BINARY_NAMES
        .iter()
        .map(|name| tools_dir.join(name))
        .find(|p| p.is_file())
}

/// Default location of global .NET tools
pub fn global_tools_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".dotnet").join("tools"))
}
