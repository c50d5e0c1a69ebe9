//! Runtime detection from AL project manifests

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

const MANIFEST: &str = "app.json";
const MAX_DEPTH: usize = 2;

/// Path of the shallowest `app.json` below `project_root`
pub fn find_manifest(project_root: &Path) -> Option<PathBuf> {
    WalkDir::new(project_root)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST)
        .min_by_key(walkdir::DirEntry::depth)
        .map(walkdir::DirEntry::into_path)
}

/// `runtime` declared by the project's `app.json`, if any
pub fn detect_runtime(project_root: &Path) -> Option<String> {
    let manifest = find_manifest(project_root)?;
    let content = std::fs::read_to_string(&manifest).ok()?;
    // app.json files are often saved with a BOM
    let content = content.trim_start_matches('\u{feff}');
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(path = %manifest.display(), error = %e, "unreadable app.json");
            return None;
        }
    };
    let runtime = value.get("runtime")?.as_str()?.trim().to_string();
    tracing::debug!(path = %manifest.display(), %runtime, "runtime detected");
    (!runtime.is_empty()).then_some(runtime)
}
