//! Common test utilities for albt integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Environment variables read by albt; cleared so the developer's setup cannot leak in
const ALBT_VARS: &[&str] = &[
    "ALBT_REMOTE_URL",
    "ALBT_REF",
    "ALBT_SOURCE_SUBDIR",
    "ALBT_CACHE_DIR",
    "ALBT_HTTP_TIMEOUT_SECS",
    "ALBT_RETRY_DELAY_SECS",
    "ALBT_NUGET_FEED",
    "ALBT_COMPILER_PACKAGE",
    "ALBT_LOG",
    "ALBT_VIA_ORCHESTRATOR",
    "GITHUB_TOKEN",
    "GH_TOKEN",
];

/// Marker lines (`[install] ...`) printed on stdout
pub fn marker_lines(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| l.starts_with("[install]"))
        .map(str::to_string)
        .collect()
}

/// Value of `key="..."` in a marker line
pub fn marker_field(line: &str, key: &str) -> Option<String> {
    let needle = format!(" {key}=\"");
    let start = line.find(&needle)? + needle.len();
    let end = line[start..].find('"')?;
    Some(line[start..start + end].to_string())
}

/// Write a `.tar.gz` with the given `(path, content)` entries
pub fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Initialise a git repository at `path` with one commit
pub fn init_repo(path: &Path) {
    std::fs::create_dir_all(path).unwrap();
    let repo = git2::Repository::init(path).unwrap();
    std::fs::write(path.join("README.md"), "app\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("README.md")).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = git2::Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
}

/// A test workspace: an offline overlay remote, a destination repository, a tool
/// cache and a private temp root
pub struct TestWorkspace {
    pub temp: TempDir,
    pub remote: PathBuf,
    pub dest: PathBuf,
    pub cache: PathBuf,
    pub tmp: PathBuf,
    config: PathBuf,
}

impl TestWorkspace {
    /// Workspace whose remote publishes `main` with `overlay/foo.txt`
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = dunce::canonicalize(temp.path()).unwrap();
        let remote = root.join("remote");
        let dest = root.join("app");
        let cache = root.join("cache");
        let tmp = root.join("tmp");
        let config = root.join("config.yaml");
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(&config, "").unwrap();

        write_tar_gz(
            &remote.join("archive/refs/heads/main.tar.gz"),
            &[
                ("al-build-tools-main/overlay/foo.txt", "foo"),
                (
                    "al-build-tools-main/overlay/.github/workflows/ci.yml",
                    "name: ci\n",
                ),
                ("al-build-tools-main/README.md", "not part of the overlay"),
            ],
        );

        Self {
            temp,
            remote,
            dest,
            cache,
            tmp,
            config,
        }
    }

    /// `file://` URL of the remote
    pub fn remote_url(&self) -> String {
        let path = self.remote.display().to_string().replace('\\', "/");
        if path.starts_with('/') {
            format!("file://{path}")
        } else {
            format!("file:///{path}")
        }
    }

    /// Make the destination a git repository with one commit
    pub fn init_dest_repo(&self) {
        init_repo(&self.dest);
    }

    /// Temp workspaces left behind under the private temp root
    pub fn leftover_workspaces(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.tmp)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with("albt-install-"))
            })
            .collect()
    }

    /// albt with an isolated environment, config file, cache and temp root
    pub fn albt(&self) -> Command {
        let mut cmd = albt_cmd();
        cmd.arg("--config")
            .arg(&self.config)
            .env("ALBT_CACHE_DIR", &self.cache)
            .env("ALBT_REMOTE_URL", self.remote_url())
            .env("TMPDIR", &self.tmp)
            .env("TEMP", &self.tmp)
            .env("TMP", &self.tmp);
        cmd
    }

    /// `albt install` of `main` into the destination
    pub fn install(&self) -> Command {
        let mut cmd = self.albt();
        cmd.args(["install", "--ref", "main", "--dest"])
            .arg(&self.dest);
        cmd
    }
}

/// The albt binary with every albt variable removed and retries made instant
#[allow(deprecated)]
pub fn albt_cmd() -> Command {
    let mut cmd = Command::cargo_bin("albt").unwrap();
    for var in ALBT_VARS {
        cmd.env_remove(var);
    }
    cmd.env("ALBT_RETRY_DELAY_SECS", "0");
    cmd
}
