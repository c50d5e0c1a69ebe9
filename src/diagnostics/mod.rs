//! Structured diagnostic markers
//!
//! Every observable event of an install run is written as one line:
//!
//! ```text
//! [install] <type> [<label>] key="value" key2="value with ""quotes"""
//! ```
//!
//! Values are always quoted; embedded quotes are doubled and line breaks are folded
//! into spaces so a marker never spans more than one line. Lines are written whole
//! under a lock, so markers never interleave with each other. Test harnesses read the
//! stream back with `parse_marker`, which tolerates keys it does not know.

#[cfg(test)]
mod parse;

#[cfg(test)]
pub use parse::{ParsedMarker, parse_marker};

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{AlbtError, ErrorCategory, Result};

/// Prefix shared by all markers
pub const MARKER_PREFIX: &str = "[install]";

/// A single diagnostic event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    kind: String,
    label: Option<String>,
    fields: Vec<(String, String)>,
}

impl Marker {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: None,
            fields: Vec::new(),
        }
    }

    /// Bare word following the type, e.g. the category of a `guard` marker
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    pub fn field_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    pub fn temp(workspace: &Path) -> Self {
        Self::new("temp").field("workspace", workspace.display())
    }

    pub fn success(reference: &str, overlay: &str, duration_secs: f64) -> Self {
        Self::new("success")
            .field("ref", reference)
            .field("overlay", overlay)
            .field("duration", format!("{:.2}", duration_secs.max(0.0)))
    }

    pub fn guard(category: ErrorCategory) -> Self {
        Self::new("guard").label(category.as_str())
    }

    pub fn download_failure(category: ErrorCategory, url: &str) -> Self {
        Self::new("download")
            .label("failure")
            .field("category", category)
            .field("url", url)
    }

    pub fn prerequisite(tool: &str, status: &str, version: Option<&str>) -> Self {
        Self::new("prerequisite")
            .field("tool", tool)
            .field("status", status)
            .field_opt("version", version)
    }

    pub fn step(name: &str) -> Self {
        Self::new("step").field("name", name)
    }

    pub fn phase(name: &str) -> Self {
        Self::new("phase").field("name", name)
    }

    /// Render the marker as a single line without trailing newline
    pub fn render(&self) -> String {
        let mut line = format!("{MARKER_PREFIX} {}", self.kind);
        if let Some(label) = &self.label {
            line.push(' ');
            line.push_str(label);
        }
        for (key, value) in &self.fields {
            line.push(' ');
            line.push_str(key);
            line.push_str("=\"");
            line.push_str(&escape_value(value));
            line.push('"');
        }
        line
    }
}

/// Double embedded quotes and fold line breaks
pub fn escape_value(value: &str) -> String {
    value
        .replace('"', "\"\"")
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

struct Sinks {
    primary: Box<dyn Write + Send>,
    transcript: Option<File>,
}

/// Append-only writer of diagnostic markers
///
/// Cloning shares the underlying sinks.
#[derive(Clone)]
pub struct Emitter {
    sinks: Arc<Mutex<Sinks>>,
}

impl Emitter {
    /// Emitter writing to process stdout
    pub fn stdout() -> Self {
        Self::from_writer(Box::new(io::stdout()))
    }

    pub fn from_writer(primary: Box<dyn Write + Send>) -> Self {
        Self {
            sinks: Arc::new(Mutex::new(Sinks {
                primary,
                transcript: None,
            })),
        }
    }

    /// In-memory emitter for tests; returns the emitter and a handle to its output
    #[cfg(test)]
    pub fn buffered() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::from_writer(Box::new(buffer.clone())), buffer)
    }

    /// Duplicate every later marker into an append-mode transcript file
    ///
    /// Nothing is created on disk before this is called.
    pub fn attach_transcript(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| crate::error::fs::write_failed(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AlbtError::FileWriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.transcript = Some(file);
        }
        Ok(())
    }

    /// Write one marker as a whole line and flush
    pub fn emit(&self, marker: &Marker) {
        let mut line = marker.render();
        line.push('\n');

        let Ok(mut sinks) = self.sinks.lock() else {
            tracing::warn!("diagnostic sink poisoned, dropping marker");
            return;
        };
        if let Err(e) = sinks
            .primary
            .write_all(line.as_bytes())
            .and_then(|()| sinks.primary.flush())
        {
            tracing::warn!(error = %e, "failed to write diagnostic marker");
        }
        if let Some(transcript) = sinks.transcript.as_mut() {
            if let Err(e) = transcript.write_all(line.as_bytes()) {
                tracing::warn!(error = %e, "failed to write transcript");
            }
        }
    }
}

/// Shared in-memory sink used by tests to capture markers
#[cfg(test)]
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }

    pub fn markers(&self) -> Vec<ParsedMarker> {
        self.contents().lines().filter_map(parse_marker).collect()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut b) => {
                b.extend_from_slice(buf);
                Ok(buf.len())
            }
            Err(_) => Err(io::Error::other("buffer poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
