//! Export of the rendered document as a downloadable file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::error::ExportError;

pub const HTML_MIME: &str = "text/html";

/// A snapshot of the rendered text, ready to be handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

impl ExportArtifact {
    /// Package `text` as an HTML file named after `at`.
    pub fn html(text: &str, at: DateTime<Local>) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
            mime: HTML_MIME,
            filename: format!("htmlpen-{}.html", at.format("%Y%m%d-%H%M%S")),
        }
    }
}

/// Somewhere an export artifact can be delivered to.
pub trait ExportSink {
    /// Deliver the artifact and return where it ended up.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if the artifact could not be written.
    fn deliver(&mut self, artifact: &ExportArtifact) -> Result<PathBuf, ExportError>;
}

/// Writes artifacts into a directory without ever overwriting an existing
/// file: collisions get a `-1`, `-2`, ... suffix.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, artifact: &ExportArtifact) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let (stem, ext) = split_filename(&artifact.filename);
        for attempt in 0u32.. {
            let name = if attempt == 0 {
                artifact.filename.clone()
            } else {
                format!("{stem}-{attempt}{ext}")
            };
            let path = self.dir.join(name);
            // create_new makes the existence check and the create one step.
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&artifact.bytes)
                        .and_then(|()| file.flush())
                        .map_err(|source| ExportError::Io {
                            path: path.clone(),
                            source,
                        })?;
                    info!(path = %path.display(), bytes = artifact.bytes.len(), "exported document");
                    return Ok(path);
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(source) => return Err(ExportError::Io { path, source }),
            }
        }
        Err(ExportError::Io {
            path: self.dir.clone(),
            source: io::Error::other("no free export filename"),
        })
    }
}

fn split_filename(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => filename.split_at(dot),
        _ => (filename, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_artifact_carries_text_and_mime() {
        let artifact = ExportArtifact::html("<p>x</p>\n", fixed_time());
        assert_eq!(artifact.bytes, b"<p>x</p>\n");
        assert_eq!(artifact.mime, "text/html");
        assert_eq!(artifact.filename, "htmlpen-20240309-140507.html");
    }

    #[test]
    fn test_directory_sink_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        let first = ExportArtifact::html("one", fixed_time());
        let second = ExportArtifact::html("two", fixed_time());

        let a = sink.deliver(&first).unwrap();
        let b = sink.deliver(&second).unwrap();
        let c = sink.deliver(&second).unwrap();

        assert_eq!(a.file_name().unwrap(), "htmlpen-20240309-140507.html");
        assert_eq!(b.file_name().unwrap(), "htmlpen-20240309-140507-1.html");
        assert_eq!(c.file_name().unwrap(), "htmlpen-20240309-140507-2.html");
        assert_eq!(fs::read_to_string(a).unwrap(), "one");
        assert_eq!(fs::read_to_string(b).unwrap(), "two");
    }

    #[test]
    fn test_directory_sink_creates_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("exports");
        let mut sink = DirectorySink::new(&target);
        let path = sink
            .deliver(&ExportArtifact::html("x", fixed_time()))
            .unwrap();
        assert!(path.starts_with(&target));
    }

    #[test]
    fn test_split_filename() {
        assert_eq!(split_filename("a.html"), ("a", ".html"));
        assert_eq!(split_filename("noext"), ("noext", ""));
        assert_eq!(split_filename(".hidden"), (".hidden", ""));
    }
}
