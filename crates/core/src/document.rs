//! Source documents: format detection, file access and raw loading.
//!
//! Structured documents (JSON/YAML) are loaded into a [`serde_json::Value`]
//! tree so the resolver can walk pointers through them regardless of the
//! on-disk syntax.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::FormatError;

/// Reads text by path.
///
/// Implementations must report a missing file as [`io::ErrorKind::NotFound`].
pub trait FileReader: fmt::Debug {
    /// Read the whole file at `path` as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// [`FileReader`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// [`FileReader`] serving documents from memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `contents` under `path` (lexically normalized).
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.files
            .insert(normalize_path(path.as_ref()), contents.into());
        self
    }
}

impl FileReader for MemoryReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} is not registered", path.display()),
                )
            })
    }
}

/// Input syntax, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.graphql` / `.graphqls` / `.gql`
    GraphQl,
}

impl DocumentFormat {
    /// Detect the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "graphql" | "graphqls" | "gql" => Some(Self::GraphQl),
            _ => None,
        }
    }

    /// Whether this is a JSON/YAML tree format.
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Json | Self::Yaml)
    }

    /// Short name used in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::GraphQl => "graphql",
        }
    }
}

/// Read the file at `path` with `reader`, mapping failures to [`FormatError::Read`].
pub fn read_text(reader: &dyn FileReader, path: &Path) -> Result<String, FormatError> {
    reader
        .read_to_string(path)
        .map_err(|source| FormatError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Parse structured text (JSON or YAML, chosen by the extension of `path`).
pub fn parse_structured(text: &str, path: &Path) -> Result<Value, FormatError> {
    match DocumentFormat::from_path(path) {
        Some(DocumentFormat::Json) => {
            serde_json::from_str(text).map_err(|source| FormatError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
        Some(DocumentFormat::Yaml) => {
            serde_yaml::from_str(text).map_err(|source| FormatError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        Some(DocumentFormat::GraphQl) | None => Err(FormatError::UnsupportedExtension {
            path: path.to_path_buf(),
        }),
    }
}

/// Read and parse a structured document.
pub fn load_structured(reader: &dyn FileReader, path: &Path) -> Result<Value, FormatError> {
    // Reject unknown extensions before touching the file.
    if !DocumentFormat::from_path(path).is_some_and(DocumentFormat::is_structured) {
        return Err(FormatError::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }
    let text = read_text(reader, path)?;
    let value = parse_structured(&text, path)?;
    debug!(path = %path.display(), bytes = text.len(), "Loaded structured document.");
    Ok(value)
}

/// File name without extension, used as a fallback title.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("api")
        .to_string()
}

/// Resolve `target` relative to the directory containing `from_document`.
pub fn resolve_relative(from_document: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return normalize_path(target);
    }
    let base = from_document.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&base.join(target))
}

/// Lexically normalize a path: drop `.` components and fold `..`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/api.JSON")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("api.yml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("schema.graphql")),
            Some(DocumentFormat::GraphQl)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("api.txt")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = parse_structured("a: 1\nb: [x, y]\n", Path::new("doc.yaml")).unwrap();
        assert_eq!(yaml["a"], 1);
        assert_eq!(yaml["b"][1], "y");

        let json = parse_structured(r#"{"a": true}"#, Path::new("doc.json")).unwrap();
        assert_eq!(json["a"], true);
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        let err = parse_structured("{ invalid", Path::new("doc.json")).unwrap_err();
        assert!(matches!(err, FormatError::Json { .. }));
    }

    #[test]
    fn test_unsupported_extension_fails_before_reading() {
        let reader = MemoryReader::new();
        let err = load_structured(&reader, Path::new("doc.txt")).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedExtension { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let reader = MemoryReader::new();
        let err = load_structured(&reader, Path::new("missing.yaml")).unwrap_err();
        match err {
            FormatError::Read { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative(Path::new("specs/api.yaml"), "models/pet.yaml"),
            PathBuf::from("specs/models/pet.yaml")
        );
        assert_eq!(
            resolve_relative(Path::new("specs/v1/api.yaml"), "../shared.json"),
            PathBuf::from("specs/shared.json")
        );
        assert_eq!(
            resolve_relative(Path::new("api.yaml"), "./pet.yaml"),
            PathBuf::from("pet.yaml")
        );
    }

    #[test]
    fn test_memory_reader_normalizes_keys() {
        let reader = MemoryReader::new().with_file("specs/./pet.yaml", "x: 1");
        assert_eq!(
            reader
                .read_to_string(Path::new("specs/v1/../pet.yaml"))
                .unwrap(),
            "x: 1"
        );
    }
}
