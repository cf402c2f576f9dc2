//! Pointer-style reference resolution with caching and cycle detection.
//!
//! A [`Resolver`] is created per parse and owns all of its state: the
//! loaded documents, the resolved-pointer cache and the in-flight set.
//! Nothing is shared between parses.
//!
//! Pointers are keyed by `<document path>#<fragment>` so that the same
//! local fragment in two different documents never collides.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::document::{self, DocumentFormat, FileReader};
use crate::error::{ResolutionError, ResolutionErrorKind};

/// Key of the object handed back in place of a circular target.
pub const CIRCULAR_MARKER: &str = "x-apir-circular";

/// Outcome of resolving one pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// The target value, or a circular placeholder.
    pub value: Value,
    /// True when the pointer was already being resolved further up the stack.
    pub is_circular: bool,
    /// Document the value lives in; nested relative references resolve against it.
    pub document: PathBuf,
}

/// Where a pointer leads: a document and a fragment within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerTarget {
    /// Normalized path of the target document.
    pub document: PathBuf,
    /// Fragment, without the leading `#`.
    pub fragment: String,
}

impl PointerTarget {
    /// Cache key: `<document>#<fragment>`.
    pub fn key(&self) -> String {
        format!("{}#{}", self.document.display(), self.fragment)
    }
}

/// Resolves `$ref` pointers against a root document and any external
/// documents it references.
#[derive(Debug)]
pub struct Resolver<'r> {
    reader: &'r dyn FileReader,
    root: PathBuf,
    documents: HashMap<PathBuf, Value>,
    cache: HashMap<String, Value>,
    in_flight: HashSet<String>,
}

impl<'r> Resolver<'r> {
    /// Create a resolver for the already-loaded `root` document found at `root_path`.
    pub fn new(reader: &'r dyn FileReader, root_path: &Path, root: Value) -> Self {
        let root_path = document::normalize_path(root_path);
        let mut documents = HashMap::new();
        documents.insert(root_path.clone(), root);
        Self {
            reader,
            root: root_path,
            documents,
            cache: HashMap::new(),
            in_flight: HashSet::new(),
        }
    }

    /// Path of the root document.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Number of documents loaded so far, root included.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Split `pointer` into its target document and fragment, relative to `base`.
    pub fn target(&self, pointer: &str, base: &Path) -> PointerTarget {
        let (file, fragment) = pointer.split_once('#').unwrap_or((pointer, ""));
        let document = if file.is_empty() {
            document::normalize_path(base)
        } else {
            document::resolve_relative(base, file)
        };
        PointerTarget {
            document,
            fragment: fragment.to_string(),
        }
    }

    /// Whether the target identified by `key` is being resolved or converted right now.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    /// Mark `key` in flight. Returns false if it already was.
    pub fn enter(&mut self, key: &str) -> bool {
        self.in_flight.insert(key.to_string())
    }

    /// Clear the in-flight mark on `key`.
    pub fn leave(&mut self, key: &str) {
        self.in_flight.remove(key);
    }

    /// Resolve `pointer`, written in document `base`.
    ///
    /// Reference chains are followed through to a non-reference value. A
    /// pointer that is already in flight yields a placeholder with
    /// `is_circular = true` rather than recursing.
    pub fn resolve(&mut self, pointer: &str, base: &Path) -> Result<Resolved, ResolutionError> {
        let target = self.target(pointer, base);
        let key = target.key();

        if let Some(value) = self.cache.get(&key) {
            trace!(pointer, "Reference cache hit.");
            return Ok(Resolved {
                value: value.clone(),
                is_circular: false,
                document: target.document,
            });
        }

        if self.in_flight.contains(&key) {
            debug!(pointer, document = %base.display(), "Circular reference, issuing placeholder.");
            return Ok(Resolved {
                value: json!({ CIRCULAR_MARKER: pointer }),
                is_circular: true,
                document: target.document,
            });
        }

        self.in_flight.insert(key.clone());
        let result = self.walk(pointer, &target, base);
        self.in_flight.remove(&key);
        let resolved = result?;

        if !resolved.is_circular {
            self.cache.insert(key, resolved.value.clone());
        }
        trace!(pointer, circular = resolved.is_circular, "Reference resolved.");
        Ok(resolved)
    }

    /// Resolve `value` if it is a `$ref` object, otherwise pass it through.
    pub fn resolve_if_ref(&mut self, value: &Value, base: &Path) -> Result<Resolved, ResolutionError> {
        match ref_pointer(value) {
            Some(pointer) => self.resolve(pointer, base),
            None => Ok(Resolved {
                value: value.clone(),
                is_circular: false,
                document: base.to_path_buf(),
            }),
        }
    }

    fn walk(
        &mut self,
        pointer: &str,
        target: &PointerTarget,
        referrer: &Path,
    ) -> Result<Resolved, ResolutionError> {
        let fail = |kind| ResolutionError {
            pointer: pointer.to_string(),
            document: referrer.to_path_buf(),
            kind,
        };

        self.load_document(&target.document).map_err(fail)?;

        let mut rest = split_fragment(&target.fragment);
        let mut document = target.document.clone();
        let mut start: Option<Value> = None;

        loop {
            let step = match &start {
                Some(value) => descend(value, &rest),
                None => {
                    let Some(root) = self.documents.get(&document) else {
                        return Err(fail(ResolutionErrorKind::UnreadableDocument(format!(
                            "{} is not loaded",
                            document.display()
                        ))));
                    };
                    descend(root, &rest)
                }
            };

            match step {
                Step::Done(value) => {
                    return Ok(Resolved {
                        value,
                        is_circular: false,
                        document,
                    });
                }
                Step::Ref { pointer: next, consumed } => {
                    let next = self.resolve(&next, &document)?;
                    if next.is_circular {
                        return Ok(next);
                    }
                    rest.drain(..consumed);
                    document = next.document;
                    start = Some(next.value);
                }
                Step::Missing(segment) => {
                    return Err(fail(ResolutionErrorKind::MissingSegment(segment)));
                }
                Step::NotTraversable(segment) => {
                    return Err(fail(ResolutionErrorKind::NotTraversable(segment)));
                }
            }
        }
    }

    fn load_document(&mut self, path: &Path) -> Result<(), ResolutionErrorKind> {
        if self.documents.contains_key(path) {
            return Ok(());
        }
        if !DocumentFormat::from_path(path).is_some_and(DocumentFormat::is_structured) {
            return Err(ResolutionErrorKind::UnsupportedExtension);
        }
        let value = document::load_structured(self.reader, path)
            .map_err(|err| ResolutionErrorKind::UnreadableDocument(err.to_string()))?;
        debug!(path = %path.display(), "Fetched external document.");
        self.documents.insert(path.to_path_buf(), value);
        Ok(())
    }
}

/// The pointer of a `$ref` object, if `value` is one.
pub fn ref_pointer(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

enum Step {
    Done(Value),
    Ref { pointer: String, consumed: usize },
    Missing(String),
    NotTraversable(String),
}

/// Walk `segments` from `node`, stopping early at any `$ref` object.
fn descend(node: &Value, segments: &[String]) -> Step {
    let mut node = node;
    for (consumed, segment) in segments.iter().enumerate() {
        if let Some(pointer) = ref_pointer(node) {
            return Step::Ref {
                pointer: pointer.to_string(),
                consumed,
            };
        }
        node = match node {
            Value::Object(map) => match map.get(segment) {
                Some(child) => child,
                None => return Step::Missing(segment.clone()),
            },
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(child) => child,
                None => return Step::Missing(segment.clone()),
            },
            _ => return Step::NotTraversable(segment.clone()),
        };
    }
    if let Some(pointer) = ref_pointer(node) {
        return Step::Ref {
            pointer: pointer.to_string(),
            consumed: segments.len(),
        };
    }
    Step::Done(node.clone())
}

/// Split a fragment into unescaped segments.
fn split_fragment(fragment: &str) -> Vec<String> {
    if fragment.is_empty() || fragment == "/" {
        return Vec::new();
    }
    let path = fragment.strip_prefix('/').unwrap_or(fragment);
    path.split('/').map(unescape_segment).collect()
}

/// Undo percent-encoding, then pointer escaping (`~1` → `/`, `~0` → `~`).
fn unescape_segment(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8_lossy()
        .replace("~1", "/")
        .replace("~0", "~")
}
