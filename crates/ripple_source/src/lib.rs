//! Source buffer and line map.
//!
//! [`SourceBuffer`] concatenates one or more named source fragments (whole
//! files, or in-memory strings handed in by a collaborator such as an HTML
//! script extractor) into a single buffer the parser treats as one parse
//! unit. The [`LineMap`] it builds alongside the buffer lets every AST node
//! report the file and line it actually came from, even though the parser
//! itself only ever sees one flat string.

mod line_map;

pub use line_map::{LineMap, LineMapEntry};

use ripple_core::{RippleError, RippleResult};
use std::path::{Component, Path, PathBuf};

/// One appended piece of source text.
#[derive(Debug, Clone)]
pub struct SourceFragment {
    pub path: String,
    pub first_line: u32,
    pub text: String,
}

/// A multi-file source buffer with a reproducible line map.
///
/// Fragments are append-only: once added, a fragment's buffer lines never
/// move, so [`AstNode`](ripple_trace) locations computed during parsing stay
/// valid for the lifetime of the buffer.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    root: PathBuf,
    fragments: Vec<SourceFragment>,
    line_map: LineMap,
    buffer: String,
    buffer_lines: u32,
    appended_files: ripple_core::FxHashSet<String>,
}

impl SourceBuffer {
    /// Create an empty buffer rooted at `root`. `appendFile` resolves
    /// relative paths against this root and rejects anything that would
    /// escape it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fragments: Vec::new(),
            line_map: LineMap::new(),
            buffer: String::new(),
            buffer_lines: 0,
            appended_files: ripple_core::FxHashSet::default(),
        }
    }

    /// Root directory `appendFile` resolves relative paths against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append in-memory source text under a logical `path`, starting at
    /// `first_line` within that file. Two fragments may share a `path` (the
    /// same logical file contributed to the buffer in parts, e.g. two
    /// `<script>` blocks extracted from one HTML document).
    pub fn append_source(
        &mut self,
        path: impl Into<String>,
        first_line: u32,
        text: impl Into<String>,
    ) -> RippleResult<()> {
        let path = path.into();
        let text = text.into();

        if first_line < 1 {
            return Err(RippleError::InvalidInput(format!(
                "firstLine must be >= 1, got {first_line}"
            )));
        }
        if text.is_empty() {
            return Err(RippleError::InvalidInput(
                "appendSource received empty text".to_string(),
            ));
        }

        let line_count = text.split('\n').count() as u32;
        let start_buffer_line = self.buffer_lines;

        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(&text);

        self.line_map.push(LineMapEntry {
            start_buffer_line,
            end_buffer_line_exclusive: start_buffer_line + line_count,
            path: path.clone(),
            first_line_in_file: first_line,
        });
        self.buffer_lines += line_count;

        self.fragments.push(SourceFragment {
            path,
            first_line,
            text,
        });

        Ok(())
    }

    /// Append a whole file under the configured root. A second call for the
    /// same `relative_path` is a no-op (idempotent per path).
    pub fn append_file(&mut self, relative_path: impl AsRef<str>) -> RippleResult<()> {
        let relative_path = relative_path.as_ref();
        if self.appended_files.contains(relative_path) {
            return Ok(());
        }

        let resolved = resolve_within_root(&self.root, relative_path)?;
        let text = std::fs::read_to_string(&resolved).map_err(|source| RippleError::Io {
            path: resolved.clone(),
            source,
        })?;

        self.append_source(relative_path.to_string(), 1, text)?;
        self.appended_files.insert(relative_path.to_string());
        Ok(())
    }

    /// The concatenated buffer, as the parser will see it.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Total number of lines currently in the buffer.
    pub fn line_count(&self) -> u32 {
        self.buffer_lines
    }

    /// Map a 0-based buffer line back to its origin `(path, line)`.
    pub fn locate_origin(&self, buffer_line: u32) -> RippleResult<(String, u32)> {
        self.line_map.locate(buffer_line)
    }

    /// The underlying line map, handed to the parser stage so it can
    /// resolve byte offsets back to `(path, line)` during materialization.
    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// Human-readable dump of every buffer line annotated with its origin
    /// `path:originalLine`, used by tests and debugging.
    pub fn serialize_mapping(&self) -> String {
        let mut out = String::new();
        for line in 0..self.buffer_lines {
            let (path, original_line) = self
                .line_map
                .locate(line)
                .expect("line map has no gaps over 0..buffer_lines");
            out.push_str(&format!("{line}: {path}:{original_line}\n"));
        }
        out
    }

    /// All fragments appended so far, in append order.
    pub fn fragments(&self) -> &[SourceFragment] {
        &self.fragments
    }
}

/// Resolve `relative` against `root`, rejecting any path that would escape
/// it via `..` components. Unlike `fs::canonicalize`, this works even when
/// the file does not exist yet (so the `PathEscape` check does not depend
/// on filesystem state).
fn resolve_within_root(root: &Path, relative: &str) -> RippleResult<PathBuf> {
    let joined = root.join(relative);

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(RippleError::PathEscape { path: joined });
                }
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }

    let mut normalized_root = PathBuf::new();
    for component in root.components() {
        match component {
            Component::ParentDir => {
                normalized_root.pop();
            }
            Component::CurDir => {}
            other => normalized_root.push(other.as_os_str()),
        }
    }

    if !normalized.starts_with(&normalized_root) {
        return Err(RippleError::PathEscape { path: joined });
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_reproduces_buffer() {
        let mut buf = SourceBuffer::new("/project");
        buf.append_source("a.js", 1, "one\ntwo").unwrap();
        buf.append_source("b.js", 10, "three").unwrap();

        assert_eq!(buf.text(), "one\ntwo\nthree");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.locate_origin(0).unwrap(), ("a.js".to_string(), 1));
        assert_eq!(buf.locate_origin(1).unwrap(), ("a.js".to_string(), 2));
        assert_eq!(buf.locate_origin(2).unwrap(), ("b.js".to_string(), 10));
    }

    #[test]
    fn rejects_empty_text_and_bad_first_line() {
        let mut buf = SourceBuffer::new("/project");
        assert!(matches!(
            buf.append_source("a.js", 0, "x"),
            Err(RippleError::InvalidInput(_))
        ));
        assert!(matches!(
            buf.append_source("a.js", 1, ""),
            Err(RippleError::InvalidInput(_))
        ));
    }

    #[test]
    fn append_file_is_idempotent_per_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "let x = 1;").unwrap();

        let mut buf = SourceBuffer::new(dir.path());
        buf.append_file("a.js").unwrap();
        buf.append_file("a.js").unwrap();

        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.fragments().len(), 1);
    }

    #[test]
    fn append_file_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = SourceBuffer::new(dir.path());
        let err = buf.append_file("../../etc/passwd").unwrap_err();
        assert!(matches!(err, RippleError::PathEscape { .. }));
    }

    // Scenario G (spec §8): `appendFile` on a path that resolves within
    // the root but does not exist on disk surfaces as `Io`, not `PathEscape`.
    #[test]
    fn append_file_missing_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = SourceBuffer::new(dir.path());
        let err = buf.append_file("does-not-exist.js").unwrap_err();
        assert!(matches!(err, RippleError::Io { .. }));
    }

    // Invariant 1 (spec §8): `locateOrigin` agrees with the append order
    // used to build the buffer, for every line.
    #[test]
    fn serialize_mapping_matches_append_order() {
        let mut buf = SourceBuffer::new("/project");
        buf.append_source("a.js", 1, "one\ntwo").unwrap();
        buf.append_source("b.js", 10, "three").unwrap();

        assert_eq!(buf.serialize_mapping(), "0: a.js:1\n1: a.js:2\n2: b.js:10\n");
    }

    #[test]
    fn two_fragments_may_share_a_path() {
        let mut buf = SourceBuffer::new("/project");
        buf.append_source("inline.html", 1, "a").unwrap();
        buf.append_source("inline.html", 5, "b").unwrap();
        assert_eq!(buf.fragments().len(), 2);
        assert_eq!(buf.locate_origin(1).unwrap(), ("inline.html".to_string(), 5));
    }
}
