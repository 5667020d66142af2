//! Line map: an ordered, gap-free partition of the concatenated buffer into
//! per-fragment ranges.

use ripple_core::{RippleError, RippleResult};

/// One contiguous run of buffer lines contributed by a single fragment.
#[derive(Debug, Clone)]
pub struct LineMapEntry {
    /// First buffer line covered by this entry (inclusive).
    pub start_buffer_line: u32,
    /// First buffer line *not* covered by this entry.
    pub end_buffer_line_exclusive: u32,
    /// Origin file this entry's lines came from.
    pub path: String,
    /// Line number within `path` that `start_buffer_line` corresponds to.
    pub first_line_in_file: u32,
}

/// An ordered sequence of [`LineMapEntry`] covering the whole buffer with no
/// gaps or overlaps. Entries are appended in buffer order, so lookups can
/// binary search on `start_buffer_line`.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    entries: Vec<LineMapEntry>,
}

impl LineMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LineMapEntry) {
        self.entries.push(entry);
    }

    /// Find the unique entry containing `buffer_line` and translate it back
    /// to `(path, original_line)`.
    pub fn locate(&self, buffer_line: u32) -> RippleResult<(String, u32)> {
        let idx = self
            .entries
            .partition_point(|e| e.end_buffer_line_exclusive <= buffer_line);

        match self.entries.get(idx) {
            Some(entry) if entry.start_buffer_line <= buffer_line => {
                let delta = buffer_line - entry.start_buffer_line;
                Ok((entry.path.clone(), entry.first_line_in_file + delta))
            }
            _ => Err(RippleError::NotFound(format!(
                "no source fragment covers buffer line {buffer_line}"
            ))),
        }
    }

    pub fn entries(&self) -> &[LineMapEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_across_multiple_entries() {
        let mut map = LineMap::new();
        map.push(LineMapEntry {
            start_buffer_line: 0,
            end_buffer_line_exclusive: 3,
            path: "a.js".into(),
            first_line_in_file: 1,
        });
        map.push(LineMapEntry {
            start_buffer_line: 3,
            end_buffer_line_exclusive: 5,
            path: "b.js".into(),
            first_line_in_file: 100,
        });

        assert_eq!(map.locate(0).unwrap(), ("a.js".into(), 1));
        assert_eq!(map.locate(2).unwrap(), ("a.js".into(), 3));
        assert_eq!(map.locate(3).unwrap(), ("b.js".into(), 100));
        assert_eq!(map.locate(4).unwrap(), ("b.js".into(), 101));
        assert!(map.locate(5).is_err());
    }
}
