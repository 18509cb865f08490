//! Block extraction from free-form text.
//!
//! The scan knows nothing about the diagram language. A block is the text
//! between the first start marker and the first end marker of the remaining
//! input, end marker included. Each round consumes input up to and including
//! that end marker, so blocks never overlap and an end marker that appears
//! before any start marker is skipped rather than ending the scan.

use crate::consts::{END_MARKER, MIN_BLOCK_LENGTH, START_MARKER};

/// A block found in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramBlock<'a> {
    /// Block text, from the start marker through the end marker.
    pub text: &'a str,
    /// Byte offset of the start marker in the document.
    pub start: usize,
    /// Byte offset just past the end marker.
    pub end: usize,
}

/// Marker-based block extractor.
#[derive(Debug, Clone)]
pub struct Extractor {
    start_marker: String,
    end_marker: String,
    min_length: usize,
}

impl Extractor {
    /// Create an extractor for custom markers.
    pub fn new(start_marker: impl Into<String>, end_marker: impl Into<String>) -> Self {
        Self {
            start_marker: start_marker.into(),
            end_marker: end_marker.into(),
            min_length: MIN_BLOCK_LENGTH,
        }
    }

    /// Set the minimum block length in characters.
    #[must_use]
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Lazily iterate over the blocks of `text` in document order.
    ///
    /// The iterator is `Clone`; a clone restarts from the clone point, and
    /// calling `extract` again restarts from the beginning.
    pub fn extract<'a>(&'a self, text: &'a str) -> Blocks<'a> {
        Blocks {
            extractor: self,
            text,
            offset: 0,
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(START_MARKER, END_MARKER)
    }
}

/// Iterator over the blocks of one document.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    extractor: &'a Extractor,
    text: &'a str,
    offset: usize,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = DiagramBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start_marker = self.extractor.start_marker.as_str();
        let end_marker = self.extractor.end_marker.as_str();
        if start_marker.is_empty() || end_marker.is_empty() {
            return None;
        }

        loop {
            let rest = self.text.get(self.offset..)?;
            let start = rest.find(start_marker)?;
            let end = rest.find(end_marker)?;

            let block_start = self.offset + start;
            let block_end = self.offset + end + end_marker.len();
            self.offset = block_end;

            if start >= end {
                continue;
            }

            let text = &self.text[block_start..block_end];
            if text.chars().count() < self.extractor.min_length {
                continue;
            }

            return Some(DiagramBlock {
                text,
                start: block_start,
                end: block_end,
            });
        }
    }
}
