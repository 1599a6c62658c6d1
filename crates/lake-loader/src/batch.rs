// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line buffering between input and the lake.
//!
//! A [`Batch`] keeps lines in arrival order until it is taken as a single
//! newline-joined payload. It never holds more than `max_lines` lines; the
//! caller is expected to [`Batch::take`] it as soon as [`Batch::push`] reports
//! that it is full.

use crate::constants;

#[derive(Debug, Clone)]
pub struct Batch {
    lines: Vec<String>,
    max_lines: usize,
    size_bytes: usize,
}

impl Default for Batch {
    fn default() -> Self {
        Batch::new(constants::MAX_BATCH_LINES)
    }
}

impl Batch {
    /// Creates an empty batch. A `max_lines` of zero is treated as one.
    #[must_use]
    pub fn new(max_lines: usize) -> Self {
        let max_lines = max_lines.max(1);
        Batch {
            lines: Vec::with_capacity(max_lines),
            max_lines,
            size_bytes: 0,
        }
    }

    /// Appends a line and returns `true` once the batch is full.
    pub fn push(&mut self, line: String) -> bool {
        self.size_bytes += line.len();
        self.lines.push(line);
        self.is_full()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.lines.len() >= self.max_lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total bytes of the buffered lines, separators excluded.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    #[must_use]
    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Joins the buffered lines with `\n` and empties the batch.
    ///
    /// Returns `None` when there is nothing to flush.
    pub fn take(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        let payload = self.lines.join("\n");
        self.lines.clear();
        self.size_bytes = 0;
        Some(payload)
    }
}
