// Copyright 2025 The Fxdump Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Context compression for kept-line runs and the hunk header heuristic
//! that labels collapsed runs.

use crate::diff::indent_width;

/// Context lines shown around changes when the caller does not configure
/// a count.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Collapsing fewer than this many extra lines is not worth a marker.
const ZIP_SLACK: usize = 3;

/// Partitions a kept run of `keep` lines into `(pre, zipped, post)`:
/// leading context, a collapsible middle, and trailing context.
/// `pre + zipped + post == keep` always. A run at the very start of the
/// diff gets no leading context (nothing to anchor to) and the final run
/// gets no trailing context; a run that saves at most [`ZIP_SLACK`] lines
/// is not collapsed at all.
pub fn zip(keep: usize, leading: bool, last: bool, context: usize) -> (usize, usize, usize) {
    let pre = if leading { 0 } else { context };
    let post = if last { 0 } else { context };
    if keep > pre + post + ZIP_SLACK {
        (pre, keep - pre - post, post)
    } else {
        (keep, 0, 0)
    }
}

/// Picks a representative line for a collapsed run: the non-blank line
/// with the lowest indentation that starts with a letter, preferring the
/// first line of a tied-indentation contiguous block. A simple placeholder
/// heuristic, not a semantic guarantee.
#[derive(Default)]
pub struct HunkHeader {
    indent: usize,
    line: String,
    in_run: bool,
}

impl HunkHeader {
    /// Offers one line of the collapsed run as a header candidate, in
    /// order.
    pub fn improve(&mut self, line: &str) {
        let trimmed = line.trim();
        let mut chars = trimmed.chars();
        let (c0, c1) = (chars.next(), chars.next());
        if trimmed.chars().count() <= 2
            || !(c0.is_some_and(char::is_alphabetic) || c1.is_some_and(char::is_alphabetic))
        {
            self.in_run = false;
            return;
        }
        let indent = indent_width(line);
        if !self.line.is_empty() && indent > self.indent {
            self.in_run = false;
            return;
        }
        if indent == self.indent && self.in_run {
            return;
        }
        self.indent = indent;
        self.line = line.to_string();
        self.in_run = true;
    }

    /// Returns the chosen header (with a leading space, ready to append to
    /// a collapse marker), but only when the first non-blank line after the
    /// collapsed run is indented deeper than the candidate, i.e. the
    /// candidate plausibly introduces the following block. Empty otherwise.
    pub fn header(&self, following: &[String]) -> String {
        if self.line.is_empty() {
            return String::new();
        }
        for line in following {
            if line.trim().is_empty() {
                continue;
            }
            let indent = indent_width(line);
            if indent > self.indent || (indent == self.indent && self.in_run) {
                return format!(" {}", self.line.trim());
            }
            return String::new();
        }
        String::new()
    }
}
