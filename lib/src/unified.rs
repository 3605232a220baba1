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

//! Unified text rendering of diffs and diff buckets, suitable for
//! terminal output with optional ANSI color.

use crossterm::style::Stylize as _;
use itertools::Itertools as _;

use crate::bucket::Bucket;
use crate::diff::Diff;
use crate::hunk::zip;
use crate::hunk::HunkHeader;

/// In multi-entry buckets, at most this many other entry names are listed.
const MAX_LISTED: usize = 10;

fn push_line(out: &mut String, text: String, colorize: bool, style: fn(String) -> String) {
    if colorize {
        out.push_str(&style(text));
    } else {
        out.push_str(&text);
    }
    out.push('\n');
}

fn red(text: String) -> String {
    text.red().to_string()
}

fn green(text: String) -> String {
    text.green().to_string()
}

fn cyan(text: String) -> String {
    text.cyan().to_string()
}

fn bold(text: String) -> String {
    text.bold().to_string()
}

/// Renders one diff in unified format: `-`/`+` prefixed change lines,
/// space-prefixed context, and long kept runs collapsed into
/// `@@ N common lines @@` markers, annotated with a hunk header where the
/// heuristic finds one.
pub fn render_unified(diff: &Diff, context: usize, colorize: bool) -> String {
    let mut out = String::with_capacity(256);
    let (mut xi, mut yi) = (0, 0);
    for (i, op) in diff.ops.iter().enumerate() {
        for line in &diff.left[xi..xi + op.del] {
            push_line(&mut out, format!("-{line}"), colorize, red);
        }
        xi += op.del;
        for line in &diff.right[yi..yi + op.add] {
            push_line(&mut out, format!("+{line}"), colorize, green);
        }
        yi += op.add;

        let leading = i == 0 && op.del == 0 && op.add == 0;
        let last = i == diff.ops.len() - 1;
        let (pre, zipped, post) = zip(op.keep, leading, last, context);
        for line in &diff.left[xi..xi + pre] {
            out.push(' ');
            out.push_str(line);
            out.push('\n');
        }
        if zipped > 0 {
            let mut picker = HunkHeader::default();
            for line in &diff.left[xi + pre..xi + pre + zipped] {
                picker.improve(line);
            }
            let header = picker.header(&diff.left[xi + pre + zipped..xi + op.keep]);
            let marker = format!("@@ {zipped} common lines @@{header}");
            push_line(&mut out, marker, colorize, cyan);
        }
        for line in &diff.left[xi + op.keep - post..xi + op.keep] {
            out.push(' ');
            out.push_str(line);
            out.push('\n');
        }
        xi += op.keep;
        yi += op.keep;
    }
    out
}

/// Renders a bucket list: each bucket's representative (first) entry in
/// full under a `=== {index}. {name} ({comment})` header, then the other
/// member names, truncated with a count past [`MAX_LISTED`].
pub fn render_unified_buckets(buckets: &[Bucket], context: usize, colorize: bool) -> String {
    let mut out = String::new();
    for (i, bucket) in buckets.iter().enumerate() {
        let Some(first) = bucket.entries.first() else {
            continue;
        };
        if i > 0 {
            out.push('\n');
        }
        let idx = i + 1;
        let header = format!("=== {idx}. {} ({})", first.name, first.comment);
        push_line(&mut out, header, colorize, bold);
        out.push_str(&render_unified(&first.diff, context, colorize));
        if bucket.entries.len() > 1 {
            let others = &bucket.entries[1..];
            let names = others
                .iter()
                .take(MAX_LISTED)
                .map(|entry| entry.name.as_str())
                .join(", ");
            let mut also = format!("=== {idx}. also: {names}");
            if others.len() > MAX_LISTED {
                also.push_str(&format!(" (+{} more)", others.len() - MAX_LISTED));
            }
            push_line(&mut out, also, colorize, bold);
        }
    }
    out
}
