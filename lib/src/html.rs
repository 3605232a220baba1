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

//! Self-contained HTML rendering of diff buckets: one collapsible
//! disclosure per bucket, a nested one per entry, and a two-column
//! side-by-side line table per diff.

use std::fmt::Write as _;

use itertools::Itertools as _;

use crate::bucket::Bucket;
use crate::diff::Diff;
use crate::hunk::zip;
use crate::hunk::HunkHeader;

const MIN_COLUMN_WIDTH: usize = 40;
const MAX_COLUMN_WIDTH: usize = 120;

/// Buckets with at least this many entries render only the first few
/// expanded.
const SUMMARIZE_THRESHOLD: usize = 10;
const EXPANDED_ENTRIES: usize = 3;

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders a whole bucket list as one self-contained HTML document with
/// inline styles. Column width follows the longest line over all entries,
/// between [`MIN_COLUMN_WIDTH`] and [`MAX_COLUMN_WIDTH`] characters.
pub fn render_html_buckets(buckets: &[Bucket], context: usize) -> String {
    let mut width = MIN_COLUMN_WIDTH;
    for bucket in buckets {
        for entry in &bucket.entries {
            for line in entry.diff.left.iter().chain(&entry.diff.right) {
                width = width.max(line.chars().count());
            }
        }
    }
    let width = width.min(MAX_COLUMN_WIDTH);

    let mut out = String::with_capacity(1 << 14);
    out.push_str(concat!(
        "<!doctype html>\n",
        "<html>\n<head>\n",
        "<meta charset=\"utf-8\">\n",
        "<title>fxdump diff</title>\n",
        "<style>\n",
        "body { font-family: monospace; }\n",
        "table { border-collapse: collapse; margin: 0.5em 0; }\n",
    ));
    let _ = writeln!(
        out,
        "td {{ width: {width}ch; vertical-align: top; white-space: pre-wrap; \
         overflow-wrap: anywhere; border: 1px solid #ccc; padding: 0 0.3ch; }}"
    );
    out.push_str(concat!(
        "td.del { background: #fdd; }\n",
        "td.add { background: #dfd; }\n",
        "td.zip { color: #777; text-align: center; }\n",
        "summary { cursor: pointer; }\n",
        "</style>\n</head>\n<body>\n",
    ));

    for (i, bucket) in buckets.iter().enumerate() {
        let Some(first) = bucket.entries.first() else {
            continue;
        };
        let idx = i + 1;
        let mut summary = format!(
            "{idx}. {} ({})",
            escape_html(&first.name),
            escape_html(&first.comment)
        );
        if bucket.entries.len() > 1 {
            let _ = write!(summary, " and {} more", bucket.entries.len() - 1);
        }
        let _ = writeln!(out, "<details open>\n<summary>{summary}</summary>");

        let expanded = if bucket.entries.len() >= SUMMARIZE_THRESHOLD {
            EXPANDED_ENTRIES
        } else {
            bucket.entries.len()
        };
        for entry in &bucket.entries[..expanded] {
            let _ = writeln!(
                out,
                "<details open>\n<summary>{} ({})</summary>",
                escape_html(&entry.name),
                escape_html(&entry.comment)
            );
            render_entry_table(&entry.diff, context, &mut out);
            out.push_str("</details>\n");
        }
        if bucket.entries.len() > expanded {
            let names = bucket.entries[expanded..]
                .iter()
                .map(|entry| escape_html(&entry.name))
                .join(", ");
            let _ = writeln!(out, "<p>also: {names}</p>");
        }
        out.push_str("</details>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

/// Emits one diff as a two-column table: deletions left, additions right,
/// paired row by row; kept lines span both cells and long kept runs
/// collapse into a full-width marker row.
fn render_entry_table(diff: &Diff, context: usize, out: &mut String) {
    out.push_str("<table>\n");
    let (mut xi, mut yi) = (0, 0);
    for (i, op) in diff.ops.iter().enumerate() {
        for k in 0..op.del.max(op.add) {
            out.push_str("<tr>");
            if k < op.del {
                let _ = write!(out, "<td class=\"del\">{}</td>", escape_html(&diff.left[xi + k]));
            } else {
                out.push_str("<td></td>");
            }
            if k < op.add {
                let _ = write!(out, "<td class=\"add\">{}</td>", escape_html(&diff.right[yi + k]));
            } else {
                out.push_str("<td></td>");
            }
            out.push_str("</tr>\n");
        }
        xi += op.del;
        yi += op.add;

        let leading = i == 0 && op.del == 0 && op.add == 0;
        let last = i == diff.ops.len() - 1;
        let (pre, zipped, post) = zip(op.keep, leading, last, context);
        for line in &diff.left[xi..xi + pre] {
            let cell = escape_html(line);
            let _ = writeln!(out, "<tr><td>{cell}</td><td>{cell}</td></tr>");
        }
        if zipped > 0 {
            let mut picker = HunkHeader::default();
            for line in &diff.left[xi + pre..xi + pre + zipped] {
                picker.improve(line);
            }
            let header = picker.header(&diff.left[xi + pre + zipped..xi + op.keep]);
            let _ = writeln!(
                out,
                "<tr><td class=\"zip\" colspan=\"2\">@@ {zipped} common lines @@{}</td></tr>",
                escape_html(&header)
            );
        }
        for line in &diff.left[xi + op.keep - post..xi + op.keep] {
            let cell = escape_html(line);
            let _ = writeln!(out, "<tr><td>{cell}</td><td>{cell}</td></tr>");
        }
        xi += op.keep;
        yi += op.keep;
    }
    out.push_str("</table>\n");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::bucket::assemble_buckets;
    use crate::bucket::Entry;
    use crate::diff::compute_diff;

    fn entry(name: &str, left: &str, right: &str) -> Entry {
        Entry {
            name: name.to_string(),
            comment: "changed".to_string(),
            diff: compute_diff(left, right, None),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_document_structure() {
        let buckets = assemble_buckets([entry("key1", "a\nb\n", "a\nc\n")]);
        let out = render_html_buckets(&buckets, 3);
        assert!(out.starts_with("<!doctype html>\n"));
        assert!(out.ends_with("</body>\n</html>\n"));
        assert!(out.contains("<summary>1. key1 (changed)</summary>"));
        assert!(out.contains("<td class=\"del\">b</td>"));
        assert!(out.contains("<td class=\"add\">c</td>"));
        // The kept "a" line spans both columns as paired cells.
        assert!(out.contains("<tr><td>a</td><td>a</td></tr>"));
    }

    #[test]
    fn test_content_is_escaped() {
        let buckets = assemble_buckets([entry("k", "<script>\n", "&amp;\n")]);
        let out = render_html_buckets(&buckets, 3);
        assert!(out.contains("&lt;script&gt;"));
        assert!(out.contains("&amp;amp;"));
        assert!(!out.contains("<script>"));
    }

    #[test]
    fn test_large_bucket_is_summarized() {
        let entries: Vec<Entry> =
            (0..12).map(|i| entry(&format!("k{i:02}"), "a\n", "b\n")).collect();
        let out = render_html_buckets(&assemble_buckets(entries), 3);
        assert_eq!(out.matches("<table>").count(), 3);
        assert!(out.contains("<summary>1. k00 (changed) and 11 more</summary>"));
        assert!(out.contains("<p>also: k03, k04"));
        assert!(out.contains("k11</p>"));
    }

    #[test]
    fn test_column_width_tracks_longest_line() {
        let narrow = assemble_buckets([entry("k", "a\n", "b\n")]);
        assert!(render_html_buckets(&narrow, 3).contains("td { width: 40ch;"));

        let wide_line = "w".repeat(80);
        let wide = assemble_buckets([entry("k", &format!("{wide_line}\na\n"), "b\n")]);
        assert!(render_html_buckets(&wide, 3).contains("td { width: 80ch;"));

        let huge_line = "w".repeat(500);
        let huge = assemble_buckets([entry("k", &format!("{huge_line}\na\n"), "b\n")]);
        assert!(render_html_buckets(&huge, 3).contains("td { width: 120ch;"));
    }

    #[test]
    fn test_collapse_marker_row() {
        let left: String = (0..20).map(|i| format!("line number {i}\n")).collect();
        let right = format!("{left}tail\n");
        let buckets = assemble_buckets([entry("k", &left, &right)]);
        let out = render_html_buckets(&buckets, 3);
        assert!(out.contains("colspan=\"2\">@@"), "{out}");
    }
}
