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

//! Anchored line diff. Aligns two texts on lines that occur exactly once on
//! both sides, then builds a minimal edit script between those anchors.

use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt::Arguments;
use std::hash::Hasher;

use regex::Regex;

/// Sink for internal trace output from the diff computation. Defaults to a
/// no-op; tests can capture alignment decisions through it.
pub type TraceSink<'a> = &'a mut dyn FnMut(Arguments<'_>);

/// A single edit operation: delete the next `del` lines from the left side,
/// add the next `add` lines from the right side, then keep the next `keep`
/// lines which are present identically on both sides.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Op {
    /// Lines consumed from the left side only.
    pub del: usize,
    /// Lines consumed from the right side only.
    pub add: usize,
    /// Lines consumed from both sides in lockstep.
    pub keep: usize,
}

/// A computed diff: both original line sequences, the edit script, and a
/// content hash over the changed lines only. Immutable once computed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diff {
    /// The left input split into lines.
    pub left: Vec<String>,
    /// The right input split into lines.
    pub right: Vec<String>,
    /// The edit script. `del + keep` over all ops sums to `left.len()`,
    /// `add + keep` sums to `right.len()`.
    pub ops: Vec<Op>,
    /// 64-bit hash of the deleted and added line contents in emission order.
    /// Zero for identical inputs. Diffs with byte-identical changes hash
    /// identically regardless of surrounding context.
    pub hash: u64,
}

/// Splits a text blob into lines. The trailing empty element produced by a
/// final newline is dropped, but only when there are at least two lines, so
/// the result is never empty: a single-line or empty blob yields one element.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() >= 2 && lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Computes the diff between two strings. If `strip` is given, its matches
/// are removed from each line before comparison; the returned [`Diff`] still
/// carries the original line text. Total over all inputs.
pub fn compute_diff(left: &str, right: &str, strip: Option<&Regex>) -> Diff {
    compute_diff_traced(left, right, strip, &mut |_| {})
}

/// Like [`compute_diff`], with a trace sink for alignment internals.
pub fn compute_diff_traced(
    left: &str,
    right: &str,
    strip: Option<&Regex>,
    trace: TraceSink,
) -> Diff {
    let orig_x = split_lines(left);
    let orig_y = split_lines(right);
    let x: Vec<Cow<str>> = match strip {
        Some(re) => orig_x.iter().map(|s| re.replace_all(s, "")).collect(),
        None => orig_x.iter().map(|s| Cow::Borrowed(*s)).collect(),
    };
    let y: Vec<Cow<str>> = match strip {
        Some(re) => orig_y.iter().map(|s| re.replace_all(s, "")).collect(),
        None => orig_y.iter().map(|s| Cow::Borrowed(*s)).collect(),
    };

    if x == y {
        let keep = x.len();
        return Diff {
            left: owned(&orig_x),
            right: owned(&orig_y),
            ops: vec![Op { del: 0, add: 0, keep }],
            hash: 0,
        };
    }

    let ops = build_ops(&x, &y, trace);
    let hash = hash_changes(&x, &y, &ops);
    Diff {
        left: owned(&orig_x),
        right: owned(&orig_y),
        ops,
        hash,
    }
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| (*line).to_string()).collect()
}

/// One aligned position per side. The final anchor is a sentinel at
/// `(x.len(), y.len())`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Anchor {
    x: usize,
    y: usize,
}

#[derive(Clone, Copy, Default)]
struct Occurrences {
    left: u32,
    right: u32,
}

/// Finds the longest common subsequence of lines that occur exactly once in
/// `x` and exactly once in `y`, as strictly increasing index pairs, followed
/// by the terminating sentinel pair.
///
/// Restricting the search to unique lines keeps repetitive text (blank
/// lines, closing brackets) from blowing up the alignment, and it turns the
/// problem into longest-increasing-subsequence over a permutation, solvable
/// in O(n log n).
fn find_anchors(x: &[Cow<str>], y: &[Cow<str>], trace: TraceSink) -> Vec<Anchor> {
    let mut occurrences: HashMap<&str, Occurrences> = HashMap::new();
    for line in x {
        occurrences.entry(line.as_ref()).or_default().left += 1;
    }
    for line in y {
        occurrences.entry(line.as_ref()).or_default().right += 1;
    }

    // Number the y-side unique lines in order; `perm` then maps each x-side
    // unique line to its y-order slot, a permutation of 0..n.
    let mut slot_by_line: HashMap<&str, usize> = HashMap::new();
    let mut y_unique: Vec<usize> = vec![];
    for (i, line) in y.iter().enumerate() {
        let occ = occurrences[line.as_ref()];
        if occ.left == 1 && occ.right == 1 {
            slot_by_line.insert(line.as_ref(), y_unique.len());
            y_unique.push(i);
        }
    }
    let mut x_unique: Vec<usize> = vec![];
    let mut perm: Vec<usize> = vec![];
    for (i, line) in x.iter().enumerate() {
        if let Some(&slot) = slot_by_line.get(line.as_ref()) {
            x_unique.push(i);
            perm.push(slot);
        }
    }

    let chain = increasing_chain(&perm);
    trace(format_args!(
        "anchors: {} unique pairs, chain length {}",
        perm.len(),
        chain.len()
    ));

    let mut anchors: Vec<Anchor> = chain
        .iter()
        .map(|&i| Anchor {
            x: x_unique[i],
            y: y_unique[perm[i]],
        })
        .collect();
    anchors.push(Anchor {
        x: x.len(),
        y: y.len(),
    });
    anchors
}

/// Returns the indices of a longest strictly increasing subsequence of
/// `values`, computed with binary search over a threshold array in
/// O(n log n). Ties are resolved toward the smallest-value continuation,
/// which aligns repeated structural separators more intuitively.
fn increasing_chain(values: &[usize]) -> Vec<usize> {
    let n = values.len();
    let mut thresholds = vec![usize::MAX; n];
    let mut length_at = vec![0; n];
    for (i, &value) in values.iter().enumerate() {
        let k = thresholds.partition_point(|&t| t < value);
        thresholds[k] = value;
        length_at[i] = k + 1;
    }

    let mut k = length_at.iter().copied().max().unwrap_or(0);
    let mut chain = vec![0; k];
    let mut last_value = usize::MAX;
    for i in (0..n).rev() {
        if k > 0 && length_at[i] == k && values[i] < last_value {
            last_value = values[i];
            k -= 1;
            chain[k] = i;
        }
    }
    chain
}

/// Builds the edit script for two line sequences that are known to differ.
fn build_ops(x: &[Cow<str>], y: &[Cow<str>], trace: TraceSink) -> Vec<Op> {
    let anchors = find_anchors(x, y, trace);
    let mut ops: Vec<Op> = Vec::with_capacity(3);
    let (mut xi, mut yi) = (0, 0);

    // Fast path for the common whole-prefix region.
    while xi < x.len() && yi < y.len() && x[xi] == y[yi] {
        xi += 1;
        yi += 1;
    }
    if xi > 0 {
        ops.push(Op {
            del: 0,
            add: 0,
            keep: xi,
        });
    }

    let mut ai = 0;
    while xi < x.len() && yi < y.len() {
        // Advance to the next anchor not yet consumed.
        while anchors[ai].x < xi || anchors[ai].y < yi {
            ai += 1;
        }

        // Grow the anchor block backward over immediately preceding matching
        // lines (which need not be unique), and forward over the following
        // matching run.
        let (mut nxi, mut nyi) = (anchors[ai].x, anchors[ai].y);
        let (mut dxi, mut dyi) = (nxi, nyi);
        while nxi > xi && nyi > yi && x[nxi - 1] == y[nyi - 1] {
            nxi -= 1;
            nyi -= 1;
        }
        while dxi < x.len() && dyi < y.len() && x[dxi] == y[dyi] {
            dxi += 1;
            dyi += 1;
        }

        // For a pure insertion or pure deletion, try sliding the block
        // upward through the preceding kept run to the point of minimal
        // indentation, so an added/removed block lands on its enclosing
        // scope's opening line instead of splitting mid-block. Blank and
        // whitespace-only lines never win.
        let max_slide = ops.last().map_or(0, |op| op.keep);
        let mut best_slide = 0;
        if nyi == yi {
            let mut best_indent = indent_width(&x[xi]);
            let mut slide = 1;
            while slide < max_slide && x[nxi - slide] == x[xi - slide] {
                let indent = indent_width(&x[xi - slide]);
                if indent < best_indent {
                    best_indent = indent;
                    best_slide = slide;
                }
                slide += 1;
            }
        } else if nxi == xi {
            let mut best_indent = indent_width(&y[yi]);
            let mut slide = 1;
            while slide < max_slide && y[nyi - slide] == y[yi - slide] {
                let indent = indent_width(&y[yi - slide]);
                if indent < best_indent {
                    best_indent = indent;
                    best_slide = slide;
                }
                slide += 1;
            }
        }
        if best_slide > 0 {
            if let Some(last) = ops.last_mut() {
                last.keep -= best_slide;
            }
            xi -= best_slide;
            yi -= best_slide;
            nxi -= best_slide;
            nyi -= best_slide;
            dxi -= best_slide;
            dyi -= best_slide;
        }

        // Sub-split: scan the mismatch region for runs of identical lines at
        // the same relative offset. These are not anchors (not globally
        // unique) but splitting on them catches short repeated runs like
        // closing brackets. Intentionally a bounded local scan, not a second
        // LCS pass.
        let (mut txi, mut tyi) = (xi, yi);
        while txi < nxi && tyi < nyi {
            let mut same = 0;
            while txi + same < nxi && tyi + same < nyi && x[txi + same] == y[tyi + same] {
                same += 1;
            }
            if same > 0 {
                ops.push(Op {
                    del: txi - xi,
                    add: tyi - yi,
                    keep: same,
                });
                xi = txi + same;
                yi = tyi + same;
                txi = xi;
                tyi = yi;
            } else {
                txi += 1;
                tyi += 1;
            }
        }

        ops.push(Op {
            del: nxi - xi,
            add: nyi - yi,
            keep: dxi - nxi,
        });
        xi = dxi;
        yi = dyi;
    }

    // Whatever remains on either side is a trailing deletion/addition.
    if xi < x.len() || yi < y.len() {
        ops.push(Op {
            del: x.len() - xi,
            add: y.len() - yi,
            keep: 0,
        });
    }

    trace(format_args!("edit script: {} ops", ops.len()));
    ops
}

/// Hashes exactly the deleted and added line contents in emission order,
/// each prefixed with a delete/add marker. Kept lines are excluded, so two
/// diffs with identical changes in different surroundings hash identically.
fn hash_changes(x: &[Cow<str>], y: &[Cow<str>], ops: &[Op]) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut changed = false;
    let (mut xi, mut yi) = (0, 0);
    for op in ops {
        for line in &x[xi..xi + op.del] {
            hasher.write(b"\n-");
            hasher.write(line.as_bytes());
            changed = true;
        }
        xi += op.del;
        for line in &y[yi..yi + op.add] {
            hasher.write(b"\n+");
            hasher.write(line.as_bytes());
            changed = true;
        }
        yi += op.add;
        xi += op.keep;
        yi += op.keep;
    }
    if changed {
        hasher.finish()
    } else {
        0
    }
}

/// Width of a line's leading space/tab indentation. Blank and
/// whitespace-only lines report `usize::MAX` so they never win a
/// minimal-indentation comparison.
pub(crate) fn indent_width(line: &str) -> usize {
    if line.trim().is_empty() {
        return usize::MAX;
    }
    line.chars().take_while(|&c| c == ' ' || c == '\t').count()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn op(del: usize, add: usize, keep: usize) -> Op {
        Op { del, add, keep }
    }

    /// Replays the edit script against both sides, checking the partition
    /// invariants, and returns the reconstructed line sequences.
    fn reconstruct(diff: &Diff) -> (Vec<String>, Vec<String>) {
        let (mut left, mut right) = (vec![], vec![]);
        let (mut xi, mut yi) = (0, 0);
        for op in &diff.ops {
            left.extend(diff.left[xi..xi + op.del].iter().cloned());
            xi += op.del;
            right.extend(diff.right[yi..yi + op.add].iter().cloned());
            yi += op.add;
            for k in 0..op.keep {
                assert_eq!(diff.left[xi + k], diff.right[yi + k]);
                left.push(diff.left[xi + k].clone());
                right.push(diff.right[yi + k].clone());
            }
            xi += op.keep;
            yi += op.keep;
        }
        assert_eq!(xi, diff.left.len());
        assert_eq!(yi, diff.right.len());
        (left, right)
    }

    fn check_diff(left: &str, right: &str) -> Diff {
        let diff = compute_diff(left, right, None);
        let (l, r) = reconstruct(&diff);
        assert_eq!(l, split_lines(left));
        assert_eq!(r, split_lines(right));
        diff
    }

    #[test]
    fn test_split_lines_empty() {
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn test_split_lines_single_newline() {
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn test_split_lines_no_trailing_newline() {
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
    }

    #[test]
    fn test_split_lines_trailing_newline() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_split_lines_trailing_blank_line() {
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
    }

    #[test]
    fn test_increasing_chain_empty() {
        assert_eq!(increasing_chain(&[]), Vec::<usize>::new());
    }

    #[test]
    fn test_increasing_chain_single() {
        assert_eq!(increasing_chain(&[0]), vec![0]);
    }

    #[test]
    fn test_increasing_chain_in_order() {
        assert_eq!(increasing_chain(&[0, 1, 2]), vec![0, 1, 2]);
    }

    #[test]
    fn test_increasing_chain_reverse_order() {
        // Any single element is a valid answer; the smallest-value
        // continuation rule picks the last one.
        assert_eq!(increasing_chain(&[2, 1, 0]), vec![2]);
    }

    #[test]
    fn test_increasing_chain_element_moved_earlier() {
        assert_eq!(
            increasing_chain(&[0, 1, 4, 2, 3, 5, 6]),
            vec![0, 1, 3, 4, 5, 6]
        );
    }

    #[test]
    fn test_increasing_chain_element_moved_later() {
        assert_eq!(
            increasing_chain(&[0, 1, 3, 4, 2, 5, 6]),
            vec![0, 1, 2, 3, 5, 6]
        );
    }

    #[test]
    fn test_identity() {
        let diff = check_diff("a\nb\nc\n", "a\nb\nc\n");
        assert_eq!(diff.ops, vec![op(0, 0, 3)]);
        assert_eq!(diff.hash, 0);
    }

    #[test]
    fn test_identity_empty() {
        let diff = check_diff("", "");
        assert_eq!(diff.left, vec![""]);
        assert_eq!(diff.ops, vec![op(0, 0, 1)]);
        assert_eq!(diff.hash, 0);
    }

    #[test]
    fn test_single_line_change() {
        let diff = check_diff("a\nb\nc\n", "a\nx\nc\n");
        assert_eq!(diff.ops, vec![op(0, 0, 1), op(1, 1, 1)]);
        assert_ne!(diff.hash, 0);
    }

    #[test]
    fn test_empty_left_side() {
        let diff = check_diff("", "x\n");
        assert_eq!(diff.left, vec![""]);
        assert_eq!(diff.right, vec!["x"]);
        assert_eq!(diff.ops, vec![op(1, 1, 0)]);
    }

    #[test]
    fn test_nothing_in_common() {
        let diff = check_diff("a\nb\n", "c\nd\n");
        assert_eq!(diff.ops, vec![op(2, 2, 0)]);
    }

    #[test]
    fn test_insert_in_middle() {
        let diff = check_diff("a\nz\n", "a\ns\nz\n");
        assert_eq!(diff.ops, vec![op(0, 0, 1), op(0, 1, 1)]);
    }

    #[test]
    fn test_delete_at_end() {
        let diff = check_diff("a\nb\nc\n", "a\nb\n");
        assert_eq!(diff.ops, vec![op(0, 0, 2), op(1, 0, 0)]);
    }

    #[test]
    fn test_block_slide_to_enclosing_scope() {
        // The inserted " [ b ]" block should slide up so it is reported as a
        // whole block, not split across the preceding " ]".
        let left = " [\n   a\n ]\n [\n   c\n ]\n";
        let right = " [\n   a\n ]\n [\n   b\n ]\n [\n   c\n ]\n";
        let diff = check_diff(left, right);
        assert_eq!(diff.ops, vec![op(0, 0, 3), op(0, 3, 2), op(0, 0, 1)]);
    }

    #[test]
    fn test_sub_split_on_repeated_lines() {
        // The "}" lines are not unique so they cannot anchor, but the
        // sub-split pass still keeps them.
        let diff = check_diff("a\n}\nb\n}\nz\n", "c\n}\nd\n}\nz\n");
        assert_eq!(diff.ops, vec![op(1, 1, 1), op(1, 1, 2)]);
    }

    #[test]
    fn test_non_unique_lines_still_align() {
        let diff = check_diff("a\n\nb\n\nc\n", "a\n\nx\n\nc\n");
        let changed: usize = diff.ops.iter().map(|op| op.del + op.add).sum();
        assert_eq!(changed, 2);
    }

    #[test]
    fn test_hash_stable_under_context() {
        let a = compute_diff(
            "ctx one\nfoo: 1\nctx two\n",
            "ctx one\nfoo: 2\nctx two\n",
            None,
        );
        let b = compute_diff(
            "other one\nfoo: 1\nother two\n",
            "other one\nfoo: 2\nother two\n",
            None,
        );
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, 0);
    }

    #[test]
    fn test_hash_sensitive_to_content() {
        let a = compute_diff("ctx\nfoo: 1\n", "ctx\nfoo: 2\n", None);
        let b = compute_diff("ctx\nfoo: 1\n", "ctx\nfoo: 3\n", None);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_hash_covers_sub_split_changes() {
        // Changes separated by a sub-split keep run must still all feed the
        // hash: swapping one of them must change it.
        let a = compute_diff("a\n}\nb\n}\nz\n", "c\n}\nd\n}\nz\n", None);
        let b = compute_diff("a\n}\nb\n}\nz\n", "c\n}\ne\n}\nz\n", None);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_strip_pattern_only_affects_alignment() {
        let re = Regex::new(r"\d+").unwrap();
        let diff = compute_diff("time: 123\nval: 1\n", "time: 999\nval: 1\n", Some(&re));
        // Identical after stripping: one keep op, hash zero, but the
        // original lines are preserved.
        assert_eq!(diff.ops, vec![op(0, 0, 2)]);
        assert_eq!(diff.hash, 0);
        assert_eq!(diff.left[0], "time: 123");
        assert_eq!(diff.right[0], "time: 999");
    }

    #[test]
    fn test_strip_pattern_keeps_real_changes() {
        let re = Regex::new(r"\d+").unwrap();
        let diff = compute_diff("time: 123\nval: old\n", "time: 999\nval: new\n", Some(&re));
        assert_eq!(diff.ops, vec![op(0, 0, 1), op(1, 1, 0)]);
        assert_eq!(diff.left, vec!["time: 123", "val: old"]);
    }

    #[test]
    fn test_trace_sink_captures_output() {
        let mut captured = vec![];
        compute_diff_traced("a\nb\n", "a\nc\n", None, &mut |args| {
            captured.push(args.to_string());
        });
        assert!(captured.iter().any(|line| line.contains("anchors")));
    }

    #[test]
    fn test_reconstruction_on_larger_input() {
        let left: String = (0..200).map(|i| format!("line {i}\n")).collect();
        let mut right_lines: Vec<String> = (0..200).map(|i| format!("line {i}")).collect();
        right_lines.remove(50);
        right_lines.insert(120, "inserted".to_string());
        right_lines[180] = "changed".to_string();
        let right = right_lines.join("\n") + "\n";
        check_diff(&left, &right);
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("a"), 0);
        assert_eq!(indent_width("  a"), 2);
        assert_eq!(indent_width("\t\ta"), 2);
        assert_eq!(indent_width("   "), usize::MAX);
        assert_eq!(indent_width(""), usize::MAX);
    }
}
