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

//! Comparing two effect sets and grouping the resulting diffs by content
//! hash, so the same edit applied to many keys is reviewed once.

use indexmap::IndexMap;
use regex::Regex;

use crate::diff::compute_diff;
use crate::diff::Diff;
use crate::textar::KeyValue;

/// One named diff with a short classification comment ("added",
/// "deleted", "changed").
#[derive(Clone, Debug)]
pub struct Entry {
    /// The effect key this diff belongs to.
    pub name: String,
    /// Classification shown next to the name.
    pub comment: String,
    /// The computed diff.
    pub diff: Diff,
}

/// Entries whose diffs hash to the same value. Built, rendered, and
/// dropped within one diff pass.
#[derive(Clone, Debug)]
pub struct Bucket {
    /// The shared diff content hash.
    pub hash: u64,
    /// Member entries in their original relative order.
    pub entries: Vec<Entry>,
}

impl Bucket {
    fn first_name(&self) -> &str {
        self.entries.first().map_or("", |entry| entry.name.as_str())
    }
}

/// Groups entries by diff hash, keeping insertion order within each
/// bucket, then orders buckets by their first entry's name.
pub fn assemble_buckets(entries: impl IntoIterator<Item = Entry>) -> Vec<Bucket> {
    let mut by_hash: IndexMap<u64, Vec<Entry>> = IndexMap::new();
    for entry in entries {
        by_hash.entry(entry.diff.hash).or_default().push(entry);
    }
    let mut buckets: Vec<Bucket> = by_hash
        .into_iter()
        .map(|(hash, entries)| Bucket { hash, entries })
        .collect();
    buckets.sort_by(|a, b| a.first_name().cmp(b.first_name()));
    buckets
}

/// Compares two key-sorted, duplicate-free effect sets key by key.
/// Left-only keys are "deleted" (diffed against empty), right-only keys
/// are "added" (diffed against `template` when given, else empty), equal
/// values are skipped, differing values are "changed". Entries whose
/// values differ only in stripped content are skipped too. Sorting and
/// uniqueness of the inputs are the caller's responsibility.
pub fn compare(
    left: &[KeyValue],
    right: &[KeyValue],
    template: Option<&str>,
    strip: Option<&Regex>,
) -> Vec<Entry> {
    let mut entries = vec![];
    let (mut li, mut ri) = (0, 0);
    while li < left.len() || ri < right.len() {
        if ri == right.len() || (li < left.len() && left[li].key < right[ri].key) {
            let kv = &left[li];
            entries.push(Entry {
                name: kv.key.clone(),
                comment: "deleted".to_string(),
                diff: compute_diff(&kv.value, "", strip),
            });
            li += 1;
        } else if li == left.len() || right[ri].key < left[li].key {
            let kv = &right[ri];
            entries.push(Entry {
                name: kv.key.clone(),
                comment: "added".to_string(),
                diff: compute_diff(template.unwrap_or(""), &kv.value, strip),
            });
            ri += 1;
        } else {
            if left[li].value != right[ri].value {
                let diff = compute_diff(&left[li].value, &right[ri].value, strip);
                if diff.hash != 0 {
                    entries.push(Entry {
                        name: left[li].key.clone(),
                        comment: "changed".to_string(),
                        diff,
                    });
                }
            }
            li += 1;
            ri += 1;
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kv(key: &str, value: &str) -> KeyValue {
        KeyValue::new(key, value)
    }

    fn summarize(entries: &[Entry]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| format!("{} ({})", entry.name, entry.comment))
            .collect()
    }

    #[test]
    fn test_compare_classification() {
        let left = [kv("a", "1\n"), kv("b", "2\n"), kv("d", "4\n")];
        let right = [kv("b", "2\n"), kv("c", "3\n"), kv("d", "5\n")];
        let entries = compare(&left, &right, None, None);
        assert_eq!(
            summarize(&entries),
            vec!["a (deleted)", "c (added)", "d (changed)"]
        );
    }

    #[test]
    fn test_compare_no_differences() {
        let kvs = [kv("a", "1\n"), kv("b", "2\n")];
        assert!(compare(&kvs, &kvs, None, None).is_empty());
    }

    #[test]
    fn test_compare_trailing_additions() {
        let entries = compare(&[], &[kv("x", "1\n"), kv("y", "2\n")], None, None);
        assert_eq!(summarize(&entries), vec!["x (added)", "y (added)"]);
    }

    #[test]
    fn test_compare_added_uses_template() {
        let right = [kv("n", "base: 1\nextra: 2\n")];
        let entries = compare(&[], &right, Some("base: 1\n"), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].diff.left, vec!["base: 1"]);
        // Only the line beyond the template shows up as an addition.
        let added: usize = entries[0].diff.ops.iter().map(|op| op.add).sum();
        assert_eq!(added, 1);
    }

    #[test]
    fn test_compare_strip_skips_noise_only_changes() {
        let re = Regex::new(r"\d+").unwrap();
        let left = [kv("a", "time: 1\n"), kv("b", "x\n")];
        let right = [kv("a", "time: 2\n"), kv("b", "y\n")];
        let entries = compare(&left, &right, None, Some(&re));
        assert_eq!(summarize(&entries), vec!["b (changed)"]);
    }

    #[test]
    fn test_assemble_groups_identical_edits() {
        // The same field edit inside two different 50-line blocks must land
        // in one bucket; the unrelated edit gets its own.
        let block = |prefix: &str, field: &str| -> String {
            (0..50)
                .map(|i| format!("{prefix} filler {i}\n"))
                .chain([format!("{field}\n")])
                .collect()
        };
        let left = [
            kv("one", &block("alpha", "foo: 1")),
            kv("two", &block("beta", "foo: 1")),
            kv("other", "p\n"),
        ];
        let right = [
            kv("one", &block("alpha", "foo: 2")),
            kv("two", &block("beta", "foo: 2")),
            kv("other", "q\n"),
        ];
        let mut left = left.to_vec();
        let mut right = right.to_vec();
        left.sort_by(|a, b| a.key.cmp(&b.key));
        right.sort_by(|a, b| a.key.cmp(&b.key));

        let buckets = assemble_buckets(compare(&left, &right, None, None));
        assert_eq!(buckets.len(), 2);
        // Sorted by first entry name: "one" before "other".
        let names: Vec<Vec<&str>> = buckets
            .iter()
            .map(|b| b.entries.iter().map(|e| e.name.as_str()).collect())
            .collect();
        assert_eq!(names, vec![vec!["one", "two"], vec!["other"]]);
    }

    #[test]
    fn test_assemble_empty() {
        assert!(assemble_buckets([]).is_empty());
    }

    #[test]
    fn test_assemble_preserves_entry_order_within_bucket() {
        let entries = compare(
            &[kv("a", "x\n"), kv("b", "x\n"), kv("c", "x\n")],
            &[kv("a", "y\n"), kv("b", "y\n"), kv("c", "y\n")],
            None,
            None,
        );
        let buckets = assemble_buckets(entries);
        assert_eq!(buckets.len(), 1);
        let names: Vec<&str> = buckets[0].entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
