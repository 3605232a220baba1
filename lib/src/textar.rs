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

//! Text archive: a plain-text container encoding an ordered list of
//! key-value string pairs into one large string and back. Each entry is a
//! separator line carrying the key, followed by the raw value.

/// One named effect: a key and its multi-line text value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyValue {
    /// The effect's name.
    pub key: String,
    /// The effect's text content.
    pub value: String,
}

impl KeyValue {
    /// Creates a key-value pair.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

// Keys must fit on the separator line, so embedded newlines (and the
// backslashes that would shadow them) are escaped; parse() undoes it.
fn escape_key(key: &str) -> String {
    key.replace('\\', r"\\").replace('\n', r"\n")
}

fn unescape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}

/// Encodes key-value pairs into a textar string. The separator line is
/// `sep_char` repeated enough times that no value line is mistaken for it
/// (at least 3, two more than the longest run of `sep_char` starting a
/// value line), followed by a space and the key. Newlines embedded in keys
/// are escaped; [`parse`] restores them.
pub fn format(kvs: &[KeyValue], sep_char: char) -> String {
    let mut max_run = 0;
    for kv in kvs {
        // A run only counts when it starts a line.
        let mut run = Some(0);
        for ch in kv.value.chars() {
            match ch {
                '\n' => run = Some(0),
                c if c == sep_char => {
                    if let Some(r) = run.as_mut() {
                        *r += 1;
                        max_run = max_run.max(*r);
                    }
                }
                _ => run = None,
            }
        }
    }
    let sep = sep_char.to_string().repeat((max_run + 2).max(3));

    let mut out = String::new();
    for (i, kv) in kvs.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&sep);
        out.push(' ');
        out.push_str(&escape_key(&kv.key));
        out.push('\n');
        out.push_str(&kv.value);
    }
    out
}

/// Decodes a textar string back into key-value pairs. The separator is
/// inferred from the first line. Input not produced by [`format`] decodes
/// to an empty list.
pub fn parse(ar: &str) -> Vec<KeyValue> {
    let mut kvs = vec![];
    let Some((sep, mut rest)) = ar.split_once(' ') else {
        return kvs;
    };
    let sep_pattern = format!("\n{sep} ");
    loop {
        let Some((key, after_key)) = rest.split_once('\n') else {
            return kvs;
        };
        match after_key.split_once(sep_pattern.as_str()) {
            Some((value, next)) => {
                kvs.push(KeyValue::new(unescape_key(key), value));
                rest = next;
            }
            None => {
                kvs.push(KeyValue::new(unescape_key(key), after_key));
                return kvs;
            }
        }
    }
}
