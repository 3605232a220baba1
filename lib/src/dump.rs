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

//! The effect dump a host program populates: a named set of key-value
//! effects with key validation, ordering, and a whole-dump hash.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Display;
use std::hash::Hasher;

use thiserror::Error;

use crate::textar::KeyValue;

/// Errors from building or finalizing a dump.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The dump or version name is not usable as a file-name-safe label.
    #[error("\"{0}\" is not a short alphanumeric identifier")]
    InvalidName(String),
    /// The same effect key was added twice.
    #[error("key \"{0}\" duplicated")]
    DuplicateKey(String),
}

/// Whether `v` is usable as a dump or version name: non-empty, at most 64
/// bytes, letters and digits only.
pub fn is_identifier(v: &str) -> bool {
    !v.is_empty() && v.len() <= 64 && v.chars().all(char::is_alphanumeric)
}

/// A named set of effects under construction. Keys are sorted and checked
/// for duplicates only when the dump is finalized, so hosts can add
/// effects in any order.
#[derive(Debug)]
pub struct Dump {
    name: String,
    effects: Vec<KeyValue>,
}

impl Dump {
    /// Creates an empty dump. The name must be a short alphanumeric
    /// identifier; it becomes part of the state directory name.
    pub fn new(name: impl Into<String>) -> Result<Self, DumpError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(DumpError::InvalidName(name));
        }
        Ok(Dump {
            name,
            effects: vec![],
        })
    }

    /// The dump's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records one effect. The value is stringified immediately.
    pub fn add(&mut self, key: impl Into<String>, value: impl Display) {
        self.effects.push(KeyValue::new(key, value.to_string()));
    }

    /// Records many effects at once.
    pub fn extend(&mut self, effects: impl IntoIterator<Item = KeyValue>) {
        self.effects.extend(effects);
    }

    /// Finalizes the dump into a key-sorted effect list, rejecting
    /// duplicate keys.
    pub fn into_effects(self) -> Result<Vec<KeyValue>, DumpError> {
        let mut effects = self.effects;
        effects.sort_by(|a, b| a.key.cmp(&b.key));
        for pair in effects.windows(2) {
            if pair[0].key == pair[1].key {
                return Err(DumpError::DuplicateKey(pair[0].key.clone()));
            }
        }
        Ok(effects)
    }
}

/// Hashes a whole effect list, keys included, into the 64-bit value used
/// for save-skipping and the `hash` subcommand. Stable within one build of
/// the tool, which is all its uses require.
pub fn dump_hash(effects: &[KeyValue]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for kv in effects {
        hasher.write(kv.key.as_bytes());
        hasher.write(kv.value.as_bytes());
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("mydump"));
        assert!(is_identifier("Dump42"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier("dot.dot"));
        assert!(!is_identifier(&"x".repeat(65)));
    }

    #[test]
    fn test_dump_rejects_bad_name() {
        assert_matches!(Dump::new("no/slashes"), Err(DumpError::InvalidName(_)));
    }

    #[test]
    fn test_into_effects_sorts() {
        let mut dump = Dump::new("d").unwrap();
        dump.add("zebra", "1");
        dump.add("apple", 42);
        let effects = dump.into_effects().unwrap();
        let keys: Vec<&str> = effects.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["apple", "zebra"]);
        assert_eq!(effects[0].value, "42");
    }

    #[test]
    fn test_into_effects_rejects_duplicates() {
        let mut dump = Dump::new("d").unwrap();
        dump.add("k", "1");
        dump.add("k", "2");
        assert_matches!(dump.into_effects(), Err(DumpError::DuplicateKey(k)) if k == "k");
    }

    #[test]
    fn test_dump_hash_covers_keys_and_values() {
        let base = [KeyValue::new("k", "v")];
        assert_eq!(dump_hash(&base), dump_hash(&base));
        assert_ne!(dump_hash(&base), dump_hash(&[KeyValue::new("k", "w")]));
        assert_ne!(dump_hash(&base), dump_hash(&[KeyValue::new("l", "v")]));
        assert_ne!(dump_hash(&base), dump_hash(&[]));
    }
}
