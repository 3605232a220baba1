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

//! Key filtering: turns shell-style key globs into one anchored regex.

use itertools::Itertools as _;
use regex::Regex;

/// Compiles a set of globs into a single whole-key-anchored regex. `*`
/// matches any number of characters, everything else is literal. With no
/// globs, every key matches.
pub fn key_filter(globs: &[String]) -> Result<Regex, regex::Error> {
    if globs.is_empty() {
        return Regex::new("");
    }
    let alternatives = globs
        .iter()
        .map(|glob| glob.split('*').map(|part| regex::escape(part)).join(".*"))
        .join("|");
    Regex::new(&format!("^(?:{alternatives})$"))
}
