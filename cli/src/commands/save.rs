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

use fxdump_lib::store::SaveOutcome;

use crate::command_error::CommandError;
use crate::commands::open_store;
use crate::commands::read_effects;
use crate::commands::GlobalArgs;

/// Save takes no key globs: a partial baseline would make later diffs
/// misreport missing keys as deleted.
#[derive(clap::Args, Debug)]
pub struct SaveArgs {}

pub fn cmd_save(global: &GlobalArgs, _args: &SaveArgs) -> Result<(), CommandError> {
    let effects = read_effects(global)?;
    let store = open_store(global)?;
    match store.save(&global.baseline, &effects)? {
        SaveOutcome::Written(path) => {
            println!("fxdump for {} saved to {}.", global.baseline, path.display());
        }
        SaveOutcome::Unchanged(path) => {
            println!(
                "NOTE: skipped writing {} because it already exists and looks the same.",
                path.display()
            );
        }
    }
    Ok(())
}
