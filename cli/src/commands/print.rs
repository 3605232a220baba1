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

use fxdump_lib::textar;

use crate::command_error::CommandError;
use crate::commands::filter_keys;
use crate::commands::read_effects;
use crate::commands::GlobalArgs;

#[derive(clap::Args, Debug)]
pub struct PrintArgs {
    /// Key globs to restrict the output to.
    pub globs: Vec<String>,
}

pub fn cmd_print(global: &GlobalArgs, args: &PrintArgs) -> Result<(), CommandError> {
    let mut effects = read_effects(global)?;
    filter_keys(&mut effects, &args.globs)?;
    // Indent values so the separator lines stand out when paging.
    for kv in &mut effects {
        if !kv.value.is_empty() {
            kv.value = format!("\t{}", kv.value.replace('\n', "\n\t"));
        }
    }
    println!("{}", textar::format(&effects, global.sepch));
    Ok(())
}
