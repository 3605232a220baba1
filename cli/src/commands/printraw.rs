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

use crate::command_error::user_error;
use crate::command_error::CommandError;
use crate::commands::read_effects;
use crate::commands::GlobalArgs;

#[derive(clap::Args, Debug)]
pub struct PrintrawArgs {
    /// The key to print.
    pub key: String,
}

pub fn cmd_printraw(global: &GlobalArgs, args: &PrintrawArgs) -> Result<(), CommandError> {
    let effects = read_effects(global)?;
    match effects.iter().find(|kv| kv.key == args.key) {
        Some(kv) => {
            print!("{}", kv.value);
            Ok(())
        }
        None => Err(user_error(format!("key {:?} not found", args.key))),
    }
}
