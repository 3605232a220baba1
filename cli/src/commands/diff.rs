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

use fxdump_lib::bucket::assemble_buckets;
use fxdump_lib::bucket::compare;
use fxdump_lib::hunk::DEFAULT_CONTEXT_LINES;
use fxdump_lib::unified::render_unified_buckets;

use crate::command_error::CommandError;
use crate::commands::compile_strip;
use crate::commands::filter_keys;
use crate::commands::load_baseline;
use crate::commands::read_effects;
use crate::commands::resolve_template;
use crate::commands::GlobalArgs;

#[derive(clap::Args, Debug)]
pub struct DiffArgs {
    /// Key globs to restrict the diff to.
    pub globs: Vec<String>,
    /// Unchanged lines to show around each change.
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LINES)]
    pub context: usize,
    /// Color the output with ANSI escapes.
    #[arg(long)]
    pub color: bool,
    /// Strip this pattern's matches from lines before comparing them,
    /// e.g. to ignore timestamps.
    #[arg(long)]
    pub strip: Option<String>,
    /// Diff added keys against this key's current value instead of
    /// against nothing.
    #[arg(long, value_name = "KEY")]
    pub template: Option<String>,
}

pub fn cmd_diff(global: &GlobalArgs, args: &DiffArgs) -> Result<(), CommandError> {
    let mut effects = read_effects(global)?;
    let template = resolve_template(&effects, args.template.as_deref())?;
    filter_keys(&mut effects, &args.globs)?;
    let baseline = load_baseline(global, &args.globs)?;
    let strip = compile_strip(args.strip.as_deref())?;

    let entries = compare(&baseline, &effects, template.as_deref(), strip.as_ref());
    if entries.is_empty() {
        println!("NOTE: no diffs.");
        return Ok(());
    }
    let buckets = assemble_buckets(entries);
    print!("{}", render_unified_buckets(&buckets, args.context, args.color));
    Ok(())
}
