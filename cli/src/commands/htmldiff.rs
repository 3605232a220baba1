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
use fxdump_lib::html::render_html_buckets;
use fxdump_lib::hunk::DEFAULT_CONTEXT_LINES;

use crate::command_error::CommandError;
use crate::commands::compile_strip;
use crate::commands::filter_keys;
use crate::commands::load_baseline;
use crate::commands::open_store;
use crate::commands::read_effects;
use crate::commands::resolve_template;
use crate::commands::GlobalArgs;

#[derive(clap::Args, Debug)]
pub struct HtmldiffArgs {
    /// Key globs to restrict the diff to.
    pub globs: Vec<String>,
    /// Unchanged lines to show around each change.
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LINES)]
    pub context: usize,
    /// Strip this pattern's matches from lines before comparing them.
    #[arg(long)]
    pub strip: Option<String>,
    /// Diff added keys against this key's current value instead of
    /// against nothing.
    #[arg(long, value_name = "KEY")]
    pub template: Option<String>,
    /// Output file, `-` for stdout. Defaults to diff.html in the state
    /// directory.
    #[arg(long, short = 'o')]
    pub output: Option<String>,
}

pub fn cmd_htmldiff(global: &GlobalArgs, args: &HtmldiffArgs) -> Result<(), CommandError> {
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
    let html = render_html_buckets(&assemble_buckets(entries), args.context);

    match args.output.as_deref() {
        Some("-") => print!("{html}"),
        Some(path) => {
            std::fs::write(path, html)?;
            println!("NOTE: output written to {path}.");
        }
        None => {
            let store = open_store(global)?;
            std::fs::create_dir_all(store.dir())?;
            let path = store.dir().join("diff.html");
            std::fs::write(&path, html)?;
            println!("NOTE: output written to {}.", path.display());
        }
    }
    Ok(())
}
