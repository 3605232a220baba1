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

//! Subcommand definitions and dispatch.

mod clear;
mod diff;
mod hash;
mod htmldiff;
mod keys;
mod print;
mod printraw;
mod save;

use std::io::Read as _;
use std::path::PathBuf;

use fxdump_lib::matchers::key_filter;
use fxdump_lib::store::Store;
use fxdump_lib::textar;
use fxdump_lib::textar::KeyValue;

use crate::command_error::user_error;
use crate::command_error::CommandError;

/// Generate, store, and diff effect dumps.
///
/// Effects are read as a textar archive: entries separated by
/// `=== keyname` lines. Key globs use `*` for any number of characters;
/// "hello" matches the glob "*o*".
#[derive(clap::Parser, Debug)]
#[command(name = "fxdump", version)]
pub struct Cli {
    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// The selected subcommand.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug)]
pub struct GlobalArgs {
    /// Name of this dump; selects its state directory.
    #[arg(long, global = true, default_value = "fxdump")]
    pub name: String,
    /// Read the current effects from this textar file, `-` for stdin.
    #[arg(long, short = 'i', global = true, default_value = "-")]
    pub input: String,
    /// Baseline version label to diff against or save under.
    #[arg(long, global = true, default_value = "baseline")]
    pub baseline: String,
    /// Override the state directory (otherwise FXDUMP_DIR or a per-user
    /// temp directory).
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,
    /// Entry separator character in textar output.
    #[arg(long, global = true, default_value_t = '=')]
    pub sepch: char,
}

/// The fxdump subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Delete all stored dumps and reports from the state directory.
    Clear(clear::ClearArgs),
    /// Print a unified diff between the baseline dump and the current
    /// effects.
    Diff(diff::DiffArgs),
    /// Print the hash of the current effects, key names included.
    Hash(hash::HashArgs),
    /// Write an HTML formatted diff between the baseline dump and the
    /// current effects.
    Htmldiff(htmldiff::HtmldiffArgs),
    /// Print the list of keys the current effects have.
    Keys(keys::KeysArgs),
    /// Print the current effects as an indented textar.
    Print(print::PrintArgs),
    /// Print one effect's value without any decoration.
    Printraw(printraw::PrintrawArgs),
    /// Save the current effects as the baseline version.
    Save(save::SaveArgs),
}

/// Runs the parsed command.
pub fn run(cli: &Cli) -> Result<(), CommandError> {
    match &cli.command {
        Command::Clear(args) => clear::cmd_clear(&cli.global, args),
        Command::Diff(args) => diff::cmd_diff(&cli.global, args),
        Command::Hash(args) => hash::cmd_hash(&cli.global, args),
        Command::Htmldiff(args) => htmldiff::cmd_htmldiff(&cli.global, args),
        Command::Keys(args) => keys::cmd_keys(&cli.global, args),
        Command::Print(args) => print::cmd_print(&cli.global, args),
        Command::Printraw(args) => printraw::cmd_printraw(&cli.global, args),
        Command::Save(args) => save::cmd_save(&cli.global, args),
    }
}

fn open_store(global: &GlobalArgs) -> Result<Store, CommandError> {
    Ok(Store::new(&global.name, global.dir.clone(), global.sepch)?)
}

/// Reads the full current effect set from the configured input, sorts it,
/// and rejects duplicate keys.
fn read_effects(global: &GlobalArgs) -> Result<Vec<KeyValue>, CommandError> {
    let text = if global.input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(&global.input)?
    };
    let mut effects = textar::parse(&text);
    effects.sort_by(|a, b| a.key.cmp(&b.key));
    for pair in effects.windows(2) {
        if pair[0].key == pair[1].key {
            return Err(user_error(format!("key {:?} duplicated", pair[0].key)));
        }
    }
    tracing::debug!(entries = effects.len(), "effects read");
    Ok(effects)
}

/// Drops keys not matching the globs.
fn filter_keys(effects: &mut Vec<KeyValue>, globs: &[String]) -> Result<(), CommandError> {
    let filter = key_filter(globs)?;
    effects.retain(|kv| filter.is_match(&kv.key));
    Ok(())
}

/// Loads the baseline effects and applies the same glob filter.
fn load_baseline(global: &GlobalArgs, globs: &[String]) -> Result<Vec<KeyValue>, CommandError> {
    let store = open_store(global)?;
    let mut baseline = store.load(&global.baseline)?;
    let filter = key_filter(globs)?;
    baseline.retain(|kv| filter.is_match(&kv.key));
    Ok(baseline)
}

/// Resolves the `--template KEY` flag to the named effect's value in the
/// current dump. Looked up before any glob filtering, so the template key
/// does not need to match the diffed globs.
fn resolve_template(
    effects: &[KeyValue],
    template: Option<&str>,
) -> Result<Option<String>, CommandError> {
    match template {
        None => Ok(None),
        Some(key) => effects
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| Some(kv.value.clone()))
            .ok_or_else(|| user_error(format!("template key {key:?} not found"))),
    }
}

fn compile_strip(strip: Option<&str>) -> Result<Option<regex::Regex>, CommandError> {
    strip.map(regex::Regex::new).transpose().map_err(Into::into)
}
