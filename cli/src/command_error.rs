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

//! Error type shared by all subcommands.

use fxdump_lib::dump::DumpError;
use fxdump_lib::store::StoreError;
use thiserror::Error;

/// Anything a subcommand can fail with; rendered on stderr by the
/// dispatcher.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A problem with the arguments or input, phrased for the user.
    #[error("{0}")]
    User(String),
    /// Baseline storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Effect set validation failure.
    #[error(transparent)]
    Dump(#[from] DumpError),
    /// A user-supplied pattern did not compile.
    #[error("bad pattern: {0}")]
    Pattern(#[from] regex::Error),
    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shorthand for a [`CommandError::User`].
pub fn user_error(message: impl Into<String>) -> CommandError {
    CommandError::User(message.into())
}
