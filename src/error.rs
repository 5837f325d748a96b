// Copyright 2020 The Jujutsu Authors
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

use thiserror::Error;

/// Top-level failure modes of [`crate::merge_tools::FileMerger`].
///
/// Capability mismatches, missing tools, and non-zero merge results are
/// *reported* (a warning via [`crate::config_ui::ConfigUi`] plus a non-zero
/// status in [`crate::MergeOutcome`]) and never raised as errors. Only the
/// cases below -- configuration errors and in-memory incompatibilities --
/// propagate.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("{tool}.premerge not valid ('{value}' is neither boolean nor 'keep'/'keep-merge3')")]
    InvalidPremergeConfig { tool: String, value: String },

    #[error("in-memory merge does not support {reason} ({paths:?})")]
    InMemoryConflict {
        paths: Vec<String>,
        reason: &'static str,
    },

    #[error("merge halted after failed merge (see resolve)")]
    InterventionRequired,

    #[error("hit merge conflicts, and the :abort tool was selected")]
    AbortOnConflict,

    #[error("the :abort tool only works with in-memory merge")]
    AbortRequiresInMemory,

    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExternalToolError {
    #[error("couldn't find merge tool {0}")]
    NotFound(String),

    #[error("error setting up temporary file: {0}")]
    SetUpTemp(#[source] std::io::Error),

    #[error("error executing '{tool_binary}': {source}")]
    FailedToExecute {
        tool_binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("in-memory merge does not support external merge tools")]
    InMemory,
}
