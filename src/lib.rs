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

//! File-level three-way merge core: tool selection, premerge, and conflict
//! resolution, factored out from the host's working-copy and config layers.
//!
//! A host embeds this crate by implementing [`config_ui::ConfigUi`],
//! [`host::HostServices`]/[`host::WorkingContext`], [`simple_merge::SimpleMerge`],
//! [`tag_merge::TagMerge`], and [`template::LabelTemplate`], then driving
//! [`merge_tools::FileMerger`] per conflicted file.

pub mod config_ui;
pub mod error;
pub mod file_version;
pub mod host;
pub mod merge_tools;
pub mod simple_merge;
pub mod tag_merge;
pub mod template;
pub mod toml_config;

#[cfg(test)]
mod test_support;

pub use error::{ExternalToolError, MergeError};
pub use file_version::{ChangeContext, FileVersion, NodeId};
pub use merge_tools::{FileMerger, MergeOutcome, MergeRequest};

/// Builds a [`merge_tools::registry::ToolRegistry`] with every built-in
/// strategy installed. Convenience wrapper so hosts don't need to reach
/// into `merge_tools::internal` directly.
pub fn merge_tools_registry() -> merge_tools::registry::ToolRegistry {
    let mut registry = merge_tools::registry::ToolRegistry::new();
    merge_tools::internal::load_internal_merge(&mut registry);
    registry
}
