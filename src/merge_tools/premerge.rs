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

use crate::config_ui::ConfigUi;
use crate::error::MergeError;
use crate::file_version::FileVersion;
use crate::host::WorkingContext;
use crate::simple_merge::{SimpleMerge, SimpleMergeMode};

use super::backup::{restore, Backup};

enum KeepPolicy {
    Keep,
    KeepMerge3,
}

/// Runs the non-interactive simple-merge attempt that precedes a
/// `full-merge` tool. Returns `Ok(0)` on a clean premerge, `Ok(1)` to fall
/// through to the tool proper.
#[allow(clippy::too_many_arguments)]
pub fn run_premerge(
    cfg: &dyn ConfigUi,
    wc: &dyn WorkingContext,
    simple_merge: &dyn SimpleMerge,
    tool_name: &str,
    local: &FileVersion,
    other: &FileVersion,
    ancestor: &FileVersion,
    symlink: bool,
    binary: bool,
    labels: &[String],
    backup: Option<&Backup>,
) -> Result<i32, MergeError> {
    if symlink || local.is_absent() || other.is_absent() {
        return Ok(1);
    }

    let config_key: [&str; 3] = ["merge-tools", tool_name, "premerge"];
    let (enabled, keep_policy) = if let Some(b) = cfg.cfg_bool(&config_key) {
        (b, None)
    } else if let Some(s) = cfg.cfg_str(&config_key) {
        match s.as_str() {
            "keep" => (true, Some(KeepPolicy::Keep)),
            "keep-merge3" => (true, Some(KeepPolicy::KeepMerge3)),
            other => {
                return Err(MergeError::InvalidPremergeConfig {
                    tool: tool_name.to_owned(),
                    value: other.to_owned(),
                })
            }
        }
    } else {
        (!binary, None)
    };

    if !enabled {
        return Ok(1);
    }

    let mut working_labels = labels.to_vec();
    if matches!(keep_policy, Some(KeepPolicy::KeepMerge3)) && working_labels.len() < 3 {
        working_labels.push("base".to_owned());
    }

    let empty: &[u8] = &[];
    let local_bytes = local.data().map(|d| d.as_slice()).unwrap_or(empty);
    let other_bytes = other.data().map(|d| d.as_slice()).unwrap_or(empty);
    let ancestor_bytes = ancestor.data().map(|d| d.as_slice()).unwrap_or(empty);
    let result = simple_merge.merge(
        local_bytes,
        ancestor_bytes,
        other_bytes,
        &working_labels,
        SimpleMergeMode::Merge,
        false,
    );
    wc.write_destination(local.path(), &result.output, local.flags())?;

    if result.status == 0 {
        cfg.debug(" premerge successful");
        return Ok(0);
    }

    if keep_policy.is_none() {
        if let Some(backup) = backup {
            restore(wc, local, backup)?;
        }
    }
    Ok(1)
}
