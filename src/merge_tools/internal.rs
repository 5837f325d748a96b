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
use crate::host::{HostServices, WorkingContext};
use crate::simple_merge::{SimpleMerge, SimpleMergeMode, SimpleMergeResult};
use crate::tag_merge::TagMerge;

use super::registry::{MergeType, ToolDescriptor, ToolRegistry};

/// Outcome of one strategy invocation, before Post-Check runs.
#[derive(Debug)]
pub struct StrategyOutcome {
    /// Whether Post-Check (conflict-marker scan, unchanged detection,
    /// EOL fixup) should run over this result. `no-merge` strategies and
    /// `:dump`/`:forcedump` never need it.
    pub needcheck: bool,
    /// `0` clean, non-zero conflicting or strategy-defined.
    pub status: i32,
    pub deleted: bool,
}

/// Everything a strategy function needs, bundled the way `jj-cli`'s
/// `MergeToolFile` bundles a file's conflict data for its editors.
#[derive(Clone, Copy)]
pub struct StrategyContext<'a> {
    pub cfg: &'a dyn ConfigUi,
    pub host: &'a dyn HostServices,
    pub wc: &'a dyn WorkingContext,
    pub simple_merge: &'a dyn SimpleMerge,
    pub tag_merge: &'a dyn TagMerge,
    pub local: &'a FileVersion,
    pub other: &'a FileVersion,
    pub ancestor: &'a FileVersion,
    pub tool_name: &'a str,
    pub binary: bool,
    pub symlink: bool,
    pub labels: &'a [String],
}

pub type StrategyFn = fn(&StrategyContext) -> Result<StrategyOutcome, MergeError>;
pub type PrecheckFn = fn(&StrategyContext) -> bool;

fn label_suffixes(labels: &[String]) -> (String, String) {
    if labels.len() < 2 {
        return (String::new(), String::new());
    }
    (format!(" [{}]", labels[0]), format!(" [{}]", labels[1]))
}

/// `:prompt` -- asks the user to keep local, take other, or leave
/// unresolved. The wording differs depending on which side (if any) is
/// absent, matching `_localchangedotherdeletedmsg` /
/// `_otherchangedlocaldeletedmsg` in the original.
fn prompt(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    if ctx.wc.is_in_memory() {
        return Err(MergeError::InMemoryConflict {
            paths: vec![ctx.local.path().to_owned()],
            reason: "interactive file-merge prompts",
        });
    }
    let fd = ctx.local.path();
    let (l_suffix, o_suffix) = label_suffixes(ctx.labels);

    let (message, display_choices, outcomes): (String, [&str; 3], [&str; 3]) =
        if ctx.other.is_absent() {
            (
                format!(
                    "local{l_suffix} changed {fd} which other{o_suffix} deleted\nuse (c)hanged \
                     version, (d)elete, or leave (u)nresolved?"
                ),
                ["Changed", "Delete", "Unresolved"],
                ["local", "other", "unresolved"],
            )
        } else if ctx.local.is_absent() {
            (
                format!(
                    "other{o_suffix} changed {fd} which local{l_suffix} deleted\nuse (c)hanged \
                     version, leave (d)eleted, or leave (u)nresolved?"
                ),
                ["Changed", "Deleted", "Unresolved"],
                ["other", "local", "unresolved"],
            )
        } else {
            (
                format!(
                    "keep (l)ocal{l_suffix}, take (o)ther{o_suffix}, or leave (u)nresolved for \
                     {fd}?"
                ),
                ["Local", "Other", "Unresolved"],
                ["local", "other", "unresolved"],
            )
        };

    // Absence of an answer (non-interactive host) is "unresolved", matching
    // `except error.ResponseExpected: return _ifail(...)`.
    let choice = match ctx.cfg.prompt_choice(&message, &display_choices, 2) {
        Some(idx) => outcomes[idx],
        None => "unresolved",
    };

    match choice {
        "other" => other_strategy(ctx),
        "local" => local_strategy(ctx),
        _ => fail_strategy(ctx),
    }
}

/// `:local` -- keeps the local content unchanged.
fn local_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    Ok(StrategyOutcome {
        needcheck: false,
        status: 0,
        deleted: ctx.local.is_absent(),
    })
}

/// `:other` -- adopts the other side, removing the destination if other was
/// deleted.
fn other_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    let deleted = if ctx.other.is_absent() {
        ctx.wc.remove_destination(ctx.local.path())?;
        true
    } else {
        let data = ctx.other.data().map(|b| b.as_slice()).unwrap_or(&[]);
        ctx.wc
            .write_destination(ctx.local.path(), data, ctx.other.flags())?;
        false
    };
    Ok(StrategyOutcome {
        needcheck: false,
        status: 0,
        deleted,
    })
}

/// `:fail` -- marks the file unresolved. For a change/delete conflict with
/// local absent, the changed (other) content is materialized first so the
/// user has something to resolve against.
fn fail_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    if ctx.local.is_absent() {
        if let Some(data) = ctx.other.data() {
            ctx.wc
                .write_destination(ctx.local.path(), data.as_slice(), ctx.other.flags())?;
        }
    }
    Ok(StrategyOutcome {
        needcheck: false,
        status: 1,
        deleted: false,
    })
}

fn run_simple_merge(ctx: &StrategyContext, mode: SimpleMergeMode) -> SimpleMergeResult {
    let empty: &[u8] = &[];
    let local = ctx.local.data().map(|d| d.as_slice()).unwrap_or(empty);
    let other = ctx.other.data().map(|d| d.as_slice()).unwrap_or(empty);
    let ancestor = ctx.ancestor.data().map(|d| d.as_slice()).unwrap_or(empty);
    ctx.simple_merge
        .merge(local, ancestor, other, ctx.labels, mode, false)
}

fn write_merge_result(ctx: &StrategyContext, result: &SimpleMergeResult) -> Result<(), MergeError> {
    ctx.wc
        .write_destination(ctx.local.path(), &result.output, ctx.local.flags())?;
    Ok(())
}

/// `:merge` -- non-interactive textual merge; leaves conflict markers.
fn merge_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    let result = run_simple_merge(ctx, SimpleMergeMode::Merge);
    write_merge_result(ctx, &result)?;
    Ok(StrategyOutcome {
        needcheck: true,
        status: result.status,
        deleted: false,
    })
}

/// `:merge3` -- like `:merge`, but ensures a third `"base"` label so markers
/// include ancestor content.
fn merge3_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    let mut labels = ctx.labels.to_vec();
    if labels.is_empty() {
        labels = vec!["local".to_owned(), "other".to_owned()];
    }
    if labels.len() < 3 {
        labels.push("base".to_owned());
    }
    let ctx3 = StrategyContext {
        labels: &labels,
        ..*ctx
    };
    merge_strategy(&ctx3)
}

/// `:union` -- concatenates both sides at conflicts, never leaving markers.
fn union_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    let result = run_simple_merge(ctx, SimpleMergeMode::Union);
    write_merge_result(ctx, &result)?;
    Ok(StrategyOutcome {
        needcheck: true,
        status: result.status,
        deleted: false,
    })
}

/// `:merge-local` -- like `:merge`, resolving every hunk in local's favor.
fn merge_local_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    let result = run_simple_merge(ctx, SimpleMergeMode::LocalPick);
    write_merge_result(ctx, &result)?;
    Ok(StrategyOutcome {
        needcheck: true,
        status: result.status,
        deleted: false,
    })
}

/// `:merge-other` -- like `:merge`, resolving every hunk in other's favor.
fn merge_other_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    let result = run_simple_merge(ctx, SimpleMergeMode::OtherPick);
    write_merge_result(ctx, &result)?;
    Ok(StrategyOutcome {
        needcheck: true,
        status: result.status,
        deleted: false,
    })
}

/// `:tagmerge` -- delegates to the tag-file merge collaborator.
fn tagmerge_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    let (needcheck, status) = ctx.tag_merge.merge(ctx.local, ctx.other, ctx.ancestor);
    Ok(StrategyOutcome {
        needcheck,
        status,
        deleted: false,
    })
}

/// `:dump`/`:forcedump` -- writes `<path>.local`, `<path>.other`,
/// `<path>.base` beside the target for manual resolution.
fn dump_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    if ctx.wc.is_in_memory() {
        return Err(MergeError::InMemoryConflict {
            paths: vec![ctx.local.path().to_owned()],
            reason: "the :dump tool",
        });
    }
    let path = ctx.local.path();
    if let Some(data) = ctx.local.data() {
        ctx.wc
            .write_destination(&format!("{path}.local"), data.as_slice(), ctx.local.flags())?;
    }
    match ctx.other.data() {
        Some(data) => ctx
            .wc
            .write_destination(&format!("{path}.other"), data.as_slice(), ctx.other.flags())?,
        None => {
            ctx.wc.remove_destination(&format!("{path}.other")).ok();
        }
    }
    if let Some(data) = ctx.ancestor.data() {
        ctx.wc.write_destination(
            &format!("{path}.base"),
            data.as_slice(),
            ctx.ancestor.flags(),
        )?;
    }
    Ok(StrategyOutcome {
        needcheck: false,
        status: 1,
        deleted: false,
    })
}

/// `:abort` -- runs `:merge` in memory; if conflicts remain, raises rather
/// than leaving markers. The inverse of every other strategy's in-memory
/// restriction: this one *requires* an in-memory working context.
fn abort_strategy(ctx: &StrategyContext) -> Result<StrategyOutcome, MergeError> {
    if !ctx.wc.is_in_memory() {
        return Err(MergeError::AbortRequiresInMemory);
    }
    let outcome = merge_strategy(ctx)?;
    if outcome.status != 0 {
        return Err(MergeError::AbortOnConflict);
    }
    Ok(outcome)
}

/// Shared precheck for `:merge`/`:union`/`:merge3`/`:merge-local`/
/// `:merge-other`: these internal text tools can never merge symlinks or
/// change/delete conflicts.
pub fn merge_precheck(ctx: &StrategyContext) -> bool {
    if ctx.symlink {
        ctx.cfg.warn(&format!(
            "internal {} cannot merge symlinks for {}",
            ctx.tool_name,
            ctx.local.path()
        ));
        return false;
    }
    if ctx.local.is_absent() || ctx.other.is_absent() {
        ctx.cfg.warn(&format!(
            "internal {} cannot merge change/delete conflict for {}",
            ctx.tool_name,
            ctx.local.path()
        ));
        return false;
    }
    true
}

const MERGE_CONFLICT_MESSAGE: &str =
    "conflicts while merging {path}! (edit, then use 'resolve --mark')";
const TAGMERGE_FAILURE_MESSAGE: &str = "automatic tag merging of {path} failed! (use 'resolve \
                                         --tool :merge' or another merge tool of your choice)";

/// Installs the built-in strategies under `name`, `:name`, and
/// `internal:name`. Called once at startup; the registry is immutable
/// thereafter.
pub fn load_internal_merge(registry: &mut ToolRegistry) {
    registry.register(ToolDescriptor {
        name: "prompt",
        merge_type: MergeType::NoMerge,
        strategy: prompt,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: None,
        on_failure_message: None,
    });
    registry.register(ToolDescriptor {
        name: "local",
        merge_type: MergeType::NoMerge,
        strategy: local_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: None,
        on_failure_message: None,
    });
    registry.register(ToolDescriptor {
        name: "other",
        merge_type: MergeType::NoMerge,
        strategy: other_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: None,
        on_failure_message: None,
    });
    registry.register(ToolDescriptor {
        name: "fail",
        merge_type: MergeType::NoMerge,
        strategy: fail_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: None,
        on_failure_message: None,
    });
    registry.register(ToolDescriptor {
        name: "merge",
        merge_type: MergeType::FullMerge,
        strategy: merge_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: Some(merge_precheck),
        on_failure_message: Some(MERGE_CONFLICT_MESSAGE),
    });
    registry.register(ToolDescriptor {
        name: "merge3",
        merge_type: MergeType::FullMerge,
        strategy: merge3_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: Some(merge_precheck),
        on_failure_message: Some(MERGE_CONFLICT_MESSAGE),
    });
    registry.register(ToolDescriptor {
        name: "union",
        merge_type: MergeType::FullMerge,
        strategy: union_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: Some(merge_precheck),
        on_failure_message: Some(MERGE_CONFLICT_MESSAGE),
    });
    registry.register(ToolDescriptor {
        name: "merge-local",
        merge_type: MergeType::MergeOnly,
        strategy: merge_local_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: Some(merge_precheck),
        on_failure_message: None,
    });
    registry.register(ToolDescriptor {
        name: "merge-other",
        merge_type: MergeType::MergeOnly,
        strategy: merge_other_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: Some(merge_precheck),
        on_failure_message: None,
    });
    registry.register(ToolDescriptor {
        name: "tagmerge",
        merge_type: MergeType::MergeOnly,
        strategy: tagmerge_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: None,
        on_failure_message: Some(TAGMERGE_FAILURE_MESSAGE),
    });
    registry.register(ToolDescriptor {
        name: "dump",
        merge_type: MergeType::FullMerge,
        strategy: dump_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: None,
        on_failure_message: None,
    });
    registry.register(ToolDescriptor {
        name: "forcedump",
        merge_type: MergeType::MergeOnly,
        strategy: dump_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: None,
        on_failure_message: None,
    });
    registry.register(ToolDescriptor {
        name: "abort",
        merge_type: MergeType::FullMerge,
        strategy: abort_strategy,
        handles_symlink: false,
        handles_binary: false,
        requires_gui: false,
        precheck: None,
        on_failure_message: None,
    });
}
