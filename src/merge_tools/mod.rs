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

//! Tool selection, premerge, and conflict resolution for a single file's
//! three-way merge. See the crate root for the public entry points.

pub mod backup;
pub mod capability;
pub mod external;
pub mod internal;
pub mod picker;
pub mod postcheck;
pub mod premerge;
pub mod registry;
pub mod tempfiles;

use crate::config_ui::ConfigUi;
use crate::error::MergeError;
use crate::file_version::{FileVersion, NodeId};
use crate::host::{HostServices, WorkingContext};
use crate::simple_merge::SimpleMerge;
use crate::tag_merge::TagMerge;
use crate::template::LabelTemplate;

use internal::{StrategyContext, StrategyOutcome};
use registry::{MergeType, ToolRegistry};

/// One file's worth of three-way merge input.
pub struct MergeRequest<'a> {
    pub local: FileVersion,
    pub other: FileVersion,
    pub ancestor: FileVersion,
    /// The other side's original path, for rename detection in the status
    /// line (differs from `other.path()` only across a rename).
    pub original_path: String,
    pub my_node: NodeId,
    pub working_context: &'a dyn WorkingContext,
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub completed: bool,
    pub status: i32,
    pub deleted: bool,
}

/// Bundles every collaborator the orchestrator needs, the way `jj-cli`'s
/// `MergeEditor`/`DiffEditor` wrap a single `MergeTool` plus the ambient
/// config/UI it was resolved from.
pub struct FileMerger<'a> {
    pub cfg: &'a dyn ConfigUi,
    pub host: &'a dyn HostServices,
    pub registry: &'a ToolRegistry,
    pub simple_merge: &'a dyn SimpleMerge,
    pub tag_merge: &'a dyn TagMerge,
    pub label_template: &'a dyn LabelTemplate,
}

impl<'a> FileMerger<'a> {
    /// Equivalent to the orchestrator with the premerge flag set.
    pub fn premerge(&self, request: &MergeRequest) -> Result<MergeOutcome, MergeError> {
        self.run(true, request)
    }

    /// Orchestrator with the premerge flag cleared.
    pub fn filemerge(&self, request: &MergeRequest) -> Result<MergeOutcome, MergeError> {
        self.run(false, request)
    }

    fn run(&self, premerge_flag: bool, request: &MergeRequest) -> Result<MergeOutcome, MergeError> {
        if !request.other.cmp_differs(&request.local) {
            return Ok(MergeOutcome {
                completed: true,
                status: 0,
                deleted: false,
            });
        }

        let binary = request.local.is_binary() || request.other.is_binary() || request.ancestor.is_binary();
        let symlink = request.local.is_symlink() || request.other.is_symlink();
        let change_delete = request.local.is_absent() || request.other.is_absent();
        let wc = request.working_context;

        let picked = picker::pick_tool(
            self.registry,
            self.cfg,
            self.host,
            request.local.path(),
            binary,
            symlink,
            change_delete,
        );
        let tool_path = picked.tool_path.clone();
        let tool_name = picked
            .name
            .strip_prefix("internal:")
            .map(|bare| format!(":{bare}"))
            .unwrap_or(picked.name);
        self.cfg.debug(&format!(
            "picked tool '{tool_name}' for {} (binary {binary} symlink {symlink} changedelete \
             {change_delete})",
            request.local.path()
        ));

        let descriptor = self.registry.lookup(&tool_name).cloned();

        if let Some(descriptor) = &descriptor {
            if descriptor.merge_type == MergeType::NoMerge {
                let outcome = self.invoke_strategy(descriptor.strategy, request, &tool_name, binary, symlink, &[])?;
                return Ok(MergeOutcome {
                    completed: true,
                    status: outcome.status,
                    deleted: outcome.deleted,
                });
            }
        }

        if premerge_flag {
            let message = if request.original_path != request.other.path() {
                format!(
                    "merging {} and {} to {}",
                    request.original_path,
                    request.other.path(),
                    request.local.path()
                )
            } else {
                format!("merging {}", request.local.path())
            };
            self.cfg.status(&message);
        }

        if let Some(descriptor) = &descriptor {
            if let Some(precheck) = descriptor.precheck {
                let precheck_ctx = self.strategy_context(request, &tool_name, binary, symlink, &[]);
                if !precheck(&precheck_ctx) {
                    if let Some(msg) = descriptor.on_failure_message {
                        self.cfg.warn(&msg.replace("{path}", request.local.path()));
                    }
                    return Ok(MergeOutcome {
                        completed: true,
                        status: 1,
                        deleted: false,
                    });
                }
            }
        }

        let backup = backup::make_backup(self.host, wc, &request.local, premerge_flag)
            .map_err(MergeError::Io)?;

        let labels = self.format_labels(request);

        let merge_type = descriptor.as_ref().map(|d| d.merge_type).unwrap_or(MergeType::FullMerge);

        if premerge_flag && merge_type == MergeType::FullMerge {
            let status = premerge::run_premerge(
                self.cfg,
                wc,
                self.simple_merge,
                &tool_name,
                &request.local,
                &request.other,
                &request.ancestor,
                symlink,
                binary,
                &labels,
                backup.as_ref(),
            )?;
            if status == 0 {
                if let Some(backup) = &backup {
                    backup::discard(self.host, wc, backup).map_err(MergeError::Io)?;
                }
            }
            return Ok(MergeOutcome {
                completed: true,
                status,
                deleted: false,
            });
        }

        let (needcheck, mut status, deleted, on_failure_message) = match &descriptor {
            Some(descriptor) => {
                let outcome = self.invoke_strategy(descriptor.strategy, request, &tool_name, binary, symlink, &labels)?;
                (outcome.needcheck, outcome.status, outcome.deleted, descriptor.on_failure_message)
            }
            None => {
                let resolved_path = tool_path.clone().unwrap_or_else(|| tool_name.clone());
                let result = external::run_external(
                    self.host,
                    wc,
                    self.cfg,
                    &tool_name,
                    &resolved_path,
                    &request.local,
                    &request.other,
                    &request.ancestor,
                    &request.my_node,
                    backup.as_ref(),
                )?;
                (true, result.status, false, Some("merging {path} failed!"))
            }
        };

        if needcheck {
            let checkconflicts = self
                .cfg
                .cfg_bool(&["merge-tools", &tool_name, "checkconflicts"])
                .unwrap_or(false);
            let check_list = self.cfg.cfg_list(&["merge-tools", &tool_name, "check"]);
            let checkchanged = self
                .cfg
                .cfg_bool(&["merge-tools", &tool_name, "checkchanged"])
                .unwrap_or(false);
            let fixeol = self.cfg.cfg_bool(&["merge-tools", &tool_name, "fixeol"]).unwrap_or(false);
            let post_ctx = postcheck::PostCheckContext {
                cfg: self.cfg,
                wc,
                path: request.local.path(),
                flags: request.local.flags(),
                checkconflicts,
                check_list: &check_list,
                checkchanged,
                fixeol,
                binary,
            };
            status = postcheck::post_check(&post_ctx, status, backup.as_ref()).map_err(MergeError::Io)?;
        }

        if status != 0 {
            if wc.is_in_memory() {
                return Err(MergeError::InMemoryConflict {
                    paths: vec![request.local.path().to_owned()],
                    reason: "unresolved merge conflicts",
                });
            }
            if let Some(msg) = on_failure_message {
                self.cfg.warn(&msg.replace("{path}", request.local.path()));
            }
            match self
                .cfg
                .cfg_str(&["merge", "on-failure"])
                .as_deref()
                .unwrap_or("continue")
            {
                "halt" => return Err(MergeError::InterventionRequired),
                "prompt" => {
                    let answer = self.cfg.prompt_choice("continue with the next file?", &["Yes", "No"], 0);
                    if answer == Some(1) {
                        return Err(MergeError::InterventionRequired);
                    }
                }
                _ => {}
            }
        }

        if status == 0 {
            if let Some(backup) = &backup {
                backup::discard(self.host, wc, backup).map_err(MergeError::Io)?;
            }
        }

        Ok(MergeOutcome {
            completed: true,
            status,
            deleted,
        })
    }

    fn format_labels(&self, request: &MergeRequest) -> Vec<String> {
        let base_labels = request
            .labels
            .clone()
            .unwrap_or_else(|| vec!["local".to_owned(), "other".to_owned()]);
        if self.cfg.cfg_str(&["ui", "mergemarkers"]).as_deref() == Some("basic") {
            return base_labels;
        }
        let template = self.cfg.cfg_str(&["ui", "mergemarkertemplate"]).unwrap_or_default();
        crate::template::format_labels(
            self.label_template,
            &template,
            request.local.change_context(),
            request.other.change_context(),
            request.ancestor.change_context(),
            &base_labels,
        )
    }

    fn strategy_context<'b>(
        &'b self,
        request: &'b MergeRequest,
        tool_name: &'b str,
        binary: bool,
        symlink: bool,
        labels: &'b [String],
    ) -> StrategyContext<'b> {
        StrategyContext {
            cfg: self.cfg,
            host: self.host,
            wc: request.working_context,
            simple_merge: self.simple_merge,
            tag_merge: self.tag_merge,
            local: &request.local,
            other: &request.other,
            ancestor: &request.ancestor,
            tool_name,
            binary,
            symlink,
            labels,
        }
    }

    fn invoke_strategy(
        &self,
        strategy: internal::StrategyFn,
        request: &MergeRequest,
        tool_name: &str,
        binary: bool,
        symlink: bool,
        labels: &[String],
    ) -> Result<StrategyOutcome, MergeError> {
        let ctx = self.strategy_context(request, tool_name, binary, symlink, labels);
        strategy(&ctx)
    }
}
