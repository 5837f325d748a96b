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

use std::collections::HashMap;
use std::sync::Arc;

use super::internal::StrategyFn;

/// Whether premerge applies before a tool runs, and whether the tool itself
/// ever attempts a textual merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeType {
    /// Never attempts a merge: `prompt`, `local`, `other`, `fail`. The only
    /// kind that can resolve change/delete conflicts.
    NoMerge,
    /// Attempts a merge, but premerge never runs first.
    MergeOnly,
    /// Premerge runs first; the tool itself is a fallback.
    FullMerge,
}

/// One built-in merge strategy, keyed into the registry under its bare,
/// `:`-prefixed, and `internal:`-prefixed names.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub merge_type: MergeType,
    pub strategy: StrategyFn,
    /// Internal text-merge tools never handle symlinks directly.
    pub handles_symlink: bool,
    pub handles_binary: bool,
    pub requires_gui: bool,
    pub precheck: Option<super::internal::PrecheckFn>,
    pub on_failure_message: Option<&'static str>,
}

impl ToolDescriptor {
    /// Only `NoMerge` internal tools can resolve change/delete conflicts;
    /// see `spec.md` §4.2's `supportscd`.
    pub fn handles_changedelete(&self) -> bool {
        self.merge_type == MergeType::NoMerge
    }
}

/// Read-only after startup registration; holds only the built-in internal
/// strategies (external tools are resolved live from configuration, never
/// registered here).
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolDescriptor>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `descriptor` under its bare name, `:name`, and
    /// `internal:name`, per §9 ("internal name aliasing ... resolved at
    /// registry-write time").
    pub fn register(&mut self, descriptor: ToolDescriptor) {
        let descriptor = Arc::new(descriptor);
        let bare = descriptor.name.to_owned();
        self.tools.insert(bare.clone(), descriptor.clone());
        self.tools.insert(format!(":{bare}"), descriptor.clone());
        self.tools.insert(format!("internal:{bare}"), descriptor);
    }

    /// Normalizes an `internal:name` lookup key to `name` before searching,
    /// per §4.1.
    pub fn lookup(&self, name: &str) -> Option<&Arc<ToolDescriptor>> {
        let normalized = name.strip_prefix("internal:").unwrap_or(name);
        self.tools.get(normalized)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
