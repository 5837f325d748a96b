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

/// Configuration and interactive-UI facade.
///
/// Mirrors the handful of operations `filemerge.py` pulls off its `ui`
/// object: typed config lookups, environment access, a choice prompt, and
/// three output channels distinguished by urgency (warning/status/debug).
/// `note` is the quiet variant used for messages that are only interesting
/// when a tool was *not* explicitly requested (see the Capability Filter).
///
/// Config keys are addressed by path segments (`&["merge-tools", "meld",
/// "priority"]`) rather than a single dotted string, the way
/// `ConfigNamePathBuf` addresses jj's config tree -- tool names may
/// themselves contain dots or spaces (`[merge-tools."foo bar"]`), so naive
/// string concatenation would be ambiguous.
pub trait ConfigUi {
    fn cfg_str(&self, path: &[&str]) -> Option<String>;
    fn cfg_bool(&self, path: &[&str]) -> Option<bool>;
    fn cfg_list(&self, path: &[&str]) -> Vec<String>;

    /// All `key = value` pairs directly under the table at `path` (e.g.
    /// every `merge-patterns.*` entry), in declaration order. Declaration
    /// order is load-bearing: it's the tie-break for equal-priority tools
    /// and the match order for patterns.
    fn cfg_items(&self, path: &[&str]) -> Vec<(String, String)>;

    fn env_var(&self, name: &str) -> Option<String>;

    /// Prompts with a default choice index. Returns `None` when the host
    /// cannot prompt (non-interactive), matching `error.ResponseExpected`
    /// in the original implementation -- callers fall back to treating the
    /// file as unresolved rather than erroring.
    fn prompt_choice(&self, message: &str, choices: &[&str], default: usize) -> Option<usize>;

    fn warn(&self, message: &str);
    fn status(&self, message: &str);
    fn note(&self, message: &str);
    fn debug(&self, message: &str);
}
