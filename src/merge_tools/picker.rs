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

use std::path::PathBuf;

use regex::Regex;

use crate::config_ui::ConfigUi;
use crate::host::HostServices;

use super::capability::{check, resolve_capabilities};
use super::registry::{MergeType, ToolRegistry};

/// The legacy tool name `merge.on-failure` predates `ui.merge`/patterns;
/// still appended to the end of the priority pool for compatibility.
const LEGACY_TOOL_NAME: &str = "hgmerge";

pub struct PickedTool {
    pub name: String,
    /// `None` only for the final-fallback `:prompt`/`:merge` cases. Every
    /// other path resolves to *some* string -- a quoted executable path for
    /// a found external tool, or the bare tool name as a pass-through.
    pub tool_path: Option<String>,
}

/// Resolves which strategy applies to `path`, honoring (first match wins):
/// forced override, environment override, path-pattern map, priority-sorted
/// external tools, then the final `:prompt`/`:merge` fallback.
pub fn pick_tool(
    registry: &ToolRegistry,
    cfg: &dyn ConfigUi,
    host: &dyn HostServices,
    path: &str,
    binary: bool,
    symlink: bool,
    change_delete: bool,
) -> PickedTool {
    if let Some(tool) = cfg.cfg_str(&["ui", "forcemerge"]) {
        return resolve_override(registry, host, cfg, &tool, change_delete);
    }
    if let Some(value) = cfg.env_var("HGMERGE") {
        if change_delete && !tool_is_nomerge_internal(registry, &value) {
            return PickedTool {
                name: ":prompt".to_owned(),
                tool_path: None,
            };
        }
        return PickedTool {
            name: value.clone(),
            tool_path: Some(value),
        };
    }
    for (pattern, tool) in cfg.cfg_items(&["merge-patterns"]) {
        if !glob_match(&pattern, path, cfg) {
            continue;
        }
        let caps = resolve_capabilities(&tool, registry, cfg);
        let exists = tool_exists(registry, host, cfg, &tool);
        // Legacy semantics: the pattern map never treats a file as binary.
        if check(
            &tool,
            Some(&pattern),
            &caps,
            exists,
            symlink,
            false,
            change_delete,
            host.gui_available(),
            true,
            cfg,
        ) {
            return PickedTool {
                name: tool.clone(),
                tool_path: resolve_tool_path(registry, host, cfg, &tool).or(Some(tool)),
            };
        }
    }
    if let Some(picked) = pick_from_pool(registry, cfg, host, binary, symlink, change_delete) {
        return picked;
    }
    if symlink || binary {
        cfg.warn(&format!("no tool found to merge {path}"));
        return PickedTool {
            name: ":prompt".to_owned(),
            tool_path: None,
        };
    }
    if change_delete {
        return PickedTool {
            name: ":prompt".to_owned(),
            tool_path: None,
        };
    }
    PickedTool {
        name: ":merge".to_owned(),
        tool_path: None,
    }
}

fn resolve_override(
    registry: &ToolRegistry,
    host: &dyn HostServices,
    cfg: &dyn ConfigUi,
    name: &str,
    change_delete: bool,
) -> PickedTool {
    if change_delete && !tool_is_nomerge_internal(registry, name) {
        return PickedTool {
            name: ":prompt".to_owned(),
            tool_path: None,
        };
    }
    match resolve_tool_path(registry, host, cfg, name) {
        Some(path) => PickedTool {
            name: name.to_owned(),
            tool_path: Some(path),
        },
        None => PickedTool {
            name: name.to_owned(),
            tool_path: Some(name.to_owned()),
        },
    }
}

fn pick_from_pool(
    registry: &ToolRegistry,
    cfg: &dyn ConfigUi,
    host: &dyn HostServices,
    binary: bool,
    symlink: bool,
    change_delete: bool,
) -> Option<PickedTool> {
    let mut enabled: Vec<String> = cfg
        .cfg_items(&["merge-tools"])
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| !cfg.cfg_bool(&["merge-tools", name, "disabled"]).unwrap_or(false))
        .collect();

    // Stable sort: ties keep the configuration's declaration order.
    enabled.sort_by_key(|name| {
        let priority = cfg
            .cfg_str(&["merge-tools", name, "priority"])
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0);
        std::cmp::Reverse(priority)
    });

    if let Some(ui_merge) = cfg.cfg_str(&["ui", "merge"]) {
        let known = tool_exists(registry, host, cfg, &ui_merge);
        if known || !change_delete {
            enabled.retain(|name| name != &ui_merge);
            enabled.insert(0, ui_merge);
        }
    }
    enabled.push(LEGACY_TOOL_NAME.to_owned());

    for name in enabled {
        let caps = resolve_capabilities(&name, registry, cfg);
        let exists = tool_exists(registry, host, cfg, &name);
        if check(
            &name,
            None,
            &caps,
            exists,
            symlink,
            binary,
            change_delete,
            host.gui_available(),
            false,
            cfg,
        ) {
            let tool_path = resolve_tool_path(registry, host, cfg, &name);
            return Some(PickedTool { name, tool_path });
        }
    }
    None
}

fn tool_is_nomerge_internal(registry: &ToolRegistry, name: &str) -> bool {
    registry
        .lookup(name)
        .map(|d| d.merge_type == MergeType::NoMerge)
        .unwrap_or(false)
}

/// Internal strategies have no executable; external tools are probed via
/// registry keys, then the configured (or bare) `executable` name on `PATH`.
fn find_executable_path(host: &dyn HostServices, cfg: &dyn ConfigUi, name: &str) -> Option<PathBuf> {
    let value_name = cfg
        .cfg_str(&["merge-tools", name, "regname"])
        .unwrap_or_default();
    for key_attr in ["regkey", "regkeyalt"] {
        if let Some(regkey) = cfg.cfg_str(&["merge-tools", name, key_attr]) {
            if let Some(path) = host.lookup_registry(&regkey, &value_name) {
                return Some(path);
            }
        }
    }
    let executable = cfg
        .cfg_str(&["merge-tools", name, "executable"])
        .unwrap_or_else(|| name.to_owned());
    host.find_executable(&executable)
}

fn tool_exists(registry: &ToolRegistry, host: &dyn HostServices, cfg: &dyn ConfigUi, name: &str) -> bool {
    registry.contains(name) || find_executable_path(host, cfg, name).is_some()
}

fn resolve_tool_path(
    registry: &ToolRegistry,
    host: &dyn HostServices,
    cfg: &dyn ConfigUi,
    name: &str,
) -> Option<String> {
    if registry.contains(name) {
        return None;
    }
    find_executable_path(host, cfg, name).map(|p| format!("\"{}\"", p.display()))
}

/// Translates a shell glob into a regex pattern, fnmatch-style: `[seq]`
/// and `[!seq]` become bracket expressions instead of being escaped away,
/// so a pattern like `*.[ch]` keeps its character-class meaning.
fn glob_to_regex_pattern(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let n = chars.len();
    let mut pattern = String::from("^");
    let mut i = 0;
    while i < n {
        let c = chars[i];
        i += 1;
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            '[' => {
                let mut j = i;
                if j < n && (chars[j] == '!' || chars[j] == ']') {
                    j += 1;
                }
                while j < n && chars[j] != ']' {
                    j += 1;
                }
                if j >= n {
                    // Unterminated class -- treat the bracket literally.
                    pattern.push_str("\\[");
                } else {
                    let mut stuff: String = chars[i..j].iter().collect();
                    if let Some(rest) = stuff.strip_prefix('!') {
                        stuff = format!("^{rest}");
                    } else if let Some(rest) = stuff.strip_prefix('^') {
                        stuff = format!("\\^{rest}");
                    }
                    pattern.push('[');
                    pattern.push_str(&stuff.replace('\\', "\\\\"));
                    pattern.push(']');
                    i = j + 1;
                }
            }
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '\\' | '{' | '}' => {
                pattern.push('\\');
                pattern.push(c);
            }
            other => pattern.push(other),
        }
    }
    pattern.push('$');
    pattern
}

fn glob_match(glob: &str, path: &str, cfg: &dyn ConfigUi) -> bool {
    match Regex::new(&glob_to_regex_pattern(glob)) {
        Ok(re) => re.is_match(path),
        Err(_) => {
            cfg.warn(&format!("invalid merge-patterns glob '{glob}', ignoring"));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge_tools::internal::load_internal_merge;
    use crate::test_support::FakeConfigUi;
    use crate::test_support::FakeHost;

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        load_internal_merge(&mut r);
        r
    }

    #[test]
    fn forced_override_beats_pattern_and_pool() {
        let reg = registry();
        let mut cfg = FakeConfigUi::default();
        cfg.strings.insert(vec!["ui".into(), "forcemerge".into()], ":local".into());
        cfg.strings
            .insert(vec!["merge-patterns".into(), "*.txt".into()], ":other".into());
        let host = FakeHost::default();
        let picked = pick_tool(&reg, &cfg, &host, "a.txt", false, false, false);
        assert_eq!(picked.name, ":local");
    }

    #[test]
    fn env_override_beats_pattern() {
        let reg = registry();
        let mut cfg = FakeConfigUi::default();
        cfg.env.insert("HGMERGE".into(), ":other".into());
        cfg.strings
            .insert(vec!["merge-patterns".into(), "*.txt".into()], ":local".into());
        let host = FakeHost::default();
        let picked = pick_tool(&reg, &cfg, &host, "a.txt", false, false, false);
        assert_eq!(picked.name, ":other");
    }

    #[test]
    fn pattern_beats_pool() {
        let reg = registry();
        let mut cfg = FakeConfigUi::default();
        cfg.strings
            .insert(vec!["merge-patterns".into(), "*.txt".into()], ":other".into());
        cfg.strings.insert(
            vec!["merge-tools".into(), "meld".into(), "priority".into()],
            "100".into(),
        );
        let host = FakeHost::default();
        let picked = pick_tool(&reg, &cfg, &host, "a.txt", false, false, false);
        assert_eq!(picked.name, ":other");
    }

    #[test]
    fn pool_picks_highest_priority_external_tool() {
        let reg = registry();
        let mut cfg = FakeConfigUi::default();
        cfg.strings.insert(
            vec!["merge-tools".into(), "low".into(), "priority".into()],
            "1".into(),
        );
        cfg.strings.insert(
            vec!["merge-tools".into(), "high".into(), "priority".into()],
            "10".into(),
        );
        cfg.items.insert(
            vec!["merge-tools".into()],
            vec![("low".into(), String::new()), ("high".into(), String::new())],
        );
        let mut host = FakeHost::default();
        host.executables.insert("low".into(), PathBuf::from("/bin/low"));
        host.executables.insert("high".into(), PathBuf::from("/bin/high"));
        let picked = pick_tool(&reg, &cfg, &host, "a.txt", false, false, false);
        assert_eq!(picked.name, "high");
    }

    #[test]
    fn final_fallback_is_merge_for_plain_text() {
        let reg = registry();
        let cfg = FakeConfigUi::default();
        let host = FakeHost::default();
        let picked = pick_tool(&reg, &cfg, &host, "a.txt", false, false, false);
        assert_eq!(picked.name, ":merge");
    }

    #[test]
    fn final_fallback_is_prompt_for_binary() {
        let reg = registry();
        let cfg = FakeConfigUi::default();
        let host = FakeHost::default();
        let picked = pick_tool(&reg, &cfg, &host, "a.bin", true, false, false);
        assert_eq!(picked.name, ":prompt");
        assert!(cfg.warnings.borrow()[0].contains("no tool found to merge"));
    }

    #[test]
    fn final_fallback_is_prompt_for_changedelete_without_warning() {
        let reg = registry();
        let cfg = FakeConfigUi::default();
        let host = FakeHost::default();
        let picked = pick_tool(&reg, &cfg, &host, "a.txt", false, false, true);
        assert_eq!(picked.name, ":prompt");
        assert!(cfg.warnings.borrow().is_empty());
    }

    #[test]
    fn glob_star_matches_extension() {
        let cfg = FakeConfigUi::default();
        assert!(glob_match("*.txt", "dir/a.txt", &cfg));
        assert!(!glob_match("*.txt", "dir/a.rs", &cfg));
    }

    #[test]
    fn glob_bracket_class_matches_either_extension() {
        let cfg = FakeConfigUi::default();
        assert!(glob_match("*.[ch]", "a.c", &cfg));
        assert!(glob_match("*.[ch]", "a.h", &cfg));
        assert!(!glob_match("*.[ch]", "a.rs", &cfg));
    }

    #[test]
    fn glob_negated_bracket_class_excludes_members() {
        let cfg = FakeConfigUi::default();
        assert!(!glob_match("*.[!ch]", "a.c", &cfg));
        assert!(glob_match("*.[!ch]", "a.rs", &cfg));
    }

    #[test]
    fn glob_unterminated_bracket_falls_back_to_literal() {
        let cfg = FakeConfigUi::default();
        assert!(glob_match("a[b", "a[b", &cfg));
        assert!(cfg.warnings.borrow().is_empty());
    }
}
