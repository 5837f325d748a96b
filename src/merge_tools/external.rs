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
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::config_ui::ConfigUi;
use crate::error::{ExternalToolError, MergeError};
use crate::file_version::{FileVersion, NodeId};
use crate::host::{HostServices, WorkingContext};

use super::backup::Backup;
use super::tempfiles::make_temp_pair;

/// Matches `$name` placeholders in an `args` template. Compiled once and
/// shared across invocations, the way `jj-cli`'s merge-tool config resolves
/// its own `$left`/`$right`/`$output` interpolation.
static VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\w+)").unwrap());

#[derive(Debug)]
pub struct ExternalResult {
    pub status: i32,
}

fn find_variables(template: &str) -> Vec<String> {
    VARIABLE_REGEX
        .captures_iter(template)
        .map(|c| c[1].to_owned())
        .collect()
}

fn interpolate_variables(template: &str, vars: &HashMap<String, String>) -> String {
    VARIABLE_REGEX
        .replace_all(template, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

fn quote_path(path: &Path) -> String {
    let rendered = path.display().to_string();
    if rendered.contains(' ') {
        format!("\"{rendered}\"")
    } else {
        rendered
    }
}

/// Splits a substituted args template into argv, honoring double quotes
/// around paths that contained spaces. No shell is ever invoked.
fn shell_split(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in s.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Runs a configured external merge tool. Rejects in-memory working
/// contexts outright -- there is no process to hand an overlay file to.
#[allow(clippy::too_many_arguments)]
pub fn run_external(
    host: &dyn HostServices,
    wc: &dyn WorkingContext,
    cfg: &dyn ConfigUi,
    tool_name: &str,
    tool_path: &str,
    local: &FileVersion,
    other: &FileVersion,
    ancestor: &FileVersion,
    my_node: &NodeId,
    backup: Option<&Backup>,
) -> Result<ExternalResult, MergeError> {
    if wc.is_in_memory() {
        return Err(ExternalToolError::InMemory.into());
    }

    let pair = make_temp_pair(host, other, ancestor).map_err(ExternalToolError::SetUpTemp)?;
    let local_path = wc.working_path(local.path());

    let args_template = cfg
        .cfg_str(&["merge-tools", tool_name, "args"])
        .unwrap_or_else(|| "$local $base $other".to_owned());
    let has_output = find_variables(&args_template).iter().any(|v| v == "output");

    // Without an explicit $output, the tool is expected to overwrite $local
    // in place; with one, $local becomes the pristine backup and the tool's
    // output is redirected back to the real destination. The backup only
    // has to exist for the $output case -- it's the only one that reads it.
    let input_path: PathBuf = if has_output {
        backup
            .ok_or_else(|| ExternalToolError::NotFound(tool_name.to_owned()))?
            .physical_path
            .clone()
    } else {
        local_path.clone()
    };

    let mut vars = HashMap::new();
    vars.insert("local".to_owned(), quote_path(&input_path));
    vars.insert("base".to_owned(), quote_path(&pair.base_path));
    vars.insert("other".to_owned(), quote_path(&pair.other_path));
    vars.insert("output".to_owned(), quote_path(&local_path));

    let substituted = interpolate_variables(&args_template, &vars);
    let args = shell_split(&substituted);

    let mut env = HashMap::new();
    env.insert("HG_FILE".to_owned(), local.path().to_owned());
    env.insert("HG_MY_NODE".to_owned(), my_node.short_hex().to_owned());
    env.insert("HG_OTHER_NODE".to_owned(), other.change_context().to_string());
    env.insert("HG_BASE_NODE".to_owned(), ancestor.change_context().to_string());
    env.insert("HG_MY_ISLINK".to_owned(), local.is_symlink().to_string());
    env.insert("HG_OTHER_ISLINK".to_owned(), other.is_symlink().to_string());
    env.insert("HG_BASE_ISLINK".to_owned(), ancestor.is_symlink().to_string());

    let result = host.run_command(tool_path, &args, wc.repo_root(), &env);

    host.unlink_best_effort(&pair.base_path);
    host.unlink_best_effort(&pair.other_path);

    let status = result.map_err(|source| ExternalToolError::FailedToExecute {
        tool_binary: tool_path.to_owned(),
        source,
    })?;
    Ok(ExternalResult {
        status: exit_code(&status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{present, FakeConfigUi, FakeHost, FakeWorkingContext};

    fn node() -> NodeId {
        NodeId::new("0123456789abcdef")
    }

    #[test]
    fn rejects_in_memory_working_context() {
        let host = FakeHost::default();
        let wc = FakeWorkingContext::in_memory();
        let cfg = FakeConfigUi::default();
        let local = present("a.txt", "L\n");
        let other = present("a.txt", "O\n");
        let ancestor = present("a.txt", "A\n");
        let backup = super::super::backup::make_backup(&host, &wc, &local, true)
            .unwrap()
            .unwrap();
        let err = run_external(
            &host, &wc, &cfg, "meld", "/usr/bin/meld", &local, &other, &ancestor, &node(), Some(&backup),
        )
        .unwrap_err();
        assert_matches::assert_matches!(err, MergeError::ExternalTool(ExternalToolError::InMemory));
    }

    #[test]
    fn default_args_template_overwrites_local_in_place() {
        let host = FakeHost::default();
        let wc = FakeWorkingContext::default();
        let cfg = FakeConfigUi::default();
        let local = present("a.txt", "L\n");
        let other = present("a.txt", "O\n");
        let ancestor = present("a.txt", "A\n");
        host.write_file(&wc.working_path("a.txt"), b"L\n").unwrap();
        let backup = super::super::backup::make_backup(&host, &wc, &local, true)
            .unwrap()
            .unwrap();

        run_external(
            &host, &wc, &cfg, "meld", "/usr/bin/meld", &local, &other, &ancestor, &node(), Some(&backup),
        )
        .unwrap();

        let commands = host.commands.borrow();
        let (_, args) = &commands[0];
        assert!(args[0].ends_with("a.txt"));
    }

    #[test]
    fn output_variable_redirects_input_to_backup() {
        let host = FakeHost::default();
        let wc = FakeWorkingContext::default();
        let mut cfg = FakeConfigUi::default();
        cfg.strings.insert(
            vec!["merge-tools".into(), "meld".into(), "args".into()],
            "-o $output $local $base $other".into(),
        );
        let local = present("a.txt", "L\n");
        let other = present("a.txt", "O\n");
        let ancestor = present("a.txt", "A\n");
        host.write_file(&wc.working_path("a.txt"), b"L\n").unwrap();
        let backup = super::super::backup::make_backup(&host, &wc, &local, true)
            .unwrap()
            .unwrap();

        run_external(
            &host, &wc, &cfg, "meld", "/usr/bin/meld", &local, &other, &ancestor, &node(), Some(&backup),
        )
        .unwrap();

        let commands = host.commands.borrow();
        let (_, args) = &commands[0];
        assert_eq!(args[0], "-o");
        assert!(args[1].ends_with("a.txt"));
        assert!(args[2].contains(".orig"));
    }

    #[test]
    fn temp_files_are_unlinked_after_the_command_runs() {
        let host = FakeHost::default();
        let wc = FakeWorkingContext::default();
        let cfg = FakeConfigUi::default();
        let local = present("a.txt", "L\n");
        let other = present("a.txt", "O\n");
        let ancestor = present("a.txt", "A\n");
        host.write_file(&wc.working_path("a.txt"), b"L\n").unwrap();
        let backup = super::super::backup::make_backup(&host, &wc, &local, true)
            .unwrap()
            .unwrap();

        run_external(
            &host, &wc, &cfg, "meld", "/usr/bin/meld", &local, &other, &ancestor, &node(), Some(&backup),
        )
        .unwrap();

        assert!(host.files.borrow().keys().all(|p| !p.to_string_lossy().contains("~other~")));
    }

    #[test]
    fn default_args_template_runs_without_a_backup() {
        let host = FakeHost::default();
        let wc = FakeWorkingContext::default();
        let cfg = FakeConfigUi::default();
        let local = present("a.txt", "L\n");
        let other = present("a.txt", "O\n");
        let ancestor = present("a.txt", "A\n");
        host.write_file(&wc.working_path("a.txt"), b"L\n").unwrap();

        run_external(
            &host, &wc, &cfg, "meld", "/usr/bin/meld", &local, &other, &ancestor, &node(), None,
        )
        .unwrap();

        assert_eq!(host.commands.borrow().len(), 1);
    }

    #[test]
    fn output_variable_without_a_backup_fails() {
        let host = FakeHost::default();
        let wc = FakeWorkingContext::default();
        let mut cfg = FakeConfigUi::default();
        cfg.strings.insert(
            vec!["merge-tools".into(), "meld".into(), "args".into()],
            "-o $output $local $base $other".into(),
        );
        let local = present("a.txt", "L\n");
        let other = present("a.txt", "O\n");
        let ancestor = present("a.txt", "A\n");
        host.write_file(&wc.working_path("a.txt"), b"L\n").unwrap();

        let err = run_external(
            &host, &wc, &cfg, "meld", "/usr/bin/meld", &local, &other, &ancestor, &node(), None,
        )
        .unwrap_err();
        assert_matches::assert_matches!(err, MergeError::ExternalTool(ExternalToolError::NotFound(_)));
    }

    #[test]
    fn interpolate_variables_leaves_unknown_placeholders_untouched() {
        let mut vars = HashMap::new();
        vars.insert("local".to_owned(), "/tmp/l".to_owned());
        let out = interpolate_variables("$local $weird", &vars);
        assert_eq!(out, "/tmp/l $weird");
    }
}
