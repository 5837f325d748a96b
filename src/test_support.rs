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

//! Shared test doubles for `merge_tools` unit tests. Not part of the public
//! API; compiled only under `#[cfg(test)]`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::config_ui::ConfigUi;
use crate::file_version::{ChangeContext, FileVersion};
use crate::host::{HostServices, WorkingContext};
use crate::simple_merge::{SimpleMerge, SimpleMergeMode, SimpleMergeResult};
use crate::tag_merge::TagMerge;

pub fn ctx_id(s: &str) -> ChangeContext {
    ChangeContext::new(s)
}

pub fn present(path: &str, data: &str) -> FileVersion {
    FileVersion::present(path, "", false, data, ctx_id("c"))
}

#[derive(Default)]
pub struct FakeConfigUi {
    pub strings: HashMap<Vec<String>, String>,
    pub bools: HashMap<Vec<String>, bool>,
    pub lists: HashMap<Vec<String>, Vec<String>>,
    pub items: HashMap<Vec<String>, Vec<(String, String)>>,
    pub env: HashMap<String, String>,
    pub next_choice: RefCell<Option<usize>>,
    pub warnings: RefCell<Vec<String>>,
    pub statuses: RefCell<Vec<String>>,
    pub notes: RefCell<Vec<String>>,
    pub debugs: RefCell<Vec<String>>,
}

fn key(path: &[&str]) -> Vec<String> {
    path.iter().map(|s| s.to_string()).collect()
}

impl ConfigUi for FakeConfigUi {
    fn cfg_str(&self, path: &[&str]) -> Option<String> {
        self.strings.get(&key(path)).cloned()
    }

    fn cfg_bool(&self, path: &[&str]) -> Option<bool> {
        self.bools.get(&key(path)).copied()
    }

    fn cfg_list(&self, path: &[&str]) -> Vec<String> {
        self.lists.get(&key(path)).cloned().unwrap_or_default()
    }

    fn cfg_items(&self, path: &[&str]) -> Vec<(String, String)> {
        self.items.get(&key(path)).cloned().unwrap_or_default()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn prompt_choice(&self, _message: &str, _choices: &[&str], _default: usize) -> Option<usize> {
        self.next_choice.borrow_mut().take()
    }

    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_owned());
    }

    fn status(&self, message: &str) {
        self.statuses.borrow_mut().push(message.to_owned());
    }

    fn note(&self, message: &str) {
        self.notes.borrow_mut().push(message.to_owned());
    }

    fn debug(&self, message: &str) {
        self.debugs.borrow_mut().push(message.to_owned());
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub executables: HashMap<String, PathBuf>,
    pub registry: HashMap<(String, String), PathBuf>,
    pub files: RefCell<HashMap<PathBuf, Vec<u8>>>,
    pub temp_counter: RefCell<u32>,
    pub commands: RefCell<Vec<(String, Vec<String>)>>,
}

impl HostServices for FakeHost {
    fn gui_available(&self) -> bool {
        false
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.executables.get(name).cloned()
    }

    fn lookup_registry(&self, key: &str, value_name: &str) -> Option<PathBuf> {
        self.registry
            .get(&(key.to_owned(), value_name.to_owned()))
            .cloned()
    }

    fn orig_path(&self, working_path: &Path) -> PathBuf {
        let mut s = working_path.as_os_str().to_owned();
        s.push(".orig");
        PathBuf::from(s)
    }

    fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        self.files.borrow_mut().insert(path.to_owned(), data.to_vec());
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> std::io::Result<()> {
        let data = self.read_file(src)?;
        self.write_file(dst, &data)
    }

    fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        self.files.borrow_mut().remove(path);
        Ok(())
    }

    fn write_temp_file(&self, prefix: &str, suffix: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        let mut counter = self.temp_counter.borrow_mut();
        *counter += 1;
        let path = PathBuf::from(format!("/tmp/{prefix}{counter}{suffix}"));
        self.write_file(&path, data)?;
        Ok(path)
    }

    fn unlink_best_effort(&self, path: &Path) {
        let _ = self.remove_file(path);
    }

    fn run_command(
        &self,
        program: &str,
        args: &[String],
        _cwd: &Path,
        _env: &HashMap<String, String>,
    ) -> std::io::Result<ExitStatus> {
        self.commands
            .borrow_mut()
            .push((program.to_owned(), args.to_vec()));
        exit_status_ok()
    }
}

#[cfg(unix)]
fn exit_status_ok() -> std::io::Result<ExitStatus> {
    use std::os::unix::process::ExitStatusExt;
    Ok(ExitStatus::from_raw(0))
}

#[cfg(not(unix))]
fn exit_status_ok() -> std::io::Result<ExitStatus> {
    std::process::Command::new("cmd")
        .arg("/C")
        .arg("exit 0")
        .status()
}

pub struct FakeWorkingContext {
    in_memory: bool,
    pub destinations: RefCell<HashMap<String, (Vec<u8>, String)>>,
}

impl Default for FakeWorkingContext {
    fn default() -> Self {
        Self {
            in_memory: false,
            destinations: RefCell::new(HashMap::new()),
        }
    }
}

impl FakeWorkingContext {
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            destinations: RefCell::new(HashMap::new()),
        }
    }
}

impl WorkingContext for FakeWorkingContext {
    fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    fn repo_root(&self) -> &Path {
        Path::new("/repo")
    }

    fn working_path(&self, repo_relative_path: &str) -> PathBuf {
        Path::new("/repo").join(repo_relative_path)
    }

    fn write_destination(&self, repo_relative_path: &str, data: &[u8], flags: &str) -> std::io::Result<()> {
        self.destinations
            .borrow_mut()
            .insert(repo_relative_path.to_owned(), (data.to_vec(), flags.to_owned()));
        Ok(())
    }

    fn remove_destination(&self, repo_relative_path: &str) -> std::io::Result<()> {
        self.destinations.borrow_mut().remove(repo_relative_path);
        Ok(())
    }

    fn read_destination(&self, repo_relative_path: &str) -> std::io::Result<Vec<u8>> {
        self.destinations
            .borrow()
            .get(repo_relative_path)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no such destination"))
    }
}

pub struct PanicSimpleMerge;

impl SimpleMerge for PanicSimpleMerge {
    fn merge(
        &self,
        _local: &[u8],
        _ancestor: &[u8],
        _other: &[u8],
        _labels: &[String],
        _mode: SimpleMergeMode,
        _quiet: bool,
    ) -> SimpleMergeResult {
        panic!("simple merge should not have been invoked")
    }
}

#[derive(Default)]
pub struct RecordingSimpleMerge {
    pub last_labels: RefCell<Option<Vec<String>>>,
}

impl SimpleMerge for RecordingSimpleMerge {
    fn merge(
        &self,
        local: &[u8],
        _ancestor: &[u8],
        _other: &[u8],
        labels: &[String],
        _mode: SimpleMergeMode,
        _quiet: bool,
    ) -> SimpleMergeResult {
        *self.last_labels.borrow_mut() = Some(labels.to_vec());
        SimpleMergeResult {
            status: 0,
            output: local.into(),
        }
    }
}

pub struct PanicTagMerge;

impl TagMerge for PanicTagMerge {
    fn merge(&self, _local: &FileVersion, _other: &FileVersion, _ancestor: &FileVersion) -> (bool, i32) {
        panic!("tag merge should not have been invoked")
    }
}
