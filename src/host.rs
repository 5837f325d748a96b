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

/// Low-level physical I/O, process execution, and temp-file creation.
///
/// This crate never touches the filesystem except through this trait (for
/// backups, temp files, and external-tool invocation) and [`WorkingContext`]
/// (for the destination file itself). A host embeds this crate by providing
/// one implementation backed by its own working-copy and process layers.
pub trait HostServices {
    fn gui_available(&self) -> bool;

    /// Resolves `name` to an absolute executable path via platform `PATH`
    /// expansion.
    fn find_executable(&self, name: &str) -> Option<PathBuf>;

    /// Windows registry probe for `merge-tools.<tool>.regkey`/`regkeyalt`.
    /// Returns `None` unconditionally on platforms without a registry.
    fn lookup_registry(&self, key: &str, value_name: &str) -> Option<PathBuf>;

    /// Computes the backup ("orig") path for a working-copy file, per the
    /// host's naming policy (e.g. appending `.orig`).
    fn orig_path(&self, working_path: &Path) -> PathBuf;

    fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> std::io::Result<()>;
    fn copy_file(&self, src: &Path, dst: &Path) -> std::io::Result<()>;
    fn remove_file(&self, path: &Path) -> std::io::Result<()>;

    /// Creates a uniquely named temp file with the given prefix/suffix,
    /// writes `data` into it, and returns its path.
    fn write_temp_file(
        &self,
        prefix: &str,
        suffix: &str,
        data: &[u8],
    ) -> std::io::Result<PathBuf>;

    /// Removes a path created by [`Self::write_temp_file`], ignoring errors
    /// (temp files are cleaned up unconditionally on all exit paths).
    fn unlink_best_effort(&self, path: &Path);

    fn run_command(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> std::io::Result<ExitStatus>;
}

/// The working tree a merge is performed against.
///
/// An on-disk checkout supports everything; an in-memory overlay rejects
/// external tools, interactive prompts, and `:dump` (the premerge driver and
/// internal non-interactive strategies still work against it).
pub trait WorkingContext {
    fn is_in_memory(&self) -> bool;
    fn repo_root(&self) -> &Path;

    /// The absolute on-disk path a repo-relative path would have, used to
    /// build temp-file names and to pass to external tools. Even for an
    /// in-memory context this is a stable path (it need not exist on disk).
    fn working_path(&self, repo_relative_path: &str) -> PathBuf;

    fn write_destination(
        &self,
        repo_relative_path: &str,
        data: &[u8],
        flags: &str,
    ) -> std::io::Result<()>;
    fn remove_destination(&self, repo_relative_path: &str) -> std::io::Result<()>;
    fn read_destination(&self, repo_relative_path: &str) -> std::io::Result<Vec<u8>>;
}
