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

use crate::file_version::FileVersion;
use crate::host::{HostServices, WorkingContext};

/// A content snapshot of the destination, taken before premerge writes over
/// it. `in_memory` is true when the backup itself had to be routed through
/// the working context's overlay rather than the host filesystem.
pub struct Backup {
    pub physical_path: PathBuf,
    pub content: Vec<u8>,
    in_memory: bool,
}

fn repo_relative_backup_path(wc: &dyn WorkingContext, backup_path: &std::path::Path) -> Option<String> {
    if !wc.is_in_memory() {
        return None;
    }
    backup_path
        .strip_prefix(wc.repo_root())
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

/// Snapshots `destination` before a full-merge attempt. Writes only happen
/// when `premerge_flag` is true; a later call with `premerge_flag = false`
/// just re-reads the existing snapshot so the caller can still restore or
/// discard it. `filemerge()` can be called on its own, without a preceding
/// `premerge()` pass -- in that case there is no snapshot yet, and a missing
/// one is not an error, just `Ok(None)`.
pub fn make_backup(
    host: &dyn HostServices,
    wc: &dyn WorkingContext,
    destination: &FileVersion,
    premerge_flag: bool,
) -> std::io::Result<Option<Backup>> {
    if destination.is_absent() {
        return Ok(None);
    }
    let working_path = wc.working_path(destination.path());
    let backup_path = host.orig_path(&working_path);
    let relative = repo_relative_backup_path(wc, &backup_path);

    if premerge_flag {
        if let Some(rel) = &relative {
            let content = destination.data().map(|d| d.to_vec()).unwrap_or_default();
            wc.write_destination(rel, &content, destination.flags())?;
            return Ok(Some(Backup {
                physical_path: backup_path,
                content,
                in_memory: true,
            }));
        }
        if wc.is_in_memory() {
            let content = destination.data().map(|d| d.to_vec()).unwrap_or_default();
            host.write_file(&backup_path, &content)?;
        } else {
            host.copy_file(&working_path, &backup_path)?;
        }
        let content = host.read_file(&backup_path)?;
        return Ok(Some(Backup {
            physical_path: backup_path,
            content,
            in_memory: false,
        }));
    }

    let read_result = match &relative {
        Some(rel) => wc.read_destination(rel),
        None => host.read_file(&backup_path),
    };
    match read_result {
        Ok(content) => Ok(Some(Backup {
            physical_path: backup_path,
            content,
            in_memory: relative.is_some(),
        })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Rewrites `destination` from `backup`, preserving `destination`'s current
/// flags (the content reverts; the mode bit doesn't need to).
pub fn restore(
    wc: &dyn WorkingContext,
    destination: &FileVersion,
    backup: &Backup,
) -> std::io::Result<()> {
    wc.write_destination(destination.path(), &backup.content, destination.flags())
}

/// Removes the backup file. Only called on a clean merge.
pub fn discard(host: &dyn HostServices, wc: &dyn WorkingContext, backup: &Backup) -> std::io::Result<()> {
    if backup.in_memory {
        if let Ok(rel) = backup.physical_path.strip_prefix(wc.repo_root()) {
            return wc.remove_destination(&rel.to_string_lossy());
        }
    }
    host.remove_file(&backup.physical_path)
}
