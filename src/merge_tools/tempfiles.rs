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
use crate::host::HostServices;

/// Temp files created for an external tool invocation. Named
/// `<basename>~base.<ext>` / `<basename>~other.<ext>` in the OS temp area;
/// the caller unlinks both unconditionally once the tool exits.
pub struct TempPair {
    pub base_path: PathBuf,
    pub other_path: PathBuf,
}

fn split_basename_ext(path: &str) -> (&str, &str) {
    let filename = path.rsplit('/').next().unwrap_or(path);
    match filename.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base, ext),
        _ => (filename, ""),
    }
}

/// Writes `other` and `ancestor`'s content to uniquely named temp files for
/// an external tool that can't read them directly from the repository.
pub fn make_temp_pair(
    host: &dyn HostServices,
    other: &FileVersion,
    ancestor: &FileVersion,
) -> std::io::Result<TempPair> {
    let (basename, ext) = split_basename_ext(other.path());
    let suffix = if ext.is_empty() { String::new() } else { format!(".{ext}") };
    let empty: &[u8] = &[];
    let other_data = other.data().map(|d| d.as_slice()).unwrap_or(empty);
    let ancestor_data = ancestor.data().map(|d| d.as_slice()).unwrap_or(empty);

    let other_path = host.write_temp_file(&format!("{basename}~other~"), &suffix, other_data)?;
    let base_path = host.write_temp_file(&format!("{basename}~base~"), &suffix, ancestor_data)?;
    Ok(TempPair { base_path, other_path })
}
