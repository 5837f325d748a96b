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

use crate::file_version::FileVersion;

/// Tag-file merge, consumed as an external collaborator per `spec.md` §1.
/// The `:tagmerge` internal strategy delegates to this rather than
/// implementing tag-merging itself.
pub trait TagMerge {
    /// Returns `(needs_post_check, status)`.
    fn merge(&self, local: &FileVersion, other: &FileVersion, ancestor: &FileVersion) -> (bool, i32);
}
