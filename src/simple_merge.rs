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

use bstr::BString;

/// The four dispositions the simple-merge primitive can be invoked with. See
/// `spec.md` §1: the line-oriented three-way text merge algorithm itself is
/// out of scope for this crate and is consumed as a library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimpleMergeMode {
    /// Leave conflict markers around unresolved hunks.
    Merge,
    /// Concatenate both sides at a conflicting hunk; never leaves markers.
    Union,
    /// Resolve every conflicting hunk in favor of the local side.
    LocalPick,
    /// Resolve every conflicting hunk in favor of the other side.
    OtherPick,
}

/// Result of one simple-merge invocation.
pub struct SimpleMergeResult {
    /// `0` on a clean merge, non-zero if conflict markers remain.
    pub status: i32,
    pub output: BString,
}

/// The line-oriented three-way textual merge primitive, consumed as an
/// external library per `spec.md` §1.
pub trait SimpleMerge {
    #[allow(clippy::too_many_arguments)]
    fn merge(
        &self,
        local: &[u8],
        ancestor: &[u8],
        other: &[u8],
        labels: &[String],
        mode: SimpleMergeMode,
        quiet: bool,
    ) -> SimpleMergeResult;
}
