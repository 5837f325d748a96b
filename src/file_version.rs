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

use std::fmt;

use bstr::BString;

/// Identifies the commit a [`FileVersion`] was drawn from.
///
/// Opaque from this crate's point of view beyond equality and a string
/// rendering: the host produces it, and the core only ever compares it
/// (change/delete detection) or renders it (the `HG_OTHER_NODE` /
/// `HG_BASE_NODE` style environment variables the external driver sets).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChangeContext(String);

impl ChangeContext {
    pub fn new(repr: impl Into<String>) -> Self {
        Self(repr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The node (commit) id a merge was started from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn hex(&self) -> &str {
        &self.0
    }

    /// The short form used in `HG_MY_NODE`.
    pub fn short_hex(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One side of a three-way merge.
///
/// Modeled as a sum type (present vs. absent) rather than a shared interface
/// with null-returning methods, so `is_absent` becomes pattern matching
/// instead of a boolean flag callers can forget to check.
#[derive(Clone, Debug)]
pub enum FileVersion {
    Present(PresentFile),
    Absent(AbsentFile),
}

#[derive(Clone, Debug)]
pub struct PresentFile {
    pub path: String,
    /// `"l"` denotes a symlink, matching the host's flag encoding.
    pub flags: String,
    pub is_binary: bool,
    pub data: BString,
    pub change_context: ChangeContext,
}

#[derive(Clone, Debug)]
pub struct AbsentFile {
    pub path: String,
    pub change_context: ChangeContext,
}

impl FileVersion {
    pub fn present(
        path: impl Into<String>,
        flags: impl Into<String>,
        is_binary: bool,
        data: impl Into<BString>,
        change_context: ChangeContext,
    ) -> Self {
        FileVersion::Present(PresentFile {
            path: path.into(),
            flags: flags.into(),
            is_binary,
            data: data.into(),
            change_context,
        })
    }

    pub fn absent(path: impl Into<String>, change_context: ChangeContext) -> Self {
        FileVersion::Absent(AbsentFile {
            path: path.into(),
            change_context,
        })
    }

    pub fn path(&self) -> &str {
        match self {
            FileVersion::Present(p) => &p.path,
            FileVersion::Absent(a) => &a.path,
        }
    }

    pub fn flags(&self) -> &str {
        match self {
            FileVersion::Present(p) => &p.flags,
            FileVersion::Absent(_) => "",
        }
    }

    pub fn is_symlink(&self) -> bool {
        self.flags().contains('l')
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, FileVersion::Present(p) if p.is_binary)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FileVersion::Absent(_))
    }

    pub fn data(&self) -> Option<&BString> {
        match self {
            FileVersion::Present(p) => Some(&p.data),
            FileVersion::Absent(_) => None,
        }
    }

    pub fn change_context(&self) -> &ChangeContext {
        match self {
            FileVersion::Present(p) => &p.change_context,
            FileVersion::Absent(a) => &a.change_context,
        }
    }

    /// True iff `self`'s content differs from `other`'s.
    ///
    /// Two absent files compare equal (no difference) iff they share both
    /// change context and path; an absent file always differs from a
    /// present one.
    pub fn cmp_differs(&self, other: &FileVersion) -> bool {
        match (self, other) {
            (FileVersion::Absent(a), FileVersion::Absent(b)) => {
                !(a.change_context == b.change_context && a.path == b.path)
            }
            (FileVersion::Absent(_), FileVersion::Present(_))
            | (FileVersion::Present(_), FileVersion::Absent(_)) => true,
            (FileVersion::Present(a), FileVersion::Present(b)) => a.data != b.data,
        }
    }
}
