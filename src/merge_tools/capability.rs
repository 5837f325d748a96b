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

use crate::config_ui::ConfigUi;

use super::registry::ToolRegistry;

/// What a tool can handle, resolved either from the static
/// [`super::registry::ToolDescriptor`] (internal tools) or from live
/// configuration (external tools, which the registry never stores).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolCapabilities {
    pub symlink: bool,
    pub binary: bool,
    pub gui: bool,
    /// Only ever true for internal no-merge tools; external tools can never
    /// resolve a change/delete conflict on their own.
    pub changedelete: bool,
}

/// Resolves `tool_name`'s capabilities: the registry's static descriptor for
/// a built-in strategy, or `merge-tools.<tool>.{symlink,binary,gui}` for
/// anything external.
pub fn resolve_capabilities(
    tool_name: &str,
    registry: &ToolRegistry,
    cfg: &dyn ConfigUi,
) -> ToolCapabilities {
    if let Some(descriptor) = registry.lookup(tool_name) {
        return ToolCapabilities {
            symlink: descriptor.handles_symlink,
            binary: descriptor.handles_binary,
            gui: descriptor.requires_gui,
            changedelete: descriptor.handles_changedelete(),
        };
    }
    ToolCapabilities {
        symlink: cfg
            .cfg_bool(&["merge-tools", tool_name, "symlink"])
            .unwrap_or(false),
        binary: cfg
            .cfg_bool(&["merge-tools", tool_name, "binary"])
            .unwrap_or(false),
        gui: cfg.cfg_bool(&["merge-tools", tool_name, "gui"]).unwrap_or(false),
        changedelete: false,
    }
}

/// Checks whether `tool_name` can handle the conflict at hand, on the first
/// disqualifying mismatch. Mirrors `filemerge.py`'s `_check`.
///
/// `explicit` distinguishes a pattern-matched tool (the user named it for
/// this path) from a priority-pool candidate (the picker is scanning
/// automatically): the former warns, the latter only logs at debug level so
/// routine pool misses don't spam the user. A change/delete mismatch is
/// always silent either way -- it isn't a capability failure worth
/// reporting, just a tool that was never a candidate for this conflict kind.
#[allow(clippy::too_many_arguments)]
pub fn check(
    tool_name: &str,
    pattern: Option<&str>,
    caps: &ToolCapabilities,
    tool_exists: bool,
    symlink: bool,
    binary: bool,
    change_delete: bool,
    gui_available: bool,
    explicit: bool,
    cfg: &dyn ConfigUi,
) -> bool {
    let tmsg = match pattern {
        Some(pat) => format!("{tool_name} (for pattern {pat})"),
        None => tool_name.to_owned(),
    };
    let emit = |message: String| {
        if explicit {
            cfg.warn(&message);
        } else {
            cfg.debug(&message);
        }
    };
    if !tool_exists {
        emit(format!("couldn't find merge tool {tmsg}"));
        return false;
    }
    if symlink && !caps.symlink {
        emit(format!("tool {tmsg} can't handle symlinks"));
        return false;
    }
    if binary && !caps.binary {
        emit(format!("tool {tmsg} can't handle binary"));
        return false;
    }
    if change_delete && !caps.changedelete {
        return false;
    }
    if caps.gui && !gui_available {
        emit(format!("tool {tmsg} requires a GUI"));
        return false;
    }
    true
}
