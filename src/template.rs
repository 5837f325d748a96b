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

use crate::file_version::ChangeContext;

/// Template rendering for conflict-marker labels, consumed as an external
/// collaborator per `spec.md` §1 and §9 ("Template facade for labels"). This
/// crate never parses or evaluates template expressions itself.
pub trait LabelTemplate {
    /// Renders the configured `ui.mergemarkertemplate` against `change_ctx`.
    fn render(&self, change_ctx: &ChangeContext, template: &str) -> String;
}

/// The default label text when no template is configured: just the node.
pub struct PlainLabelTemplate;

impl LabelTemplate for PlainLabelTemplate {
    fn render(&self, change_ctx: &ChangeContext, _template: &str) -> String {
        change_ctx.as_str().to_owned()
    }
}

/// Column budget for a conflict-marker line before the label prefix (e.g.
/// `<<<<<<< `), matching `_formatconflictmarker`'s `80 - 8`.
const MARKER_LINE_WIDTH: usize = 80;
const MARKER_PREFIX_WIDTH: usize = 8;

/// Formats one label for a conflict marker: `"<label>:"` left-padded to
/// `pad_width` columns, followed by the rendered template, truncated to a
/// single line and ellipsis-clipped to the marker column budget.
///
/// Grounded in `filemerge.py`'s `_formatconflictmarker`: this crate doesn't
/// reimplement template *rendering* (that's [`LabelTemplate`]'s job), only
/// the surrounding padding/truncation contract the markers need.
pub fn format_label(
    template_engine: &dyn LabelTemplate,
    change_ctx: &ChangeContext,
    template: &str,
    label: &str,
    pad_width: usize,
) -> String {
    let rendered = template_engine.render(change_ctx, template);
    let prefix = format!("{label}:");
    let padded_prefix = format!("{prefix:<width$}", width = pad_width + 1);
    let mark = format!("{padded_prefix} {rendered}");
    let first_line = mark.lines().next().unwrap_or("").to_owned();
    ellipsis(&first_line, MARKER_LINE_WIDTH - MARKER_PREFIX_WIDTH)
}

fn ellipsis(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_owned();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let keep = max_len - 3;
    let mut truncated: String = s.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

/// Formats the configured conflict-marker labels for a merge, padding each
/// to the width of the widest raw label. `labels` must have 2 or 3 entries
/// (local/other, optionally base).
pub fn format_labels(
    template_engine: &dyn LabelTemplate,
    template: &str,
    local_ctx: &ChangeContext,
    other_ctx: &ChangeContext,
    ancestor_ctx: &ChangeContext,
    labels: &[String],
) -> Vec<String> {
    let pad = labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut out = vec![
        format_label(template_engine, local_ctx, template, &labels[0], pad),
        format_label(template_engine, other_ctx, template, &labels[1], pad),
    ];
    if labels.len() > 2 {
        out.push(format_label(template_engine, ancestor_ctx, template, &labels[2], pad));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_and_truncates_single_line() {
        let tmpl = PlainLabelTemplate;
        let ctx = ChangeContext::new("abc123");
        let out = format_label(&tmpl, &ctx, "", "local", 7);
        assert_eq!(out, "local:   abc123");
    }

    #[test]
    fn keeps_only_first_line() {
        struct Multi;
        impl LabelTemplate for Multi {
            fn render(&self, _c: &ChangeContext, _t: &str) -> String {
                "first\nsecond".to_owned()
            }
        }
        let ctx = ChangeContext::new("x");
        let out = format_label(&Multi, &ctx, "", "other", 5);
        assert!(!out.contains('\n'));
        assert!(out.contains("first"));
    }

    #[test]
    fn ellipsis_clips_long_labels() {
        let long = "x".repeat(100);
        let clipped = ellipsis(&long, 72);
        assert_eq!(clipped.chars().count(), 72);
        assert!(clipped.ends_with("..."));
    }
}
