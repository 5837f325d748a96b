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

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::config_ui::ConfigUi;
use crate::host::WorkingContext;

use super::backup::Backup;

/// Flags any line that looks like a conflict marker left behind by a
/// full-merge attempt.
static CONFLICT_MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(<<<<<<< .*|=======|>>>>>>> .*)$").unwrap());

fn eol_type(data: &[u8]) -> Option<&'static [u8]> {
    if data.contains(&0) {
        return None;
    }
    if data.windows(2).any(|w| w == b"\r\n") {
        return Some(b"\r\n");
    }
    if data.contains(&b'\r') {
        return Some(b"\r");
    }
    if data.contains(&b'\n') {
        return Some(b"\n");
    }
    None
}

fn replace_all_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(from) {
            result.extend_from_slice(to);
            i += from.len();
        } else {
            result.push(haystack[i]);
            i += 1;
        }
    }
    result
}

/// Converts `text` to the same EOL convention as `origtext`.
fn match_eol(text: &[u8], origtext: &[u8]) -> Vec<u8> {
    let text_eol = eol_type(text);
    let orig_eol = eol_type(origtext);
    if text_eol == orig_eol {
        return text.to_vec();
    }
    let nl: &[u8] = if orig_eol == Some(&b"\r\n"[..]) {
        b"\r\n"
    } else if orig_eol == Some(&b"\r"[..]) {
        b"\r"
    } else {
        b"\n"
    };
    let normalized = if text_eol == Some(&b"\r\n"[..]) {
        replace_all_bytes(text, b"\r\n", b"\n")
    } else if text_eol == Some(&b"\r"[..]) {
        replace_all_bytes(text, b"\r", b"\n")
    } else {
        text.to_vec()
    };
    replace_all_bytes(&normalized, b"\n", nl)
}

pub struct PostCheckContext<'a> {
    pub cfg: &'a dyn ConfigUi,
    pub wc: &'a dyn WorkingContext,
    pub path: &'a str,
    pub flags: &'a str,
    pub checkconflicts: bool,
    pub check_list: &'a [String],
    pub checkchanged: bool,
    pub fixeol: bool,
    pub binary: bool,
}

/// Runs after a completed full-merge/merge-only strategy: conflict-marker
/// scan, an optional success prompt, unchanged-output detection, and EOL
/// normalization. Returns the (possibly forced-to-1) status.
pub fn post_check(ctx: &PostCheckContext, status: i32, backup: Option<&Backup>) -> std::io::Result<i32> {
    let mut r = status;
    let mut prompted = false;

    if ctx.checkconflicts || ctx.check_list.iter().any(|c| c == "conflicts") {
        let data = ctx.wc.read_destination(ctx.path)?;
        if CONFLICT_MARKER_REGEX.is_match(&data) {
            r = 1;
        }
    }

    if ctx.check_list.iter().any(|c| c == "prompt") {
        let message = format!("was merge of '{}' successful?", ctx.path);
        if ctx.cfg.prompt_choice(&message, &["Yes", "No"], 0) == Some(1) {
            r = 1;
        }
        prompted = true;
    }

    if !prompted && r == 0 && ctx.checkchanged {
        if let Some(backup) = backup {
            let data = ctx.wc.read_destination(ctx.path)?;
            if data == backup.content {
                let message = "output file appears unchanged, was merge successful?";
                if ctx.cfg.prompt_choice(message, &["Yes", "No"], 0) == Some(1) {
                    r = 1;
                }
            }
        }
    }

    if ctx.fixeol && !ctx.binary {
        if let Some(backup) = backup {
            let data = ctx.wc.read_destination(ctx.path)?;
            let fixed = match_eol(&data, &backup.content);
            if fixed != data {
                ctx.wc.write_destination(ctx.path, &fixed, ctx.flags)?;
            }
        }
    }

    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostServices;
    use crate::test_support::{FakeConfigUi, FakeWorkingContext};

    fn backup_with(content: &[u8]) -> Backup {
        // `Backup` is only ever built through `make_backup`; exercise that
        // path directly so these tests don't need its private fields.
        let host = crate::test_support::FakeHost::default();
        let wc = FakeWorkingContext::default();
        host.write_file(&wc.working_path("a.txt"), content).unwrap();
        let dest = crate::test_support::present("a.txt", std::str::from_utf8(content).unwrap());
        crate::merge_tools::backup::make_backup(&host, &wc, &dest, true)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn conflict_scan_forces_status_to_one() {
        let cfg = FakeConfigUi::default();
        let wc = FakeWorkingContext::default();
        wc.write_destination("a.txt", b"<<<<<<< local\nL\n=======\nO\n>>>>>>> other\n", "")
            .unwrap();
        let ctx = PostCheckContext {
            cfg: &cfg,
            wc: &wc,
            path: "a.txt",
            flags: "",
            checkconflicts: true,
            check_list: &[],
            checkchanged: false,
            fixeol: false,
            binary: false,
        };
        let r = post_check(&ctx, 0, None).unwrap();
        assert_eq!(r, 1);
    }

    #[test]
    fn clean_file_never_matches_conflict_regex() {
        let cfg = FakeConfigUi::default();
        let wc = FakeWorkingContext::default();
        wc.write_destination("a.txt", b"A\nB\nC\n", "").unwrap();
        let ctx = PostCheckContext {
            cfg: &cfg,
            wc: &wc,
            path: "a.txt",
            flags: "",
            checkconflicts: true,
            check_list: &[],
            checkchanged: false,
            fixeol: false,
            binary: false,
        };
        let r = post_check(&ctx, 0, None).unwrap();
        assert_eq!(r, 0);
    }

    #[test]
    fn unchanged_output_prompts_when_checkchanged_set() {
        let mut cfg = FakeConfigUi::default();
        *cfg.next_choice.borrow_mut() = Some(1); // "No"
        let wc = FakeWorkingContext::default();
        wc.write_destination("a.txt", b"same\n", "").unwrap();
        let backup = backup_with(b"same\n");
        let ctx = PostCheckContext {
            cfg: &cfg,
            wc: &wc,
            path: "a.txt",
            flags: "",
            checkconflicts: false,
            check_list: &[],
            checkchanged: true,
            fixeol: false,
            binary: false,
        };
        let r = post_check(&ctx, 0, Some(&backup)).unwrap();
        assert_eq!(r, 1);
    }

    #[test]
    fn fixeol_normalizes_to_backup_style() {
        let cfg = FakeConfigUi::default();
        let wc = FakeWorkingContext::default();
        wc.write_destination("a.txt", b"A\nB\n", "").unwrap();
        let backup = backup_with(b"A\r\nB\r\n");
        let ctx = PostCheckContext {
            cfg: &cfg,
            wc: &wc,
            path: "a.txt",
            flags: "",
            checkconflicts: false,
            check_list: &[],
            checkchanged: false,
            fixeol: true,
            binary: false,
        };
        post_check(&ctx, 0, Some(&backup)).unwrap();
        assert_eq!(wc.read_destination("a.txt").unwrap(), b"A\r\nB\r\n");
    }

    #[test]
    fn match_eol_leaves_matching_style_untouched() {
        assert_eq!(match_eol(b"A\nB\n", b"C\nD\n"), b"A\nB\n");
    }
}
