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

use std::io::{self, IsTerminal as _, Write as _};

use toml_edit::{DocumentMut, Item, TomlError, Value};

use crate::config_ui::ConfigUi;

/// [`ConfigUi`] backed by a single parsed TOML document, the same crate
/// (`toml_edit`) the teacher uses for its own layered configuration. Unlike
/// a plain `HashMap`-backed config reader, `toml_edit` preserves the file's
/// declaration order, which the Tool Picker and pattern map both depend on.
pub struct TomlConfigUi {
    doc: DocumentMut,
    interactive: bool,
}

impl TomlConfigUi {
    pub fn parse(text: &str) -> Result<Self, TomlError> {
        Ok(Self {
            doc: text.parse::<DocumentMut>()?,
            interactive: io::stdin().is_terminal(),
        })
    }

    pub fn empty() -> Self {
        Self {
            doc: DocumentMut::new(),
            interactive: io::stdin().is_terminal(),
        }
    }

    fn navigate(&self, path: &[&str]) -> Option<&Item> {
        let mut iter = path.iter();
        let mut item = self.doc.get(iter.next()?)?;
        for segment in iter {
            item = item.as_table_like()?.get(segment)?;
        }
        Some(item)
    }
}

fn item_to_plain_string(item: &Item) -> Option<String> {
    let value = item.as_value()?;
    Some(match value {
        Value::String(s) => s.value().to_owned(),
        Value::Integer(i) => i.value().to_string(),
        Value::Float(f) => f.value().to_string(),
        Value::Boolean(b) => b.value().to_string(),
        Value::Datetime(d) => d.value().to_string(),
        Value::Array(_) | Value::InlineTable(_) => return None,
    })
}

impl ConfigUi for TomlConfigUi {
    fn cfg_str(&self, path: &[&str]) -> Option<String> {
        item_to_plain_string(self.navigate(path)?)
    }

    fn cfg_bool(&self, path: &[&str]) -> Option<bool> {
        self.navigate(path)?.as_bool()
    }

    fn cfg_list(&self, path: &[&str]) -> Vec<String> {
        let Some(item) = self.navigate(path) else {
            return Vec::new();
        };
        if let Some(arr) = item.as_array() {
            return arr
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
        }
        item.as_str().map(|s| vec![s.to_owned()]).unwrap_or_default()
    }

    fn cfg_items(&self, path: &[&str]) -> Vec<(String, String)> {
        let Some(item) = self.navigate(path) else {
            return Vec::new();
        };
        let Some(table) = item.as_table_like() else {
            return Vec::new();
        };
        // Subtables (e.g. each `merge-tools.<tool>`) come back with an empty
        // value: callers that only need the key order (the Tool Picker's
        // pool-membership scan) still see every entry.
        table
            .iter()
            .map(|(k, v)| (k.to_owned(), item_to_plain_string(v).unwrap_or_default()))
            .collect()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn prompt_choice(&self, message: &str, choices: &[&str], default: usize) -> Option<usize> {
        if !self.interactive {
            return None;
        }
        print!("{message} [{}] ", choices.join("/"));
        io::stdout().flush().ok();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return None;
        }
        let answer = line.trim();
        if answer.is_empty() {
            return Some(default);
        }
        choices
            .iter()
            .position(|c| c.eq_ignore_ascii_case(answer))
            .or(Some(default))
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn status(&self, message: &str) {
        println!("{message}");
    }

    fn note(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }
}
