// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde_json::Value;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// `export NAME='value'`, safe for multi-line values.
pub fn shell_export(name: &str, value: &str) -> String {
    format!("export {}='{}'", name, value.replace('\'', r"'\''"))
}

/// One `name: value` line per entry; strings print bare, everything else
/// as compact JSON.
pub fn format_values(values: &BTreeMap<String, Value>) -> String {
    let width = values.keys().map(String::len).max().unwrap_or(0);
    values
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let label = format!("{:width$}", format!("{name}:"), width = width + 1);
            format!("{} {}", crate::color::context(&label), rendered)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_values(values: &BTreeMap<String, Value>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", format_values(values)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(values)?),
    }
    Ok(())
}

/// Print text that may or may not end in a newline, ending in exactly one.
pub fn print_document(text: &str) {
    println!("{}", text.trim_end_matches('\n'));
}
