use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Print a call result.
pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{value}"),
        OutputFormat::Pretty => println!("{}", pretty(value)),
        OutputFormat::Table => match value {
            Value::Object(fields) if !fields.is_empty() => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["FIELD", "VALUE"]);
                for (key, field) in fields {
                    table.add_row(vec![key.clone(), cell(field)]);
                }
                println!("{table}");
            }
            other => println!("{}", pretty(other)),
        },
        OutputFormat::Raw => match value {
            Value::String(text) => print_raw(text.as_bytes()),
            other => print_raw(other.to_string().as_bytes()),
        },
    }
}

/// Print the command table as `name -> wrapper` pairs.
pub fn print_methods(methods: &[&str], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", Value::from(methods.to_vec())),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "WRAPPER"]);
            for name in methods {
                table.add_row(vec![name.to_string(), wrapper_name(name)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for name in methods {
                println!("{name}");
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// `dev-rhash` -> `dev_rhash`
pub fn wrapper_name(command: &str) -> String {
    command.replace('-', "_")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
