use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use blackboard_parser::Message;
use blackboard_vars::VariableValue;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    kind: &'static str,
    name: &'a str,
    params: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<&'a str>,
    endpoint: String,
    timestamp: String,
}

impl<'a> MessageOutput<'a> {
    fn new(message: &'a Message, fallback_endpoint: &str) -> Self {
        let (kind, params, success, id) = match message {
            Message::Command(c) => ("command", c.params.as_str(), None, c.id),
            Message::Response(r) => ("response", r.params.as_str(), Some(r.success), r.id),
        };
        let source = message.source();
        Self {
            kind,
            name: message.name(),
            params,
            success,
            id,
            module: source.map(|s| s.module.as_str()),
            endpoint: source.map_or_else(
                || fallback_endpoint.to_string(),
                |s| s.endpoint.to_string(),
            ),
            timestamp: now_unix_seconds(),
        }
    }
}

/// Print one message. `fallback_endpoint` is shown when the message carries
/// no source.
pub fn print_message(message: &Message, fallback_endpoint: &str, format: OutputFormat) {
    let out = MessageOutput::new(message, fallback_endpoint);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "NAME", "ID", "OK", "ENDPOINT", "PARAMS"])
                .add_row(vec![
                    out.kind.to_string(),
                    out.name.to_string(),
                    out.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                    out.success.map_or_else(|| "-".to_string(), |ok| ok.to_string()),
                    out.endpoint.clone(),
                    out.params.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut line = format!("{} {} from={}", out.kind, out.name, out.endpoint);
            if let Some(id) = out.id {
                line.push_str(&format!(" id={id}"));
            }
            if let Some(ok) = out.success {
                line.push_str(&format!(" success={ok}"));
            }
            println!("{line} params={:?}", out.params);
        }
        OutputFormat::Raw => println!("{message}"),
    }
}

#[derive(Serialize)]
struct ValueOutput<'a> {
    type_name: &'static str,
    is_array: bool,
    length: usize,
    encoded: &'a str,
}

/// Print a decoded shared-variable value and its normalized encoding.
pub fn print_value(value: &VariableValue, encoded: &str, format: OutputFormat) {
    let kind = value.kind();
    let out = ValueOutput {
        type_name: kind.type_name(),
        is_array: kind.is_array(),
        length: value.len(),
        encoded,
    };
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "ARRAY", "LENGTH", "ENCODED"])
                .add_row(vec![
                    out.type_name.to_string(),
                    out.is_array.to_string(),
                    out.length.to_string(),
                    out.encoded.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} array={} length={} encoded={:?}",
                out.type_name, out.is_array, out.length, out.encoded
            );
        }
        OutputFormat::Raw => println!("{encoded}"),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
