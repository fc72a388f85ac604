use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod codec;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept connections and print every parsed message.
    Listen(ListenArgs),
    /// Send one Command or Response to a blackboard module.
    Send(SendArgs),
    /// Decode a shared-variable value and print its normalized encoding.
    Codec(CodecArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Codec(args) => codec::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (e.g. 127.0.0.1:2300).
    pub addr: String,
    /// Reply to every command with a response. Variable commands are
    /// served from an in-memory table.
    #[arg(long)]
    pub ack: bool,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Packets buffered per endpoint before the reader blocks.
    #[arg(long, default_value = "64")]
    pub queue_capacity: usize,
    /// Time allowed for each parsing worker to stop (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub stop_timeout: Duration,
    /// Only a NUL terminator ends a message; packet boundaries do not.
    #[arg(long)]
    pub nul_only: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address of the module to connect to.
    pub addr: String,
    /// Message text, e.g. `read_var "long count" @1`.
    pub text: String,
    /// Wait for one reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Connect timeout, and reply timeout when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub wait_timeout: Duration,
}

#[derive(Args, Debug)]
pub struct CodecArgs {
    /// Variable type name (byte[], double[], long, long[], matrix, mime,
    /// string, var, vector).
    #[arg(value_name = "TYPE")]
    pub type_name: String,
    /// Encoded value text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Clap value parser for `500ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let (digits, unit): (&str, fn(u64) -> Duration) = match input.strip_suffix("ms") {
        Some(digits) => (digits, Duration::from_millis),
        None => (input.strip_suffix('s').unwrap_or(input), Duration::from_secs),
    };

    match digits.parse::<u64>() {
        Ok(0) => Err("duration must be greater than zero".to_string()),
        Ok(value) => Ok(unit(value)),
        Err(_) => Err(format!("expected e.g. 500ms or 2s, got {input:?}")),
    }
}
