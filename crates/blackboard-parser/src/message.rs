//! Command and Response messages and the sink they are dispatched to.
//!
//! Grammar:
//!
//! ```text
//! command  := name [params] [@id]
//! response := name "params" (0|1) [@id]
//! params   := "quoted text" | bare text to end of message
//! ```
//!
//! A response always carries quoted parameters and a success flag, so any
//! text parsing as a response is tried as one before falling back to a
//! command.

use std::fmt;
use std::str::FromStr;

use blackboard_transport::Endpoint;

use crate::error::ParserError;

/// Where a dispatched message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSource {
    /// Name of the module (connection manager) that received the message.
    pub module: String,
    /// The remote peer that sent it.
    pub endpoint: Endpoint,
}

/// A request sent to a blackboard module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub params: String,
    pub id: Option<u32>,
    /// Set by the parsing task before dispatch.
    pub source: Option<MessageSource>,
}

/// A reply to a [`Command`], correlated by name and id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub name: String,
    pub params: String,
    pub success: bool,
    pub id: Option<u32>,
    /// Set by the parsing task before dispatch.
    pub source: Option<MessageSource>,
}

/// Either message kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Command(Command),
    Response(Response),
}

/// Receives messages assembled by the parsing tasks.
///
/// Methods are called from the per-endpoint worker threads.
pub trait MessageSink: Send + Sync {
    /// Module name stamped into every dispatched message's source.
    fn name(&self) -> &str;

    fn on_command_received(&self, command: Command);

    fn on_response_received(&self, response: Response);
}

impl Command {
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            id: None,
            source: None,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Parse `text` as a command.
    pub fn try_parse(text: &str) -> Option<Self> {
        let (name, rest) = split_name(text.trim())?;
        let (body, id) = split_id(rest.trim());
        let params = if body.starts_with('"') {
            unquote(body)?
        } else {
            body.to_string()
        };
        Some(Self {
            name: name.to_string(),
            params,
            id,
            source: None,
        })
    }
}

impl Response {
    pub fn new(name: impl Into<String>, params: impl Into<String>, success: bool) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            success,
            id: None,
            source: None,
        }
    }

    /// Build the reply to `command`, keeping its name and id.
    pub fn from_command(command: &Command, success: bool, params: impl Into<String>) -> Self {
        Self {
            name: command.name.clone(),
            params: params.into(),
            success,
            id: command.id,
            source: None,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Whether this response answers `command`.
    pub fn correlates(&self, command: &Command) -> bool {
        self.name == command.name && self.id == command.id
    }

    /// Parse `text` as a response.
    pub fn try_parse(text: &str) -> Option<Self> {
        let (name, rest) = split_name(text.trim())?;
        let rest = rest.trim_start();
        let end = closing_quote(rest)?;
        let params = unquote(&rest[..=end])?;

        let mut tokens = rest[end + 1..].split_whitespace();
        let success = match tokens.next()? {
            "1" => true,
            "0" => false,
            _ => return None,
        };
        let id = match tokens.next() {
            Some(token) => Some(parse_id(token)?),
            None => None,
        };
        if tokens.next().is_some() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            params,
            success,
            id,
            source: None,
        })
    }
}

impl Message {
    /// Parse as a response first, then as a command.
    pub fn try_parse(text: &str) -> Option<Self> {
        if let Some(response) = Response::try_parse(text) {
            return Some(Message::Response(response));
        }
        Command::try_parse(text).map(Message::Command)
    }

    pub fn name(&self) -> &str {
        match self {
            Message::Command(command) => &command.name,
            Message::Response(response) => &response.name,
        }
    }

    pub fn source(&self) -> Option<&MessageSource> {
        match self {
            Message::Command(command) => command.source.as_ref(),
            Message::Response(response) => response.source.as_ref(),
        }
    }

    pub fn set_source(&mut self, source: MessageSource) {
        match self {
            Message::Command(command) => command.source = Some(source),
            Message::Response(response) => response.source = Some(source),
        }
    }
}

impl FromStr for Command {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| ParserError::InvalidCommand(s.to_string()))
    }
}

impl FromStr for Response {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| ParserError::InvalidResponse(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            write!(f, " {}", quote(&self.params))?;
        }
        if let Some(id) = self.id {
            write!(f, " @{id}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name,
            quote(&self.params),
            u8::from(self.success)
        )?;
        if let Some(id) = self.id {
            write!(f, " @{id}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Command(command) => command.fmt(f),
            Message::Response(response) => response.fmt(f),
        }
    }
}

fn split_name(text: &str) -> Option<(&str, &str)> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    let (name, rest) = text.split_at(end);
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((name, rest))
}

fn split_id(text: &str) -> (&str, Option<u32>) {
    let (head, last) = match text.rfind(char::is_whitespace) {
        Some(pos) => {
            let width = text[pos..].chars().next().map_or(1, char::len_utf8);
            (&text[..pos], &text[pos + width..])
        }
        None => ("", text),
    };
    match parse_id(last) {
        Some(id) => (head.trim_end(), Some(id)),
        None => (text, None),
    }
}

fn parse_id(token: &str) -> Option<u32> {
    let digits = token.strip_prefix('@')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Byte index of the quote closing the string that opens `text`.
fn closing_quote(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }
    let mut escaped = false;
    for (i, c) in chars {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Strip the quotes of a string spanning all of `text` and resolve escapes.
fn unquote(text: &str) -> Option<String> {
    let end = closing_quote(text)?;
    if end + 1 != text.len() {
        return None;
    }
    let mut out = String::with_capacity(end);
    let mut escaped = false;
    for c in text[1..end].chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
