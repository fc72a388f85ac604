use blackboard_parser::{Message, ParserError};
use blackboard_transport::TcpConnection;
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{parser_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = args.wait_timeout;
    let outgoing = parse_outgoing(&args.text)?;

    let mut connection = TcpConnection::connect_timeout(&args.addr, timeout)
        .map_err(|err| transport_error("connect failed", err))?;
    connection
        .send_text(&outgoing.to_string())
        .map_err(|err| transport_error("send failed", err))?;
    debug!(endpoint = %connection.endpoint(), message = %outgoing, "sent");

    if args.wait {
        connection
            .set_read_timeout(Some(timeout))
            .map_err(|err| transport_error("configure failed", err))?;
        let text = connection
            .read_message()
            .map_err(|err| transport_error("receive failed", err))?;
        let reply = Message::try_parse(&text)
            .ok_or_else(|| CliError::new(DATA_INVALID, format!("unparseable reply: {text:?}")))?;
        print_message(&reply, &connection.endpoint().to_string(), format);
    }

    let _ = connection.close();
    Ok(SUCCESS)
}

/// The message to send, normalized through the wire grammar.
fn parse_outgoing(text: &str) -> CliResult<Message> {
    Message::try_parse(text)
        .ok_or_else(|| parser_error("invalid message", ParserError::InvalidCommand(text.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn outgoing_text_is_normalized() {
        let message = parse_outgoing("  read_var \"long count\"   @3 ").unwrap();
        assert_eq!(message.to_string(), "read_var \"long count\" @3");
    }

    #[test]
    fn responses_can_be_sent() {
        let message = parse_outgoing("PING \"pong\" 1").unwrap();
        assert!(matches!(message, Message::Response(_)));
    }

    #[test]
    fn invalid_text_is_a_usage_error() {
        let err = parse_outgoing("9lives").unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
