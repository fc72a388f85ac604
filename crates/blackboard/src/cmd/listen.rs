use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use blackboard_parser::{Command, Message, MessageSink, ParserConfig, ParserEngine, Response};
use blackboard_transport::{PacketHandler, ServerConfig, TcpServer};
use blackboard_vars::{parse_variable_params, VariableValue, CREATE_VAR, READ_VAR, WRITE_VAR};
use tracing::{debug, info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

const MODULE_NAME: &str = "blackboard-cli";
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const REPLY_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ParserConfig {
        queue_capacity: args.queue_capacity,
        stop_timeout: args.stop_timeout,
        boundary_on_drain: !args.nul_only,
        ..ParserConfig::default()
    };

    let server_config = ServerConfig {
        write_timeout: Some(REPLY_WRITE_TIMEOUT),
        ..ServerConfig::default()
    };
    let server = TcpServer::bind_with_config(args.addr.as_str(), server_config)
        .map(Arc::new)
        .map_err(|err| transport_error("bind failed", err))?;
    let (tx, rx) = mpsc::channel();
    let engine = Arc::new(ParserEngine::with_config(
        Arc::new(ChannelSink { tx }),
        config,
    ));

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    let accept = {
        let server = Arc::clone(&server);
        let handler: Arc<dyn PacketHandler> = engine.clone();
        thread::Builder::new()
            .name("bb-accept".into())
            .spawn(move || server.serve(handler))
            .map_err(|err| CliError::new(INTERNAL, format!("accept thread failed: {err}")))?
    };

    let mut table = VariableTable::default();
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let message = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        print_message(&message, "-", format);

        if args.ack {
            if let Message::Command(command) = &message {
                reply(&server, command, table.handle(command));
            }
        }

        printed = printed.saturating_add(1);
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    server.shutdown();
    engine.stop();
    match accept.join() {
        Ok(Ok(())) => Ok(SUCCESS),
        Ok(Err(err)) => Err(transport_error("accept failed", err)),
        Err(_) => Err(CliError::new(INTERNAL, "accept thread panicked")),
    }
}

/// Forwards dispatched messages to the printing loop.
struct ChannelSink {
    tx: mpsc::Sender<Message>,
}

impl MessageSink for ChannelSink {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn on_command_received(&self, command: Command) {
        let _ = self.tx.send(Message::Command(command));
    }

    fn on_response_received(&self, response: Response) {
        let _ = self.tx.send(Message::Response(response));
    }
}

fn reply(server: &TcpServer, command: &Command, response: Response) {
    let Some(source) = &command.source else {
        return;
    };
    if let Err(err) = server.send_to(source.endpoint, &response.to_string()) {
        warn!(endpoint = %source.endpoint, error = %err, "failed to send reply");
    }
}

/// Shared variables written through `--ack`, keyed by name.
#[derive(Debug, Default)]
struct VariableTable {
    values: HashMap<String, VariableValue>,
}

impl VariableTable {
    /// Build the reply to `command`, applying variable commands.
    ///
    /// Commands other than the variable commands succeed with no payload.
    fn handle(&mut self, command: &Command) -> Response {
        let name = command.name.as_str();
        if ![WRITE_VAR, READ_VAR, CREATE_VAR].contains(&name) {
            return Response::from_command(command, true, "");
        }

        let params = match parse_variable_params(&command.params) {
            Ok(params) => params,
            Err(err) => return Response::from_command(command, false, err.to_string()),
        };

        match name {
            READ_VAR => match self.values.get(&params.name) {
                Some(value) if value.type_name() == params.type_name => {
                    match value.encode() {
                        Ok(data) => Response::from_command(command, true, data),
                        Err(err) => Response::from_command(command, false, err.to_string()),
                    }
                }
                Some(value) => Response::from_command(
                    command,
                    false,
                    format!("{} is {}", params.name, value.type_name()),
                ),
                None => Response::from_command(
                    command,
                    false,
                    format!("unknown variable {}", params.name),
                ),
            },
            CREATE_VAR if self.values.contains_key(&params.name) => Response::from_command(
                command,
                false,
                format!("variable {} already exists", params.name),
            ),
            WRITE_VAR if !self.values.contains_key(&params.name) => Response::from_command(
                command,
                false,
                format!("unknown variable {}", params.name),
            ),
            _ => match params.decode() {
                Ok(value) => {
                    debug!(variable = %params.name, kind = %value.kind(), "stored");
                    self.values.insert(params.name, value);
                    Response::from_command(command, true, "")
                }
                Err(err) => Response::from_command(command, false, err.to_string()),
            },
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        info!("interrupted, shutting down");
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
