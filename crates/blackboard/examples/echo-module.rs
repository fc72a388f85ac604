//! Minimal blackboard module: answers every command with its own params.
//!
//! Run with:
//!   cargo run --example echo-module
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:2300 'PING "hello" @1' --wait

use std::sync::Arc;

use blackboard::parser::{Command, MessageSink, ParserEngine, Response};
use blackboard::transport::TcpServer;

struct EchoModule {
    server: Arc<TcpServer>,
}

impl MessageSink for EchoModule {
    fn name(&self) -> &str {
        "echo"
    }

    fn on_command_received(&self, command: Command) {
        let Some(source) = &command.source else {
            return;
        };
        eprintln!("{} -> {command}", source.endpoint);
        let reply = Response::from_command(&command, true, command.params.clone());
        if let Err(err) = self.server.send_to(source.endpoint, &reply.to_string()) {
            eprintln!("reply failed: {err}");
        }
    }

    fn on_response_received(&self, response: Response) {
        eprintln!("ignoring response {response}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server = Arc::new(TcpServer::bind("127.0.0.1:2300")?);
    eprintln!("Listening on {}", server.local_addr());

    let module = Arc::new(EchoModule {
        server: Arc::clone(&server),
    });

    let engine = Arc::new(ParserEngine::new(module));
    server.serve(engine)?;
    Ok(())
}
