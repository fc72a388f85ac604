use blackboard_parser::config::{DEFAULT_MAX_MESSAGE_LEN, DEFAULT_QUEUE_CAPACITY};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

const UNKNOWN: &str = "unknown";

pub fn run(args: VersionArgs) -> CliResult<i32> {
    let version = env!("CARGO_PKG_VERSION");
    if !args.extended {
        println!("blackboard {version}");
        return Ok(SUCCESS);
    }

    let fields = [
        ("name", "blackboard".to_string()),
        ("version", version.to_string()),
        ("target", format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)),
        (
            "build_target",
            option_env!("BLACKBOARD_BUILD_TARGET").unwrap_or(UNKNOWN).to_string(),
        ),
        ("rustc", option_env!("RUSTC_VERSION").unwrap_or(UNKNOWN).to_string()),
        ("git_hash", option_env!("GIT_HASH").unwrap_or(UNKNOWN).to_string()),
        ("features", format!("vars={}, cli=true", cfg!(feature = "vars"))),
        (
            "parser_defaults",
            format!(
                "queue_capacity={DEFAULT_QUEUE_CAPACITY}, max_message_len={DEFAULT_MAX_MESSAGE_LEN}"
            ),
        ),
    ];
    for (key, value) in fields {
        println!("{key}: {value}");
    }

    Ok(SUCCESS)
}
