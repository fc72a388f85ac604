//! Blackboard middleware for distributed robot modules.
//!
//! Modules exchange textual Command/Response messages and typed shared
//! variables over TCP. This crate re-exports the layers of the stack.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP server and client, endpoints and raw packets
//! - [`parser`]: Per-endpoint packet parsing and message dispatch
//! - [`codec`]: Text encoding of shared-variable values (behind `vars` feature)
//! - [`vars`]: Typed shared variables and variable commands (behind `vars` feature)

/// Re-export transport types.
pub mod transport {
    pub use blackboard_transport::*;
}

/// Re-export parser types.
pub mod parser {
    pub use blackboard_parser::*;
}

/// Re-export codec functions (requires `vars` feature).
#[cfg(feature = "vars")]
pub mod codec {
    pub use blackboard_codec::*;
}

/// Re-export shared-variable types (requires `vars` feature).
#[cfg(feature = "vars")]
pub mod vars {
    pub use blackboard_vars::*;
}
