//! # Command Metadata & Command-Line Syntax
//!
//! Groonga exposes one wire operation per command name; what differs between commands
//! is pure metadata: whether the options may nest (and therefore need flattening),
//! which protocol version tier the command defaults to, and which positional
//! parameters its command-line syntax accepts.
//!
//! That metadata lives in a static table ([`COMMANDS`]) rather than in per-command
//! methods, so the client stays a single generic entry point.
//!
//! The [`parse_command_line`] function implements the engine's own invocation syntax,
//! used by both the `grntest` fixture tooling and anything that wants to accept raw
//! command lines:
//!
//! ```text
//! select --table Users --query 'name:@alice'
//! /d/select?table=Users&query=name%3A%40alice
//! ```
mod line;
mod registry;

pub use line::*;
pub use registry::*;
