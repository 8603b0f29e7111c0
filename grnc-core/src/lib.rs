//! # Grnc Core
//!
//! `grnc-core` is the foundational library powering the Grnc tooling. It provides a dynamic
//! Groonga command client capable of issuing any command of the engine's command protocol
//! without compile-time knowledge of the command set.
//!
//! ## Key Components
//!
//! * **[`client::GrncClient`]:** The main entry point. It merges per-command option layers,
//!   flattens nested options into the engine's flat parameter syntax, and dispatches the
//!   call to an injected [`transport::Transport`].
//! * **[`params::ParamMap`] & [`params::FlatParams`]:** The primary data structures for
//!   command options, nested and wire-level respectively.
//! * **[`response::ResponseEnvelope`]:** A parsed view over the engine's result envelope,
//!   accepting both the legacy positional shape and the versioned header shape.
//!
//! ## Transports
//!
//! This crate never opens a connection itself. A transport (HTTP, stdio, an in-process
//! binding) is supplied by the caller through the [`transport::Transport`] trait, and the
//! client is generic over it. See the `stub-engine` crate in this workspace for the
//! in-process transport used by the integration tests.
//!
//! ## Command metadata
//!
//! The [`command`] module carries a static table describing the engine's command set:
//! which commands take nested options that must be flattened, which default to the newest
//! protocol version tier, and the positional parameter names the command-line syntax
//! accepts. The same table drives [`command::parse_command_line`], the parser for the
//! engine's own `name --key value` / `/d/name?key=value` invocation syntax.
pub mod client;
pub mod command;
pub mod params;
pub mod response;
pub mod transport;
