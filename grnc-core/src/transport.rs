//! # Transport Seam
//!
//! The client never opens a connection itself. Whatever carries the command to an
//! engine — HTTP, a stdio pipe to `groonga`, an in-process binding — is injected by
//! the caller as an implementation of [`Transport`], and the client stays generic
//! over it.
//!
//! A transport receives the command name and the already-flattened parameter mapping
//! and yields the engine's raw result payload, verbatim. Framing, retries, and
//! cancellation all belong to the transport; the client only distinguishes "the
//! transport produced a payload" from "the transport failed".

use crate::params::FlatParams;

/// Type alias for the standard boxed error used in transport bounds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single-operation contract: deliver one command invocation to an engine.
pub trait Transport {
    /// Executes `command` with `params` and returns the engine's raw result payload.
    fn execute(
        &mut self,
        command: &str,
        params: &FlatParams,
    ) -> impl Future<Output = Result<serde_json::Value, BoxError>>;
}
