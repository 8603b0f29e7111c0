//! # Grnc Client
//!
//! This module implements the high-level logic for executing dynamic Groonga commands.
//!
//! A [`GrncClient`] is one generic entry point over the whole command set: callers name
//! the command and hand over a nested [`ParamMap`]; the client consults the static
//! command table, applies the option merge layers, flattens where the command calls
//! for it, and dispatches to the injected [`Transport`].
//!
//! ## Option merge layers
//!
//! Options are merged from three tiers of increasing precedence:
//!
//! 1. per-command defaults (the global `"*"` layer applies when the command has none),
//! 2. caller-supplied options,
//! 3. per-command forced overrides (again with a global fallback layer).
//!
//! Two commands (`select` and `logical_select`) additionally default
//! `command_version` to the newest protocol tier unless the merged options already
//! carry one.
//!
//! ## Failure boundary
//!
//! Everything that can go wrong inside a call — bad parameter shapes detected while
//! preparing the wire mapping, or a transport failure — surfaces as a
//! [`CommandError`]. The client never panics on caller input.
use crate::command::lookup;
use crate::params::{FlatParams, ParamMap, ParamValue, flatten};
use crate::transport::{BoxError, Transport};
use std::collections::HashMap;

/// The merge layer key that applies to every command without its own layer.
pub const GLOBAL_LAYER: &str = "*";

/// Errors that can occur while executing a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Parameter '{parameter}' of command '{command}' does not accept nested values")]
    NestedParameter { command: String, parameter: String },
    #[error("Transport failure while executing '{command}': '{source}'")]
    Transport {
        command: String,
        #[source]
        source: BoxError,
    },
}

/// Per-command default and forced-override option layers.
///
/// Layers are keyed by command name; the [`GLOBAL_LAYER`] entry is consulted only
/// when no command-specific layer exists.
#[derive(Debug, Clone, Default)]
pub struct MergePolicy {
    defaults: HashMap<String, ParamMap>,
    overrides: HashMap<String, ParamMap>,
}

impl MergePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the low-precedence default layer for `command` (or [`GLOBAL_LAYER`]).
    pub fn set_defaults(&mut self, command: impl Into<String>, params: ParamMap) {
        self.defaults.insert(command.into(), params);
    }

    /// Installs the forced-override layer for `command` (or [`GLOBAL_LAYER`]).
    pub fn set_overrides(&mut self, command: impl Into<String>, params: ParamMap) {
        self.overrides.insert(command.into(), params);
    }

    /// Merges the three tiers for `command`: defaults < supplied < overrides.
    pub fn merge(&self, command: &str, supplied: &ParamMap) -> ParamMap {
        let mut merged = self.layer(&self.defaults, command).cloned().unwrap_or_default();
        for (key, value) in supplied.iter() {
            merged.insert(key, value.clone());
        }
        if let Some(forced) = self.layer(&self.overrides, command) {
            for (key, value) in forced.iter() {
                merged.insert(key, value.clone());
            }
        }
        merged
    }

    fn layer<'a>(&'a self, layers: &'a HashMap<String, ParamMap>, command: &str) -> Option<&'a ParamMap> {
        layers.get(command).or_else(|| layers.get(GLOBAL_LAYER))
    }
}

/// The dynamic Groonga command client.
///
/// The generic parameter `T` is the injected transport.
#[derive(Debug, Clone)]
pub struct GrncClient<T> {
    transport: T,
    policy: MergePolicy,
}

impl<T: Transport> GrncClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: MergePolicy::new(),
        }
    }

    pub fn with_policy(transport: T, policy: MergePolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy_mut(&mut self) -> &mut MergePolicy {
        &mut self.policy
    }

    /// Gives the transport back, consuming the client.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Executes `command` and returns the engine's raw result payload verbatim.
    ///
    /// No schema validation is applied to the payload; callers that want the parsed
    /// envelope go through [`crate::response::ResponseEnvelope::parse`].
    pub async fn execute(
        &mut self,
        command: &str,
        params: ParamMap,
    ) -> Result<serde_json::Value, CommandError> {
        let flat = self.prepare(command, params)?;
        self.transport
            .execute(command, &flat)
            .await
            .map_err(|source| CommandError::Transport {
                command: command.to_string(),
                source,
            })
    }

    /// Merges the option layers and produces the wire mapping for `command`.
    ///
    /// Commands the table marks as nesting are flattened; all other commands pass
    /// their merged options through verbatim, rejecting nested values.
    fn prepare(&self, command: &str, params: ParamMap) -> Result<FlatParams, CommandError> {
        let mut merged = self.policy.merge(command, &params);

        let spec = lookup(command);
        if let Some(version) = spec.and_then(|spec| spec.default_version)
            && !merged.contains_key("command_version")
        {
            merged.insert("command_version", version as i64);
        }

        if spec.is_some_and(|spec| spec.flatten) {
            return Ok(flatten(&merged));
        }

        let mut flat = FlatParams::new();
        for (key, value) in merged.iter() {
            match value {
                ParamValue::Map(_) | ParamValue::List(_) => {
                    return Err(CommandError::NestedParameter {
                        command: command.to_string(),
                        parameter: key.to_string(),
                    });
                }
                scalar => flat.insert(key, scalar.clone()),
            }
        }
        Ok(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_tiers_apply_in_precedence_order() {
        let mut policy = MergePolicy::new();
        let mut defaults = ParamMap::new();
        defaults.insert("limit", 10i64);
        defaults.insert("offset", 0i64);
        policy.set_defaults("select", defaults);
        let mut overrides = ParamMap::new();
        overrides.insert("cache", "no");
        policy.set_overrides("select", overrides);

        let mut supplied = ParamMap::new();
        supplied.insert("limit", 5i64);
        supplied.insert("cache", "yes");

        let merged = policy.merge("select", &supplied);
        assert_eq!(merged.get("limit"), Some(&ParamValue::Int(5)));
        assert_eq!(merged.get("offset"), Some(&ParamValue::Int(0)));
        assert_eq!(merged.get("cache"), Some(&ParamValue::Str("no".into())));
    }

    #[test]
    fn global_layer_applies_only_without_a_command_layer() {
        let mut policy = MergePolicy::new();
        let mut global = ParamMap::new();
        global.insert("output_type", "json");
        policy.set_defaults(GLOBAL_LAYER, global);
        let mut select = ParamMap::new();
        select.insert("limit", 10i64);
        policy.set_defaults("select", select);

        let merged = policy.merge("status", &ParamMap::new());
        assert_eq!(merged.get("output_type"), Some(&ParamValue::Str("json".into())));

        // The command layer replaces the global layer; it is not unioned with it.
        let merged = policy.merge("select", &ParamMap::new());
        assert!(merged.get("output_type").is_none());
        assert_eq!(merged.get("limit"), Some(&ParamValue::Int(10)));
    }
}
