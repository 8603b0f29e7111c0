//! Static description of the engine's command set.
//!
//! One row per command: whether its options nest (the search/load/range-query family),
//! the protocol version tier it defaults to, and the names its positional command-line
//! arguments bind to, in order.

/// Metadata for one engine command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Wire name of the command.
    pub name: &'static str,
    /// Whether the command accepts nested options that must be flattened into the
    /// `key[label].subkey` wire syntax before dispatch.
    pub flatten: bool,
    /// `command_version` injected when the caller does not supply one.
    pub default_version: Option<u32>,
    /// Positional parameter names, in the order the command-line syntax binds them.
    pub positional: &'static [&'static str],
}

const fn spec(
    name: &'static str,
    flatten: bool,
    default_version: Option<u32>,
    positional: &'static [&'static str],
) -> CommandSpec {
    CommandSpec {
        name,
        flatten,
        default_version,
        positional,
    }
}

/// The engine command table. Sorted by name so that [`lookup`] can bisect.
pub const COMMANDS: &[CommandSpec] = &[
    spec("cache_limit", false, None, &["max"]),
    spec("check", false, None, &["obj"]),
    spec("clearlock", false, None, &["objname"]),
    spec("column_copy", false, None, &["from_table", "from_name", "to_table", "to_name"]),
    spec(
        "column_create",
        false,
        None,
        &["table", "name", "flags", "type", "source"],
    ),
    spec("column_list", false, None, &["table"]),
    spec("column_remove", false, None, &["table", "name"]),
    spec("column_rename", false, None, &["table", "name", "new_name"]),
    spec("config_delete", false, None, &["key"]),
    spec("config_get", false, None, &["key"]),
    spec("config_set", false, None, &["key", "value"]),
    spec("database_unmap", false, None, &[]),
    spec("define_selector", false, None, &["name", "table"]),
    spec("defrag", false, None, &["objname", "threshold"]),
    spec("delete", false, None, &["table", "key", "id", "filter"]),
    spec("dump", false, None, &["tables"]),
    spec("get", false, None, &["table", "key", "output_columns", "id"]),
    spec("io_flush", false, None, &["target_name", "recursive"]),
    spec(
        "load",
        true,
        None,
        &["values", "table", "columns", "ifexists", "input_type"],
    ),
    spec("lock_acquire", false, None, &["target_name"]),
    spec("lock_clear", false, None, &["target_name"]),
    spec("lock_release", false, None, &["target_name"]),
    spec("log_level", false, None, &["level"]),
    spec("log_put", false, None, &["level", "message"]),
    spec("log_reopen", false, None, &[]),
    spec("logical_count", true, None, &["logical_table", "shard_key"]),
    spec("logical_parameters", false, None, &[]),
    spec("logical_range_filter", true, None, &["logical_table", "shard_key"]),
    spec("logical_select", true, Some(3), &["logical_table", "shard_key"]),
    spec("logical_shard_list", false, None, &["logical_table"]),
    spec("logical_table_remove", false, None, &["logical_table", "shard_key"]),
    spec("normalize", false, None, &["normalizer", "string", "flags"]),
    spec("normalizer_list", false, None, &[]),
    spec("object_exist", false, None, &["name"]),
    spec("object_inspect", false, None, &["name"]),
    spec("object_list", false, None, &[]),
    spec("object_remove", false, None, &["name"]),
    spec("plugin_register", false, None, &["name"]),
    spec("plugin_unregister", false, None, &["name"]),
    spec("query_expand", false, None, &["expander", "query"]),
    spec("quit", false, None, &[]),
    spec("range_filter", true, None, &["table"]),
    spec("register", false, None, &["path"]),
    spec("reindex", false, None, &["target_name"]),
    spec("request_cancel", false, None, &["id"]),
    spec("ruby_eval", false, None, &["script"]),
    spec("ruby_load", false, None, &["path"]),
    spec("schema", false, None, &[]),
    spec("select", true, Some(3), &["table"]),
    spec("shutdown", false, None, &["mode"]),
    spec("status", false, None, &[]),
    spec("suggest", false, None, &["types", "table", "column", "query"]),
    spec("table_create", false, None, &[
        "name",
        "flags",
        "key_type",
        "value_type",
        "default_tokenizer",
        "normalizer",
        "token_filters",
    ]),
    spec("table_list", false, None, &[]),
    spec("table_remove", false, None, &["name"]),
    spec("table_rename", false, None, &["name", "new_name"]),
    spec("table_tokenize", false, None, &["table", "string", "flags", "mode"]),
    spec("thread_limit", false, None, &["max"]),
    spec("tokenize", false, None, &[
        "tokenizer",
        "string",
        "normalizer",
        "flags",
        "mode",
        "token_filters",
    ]),
    spec("tokenizer_list", false, None, &[]),
    spec("truncate", false, None, &["target_name"]),
];

/// Looks up the metadata for `name`. Unknown commands are not an error; callers fall
/// back to scalar pass-through and the global option layers.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .binary_search_by(|spec| spec.name.cmp(name))
        .ok()
        .map(|index| &COMMANDS[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_for_bisection() {
        for pair in COMMANDS.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} >= {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn lookup_finds_known_commands() {
        assert!(lookup("select").is_some_and(|s| s.flatten));
        assert_eq!(lookup("select").unwrap().default_version, Some(3));
        assert_eq!(lookup("logical_select").unwrap().default_version, Some(3));
        assert!(lookup("status").is_some_and(|s| !s.flatten));
        assert!(lookup("no_such_command").is_none());
    }
}
