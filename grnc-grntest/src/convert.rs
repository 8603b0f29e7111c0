//! # Command Converter
//!
//! Turns a combined element stream into Rust test source: one `#[tokio::test]`
//! function per fixture pair, one assertion block per command, executed through the
//! workspace's client against the stub engine.
//!
//! The interesting part is [`normalize_arguments`]: fixture command lines carry the
//! *wire* spelling of every option — flat `key[label].subkey` keys, every value a
//! string — while the client API speaks nested, typed [`ParamMap`]s. Normalization
//! un-flattens the bracketed keys, undoes the window key rename, and re-infers
//! scalar types, so the generated test calls the client the way a user would.
use crate::element::{Command, GrnTestElement, Response};
use grnc_core::params::{ParamMap, ParamValue};
use grnc_core::response::ResponseEnvelope;
use std::collections::HashMap;
use std::fmt::Write;

/// The outcome of converting one fixture pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    /// Generated test source.
    Source(String),
    /// The fixture opted out via `#@omit`.
    Omitted,
}

/// Converts a combined element stream into test source named after the fixture.
pub fn convert(fixture_name: &str, elements: &[GrnTestElement]) -> Converted {
    Converter::new(fixture_name).run(elements)
}

struct Converter<'a> {
    fixture_name: &'a str,
    exports: HashMap<String, String>,
    out: String,
}

impl<'a> Converter<'a> {
    fn new(fixture_name: &'a str) -> Self {
        Self {
            fixture_name,
            exports: HashMap::new(),
            out: String::new(),
        }
    }

    fn run(mut self, elements: &[GrnTestElement]) -> Converted {
        let omitted = elements.iter().any(|element| {
            matches!(element, GrnTestElement::Pragma(pragma) if pragma.directive == "omit")
        });
        if omitted {
            return Converted::Omitted;
        }

        self.push_header();
        for element in elements {
            match element {
                GrnTestElement::Command(command) => self.push_command(command),
                GrnTestElement::Pragma(pragma) => {
                    // on-error regions are already folded into the counts.
                    if pragma.directive != "on-error" {
                        self.push_line(&format!(
                            "    // pragma: {} {}",
                            pragma.directive,
                            pragma.arguments.join(" ")
                        ));
                    }
                }
                GrnTestElement::Note(note) => {
                    for line in note.lines() {
                        self.push_line(&format!("    // {line}"));
                    }
                }
                GrnTestElement::Export { name, value } => {
                    self.push_line(&format!("    // export {name}={value}"));
                    self.exports.insert(name.clone(), value.clone());
                }
                GrnTestElement::Log(_) | GrnTestElement::QueryLog(_) => {}
            }
        }
        self.push_line("}");
        Converted::Source(self.out)
    }

    fn push_header(&mut self) {
        let fixture = self.fixture_name;
        let test_name = sanitize_test_name(fixture);
        self.push_line(&format!(
            "// Generated by `grnc convert` from '{fixture}'. Do not edit by hand."
        ));
        self.push_line("");
        self.push_line("use grnc_core::client::GrncClient;");
        self.push_line("use grnc_core::params::ParamMap;");
        self.push_line("use grnc_core::response::ResponseEnvelope;");
        self.push_line("use stub_engine::StubEngine;");
        self.push_line("");
        self.push_line("#[tokio::test]");
        self.push_line(&format!("async fn {test_name}() {{"));
        self.push_line("    let mut client = GrncClient::new(StubEngine::new());");
    }

    fn push_command(&mut self, command: &Command) {
        let params = normalize_arguments(&self.expand_exports(&command.arguments));
        let params_expr = emit_param_map(&params, 1);
        let name = &command.name;
        let count = command.count;

        self.push_line("");
        if count < 0 {
            // Error-tolerant region: execute, assert nothing.
            self.push_line(&format!("    // tolerated: {name} (#{})", -count));
            self.push_line(&format!(
                "    let _ = client.execute(\"{name}\", {params_expr}).await;"
            ));
            return;
        }

        self.push_line(&format!("    // {name} (#{count})"));
        self.push_line(&format!(
            "    let payload = client.execute(\"{name}\", {params_expr}).await.expect(\"{name} (#{count})\");"
        ));

        match &command.response {
            Some(Response::Json(recorded)) => match ResponseEnvelope::parse(recorded) {
                Ok(envelope) => {
                    self.push_line(&format!(
                        "    let envelope = ResponseEnvelope::parse(&payload).expect(\"envelope (#{count})\");"
                    ));
                    self.push_line(&format!(
                        "    assert_eq!(envelope.return_code, {});",
                        envelope.return_code
                    ));
                    if let Some(message) = &envelope.error_message {
                        self.push_line(&format!(
                            "    assert_eq!(envelope.error_message.as_deref(), Some({}));",
                            rust_string(message)
                        ));
                    }
                    self.push_line(&format!(
                        "    assert_eq!(envelope.body, {});",
                        emit_json(&envelope.body)
                    ));
                }
                Err(_) => {
                    self.push_line(&format!(
                        "    assert_eq!(payload, {});",
                        emit_json(recorded)
                    ));
                }
            },
            Some(Response::Raw(_)) => {
                self.push_line("    // recorded response is not JSON; not asserted");
                self.push_line("    let _ = payload;");
            }
            None => {
                self.push_line("    let _ = payload;");
            }
        }
    }

    /// Substitutes `#{NAME}` placeholders with previously exported values.
    fn expand_exports(&self, arguments: &[(String, String)]) -> Vec<(String, String)> {
        arguments
            .iter()
            .map(|(key, value)| {
                let mut value = value.clone();
                for (name, replacement) in &self.exports {
                    value = value.replace(&format!("#{{{name}}}"), replacement);
                }
                (key.clone(), value)
            })
            .collect()
    }

    fn push_line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }
}

/// Rebuilds the nested, typed option tree from a flat wire argument mapping.
///
/// The inverse of `grnc_core::params::flatten` as far as the fixture corpus needs:
/// `key[label].subkey` un-flattens into label maps, the window keys revert to their
/// underscore spelling, scalar literals regain their types, and `values` stays the
/// raw JSON string it arrived as.
pub fn normalize_arguments(arguments: &[(String, String)]) -> ParamMap {
    let mut params = ParamMap::new();
    for (key, raw) in arguments {
        if key == "values" {
            params.insert("values", ParamValue::Str(raw.clone()));
            continue;
        }
        let key = unfix_window_key(key);
        let path = parse_key_path(&key);
        insert_at_path(&mut params, &path, infer_scalar(raw));
    }
    params
}

/// One `name` or `name[label]` step of a flattened key.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathSegment {
    name: String,
    label: Option<String>,
}

/// Reverses the flattener's scalar key rename table. Only the key's tail is
/// affected; a label prefix such as `columns[x].` stays as is.
fn unfix_window_key(key: &str) -> String {
    if let Some(prefix) = key.strip_suffix("window.sort_keys") {
        format!("{prefix}window_sort_keys")
    } else if let Some(prefix) = key.strip_suffix("window.group_keys") {
        format!("{prefix}window_group_keys")
    } else {
        key.to_string()
    }
}

/// Splits a flattened key on `.` and `[label]`. Labels may contain dots.
fn parse_key_path(key: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut chars = key.chars().peekable();
    loop {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '[' || c == '.' {
                break;
            }
            name.push(c);
            chars.next();
        }
        let mut label = None;
        if chars.peek() == Some(&'[') {
            chars.next();
            let mut text = String::new();
            for c in chars.by_ref() {
                if c == ']' {
                    break;
                }
                text.push(c);
            }
            label = Some(text);
        }
        segments.push(PathSegment { name, label });
        match chars.next() {
            Some('.') => {}
            _ => break,
        }
    }
    segments
}

fn insert_at_path(map: &mut ParamMap, path: &[PathSegment], value: ParamValue) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    match (&first.label, rest.is_empty()) {
        (None, true) => map.insert(first.name.clone(), value),
        (None, false) => insert_at_path(ensure_map(map, &first.name), rest, value),
        (Some(label), true) => ensure_map(map, &first.name).insert(label.clone(), value),
        (Some(label), false) => {
            let labels = ensure_map(map, &first.name);
            insert_at_path(ensure_map(labels, label), rest, value)
        }
    }
}

fn ensure_map<'a>(map: &'a mut ParamMap, key: &str) -> &'a mut ParamMap {
    if !matches!(map.get(key), Some(ParamValue::Map(_))) {
        map.insert(key.to_string(), ParamMap::new());
    }
    match map.get_mut(key) {
        Some(ParamValue::Map(inner)) => inner,
        _ => unreachable!(),
    }
}

/// Re-types a wire scalar: integer and float literals and the two boolean words
/// regain their types; everything else stays a string.
fn infer_scalar(raw: &str) -> ParamValue {
    if let Ok(int) = raw.parse::<i64>() {
        return ParamValue::Int(int);
    }
    if is_float_literal(raw)
        && let Ok(float) = raw.parse::<f64>()
    {
        return ParamValue::Float(float);
    }
    match raw {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => ParamValue::Str(raw.to_string()),
    }
}

// Plain decimal floats only; keeps "inf"/"nan"/"1e3" and friends as strings.
fn is_float_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit && seen_dot
}

/// Emits builder source for a [`ParamMap`]; `depth` is the surrounding indent level.
fn emit_param_map(map: &ParamMap, depth: usize) -> String {
    if map.is_empty() {
        return "ParamMap::new()".to_string();
    }
    let indent = "    ".repeat(depth);
    let mut out = String::from("{\n");
    let _ = writeln!(out, "{indent}    let mut params = ParamMap::new();");
    for (key, value) in map.iter() {
        let _ = writeln!(
            out,
            "{indent}    params.insert({}, {});",
            rust_string(key),
            emit_param_value(value, depth + 1)
        );
    }
    let _ = writeln!(out, "{indent}    params");
    let _ = write!(out, "{indent}}}");
    out
}

fn emit_param_value(value: &ParamValue, depth: usize) -> String {
    match value {
        ParamValue::Str(s) => rust_string(s),
        ParamValue::Int(i) => format!("{i}i64"),
        ParamValue::Float(f) => format!("{f:?}f64"),
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::Map(map) => emit_param_map(map, depth),
        // Normalization never produces these; keep the output compilable anyway.
        other => rust_string(&other.to_json().to_string()),
    }
}

/// A JSON value as a `serde_json::from_str` expression over a raw string literal,
/// immune to escape-sequence mismatches between JSON and Rust.
fn emit_json(value: &serde_json::Value) -> String {
    format!(
        "serde_json::from_str::<serde_json::Value>({}).unwrap()",
        raw_string(&value.to_string())
    )
}

fn rust_string(text: &str) -> String {
    format!("{text:?}")
}

/// Wraps `text` in a raw string literal with enough `#`s to survive its content.
fn raw_string(text: &str) -> String {
    let mut hashes = 1;
    while text.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{text}\"{fence}")
}

fn sanitize_test_name(fixture_name: &str) -> String {
    let mut name: String = fixture_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if name.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        name.insert_str(0, "fixture_");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Pragma;
    use serde_json::json;

    #[test]
    fn bracketed_keys_unflatten_into_label_maps() {
        let arguments = vec![
            ("table".to_string(), "Memos".to_string()),
            ("drilldowns[tags].keys".to_string(), "tag".to_string()),
            ("drilldowns[tags].limit".to_string(), "3".to_string()),
            ("drilldowns[dates].keys".to_string(), "date".to_string()),
        ];
        let params = normalize_arguments(&arguments);

        assert_eq!(params.get("table"), Some(&ParamValue::Str("Memos".into())));
        let Some(ParamValue::Map(drilldowns)) = params.get("drilldowns") else {
            panic!("drilldowns must be a label map");
        };
        let Some(ParamValue::Map(tags)) = drilldowns.get("tags") else {
            panic!("tags must be nested options");
        };
        assert_eq!(tags.get("keys"), Some(&ParamValue::Str("tag".into())));
        assert_eq!(tags.get("limit"), Some(&ParamValue::Int(3)));
        let Some(ParamValue::Map(dates)) = drilldowns.get("dates") else {
            panic!("dates must be nested options");
        };
        assert_eq!(dates.get("keys"), Some(&ParamValue::Str("date".into())));
    }

    #[test]
    fn window_keys_revert_to_their_underscore_spelling() {
        let arguments = vec![
            ("columns[x].window.sort_keys".to_string(), "a".to_string()),
            ("columns[x].window.group_keys".to_string(), "b".to_string()),
        ];
        let params = normalize_arguments(&arguments);
        let Some(ParamValue::Map(columns)) = params.get("columns") else {
            panic!("columns must be a label map");
        };
        let Some(ParamValue::Map(x)) = columns.get("x") else {
            panic!("x must be nested options");
        };
        assert_eq!(x.get("window_sort_keys"), Some(&ParamValue::Str("a".into())));
        assert_eq!(x.get("window_group_keys"), Some(&ParamValue::Str("b".into())));
    }

    #[test]
    fn scalar_types_are_inferred() {
        let arguments = vec![
            ("limit".to_string(), "10".to_string()),
            ("offset".to_string(), "-5".to_string()),
            ("threshold".to_string(), "0.5".to_string()),
            ("recursive".to_string(), "true".to_string()),
            ("query".to_string(), "age:>=7".to_string()),
            ("command_version".to_string(), "3".to_string()),
        ];
        let params = normalize_arguments(&arguments);
        assert_eq!(params.get("limit"), Some(&ParamValue::Int(10)));
        assert_eq!(params.get("offset"), Some(&ParamValue::Int(-5)));
        assert_eq!(params.get("threshold"), Some(&ParamValue::Float(0.5)));
        assert_eq!(params.get("recursive"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("query"), Some(&ParamValue::Str("age:>=7".into())));
        assert_eq!(params.get("command_version"), Some(&ParamValue::Int(3)));
    }

    #[test]
    fn values_stay_a_raw_json_string() {
        let arguments = vec![
            ("table".to_string(), "Users".to_string()),
            ("values".to_string(), "[{\"_key\": \"alice\"}]".to_string()),
        ];
        let params = normalize_arguments(&arguments);
        assert_eq!(
            params.get("values"),
            Some(&ParamValue::Str("[{\"_key\": \"alice\"}]".into()))
        );
    }

    fn command(count: i64, name: &str, arguments: &[(&str, &str)], response: Option<Response>) -> GrnTestElement {
        GrnTestElement::Command(Command {
            source: name.to_string(),
            count,
            name: name.to_string(),
            arguments: arguments
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            response,
        })
    }

    #[test]
    fn converted_source_asserts_on_the_envelope() {
        let elements = vec![
            command(
                1,
                "table_create",
                &[("name", "Users"), ("flags", "TABLE_HASH_KEY")],
                Some(Response::Json(json!([[0, 1.0, 0.1], true]))),
            ),
            command(
                2,
                "select",
                &[("table", "Users")],
                Some(Response::Json(json!([[0, 1.0, 0.1], [[[0], [["_id", "UInt32"]]]]]))),
            ),
        ];

        let Converted::Source(source) = convert("select-simple", &elements) else {
            panic!("fixture must convert");
        };
        assert!(source.contains("async fn select_simple()"));
        assert!(source.contains("client.execute(\"table_create\", {"));
        assert!(source.contains("params.insert(\"name\", \"Users\");"));
        assert!(source.contains("assert_eq!(envelope.return_code, 0);"));
        assert!(source.contains(r##"serde_json::from_str::<serde_json::Value>(r#"true"#)"##));
        // Timing fields from the recorded header are not asserted on.
        assert!(!source.contains("0.1"));
    }

    #[test]
    fn tolerated_commands_execute_without_assertions() {
        let elements = vec![command(-1, "plugin_register", &[("name", "functions/time")], None)];
        let Converted::Source(source) = convert("tolerant", &elements) else {
            panic!("fixture must convert");
        };
        assert!(source.contains("let _ = client.execute(\"plugin_register\""));
        assert!(!source.contains("assert_eq!"));
    }

    #[test]
    fn omit_pragma_skips_the_fixture() {
        let elements = vec![
            GrnTestElement::Pragma(Pragma {
                directive: "omit".to_string(),
                arguments: Vec::new(),
            }),
            command(1, "status", &[], Some(Response::Json(json!([[0, 0.0, 0.0], {}])))),
        ];
        assert_eq!(convert("omitted", &elements), Converted::Omitted);
    }

    #[test]
    fn exports_substitute_into_later_arguments() {
        let elements = vec![
            GrnTestElement::Export {
                name: "USER".to_string(),
                value: "alice".to_string(),
            },
            command(
                1,
                "select",
                &[("table", "Users"), ("query", "_key:@#{USER}")],
                Some(Response::Json(json!([[0, 0.0, 0.0], []]))),
            ),
        ];
        let Converted::Source(source) = convert("exports", &elements) else {
            panic!("fixture must convert");
        };
        assert!(source.contains("// export USER=alice"));
        assert!(source.contains(r#"params.insert("query", "_key:@alice");"#));
    }

    #[test]
    fn notes_become_comments_and_logs_are_dropped() {
        let elements = vec![
            GrnTestElement::Note("covers the empty result shape".to_string()),
            GrnTestElement::Log("e| alloc failed".to_string()),
            command(1, "status", &[], Some(Response::Json(json!([[0, 0.0, 0.0], {}])))),
        ];
        let Converted::Source(source) = convert("notes", &elements) else {
            panic!("fixture must convert");
        };
        assert!(source.contains("// covers the empty result shape"));
        assert!(!source.contains("alloc failed"));
    }

    #[test]
    fn raw_responses_are_not_asserted() {
        let elements = vec![command(
            1,
            "dump",
            &[],
            Some(Response::Raw("table_create Users TABLE_HASH_KEY".to_string())),
        )];
        let Converted::Source(source) = convert("dump", &elements) else {
            panic!("fixture must convert");
        };
        assert!(source.contains("// recorded response is not JSON; not asserted"));
    }

    #[test]
    fn test_names_survive_awkward_fixture_names() {
        assert_eq!(sanitize_test_name("select-drilldown.v3"), "select_drilldown_v3");
        assert_eq!(sanitize_test_name("0001-basic"), "fixture_0001_basic");
    }
}
