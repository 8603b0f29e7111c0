//! # Fixture Parser
//!
//! [`parse`] drives the [`Scanner`](crate::scanner::Scanner) over one fixture file
//! and produces its ordered element list. Command lines are tokenized through the
//! engine's own argument syntax (`grnc_core::command::parse_command_line`); every
//! failure here is fatal for the file — there is no partial-result mode.
//!
//! Sequence counts are assigned monotonically from 1 as commands are encountered.
//! Inside an error-tolerant region (`#@on-error omit` until `#@on-error default`)
//! the count is negated: the command still holds its place in the sequence, but
//! downstream stages know not to assert on its response.
use crate::element::{Command, GrnTestElement, Response};
use crate::scanner::{ScanError, Scanner};
use grnc_core::command::{CommandLineError, parse_command_line};

/// Errors that can occur while parsing a fixture file. All are fatal for the file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Failed to parse command line '{source_line}': {source}")]
    CommandLine {
        source_line: String,
        #[source]
        source: CommandLineError,
    },
    #[error("Load command has no inline values and no values block follows: '{0}'")]
    MissingLoadValues(String),
}

/// Parses one fixture file into its ordered element list.
pub fn parse(text: &str) -> Result<Vec<GrnTestElement>, ParseError> {
    let mut scanner = Scanner::new(text);
    let mut elements: Vec<GrnTestElement> = Vec::new();
    let mut count: i64 = 0;
    let mut tolerate_errors = false;

    loop {
        scanner.skip_empty_lines();
        if scanner.peek().is_some_and(|line| line.starts_with('#')) {
            let comments = scanner.scan_comments()?;
            for comment in &comments {
                apply_error_region(comment, &mut tolerate_errors);
            }
            elements.extend(comments);
            continue;
        }

        let Some(source) = scanner.scan_command() else {
            break;
        };
        let parsed = parse_command_line(&source).map_err(|source_err| ParseError::CommandLine {
            source_line: source.clone(),
            source: source_err,
        })?;
        let name = parsed.name;
        let mut arguments = parsed.arguments;

        if name == "load" && !arguments.iter().any(|(key, _)| key == "values") {
            let values = scanner
                .scan_values()
                .ok_or_else(|| ParseError::MissingLoadValues(source.clone()))?;
            arguments.push(("values".to_string(), values));
        }

        let response = scan_response_for(&mut scanner, &name, &arguments).map(decode_response);

        count += 1;
        elements.push(GrnTestElement::Command(Command {
            source,
            count: if tolerate_errors { -count } else { count },
            name,
            arguments,
            response,
        }));
    }

    Ok(elements)
}

/// `dump` output and the non-JSON output types use the dump accumulation rules;
/// everything else uses the generic response scan.
fn scan_response_for(
    scanner: &mut Scanner<'_>,
    name: &str,
    arguments: &[(String, String)],
) -> Option<String> {
    let output_type = arguments
        .iter()
        .find(|(key, _)| key == "output_type")
        .map(|(_, value)| value.as_str());
    if name == "dump" || matches!(output_type, Some("xml" | "apache-arrow")) {
        scanner.scan_dump_response()
    } else {
        scanner.scan_response()
    }
}

fn decode_response(text: String) -> Response {
    let looks_like_json = matches!(text.trim_start().as_bytes().first(), Some(b'[' | b'{'));
    if looks_like_json && let Ok(value) = serde_json::from_str(&text) {
        return Response::Json(value);
    }
    Response::Raw(text)
}

fn apply_error_region(element: &GrnTestElement, tolerate_errors: &mut bool) {
    if let GrnTestElement::Pragma(pragma) = element
        && pragma.directive == "on-error"
    {
        *tolerate_errors = pragma.arguments.first().is_some_and(|mode| mode == "omit");
    }
}
