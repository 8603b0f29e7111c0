//! Parser for the engine's command invocation syntax.
//!
//! Two spellings reach this parser: the plain command-line form
//! (`select --table Users 'query'`, with single/double quoting and backslash escapes)
//! and the URI form (`/d/select?table=Users`, percent-encoded, with an optional
//! `.json`/`.xml` extension that binds to `output_type`).
//!
//! Positional arguments are bound by name through the command table in
//! [`super::registry`]; a positional handed to a command that declares none left is a
//! parse error, as is a positional for a command the table does not know.
use super::registry;

/// A command line broken into its name and a flat, ordered argument mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub arguments: Vec<(String, String)>,
}

impl ParsedCommand {
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandLineError {
    #[error("Empty command line")]
    Empty,
    #[error("Unterminated quote in command line: '{0}'")]
    UnterminatedQuote(String),
    #[error("Flag '--{0}' is missing its value")]
    MissingValue(String),
    #[error("Command '{command}' does not accept positional argument '{value}'")]
    UnexpectedPositional { command: String, value: String },
    #[error("Invalid percent-encoding in '{0}'")]
    InvalidPercentEncoding(String),
}

/// Parses one logical command line in either spelling.
pub fn parse_command_line(input: &str) -> Result<ParsedCommand, CommandLineError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CommandLineError::Empty);
    }
    if let Some(rest) = input.strip_prefix("/d/") {
        return parse_uri_form(rest);
    }
    parse_plain_form(input)
}

fn parse_plain_form(input: &str) -> Result<ParsedCommand, CommandLineError> {
    let mut tokens = tokenize(input)?.into_iter();
    let name = tokens.next().ok_or(CommandLineError::Empty)?;

    let positional_names = registry::lookup(&name).map(|spec| spec.positional);
    let mut arguments = Vec::new();
    let mut positional_index = 0;

    while let Some(token) = tokens.next() {
        if let Some(key) = token.strip_prefix("--") {
            let value = tokens
                .next()
                .ok_or_else(|| CommandLineError::MissingValue(key.to_string()))?;
            arguments.push((key.to_string(), value));
        } else {
            let key = positional_names
                .and_then(|names| names.get(positional_index))
                .ok_or_else(|| CommandLineError::UnexpectedPositional {
                    command: name.clone(),
                    value: token.clone(),
                })?;
            arguments.push((key.to_string(), token));
            positional_index += 1;
        }
    }

    Ok(ParsedCommand { name, arguments })
}

fn parse_uri_form(rest: &str) -> Result<ParsedCommand, CommandLineError> {
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    // An extension on the path is shorthand for the output_type argument.
    let (name, extension) = match path.split_once('.') {
        Some((name, extension)) => (name, Some(extension)),
        None => (path, None),
    };
    if name.is_empty() {
        return Err(CommandLineError::Empty);
    }

    let mut arguments = Vec::new();
    if let Some(query) = query {
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            arguments.push((percent_decode(key)?, percent_decode(value)?));
        }
    }
    if let Some(extension) = extension {
        arguments.push(("output_type".to_string(), extension.to_string()));
    }

    Ok(ParsedCommand {
        name: name.to_string(),
        arguments,
    })
}

/// Splits a plain command line into whitespace-separated tokens, honoring single and
/// double quotes. Inside quotes a backslash escapes the next character, with `\n`
/// producing a newline.
fn tokenize(input: &str) -> Result<Vec<String>, CommandLineError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' | '"' => {
                in_token = true;
                let quote = ch;
                let mut terminated = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some('n') => current.push('\n'),
                            Some(escaped) => current.push(escaped),
                            None => return Err(CommandLineError::UnterminatedQuote(input.to_string())),
                        },
                        c if c == quote => {
                            terminated = true;
                            break;
                        }
                        other => current.push(other),
                    }
                }
                if !terminated {
                    return Err(CommandLineError::UnterminatedQuote(input.to_string()));
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some('n') => current.push('\n'),
                    Some(escaped) => current.push(escaped),
                    None => current.push('\\'),
                }
            }
            other => {
                in_token = true;
                current.push(other);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn percent_decode(input: &str) -> Result<String, CommandLineError> {
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();
    while let Some(byte) = bytes.next() {
        match byte {
            b'%' => {
                let hi = bytes.next();
                let lo = bytes.next();
                let decoded = hi
                    .zip(lo)
                    .and_then(|(hi, lo)| {
                        let hi = (hi as char).to_digit(16)?;
                        let lo = (lo as char).to_digit(16)?;
                        Some((hi * 16 + lo) as u8)
                    })
                    .ok_or_else(|| CommandLineError::InvalidPercentEncoding(input.to_string()))?;
                out.push(decoded);
            }
            b'+' => out.push(b' '),
            other => out.push(other),
        }
    }
    String::from_utf8(out).map_err(|_| CommandLineError::InvalidPercentEncoding(input.to_string()))
}
