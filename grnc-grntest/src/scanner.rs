//! # Fixture Scanner
//!
//! A single-pass cursor over the fixture text split into physical lines (line
//! terminators retained). Each `scan_*` operation either consumes lines and produces
//! a token, or leaves the cursor where it was and returns `None`, so the parser can
//! probe alternatives cheaply.
//!
//! The grammar is line-oriented:
//!
//! * a line whose first character is a word character starts a command, as does the
//!   `/d/` URI spelling; a trailing backslash continues the command on the next line;
//! * `#`-prefixed lines are comments, classified by their second character:
//!   `#@` pragma, `#$` export, `# `/`#T` note, `#|` log, `#>`..`#<` query-log block —
//!   anything else is a fatal scan error;
//! * everything else is response text, delimited heuristically (see
//!   [`Scanner::scan_response`] and [`Scanner::scan_dump_response`]).
use crate::element::{GrnTestElement, Pragma};

/// The line `dump` output is terminated by in expected files.
const DUMP_SENTINEL: &str = "[[0,0.0,0.0],true]";

/// Errors that can occur while scanning. All of them abort the file.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Unrecognized comment marker: '{0}'")]
    UnknownCommentMarker(String),
    #[error("Malformed export line: '{0}'")]
    MalformedExport(String),
    #[error("Query log block is missing its closing '#<' line")]
    UnterminatedQueryLog,
}

/// A stateful cursor over the fixture text.
pub struct Scanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_inclusive('\n').collect(),
            pos: 0,
        }
    }

    /// The current line without advancing, or `None` at end of input.
    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    /// Consumes consecutive blank lines.
    pub fn skip_empty_lines(&mut self) {
        while self.peek().is_some_and(|line| line.trim().is_empty()) {
            self.pos += 1;
        }
    }

    /// Scans one logical command line, joining backslash continuations.
    ///
    /// Returns `None` without advancing when the current line does not start a
    /// command (word character or the `/d/` spelling).
    pub fn scan_command(&mut self) -> Option<String> {
        let line = self.peek()?;
        if !starts_command(line) {
            return None;
        }
        self.pos += 1;

        let mut command = trim_newline(line).to_string();
        while command.ends_with('\\') {
            command.pop();
            match self.advance() {
                Some(next) => command.push_str(trim_newline(next)),
                None => break,
            }
        }
        Some(command)
    }

    /// Scans a multi-line `--values` JSON block.
    ///
    /// Only applies when the immediately following line starts a JSON array; lines
    /// accumulate until the collected text parses as JSON. Returns `None` without
    /// advancing otherwise (including when the input ends before the JSON closes).
    pub fn scan_values(&mut self) -> Option<String> {
        if !self.peek()?.starts_with('[') {
            return None;
        }
        let start = self.pos;
        let mut buffer = String::new();
        while let Some(line) = self.advance() {
            buffer.push_str(line);
            if serde_json::from_str::<serde_json::Value>(&buffer).is_ok() {
                return Some(buffer.trim_end().to_string());
            }
        }
        self.pos = start;
        None
    }

    /// Classifies consecutive `#`-prefixed lines into comment elements.
    pub fn scan_comments(&mut self) -> Result<Vec<GrnTestElement>, ScanError> {
        let mut elements = Vec::new();
        while let Some(line) = self.peek() {
            if !line.starts_with('#') {
                break;
            }
            if let Some(rest) = line.strip_prefix("#@") {
                self.pos += 1;
                let mut words = rest.split_whitespace().map(str::to_string);
                let Some(directive) = words.next() else {
                    return Err(ScanError::UnknownCommentMarker(trim_newline(line).to_string()));
                };
                elements.push(GrnTestElement::Pragma(Pragma {
                    directive,
                    arguments: words.collect(),
                }));
            } else if let Some(rest) = line.strip_prefix("#$") {
                self.pos += 1;
                let rest = trim_newline(rest);
                let (name, value) = rest
                    .split_once('=')
                    .ok_or_else(|| ScanError::MalformedExport(rest.to_string()))?;
                elements.push(GrnTestElement::Export {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            } else if line.starts_with("# ") || line.starts_with("#T") {
                self.pos += 1;
                let mut note = vec![trim_newline(&line[2..])];
                while let Some(next) = self.peek() {
                    if !next.starts_with("# ") {
                        break;
                    }
                    self.pos += 1;
                    note.push(trim_newline(&next[2..]));
                }
                elements.push(GrnTestElement::Note(note.join("\n")));
            } else if line.starts_with("#|") {
                self.pos += 1;
                let mut log = vec![trim_newline(&line[2..])];
                while let Some(next) = self.peek() {
                    if !next.starts_with("#|") {
                        break;
                    }
                    self.pos += 1;
                    log.push(trim_newline(&next[2..]));
                }
                elements.push(GrnTestElement::Log(log.join("\n")));
            } else if line.starts_with("#>") {
                self.pos += 1;
                let mut block = vec![trim_newline(line)];
                loop {
                    let next = self.advance().ok_or(ScanError::UnterminatedQueryLog)?;
                    block.push(trim_newline(next));
                    if next.starts_with("#<") {
                        break;
                    }
                }
                elements.push(GrnTestElement::QueryLog(block.join("\n")));
            } else {
                return Err(ScanError::UnknownCommentMarker(trim_newline(line).to_string()));
            }
        }
        Ok(elements)
    }

    /// Accumulates response text.
    ///
    /// Scanning stops before a line that starts with a lowercase letter (the next
    /// command), a `#` comment, or the `/d/` spelling. A callback echo of the form
    /// `func(...)` would also start with a lowercase letter; when nothing has
    /// accumulated yet it is consumed as the whole response instead.
    pub fn scan_response(&mut self) -> Option<String> {
        let mut response = String::new();
        while let Some(line) = self.peek() {
            let logical = trim_newline(line);
            if is_callback_echo(logical) {
                if response.is_empty() {
                    self.pos += 1;
                    response.push_str(logical);
                }
                break;
            }
            if stops_response(line) {
                break;
            }
            self.pos += 1;
            response.push_str(line);
        }
        let response = response.trim_end();
        (!response.is_empty()).then(|| response.to_string())
    }

    /// Accumulates `dump`-style response text.
    ///
    /// Dump output is itself a stream of command lines, so the generic stop rules do
    /// not apply. Scanning stops before the fixed trailing sentinel line or a `#`
    /// comment. When the next line starts with `[` and the previously consumed line
    /// began with `select `, that select was actually the next command with its
    /// echoed response: the cursor rolls back one line and scanning stops.
    pub fn scan_dump_response(&mut self) -> Option<String> {
        let mut lines: Vec<&str> = Vec::new();
        while let Some(line) = self.peek() {
            if trim_newline(line) == DUMP_SENTINEL || line.starts_with('#') {
                break;
            }
            if line.starts_with('[')
                && lines.last().is_some_and(|prev| prev.starts_with("select "))
            {
                self.pos -= 1;
                lines.pop();
                break;
            }
            self.pos += 1;
            lines.push(line);
        }
        let text = lines.concat();
        let text = text.trim_end();
        (!text.is_empty()).then(|| text.to_string())
    }
}

fn trim_newline(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .unwrap_or(line)
}

fn starts_command(line: &str) -> bool {
    line.starts_with("/d/")
        || line
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn stops_response(line: &str) -> bool {
    line.starts_with("/d/")
        || line
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '#')
}

/// Matches a JSONP-style callback echo such as `func([[0,0.0,0.0],true]);`.
fn is_callback_echo(line: &str) -> bool {
    let name_len = line
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count();
    if name_len == 0 || !line[name_len..].starts_with('(') {
        return false;
    }
    let line = line.trim_end();
    line.ends_with(");") || line.ends_with(')')
}
