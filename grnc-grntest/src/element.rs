//! Fixture element model.
//!
//! A parsed fixture file is an ordered list of [`GrnTestElement`]s. The enum is
//! closed and matched exhaustively everywhere; there is no open-ended "anything with
//! a type field" escape hatch.

/// One element of a parsed fixture file.
#[derive(Debug, Clone, PartialEq)]
pub enum GrnTestElement {
    Command(Command),
    Pragma(Pragma),
    /// Free-form commentary (`# ...` lines, joined).
    Note(String),
    /// A variable export (`#$NAME=value`).
    Export { name: String, value: String },
    /// Captured engine log output (`#|...` lines, joined).
    Log(String),
    /// A captured query-log block (`#>` through the matching `#<`, inclusive).
    QueryLog(String),
}

impl GrnTestElement {
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            GrnTestElement::Command(command) => Some(command),
            _ => None,
        }
    }
}

/// A command invocation and, in expected-output files, its recorded response.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// The logical source line, continuations joined.
    pub source: String,
    /// 1-based sequence count within the file. Negative means the call sits inside
    /// an error-tolerant region (`#@on-error omit` .. `#@on-error default`): it still
    /// participates in the sequence but its response is not asserted on.
    pub count: i64,
    pub name: String,
    /// The flat, pre-typing argument mapping, in command-line order.
    pub arguments: Vec<(String, String)>,
    pub response: Option<Response>,
}

impl Command {
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A recorded response: decoded when the captured text looked like JSON, otherwise
/// kept raw (dump output, callback echoes, xml/arrow payloads).
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Json(serde_json::Value),
    Raw(String),
}

/// A `#@directive arguments...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pragma {
    pub directive: String,
    pub arguments: Vec<String>,
}
