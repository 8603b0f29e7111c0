//! # Command/Response Combiner
//!
//! A fixture pair's request and expected files are separately authored and share
//! nothing but the implicit sequence count over commands. [`combine`] aligns the two
//! streams by that count, back-filling every request command's response from its
//! expected counterpart.
//!
//! Before trusting the positional pairing, the maximum sequence counts of both
//! streams must match — a cheap necessary (not sufficient) consistency check. A
//! mismatch makes the pair *unreconcilable*: a structured outcome the caller can
//! skip and log, distinct from a parse failure.
use crate::element::{Command, GrnTestElement};
use std::collections::HashMap;

/// Failures produced while reconciling a fixture pair.
#[derive(Debug, thiserror::Error)]
pub enum CombineError {
    /// The streams cannot be aligned; skip the pair rather than abort the batch.
    #[error(
        "Fixture pair is unreconcilable: request has {request_max} commands but expected has {expected_max}"
    )]
    CountMismatch { request_max: i64, expected_max: i64 },
    #[error("Expected command #{count} ('{name}') carries no response")]
    MissingResponse { count: i64, name: String },
    #[error("No expected command carries count #{0}")]
    MissingCounterpart(i64),
}

/// Merges `request` and `expected` into one ordered stream.
///
/// Every request command with a positive count is replaced by its expected
/// counterpart (which carries the response); commands inside error-tolerant regions
/// (negative counts) and all non-command elements pass through untouched.
pub fn combine(
    request: Vec<GrnTestElement>,
    expected: &[GrnTestElement],
) -> Result<Vec<GrnTestElement>, CombineError> {
    let mut by_count: HashMap<i64, &Command> = HashMap::new();
    for element in expected {
        if let Some(command) = element.as_command()
            && command.count > 0
        {
            if command.response.is_none() {
                return Err(CombineError::MissingResponse {
                    count: command.count,
                    name: command.name.clone(),
                });
            }
            by_count.insert(command.count, command);
        }
    }

    let request_max = max_count(&request);
    let expected_max = max_count(expected);
    if request_max != expected_max {
        return Err(CombineError::CountMismatch {
            request_max,
            expected_max,
        });
    }

    request
        .into_iter()
        .map(|element| match element {
            GrnTestElement::Command(command) if command.count > 0 => by_count
                .get(&command.count)
                .map(|counterpart| GrnTestElement::Command((*counterpart).clone()))
                .ok_or(CombineError::MissingCounterpart(command.count)),
            other => Ok(other),
        })
        .collect()
}

fn max_count(elements: &[GrnTestElement]) -> i64 {
    elements
        .iter()
        .filter_map(|element| element.as_command().map(|command| command.count))
        .max()
        .unwrap_or(0)
}
