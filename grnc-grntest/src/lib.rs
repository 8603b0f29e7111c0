//! # Grnc GrnTest
//!
//! `grnc-grntest` parses the Groonga project's own `grntest` fixture corpus and turns
//! it into test source for this workspace's client.
//!
//! A test case in that corpus is a *fixture pair*: a "request" file of raw command
//! invocations, directives and notes, and a separately authored "expected" file with
//! the same command lines annotated by their captured responses. The two are
//! correlated only by an implicit, 1-based sequence count over commands.
//!
//! The pipeline has four stages:
//!
//! 1. **[`scanner::Scanner`]** — a line cursor that tokenizes the fixture text into
//!    commands, comment classes, and response blocks.
//! 2. **[`parser::parse`]** — drives the scanner into an ordered
//!    [`element::GrnTestElement`] list, tokenizing each command line through
//!    `grnc_core`'s command-line parser.
//! 3. **[`combiner::combine`]** — aligns a request stream against an expected stream
//!    by sequence count, back-filling responses, and rejects unreconcilable pairs.
//! 4. **[`convert::Converter`]** — emits one `#[tokio::test]` function per fixture
//!    pair, asserting each command's envelope against its recorded response.
//!
//! Parse failures abort the file they occur in; an unreconcilable pair is a
//! structured, skippable outcome, not an abort. Drivers (see the `grnc` CLI) decide
//! whether to continue with the remaining files.
pub mod combiner;
pub mod convert;
pub mod element;
pub mod parser;
pub mod scanner;
