use ov_buffer::Buffer;

use crate::error::ParserError;

/// Outcome of a chainable parser's `decode` call.
///
/// `Answer`/`AnswerClose`/`Close`/`Done` exist for the generic parser
/// protocol (spec.md §4.6) and are produced by other parser kinds in a
/// chain (a framing or handshake layer that can respond autonomously);
/// [`crate::JsonParser`] itself only ever produces `Progress`,
/// `Success`, `Mismatch`, or `Error`.
#[derive(Debug)]
pub enum Decode {
    /// Not enough buffered input for a complete value yet.
    Progress,
    /// One complete value decoded; payload is its source bytes.
    Success(Buffer),
    /// Strict mode: input wasn't exactly one valid value. Buffered mode:
    /// first non-whitespace byte wasn't `{`. The parser's internal
    /// buffer is left unchanged so the caller can inspect it.
    Mismatch,
    /// Decode failed for a reason worth surfacing (see [`ParserError`]).
    Error(ParserError),
    /// A lower parser layer produced an autonomous response to send
    /// back to the peer; the connection stays open.
    Answer(Buffer),
    /// Like `Answer`, but the connection should be closed afterward.
    AnswerClose(Buffer),
    /// The peer requested the connection be closed; no response needed.
    Close,
    /// This parser stage has nothing further to contribute; later
    /// stages in a chain should be skipped for this input.
    Done,
}

impl Decode {
    pub fn is_success(&self) -> bool {
        matches!(self, Decode::Success(_))
    }
}
