//! Pipeline driver - matcher -> validator -> aggregator over a stream of lines

use crate::aggregate::{AggregationState, RankedMap};
use crate::error::LineError;
use crate::parser::{CommonLogMatcher, LineMatcher};
use crate::validate::validate;
use crate::ValidatedEntry;
use serde::Serialize;
use tracing::debug;

// PARSE RESULT //

/// Summary of one run. Field order is the JSON output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    #[serde(rename = "total_number_of_lines_processed")]
    pub total_processed: u64,

    #[serde(rename = "total_number_of_lines_ok")]
    pub total_ok: u64,

    #[serde(rename = "total_number_of_lines_failed")]
    pub total_failed: u64,

    pub top_client_ips: RankedMap<u64>,

    pub top_path_avg_seconds: RankedMap<f64>,
}

impl ParseResult {
    /// Two-space indented JSON, newline terminated.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

// PIPELINE //

/// Single-pass driver. Per-line failures only bump counters; nothing here
/// can abort a run.
pub struct Pipeline<'m, M: LineMatcher + ?Sized = CommonLogMatcher> {
    matcher: &'m M,
    state: AggregationState,
    processed: u64,
    ok: u64,
    failed: u64,
}

impl<'m, M: LineMatcher + ?Sized> Pipeline<'m, M> {
    pub fn new(matcher: &'m M) -> Self {
        Self {
            matcher,
            state: AggregationState::new(),
            processed: 0,
            ok: 0,
            failed: 0,
        }
    }

    /// Process one line. The error says why it was rejected; it has already
    /// been counted, so callers are free to ignore it.
    pub fn feed(&mut self, line: &str) -> Result<(), LineError> {
        self.processed += 1;

        match self.check(line) {
            Ok(entry) => {
                self.ok += 1;
                self.state.observe(&entry);
                Ok(())
            }
            Err(e) => {
                self.failed += 1;
                debug!(line = self.processed, matcher = self.matcher.name(), reason = %e, "Rejected line");
                Err(e)
            }
        }
    }

    fn check(&self, line: &str) -> Result<ValidatedEntry, LineError> {
        let raw = self
            .matcher
            .match_line(line)
            .ok_or(LineError::StructuralMismatch)?;
        Ok(validate(&raw)?)
    }

    /// Fold a pipeline that ran over another shard of the input into this one.
    pub fn absorb<N: LineMatcher + ?Sized>(&mut self, other: Pipeline<'_, N>) {
        self.processed += other.processed;
        self.ok += other.ok;
        self.failed += other.failed;
        self.state.merge(other.state);
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn ok(&self) -> u64 {
        self.ok
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    /// End of stream: rank both tallies and build the result.
    pub fn finish(self, max_clients: usize, max_paths: usize) -> ParseResult {
        let (top_client_ips, top_path_avg_seconds) = self.state.finalize(max_clients, max_paths);

        debug!(
            processed = self.processed,
            ok = self.ok,
            failed = self.failed,
            "Finished pipeline"
        );

        ParseResult {
            total_processed: self.processed,
            total_ok: self.ok,
            total_failed: self.failed,
            top_client_ips,
            top_path_avg_seconds,
        }
    }
}

/// Run every line through a fresh pipeline.
pub fn run<M, I, S>(matcher: &M, lines: I, max_clients: usize, max_paths: usize) -> ParseResult
where
    M: LineMatcher + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pipeline = Pipeline::new(matcher);
    for line in lines {
        // already counted
        let _ = pipeline.feed(line.as_ref());
    }
    pipeline.finish(max_clients, max_paths)
}
