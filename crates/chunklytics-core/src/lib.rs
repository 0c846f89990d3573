//! Core pipeline for access log analytics
//! this crate holds the line matcher, field validator, aggregator and the driver that ties them together.
pub mod aggregate;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod validate;

pub use aggregate::{AggregationState, PathStats, RankedMap, MAX_TOP_N};
pub use error::{FieldError, LineError};
pub use parser::{CommonLogMatcher, LineMatcher, RawFields};
pub use pipeline::{run, ParseResult, Pipeline};
pub use validate::validate;

use serde::{Deserialize, Serialize};
use std::fmt;

// HTTP METHOD //

/// Request methods accepted in a log line (RFC 7231 plus PATCH from RFC 5789)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl HttpMethod {
    /// Parse a method token. Case-sensitive: `get` is not a method.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "CONNECT" => Some(Self::Connect),
            "DELETE" => Some(Self::Delete),
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "PATCH" => Some(Self::Patch),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// VALIDATED ENTRY //

/// A log line whose fields all passed validation.
/// Only [`validate`] builds one, so holding a value means every field is good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedEntry {
    pub remote_addr: String, // canonical IPv4/IPv6 text

    pub date: String, // CLF timestamp as logged, checked but not converted

    pub http_verb: HttpMethod,

    pub http_path: String, // percent-decoded, query dropped

    pub http_response_code: u16, // 100..=599

    pub http_response_time_milliseconds: u64,
}
