//! line matcher - split a raw access log line into named fields

pub mod common_log;

pub use common_log::CommonLogMatcher;

/// Named captures from one log line, borrowed from the line itself.
/// Nothing here is checked beyond the line's shape; see [`crate::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFields<'a> {
    pub remote_addr: &'a str,
    pub remote_user: &'a str,
    pub date: &'a str,
    pub http_verb: &'a str,
    pub http_path: &'a str,
    pub http_version: &'a str,
    pub http_response_code: &'a str,
    pub http_response_time_milliseconds: &'a str,
    pub user_agent_string: &'a str,
}

// Matcher trait - the pipeline drives any implementation of this

pub trait LineMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means the line failed the structural match.
    fn match_line<'a>(&self, line: &'a str) -> Option<RawFields<'a>>;
}
