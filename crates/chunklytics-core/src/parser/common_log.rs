// Common Log Format matcher (with response time and user agent)

use super::{LineMatcher, RawFields};
use regex::Regex;

// <addr> - <user> [<date>] "<VERB> <path> <version>" <code> <time> "<agent>"
// addr is any non-space token so IPv6 clients reach the validator.
const ACCESS_PATTERN: &str = concat!(
    r#"^(?P<remote_addr>\S+) - (?P<remote_user>.*?) \[(?P<date>.*?)\] "#,
    r#""(?P<http_verb>\w+) (?P<http_path>.*?) (?P<http_version>HTTP/[0-9]\.[0-9])" "#,
    r#"(?P<http_response_code>[0-9]+) (?P<http_response_time_milliseconds>[0-9]+) "#,
    r#""(?P<user_agent_string>.*)"$"#,
);

/// Compiled once and shared by reference with every [`crate::Pipeline`].
#[derive(Debug, Clone)]
pub struct CommonLogMatcher {
    access_pattern: Regex,
}

impl CommonLogMatcher {
    pub fn new() -> Self {
        Self {
            access_pattern: Regex::new(ACCESS_PATTERN).expect("access log pattern compiles"),
        }
    }
}

impl Default for CommonLogMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMatcher for CommonLogMatcher {
    fn name(&self) -> &'static str {
        "common"
    }

    fn match_line<'a>(&self, line: &'a str) -> Option<RawFields<'a>> {
        // the line terminator never takes part in the match
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let caps = self.access_pattern.captures(line)?;
        let field = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or("");

        Some(RawFields {
            remote_addr: field("remote_addr"),
            remote_user: field("remote_user"),
            date: field("date"),
            http_verb: field("http_verb"),
            http_path: field("http_path"),
            http_version: field("http_version"),
            http_response_code: field("http_response_code"),
            http_response_time_milliseconds: field("http_response_time_milliseconds"),
            user_agent_string: field("user_agent_string"),
        })
    }
}
