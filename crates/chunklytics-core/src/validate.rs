//! Field validation - turn matched raw fields into a [`ValidatedEntry`]
//!
//! Pure functions only. A line is valid when every field is valid; the first
//! failing field is returned as the reason.

use crate::error::FieldError;
use crate::parser::RawFields;
use crate::{HttpMethod, ValidatedEntry};
use chrono::DateTime;
use std::net::{IpAddr, Ipv4Addr};

/// Common Log Format timestamp, e.g. `10/Oct/2000:13:55:36 -0700`
pub const CLF_TIMESTAMP: &str = "%d/%b/%Y:%H:%M:%S %z";

pub fn validate(raw: &RawFields<'_>) -> Result<ValidatedEntry, FieldError> {
    let remote_addr = canonical_address(raw.remote_addr)
        .ok_or_else(|| FieldError::Address(raw.remote_addr.to_string()))?;

    check_timestamp(raw.date)?;

    let http_verb = HttpMethod::from_token(raw.http_verb)
        .ok_or_else(|| FieldError::Method(raw.http_verb.to_string()))?;

    let http_path = normalize_path(raw.http_path);
    let http_response_code = response_code(raw.http_response_code)?;
    let http_response_time_milliseconds = response_time(raw.http_response_time_milliseconds)?;

    Ok(ValidatedEntry {
        remote_addr: remote_addr.to_string(),
        date: raw.date.to_string(),
        http_verb,
        http_path,
        http_response_code,
        http_response_time_milliseconds,
    })
}

/// Parse an IPv4 or IPv6 address in short or long form.
/// The returned address displays in its canonical shorthand.
pub fn canonical_address(text: &str) -> Option<IpAddr> {
    text.parse::<IpAddr>()
        .ok()
        .or_else(|| zero_padded_ipv4(text).map(IpAddr::V4))
}

// dotted quad with leading zeros ("010.000.000.001"), octets read as decimal
fn zero_padded_ipv4(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');

    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

fn check_timestamp(date: &str) -> Result<(), FieldError> {
    // chrono's %Y also takes signed and short years, CLF is four digits
    let four_digit_year = date
        .split(':')
        .next()
        .and_then(|day| day.rsplit('/').next())
        .is_some_and(|year| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()));

    if !four_digit_year {
        return Err(FieldError::Timestamp(date.to_string()));
    }

    DateTime::parse_from_str(date, CLF_TIMESTAMP)
        .map(|_| ())
        .map_err(|_| FieldError::Timestamp(date.to_string()))
}

/// Percent-decode the path, then drop everything from the first `?`.
/// Never fails: bytes that are not UTF-8 become U+FFFD.
pub fn normalize_path(path: &str) -> String {
    let bytes = urlencoding::decode_binary(path.as_bytes());
    let decoded = String::from_utf8_lossy(&bytes);

    match decoded.split_once('?') {
        Some((before, _query)) => before.to_string(),
        None => decoded.into_owned(),
    }
}

// exactly three characters and within 100..=599, so "0200" and "99" fail
fn response_code(text: &str) -> Result<u16, FieldError> {
    if text.chars().count() == 3 {
        if let Ok(code) = text.parse::<u16>() {
            if (100..=599).contains(&code) {
                return Ok(code);
            }
        }
    }
    Err(FieldError::ResponseCode(text.to_string()))
}

fn response_time(text: &str) -> Result<u64, FieldError> {
    text.parse::<i128>()
        .ok()
        .filter(|ms| *ms >= 0)
        .and_then(|ms| u64::try_from(ms).ok())
        .ok_or_else(|| FieldError::ResponseTime(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw() -> RawFields<'static> {
        RawFields {
            remote_addr: "192.168.1.20",
            remote_user: "-",
            date: "08/Feb/2024:10:30:00 +0000",
            http_verb: "GET",
            http_path: "/index.html",
            http_version: "HTTP/1.1",
            http_response_code: "200",
            http_response_time_milliseconds: "120",
            user_agent_string: "curl/8.0",
        }
    }

    #[test]
    fn test_valid_entry() {
        let entry = validate(&raw()).unwrap();
        assert_eq!(
            entry,
            ValidatedEntry {
                remote_addr: "192.168.1.20".to_string(),
                date: "08/Feb/2024:10:30:00 +0000".to_string(),
                http_verb: HttpMethod::Get,
                http_path: "/index.html".to_string(),
                http_response_code: 200,
                http_response_time_milliseconds: 120,
            }
        );
    }

    #[test]
    fn test_address_canonical_forms() {
        let cases = [
            ("192.168.001.001", "192.168.1.1"),
            ("010.000.000.009", "10.0.0.9"),
            ("2001:0db8:0000:0000:0000:0000:0000:0001", "2001:db8::1"),
            ("FE80:0:0:0:0:0:0:1", "fe80::1"),
            ("::1", "::1"),
            ("0:0:0:0:0:0:0:0", "::"),
        ];
        for (input, expected) in cases {
            let entry = validate(&RawFields { remote_addr: input, ..raw() }).unwrap();
            assert_eq!(entry.remote_addr, expected, "input {input}");
        }
    }

    #[test]
    fn test_address_rejects() {
        for input in ["999.999.999.999", "256.1.1.1", "1.2.3", "1.2.3.4.5", "0001.2.3.4", "localhost", "-", "fe80::1%eth0", "1..2.3"] {
            let result = validate(&RawFields { remote_addr: input, ..raw() });
            assert_eq!(result, Err(FieldError::Address(input.to_string())));
        }
    }

    #[test]
    fn test_timestamp() {
        for date in ["10/Oct/2000:13:55:36 -0700", "01/Jan/2024:00:00:00 +1400", "31/Dec/1999:23:59:59 -1200"] {
            assert!(validate(&RawFields { date, ..raw() }).is_ok(), "date {date}");
        }
        for date in [
            "2024-02-08T10:30:00Z",
            "08/Feb/2024:10:30:00",
            "30/Feb/2024:10:30:00 +0000",
            "08/Foo/2024:10:30:00 +0000",
            "10/Oct/+2000:13:55:36 -0700",
            "10/Oct/-2000:13:55:36 -0700",
            "10/Oct/200:13:55:36 -0700",
            "10/Oct/02000:13:55:36 -0700",
            "",
        ] {
            assert_eq!(
                validate(&RawFields { date, ..raw() }),
                Err(FieldError::Timestamp(date.to_string()))
            );
        }
    }

    #[test]
    fn test_method() {
        assert_eq!(validate(&RawFields { http_verb: "PATCH", ..raw() }).unwrap().http_verb, HttpMethod::Patch);
        assert_eq!(
            validate(&RawFields { http_verb: "get", ..raw() }),
            Err(FieldError::Method("get".to_string()))
        );
        assert_eq!(
            validate(&RawFields { http_verb: "PROPFIND", ..raw() }),
            Err(FieldError::Method("PROPFIND".to_string()))
        );
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(normalize_path("/a%20b?x=1"), "/a b");
        assert_eq!(normalize_path("/search?q=1?2"), "/search");
        // decoded %3F is a query separator too
        assert_eq!(normalize_path("/a%3Fb"), "/a");
        assert_eq!(normalize_path("/caf%C3%A9"), "/café");
        assert_eq!(normalize_path("/a+b"), "/a+b");
        assert_eq!(normalize_path("?only=query"), "");
        assert_eq!(normalize_path("/100%zz"), "/100%zz");
    }

    #[test]
    fn test_path_invalid_utf8_is_replaced() {
        assert_eq!(normalize_path("/%FF%FE"), "/\u{FFFD}\u{FFFD}");
        assert_eq!(normalize_path("/%FF?x=%FE"), "/\u{FFFD}");

        let entry = validate(&RawFields { http_path: "/%FF%FE", ..raw() }).unwrap();
        assert_eq!(entry.http_path, "/\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_response_code_boundaries() {
        for code in ["100", "200", "404", "599"] {
            assert!(validate(&RawFields { http_response_code: code, ..raw() }).is_ok(), "code {code}");
        }
        for code in ["99", "0200", "600", "099", "000", "1000", "abc", "+99", ""] {
            assert_eq!(
                validate(&RawFields { http_response_code: code, ..raw() }),
                Err(FieldError::ResponseCode(code.to_string())),
                "code {code}"
            );
        }
    }

    #[test]
    fn test_response_time() {
        let entry = validate(&RawFields { http_response_time_milliseconds: "0", ..raw() }).unwrap();
        assert_eq!(entry.http_response_time_milliseconds, 0);

        for time in ["-1", "1.5", "abc", "", "18446744073709551616"] {
            assert_eq!(
                validate(&RawFields { http_response_time_milliseconds: time, ..raw() }),
                Err(FieldError::ResponseTime(time.to_string())),
                "time {time}"
            );
        }
    }

    #[test]
    fn test_first_failing_field_wins() {
        let fields = RawFields { remote_addr: "nope", http_verb: "get", ..raw() };
        assert_eq!(validate(&fields), Err(FieldError::Address("nope".to_string())));
    }
}
