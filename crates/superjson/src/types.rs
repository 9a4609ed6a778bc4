//! Leaf types that plain JSON cannot represent: big integers, regular
//! expressions, error objects and ISO-8601 instants.
//!
//! URLs are carried as [`url::Url`] and instants as [`chrono::DateTime<Utc>`];
//! this module only adds the textual forms the wire format needs for them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::{Regex, RegexBuilder};

use crate::error::DecodeError;

// ----------------------------------------------------------------
// BigInt

/// Arbitrary-precision integer, stored as its canonical decimal text.
///
/// Canonical means: an optional `-`, then digits without leading zeros, and
/// never `-0`. This is exactly what `String(bigint)` produces on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigInt(String);

impl BigInt {
    /// Decimal digits, with a leading `-` for negative values.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.starts_with('-')
    }

    /// Returns the value as `i128` when it fits.
    pub fn to_i128(&self) -> Option<i128> {
        self.0.parse().ok()
    }
}

impl FromStr for BigInt {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::InvalidBigInt(s.to_string()));
        }
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            return Ok(BigInt("0".to_string()));
        }
        let mut out = String::with_capacity(trimmed.len() + 1);
        if negative {
            out.push('-');
        }
        out.push_str(trimmed);
        Ok(BigInt(out))
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! bigint_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for BigInt {
                fn from(v: $t) -> Self {
                    BigInt(v.to_string())
                }
            }
        )*
    };
}

bigint_from_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// ----------------------------------------------------------------
// RegExp

const REGEXP_FLAGS: &str = "dgimsuvy";

/// A regular expression as source text plus flags, e.g. `/^\d+$/gi`.
///
/// The source is kept verbatim; it is compiled on demand with
/// [`RegExp::to_regex`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegExp {
    source: String,
    flags: String,
}

impl RegExp {
    /// Creates a regular expression. Flags must be drawn from `dgimsuvy`
    /// without repetition.
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Result<Self, DecodeError> {
        let source = source.into();
        let flags = flags.into();
        let mut seen = String::new();
        for c in flags.chars() {
            if !REGEXP_FLAGS.contains(c) || seen.contains(c) {
                return Err(DecodeError::InvalidRegExp(format!("/{source}/{flags}")));
            }
            seen.push(c);
        }
        Ok(Self { source, flags })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }

    /// Compiles the source with the `regex` crate.
    ///
    /// `i`, `m`, `s` map onto the builder options of the same meaning and `u`
    /// turns on Unicode mode. `g`, `y` and `d` only affect how a match is
    /// driven and are ignored here.
    pub fn to_regex(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.source)
            .case_insensitive(self.has_flag('i'))
            .multi_line(self.has_flag('m'))
            .dot_matches_new_line(self.has_flag('s'))
            .unicode(self.has_flag('u') || self.has_flag('v'))
            .build()
    }
}

impl fmt::Display for RegExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl FromStr for RegExp {
    type Err = DecodeError;

    /// Parses the `/source/flags` literal form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let last = s.rfind('/').filter(|&i| i > 0 && s.starts_with('/'));
        match last {
            Some(i) => RegExp::new(&s[1..i], &s[i + 1..]),
            None => Err(DecodeError::InvalidRegExp(s.to_string())),
        }
    }
}

// ----------------------------------------------------------------
// Error objects

/// An exception value: constructor name, message and any extra properties
/// that were allowed through the codec options.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorObject {
    pub name: String,
    pub message: String,
    /// Extra enumerable properties (e.g. `code`, `stack`), kept as plain JSON.
    pub props: serde_json::Map<String, serde_json::Value>,
}

impl ErrorObject {
    /// An error with the default name `Error`.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_name("Error", message)
    }

    pub fn with_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            props: serde_json::Map::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

// ----------------------------------------------------------------
// Dates

/// Formats an instant the way `Date.prototype.toISOString` does:
/// millisecond precision, `Z` suffix, and a signed six-digit year outside
/// `0000..=9999`.
pub fn to_iso_string(date: &DateTime<Utc>) -> String {
    let year = date.year();
    let rest = date.format("%m-%dT%H:%M:%S%.3fZ");
    if (0..=9999).contains(&year) {
        format!("{year:04}-{rest}")
    } else if year < 0 {
        format!("-{:06}-{rest}", -(year as i64))
    } else {
        format!("+{year:06}-{rest}")
    }
}

/// Parses the output of [`to_iso_string`] as well as any RFC 3339 timestamp
/// and bare `YYYY-MM-DD` dates (taken as UTC midnight).
pub fn parse_iso_string(s: &str) -> Result<DateTime<Utc>, DecodeError> {
    let invalid = || DecodeError::InvalidDate(s.to_string());
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)));
    }
    // Expanded years: `+YYYYYY-` / `-YYYYYY-`.
    let sign = match s.as_bytes().first() {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return Err(invalid()),
    };
    let year: i32 = s.get(1..7).and_then(|y| y.parse().ok()).ok_or_else(invalid)?;
    let rest = s.get(8..).filter(|_| s.as_bytes().get(7) == Some(&b'-')).ok_or_else(invalid)?;
    let rest = rest.strip_suffix('Z').ok_or_else(invalid)?;
    let naive = NaiveDateTime::parse_from_str(&format!("2000-{rest}"), "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| invalid())?;
    naive
        .with_year(sign * year)
        .map(|n| Utc.from_utc_datetime(&n))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bigint_canonical_form() {
        assert_eq!("007".parse::<BigInt>().unwrap().as_str(), "7");
        assert_eq!("-0".parse::<BigInt>().unwrap().as_str(), "0");
        assert_eq!("-00120".parse::<BigInt>().unwrap().as_str(), "-120");
        assert!("1.5".parse::<BigInt>().is_err());
        assert!("".parse::<BigInt>().is_err());
        assert!("-".parse::<BigInt>().is_err());
        assert_eq!(BigInt::from(9_007_199_254_740_991i64).to_i128(), Some(9_007_199_254_740_991));
    }

    #[test]
    fn bigint_beyond_i128_is_kept() {
        let digits = "123456789012345678901234567890123456789012345678901234567890";
        let big: BigInt = digits.parse().unwrap();
        assert_eq!(big.to_string(), digits);
        assert_eq!(big.to_i128(), None);
    }

    #[test]
    fn regexp_literal_form() {
        let re: RegExp = "/test/gi".parse().unwrap();
        assert_eq!(re.source(), "test");
        assert_eq!(re.flags(), "gi");
        assert_eq!(re.to_string(), "/test/gi");

        let re: RegExp = r"/a/b/m".parse().unwrap();
        assert_eq!(re.source(), "a/b");
        assert_eq!(re.flags(), "m");

        assert!("test".parse::<RegExp>().is_err());
        assert!("/x/q".parse::<RegExp>().is_err());
        assert!("/x/gg".parse::<RegExp>().is_err());
    }

    #[test]
    fn regexp_compiles_with_flags() {
        let re = RegExp::new("test", "gi").unwrap().to_regex().unwrap();
        assert!(re.is_match("a TEST b"));
        let digits = RegExp::new(r"^\d+$", "").unwrap().to_regex().unwrap();
        assert!(digits.is_match("12345"));
        assert!(!digits.is_match("12a45"));
    }

    #[test]
    fn iso_strings() {
        let d = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_iso_string(&d), "2023-01-01T00:00:00.000Z");
        assert_eq!(parse_iso_string("2023-01-01T00:00:00.000Z").unwrap(), d);
        assert_eq!(parse_iso_string("2023-01-01").unwrap(), d);

        let far = Utc.with_ymd_and_hms(12345, 6, 7, 8, 9, 10).unwrap();
        let s = to_iso_string(&far);
        assert_eq!(s, "+012345-06-07T08:09:10.000Z");
        assert_eq!(parse_iso_string(&s).unwrap(), far);

        assert!(parse_iso_string("yesterday").is_err());
    }
}
