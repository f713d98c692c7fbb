use std::fmt;

use chrono::{DateTime, FixedOffset, Local, TimeZone};

use crate::error::{ObjectError, ObjectResult};

/// Largest representable offset: `±99:59`.
const MAX_OFFSET_MINUTES: i16 = 99 * 60 + 59;

/// Identity and time stamp of an author, committer or tagger.
///
/// Text form: `Name <email> <unix-seconds> <+hhmm>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Offset from UTC in minutes.
    pub tz_offset_minutes: i16,
}

impl Signature {
    /// Build a signature, rejecting fields the text form cannot carry.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: i64,
        tz_offset_minutes: i16,
    ) -> ObjectResult<Self> {
        let sig = Self {
            name: name.into(),
            email: email.into(),
            timestamp,
            tz_offset_minutes,
        };
        sig.validate().map_err(ObjectError::InvalidSignature)?;
        Ok(sig)
    }

    /// Signature stamped with the current local time and offset.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> ObjectResult<Self> {
        let now = Local::now();
        let offset_minutes = now.offset().local_minus_utc() / 60;
        let tz = i16::try_from(offset_minutes)
            .map_err(|_| ObjectError::InvalidSignature(format!("offset {offset_minutes}m")))?;
        Self::new(name, email, now.timestamp(), tz)
    }

    /// The stamp as a zoned date-time, when it is representable.
    pub fn datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(i32::from(self.tz_offset_minutes) * 60)?;
        offset.timestamp_opt(self.timestamp, 0).single()
    }

    /// Parse the text form. Only the canonical spelling is accepted.
    pub fn parse(text: &str) -> Result<Self, String> {
        let lt = text
            .find('<')
            .ok_or_else(|| format!("missing '<' in {text:?}"))?;
        let name = text[..lt]
            .strip_suffix(' ')
            .ok_or_else(|| format!("missing space before '<' in {text:?}"))?;
        let rest = &text[lt + 1..];
        let gt = rest
            .find('>')
            .ok_or_else(|| format!("missing '>' in {text:?}"))?;
        let email = &rest[..gt];
        let stamp = rest[gt + 1..]
            .strip_prefix(' ')
            .ok_or_else(|| format!("missing time stamp in {text:?}"))?;
        let (secs, offset) = stamp
            .split_once(' ')
            .ok_or_else(|| format!("missing timezone in {text:?}"))?;

        let timestamp = secs
            .parse::<i64>()
            .ok()
            .filter(|v| v.to_string() == secs)
            .ok_or_else(|| format!("invalid timestamp {secs:?}"))?;
        let tz_offset_minutes =
            parse_offset(offset).ok_or_else(|| format!("invalid timezone {offset:?}"))?;

        let sig = Self {
            name: name.to_string(),
            email: email.to_string(),
            timestamp,
            tz_offset_minutes,
        };
        sig.validate()?;
        Ok(sig)
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name is empty".into());
        }
        for (field, value) in [("name", &self.name), ("email", &self.email)] {
            if value.contains(['<', '>', '\n']) {
                return Err(format!("{field} {value:?} contains '<', '>' or a newline"));
            }
        }
        if self.tz_offset_minutes.unsigned_abs() > MAX_OFFSET_MINUTES.unsigned_abs() {
            return Err(format!("offset {} minutes out of range", self.tz_offset_minutes));
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tz_offset_minutes < 0 { '-' } else { '+' };
        let abs = self.tz_offset_minutes.unsigned_abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.timestamp,
            sign,
            abs / 60,
            abs % 60
        )
    }
}

/// `+hhmm` / `-hhmm`. `-0000` is not canonical and is rejected.
fn parse_offset(raw: &str) -> Option<i16> {
    let bytes = raw.as_bytes();
    if bytes.len() != 5 || !bytes[1..].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let hours: i16 = raw[1..3].parse().ok()?;
    let minutes: i16 = raw[3..5].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    let total = hours * 60 + minutes;
    match bytes[0] {
        b'+' => Some(total),
        b'-' if total != 0 => Some(-total),
        _ => None,
    }
}
