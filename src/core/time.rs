//! core::time
//!
//! Textual encoding of time-valued entry attributes.
//!
//! # Formats
//!
//! The stored format is fixed-width UTC with microsecond precision:
//!
//! ```text
//! 2002-05-07T21:42:19.452017Z
//! ```
//!
//! Converting an instant to this string and back yields the identical
//! instant.
//!
//! An older format is still accepted on input, never produced:
//!
//! ```text
//! Tue 3 Oct 2000 14:10:02.000123 (day 277, dst 1, gmt_off -18000)
//! ```
//!
//! The clock fields of the old format are local time; `gmt_off` (seconds
//! east of UTC) converts them back to UTC. The day-of-year and DST flag are
//! read but carry no information the conversion needs.
//!
//! The display format is for humans only:
//!
//! ```text
//! 2002-06-23 11:13:02 +0300 (Sun, 23 Jun 2002)
//! ```
//!
//! The part before the parenthesis is machine parseable. The parenthesized
//! suffix is best effort and is dropped rather than failing.
//!
//! # Example
//!
//! ```
//! use wcadm::core::time::{from_cstring, to_cstring};
//!
//! let when = from_cstring("2002-05-07T21:42:19.452017Z").unwrap();
//! assert_eq!(to_cstring(&when), "2002-05-07T21:42:19.452017Z");
//! assert!(from_cstring("2002/05/07").is_err());
//! ```

use std::fmt::Write as _;

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Timelike, Utc,
};
use thiserror::Error;

/// Upper bound on the display string; the suffix is cut to stay below it.
pub const MAX_HUMAN_LENGTH: usize = 80;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Errors from timestamp decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    /// The string matches neither the stored nor the legacy format, or
    /// names a date that does not exist.
    #[error("bad date: '{0}'")]
    BadDate(String),
}

/// Encode an instant in the stored format.
pub fn to_cstring(when: &DateTime<Utc>) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}Z",
        when.year(),
        when.month(),
        when.day(),
        when.hour(),
        when.minute(),
        when.second(),
        // A leap second folds into the last microsecond of its minute.
        when.timestamp_subsec_micros().min(999_999),
    )
}

/// Decode a timestamp in the stored format, falling back to the legacy one.
///
/// # Errors
///
/// [`TimeError::BadDate`] if neither format matches, if the fields do not
/// name a real calendar instant, or if the instant falls outside years
/// 0000 to 9999.
///
/// The microsecond field is added to the clock time rather than range
/// checked, so `59.1500000` carries into the next second.
pub fn from_cstring(data: &str) -> Result<DateTime<Utc>, TimeError> {
    let bad_date = || TimeError::BadDate(data.to_string());

    match scan_primary(data) {
        Some(fields) => fields.to_utc().ok_or_else(bad_date),
        None => {
            let fields = scan_legacy(data).ok_or_else(bad_date)?;
            fields.to_utc().ok_or_else(bad_date)
        }
    }
}

/// Render an instant for display in the local time zone.
pub fn to_human_cstring(when: &DateTime<Utc>) -> String {
    to_human_cstring_in(when, &Local)
}

/// Render an instant for display in the given time zone.
///
/// Never fails: if the explanatory suffix cannot be produced, only the
/// machine parseable prefix is returned. A suffix that would reach
/// [`MAX_HUMAN_LENGTH`] is cut at the last character that fits.
pub fn to_human_cstring_in<Tz>(when: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let local = when.with_timezone(tz);
    let offset = local.offset().fix().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset_minutes = offset.unsigned_abs() / 60;

    let mut out = format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} {}{:02}{:02}",
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        local.minute(),
        local.second(),
        sign,
        offset_minutes / 60,
        offset_minutes % 60,
    );

    let mut suffix = String::new();
    if write!(suffix, "{}", local.format(" (%a, %d %b %Y)")).is_err() {
        log::debug!("dropping display suffix for {}", out);
        return out;
    }
    push_within(&mut out, &suffix, MAX_HUMAN_LENGTH - 1);
    out
}

/// Append as much of `tail` as keeps `out` within `limit` bytes, never
/// splitting a character.
fn push_within(out: &mut String, tail: &str, limit: usize) {
    let room = limit.saturating_sub(out.len());
    let end = tail
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= room)
        .last()
        .unwrap_or(0);
    out.push_str(&tail[..end]);
}

// ============================================================================
// Decoding internals
// ============================================================================

/// Calendar fields shared by both grammars.
#[derive(Debug, Default, PartialEq, Eq)]
struct ExplodedTime {
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
    micros: i64,
    gmt_offset: i64,
}

impl ExplodedTime {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::from_ymd_opt(
            i32::try_from(self.year).ok()?,
            u32::try_from(self.month).ok()?,
            u32::try_from(self.day).ok()?,
        )?;
        let time = NaiveTime::from_hms_opt(
            u32::try_from(self.hour).ok()?,
            u32::try_from(self.minute).ok()?,
            u32::try_from(self.second).ok()?,
        )?;
        let local = NaiveDateTime::new(date, time)
            .checked_add_signed(Duration::microseconds(self.micros))?;
        let utc = local.checked_sub_signed(Duration::try_seconds(self.gmt_offset)?)?;
        if !(0..=9999).contains(&utc.year()) {
            return None;
        }
        Some(Utc.from_utc_datetime(&utc))
    }
}

/// Scan `YYYY-MM-DDTHH:MM:SS.UUUUUUZ`.
///
/// Each field is a signed decimal integer; the separators must appear in
/// exactly this order. Anything after the final `Z` is ignored.
fn scan_primary(data: &str) -> Option<ExplodedTime> {
    let mut rest = data;
    let mut field = |sep: char| -> Option<i64> {
        let (value, after) = scan_long(rest)?;
        rest = after.strip_prefix(sep)?;
        Some(value)
    };

    Some(ExplodedTime {
        year: field('-')?,
        month: field('-')?,
        day: field('T')?,
        hour: field(':')?,
        minute: field(':')?,
        second: field('.')?,
        micros: field('Z')?,
        gmt_offset: 0,
    })
}

/// Scan `Www D Mmm YYYY HH:MM:SS.UUUUUU (day DDD, dst F, gmt_off OOOOOO)`.
///
/// Field widths follow the legacy writer: clock fields take at most two
/// characters, microseconds six, day-of-year three and the offset six.
fn scan_legacy(data: &str) -> Option<ExplodedTime> {
    let mut s = Scanner::new(data);

    let _weekday = s.word(3)?;
    let day = s.int(None)?;
    let month = s.word(3)?;
    let year = s.int(None)?;
    let hour = s.int(Some(2))?;
    s.literal(":")?;
    let minute = s.int(Some(2))?;
    s.literal(":")?;
    let second = s.int(Some(2))?;
    s.literal(".")?;
    let micros = s.int(Some(6))?;
    s.skip_space();
    s.literal("(day")?;
    s.skip_space();
    let _yday = s.int(Some(3))?;
    s.literal(",")?;
    s.skip_space();
    s.literal("dst")?;
    s.skip_space();
    let _dst = s.int(None)?;
    s.literal(",")?;
    s.skip_space();
    s.literal("gmt_off")?;
    s.skip_space();
    let gmt_offset = s.int(Some(6))?;

    // An unknown month gives no index and no calendar instant. The weekday
    // is implied by the date, so its name is read but not checked.
    let month_index = find_name(month, &MONTH_NAMES)?;

    Some(ExplodedTime {
        year,
        month: month_index as i64 + 1,
        day,
        hour,
        minute,
        second,
        micros,
        gmt_offset,
    })
}

fn find_name(name: &str, table: &[&str]) -> Option<usize> {
    table.iter().position(|candidate| *candidate == name)
}

/// Parse a leading signed decimal integer, skipping leading whitespace.
///
/// Returns `None` when no digits are present or the value overflows.
fn scan_long(input: &str) -> Option<(i64, &str)> {
    let trimmed = input.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    let value = trimmed[..end].parse().ok()?;
    Some((value, &trimmed[end..]))
}

/// A small cursor with the matching rules of formatted scanning:
/// conversions skip leading whitespace, literals must match exactly.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn skip_space(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// Up to `max` non-whitespace characters, at least one.
    fn word(&mut self, max: usize) -> Option<&'a str> {
        self.skip_space();
        let end = self
            .rest
            .char_indices()
            .take(max)
            .take_while(|(_, c)| !c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .last()?;
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(word)
    }

    /// A signed integer of at most `width` characters (sign included).
    fn int(&mut self, width: Option<usize>) -> Option<i64> {
        self.skip_space();
        let bytes = self.rest.as_bytes();
        let limit = width.unwrap_or(usize::MAX).min(bytes.len());
        let mut end = 0;
        if end < limit && matches!(bytes[end], b'+' | b'-') {
            end += 1;
        }
        let digits_start = end;
        while end < limit && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            return None;
        }
        let value = self.rest[..end].parse().ok()?;
        self.rest = &self.rest[end..];
        Some(value)
    }

    fn literal(&mut self, expected: &str) -> Option<()> {
        self.rest = self.rest.strip_prefix(expected)?;
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, us: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&NaiveDateTime::new(
            NaiveDate::from_ymd_opt(y, mo, d).unwrap(),
            NaiveTime::from_hms_micro_opt(h, mi, s, us).unwrap(),
        ))
    }

    mod encode {
        use super::*;

        #[test]
        fn fixed_width_fields() {
            let when = utc(2002, 5, 7, 21, 42, 19, 452017);
            assert_eq!(to_cstring(&when), "2002-05-07T21:42:19.452017Z");
        }

        #[test]
        fn zero_pads_small_values() {
            let when = utc(987, 1, 2, 3, 4, 5, 6);
            assert_eq!(to_cstring(&when), "0987-01-02T03:04:05.000006Z");
        }
    }

    mod decode_primary {
        use super::*;

        #[test]
        fn decodes_stored_format() {
            let when = from_cstring("2001-08-31T04:24:14.966996Z").unwrap();
            assert_eq!(when, utc(2001, 8, 31, 4, 24, 14, 966996));
        }

        #[test]
        fn roundtrip_is_exact() {
            let when = utc(2024, 2, 29, 23, 59, 59, 999999);
            assert_eq!(from_cstring(&to_cstring(&when)).unwrap(), when);
        }

        #[test]
        fn ignores_trailing_text() {
            let when = from_cstring("2001-08-31T04:24:14.000001Zjunk").unwrap();
            assert_eq!(when, utc(2001, 8, 31, 4, 24, 14, 1));
        }

        /// Day and month are checked, not rolled over: Feb 30 is an error
        /// rather than Mar 2.
        #[test]
        fn impossible_calendar_date_is_rejected_not_rolled_over() {
            assert_eq!(
                from_cstring("2001-02-30T00:00:00.000000Z"),
                Err(TimeError::BadDate("2001-02-30T00:00:00.000000Z".into()))
            );
            assert!(from_cstring("2001-13-01T00:00:00.000000Z").is_err());
            assert!(from_cstring("2001-01-01T24:00:00.000000Z").is_err());
        }

        #[test]
        fn microsecond_overflow_carries() {
            let when = from_cstring("2016-12-31T23:59:59.1500000Z").unwrap();
            assert_eq!(when, utc(2017, 1, 1, 0, 0, 0, 500000));
            assert_eq!(to_cstring(&when), "2017-01-01T00:00:00.500000Z");

            let when = from_cstring("2001-01-01T00:00:00.-1Z").unwrap();
            assert_eq!(when, utc(2000, 12, 31, 23, 59, 59, 999999));
        }

        #[test]
        fn decoded_instants_reencode_at_fixed_width() {
            for text in [
                "2016-12-31T23:59:59.1500000Z",
                "2016-12-31T23:59:59.999999Z",
                "0000-01-01T00:00:00.000000Z",
                "9999-12-31T23:59:59.999999Z",
                "Sat 31 Dec 2016 23:59:59.999999 (day 366, dst 0, gmt_off -3600)",
            ] {
                let when = from_cstring(text).unwrap();
                assert_eq!(to_cstring(&when).len(), 27, "{text}");
            }
        }

        #[test]
        fn years_outside_four_digits_are_bad() {
            assert!(from_cstring("10000-01-01T00:00:00.000000Z").is_err());
            assert!(from_cstring("9999-12-31T23:59:59.1000000Z").is_err());
            assert!(from_cstring("-0001-01-01T00:00:00.000000Z").is_err());
        }

        #[test]
        fn separator_mismatch_is_bad() {
            assert!(matches!(
                from_cstring("2002/05/07"),
                Err(TimeError::BadDate(s)) if s == "2002/05/07"
            ));
            assert!(from_cstring("2002-05-07 21:42:19.452017Z").is_err());
            assert!(from_cstring("").is_err());
            assert!(from_cstring("2002-05-07T21:42:19.452017").is_err());
        }
    }

    mod decode_legacy {
        use super::*;

        #[test]
        fn legacy_matches_primary_equivalent() {
            let legacy =
                from_cstring("Tue 3 Oct 2000 14:10:02.000123 (day 277, dst 1, gmt_off -18000)")
                    .unwrap();
            let primary = from_cstring("2000-10-03T19:10:02.000123Z").unwrap();
            assert_eq!(legacy, primary);
        }

        #[test]
        fn legacy_with_zero_offset() {
            let when =
                from_cstring("Sat 1 Jan 2000 00:00:00.000000 (day 001, dst 0, gmt_off 000000)")
                    .unwrap();
            assert_eq!(when, utc(2000, 1, 1, 0, 0, 0, 0));
        }

        #[test]
        fn legacy_positive_offset_crosses_midnight() {
            let when =
                from_cstring("Sun 23 Jun 2002 01:13:02.500000 (day 174, dst 1, gmt_off 10800)")
                    .unwrap();
            assert_eq!(when, utc(2002, 6, 22, 22, 13, 2, 500000));
        }

        #[test]
        fn unknown_month_name_is_bad() {
            assert!(from_cstring(
                "Tue 3 Okt 2000 14:10:02.000123 (day 277, dst 1, gmt_off -18000)"
            )
            .is_err());
        }

        #[test]
        fn unknown_weekday_name_is_ignored() {
            let when = from_cstring(
                "Dns 3 Oct 2000 14:10:02.000123 (day 277, dst 1, gmt_off -18000)",
            )
            .unwrap();
            assert_eq!(to_cstring(&when), "2000-10-03T19:10:02.000123Z");
        }

        #[test]
        fn truncated_suffix_is_bad() {
            assert!(from_cstring("Tue 3 Oct 2000 14:10:02.000123 (day 277, dst 1)").is_err());
            assert!(from_cstring("Tue 3 Oct 2000 14:10:02.000123").is_err());
        }
    }

    mod human {
        use super::*;

        #[test]
        fn renders_prefix_and_suffix() {
            let tz = FixedOffset::east_opt(3 * 3600).unwrap();
            let when = utc(2002, 6, 23, 8, 13, 2, 0);
            assert_eq!(
                to_human_cstring_in(&when, &tz),
                "2002-06-23 11:13:02 +0300 (Sun, 23 Jun 2002)"
            );
        }

        #[test]
        fn negative_offset_with_minutes() {
            let tz = FixedOffset::west_opt(3 * 3600 + 30 * 60).unwrap();
            let when = utc(2000, 1, 1, 12, 0, 0, 0);
            let text = to_human_cstring_in(&when, &tz);
            assert!(text.starts_with("2000-01-01 08:30:00 -0330"), "{text}");
        }

        #[test]
        fn sub_hour_negative_offset_keeps_sign() {
            let tz = FixedOffset::west_opt(30 * 60).unwrap();
            let when = utc(2000, 1, 1, 12, 0, 0, 0);
            assert!(to_human_cstring_in(&when, &tz).starts_with("2000-01-01 11:30:00 -0030"));
        }

        #[test]
        fn prefix_is_parseable_by_chrono() {
            let tz = FixedOffset::east_opt(0).unwrap();
            let when = utc(1999, 12, 31, 23, 59, 59, 0);
            let text = to_human_cstring_in(&when, &tz);
            let prefix = &text[..25];
            let parsed = DateTime::parse_from_str(prefix, "%Y-%m-%d %H:%M:%S %z").unwrap();
            assert_eq!(parsed.with_timezone(&Utc), when);
        }

        #[test]
        fn suffix_is_cut_to_fit() {
            let mut out = String::from("2002-06-23");
            push_within(&mut out, " (Sun, 23 Jun 2002)", 16);
            assert_eq!(out, "2002-06-23 (Sun,");

            let mut out = String::from("abc");
            push_within(&mut out, "\u{e9}\u{e9}", 6);
            assert_eq!(out, "abc\u{e9}");

            let mut out = String::from("full");
            push_within(&mut out, "more", 4);
            assert_eq!(out, "full");
        }

        #[test]
        fn local_rendering_never_panics() {
            let text = to_human_cstring(&Utc::now());
            assert!(text.len() >= 25);
            assert!(text.len() < MAX_HUMAN_LENGTH);
        }
    }

    mod scanner {
        use super::*;

        #[test]
        fn scan_long_handles_sign_and_whitespace() {
            assert_eq!(scan_long("  -42x"), Some((-42, "x")));
            assert_eq!(scan_long("+7"), Some((7, "")));
            assert_eq!(scan_long("x"), None);
            assert_eq!(scan_long("-"), None);
        }

        #[test]
        fn int_respects_width() {
            let mut s = Scanner::new("123456");
            assert_eq!(s.int(Some(2)), Some(12));
            assert_eq!(s.int(Some(3)), Some(345));
            assert_eq!(s.int(None), Some(6));
        }

        #[test]
        fn word_stops_at_width_or_space() {
            let mut s = Scanner::new("Tuesday 3");
            assert_eq!(s.word(3), Some("Tue"));
            let mut s = Scanner::new("Tu 3");
            assert_eq!(s.word(3), Some("Tu"));
            assert_eq!(s.int(None), Some(3));
        }
    }
}
