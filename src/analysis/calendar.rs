//! Calendar helpers: Indonesian month names and month arithmetic.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use std::fmt;

const MONTHS_LONG: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/// Fixed offset east of UTC; out-of-range hours fall back to UTC.
pub fn utc_offset(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Calendar date of `t` as seen at `offset`.
pub fn local_date(t: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    t.with_timezone(&offset).date_naive()
}

/// `d/m/yyyy`, the Indonesian short date style.
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based.
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Month `delta` months away (negative goes back).
    pub fn shift(self, delta: i32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 + delta;
        Self::new(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
    }

    /// e.g. "Januari"
    pub fn long_name(self) -> &'static str {
        MONTHS_LONG[(self.month as usize - 1) % 12]
    }

    /// e.g. "Agu"
    pub fn short_name(self) -> &'static str {
        MONTHS_SHORT[(self.month as usize - 1) % 12]
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.long_name(), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_shift_across_year() {
        let jan = YearMonth::new(2024, 1);
        assert_eq!(jan.shift(-1), YearMonth::new(2023, 12));
        assert_eq!(jan.shift(-2), YearMonth::new(2023, 11));
        assert_eq!(YearMonth::new(2023, 12).shift(1), jan);
        assert_eq!(jan.shift(0), jan);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(YearMonth::new(2024, 8).long_name(), "Agustus");
        assert_eq!(YearMonth::new(2024, 8).short_name(), "Agu");
        assert_eq!(YearMonth::new(2024, 5).to_string(), "Mei 2024");
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 20:00 UTC on the last day of March is already April in WIT
        let t = Utc.with_ymd_and_hms(2024, 3, 31, 20, 0, 0).unwrap();
        assert_eq!(
            local_date(t, utc_offset(9)),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
        assert_eq!(
            local_date(t, utc_offset(0)),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
        );
    }

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(format_date(d), "2/3/2024");
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        assert_eq!(utc_offset(99).local_minus_utc(), 0);
    }
}
