//! Date ranges for listing entries
//!
//! Ranges are picked as local calendar dates and sent to the service as
//! UTC instants: the start of the first day and `23:59:59` on the last.

use chrono::{
    DateTime, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc,
};
use serde::{Deserialize, Serialize};

use crate::{format_timestamp, ValidationError};

/// Quick-pick ranges ending today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePreset {
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "14d")]
    FourteenDays,
    #[serde(rename = "28d")]
    TwentyEightDays,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "12m")]
    TwelveMonths,
}

impl DatePreset {
    pub const ALL: [DatePreset; 6] = [
        Self::ThreeDays,
        Self::SevenDays,
        Self::FourteenDays,
        Self::TwentyEightDays,
        Self::ThreeMonths,
        Self::TwelveMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeDays => "3d",
            Self::SevenDays => "7d",
            Self::FourteenDays => "14d",
            Self::TwentyEightDays => "28d",
            Self::ThreeMonths => "3m",
            Self::TwelveMonths => "12m",
        }
    }

    /// First calendar day of the preset when it ends on `today`.
    ///
    /// Month arithmetic clamps to the end of shorter months
    /// (May 31 minus 3 months is Feb 29 in a leap year).
    pub fn start_date(&self, today: NaiveDate) -> NaiveDate {
        let start = match self {
            Self::ThreeDays => today.checked_sub_days(Days::new(3)),
            Self::SevenDays => today.checked_sub_days(Days::new(7)),
            Self::FourteenDays => today.checked_sub_days(Days::new(14)),
            Self::TwentyEightDays => today.checked_sub_days(Days::new(28)),
            Self::ThreeMonths => today.checked_sub_months(Months::new(3)),
            Self::TwelveMonths => today.checked_sub_months(Months::new(12)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

impl std::fmt::Display for DatePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatePreset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::new("preset", format!("unknown range preset '{s}'")))
    }
}

/// Inclusive UTC range used as `from`/`to` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::new("from", "must not be after 'to'"));
        }
        Ok(Self { from, to })
    }

    /// Range covering whole local calendar days `from..=to` in `tz`
    pub fn from_local_dates<Tz: TimeZone>(
        from: NaiveDate,
        to: NaiveDate,
        tz: &Tz,
    ) -> Result<Self, ValidationError> {
        Self::new(start_of_day(from, tz), end_of_day(to, tz))
    }

    /// Range for a preset ending on `today` in `tz`
    pub fn preset<Tz: TimeZone>(preset: DatePreset, today: NaiveDate, tz: &Tz) -> Self {
        Self {
            from: start_of_day(preset.start_date(today), tz),
            to: end_of_day(today, tz),
        }
    }

    /// `from` and `to` query parameters in wire format
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("from", format_timestamp(self.from)),
            ("to", format_timestamp(self.to)),
        ]
    }
}

/// UTC instant of local midnight starting `date`
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    local_to_utc(date.and_time(NaiveTime::MIN), tz)
}

/// UTC instant of `23:59:59` local time on `date`
pub fn end_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    local_to_utc(date.and_time(end), tz)
}

fn local_to_utc<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Skipped by a DST jump: use the first valid wall time after the gap
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => naive.and_utc(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_local_dates_in_utc() {
        let range = DateRange::from_local_dates(date(2024, 1, 1), date(2024, 1, 7), &Utc).unwrap();
        let [from, to] = range.query();
        assert_eq!(from, ("from", "2024-01-01T00:00:00.000Z".to_string()));
        assert_eq!(to, ("to", "2024-01-07T23:59:59.000Z".to_string()));
    }

    #[test]
    fn test_local_dates_with_offset() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        let range = DateRange::from_local_dates(date(2024, 1, 1), date(2024, 1, 1), &cet).unwrap();
        assert_eq!(format_timestamp(range.from), "2023-12-31T23:00:00.000Z");
        assert_eq!(format_timestamp(range.to), "2024-01-01T22:59:59.000Z");
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(DateRange::from_local_dates(date(2024, 2, 1), date(2024, 1, 1), &Utc).is_err());
    }

    #[test]
    fn test_preset_start_dates() {
        let today = date(2024, 5, 31);
        assert_eq!(DatePreset::ThreeDays.start_date(today), date(2024, 5, 28));
        assert_eq!(DatePreset::SevenDays.start_date(today), date(2024, 5, 24));
        assert_eq!(DatePreset::FourteenDays.start_date(today), date(2024, 5, 17));
        assert_eq!(DatePreset::TwentyEightDays.start_date(today), date(2024, 5, 3));
        assert_eq!(DatePreset::ThreeMonths.start_date(today), date(2024, 2, 29));
        assert_eq!(DatePreset::TwelveMonths.start_date(today), date(2023, 5, 31));
    }

    #[test]
    fn test_preset_range() {
        let range = DateRange::preset(DatePreset::SevenDays, date(2024, 1, 8), &Utc);
        assert_eq!(format_timestamp(range.from), "2024-01-01T00:00:00.000Z");
        assert_eq!(format_timestamp(range.to), "2024-01-08T23:59:59.000Z");
    }

    #[test]
    fn test_preset_parse() {
        for preset in DatePreset::ALL {
            assert_eq!(preset.as_str().parse::<DatePreset>().unwrap(), preset);
        }
        assert!("1w".parse::<DatePreset>().is_err());
    }
}
