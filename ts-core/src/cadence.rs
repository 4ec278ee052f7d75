use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SeriesError;
use crate::{Timestamp, DAY_MS, HOUR_MS, MINUTE_MS, MS};

/// 1970-01-05, the first Monday after the epoch. Weekly buckets start here.
const WEEK_ANCHOR_MS: i64 = 4 * DAY_MS;
/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i64 = 719_163;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// Fixed spacing between consecutive entries of a series, e.g. 1 day or 4 hours.
///
/// Buckets of sub-week cadences are aligned on multiples of their length since
/// the epoch. Weekly buckets start on Monday 00:00 UTC and monthly buckets on
/// the first day of a calendar month, so `timeframes_between` counts calendar
/// boundaries rather than dividing milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cadence {
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
    Days(u32),
    Weeks(u32),
    Months(u32),
}

impl Cadence {
    pub fn new(unit: CadenceUnit, multiplier: u32) -> Self {
        match unit {
            CadenceUnit::Second => Cadence::Seconds(multiplier),
            CadenceUnit::Minute => Cadence::Minutes(multiplier),
            CadenceUnit::Hour => Cadence::Hours(multiplier),
            CadenceUnit::Day => Cadence::Days(multiplier),
            CadenceUnit::Week => Cadence::Weeks(multiplier),
            CadenceUnit::Month => Cadence::Months(multiplier),
        }
    }

    pub fn unit(&self) -> CadenceUnit {
        match self {
            Cadence::Seconds(_) => CadenceUnit::Second,
            Cadence::Minutes(_) => CadenceUnit::Minute,
            Cadence::Hours(_) => CadenceUnit::Hour,
            Cadence::Days(_) => CadenceUnit::Day,
            Cadence::Weeks(_) => CadenceUnit::Week,
            Cadence::Months(_) => CadenceUnit::Month,
        }
    }

    /// Multiplier of the unit. A zero multiplier behaves as 1.
    pub fn multiplier(&self) -> u32 {
        let m = match *self {
            Cadence::Seconds(m)
            | Cadence::Minutes(m)
            | Cadence::Hours(m)
            | Cadence::Days(m)
            | Cadence::Weeks(m)
            | Cadence::Months(m) => m,
        };
        m.max(1)
    }

    /// Nominal duration in milliseconds (months approximated as 30 days),
    /// saturating at `i64::MAX`.
    pub fn duration_ms(&self) -> i64 {
        self.checked_duration_ms().unwrap_or(i64::MAX)
    }

    fn checked_duration_ms(&self) -> Option<i64> {
        let unit_ms = match self.unit() {
            CadenceUnit::Second => MS,
            CadenceUnit::Minute => MINUTE_MS,
            CadenceUnit::Hour => HOUR_MS,
            CadenceUnit::Day => DAY_MS,
            CadenceUnit::Week => 7 * DAY_MS,
            CadenceUnit::Month => 30 * DAY_MS,
        };
        i64::from(self.multiplier()).checked_mul(unit_ms)
    }

    /// Human-readable name, the inverse of `FromStr` ("5m", "4h", "1M").
    pub fn name(&self) -> String {
        let m = self.multiplier();
        match self.unit() {
            CadenceUnit::Second => format!("{m}s"),
            CadenceUnit::Minute => format!("{m}m"),
            CadenceUnit::Hour => format!("{m}h"),
            CadenceUnit::Day => format!("{m}d"),
            CadenceUnit::Week => format!("{m}w"),
            CadenceUnit::Month => format!("{m}M"),
        }
    }

    /// Returns true if `self` divides `other` (e.g. 1m divides 5m, 1M divides 3M).
    pub fn divides(&self, other: Cadence) -> bool {
        match (self.unit(), other.unit()) {
            (CadenceUnit::Month, CadenceUnit::Month) => {
                other.multiplier() % self.multiplier() == 0
            }
            (CadenceUnit::Month, _) | (_, CadenceUnit::Month) => false,
            _ => other.duration_ms() % self.duration_ms() == 0,
        }
    }

    /// Start of the bucket containing `t`.
    pub fn truncate(&self, t: Timestamp) -> Timestamp {
        if self.unit() == CadenceUnit::Month {
            return match civil(t) {
                Some((date, _)) => {
                    let m = self.multiplier() as i64;
                    let bucket = month_index(date).div_euclid(m);
                    month_start(bucket * m).unwrap_or_else(|| self.truncate_uniform(t))
                }
                None => self.truncate_uniform(t),
            };
        }
        self.truncate_uniform(t)
    }

    /// `t` moved by `n` buckets. Months keep the day of month, clamped to the
    /// length of the target month, and the time of day.
    pub fn advance(&self, t: Timestamp, n: i64) -> Timestamp {
        if self.unit() == CadenceUnit::Month {
            if let Some(moved) = add_months(t, n.saturating_mul(self.multiplier() as i64)) {
                return moved;
            }
        }
        t.saturating_add(n.saturating_mul(self.duration_ms()))
    }

    /// Signed number of bucket boundaries crossed going from `from` to `to`.
    ///
    /// `timeframes_between(t, advance(t, n)) == n` holds for every `t` and `n`.
    pub fn timeframes_between(&self, from: Timestamp, to: Timestamp) -> i64 {
        self.bucket(to).saturating_sub(self.bucket(from))
    }

    fn bucket(&self, t: Timestamp) -> i64 {
        if self.unit() == CadenceUnit::Month {
            if let Some((date, _)) = civil(t) {
                return month_index(date).div_euclid(self.multiplier() as i64);
            }
        }
        // offset spans under 2^64 ms and duration is at least 1s, so this fits
        self.uniform_bucket(t) as i64
    }

    fn uniform_bucket(&self, t: Timestamp) -> i128 {
        (i128::from(t) - i128::from(self.anchor())).div_euclid(i128::from(self.duration_ms()))
    }

    fn truncate_uniform(&self, t: Timestamp) -> Timestamp {
        let dur = i128::from(self.duration_ms());
        let start = self.uniform_bucket(t) * dur + i128::from(self.anchor());
        start.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    fn anchor(&self) -> i64 {
        match self.unit() {
            CadenceUnit::Week => WEEK_ANCHOR_MS,
            _ => 0,
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence::Days(1)
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Cadence {
    type Err = SeriesError;

    /// Parse e.g. "1s", "5m", "4h", "1d", "1w", "1M" / "1mo" / "1month".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| SeriesError::InvalidCadence(s.to_string()))?;
        let (digits, unit) = s.split_at(split);
        let multiplier = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<u32>()
                .map_err(|_| SeriesError::InvalidCadence(s.to_string()))?
        };
        if multiplier == 0 {
            return Err(SeriesError::InvalidCadence(s.to_string()));
        }
        let unit = match unit {
            "s" | "sec" => CadenceUnit::Second,
            "m" | "min" => CadenceUnit::Minute,
            "h" | "H" => CadenceUnit::Hour,
            "d" | "D" => CadenceUnit::Day,
            "w" | "W" => CadenceUnit::Week,
            "M" | "mo" | "month" => CadenceUnit::Month,
            _ => return Err(SeriesError::InvalidCadence(s.to_string())),
        };
        let cadence = Cadence::new(unit, multiplier);
        cadence
            .checked_duration_ms()
            .map(|_| cadence)
            .ok_or_else(|| SeriesError::InvalidCadence(s.to_string()))
    }
}

/// UTC calendar date of `t` and the milliseconds into that day.
fn civil(t: Timestamp) -> Option<(NaiveDate, i64)> {
    let days = t.div_euclid(DAY_MS) + EPOCH_DAYS_FROM_CE;
    let date = NaiveDate::from_num_days_from_ce_opt(i32::try_from(days).ok()?)?;
    Some((date, t.rem_euclid(DAY_MS)))
}

fn to_millis(date: NaiveDate, ms_of_day: i64) -> Timestamp {
    (date.num_days_from_ce() as i64 - EPOCH_DAYS_FROM_CE) * DAY_MS + ms_of_day
}

/// Months since January of year 0.
fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn month_start(index: i64) -> Option<Timestamp> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| to_millis(d, 0))
}

fn add_months(t: Timestamp, months: i64) -> Option<Timestamp> {
    let (date, ms_of_day) = civil(t)?;
    let target = month_index(date).checked_add(months)?;
    let year = i32::try_from(target.div_euclid(12)).ok()?;
    let month = target.rem_euclid(12) as u32 + 1;
    let day = date.day();
    // clamp 31st -> 30th/29th/28th
    let date = (day.min(28)..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))?;
    Some(to_millis(date, ms_of_day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Timestamp {
        to_millis(NaiveDate::from_ymd_opt(y, m, d).unwrap(), 0)
    }

    #[test]
    fn parses_and_names_roundtrip() {
        for name in ["1s", "15s", "5m", "4h", "1d", "2w", "1M", "3M"] {
            let cadence: Cadence = name.parse().unwrap();
            assert_eq!(cadence.name(), name);
        }
        assert_eq!("1mo".parse::<Cadence>().unwrap(), Cadence::Months(1));
        assert_eq!("h".parse::<Cadence>().unwrap(), Cadence::Hours(1));
        assert!("0d".parse::<Cadence>().is_err());
        assert!("10".parse::<Cadence>().is_err());
        assert!("1y".parse::<Cadence>().is_err());
    }

    #[test]
    fn zero_multiplier_behaves_as_one() {
        assert_eq!(Cadence::Days(0).multiplier(), 1);
        assert_eq!(Cadence::Days(0).duration_ms(), DAY_MS);
    }

    #[test]
    fn truncates_uniform_units_including_pre_epoch() {
        let c = Cadence::Hours(4);
        assert_eq!(c.truncate(5 * HOUR_MS + 123), 4 * HOUR_MS);
        assert_eq!(c.truncate(-1), -4 * HOUR_MS);
        assert_eq!(Cadence::Days(1).truncate(ymd(2024, 1, 2) + 5), ymd(2024, 1, 2));
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2024-01-03 is a Wednesday, the week starts Monday 2024-01-01.
        let c = Cadence::Weeks(1);
        assert_eq!(c.truncate(ymd(2024, 1, 3) + HOUR_MS), ymd(2024, 1, 1));
        assert_eq!(c.timeframes_between(ymd(2024, 1, 7), ymd(2024, 1, 8)), 1);
        assert_eq!(c.timeframes_between(ymd(2024, 1, 1), ymd(2024, 1, 7)), 0);
    }

    #[test]
    fn months_use_calendar_arithmetic() {
        let c = Cadence::Months(1);
        assert_eq!(c.truncate(ymd(2024, 2, 17) + HOUR_MS), ymd(2024, 2, 1));
        assert_eq!(c.advance(ymd(2024, 1, 31), 1), ymd(2024, 2, 29));
        assert_eq!(c.advance(ymd(2024, 3, 15), -3), ymd(2023, 12, 15));
        // 30 days apart, two month boundaries
        assert_eq!(c.timeframes_between(ymd(2024, 1, 31), ymd(2024, 3, 1)), 2);
        assert_eq!(c.timeframes_between(ymd(2024, 1, 1), ymd(2024, 1, 31)), 0);
        assert_eq!(c.timeframes_between(ymd(2024, 3, 1), ymd(2023, 3, 1)), -12);

        let quarter = Cadence::Months(3);
        assert_eq!(quarter.truncate(ymd(2024, 5, 20)), ymd(2024, 4, 1));
    }

    #[test]
    fn advance_and_between_are_inverse() {
        let starts = [ymd(2024, 1, 31) + 7 * HOUR_MS, ymd(1969, 12, 31), 0, 1_000];
        let cadences = [
            Cadence::Seconds(15),
            Cadence::Minutes(5),
            Cadence::Hours(4),
            Cadence::Days(1),
            Cadence::Weeks(2),
            Cadence::Months(1),
            Cadence::Months(3),
        ];
        for c in cadences {
            for &t in &starts {
                for n in -30..=30 {
                    assert_eq!(c.timeframes_between(t, c.advance(t, n)), n, "{c} {t} {n}");
                }
            }
        }
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let monday = ymd(2024, 1, 1);
        for c in [Cadence::Weeks(1), Cadence::Days(1), Cadence::Months(1)] {
            assert!(c.truncate(i64::MIN) <= i64::MIN + c.duration_ms());
            assert!(c.truncate(i64::MAX) > i64::MAX - c.duration_ms());
            assert!(c.timeframes_between(monday, i64::MIN) < 0);
            assert!(c.timeframes_between(monday, i64::MAX) > 0);
            assert!(c.timeframes_between(i64::MIN, i64::MAX) > 0);
            assert_eq!(c.advance(i64::MAX, 1), i64::MAX);
            assert_eq!(c.advance(i64::MIN, -1), i64::MIN);
        }
        // the bucket holding i64::MIN starts below it and clamps
        let weekly = Cadence::Weeks(1);
        assert_eq!(weekly.truncate(i64::MIN), i64::MIN);
    }

    #[test]
    fn rejects_multipliers_whose_duration_overflows() {
        assert!(matches!(
            "4294967295M".parse::<Cadence>(),
            Err(SeriesError::InvalidCadence(_))
        ));
        assert_eq!(
            "4294967295w".parse::<Cadence>().unwrap(),
            Cadence::Weeks(u32::MAX)
        );
        // built directly, the duration saturates instead of panicking
        let huge = Cadence::Months(u32::MAX);
        assert_eq!(huge.duration_ms(), i64::MAX);
        assert!(Cadence::Weeks(1).divides(Cadence::Weeks(u32::MAX)));
        assert!(huge.divides(huge));
        assert_eq!(huge.truncate(ymd(2024, 5, 20)), ymd(0, 1, 1));
        assert_eq!(huge.timeframes_between(ymd(2024, 1, 1), ymd(2025, 1, 1)), 0);
        assert_eq!(huge.advance(ymd(2024, 1, 1), 1), i64::MAX);
    }

    #[test]
    fn divides_respects_calendar_units() {
        assert!(Cadence::Minutes(1).divides(Cadence::Minutes(5)));
        assert!(Cadence::Days(1).divides(Cadence::Weeks(1)));
        assert!(!Cadence::Hours(5).divides(Cadence::Days(1)));
        assert!(Cadence::Months(1).divides(Cadence::Months(3)));
        assert!(!Cadence::Days(1).divides(Cadence::Months(1)));
    }
}
