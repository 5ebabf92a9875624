//! Timestamp-derived features.
//!
//! Continuous (`timeF`) features are scaled to [-0.5, 0.5] and chosen by
//! sampling frequency; the calendar (`fixed`/`learned`) encoding emits raw
//! integer fields for an embedding layer downstream.

use crate::config::{Frequency, TimeEncoding};
use chrono::{DateTime, Datelike, Timelike, Utc};
use ndarray::Array2;

fn second_of_minute(t: &DateTime<Utc>) -> f64 {
    t.second() as f64 / 59.0 - 0.5
}

fn minute_of_hour(t: &DateTime<Utc>) -> f64 {
    t.minute() as f64 / 59.0 - 0.5
}

fn hour_of_day(t: &DateTime<Utc>) -> f64 {
    t.hour() as f64 / 23.0 - 0.5
}

fn day_of_week(t: &DateTime<Utc>) -> f64 {
    t.weekday().num_days_from_monday() as f64 / 6.0 - 0.5
}

fn day_of_month(t: &DateTime<Utc>) -> f64 {
    (t.day() as f64 - 1.0) / 30.0 - 0.5
}

fn day_of_year(t: &DateTime<Utc>) -> f64 {
    (t.ordinal() as f64 - 1.0) / 365.0 - 0.5
}

fn month_of_year(t: &DateTime<Utc>) -> f64 {
    (t.month() as f64 - 1.0) / 11.0 - 0.5
}

fn week_of_year(t: &DateTime<Utc>) -> f64 {
    (t.iso_week().week() as f64 - 1.0) / 52.0 - 0.5
}

type Feature = fn(&DateTime<Utc>) -> f64;

const SECONDLY: &[Feature] = &[
    second_of_minute,
    minute_of_hour,
    hour_of_day,
    day_of_week,
    day_of_month,
    day_of_year,
];
const MINUTELY: &[Feature] = &[
    minute_of_hour,
    hour_of_day,
    day_of_week,
    day_of_month,
    day_of_year,
];
const HOURLY: &[Feature] = &[hour_of_day, day_of_week, day_of_month, day_of_year];
const DAILY: &[Feature] = &[day_of_week, day_of_month, day_of_year];
const WEEKLY: &[Feature] = &[day_of_month, week_of_year];
const MONTHLY: &[Feature] = &[month_of_year];

fn continuous_features(freq: Frequency) -> &'static [Feature] {
    match freq {
        Frequency::Secondly => SECONDLY,
        Frequency::Minutely => MINUTELY,
        Frequency::Hourly => HOURLY,
        Frequency::Daily | Frequency::BusinessDaily => DAILY,
        Frequency::Weekly => WEEKLY,
        Frequency::Monthly => MONTHLY,
    }
}

/// Number of feature columns produced for an encoding/frequency pair.
pub fn feature_width(encoding: TimeEncoding, freq: Frequency) -> usize {
    if encoding.is_continuous() {
        continuous_features(freq).len()
    } else if freq == Frequency::Minutely {
        5
    } else {
        4
    }
}

/// Encode timestamps as an `N × feature_width` matrix.
pub fn time_features(
    timestamps: &[DateTime<Utc>],
    encoding: TimeEncoding,
    freq: Frequency,
) -> Array2<f64> {
    let width = feature_width(encoding, freq);
    let mut out = Array2::zeros((timestamps.len(), width));

    for (i, t) in timestamps.iter().enumerate() {
        if encoding.is_continuous() {
            for (j, f) in continuous_features(freq).iter().enumerate() {
                out[[i, j]] = f(t);
            }
        } else {
            out[[i, 0]] = t.month() as f64;
            out[[i, 1]] = t.day() as f64;
            out[[i, 2]] = t.weekday().num_days_from_monday() as f64;
            out[[i, 3]] = t.hour() as f64;
            if freq == Frequency::Minutely {
                // 15-minute buckets
                out[[i, 4]] = (t.minute() / 15) as f64;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn hourly_continuous_features() {
        // Wednesday 2024-01-03 23:00
        let t = Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap();
        let f = time_features(&[t], TimeEncoding::TimeF, Frequency::Hourly);

        assert_eq!(f.dim(), (1, 4));
        assert_relative_eq!(f[[0, 0]], 0.5, epsilon = 1e-12);
        assert_relative_eq!(f[[0, 1]], 2.0 / 6.0 - 0.5, epsilon = 1e-12);
        assert_relative_eq!(f[[0, 2]], 2.0 / 30.0 - 0.5, epsilon = 1e-12);
        assert_relative_eq!(f[[0, 3]], 2.0 / 365.0 - 0.5, epsilon = 1e-12);
    }

    #[test]
    fn continuous_features_stay_in_range() {
        let base = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        let ts: Vec<_> = (0..500)
            .map(|i| base + chrono::Duration::minutes(i * 37))
            .collect();
        let f = time_features(&ts, TimeEncoding::TimeF, Frequency::Secondly);
        assert!(f.iter().all(|v| (-0.5..=0.5).contains(v)));
    }

    #[test]
    fn calendar_encoding_uses_raw_fields() {
        let t = Utc.with_ymd_and_hms(2024, 3, 15, 10, 47, 0).unwrap();
        let f = time_features(&[t], TimeEncoding::Fixed, Frequency::Minutely);
        assert_eq!(f.row(0).to_vec(), vec![3.0, 15.0, 4.0, 10.0, 3.0]);

        let f = time_features(&[t], TimeEncoding::Learned, Frequency::Hourly);
        assert_eq!(f.ncols(), 4);
    }

    #[test]
    fn widths_match_frequency() {
        assert_eq!(feature_width(TimeEncoding::TimeF, Frequency::Monthly), 1);
        assert_eq!(feature_width(TimeEncoding::TimeF, Frequency::Weekly), 2);
        assert_eq!(feature_width(TimeEncoding::TimeF, Frequency::Minutely), 5);
    }
}
