//! Gap-limited linear interpolation of yearly series

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use itertools::Itertools;

use crate::models::ValueSource;

/// One year of an interpolated series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedPoint {
    /// Year
    pub year: i32,
    /// Value after filling
    pub value: Option<f64>,
    /// Whether the value was observed, filled or left missing
    pub source: ValueSource,
    /// Inside a gap longer than the allowed maximum
    pub too_far: bool,
}

/// Expand observations onto every year of `years`
///
/// Years outside the range are dropped. When a year is reported more than
/// once, its first non-missing value is used.
#[must_use]
pub fn densify(observations: &[(i32, Option<f64>)], years: RangeInclusive<i32>) -> Vec<(i32, Option<f64>)> {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for &(year, value) in observations {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            if years.contains(&year) {
                by_year.entry(year).or_insert(value);
            }
        }
    }
    years.map(|year| (year, by_year.get(&year).copied())).collect()
}

/// Most common non-missing value; ties go to the smallest value
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Ord,
    I: IntoIterator<Item = Option<T>>,
{
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(a, count_a), (b, count_b)| count_a.cmp(count_b).then_with(|| b.cmp(a)))
        .map(|(value, _)| value)
}

/// Fill missing years linearly between observations at most `max_gap` apart
///
/// `series` must be sorted by year. Observed values are passed through
/// unchanged; every missing year between two observations further apart than
/// `max_gap` is marked `too_far`; years before the first or after the last
/// observation stay missing.
#[must_use]
pub fn interpolate(series: &[(i32, Option<f64>)], max_gap: i32) -> Vec<InterpolatedPoint> {
    let mut points: Vec<InterpolatedPoint> = series
        .iter()
        .map(|&(year, value)| {
            let value = value.filter(|v| v.is_finite());
            InterpolatedPoint {
                year,
                value,
                source: if value.is_some() {
                    ValueSource::Observed
                } else {
                    ValueSource::Missing
                },
                too_far: false,
            }
        })
        .collect();

    let observed: Vec<usize> = points
        .iter()
        .positions(|p| p.source == ValueSource::Observed)
        .collect();

    for (&left, &right) in observed.iter().tuple_windows() {
        if right - left < 2 {
            continue;
        }
        let (y0, v0) = (points[left].year, points[left].value.unwrap_or_default());
        let (y1, v1) = (points[right].year, points[right].value.unwrap_or_default());
        let distance = y1 - y0;
        let fill = distance <= max_gap;

        for point in &mut points[left + 1..right] {
            if fill {
                let t = f64::from(point.year - y0) / f64::from(distance);
                point.value = Some(v0 + (v1 - v0) * t);
                point.source = ValueSource::Interpolated;
            } else {
                point.too_far = true;
            }
        }
    }

    points
}

/// Trailing moving average over the last `window` years
///
/// Only years that carry a value are averaged, and only years that already
/// have a value receive one; those years become [`ValueSource::Smoothed`].
/// A window of 1 returns the input unchanged.
#[must_use]
pub fn smooth(points: &[InterpolatedPoint], window: usize) -> Vec<InterpolatedPoint> {
    if window <= 1 {
        return points.to_vec();
    }
    let span = i32::try_from(window).unwrap_or(i32::MAX);

    points
        .iter()
        .map(|point| {
            if point.value.is_none() {
                return *point;
            }
            let (sum, n) = points
                .iter()
                .filter(|p| p.year > point.year - span && p.year <= point.year)
                .filter_map(|p| p.value)
                .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
            InterpolatedPoint {
                value: Some(sum / n as f64),
                source: ValueSource::Smoothed,
                ..*point
            }
        })
        .collect()
}
