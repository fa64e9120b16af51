use sfr_panel::ValueSource;
use sfr_panel::algorithm::interpolation::{densify, interpolate};

/// Irregular series with gaps of several lengths
fn fixtures() -> Vec<Vec<(i32, Option<f64>)>> {
    vec![
        vec![(1967, Some(400.0)), (1970, Some(460.0)), (1971, Some(470.0)), (1972, Some(500.0))],
        vec![(1970, Some(100.0)), (1974, Some(140.0)), (1976, Some(150.0)), (1990, Some(900.0))],
        vec![(1980, Some(1.0)), (1981, Some(2.0)), (1984, Some(3.5)), (1989, Some(4.0))],
        vec![(1975, Some(10.0))],
        vec![],
    ]
}

#[test]
fn test_observed_values_are_reproduced_exactly() {
    for observations in fixtures() {
        for max_gap in 1..=5 {
            let points = interpolate(&densify(&observations, 1965..=1995), max_gap);
            for &(year, value) in &observations {
                let point = points.iter().find(|p| p.year == year).unwrap();
                assert_eq!(point.value, value);
                assert_eq!(point.source, ValueSource::Observed);
            }
        }
    }
}

#[test]
fn test_filled_values_lie_within_max_gap_of_observations() {
    for observations in fixtures() {
        for max_gap in 1..=5 {
            let points = interpolate(&densify(&observations, 1965..=1995), max_gap);
            let observed: Vec<i32> = points
                .iter()
                .filter(|p| p.source == ValueSource::Observed)
                .map(|p| p.year)
                .collect();

            for filled in points.iter().filter(|p| p.source == ValueSource::Interpolated) {
                let before = observed.iter().rev().find(|&&y| y < filled.year).unwrap();
                let after = observed.iter().find(|&&y| y > filled.year).unwrap();
                assert!(filled.year - before <= max_gap);
                assert!(after - filled.year <= max_gap);
                assert!(after - before <= max_gap);
            }
        }
    }
}

#[test]
fn test_1968_and_1969_are_bridged_with_default_gap() {
    let points = interpolate(&densify(&fixtures()[0], 1967..=1972), 3);
    assert_eq!(points[1].source, ValueSource::Interpolated);
    assert_eq!(points[2].source, ValueSource::Interpolated);
    let v1968 = points[1].value.unwrap();
    assert!((v1968 - 420.0).abs() < 1e-9);
}
