//! County-year collapse of the tract panel

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::algorithm::aggregation::{and_flags, weighted_mean};
use crate::algorithm::allocation::absent_as_zero;
use crate::models::{CountyCoverage, CountyYear, TractYear};

/// Collapse tract-years into county-years
///
/// Only areas with spending in a year count towards that year's coverage.
/// The untracted remainder of a mixed county is weighted by the county total
/// from `county_population` minus the population of every tract in the
/// county, with or without spending that year; when the county
/// total is unknown the remainder keeps its own population. The residual is
/// not floored at zero: a negative residual is kept and flagged. Several
/// untracted rows are first collapsed to their simple mean. Invalid
/// county-years are dropped.
#[must_use]
pub fn aggregate_counties(
    tract_panel: &[TractYear],
    county_population: &BTreeMap<String, f64>,
) -> Vec<CountyYear> {
    let mut groups: BTreeMap<(&str, i32), Vec<&TractYear>> = BTreeMap::new();
    for row in tract_panel {
        groups.entry((row.tract.county_fips(), row.year)).or_default().push(row);
    }

    let mut coverage_counts: FxHashMap<CountyCoverage, usize> = FxHashMap::default();
    let mut negative_residuals = 0usize;
    let mut counties = Vec::with_capacity(groups.len());

    for ((county, year), mut areas) in groups {
        areas.sort_by(|a, b| a.tract.cmp(&b.tract));

        let (untracted, tracted): (Vec<&TractYear>, Vec<&TractYear>) = areas
            .iter()
            .filter(|area| area.per_pupil.is_some())
            .partition(|area| area.tract.is_untracted());

        let coverage = CountyCoverage::classify(tracted.len(), untracted.len());
        *coverage_counts.entry(coverage).or_default() += 1;
        if coverage == CountyCoverage::Invalid {
            continue;
        }

        let mut pairs: Vec<(f64, f64)> = tracted
            .iter()
            .filter_map(|area| Some((area.per_pupil?, absent_as_zero(area.population))))
            .collect();

        let mut negative_residual = false;
        match coverage {
            CountyCoverage::FullyUntracted => {
                let area = untracted[0];
                if let Some(value) = area.per_pupil {
                    pairs.push((value, absent_as_zero(area.population)));
                }
            }
            CountyCoverage::Mixed | CountyCoverage::MultiplyUntracted => {
                let values: Vec<f64> = untracted.iter().filter_map(|area| area.per_pupil).collect();
                let remainder_value = values.iter().sum::<f64>() / values.len() as f64;
                let own_population: f64 = untracted.iter().map(|a| absent_as_zero(a.population)).sum();
                let tracted_population: f64 = areas
                    .iter()
                    .filter(|area| !area.tract.is_untracted())
                    .map(|area| absent_as_zero(area.population))
                    .sum();

                let residual = county_population
                    .get(county)
                    .map_or(own_population, |total| total - tracted_population);
                if residual < 0.0 {
                    negative_residual = true;
                    negative_residuals += 1;
                    log::debug!(
                        "{county} {year}: tracted population {tracted_population} exceeds county total, residual {residual}"
                    );
                }
                pairs.push((remainder_value, residual));
            }
            CountyCoverage::FullyTracted | CountyCoverage::Invalid => {}
        }

        let flags = and_flags(areas.iter().map(|area| area.flags.as_slice())).unwrap_or_default();

        counties.push(CountyYear {
            county_fips: county.to_string(),
            year,
            coverage,
            tracted_areas: tracted.len(),
            untracted_areas: untracted.len(),
            population: pairs.iter().map(|(_, w)| w).sum(),
            per_pupil: weighted_mean(&pairs),
            negative_residual,
            flags,
            reform_year: None,
            event_time: None,
            baseline_quartile: None,
            median_income: None,
            real_per_pupil: None,
        });
    }

    let mut summary: Vec<_> = coverage_counts.into_iter().collect();
    summary.sort();
    for (coverage, count) in summary {
        log::info!("County-years {coverage}: {count}");
    }
    if negative_residuals > 0 {
        log::warn!(
            "{negative_residuals} county-years have a negative untracted residual population; kept and flagged"
        );
    }

    counties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TractId;

    fn area(tract: &str, year: i32, population: f64, per_pupil: Option<f64>, flags: Vec<bool>) -> TractYear {
        TractYear {
            tract: TractId::parse(tract).unwrap(),
            year,
            population: Some(population),
            per_pupil,
            district_count: usize::from(per_pupil.is_some()),
            dominant_district: None,
            flags,
        }
    }

    #[test]
    fn test_fully_tracted_county_is_weighted_mean() {
        let panel = vec![
            area("06037000100", 1970, 100.0, Some(10.0), vec![true]),
            area("06037000200", 1970, 300.0, Some(20.0), vec![true]),
        ];
        let counties = aggregate_counties(&panel, &BTreeMap::new());
        assert_eq!(counties.len(), 1);
        assert_eq!(counties[0].coverage, CountyCoverage::FullyTracted);
        assert_eq!(counties[0].per_pupil, Some(17.5));
        assert_eq!(counties[0].population, 400.0);
    }

    #[test]
    fn test_mixed_county_uses_residual_population() {
        let panel = vec![
            area("06037000100", 1970, 600.0, Some(10.0), vec![true]),
            area("06037000000", 1970, 50.0, Some(20.0), vec![true]),
        ];
        let totals = BTreeMap::from([("06037".to_string(), 1000.0)]);
        let counties = aggregate_counties(&panel, &totals);
        assert_eq!(counties[0].coverage, CountyCoverage::Mixed);
        assert_eq!(counties[0].per_pupil, Some(14.0));
        assert!(!counties[0].negative_residual);
    }

    #[test]
    fn test_residual_subtracts_tracts_without_spending() {
        let panel = vec![
            area("06037000100", 1970, 1000.0, Some(100.0), vec![true]),
            area("06037000200", 1970, 3000.0, None, vec![true]),
            area("06037000000", 1970, 500.0, Some(1000.0), vec![true]),
        ];
        let totals = BTreeMap::from([("06037".to_string(), 5000.0)]);
        let counties = aggregate_counties(&panel, &totals);
        assert_eq!(counties[0].coverage, CountyCoverage::Mixed);
        assert_eq!(counties[0].tracted_areas, 1);
        assert_eq!(counties[0].per_pupil, Some(550.0));
        assert_eq!(counties[0].population, 2000.0);
        assert!(!counties[0].negative_residual);
    }

    #[test]
    fn test_negative_residual_is_kept_and_flagged() {
        let panel = vec![
            area("06037000100", 1970, 600.0, Some(10.0), vec![true]),
            area("06037000000", 1970, 50.0, Some(20.0), vec![true]),
        ];
        let totals = BTreeMap::from([("06037".to_string(), 500.0)]);
        let counties = aggregate_counties(&panel, &totals);
        assert!(counties[0].negative_residual);
        assert_eq!(counties[0].per_pupil, Some(8.0));
    }

    #[test]
    fn test_multiple_untracted_rows_collapse_to_their_mean() {
        let panel = vec![
            area("06037000000", 1970, 50.0, Some(10.0), vec![true]),
            area("06037000001", 1970, 50.0, Some(30.0), vec![true]),
        ];
        let counties = aggregate_counties(&panel, &BTreeMap::new());
        assert_eq!(counties[0].coverage, CountyCoverage::MultiplyUntracted);
        assert_eq!(counties[0].untracted_areas, 2);
        assert_eq!(counties[0].per_pupil, Some(20.0));
        assert_eq!(counties[0].population, 100.0);
    }

    #[test]
    fn test_county_flag_is_and_of_constituents() {
        let panel = vec![
            area("06037000100", 1970, 1.0, Some(1.0), vec![true]),
            area("06037000200", 1970, 1.0, Some(1.0), vec![true]),
            area("06037000300", 1970, 1.0, Some(1.0), vec![false]),
        ];
        let counties = aggregate_counties(&panel, &BTreeMap::new());
        assert_eq!(counties[0].flags, vec![false]);
    }

    #[test]
    fn test_county_year_without_spending_is_dropped() {
        let panel = vec![area("06037000100", 1970, 1.0, None, vec![true])];
        assert!(aggregate_counties(&panel, &BTreeMap::new()).is_empty());
    }
}
