use std::collections::{BTreeMap, BTreeSet};

use sfr_panel::GeoRefRecord;
use sfr_panel::algorithm::allocation::{allocate, select_dominant};
use sfr_panel::sources::parse_georef;

use crate::utils::{GeoRefLine, assert_close, georef_line};

fn records(lines: &[String]) -> Vec<GeoRefRecord> {
    parse_georef(lines.join("\n").as_bytes()).unwrap()
}

#[test]
fn test_allocations_per_level_sum_to_tract_population() {
    let mut lines = vec![
        georef_line("037", "00001", "0101", "4000", "50"),
        georef_line("037", "00002", "0101", "4000", "30"),
        georef_line("037", "00003", "0101", "4000", "20"),
        georef_line("037", "00001", "0102", "1234", "100"),
    ];
    // Elementary and secondary districts overlapping tract 0101
    for (district, level, percent) in [("00010", "1", "75"), ("00011", "1", "25"), ("00020", "2", "100")] {
        lines.push(
            GeoRefLine {
                state: "06",
                county: "037",
                district,
                level,
                name: "OVERLAY",
                tract_base: "0101",
                tract_suffix: "",
                population: "4000",
                percent,
            }
            .render(),
        );
    }

    let mut sums: BTreeMap<(String, i8), f64> = BTreeMap::new();
    for allocation in allocate(&records(&lines)) {
        *sums
            .entry((allocation.tract.to_string(), allocation.level_code))
            .or_default() += allocation.allocated_population;
    }

    assert_close(sums[&("06037010100".to_string(), 3)], 4000.0);
    assert_close(sums[&("06037010100".to_string(), 1)], 4000.0);
    assert_close(sums[&("06037010100".to_string(), 2)], 4000.0);
    assert_close(sums[&("06037010200".to_string(), 3)], 1234.0);
}

#[test]
fn test_dominant_selection_leaves_tract_level_unique() {
    let lines = vec![
        georef_line("037", "00001", "0101", "4000", "50"),
        georef_line("037", "00002", "0101", "4000", "50"),
        georef_line("037", "00003", "0102", "900", "10"),
        georef_line("037", "00004", "0102", "900", "90"),
        georef_line("037", "00005", "", "300", "100"),
        georef_line("037", "00006", "9950", "10", "100"),
    ];
    let dominant = select_dominant(&allocate(&records(&lines))).unwrap();

    let keys: BTreeSet<_> = dominant.iter().map(|a| (a.tract.clone(), a.level_code)).collect();
    assert_eq!(keys.len(), dominant.len());
    assert_eq!(dominant.len(), 3);

    let district_of = |tract: &str| {
        dominant
            .iter()
            .find(|a| a.tract.as_str() == tract)
            .map(|a| a.district.to_string())
    };
    assert_eq!(district_of("06037010100").as_deref(), Some("0600001"));
    assert_eq!(district_of("06037010200").as_deref(), Some("0600004"));
    assert_eq!(district_of("06037000000").as_deref(), Some("0600005"));
    assert_eq!(district_of("06037995000"), None);
}
