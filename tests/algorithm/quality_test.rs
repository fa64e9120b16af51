use sfr_panel::algorithm::quality::{BaselineSet, FlagTable};
use sfr_panel::{ModernKey, TractId};

fn key(raw: &str) -> ModernKey {
    ModernKey::parse(raw).unwrap()
}

#[test]
fn test_district_missing_1972_fails_four_year_window_only() {
    let district = key("0600001");
    let observations = vec![
        (district.clone(), 1967, Some(410.0)),
        (district.clone(), 1970, Some(480.0)),
        (district.clone(), 1971, Some(505.0)),
        (district.clone(), 1972, None),
        (district.clone(), 1980, Some(900.0)),
    ];
    let sets = BaselineSet::defaults();
    let table = FlagTable::tag(observations, [district.clone()], &sets);

    let flags = table.get(&district).unwrap();
    let by_name = |name: &str| flags[sets.iter().position(|s| s.name == name).unwrap()];
    assert!(!by_name("67_72"));
    assert!(by_name("67_71"));
    assert!(!by_name("70_72"));
}

#[test]
fn test_flag_is_true_exactly_when_all_baseline_years_present() {
    let sets = vec![BaselineSet::new("67_71", [1967, 1970, 1971])];
    let years = [1967, 1970, 1971];
    // Every subset of the three years, encoded as a bitmask
    for mask in 0u8..8 {
        let district = key("0600001");
        let observations: Vec<_> = years
            .iter()
            .enumerate()
            .map(|(i, &year)| {
                let value = (mask & (1 << i) != 0).then_some(100.0);
                (district.clone(), year, value)
            })
            .collect();
        let table = FlagTable::tag(observations, [district.clone()], &sets);
        assert_eq!(table.get(&district), Some(&[mask == 0b111][..]), "mask {mask:03b}");
    }
}

#[test]
fn test_rollup_to_county_is_and_at_every_level() {
    let sets = vec![BaselineSet::new("70", [1970])];
    let observations = vec![
        (key("0600001"), 1970, Some(1.0)),
        (key("0600002"), 1970, Some(1.0)),
        (key("0600003"), 1970, None),
    ];
    let districts = FlagTable::tag(
        observations,
        [key("0600001"), key("0600002"), key("0600003")],
        &sets,
    );

    let tract = |base: &str| TractId::from_parts("06", "037", base, "").unwrap();
    let tracts = districts.propagate(vec![
        (key("0600001"), tract("0101")),
        (key("0600002"), tract("0102")),
        (key("0600003"), tract("0103")),
    ]);
    assert_eq!(tracts.get(&tract("0101")), Some(&[true][..]));
    assert_eq!(tracts.get(&tract("0103")), Some(&[false][..]));

    let counties = tracts.propagate(
        tracts
            .iter()
            .map(|(t, _)| (t.clone(), t.county_fips().to_string()))
            .collect::<Vec<_>>(),
    );
    assert_eq!(counties.get(&"06037".to_string()), Some(&[false][..]));
}
