use sfr_panel::TractId;
use sfr_panel::sources::lookups::{
    COUNTY_INCOME_FILE, REFORM_YEARS_FILE, STATE_FIPS_FILE, TRACT_POPULATION_FILE,
    load_county_income, load_county_population, load_reform_years, load_state_fips,
    load_tract_population,
};

use crate::utils::TestDataRoot;

#[test]
fn test_missing_lookups_are_empty() {
    let root = TestDataRoot::new();
    let config = root.config();
    assert!(load_reform_years(&config).unwrap().is_empty());
    assert!(load_county_income(&config).unwrap().is_empty());
    assert!(load_county_population(&config).unwrap().is_empty());
    assert!(load_tract_population(&config).unwrap().is_empty());
    assert!(load_state_fips(&config).unwrap().is_empty());
}

#[test]
fn test_earliest_reform_per_state_wins() {
    let root = TestDataRoot::new();
    root.lookup(REFORM_YEARS_FILE, "fipst,reform_year\n6,1976\n06,1971\n34,1973\n");
    let reforms = load_reform_years(&root.config()).unwrap();
    assert_eq!(reforms["06"], 1971);
    assert_eq!(reforms["34"], 1973);
}

#[test]
fn test_county_and_tract_values_are_keyed_by_padded_codes() {
    let root = TestDataRoot::new();
    root.lookup(COUNTY_INCOME_FILE, "county_fips,year,median_income\n6037,1970,9500\n");
    root.lookup(
        TRACT_POPULATION_FILE,
        "tract,year,population\n06037010100,1990,812\nbad,1990,1\n",
    );
    root.lookup(STATE_FIPS_FILE, "fips,abbrev,name\n6,ca,California\n");

    let income = load_county_income(&root.config()).unwrap();
    assert_eq!(income[&("06037".to_string(), 1970)], 9500.0);

    let tracts = load_tract_population(&root.config()).unwrap();
    assert_eq!(tracts.len(), 1);
    assert_eq!(tracts[&(TractId::parse("06037010100").unwrap(), 1990)], 812.0);

    let states = load_state_fips(&root.config()).unwrap();
    assert_eq!(states["06"].abbrev, "CA");
}
