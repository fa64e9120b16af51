use sfr_panel::PipelineError;
use sfr_panel::sources::georef::load_georef;

use crate::utils::{GeoRefLine, TestDataRoot, georef_line};

#[test]
fn test_reference_file_loads_every_non_blank_line() {
    let root = TestDataRoot::new();
    root.georef(&[
        georef_line("037", "12345", "2071", "4500", "62.5"),
        String::new(),
        georef_line("037", "12346", "", "800", "100"),
    ]);

    let records = load_georef(&root.config()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].line, 1);
    assert_eq!(records[0].tract.as_str(), "06037207100");
    assert_eq!(records[0].district.as_ref().unwrap().as_str(), "0612345");
    assert_eq!(records[0].district_name, "TEST UNIFIED");
    assert_eq!(records[1].line, 3);
    assert!(records[1].tract.is_untracted());
}

#[test]
fn test_blank_district_code_gives_no_district() {
    let root = TestDataRoot::new();
    let line = GeoRefLine {
        state: "06",
        county: "037",
        district: "",
        level: "",
        name: "",
        tract_base: "0101",
        tract_suffix: "01",
        population: "10",
        percent: "",
    };
    root.georef(&[line.render()]);

    let records = load_georef(&root.config()).unwrap();
    assert!(records[0].district.is_none());
    assert!(records[0].level.is_none());
    assert_eq!(records[0].percent_of_tract, None);
    assert_eq!(records[0].tract.as_str(), "06037010101");
}

#[test]
fn test_malformed_percent_names_line_and_field() {
    let root = TestDataRoot::new();
    root.georef(&[
        georef_line("037", "00001", "0101", "10", "100"),
        georef_line("037", "00001", "0102", "10", "1O0"),
    ]);

    match load_georef(&root.config()) {
        Err(PipelineError::FixedWidth { line, field, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(field, "percent_of_tract");
        }
        other => panic!("expected fixed-width error, got {other:?}"),
    }
}

#[test]
fn test_missing_reference_file_is_an_error() {
    let root = TestDataRoot::new();
    assert!(load_georef(&root.config()).is_err());
}
