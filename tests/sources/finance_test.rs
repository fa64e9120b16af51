use sfr_panel::sources::{load_historical_finance, load_modern_finance};
use sfr_panel::{DistrictLevel, PipelineError};

use crate::utils::{TestDataRoot, assert_close};

#[test]
fn test_modern_files_load_in_year_order_with_per_pupil() {
    let root = TestDataRoot::new();
    root.modern_year(1993, &["0600001,060000001,06,3,900000,300"]);
    root.modern_year(1992, &[
        "600001,60000001,6,03,800000,400",
        "0600002,,06,1,100000,0",
        "N,060000009,06,3,1,1",
    ]);

    let rows = load_modern_finance(&root.config()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].year, 1992);
    assert_eq!(rows[0].modern_key.as_ref().unwrap().as_str(), "0600001");
    assert_eq!(rows[0].historical_key.as_ref().unwrap().as_str(), "060000001");
    assert_eq!(rows[0].state_fips, "06");
    assert_eq!(rows[0].level, Some(DistrictLevel::Unified));
    assert_close(rows[0].per_pupil.unwrap(), 2000.0);

    // Zero enrollment: kept, flagged, no spending value
    assert!(rows[1].invalid_per_pupil);
    assert_eq!(rows[1].per_pupil, None);
    assert_eq!(rows[1].historical_key, None);

    assert_eq!(rows[2].year, 1993);
}

#[test]
fn test_historical_files_carry_no_modern_key() {
    let root = TestDataRoot::new();
    root.historical_year(1970, &["060000001,06,3,50000,100", "000000000,06,3,1,1"]);

    let rows = load_historical_finance(&root.config()).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].modern_key.is_none());
    assert_close(rows[0].per_pupil.unwrap(), 500.0);
}

#[test]
fn test_missing_required_column_is_rejected() {
    let root = TestDataRoot::new();
    let path = root.config().historical_path().join("indfin_1971.csv");
    std::fs::write(&path, "govid,fipst,totalexp\n060000001,06,5").unwrap();

    match load_historical_finance(&root.config()) {
        Err(PipelineError::PathError { message, .. }) => assert!(message.contains("enroll")),
        other => panic!("expected a path error, got {other:?}"),
    }
}

#[test]
fn test_two_files_for_one_year_is_an_error() {
    let root = TestDataRoot::new();
    root.historical_year(1970, &[]);
    std::fs::write(root.config().historical_path().join("copy_1970.csv"), "govid,totalexp,enroll\n").unwrap();
    assert!(load_historical_finance(&root.config()).is_err());
}
