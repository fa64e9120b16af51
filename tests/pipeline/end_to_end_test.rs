use sfr_panel::pipeline::output::{
    ALLOCATIONS_FILE, COUNTY_PANEL_FILE, CROSSWALK_FILE, DISTRICT_PANEL_FILE, TRACT_PANEL_FILE,
};
use sfr_panel::sources::lookups::{COUNTY_POPULATION_FILE, REFORM_YEARS_FILE, STATE_FIPS_FILE};
use sfr_panel::utils::io::read_parquet;
use sfr_panel::{
    CountyCoverage, CpiSeries, Crosswalk, ModernKey, PanelOutputs, Pipeline, PipelineError,
    ValueSource, VariantConfig, run_variants,
};

use crate::utils::{TestDataRoot, assert_close, georef_line};

/// Two crosswalkable districts (A, B) in county 06037 and an ambiguous pair
/// (C, D) sharing one historical key. County 06073 is served only by a
/// district without finance data.
fn scenario() -> TestDataRoot {
    let root = TestDataRoot::new();
    for year in [1992, 1993] {
        root.modern_year(year, &[
            "0600001,060000001,06,3,1200000,1000",
            "0600002,060000002,06,3,2400000,1000",
            "0600003,060000003,06,3,500000,1000",
            "0600004,060000003,06,3,500000,1000",
        ]);
    }
    root.historical_year(1967, &[
        "060000001,06,3,80000,100",
        "060000002,06,3,300000,200",
        "060000003,06,3,1,1",
    ]);
    root.historical_year(1970, &["060000001,06,3,100000,100", "060000002,06,3,400000,200"]);
    root.historical_year(1971, &["060000001,06,3,110000,100", "060000002,06,3,420000,200"]);
    root.historical_year(1972, &["060000001,06,3,120000,100"]);

    root.georef(&[
        georef_line("037", "00001", "0101", "1000", "100"),
        georef_line("037", "00002", "0102", "3000", "100"),
        georef_line("037", "00001", "", "500", "100"),
        georef_line("037", "00001", "9901", "10", "100"),
        georef_line("073", "00009", "0101", "100", "100"),
    ]);

    root.lookup(COUNTY_POPULATION_FILE, "county_fips,year,population\n06037,1970,5000\n");
    root.lookup(REFORM_YEARS_FILE, "fipst,reform_year\n06,1976\n");
    root.lookup(STATE_FIPS_FILE, "fips,abbrev,name\n06,CA,California\n");
    root
}

fn variant() -> VariantConfig {
    VariantConfig {
        years: 1967..=1993,
        ..VariantConfig::default()
    }
}

fn county_year(outputs: &PanelOutputs, year: i32) -> &sfr_panel::CountyYear {
    outputs
        .county_panel
        .iter()
        .find(|c| c.county_fips == "06037" && c.year == year)
        .unwrap_or_else(|| panic!("no county row for {year}"))
}

#[test]
fn test_full_run_builds_every_panel() {
    let root = scenario();
    let config = root.config();
    let outputs = Pipeline::new(&config, variant()).run().unwrap();

    // Crosswalk keeps A and B only
    assert_eq!(outputs.crosswalk.len(), 2);
    assert!(outputs.crosswalk.to_historical(&ModernKey::parse("0600003").unwrap()).is_none());

    // Baseline flags: 67_72, 67_71, 70_72
    let flags = |key: &str| outputs.district_flags.flags_or_default(&ModernKey::parse(key).unwrap());
    assert_eq!(flags("0600001"), vec![true, true, true]);
    assert_eq!(flags("0600002"), vec![false, true, false]);
    assert_eq!(outputs.district_flags.get(&ModernKey::parse("0600003").unwrap()), Some(&[false, false, false][..]));

    // 1968 is bridged between 1967 and 1970; 1980 is too far from any observation
    let district_a: Vec<_> = outputs
        .district_panel
        .iter()
        .filter(|row| row.district.as_str() == "0600001")
        .collect();
    assert_eq!(district_a.len(), 27);
    assert_eq!(district_a[1].source, ValueSource::Interpolated);
    assert_eq!(district_a[13].per_pupil, None);
    assert_eq!(district_a[3].per_pupil, Some(1000.0));

    // Mixed county: residual 5000 - (1000 + 3000) for the untracted remainder
    let c1970 = county_year(&outputs, 1970);
    assert_eq!(c1970.coverage, CountyCoverage::Mixed);
    assert_eq!(c1970.tracted_areas, 2);
    assert_eq!(c1970.untracted_areas, 1);
    assert_close(c1970.per_pupil.unwrap(), 1600.0);
    assert_close(c1970.population, 5000.0);
    assert!(!c1970.negative_residual);
    assert_eq!(c1970.flags, vec![false, true, false]);
    assert_eq!(c1970.reform_year, Some(1976));
    assert_eq!(c1970.event_time, Some(-5));
    assert_eq!(c1970.baseline_quartile, None);

    assert_close(county_year(&outputs, 1967).per_pupil.unwrap(), 1220.0);

    // B has no 1972 value, so only A's areas carry the county that year;
    // B's tract still counts against the residual: 1000 + (5000 - 4000)
    let c1972 = county_year(&outputs, 1972);
    assert_eq!(c1972.tracted_areas, 1);
    assert_close(c1972.per_pupil.unwrap(), 1200.0);
    assert_close(c1972.population, 2000.0);

    // Years without any spending are invalid and dropped; county 06073 never has spending
    assert_eq!(outputs.county_panel.len(), 8);
    assert!(outputs.county_panel.iter().all(|c| c.county_fips == "06037"));
    assert_eq!(county_year(&outputs, 1993).event_time, Some(15));
    assert_eq!(outputs.diagnostics.count("06", "county_panel"), 8);
}

#[test]
fn test_stage_tables_are_written_and_readable() {
    let root = scenario();
    let config = root.config();
    let outputs = Pipeline::new(&config, variant()).run().unwrap();

    let dir = config.output_dir.join("main");
    assert_eq!(outputs.output_dir, dir);
    for file in [CROSSWALK_FILE, ALLOCATIONS_FILE, DISTRICT_PANEL_FILE, TRACT_PANEL_FILE, COUNTY_PANEL_FILE] {
        assert!(dir.join(file).is_file(), "{file} was not written");
    }

    let county_rows: usize = read_parquet(&dir.join(COUNTY_PANEL_FILE))
        .unwrap()
        .iter()
        .map(|b| b.num_rows())
        .sum();
    assert_eq!(county_rows, outputs.county_panel.len());

    let crosswalk_batches = read_parquet(&dir.join(CROSSWALK_FILE)).unwrap();
    assert_eq!(Crosswalk::from_record_batch(&crosswalk_batches[0]).unwrap(), outputs.crosswalk);
}

#[test]
fn test_deflation_rescales_to_base_year() {
    let root = scenario();
    let config = root.config();
    let cpi = CpiSeries::from_values((1967..=1993).map(|year| (year, f64::from(year - 1900))));
    let variant = VariantConfig {
        deflate_to: Some(1993),
        ..variant()
    };
    let outputs = Pipeline::new(&config, variant).with_cpi(Some(cpi)).run().unwrap();

    let c1970 = county_year(&outputs, 1970);
    assert_close(c1970.real_per_pupil.unwrap(), 1600.0 * 93.0 / 70.0);
}

#[test]
fn test_deflation_without_cpi_is_rejected() {
    let root = scenario();
    let config = root.config();
    let variant = VariantConfig {
        deflate_to: Some(1993),
        ..variant()
    };
    assert!(matches!(
        Pipeline::new(&config, variant).run(),
        Err(PipelineError::Validation(_))
    ));

    let partial = CpiSeries::from_values([(1993, 144.5)]);
    let variant = VariantConfig {
        deflate_to: Some(1993),
        ..self::variant()
    };
    assert!(matches!(
        Pipeline::new(&config, variant).with_cpi(Some(partial)).run(),
        Err(PipelineError::Lookup(_))
    ));
}

#[test]
fn test_variants_write_to_separate_directories() {
    let root = scenario();
    let config = root.config();
    let smoothed = VariantConfig {
        name: "smoothed_3yr".to_string(),
        smoothing_window: 3,
        ..variant()
    };
    let outputs = run_variants(&config, &[variant(), smoothed], None).unwrap();

    assert_eq!(outputs.len(), 2);
    assert!(config.output_dir.join("main").join(COUNTY_PANEL_FILE).is_file());
    assert!(config.output_dir.join("smoothed_3yr").join(COUNTY_PANEL_FILE).is_file());

    // Smoothing averages 1967, 1968 and 1969 for A in 1969
    let a1969 = |o: &PanelOutputs| {
        o.district_panel
            .iter()
            .find(|r| r.district.as_str() == "0600001" && r.year == 1969)
            .and_then(|r| r.per_pupil)
            .unwrap()
    };
    let raw = a1969(&outputs[0]);
    let smoothed = a1969(&outputs[1]);
    assert_close(raw, 800.0 + 200.0 * 2.0 / 3.0);
    assert_close(smoothed, (800.0 + (800.0 + 200.0 / 3.0) + raw) / 3.0);

    // Averaged years never claim to be reported values
    for (raw_row, smoothed_row) in outputs[0].district_panel.iter().zip(&outputs[1].district_panel) {
        assert_eq!((&raw_row.district, raw_row.year), (&smoothed_row.district, smoothed_row.year));
        if smoothed_row.source == ValueSource::Observed {
            assert_eq!(smoothed_row.per_pupil, raw_row.per_pupil);
        }
        if smoothed_row.per_pupil.is_some() {
            assert_eq!(smoothed_row.source, ValueSource::Smoothed);
        }
    }
}
