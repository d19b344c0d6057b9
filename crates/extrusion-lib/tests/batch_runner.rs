mod common;

use std::fs;
use std::io::Cursor;

use extrusion_lib::model::presets;
use extrusion_lib::{
    read_batch_rows, write_batch_csv, BatchRow, BatchRunner, Error, ProcessParameters,
};

fn row(blend: &[(&str, f64)]) -> BatchRow {
    BatchRow {
        blend: blend.iter().map(|(n, r)| (n.to_string(), *r)).collect(),
        parameters: ProcessParameters::default(),
    }
}

#[test]
fn unknown_material_in_middle_row_is_isolated() {
    let engine = common::builtin_engine();
    let rows = [
        row(&[("corn", 60.0), ("wheat", 40.0)]),
        row(&[("corn", 60.0), ("amaranth", 40.0)]),
        row(&[("rye", 100.0)]),
    ];

    let outcomes = BatchRunner::new(&engine).run_batch(&rows, presets::ENERGY);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert!(outcomes[2].is_ok());
    match &outcomes[1].outcome {
        Err(Error::UnknownMaterial { name, .. }) => assert_eq!(name, "amaranth"),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn batch_results_match_single_runs() {
    let engine = common::builtin_engine();
    let rows = [
        row(&[("corn", 100.0)]),
        row(&[("wheat", 50.0), ("whole_wheat", 50.0)]),
    ];

    let outcomes = BatchRunner::new(&engine).run_batch(&rows, presets::SIMPLIFIED);
    for (outcome, row) in outcomes.iter().zip(&rows) {
        let single = engine
            .run(row.blend.clone(), &row.parameters, presets::SIMPLIFIED)
            .expect("single run");
        assert_eq!(outcome.outcome.as_ref().expect("batch run"), &single);
    }
}

#[test]
fn fixture_file_yields_per_row_outcomes() {
    let engine = common::builtin_engine();
    let input = fs::File::open(common::fixtures_dir().join("batch_rows.csv")).expect("fixture");
    let outcomes = BatchRunner::new(&engine)
        .run_batch_csv(input, presets::CALIBRATED)
        .expect("header parses");

    assert_eq!(outcomes.len(), 4);
    assert!(outcomes[0].is_ok());
    assert!(matches!(
        &outcomes[1].outcome,
        Err(Error::InvalidCell { column, value }) if column == "rye" && value == "quinoa"
    ));

    let third = outcomes[2].outcome.as_ref().expect("third row runs");
    assert_eq!(third.chamber_pressure_bar, Some(85.0));
    assert!(matches!(
        &outcomes[3].outcome,
        Err(Error::BlendNotNormalized { total }) if *total == 90.0
    ));
}

#[test]
fn fixture_rows_map_columns_onto_parameters() {
    let catalog = common::builtin_engine().catalog().clone();
    let input = fs::read(common::fixtures_dir().join("batch_rows.csv")).expect("fixture");
    let rows = read_batch_rows(input.as_slice(), &catalog).expect("header parses");

    assert_eq!(rows.len(), 4);
    let first = rows[0].as_ref().expect("first row");
    assert_eq!(first.blend.get("corn"), Some(&100.0));
    assert_eq!(first.parameters.screw_diameter_mm, 30.0);
    assert_eq!(first.parameters.screw_length_mm, 1000.0);
    assert_eq!(first.parameters.chamber_pressure_bar, None);
    assert!(!first.blend.contains_key("operator"));
}

#[test]
fn results_export_as_csv() {
    let engine = common::builtin_engine();
    let csv = "corn,wheat,temperature_C,rpm,moisture_pct,fat_pct\n60,40,150,320,14,4\n60,30,150,320,14,4\n";
    let outcomes = BatchRunner::new(&engine)
        .run_batch_csv(Cursor::new(csv), presets::GEOMETRY)
        .expect("header parses");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("results.csv");
    write_batch_csv(fs::File::create(&path).expect("create"), &outcomes).expect("write");

    let text = fs::read_to_string(&path).expect("read back");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("0,ok,,geometry,"));
    assert!(lines[2].starts_with("1,error,"));
    assert!(lines[2].contains("got 90%"));
}
