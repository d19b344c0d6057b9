mod common;

use std::io::Cursor;

use extrusion_lib::{Blend, Error, MaterialCatalog};

#[test]
fn fixture_catalog_loads_with_source_path() {
    let catalog = common::fixture_catalog();
    assert_eq!(catalog.len(), 6);
    assert_eq!(
        catalog.all_names(),
        vec!["Corn", "Wheat", "Rye", "Protein", "Potato_Starch", "Whole_Wheat"]
    );
    assert!(catalog
        .source_path()
        .expect("loaded from file")
        .ends_with("materials_v35.csv"));
}

#[test]
fn catalogs_differ_for_the_same_material() {
    let builtin = MaterialCatalog::builtin().expect("builtin catalog");
    let fixture = common::fixture_catalog();

    let builtin_protein = builtin.lookup("protein").expect("protein in builtin");
    let fixture_protein = fixture.lookup("PROTEIN").expect("protein in fixture");
    assert_eq!(builtin_protein.crisp_coeff, 4.0);
    assert_eq!(fixture_protein.crisp_coeff, 3.5);
}

#[test]
fn unknown_material_carries_suggestions() {
    let catalog = common::fixture_catalog();
    let err = catalog.lookup("Wheet").expect_err("typo");
    match err {
        Error::UnknownMaterial { name, suggestions } => {
            assert_eq!(name, "Wheet");
            assert_eq!(suggestions.first().map(String::as_str), Some("Wheat"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn missing_file_is_reported() {
    let path = common::fixtures_dir().join("does_not_exist.csv");
    let err = MaterialCatalog::from_path(&path).expect_err("missing file");
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn invalid_rows_are_rejected() {
    let cases = [
        ("name,expansion_coeff,crisp_coeff,flavor_label\ncorn,0,6,sweet\n", "positive"),
        ("name,expansion_coeff,crisp_coeff,flavor_label\ncorn,abc,6,sweet\n", "row 2"),
        ("name,expansion_coeff,crisp_coeff\ncorn,2,6\n", "flavor_label"),
        ("name,expansion_coeff,crisp_coeff,flavor_label\n", "no materials"),
    ];

    for (csv, needle) in cases {
        let err = MaterialCatalog::from_reader(Cursor::new(csv)).expect_err("invalid catalog");
        assert!(
            err.to_string().contains(needle),
            "expected '{needle}' in '{err}'"
        );
    }
}

#[test]
fn duplicate_names_are_rejected_case_insensitively() {
    let csv = "name,expansion_coeff,crisp_coeff,flavor_label\ncorn,2,6,sweet\nCORN,2,6,sweet\n";
    let err = MaterialCatalog::from_reader(Cursor::new(csv)).expect_err("duplicate");
    assert!(matches!(err, Error::DuplicateMaterial { name } if name == "corn"));
}

#[test]
fn shared_flavor_labels_are_summed() {
    let path = common::fixtures_dir().join("shared_flavors.csv");
    let catalog = MaterialCatalog::from_path(&path).expect("shared flavors fixture");
    let blend = Blend::validate([("corn", 30.0), ("maize", 30.0), ("wheat", 40.0)], &catalog)
        .expect("valid blend");

    let sweet: f64 = blend
        .weights()
        .iter()
        .filter(|(material, _)| material.flavor_label == "sweet")
        .map(|(_, weight)| weight)
        .sum();
    assert!((sweet - 0.6).abs() < 1e-9);
}
