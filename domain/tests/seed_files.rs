//! Checks the shipped seed files against the statement tokenizer.

use domain::hardware_loader::{statements, Era};
use std::fs;
use std::path::{Path, PathBuf};

fn seed_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../extras/sql")
}

fn statements_in(file_name: &str) -> Vec<String> {
    let text = fs::read_to_string(seed_dir().join(file_name)).unwrap();
    statements::parse(&text).collect()
}

#[test]
fn every_era_has_its_seed_files() {
    for era in Era::ALL {
        for file in era.seed_files(&seed_dir()) {
            assert!(file.is_file(), "{} is missing for {era}", file.display());
        }
    }
}

#[test]
fn seed_files_yield_only_inserts() {
    for file_name in [
        "retro_hardware_2005.sql",
        "retro_hardware_extended_2008.sql",
        "modern_hardware.sql",
    ] {
        let statements = statements_in(file_name);
        assert!(!statements.is_empty(), "{file_name} yields no statements");

        for statement in statements {
            assert!(
                statement.starts_with("INSERT INTO "),
                "{file_name} yields an unexpected statement: {statement}"
            );
            assert!(!statement.ends_with(';'));
        }
    }
}

#[test]
fn statement_counts_match_the_seeded_tables() {
    assert_eq!(statements_in("retro_hardware_2005.sql").len(), 15);
    assert_eq!(statements_in("retro_hardware_extended_2008.sql").len(), 12);
    assert_eq!(statements_in("modern_hardware.sql").len(), 15);
}

#[test]
fn quoted_semicolons_and_apostrophes_survive() {
    let retro = statements_in("retro_hardware_2005.sql");
    assert!(retro
        .iter()
        .any(|statement| statement.contains("'Maxtor DiamondMax 10 300GB; 16MB cache'")));
    assert!(retro
        .iter()
        .any(|statement| statement.contains("'Tom Clancy''s Splinter Cell: Chaos Theory'")));
}
