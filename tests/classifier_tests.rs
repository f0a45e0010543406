//! Integration tests for file classification
//!
//! Covers the per-category name rules against realistic mod folders,
//! including entity names that are prefixes of one another.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;
use vehpack::services::classifier::{
    MODEL_EXTENSIONS, audio_archive_patterns, audio_config_patterns, discover_audio_data,
    has_audio_evidence, model_patterns,
};
use vehpack::services::{AssetCategory, NamePattern, find_files};

fn mod_folder(files: &[&str]) -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
    for rel in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }
    (temp, root)
}

fn names(root: &Utf8Path, found: &BTreeSet<Utf8PathBuf>) -> Vec<String> {
    found
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string())
        .collect()
}

#[test]
fn test_prefix_entity_does_not_claim_longer_entity() {
    let (_temp, root) = mod_folder(&[
        "car/car.yft",
        "car/car.ytd",
        "carx/carx.yft",
        "carx/carx_generic.yft",
    ]);

    let car = find_files(&root, &model_patterns("car"), MODEL_EXTENSIONS);
    assert_eq!(names(&root, &car), vec!["car/car.yft", "car/car.ytd"]);

    let carx = find_files(&root, &model_patterns("carx"), MODEL_EXTENSIONS);
    assert_eq!(names(&root, &carx), vec!["carx/carx.yft", "carx/carx_generic.yft"]);
}

#[test]
fn test_hi_variant_matches_hi_rule_not_bare_rule() {
    let bare = NamePattern::stem_rejecting("car", &["_hi", "+hi", "_interior"]);
    assert!(!bare.matches("car_hi.yft"));
    assert!(!bare.matches("car+hi.ytd"));
    assert!(bare.matches("car.yft"));

    let (_temp, root) = mod_folder(&["car_hi.yft", "car+hi.ytd", "vehicles_car_interior.ytd"]);
    let found = find_files(&root, &model_patterns("car"), MODEL_EXTENSIONS);
    assert_eq!(
        names(&root, &found),
        vec!["car+hi.ytd", "car_hi.yft", "vehicles_car_interior.ytd"]
    );
}

#[test]
fn test_matching_is_case_insensitive() {
    let (_temp, root) = mod_folder(&["Models/ADDER2.YFT", "Models/Adder2_Hi.ytd"]);
    let found = find_files(&root, &model_patterns("adder2"), MODEL_EXTENSIONS);
    assert_eq!(found.len(), 2);
}

#[test]
fn test_extension_filter_applies_per_category() {
    let (_temp, root) = mod_folder(&["abc.yft", "abc.awc", "abc.rel", "abc.txt"]);

    let archives = find_files(
        &root,
        &audio_archive_patterns("abc", &Vec::<String>::new()),
        AssetCategory::AudioArchive.extensions(),
    );
    assert_eq!(names(&root, &archives), vec!["abc.awc"]);

    let configs = find_files(
        &root,
        &audio_config_patterns("abc", &Vec::<String>::new()),
        AssetCategory::AudioConfig.extensions(),
    );
    assert_eq!(names(&root, &configs), vec!["abc.rel"]);
}

#[test]
fn test_audio_hash_prefix_matches_shared_sound_bank() {
    let hashes = vec!["zentorno".to_string()];
    let (_temp, root) = mod_folder(&["sfx/zentorno_engine.awc", "sfx/zentorno.rel", "abc.awc"]);

    let archives = find_files(
        &root,
        &audio_archive_patterns("abc", &hashes),
        AssetCategory::AudioArchive.extensions(),
    );
    assert_eq!(names(&root, &archives), vec!["abc.awc", "sfx/zentorno_engine.awc"]);

    let configs = find_files(
        &root,
        &audio_config_patterns("abc", &hashes),
        AssetCategory::AudioConfig.extensions(),
    );
    assert_eq!(names(&root, &configs), vec!["sfx/zentorno.rel"]);
}

#[test]
fn test_find_files_is_deterministic() {
    let (_temp, root) = mod_folder(&["b/abc.yft", "a/abc.ytd", "c/abc_hi.yft"]);
    let first = find_files(&root, &model_patterns("abc"), MODEL_EXTENSIONS);
    let second = find_files(&root, &model_patterns("abc"), MODEL_EXTENSIONS);
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn test_audio_evidence_and_data_names() {
    let (_temp, root) = mod_folder(&["abc.awc", "abc_game.dat", "abc_sounds.dat", "abc_game.dat151"]);
    assert!(has_audio_evidence(&root, "abc"));
    assert!(!has_audio_evidence(&root, "ab"));

    let (game, sounds) = discover_audio_data(&root, "abc", &[]);
    assert_eq!(game.as_deref(), Some("abc_game.dat"));
    assert_eq!(sounds.as_deref(), Some("abc_sounds.dat"));
}

#[test]
fn test_audio_data_prefers_hash_over_entity_name() {
    let (_temp, root) = mod_folder(&["abc_game.dat", "zentorno_game.dat"]);
    let (game, sounds) = discover_audio_data(&root, "abc", &["zentorno".to_string()]);
    assert_eq!(game.as_deref(), Some("zentorno_game.dat"));
    assert_eq!(sounds, None);
}
