//! Command-line behavior of the `addr-solver` binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn addr_solver() -> Command {
    Command::cargo_bin("addr-solver").unwrap()
}

#[test]
fn test_normalize_city() {
    addr_solver()
        .args(["normalize", "city", "м. Київ"])
        .assert()
        .success()
        .stdout(predicate::str::contains("киів"));
}

#[test]
fn test_normalize_free_text_splits_fields() {
    addr_solver()
        .args(["normalize", "text", "01001, м. Київ, вул. Хрещатик, 22"])
        .assert()
        .success()
        .stdout(predicate::str::contains("postal_index: 01001"));
}

#[test]
fn test_search_finds_postal_index() {
    let (_dir, source) = common::write_fixture();

    addr_solver()
        .arg("search")
        .arg("--source")
        .arg(&source)
        .args(["--city", "Київ", "--street", "Хрещатик", "--building", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Automatic match"))
        .stdout(predicate::str::contains("01001"));
}

#[test]
fn test_search_json_output() {
    let (_dir, source) = common::write_fixture();

    let output = addr_solver()
        .args(["--format", "json", "search", "--source"])
        .arg(&source)
        .args(["--city", "Львів", "--street", "пл. Ринок", "--building", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["auto"]["postal_index"], "79000");
    assert_eq!(json["total_found"], 1);
}

#[test]
fn test_search_without_fields_fails() {
    let (_dir, source) = common::write_fixture();

    addr_solver()
        .arg("search")
        .arg("--source")
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to search for"));
}

#[test]
fn test_search_text_conflicts_with_fields() {
    let (_dir, source) = common::write_fixture();

    addr_solver()
        .arg("search")
        .arg("--source")
        .arg(&source)
        .args(["--text", "Київ, Хрещатик 1", "--city", "Київ"])
        .assert()
        .failure();
}

#[test]
fn test_missing_source_fails() {
    let dir = tempfile::TempDir::new().unwrap();

    addr_solver()
        .args(["search", "--city", "Київ", "--source"])
        .arg(dir.path().join("absent.csv"))
        .assert()
        .failure();
}

#[test]
fn test_index_build_writes_snapshot() {
    let (dir, source) = common::write_fixture();
    let cache = dir.path().join("gazetteer.bin");

    addr_solver()
        .args(["index", "build", "--source"])
        .arg(&source)
        .arg("--cache")
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("Records:        6"));
    assert!(cache.exists());

    addr_solver()
        .args(["index", "stats", "--source"])
        .arg(&source)
        .arg("--cache")
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded from snapshot"));
}

#[test]
fn test_batch_resolves_rows() {
    let (dir, source) = common::write_fixture();
    let input = dir.path().join("queries.csv");
    std::fs::write(
        &input,
        "city,street,building\n\
         Київ,Хрещатик,5\n\
         Тернопіль,Руська,1\n",
    )
    .unwrap();

    addr_solver()
        .args(["--format", "tsv", "batch"])
        .arg(&input)
        .arg("--source")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("1\tauto\t01001"))
        .stdout(predicate::str::contains("2\tnot_found"));
}

#[test]
fn test_invalid_auto_confidence_rejected() {
    let (_dir, source) = common::write_fixture();

    addr_solver()
        .arg("search")
        .arg("--source")
        .arg(&source)
        .args(["--city", "Київ", "--auto-confidence", "150"])
        .assert()
        .failure();
}

#[test]
fn test_index_cities_suggests_settlements() {
    let (_dir, source) = common::write_fixture();

    addr_solver()
        .args(["index", "cities", "Ірп", "--source"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("м. Ірпінь, Бучанський, Київська область"));
}

#[test]
fn test_index_streets_and_buildings() {
    let (_dir, source) = common::write_fixture();

    addr_solver()
        .args(["index", "streets", "--city", "Львів", "--source"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("пл. Ринок"));

    let output = addr_solver()
        .args(["--format", "json", "index", "buildings"])
        .args(["--city", "Київ", "--street", "Хрещатик", "--source"])
        .arg(&source)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["buildings"]["01001"], serde_json::json!(["1", "3", "5"]));
}

#[test]
fn test_index_streets_unknown_city_fails() {
    let (_dir, source) = common::write_fixture();

    addr_solver()
        .args(["index", "streets", "--city", "Одеса", "--source"])
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No settlement named"));
}

#[test]
fn test_batch_result_cache_is_written_and_reused() {
    let (dir, source) = common::write_fixture();
    let input = dir.path().join("queries.csv");
    let cache = dir.path().join("results.json");
    std::fs::write(&input, "city,street,building\nКиїв,Хрещатик,5\n").unwrap();

    for _ in 0..2 {
        addr_solver()
            .args(["--format", "tsv", "batch"])
            .arg(&input)
            .arg("--source")
            .arg(&source)
            .arg("--result-cache")
            .arg(&cache)
            .assert()
            .success()
            .stdout(predicate::str::contains("1\tauto\t01001"));
    }

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&cache).unwrap()).unwrap();
    let key = addr_solver::matching::cache_key(
        &addr_solver::QueryAddress::new()
            .with_city("Київ")
            .with_street("Хрещатик")
            .with_building("5"),
    );
    let entry = &stored["entries"][key.as_str()];
    assert_eq!(entry["result"]["postal_index"], "01001");
    assert!(entry["cached_at"].is_string());
}
