//! Shared gazetteer fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

pub const HEADER: &str = "Область; Адміністративний район(старий); Адміністративний район(новий); \
Найменування ОТГ(довідково); Населений пункт; Індекс НП; Назва вулиці;№ будинку;  \
сортувальний центр 1 рівня; сортувальний центр 2 рівня; \
Адміністративний район доставки(вручення); Технологічний індекс ОПЗ доставки(вручення);\
Особливості функціонування ВПЗ;Тимчасово не функціонує";

pub const ROWS: &[&str] = &[
    "м. Київ;;Шевченківський;;м. Київ;01001;вул. Хрещатик;1, 3, 5;Київ СЦ;;;;;",
    "м. Київ;;Печерський;;м. Київ;01133;бульв. Лесі Українки;26, 28;Київ СЦ;;;;;",
    "Київська область;Києво-Святошинський;Бучанський;Ірпінська;м. Ірпінь;08200;вул. Соборна;1, 2, 3;;;;;;",
    "Львівська область;;Львівський;;м. Львів;79000;пл. Ринок;1, 2, 3, 4;Львів СЦ;;;;;",
    "Дніпропетровська область;;Дніпровський;;м. Дніпро;49000;просп. Дмитра Яворницького;1, 2;;;;;;",
    "Київська область;;Обухівський;;с. Гореничі;08150;;;;;;;;Тимчасово не працює",
];

/// Gazetteer source text with the fixture rows
pub fn source_text() -> String {
    let mut text = HEADER.to_string();
    for row in ROWS {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text
}

/// Write the fixture gazetteer (UTF-8) into a fresh directory
pub fn write_fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("magistral.csv");
    std::fs::write(&path, source_text()).expect("write fixture");
    (dir, path)
}

/// Write the fixture gazetteer encoded as Windows-1251
pub fn write_fixture_cp1251() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("magistral.csv");
    let text = source_text();
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1251.encode(&text);
    assert!(!had_errors);
    std::fs::write(&path, bytes).expect("write fixture");
    (dir, path)
}
