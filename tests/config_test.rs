//! Integration tests for file-based configuration.

use std::fs;

use brlpage::style::{StyleDef, DEFAULT_STYLE};
use brlpage::{Engine, EngineConfig, Error};
use tempfile::TempDir;

#[test]
fn test_save_and_load_dir() {
    let dir = TempDir::new().unwrap();
    let mut config = EngineConfig::default();
    config.page.cells_per_line = 32;
    config.page.running_head = Some("Stories".to_string());

    let settings = config.save_dir(dir.path()).unwrap();
    assert!(settings.join("page.json").is_file());
    assert!(settings.join("rules.json").is_file());

    let loaded = EngineConfig::load_dir(dir.path()).unwrap();
    assert_eq!(loaded, config);
    Engine::new(loaded).unwrap();
}

#[test]
fn test_load_from_paths() {
    let dir = TempDir::new().unwrap();
    let settings = EngineConfig::default().save_dir(dir.path()).unwrap();
    fs::write(settings.join("page.json"), r#"{"cellsPerLine": 28, "linesPerPage": 20}"#).unwrap();

    let config = EngineConfig::from_paths(
        settings.join("page.json"),
        settings.join("braille.json"),
        settings.join("styles.json"),
        settings.join("rules.json"),
    )
    .unwrap();
    assert_eq!(config.page.cells_per_line, 28);
    assert_eq!(config.page.lines_per_page, 20);
    assert!(config.page.braille_page_numbers);
}

#[test]
fn test_missing_settings_dir() {
    let dir = TempDir::new().unwrap();
    let result = EngineConfig::load_dir(dir.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_file() {
    let dir = TempDir::new().unwrap();
    let settings = EngineConfig::default().save_dir(dir.path()).unwrap();
    fs::write(settings.join("braille.json"), "{ not json").unwrap();

    match EngineConfig::load_dir(dir.path()) {
        Err(Error::Config(message)) => assert!(message.contains("braille.json")),
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let settings = EngineConfig::default().save_dir(dir.path()).unwrap();
    fs::remove_file(settings.join("styles.json")).unwrap();
    assert!(matches!(
        EngineConfig::load_dir(dir.path()),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_unknown_base_style() {
    let mut config = EngineConfig::default();
    config
        .styles
        .insert("orphan".to_string(), StyleDef::based_on("nowhere"));
    assert!(matches!(Engine::new(config), Err(Error::Config(_))));
}

#[test]
fn test_inheritance_cycle() {
    let mut config = EngineConfig::default();
    config.styles.insert("a".to_string(), StyleDef::based_on("b"));
    config.styles.insert("b".to_string(), StyleDef::based_on("a"));
    assert!(matches!(Engine::new(config), Err(Error::Config(_))));
}

#[test]
fn test_zero_probe_attempts() {
    let mut config = EngineConfig::default();
    config.braille.probe_attempts = 0;
    assert!(matches!(Engine::new(config), Err(Error::Config(_))));
}

#[test]
fn test_styles_json_shape() {
    let dir = TempDir::new().unwrap();
    let settings = EngineConfig::default().save_dir(dir.path()).unwrap();
    let styles: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(settings.join("styles.json")).unwrap()).unwrap();
    assert!(styles.get(DEFAULT_STYLE).is_some());
    assert!(styles.get("paragraph").is_some());
}
