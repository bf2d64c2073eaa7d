use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use trellis::config::{get_config, parse_config, PipelineConfig};
use trellis::error::Error;

#[test]
fn test_defaults_without_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = get_config(temp_dir.path()).unwrap();

    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.default_mode, "default");
    assert_eq!(config.output, PathBuf::from("output/infrastructure.yml"));
    assert!(config.validate);
}

#[test]
fn test_yaml_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("trellis.yml"),
        "templates_dir: store\ndefault_mode: html\nvalidate: false\n",
    )
    .unwrap();

    let config = get_config(temp_dir.path()).unwrap();

    assert_eq!(config.templates_dir, PathBuf::from("store"));
    assert_eq!(config.default_mode, "html");
    assert!(!config.validate);
    assert_eq!(config.build_root, PathBuf::from("."));
}

#[test]
fn test_json_config_takes_precedence() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("trellis.json"), r#"{"default_mode": "json"}"#).unwrap();
    fs::write(temp_dir.path().join("trellis.yaml"), "default_mode: yaml\n").unwrap();

    assert_eq!(get_config(temp_dir.path()).unwrap().default_mode, "json");
}

#[test]
fn test_empty_config_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("trellis.yaml"), "\n").unwrap();

    assert_eq!(get_config(temp_dir.path()).unwrap(), PipelineConfig::default());
}

#[test]
fn test_unknown_field_is_rejected() {
    let result = parse_config("default_mod: html\n");
    assert!(matches!(result, Err(Error::ConfigError(_))));
}
