//! Config loader tests

use std::fs;

use bootline::config::ConfigLoader;
use bootline::errors::BootlineError;
use bootline::logs::LogLevel;
use serde_json::json;

#[tokio::test]
async fn test_load_with_external_unit_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("units")).unwrap();
    fs::write(
        dir.path().join("units/web.json"),
        r#"{ "program": "sleep", "args": ["60"] }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("bootline.json"),
        r#"{
            "abortOnFailure": false,
            "logLevel": "warn",
            "units": [
                { "name": "web", "kind": "command", "instances": 2, "config": "units/web.json" },
                { "name": "greeter", "kind": "log", "config": { "message": "hi" } },
                { "name": "log" }
            ]
        }"#,
    )
    .unwrap();

    let settings = ConfigLoader::new(dir.path().join("bootline.json"))
        .load()
        .await
        .unwrap();

    assert!(!settings.abort_on_failure);
    assert_eq!(settings.log_level, LogLevel::Warn);
    assert_eq!(settings.units.len(), 3);

    let web = &settings.units[0];
    assert_eq!(web.kind(), "command");
    assert_eq!(web.instance_count(), 2);
    assert_eq!(web.config, json!({ "program": "sleep", "args": ["60"] }));

    assert_eq!(settings.units[1].config, json!({ "message": "hi" }));
    assert_eq!(settings.units[2].kind(), "log");
    assert_eq!(settings.units[2].instance_count(), 1);
}

#[tokio::test]
async fn test_abort_on_failure_defaults_to_true() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bootline.json");
    fs::write(&path, r#"{ "units": [] }"#).unwrap();

    let settings = ConfigLoader::new(&path).load().await.unwrap();
    assert!(settings.abort_on_failure);
    assert!(settings.units.is_empty());
}

#[tokio::test]
async fn test_missing_document() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConfigLoader::new(dir.path().join("absent.json")).load().await;
    assert!(matches!(result, Err(BootlineError::ConfigError(_))));
}

#[tokio::test]
async fn test_missing_unit_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bootline.json");
    fs::write(
        &path,
        r#"{ "units": [{ "name": "web", "config": "nowhere.json" }] }"#,
    )
    .unwrap();

    match ConfigLoader::new(&path).load().await {
        Err(BootlineError::ConfigError(msg)) => assert!(msg.contains("web")),
        other => panic!("unexpected result: {:?}", other.map(|s| s.units.len())),
    }
}

#[tokio::test]
async fn test_rejects_blank_unit_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bootline.json");
    fs::write(&path, r#"{ "units": [{ "name": "  " }] }"#).unwrap();

    let result = ConfigLoader::new(&path).load().await;
    assert!(matches!(result, Err(BootlineError::ConfigError(_))));
}

#[tokio::test]
async fn test_malformed_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bootline.json");
    fs::write(&path, "{ not json").unwrap();

    let result = ConfigLoader::new(&path).load().await;
    assert!(matches!(result, Err(BootlineError::JsonError(_))));
}
