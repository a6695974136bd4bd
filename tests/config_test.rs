use std::fs;
use tempfile::TempDir;

use domain_prospector::config::Config;
use domain_prospector::domain::LeadStatus;
use domain_prospector::error::ProspectorError;
use domain_prospector::pipeline::pipeline_config::SourceSelection;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_loads_file_and_derives_pipeline_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r##"
[pipeline]
sources = ["opensea", "flippa", "sedo"]

[filter]
min_price = 100
max_price = 50000
categories = ["Technology", "Business"]

[scoring.criteria.domainLength]
min = 5
max = 15
weight = 2

[scoring.criteria.marketDemand]
weight = 2

[scoring.auto_qualify]
min_score = 0.8
status = "qualified"

[manager]
default_status = "new"

[notifications.webhook]
url = "https://crm.example.com/hook"
headers = { Authorization = "Bearer token" }

[logging]
level = "debug"
dir = "/tmp/prospector-logs"
"##,
    );

    let config = Config::load(&path).unwrap();
    let pipeline = config.pipeline_config();
    pipeline.validate().unwrap();

    let selection = pipeline.source_selection();
    assert_eq!(selection.len(), 3);
    assert!(matches!(selection[1], SourceSelection::Unknown(ref name) if name == "flippa"));

    assert_eq!(pipeline.filter.categories, vec!["Technology", "Business"]);
    let scorer = pipeline.scorer.unwrap();
    assert_eq!(scorer.criteria.max_possible_score(), 4.0);
    assert_eq!(scorer.auto_qualify.unwrap().min_score, 0.8);
    assert_eq!(pipeline.manager.default_status, Some(LeadStatus::New));

    let webhook = config.notifications.webhook.unwrap();
    assert_eq!(webhook.headers.get("Authorization").map(String::as_str), Some("Bearer token"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_inverted_price_bounds_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[filter]
min_price = 5000
max_price = 100
"#,
    );

    let config = Config::load(&path).unwrap();
    let err = config.pipeline_config().validate().unwrap_err();
    assert!(matches!(err, ProspectorError::Config(_)));
}

#[test]
fn test_malformed_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[filter\nmin_price = ");

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ProspectorError::Toml(_)));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_or_default(dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.pipeline.sources, vec!["sedo", "opensea", "godaddy"]);
    assert!(config.pipeline_config().scorer.is_none());
}
