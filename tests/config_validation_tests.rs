//! Config Validation Tests
//!
//! Exercises typo detection and constraint checking of the service config
//! independently from the rest of the service.

use recore::config::validation::{known_config_keys, suggest_correction, validate_unknown_keys};
use recore::config::{ConfigError, ServiceConfig, StoreLocation};
use recore::context::AppContext;
use recore::model::UnmappedClusterPolicy;
use std::io::Write;
use std::path::PathBuf;

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_store_section_warns_with_suggestion() {
    let warnings = validate_unknown_keys("[store]\nurl = \"memory://\"\n");
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "store.url");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("store.uri"));
}

#[test]
fn typo_in_anomaly_section_is_suggested() {
    let warnings = validate_unknown_keys("[anomaly]\nn_tree = 50\n");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("anomaly.n_trees"));
}

#[test]
fn full_valid_config_has_no_warnings() {
    let toml_str = r#"
[server]
addr = "127.0.0.1:5000"
cors_origins = "http://localhost:8501"
max_upload_bytes = 1048576

[store]
uri = "memory://"
timeout_ms = 500

[model]
dir = "models"
unmapped_cluster = "unknown"

[anomaly]
contamination = 0.05
seed = 7
n_trees = 50
max_samples = 128
min_cohort = 4
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());

    let config = ServiceConfig::from_toml_str(toml_str).unwrap();
    config.validate().unwrap();
    assert_eq!(config.model.unmapped_cluster, UnmappedClusterPolicy::Unknown);
    assert_eq!(config.anomaly.min_cohort, 4);
    assert_eq!(config.server.cors_origins, "http://localhost:8501");
}

#[test]
fn unrelated_key_gets_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("completely_unrelated_section", &known).is_none());
}

// ============================================================================
// Constraint Checks
// ============================================================================

#[test]
fn out_of_range_values_are_all_reported() {
    let config = ServiceConfig::from_toml_str(
        "[anomaly]\ncontamination = 0.8\nn_trees = 0\n\n[store]\ntimeout_ms = 0\n",
    )
    .unwrap();
    match config.validate() {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 3, "{errors:?}");
            assert!(errors.iter().any(|e| e.contains("contamination")));
            assert!(errors.iter().any(|e| e.contains("n_trees")));
            assert!(errors.iter().any(|e| e.contains("timeout_ms")));
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn unknown_store_scheme_degrades_instead_of_failing() {
    let config =
        ServiceConfig::from_toml_str("[store]\nuri = \"mongodb://localhost:27017\"\n").unwrap();
    assert!(config.store.location().is_err());
    config.validate().unwrap();

    let ctx = AppContext::from_config(config);
    assert!(ctx.store.is_none());
}

#[test]
fn store_uri_forms() {
    let mut config = ServiceConfig::default();
    assert_eq!(
        config.store.location().unwrap(),
        StoreLocation::Sled(PathBuf::from("./data/recore.db"))
    );
    config.store.uri = "memory://".to_string();
    assert_eq!(config.store.location().unwrap(), StoreLocation::Memory);
}

#[test]
fn explicit_config_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\naddr = \"127.0.0.1:6000\"\n\n[anomaly]\nseed = 99").unwrap();

    let config = ServiceConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.server.addr, "127.0.0.1:6000");
    assert_eq!(config.anomaly.seed, 99);
    assert_eq!(config.anomaly.n_trees, 100);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server\naddr = ").unwrap();
    assert!(matches!(
        ServiceConfig::load_from_file(file.path()),
        Err(ConfigError::Parse(_, _))
    ));
}

#[test]
fn defaults_round_trip_through_toml() {
    let config = ServiceConfig::default();
    let back = ServiceConfig::from_toml_str(&config.to_toml().unwrap()).unwrap();
    assert_eq!(back, config);
}
