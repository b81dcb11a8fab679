use std::io::Read;
use std::path::PathBuf;

use serial_test::serial;
use temp_env::with_vars;

use super::*;
use crate::ConfigError;
use crate::Error;

fn cleanup_all_rtdb_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("RTDB__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

fn valid_settings(cert: PathBuf) -> Settings {
    Settings::default()
        .with_database_overrides(Some("https://race-test.firebaseio.com/".into()), Some(cert))
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = Settings::default();

    assert_eq!(config.scenario.user_path, "/test/users/u1");
    assert_eq!(config.scenario.user_name, "test user");
    assert_eq!(config.scenario.seed_calls, 10);
    assert_eq!(config.scenario.phone_number, "9999999");
    assert_eq!(config.scenario.join_timeout(), None);
    assert_eq!(config.emulator.max_transaction_retries, 25);
    assert_eq!(config.emulator.state_dir, None);
    assert!(config.database.url.is_empty());
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_rtdb_env_vars();
    with_vars(
        vec![
            ("RTDB__DATABASE__URL", Some("https://env-db.firebaseio.com")),
            ("RTDB__DATABASE__CERT", Some("/tmp/service-account.json")),
            ("RTDB__SCENARIO__SEED_CALLS", Some("4")),
            ("RTDB__EMULATOR__STATE_DIR", Some("/tmp/rtdb-state")),
        ],
        || {
            let config = Settings::new().unwrap();
            assert_eq!(config.emulator.state_dir, Some(PathBuf::from("/tmp/rtdb-state")));

            assert_eq!(config.database.database_url(), "https://env-db.firebaseio.com");
            assert_eq!(config.database.cert, PathBuf::from("/tmp/service-account.json"));
            assert_eq!(config.scenario.seed_calls, 4);
        },
    );
}

#[test]
#[serial]
fn load_should_merge_explicit_file_settings() {
    cleanup_all_rtdb_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("race.toml");

    std::fs::write(
        &config_path,
        r#"
        [database]
        url = "https://file-db.firebaseio.com/"

        [emulator]
        min_latency_ms = 5
        max_latency_ms = 40

        [scenario]
        pause_before_user_update_ms = 5000
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let config = Settings::load(config_path.to_str()).unwrap();

        assert_eq!(config.database.url, "https://file-db.firebaseio.com/");
        assert_eq!(config.emulator.min_latency_ms, 5);
        assert_eq!(config.emulator.max_latency_ms, 40);
        assert_eq!(config.scenario.pause_before_user_update().as_millis(), 5000);
        // Untouched keys keep their defaults
        assert_eq!(config.scenario.seed_calls, 10);
        assert_eq!(config.emulator.max_transaction_retries, 25);
    });
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_rtdb_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("base.toml");
    std::fs::write(
        &config_path,
        r#"
        [database]
        url = "https://file-db.firebaseio.com/"
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("RTDB__DATABASE__URL", Some("https://env-db.firebaseio.com/")),
        ],
        || {
            let config = Settings::new().unwrap();
            assert_eq!(config.database.url, "https://env-db.firebaseio.com/");
        },
    );
}

#[test]
#[serial]
fn load_should_fail_when_explicit_file_is_missing() {
    cleanup_all_rtdb_env_vars();
    let result = Settings::load(Some("/definitely/not/here/race"));
    assert!(matches!(result, Err(Error::Config(ConfigError::Source(_)))));
}

#[test]
fn command_line_overrides_should_replace_loaded_values() {
    let config = Settings::default().with_database_overrides(
        Some("https://cli-db.firebaseio.com".into()),
        Some(PathBuf::from("/etc/cert.json")),
    );
    assert_eq!(config.database.database_url(), "https://cli-db.firebaseio.com");
    assert_eq!(config.database.cert, PathBuf::from("/etc/cert.json"));

    let untouched = config.clone().with_database_overrides(None, None);
    assert_eq!(untouched.database.url, config.database.url);
}

#[test]
fn validation_should_require_database_url_and_cert() {
    let config = Settings::default();
    assert!(config.validate().is_err());

    let config = Settings::default()
        .with_database_overrides(Some("https://race-test.firebaseio.com".into()), None);
    match config.validate() {
        Err(Error::Config(ConfigError::InvalidValue { field, .. })) => {
            assert_eq!(field, "database.cert")
        }
        other => panic!("unexpected validation result: {:?}", other),
    }
}

#[test]
fn validation_should_reject_non_http_urls() {
    let config = Settings::default().with_database_overrides(
        Some("ftp://race-test.firebaseio.com".into()),
        Some(PathBuf::from("/tmp/cert.json")),
    );
    assert!(matches!(
        config.validate(),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "database.url",
            ..
        }))
    ));
}

#[test]
fn validation_should_detect_invalid_scenario_and_emulator_settings() {
    let mut config = valid_settings(PathBuf::from("/tmp/cert.json"));
    assert!(config.validate().is_ok());

    config.scenario.seed_calls = 0;
    assert!(config.validate().is_err());

    let mut config = valid_settings(PathBuf::from("/tmp/cert.json"));
    config.scenario.user_path = "/".into();
    assert!(config.validate().is_err());

    let mut config = valid_settings(PathBuf::from("/tmp/cert.json"));
    config.scenario.user_path = "/test/users/u.1".into();
    assert!(config.validate().is_err());

    let mut config = valid_settings(PathBuf::from("/tmp/cert.json"));
    config.emulator.min_latency_ms = 50;
    config.emulator.max_latency_ms = 10;
    assert!(config.validate().is_err());
}

#[test]
fn certificate_stream_should_read_the_configured_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cert = temp_dir.path().join("service-account.json");
    std::fs::write(&cert, "{}").unwrap();

    let config = valid_settings(cert);
    let mut content = String::new();
    config
        .database
        .certificate_stream()
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "{}");
}

#[test]
fn certificate_stream_should_fail_for_missing_file_or_directory() {
    let temp_dir = tempfile::tempdir().unwrap();

    let missing = valid_settings(temp_dir.path().join("absent.json"));
    assert!(matches!(
        missing.database.certificate_stream(),
        Err(Error::Config(ConfigError::CertificateUnreadable { .. }))
    ));

    let directory = valid_settings(temp_dir.path().to_path_buf());
    assert!(matches!(
        directory.database.certificate_stream(),
        Err(Error::Config(ConfigError::CertificateUnreadable { .. }))
    ));
}

#[test]
fn seed_call_ids_should_follow_creation_order() {
    let mut scenario = ScenarioConfig::default();
    scenario.seed_calls = 3;
    assert_eq!(scenario.seed_call_ids(), vec!["c1", "c2", "c3"]);
}
