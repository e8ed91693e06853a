// Unit tests for shell configuration load/save/validate

use crate::config::{ConfigError, ShellConfig};

/// **VALUE**: Verifies a missing config file yields usable defaults.
///
/// **WHY THIS MATTERS**: First launch has no config; the shell must come
/// up on the default bridge port instead of erroring out.
#[test]
fn given_missing_config_file_when_loaded_then_defaults() {
    // GIVEN: An empty config directory
    let temp_dir = tempfile::tempdir().unwrap();

    // WHEN: Loading
    let config = ShellConfig::load(temp_dir.path()).expect("load should succeed");

    // THEN: Defaults apply
    assert_eq!(config.bridge.port, bridge_core::DEFAULT_BRIDGE_PORT);
    assert!(config.database.file.is_none());
    assert!(config.validate().is_ok());
}

/// **VALUE**: Verifies save/load round-trips the configured values.
///
/// **BUG THIS CATCHES**: Would catch serde field renames that silently
/// drop settings between sessions.
#[test]
fn given_saved_config_when_loaded_then_round_trips() {
    // GIVEN: A config with non-default values
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = ShellConfig::default();
    config.bridge.port = 0;
    config.database.file = Some(temp_dir.path().join("custom.db"));

    // WHEN: Saving and reloading
    config.save(temp_dir.path()).expect("save should succeed");
    let reloaded = ShellConfig::load(temp_dir.path()).expect("load should succeed");

    // THEN: The values survive
    assert_eq!(reloaded.bridge.port, 0);
    assert_eq!(reloaded.database.file, config.database.file);
}

/// **VALUE**: Verifies a corrupt config file is an error, not a silent
/// fallback.
///
/// **WHY THIS MATTERS**: A typo in a hand-edited file must be surfaced;
/// silently reverting the bridge port would strand the UI process on the
/// wrong endpoint with no diagnostic.
#[test]
fn given_corrupt_config_file_when_loaded_then_parse_error() {
    // GIVEN: A directory with a broken config.json
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("config.json"), "{ not json").unwrap();

    // WHEN: Loading
    let result = ShellConfig::load(temp_dir.path());

    // THEN: A parse error is reported
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

/// **VALUE**: Verifies validation rejects impossible versions and empty
/// database overrides, before they are persisted.
#[test]
fn given_invalid_values_when_validated_then_rejected() {
    let mut config = ShellConfig::default();
    config.version = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Validation { .. })
    ));

    let mut config = ShellConfig::default();
    config.version = 99;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Validation { .. })
    ));

    let mut config = ShellConfig::default();
    config.database.file = Some(std::path::PathBuf::new());
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Validation { .. })
    ));
}
