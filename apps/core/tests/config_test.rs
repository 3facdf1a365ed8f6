use std::collections::BTreeMap;

use quickswitch_core::config::{self, ConfigError, Settings};
use quickswitch_core::mode::{LinkKind, Mode};
use quickswitch_core::ranking::{PriorityCategory, RankingPolicy};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = config::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn toml_round_trip_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.symbol_list_command = "$".to_string();
    settings.limit = 12;
    settings.exclude_folders = vec!["^archive".to_string()];
    settings.exclude_link_sub_types.insert(LinkKind::Block);
    settings.enabled_ribbon_commands.insert(Mode::CommandList);

    config::save(&settings, &path).unwrap();
    let loaded = config::load(Some(&path)).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn json5_config_with_comments_and_partial_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json5");
    std::fs::write(
        &path,
        r#"{
            // only override what differs
            headings_list_command: "h:",
            strict_headings_only: true,
            match_priority_adjustments: {
                enabled: true,
                adjustments: { is_open_in_editor: 25, h1: -10 },
            },
        }"#,
    )
    .unwrap();

    let settings = config::load(Some(&path)).unwrap();
    assert_eq!(settings.headings_list_command, "h:");
    assert!(settings.strict_headings_only);
    assert_eq!(settings.symbol_list_command, "@");
    assert_eq!(
        settings.match_priority_adjustments,
        RankingPolicy {
            enabled: true,
            adjustments: BTreeMap::from([
                (PriorityCategory::IsOpenInEditor, 25.0),
                (PriorityCategory::H1, -10.0),
            ]),
        }
    );
}

#[test]
fn json_save_round_trips_adjustments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut settings = Settings::default();
    settings.match_priority_adjustments.enabled = true;
    settings
        .match_priority_adjustments
        .adjustments
        .insert(PriorityCategory::IsStarred, 40.0);

    config::save(&settings, &path).unwrap();
    assert_eq!(config::load(Some(&path)).unwrap(), settings);
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "limit = 0\n").unwrap();
    assert!(matches!(config::load(Some(&path)), Err(ConfigError::Invalid(_))));

    std::fs::write(&path, "exclude_related_folders = [\"(\"]\n").unwrap();
    assert!(matches!(config::load(Some(&path)), Err(ConfigError::Invalid(_))));

    std::fs::write(&path, "limit = \"many\"\n").unwrap();
    assert!(matches!(config::load(Some(&path)), Err(ConfigError::Toml(_))));
}

#[test]
fn save_refuses_invalid_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut settings = Settings::default();
    settings
        .match_priority_adjustments
        .adjustments
        .insert(PriorityCategory::File, 150.0);
    assert!(config::save(&settings, &path).is_err());
    assert!(!path.exists());
}
