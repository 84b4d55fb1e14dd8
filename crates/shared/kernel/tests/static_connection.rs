use fkit_domain::Variables;
use fkit_kernel::config::{ConfigError, ConfigLoader, load_config};
use fkit_kernel::connection::{MalformedReport, StaticConnection};
use fkit_registry::{Connection, FeatureDescriptor, FeatureRegistry};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const VARIABLES_TOML: &str = r#"
[settings]
punctuation-enabled = false

[home-screen]
sections = ["top-sites", "recent"]
section-count = 2
"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("temp file should be writable");
    path
}

#[test]
fn test_loads_toml_variables() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "variables.toml", VARIABLES_TOML);

    let connection = StaticConnection::load_with(ConfigLoader::new(&path).env_source(Default::default()))
        .unwrap();

    assert_eq!(connection.feature_ids(), ["home-screen", "settings"]);
    let settings = connection.get_variables("settings").unwrap();
    assert_eq!(settings.get_bool("punctuation-enabled"), Some(false));
    let home = connection.get_variables("home-screen").unwrap();
    assert_eq!(home.get_string_list("sections").unwrap(), ["top-sites", "recent"]);
    assert_eq!(home.get_int("section-count"), Some(2));
}

#[test]
fn test_loads_json_variables() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "variables.json", r#"{ "settings": { "punctuation-enabled": true } }"#);

    let connection = StaticConnection::load_with(ConfigLoader::new(&path).env_source(Default::default()))
        .unwrap();

    let settings = connection.get_variables("settings").unwrap();
    assert_eq!(settings.get_bool("punctuation-enabled"), Some(true));
}

#[test]
fn test_environment_overrides_file_values() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "variables.toml", VARIABLES_TOML);
    let env = [
        ("FKIT__SETTINGS__PUNCTUATION_ENABLED".to_owned(), "true".to_owned()),
        ("FKIT__HOME_SCREEN__SECTION_COUNT".to_owned(), "5".to_owned()),
        ("UNRELATED".to_owned(), "ignored".to_owned()),
    ]
    .into_iter()
    .collect();

    let connection = StaticConnection::load_with(ConfigLoader::new(&path).env_source(env)).unwrap();

    let settings = connection.get_variables("settings").unwrap();
    assert_eq!(settings.get_bool("punctuation-enabled"), Some(true));
    let home = connection.get_variables("home-screen").unwrap();
    assert_eq!(home.get_int("section-count"), Some(5));
    assert_eq!(home.get_string_list("sections").unwrap().len(), 2);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config::<serde_json::Value>(dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err, ConfigError::Config { .. }));
    assert!(err.context_message().is_some_and(|c| c.starts_with("Failed to build config")));
}

#[test]
fn test_non_table_features_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "variables.toml", "settings = 3\n");

    let result = StaticConnection::load_with(ConfigLoader::new(&path).env_source(Default::default()));
    assert!(result.is_err());
}

#[derive(Debug)]
struct Settings {
    punctuation_enabled: bool,
}

#[test]
fn test_registry_reads_through_static_connection() {
    let mut builder = FeatureRegistry::builder();
    let settings = builder
        .register(FeatureDescriptor::new("settings", |v: &dyn Variables| {
            Ok(Settings { punctuation_enabled: v.get_bool("punctuation-enabled").unwrap_or(false) })
        }))
        .unwrap();
    let limits = builder
        .register(FeatureDescriptor::new("limits", |v: &dyn Variables| v.require_int("max-items")))
        .unwrap();
    let registry = builder.build();

    assert!(!settings.value().unwrap().punctuation_enabled);

    let dir = TempDir::new().unwrap();
    let path = write(&dir, "variables.toml", VARIABLES_TOML);
    let env = [("FKIT__SETTINGS__PUNCTUATION_ENABLED".to_owned(), "true".to_owned())].into_iter().collect();
    let connection = Arc::new(StaticConnection::load_with(ConfigLoader::new(&path).env_source(env)).unwrap());
    registry.set_connection(connection.clone());
    assert!(!settings.value().unwrap().punctuation_enabled);

    registry.invalidate_cached_values();
    assert!(settings.value().unwrap().punctuation_enabled);
    assert!(limits.value().is_err());
    assert_eq!(
        connection.malformed_reports(),
        [MalformedReport { feature_id: "limits".into(), part_id: "max-items".into() }]
    );

    settings.record_experiment_exposure("punctuation-rollout").unwrap();
    assert_eq!(connection.exposures()[0].experiment_slug.as_deref(), Some("punctuation-rollout"));
}
