use std::io::Write;

use modwire_hooks::BeginFailurePolicy;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn empty_document_uses_defaults() {
	let config = FrameworkConfig::from_toml_str("").unwrap();
	assert_eq!(config, FrameworkConfig::default());
	assert_eq!(config.hooks.begin_failure, BeginFailurePolicy::Blacklist);
	assert_eq!(config.logging.max_level().unwrap(), Level::INFO);
	assert!(config.events.async_delivery);
}

#[test]
fn sections_override_defaults() {
	let config = FrameworkConfig::from_toml_str(
		r#"
[hooks]
begin_failure = "propagate"

[logging]
level = "DEBUG"

[events]
async_delivery = false
"#,
	)
	.unwrap();
	assert_eq!(config.hooks.begin_failure, BeginFailurePolicy::Propagate);
	assert_eq!(config.logging.max_level().unwrap(), Level::DEBUG);
	assert!(!config.events.async_delivery);
}

#[test]
fn invalid_values_are_rejected() {
	assert!(matches!(
		FrameworkConfig::from_toml_str("[logging]\nlevel = \"loud\""),
		Err(ConfigError::Logging(_))
	));
	assert!(matches!(
		FrameworkConfig::from_toml_str("[hooks]\nbegin_failure = \"ignore\""),
		Err(ConfigError::Parse(_))
	));
	assert!(matches!(
		FrameworkConfig::from_toml_str("[events]\nbatch = 3"),
		Err(ConfigError::Parse(_))
	));
}

#[test]
fn load_reads_file() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "[events]\nasync_delivery = false").unwrap();
	let config = FrameworkConfig::load(file.path()).unwrap();
	assert!(!config.events.async_delivery);

	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing.toml");
	assert!(matches!(
		FrameworkConfig::load(&missing),
		Err(ConfigError::Io { path, .. }) if path == missing
	));
}
