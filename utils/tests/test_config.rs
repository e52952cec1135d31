use std::io::Write;

use utils::app_config::*;

pub fn initialize() -> AppConfig {
    let config_contents = include_str!("resources/test_config.toml");
    AppConfig::init(Some(config_contents)).unwrap()
}

#[test]
fn fetch_config() {
    let app_config = initialize();

    let config = app_config.fetch().unwrap();

    assert_eq!(config.paths.remote, "user@host:/backups/save");
    assert_eq!(config.paths.local, "/home/user/save");

    assert_eq!(config.rsync.binary, "rsync");
    assert_eq!(config.rsync.dry_run, false);

    assert_eq!(config.log.level, "info");
    assert_eq!(config.log.dir, None);
}

#[test]
fn verify_get() {
    let app_config = initialize();

    assert_eq!(
        app_config.get::<String>("paths.remote").unwrap(),
        "user@host:/backups/save"
    );
    assert_eq!(app_config.get::<String>("paths.local").unwrap(), "/home/user/save");
    assert_eq!(app_config.get::<bool>("rsync.dry_run").unwrap(), false);
    assert_eq!(app_config.get::<bool>("consumer.enable_console_consumer").unwrap(), true);
    assert_eq!(app_config.get::<usize>("consumer.channel_capacity").unwrap(), 256);
}

#[test]
fn verify_set() {
    let mut app_config = initialize();

    app_config.set("log.level", "debug").unwrap();
    app_config.set("rsync.dry_run", "true").unwrap();
    app_config.set("paths.local", "/tmp/save").unwrap();

    let config = app_config.fetch().unwrap();

    assert_eq!(config.log.level, "debug");
    assert_eq!(config.rsync.dry_run, true);
    assert_eq!(config.paths.local, "/tmp/save");
    // untouched keys survive the rebuild
    assert_eq!(config.paths.remote, "user@host:/backups/save");
}

#[test]
fn test_nested_configuration_access() {
    let app_config = initialize();

    let paths = app_config.get::<PathsConfig>("paths").unwrap();
    assert_eq!(
        paths,
        PathsConfig {
            remote: "user@host:/backups/save".to_string(),
            local: "/home/user/save".to_string(),
        }
    );

    let rsync = app_config.get::<RsyncConfig>("rsync").unwrap();
    assert_eq!(rsync, RsyncConfig::default());

    let log = app_config.get::<LogConfig>("log").unwrap();
    assert_eq!(log.level, "info");
}

#[test]
fn test_missing_sections_use_defaults() {
    let contents = r#"
        [paths]
        remote = "backup:/saves"
        local = "saves"
    "#;
    let app_config = AppConfig::init(Some(contents)).unwrap();

    let config = app_config.fetch().unwrap();
    assert_eq!(config.rsync, RsyncConfig::default());
    assert_eq!(config.log, LogConfig::default());
}

#[test]
fn test_missing_paths_is_an_error() {
    let contents = r#"
        [log]
        level = "info"
    "#;
    let app_config = AppConfig::init(Some(contents)).unwrap();

    assert!(app_config.fetch().is_err());
}

#[test]
fn test_config_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[paths]").unwrap();
    writeln!(file, "local = \"/srv/save\"").unwrap();
    file.flush().unwrap();

    let defaults = include_str!("resources/test_config.toml");
    let app_config = AppConfig::load(Some(defaults), Some(file.path())).unwrap();

    let config = app_config.fetch().unwrap();
    assert_eq!(config.paths.local, "/srv/save");
    assert_eq!(config.paths.remote, "user@host:/backups/save");
}

#[test]
fn test_explicit_config_file_must_exist() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("missing.toml");

    assert!(AppConfig::load(None, Some(&missing)).is_err());
}
