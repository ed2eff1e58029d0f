// tests/archive_config.rs
mod common;

use chrono::{NaiveDate, Weekday};
use mygov_archiver::config::archive::ENV_CONFIG_PATH;
use mygov_archiver::ArchiveConfig;
use serial_test::serial;
use std::io::Write;

#[test]
fn shipped_config_parses() {
    let cfg = ArchiveConfig::load_from_file(std::path::Path::new("config/archiver.toml")).unwrap();
    assert_eq!(cfg.keyword, "MyGov");
    assert_eq!(cfg.sources.len(), 9);
    assert_eq!(cfg.anchor_weekday().unwrap(), Weekday::Tue);
    assert_eq!(cfg.schedule.start, NaiveDate::from_ymd_opt(2022, 9, 6).unwrap());
    assert!(cfg.search.enabled);
    let may6 = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
    assert_eq!(cfg.naming().filename_for(may6), "MyGov May 06, 2025.pdf");
}

#[test]
#[serial]
fn env_var_points_at_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let body = common::config_toml(&[("one", "https://one.test/list")], "2025-01-07", "2025-01-28", false);
    file.write_all(body.as_bytes()).unwrap();

    std::env::set_var(ENV_CONFIG_PATH, file.path());
    let loaded = ArchiveConfig::load(None);
    std::env::remove_var(ENV_CONFIG_PATH);

    let cfg = loaded.unwrap();
    assert_eq!(cfg.sources[0].name, "one");
    let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    assert_eq!(cfg.schedule(today).unwrap().iter().count(), 4);
}

#[test]
#[serial]
fn explicit_path_beats_env_var() {
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    let loaded = ArchiveConfig::load(Some(std::path::Path::new("config/archiver.toml")));
    std::env::remove_var(ENV_CONFIG_PATH);
    assert!(loaded.is_ok());
}

#[test]
#[serial]
fn missing_file_names_the_path() {
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    let err = ArchiveConfig::load(None).unwrap_err();
    std::env::remove_var(ENV_CONFIG_PATH);
    assert!(format!("{err:#}").contains("/definitely/not/here.toml"));
}

#[test]
fn empty_source_list_is_fatal() {
    let body = common::config_toml(&[], "2025-01-07", "2025-01-28", false);
    let err = ArchiveConfig::from_toml_str(&body).unwrap_err();
    assert!(format!("{err:#}").contains("no source endpoints"));
}

#[test]
fn open_ended_schedule_runs_to_today() {
    let body = r#"
keyword = "MyGov"

[schedule]
start = "2025-01-07"
anchor_weekday = "tue"

[storage]
dir = "downloads"

[[sources]]
name = "one"
url = "https://one.test/list"
"#;
    let cfg = ArchiveConfig::from_toml_str(body).unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
    let dates: Vec<NaiveDate> = cfg.schedule(today).unwrap().iter().collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
        ]
    );
    assert_eq!(cfg.network.download_concurrency, 2);
    assert!(!cfg.filename_pad_day);
    assert!(cfg.network.tls_verify);
}
