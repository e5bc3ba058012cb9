//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use cmdb_config::{CmdbConfig, ConfigError};
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

#[test]
fn loads_store_and_log_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[store]
trail_dir = "/var/lib/cmdb/trail"
trail_enabled = true

[log]
level = "cmdb_store=debug,info"
ansi = false
"#,
        )?;

        let config: CmdbConfig = Figment::from(Serialized::defaults(CmdbConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.store.trail_dir, "/var/lib/cmdb/trail");
        assert!(config.store.trail_enabled);
        assert!(config.store.is_configured());
        assert_eq!(config.log.level, "cmdb_store=debug,info");
        assert!(!config.log.ansi);
        Ok(())
    });
}

#[test]
fn partial_section_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[store]
trail_enabled = true
"#,
        )?;

        let config: CmdbConfig = Figment::from(Serialized::defaults(CmdbConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.store.trail_dir, ".cmdb/trail");
        assert_eq!(config.log.level, "info");
        assert!(config.log.ansi);
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_default_chain() {
    Jail::expect_with(|jail| {
        std::fs::create_dir(".cmdb").expect("create project config dir");
        jail.create_file(
            ".cmdb/config.toml",
            r#"
[store]
trail_dir = "state/trail"
"#,
        )?;

        let config = CmdbConfig::load().expect("config loads");
        assert_eq!(config.store.trail_dir, "state/trail");
        Ok(())
    });
}

#[test]
fn enabled_trail_with_blank_dir_fails_load() {
    Jail::expect_with(|jail| {
        std::fs::create_dir(".cmdb").expect("create project config dir");
        jail.create_file(
            ".cmdb/config.toml",
            r#"
[store]
trail_dir = ""
trail_enabled = true
"#,
        )?;

        let err = CmdbConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { .. }));
        Ok(())
    });
}
