//! Tests for configuration system

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::models::config::{OutputFormat, PartialSettings, Settings};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_partial_settings_merge() {
        let mut base = PartialSettings {
            scan_path: Some(PathBuf::from("/base/path")),
            exclude_patterns: Some(vec!["base_exclude".to_string()]),
            ..Default::default()
        };

        let override_settings = PartialSettings {
            scan_path: Some(PathBuf::from("/override/path")),
            max_cycles: Some(5),
            ..Default::default()
        };

        base.merge_from(override_settings);

        assert_eq!(base.scan_path, Some(PathBuf::from("/override/path")));
        assert_eq!(base.exclude_patterns, Some(vec!["base_exclude".to_string()]));
        assert_eq!(base.max_cycles, Some(5));
    }

    #[test]
    fn test_partial_settings_to_settings() {
        let partial = PartialSettings {
            scan_path: Some(PathBuf::from("/custom/path")),
            min_confidence: Some(0.3),
            output_format: Some(OutputFormat::Json),
            cache_enabled: Some(false),
            ..Default::default()
        };

        let settings = partial.to_settings();

        assert_eq!(settings.scan_path, PathBuf::from("/custom/path"));
        assert_eq!(settings.min_confidence, 0.3);
        assert_eq!(settings.output_format, OutputFormat::Json);
        assert!(!settings.cache_enabled);

        // Unspecified fields fall back to defaults
        let defaults = Settings::default();
        assert!(settings.parallel);
        assert_eq!(settings.file_glob, "**/*.py");
        assert_eq!(settings.indicator_only_confidence, defaults.indicator_only_confidence);
        assert_eq!(settings.noise_technologies, defaults.noise_technologies);
    }

    #[test]
    fn test_config_builder() {
        let root = tempdir().unwrap();
        let other = tempdir().unwrap();

        let partial1 = PartialSettings {
            scan_path: Some(root.path().to_path_buf()),
            exclude_patterns: Some(vec!["exclude1".to_string()]),
            ..Default::default()
        };

        let partial2 = PartialSettings {
            scan_path: Some(other.path().to_path_buf()),
            max_cycles: Some(5),
            ..Default::default()
        };

        let settings = ConfigBuilder::new().merge(partial1).merge(partial2).build().unwrap();

        // Last merge wins for scan_path
        assert_eq!(settings.scan_path, other.path());
        // First merge is preserved for exclude_patterns
        assert_eq!(settings.exclude_patterns, vec!["exclude1".to_string()]);
        assert_eq!(settings.max_cycles, 5);
    }

    #[test]
    fn test_file_config_source() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        fs::write(
            &config_path,
            r#"
            exclude_patterns = ["migrations"]
            min_confidence = 0.65
            output_format = "csv"
            cache_ttl_secs = 60
            "#,
        )
        .unwrap();

        let file_config = file::FileConfig::with_path(&config_path);
        assert!(file_config.is_available());
        assert_eq!(file_config.priority(), 20);

        let partial = file_config.load().unwrap();
        assert_eq!(partial.exclude_patterns, Some(vec!["migrations".to_string()]));
        assert_eq!(partial.min_confidence, Some(0.65));
        assert_eq!(partial.output_format, Some(OutputFormat::Csv));
        assert_eq!(partial.cache_ttl_secs, Some(60));
    }

    #[test]
    fn test_file_config_not_found() {
        let file_config = file::FileConfig::with_path("/nonexistent/path/config.toml");
        assert!(!file_config.is_available());
        assert!(matches!(
            file_config.load().unwrap_err(),
            crate::error::ArchscanError::ConfigNotFound { .. }
        ));
    }

    #[test]
    fn test_explicit_missing_config_file_is_an_error() {
        let result = ConfigBuilder::new().add_config_file(std::path::Path::new("/nonexistent/archscan.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_config_source() {
        std::env::set_var("ARCHSCAN_T1_SCAN_PATH", "/env/path");
        std::env::set_var("ARCHSCAN_T1_EXCLUDE", "migrations, docs,,build");
        std::env::set_var("ARCHSCAN_T1_MIN_CONFIDENCE", "0.8");
        std::env::set_var("ARCHSCAN_T1_PARALLEL", "false");
        std::env::set_var("ARCHSCAN_T1_OUTPUT_FORMAT", "JSON");

        let env_config = file::EnvConfig::new("ARCHSCAN_T1");
        assert!(env_config.is_available());
        assert_eq!(env_config.priority(), 10);

        let partial = env_config.load().unwrap();
        assert_eq!(partial.scan_path, Some(PathBuf::from("/env/path")));
        assert_eq!(
            partial.exclude_patterns,
            Some(vec!["migrations".to_string(), "docs".to_string(), "build".to_string()])
        );
        assert_eq!(partial.min_confidence, Some(0.8));
        assert_eq!(partial.parallel, Some(false));
        assert_eq!(partial.output_format, Some(OutputFormat::Json));

        for key in ["SCAN_PATH", "EXCLUDE", "MIN_CONFIDENCE", "PARALLEL", "OUTPUT_FORMAT"] {
            std::env::remove_var(format!("ARCHSCAN_T1_{}", key));
        }
    }

    #[test]
    fn test_env_config_rejects_bad_values() {
        std::env::set_var("ARCHSCAN_T2_WORKERS", "many");
        let err = file::EnvConfig::new("ARCHSCAN_T2").load().unwrap_err();
        assert!(err.to_string().contains("ARCHSCAN_T2_WORKERS"));
        std::env::remove_var("ARCHSCAN_T2_WORKERS");

        assert!(!file::EnvConfig::new("ARCHSCAN_T2").is_available());
    }

    #[test]
    fn test_config_builder_load_from() {
        let root = tempdir().unwrap();
        let config_path = root.path().join("test_config.toml");
        fs::write(
            &config_path,
            format!(
                "scan_path = {:?}\nexclude_patterns = [\"file_exclude\"]\nmax_cycles = 5\n",
                root.path().display().to_string()
            ),
        )
        .unwrap();

        std::env::set_var("ARCHSCAN_T3_SCAN_PATH", "/env/path");
        std::env::set_var("ARCHSCAN_T3_OUTPUT_FORMAT", "json");

        let settings = ConfigBuilder::new()
            .load_from(&file::EnvConfig::new("ARCHSCAN_T3"))
            .unwrap()
            .load_from(&file::FileConfig::with_path(&config_path))
            .unwrap()
            .build()
            .unwrap();

        std::env::remove_var("ARCHSCAN_T3_SCAN_PATH");
        std::env::remove_var("ARCHSCAN_T3_OUTPUT_FORMAT");

        // File config overrides env config for scan_path
        assert_eq!(settings.scan_path, root.path());
        assert_eq!(settings.exclude_patterns, vec!["file_exclude".to_string()]);
        assert_eq!(settings.max_cycles, 5);
        // Env value survives where the file is silent
        assert_eq!(settings.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_settings_validator() {
        let dir = tempdir().unwrap();
        let valid = Settings {
            scan_path: dir.path().to_path_buf(),
            ..Settings::default()
        };
        assert!(SettingsValidator::validate(&valid).is_ok());

        let missing_root = Settings {
            scan_path: PathBuf::from("/nonexistent/path"),
            ..Settings::default()
        };
        assert!(SettingsValidator::validate(&missing_root).is_err());

        let bad_threshold = Settings {
            scan_path: dir.path().to_path_buf(),
            indicator_only_confidence: -0.1,
            ..Settings::default()
        };
        assert!(SettingsValidator::validate(&bad_threshold).unwrap_err().is_critical());

        let no_nodes = Settings {
            scan_path: dir.path().to_path_buf(),
            max_nodes: 0,
            ..Settings::default()
        };
        assert!(SettingsValidator::validate(&no_nodes).is_err());

        let bad_output = Settings {
            scan_path: dir.path().to_path_buf(),
            output_file: Some(dir.path().join("missing").join("report.json")),
            ..Settings::default()
        };
        assert!(SettingsValidator::validate(&bad_output).is_err());
    }

    #[test]
    fn test_load_config_with_env_prefix() {
        let root = tempdir().unwrap();
        let config_path = root.path().join("archscan.toml");
        fs::write(
            &config_path,
            "exclude_patterns = [\"file_exclude\"]\nmin_confidence = 0.9\nmax_cycles = 5\n",
        )
        .unwrap();

        std::env::set_var("ARCHSCAN_T4_OUTPUT_FORMAT", "csv");
        std::env::set_var("ARCHSCAN_T4_MIN_CONFIDENCE", "0.2");

        let cli_args = CliArgs {
            path: Some(root.path().to_path_buf()),
            config: Some(config_path),
            min_confidence: Some(0.4),
            no_cache: true,
            ..Default::default()
        };

        let settings = load_config_with_env_prefix(cli_args, "ARCHSCAN_T4").unwrap();

        std::env::remove_var("ARCHSCAN_T4_OUTPUT_FORMAT");
        std::env::remove_var("ARCHSCAN_T4_MIN_CONFIDENCE");

        assert_eq!(settings.scan_path, root.path());
        assert_eq!(settings.exclude_patterns, vec!["file_exclude".to_string()]);
        assert_eq!(settings.max_cycles, 5);
        assert_eq!(settings.output_format, OutputFormat::Csv);
        // CLI beats env beats file
        assert_eq!(settings.min_confidence, 0.4);
        assert!(!settings.cache_enabled);
    }

    #[test]
    fn test_create_default_config_parses() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join(file::DEFAULT_CONFIG_FILE);

        let file_config = file::FileConfig::with_path(&config_path);
        file_config.create_default().unwrap();

        assert!(config_path.exists());
        assert!(parser::parse_config_file(&config_path).is_ok());
    }
}
