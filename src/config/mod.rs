//! Configuration module.
//!
//! Precedence: defaults → config file → environment → CLI flags.

mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_additional_filters, default_config_path,
    default_filters, default_log_path, default_preferences_path, load_config_file,
    load_config_with_precedence, merge_config, ConfigError, ConfigFile, ResolvedConfig,
    CONFIG_ENV_VAR, PAGE_SIZE_ENV_VAR,
};
