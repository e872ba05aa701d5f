use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    // The label is embedded in directory and file names.
    let label = config.store_label.trim();
    if label.is_empty() {
        return Err(ConfigError::Validation {
            message: "store_label must not be empty".to_string(),
        });
    }
    if label.contains('/') || label.contains('\\') || label.contains("..") {
        return Err(ConfigError::Validation {
            message: format!("store_label contains path characters: {}", label),
        });
    }

    if config.output_root.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "output_root must not be empty".to_string(),
        });
    }
    if config.log_dir.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "log_dir must not be empty".to_string(),
        });
    }

    if config.audit_lock_timeout_ms == 0 {
        return Err(ConfigError::Validation {
            message: "audit_lock_timeout_ms must be greater than zero".to_string(),
        });
    }

    Ok(())
}
