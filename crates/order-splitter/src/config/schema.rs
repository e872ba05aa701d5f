use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Prefix of every artifact name and the `Store` column of summary rows.
    #[serde(default = "default_store_label")]
    pub store_label: String,
    #[serde(default = "default_output_root")]
    pub output_root: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default)]
    pub overwrite: OverwritePolicy,
    #[serde(default = "default_lock_timeout_ms")]
    pub audit_lock_timeout_ms: u64,
}

fn default_store_label() -> String {
    "Depot".to_string()
}

fn default_output_root() -> String {
    "daily_output".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            store_label: default_store_label(),
            output_root: default_output_root(),
            log_dir: default_log_dir(),
            overwrite: OverwritePolicy::default(),
            audit_lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// How to treat a key or file that already exists.
///
/// Applies to duplicate SKUs in the mapping sheet and to output files left by
/// an earlier run on the same date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    #[default]
    LastWriteWins,
    FailOnConflict,
}

impl std::str::FromStr for OverwritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-write-wins" => Ok(Self::LastWriteWins),
            "fail-on-conflict" => Ok(Self::FailOnConflict),
            other => Err(format!(
                "unknown overwrite policy '{}' (expected last-write-wins or fail-on-conflict)",
                other
            )),
        }
    }
}
