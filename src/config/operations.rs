//! JobConfig loading, validation, and utility operations.

use super::model::JobConfig;
use crate::error::{JobError, Result};
use std::path::Path;

impl JobConfig {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            JobError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: JobConfig = serde_yaml::from_str(yaml)
            .map_err(|e| JobError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| JobError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `java_command_path` must be non-empty
    /// - `elasticsearch_cluster_name` must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.java_command_path.trim().is_empty() {
            return Err(JobError::UserError(
                "config validation failed: java_command_path must be non-empty".to_string(),
            ));
        }

        if self.elasticsearch_cluster_name.trim().is_empty() {
            return Err(JobError::UserError(
                "config validation failed: elasticsearch_cluster_name must be non-empty"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
