mod defaults;
mod types;

pub use defaults::DEFAULT_CONFIG_FILE;
pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::collections::HashSet;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            log_level: default_log_level(),
            concurrency: default_concurrency(),
            timeout_sec: default_timeout_sec(),
            default_provider: default_provider(),
            retry: RetryConfig::default(),
            providers: ProvidersConfig::default(),
            personas: default_personas(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_yaml(&content)
    }

    /// Load an explicitly requested file, or `panelrev.yaml` if it exists,
    /// or fall back to built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for persona in &self.personas {
            if !seen.insert(persona.id.as_str()) {
                return Err(ConfigError::DuplicatePersona(persona.id.clone()));
            }
            if persona.timeout_sec == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "persona '{}' has a zero timeout",
                    persona.id
                )));
            }
        }

        if !self.personas.iter().any(|p| p.enabled) {
            return Err(ConfigError::NoPersonasEnabled);
        }

        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.timeout_sec == 0 {
            return Err(ConfigError::Invalid("timeout_sec must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
