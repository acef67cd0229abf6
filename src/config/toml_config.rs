use crate::core::firewall::FirewallOptions;
use crate::core::validator::DEFAULT_REGISTRY_FILE;
use crate::utils::error::{Result, TfvarsError};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "tfvars.toml";
pub const DEFAULT_OUTPUT_FILE: &str = "tofu/stack/config.tfvars";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub registry: RegistryConfig,
    pub output: OutputConfig,
    pub firewall: FirewallConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_REGISTRY_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallConfig {
    pub validate_source_ips: bool,
    pub warn_duplicate_keys: bool,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        let defaults = FirewallOptions::default();
        Self {
            validate_source_ips: defaults.validate_source_ips,
            warn_duplicate_keys: defaults.warn_duplicate_keys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            format: "text".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Load the generator config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TfvarsError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse the generator config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TfvarsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Load `path` when given, otherwise the default file if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Replace `${VAR}` references with environment values; unset variables stay verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TfvarsError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn firewall_options(&self) -> FirewallOptions {
        FirewallOptions {
            validate_source_ips: self.firewall.validate_source_ips,
            warn_duplicate_keys: self.firewall.warn_duplicate_keys,
        }
    }

    pub fn log_format(&self) -> Result<LogFormat> {
        self.logging
            .format
            .parse()
            .map_err(|reason| TfvarsError::InvalidConfigValueError {
                field: "logging.format".to_string(),
                value: self.logging.format.clone(),
                reason,
            })
    }

    /// Name shown in registry-level diagnostics, e.g. `services.yaml`.
    pub fn registry_label(&self) -> String {
        Path::new(&self.registry.path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.registry.path.clone())
    }
}

impl Validate for GeneratorConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("registry.path", &self.registry.path)?;
        validate_path("registry.path", &self.registry.path)?;
        validate_non_empty_string("output.path", &self.output.path)?;
        validate_path("output.path", &self.output.path)?;
        self.log_format()?;
        Ok(())
    }
}
