use std::fmt;
use thiserror::Error;

/// One structural or field-level problem found in the service registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{file} is empty")]
    EmptyRegistry { file: String },

    #[error("Missing 'services' key in {file}")]
    MissingServicesKey { file: String },

    #[error("'services' must be a dictionary/map")]
    ServicesNotMapping,

    #[error("No services defined in {file}")]
    NoServices { file: String },

    #[error("Invalid service name '{name}': must be 1-63 characters, lowercase letters, numbers, hyphens, underscores only")]
    InvalidServiceName { name: String },

    #[error("Service '{service}': config must be a dictionary")]
    ConfigNotMapping { service: String },

    #[error("Service '{service}': missing required field '{field}'")]
    MissingField { service: String, field: String },

    #[error("Service '{service}': missing required field 'subdomain' (required for non-internal services)")]
    MissingSubdomain { service: String },

    #[error("Service '{service}': invalid subdomain '{value}' (must be valid service name format)")]
    InvalidSubdomain { service: String, value: String },

    #[error("Service '{service}': port must be an integer between 1 and 65535, got {value}")]
    InvalidPort { service: String, value: String },

    #[error("Service '{service}': '{field}' must be a boolean")]
    NotBoolean { service: String, field: String },

    #[error("Service '{service}': 'description' must be a string")]
    DescriptionNotString { service: String },

    #[error("Service '{service}': 'image' must be a non-empty string")]
    InvalidImage { service: String },

    #[error("Service '{service}': '{field}' must be a dictionary/map")]
    FieldNotMapping { service: String, field: String },

    #[error("Service '{service}': support image '{image}' must be a string")]
    InvalidSupportImage { service: String, image: String },

    #[error("Service '{service}': tcp port '{port_name}' must be an integer between 1 and 65535, got {value}")]
    InvalidTcpPort {
        service: String,
        port_name: String,
        value: String,
    },
}

impl ValidationError {
    /// Service the error belongs to, `None` for registry-level problems.
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::EmptyRegistry { .. }
            | Self::MissingServicesKey { .. }
            | Self::ServicesNotMapping
            | Self::NoServices { .. } => None,
            Self::InvalidServiceName { name } => Some(name),
            Self::ConfigNotMapping { service }
            | Self::MissingField { service, .. }
            | Self::MissingSubdomain { service }
            | Self::InvalidSubdomain { service, .. }
            | Self::InvalidPort { service, .. }
            | Self::NotBoolean { service, .. }
            | Self::DescriptionNotString { service }
            | Self::InvalidImage { service }
            | Self::FieldNotMapping { service, .. }
            | Self::InvalidSupportImage { service, .. }
            | Self::InvalidTcpPort { service, .. } => Some(service),
        }
    }
}

/// Every violation collected during one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

#[derive(Error, Debug)]
pub enum TfvarsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': {reason} (got '{value}')")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Error reading {file}: {message}")]
    RegistryReadError { file: String, message: String },

    #[error("{file} validation failed: {errors}")]
    ValidationError {
        file: String,
        errors: ValidationErrors,
    },
}

impl TfvarsError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ValidationError { .. } | Self::RegistryReadError { .. } => 1,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => 2,
            Self::IoError(_) | Self::YamlError(_) | Self::SerializationError(_) => 1,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "Fix every listed service entry and re-run; nothing was written",
            Self::RegistryReadError { .. } | Self::YamlError(_) => {
                "Make sure the registry file exists and is valid YAML"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Check the generator config file and command line flags"
            }
            Self::IoError(_) => "Check that the output artifact path is writable",
            Self::SerializationError(_) => "Report this as a bug",
        }
    }
}

pub type Result<T> = std::result::Result<T, TfvarsError>;
