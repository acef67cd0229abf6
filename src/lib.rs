pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalArtifact, GeneratorConfig};
pub use crate::core::compiler::{check_registry, compile, CompileInputs, Compiled, TfvarsEngine};
pub use crate::core::firewall::{FirewallOptions, FirewallWarning};
pub use domain::model::CompileReport;
pub use utils::error::{Result, TfvarsError, ValidationError, ValidationErrors};
