pub mod cli;
pub mod toml_config;

pub use toml_config::GeneratorConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "services-tfvars")]
#[command(about = "Compile the service registry into the OpenTofu services/firewall tfvars fragment")]
#[command(version)]
pub struct CliConfig {
    /// Generator config file (defaults to ./tfvars.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Service registry YAML
    #[arg(long)]
    pub registry: Option<String>,

    /// tfvars artifact to append to
    #[arg(long)]
    pub output: Option<String>,

    /// Comma separated enabled services from the state store
    #[arg(long, env = "ENABLED_SERVICES", default_value = "")]
    pub enabled_services: String,

    /// Firewall rules, `service:port:source_ips:dns_record` joined by `;`
    #[arg(long, env = "FIREWALL_RULES", default_value = "")]
    pub firewall_rules: String,

    /// Print the fragment to stdout instead of appending it
    #[arg(long)]
    pub dry_run: bool,

    /// Only validate the registry
    #[arg(long, conflicts_with = "dry_run")]
    pub check: bool,

    /// Drop firewall records whose source IPs are not valid CIDRs
    #[arg(long)]
    pub strict_source_ips: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Log format: text or json
    #[arg(long)]
    pub log_format: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Command line flags override values from the config file.
    pub fn apply_to(&self, config: &mut GeneratorConfig) {
        if let Some(registry) = &self.registry {
            config.registry.path = registry.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if self.strict_source_ips {
            config.firewall.validate_source_ips = true;
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config_file() {
        let cli = CliConfig::parse_from([
            "services-tfvars",
            "--registry",
            "other.yaml",
            "--strict-source-ips",
            "--log-format",
            "json",
        ]);
        let mut config = GeneratorConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.registry.path, "other.yaml");
        assert_eq!(config.output.path, toml_config::DEFAULT_OUTPUT_FILE);
        assert!(config.firewall.validate_source_ips);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_check_conflicts_with_dry_run() {
        let result = CliConfig::try_parse_from(["services-tfvars", "--check", "--dry-run"]);
        assert!(result.is_err());
    }
}
