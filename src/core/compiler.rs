use crate::core::emitter::emit;
use crate::core::enablement::resolve_all;
use crate::core::firewall::{parse_rules_with, FirewallOptions};
use crate::core::validator::{load_registry, parse_document};
use crate::domain::model::{CompileReport, EnabledSet, Registry};
use crate::domain::ports::ArtifactSink;
use crate::utils::error::{Result, TfvarsError};

/// Everything one run needs, supplied by the entry point.
#[derive(Debug, Clone, Copy)]
pub struct CompileInputs<'a> {
    pub registry_text: &'a str,
    /// Name used in registry-level diagnostics.
    pub registry_file: &'a str,
    /// Comma separated; empty means the state store has no data yet.
    pub enabled_services: &'a str,
    pub firewall_rules: &'a str,
}

#[derive(Debug, Clone)]
pub struct Compiled {
    pub fragment: String,
    pub report: CompileReport,
}

/// Validate the registry text and return the typed snapshot.
pub fn check_registry(registry_text: &str, registry_file: &str) -> Result<Registry> {
    let document = parse_document(registry_text).map_err(|e| match e {
        TfvarsError::YamlError(err) => TfvarsError::RegistryReadError {
            file: registry_file.to_string(),
            message: err.to_string(),
        },
        other => other,
    })?;
    load_registry(&document, registry_file)
}

/// Run the whole pipeline without touching any artifact.
pub fn compile(inputs: CompileInputs<'_>, options: FirewallOptions) -> Result<Compiled> {
    let registry = check_registry(inputs.registry_text, inputs.registry_file)?;
    tracing::info!("✅ Registry valid: {} services", registry.services.len());

    let enabled = EnabledSet::parse(inputs.enabled_services);
    if enabled.is_empty() {
        tracing::info!("No enabled-service state supplied, only core services are enabled");
    } else {
        tracing::debug!("{} services in enabled set", enabled.len());
    }

    let resolved = resolve_all(&registry.services, &enabled);
    let firewall = parse_rules_with(inputs.firewall_rules, &registry, options);
    let fragment = emit(&resolved, &firewall.rules);

    let report = CompileReport {
        services: resolved.len(),
        enabled_services: resolved.iter().filter(|r| r.enabled).count(),
        firewall_rules: firewall.rules.len(),
        skipped_firewall_records: firewall
            .warnings
            .iter()
            .filter(|w| w.skipped_record())
            .count(),
        warnings: firewall.warnings.iter().map(ToString::to_string).collect(),
    };

    Ok(Compiled { fragment, report })
}

pub struct TfvarsEngine<S: ArtifactSink> {
    sink: S,
    options: FirewallOptions,
}

impl<S: ArtifactSink> TfvarsEngine<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            options: FirewallOptions::default(),
        }
    }

    pub fn with_firewall_options(mut self, options: FirewallOptions) -> Self {
        self.options = options;
        self
    }

    /// Compile and append to the sink. Nothing is written unless every
    /// validation step succeeded.
    pub fn run(&self, inputs: CompileInputs<'_>) -> Result<CompileReport> {
        tracing::info!("Compiling services config from {}", inputs.registry_file);

        let compiled = compile(inputs, self.options)?;
        self.sink.append(&compiled.fragment)?;

        tracing::info!("📁 Appended fragment to {}", self.sink.describe());
        Ok(compiled.report)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
