use anyhow::Context;
use std::collections::BTreeSet;
use clap::Parser;
use services_tfvars::domain::model::CompileReport;
use services_tfvars::utils::{logger, validation::Validate};
use services_tfvars::{
    check_registry, compile, CliConfig, CompileInputs, GeneratorConfig, LocalArtifact,
    TfvarsEngine, TfvarsError, ValidationError,
};

fn main() {
    let cli = CliConfig::parse();

    match run(&cli) {
        Ok(()) => {}
        Err(e) => {
            let exit_code = match e.downcast_ref::<TfvarsError>() {
                Some(err) => {
                    report_error(err);
                    err.exit_code()
                }
                None => {
                    eprintln!("❌ {:#}", e);
                    1
                }
            };
            std::process::exit(exit_code);
        }
    }
}

fn run(cli: &CliConfig) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::load(cli.config.as_deref())
        .context("failed to load generator config")?;
    cli.apply_to(&mut config);
    config.validate()?;

    logger::init_cli_logger(config.logging.verbose, config.log_format()?);
    tracing::debug!("generator config: {:?}", config);

    let registry_label = config.registry_label();
    let registry_text = std::fs::read_to_string(&config.registry.path).map_err(|e| {
        TfvarsError::RegistryReadError {
            file: config.registry.path.clone(),
            message: e.to_string(),
        }
    })?;

    if cli.check {
        let registry = check_registry(&registry_text, &registry_label)?;
        println!("Registry OK: {} services", registry.services.len());
        return Ok(());
    }

    let inputs = CompileInputs {
        registry_text: &registry_text,
        registry_file: &registry_label,
        enabled_services: &cli.enabled_services,
        firewall_rules: &cli.firewall_rules,
    };

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - fragment is printed, nothing is appended");
        let compiled = compile(inputs, config.firewall_options())?;
        print_warnings(&compiled.report);
        println!("{}", compiled.fragment);
        return Ok(());
    }

    let engine = TfvarsEngine::new(LocalArtifact::new(&config.output.path))
        .with_firewall_options(config.firewall_options());
    let report = engine.run(inputs)?;

    print_warnings(&report);
    if cli.json {
        println!("{}", serde_json::to_string(&report).map_err(TfvarsError::from)?);
    } else {
        println!(
            "Generated services config for {} services, {} firewall rules",
            report.services, report.firewall_rules
        );
    }

    Ok(())
}

fn print_warnings(report: &CompileReport) {
    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
}

fn report_error(err: &TfvarsError) {
    match err {
        TfvarsError::ValidationError { file, errors } => {
            let affected: BTreeSet<&str> = errors.iter().filter_map(ValidationError::service).collect();
            tracing::error!(
                "❌ {} validation failed with {} error(s) across {} service(s)",
                file,
                errors.len(),
                affected.len()
            );
            eprintln!("{} validation failed:", file);
            for error in errors.iter() {
                eprintln!("  - {}", error);
            }
        }
        other => {
            tracing::error!("❌ {}", other);
            eprintln!("❌ {}", other);
        }
    }
    eprintln!("💡 {}", err.recovery_suggestion());
}
