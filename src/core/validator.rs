//! Registry validation.
//!
//! The registry is checked as a raw YAML document so that type mistakes
//! (`port: "80"`, `public: yes-please`) are reported as validation errors
//! instead of deserialization failures. Every problem is collected in one
//! pass; an invalid registry never produces output.

use crate::domain::model::{Registry, ServiceDefinition, SupportImage, TcpPort};
use crate::utils::error::{Result, TfvarsError, ValidationError, ValidationErrors};
use crate::utils::validation::{is_valid_port, validate_service_name};
use serde_yaml::{Mapping, Value};

pub const DEFAULT_REGISTRY_FILE: &str = "services.yaml";

const REQUIRED_FIELDS: [&str; 2] = ["port", "image"];

/// Parse registry text. Syntax errors are fatal before validation runs.
pub fn parse_document(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Validate a registry document, labelling registry-level errors with `file`.
pub fn validate_registry(document: &Value, file: &str) -> ValidationErrors {
    let mut errors = Vec::new();

    let Some(services) = services_mapping(document, file, &mut errors) else {
        return errors.into();
    };

    for (key, config) in services {
        let name = match key.as_str() {
            Some(name) if validate_service_name(name) => name,
            _ => {
                errors.push(ValidationError::InvalidServiceName {
                    name: scalar_to_string(key),
                });
                continue;
            }
        };
        validate_service(name, config, &mut errors);
    }

    errors.into()
}

/// Validate, then convert into the typed registry used by the rest of the run.
pub fn load_registry(document: &Value, file: &str) -> Result<Registry> {
    let errors = validate_registry(document, file);
    if !errors.is_empty() {
        return Err(TfvarsError::ValidationError {
            file: file.to_string(),
            errors,
        });
    }

    let services = document
        .get("services")
        .and_then(Value::as_mapping)
        .map(|services| {
            services
                .iter()
                .filter_map(|(key, config)| {
                    let name = key.as_str()?;
                    Some(build_service(name, config.as_mapping()?))
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(Registry { services })
}

fn services_mapping<'a>(
    document: &'a Value,
    file: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a Mapping> {
    if is_falsy(document) {
        errors.push(ValidationError::EmptyRegistry {
            file: file.to_string(),
        });
        return None;
    }

    let Some(services) = document.as_mapping().and_then(|root| root.get("services")) else {
        errors.push(ValidationError::MissingServicesKey {
            file: file.to_string(),
        });
        return None;
    };

    let Some(services) = services.as_mapping() else {
        errors.push(ValidationError::ServicesNotMapping);
        return None;
    };

    if services.is_empty() {
        errors.push(ValidationError::NoServices {
            file: file.to_string(),
        });
        return None;
    }

    Some(services)
}

fn validate_service(name: &str, config: &Value, errors: &mut Vec<ValidationError>) {
    let service = name.to_string();

    let Some(config) = config.as_mapping() else {
        errors.push(ValidationError::ConfigNotMapping { service });
        return;
    };

    for field in REQUIRED_FIELDS {
        if !config.contains_key(field) {
            errors.push(ValidationError::MissingField {
                service: service.clone(),
                field: field.to_string(),
            });
        }
    }

    let internal_only = config
        .get("internal_only")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !internal_only && !config.contains_key("subdomain") {
        errors.push(ValidationError::MissingSubdomain {
            service: service.clone(),
        });
    }

    if let Some(subdomain) = config.get("subdomain") {
        let valid = subdomain.as_str().is_some_and(validate_service_name);
        if !valid {
            errors.push(ValidationError::InvalidSubdomain {
                service: service.clone(),
                value: scalar_to_string(subdomain),
            });
        }
    }

    if let Some(port) = config.get("port") {
        if !port.as_i64().is_some_and(is_valid_port) {
            errors.push(ValidationError::InvalidPort {
                service: service.clone(),
                value: scalar_to_string(port),
            });
        }
    }

    for field in ["public", "core", "internal_only"] {
        if config.get(field).is_some_and(|v| !v.is_bool()) {
            errors.push(ValidationError::NotBoolean {
                service: service.clone(),
                field: field.to_string(),
            });
        }
    }

    if config.get("description").is_some_and(|v| !v.is_string()) {
        errors.push(ValidationError::DescriptionNotString {
            service: service.clone(),
        });
    }

    if let Some(image) = config.get("image") {
        if !image.as_str().is_some_and(|s| !s.is_empty()) {
            errors.push(ValidationError::InvalidImage {
                service: service.clone(),
            });
        }
    }

    if let Some(images) = config.get("support_images") {
        validate_support_images(&service, images, errors);
    }

    if let Some(ports) = config.get("tcp_ports") {
        validate_tcp_ports(&service, ports, errors);
    }
}

fn validate_support_images(service: &str, images: &Value, errors: &mut Vec<ValidationError>) {
    // `support_images:` with no entries parses as null
    if images.is_null() {
        return;
    }
    let Some(images) = images.as_mapping() else {
        errors.push(ValidationError::FieldNotMapping {
            service: service.to_string(),
            field: "support_images".to_string(),
        });
        return;
    };

    for (name, image) in images {
        if !image.is_string() {
            errors.push(ValidationError::InvalidSupportImage {
                service: service.to_string(),
                image: scalar_to_string(name),
            });
        }
    }
}

fn validate_tcp_ports(service: &str, ports: &Value, errors: &mut Vec<ValidationError>) {
    if ports.is_null() {
        return;
    }
    let Some(ports) = ports.as_mapping() else {
        errors.push(ValidationError::FieldNotMapping {
            service: service.to_string(),
            field: "tcp_ports".to_string(),
        });
        return;
    };

    for (name, port) in ports {
        if !port.as_i64().is_some_and(is_valid_port) {
            errors.push(ValidationError::InvalidTcpPort {
                service: service.to_string(),
                port_name: scalar_to_string(name),
                value: scalar_to_string(port),
            });
        }
    }
}

fn build_service(name: &str, config: &Mapping) -> ServiceDefinition {
    let flag = |field: &str| config.get(field).and_then(Value::as_bool).unwrap_or(false);
    let text = |field: &str| config.get(field).and_then(Value::as_str).map(str::to_string);

    let internal_only = flag("internal_only");
    let subdomain = text("subdomain").unwrap_or_else(|| {
        if internal_only {
            String::new()
        } else {
            name.to_string()
        }
    });

    let support_images = config
        .get("support_images")
        .and_then(Value::as_mapping)
        .map(|images| {
            images
                .iter()
                .map(|(image_name, image)| SupportImage {
                    name: scalar_to_string(image_name),
                    image: scalar_to_string(image),
                })
                .collect()
        })
        .unwrap_or_default();

    let tcp_ports = config
        .get("tcp_ports")
        .and_then(Value::as_mapping)
        .map(|ports| {
            ports
                .iter()
                .filter_map(|(port_name, port)| {
                    let port = u16::try_from(port.as_i64()?).ok()?;
                    Some(TcpPort {
                        name: scalar_to_string(port_name),
                        port,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    ServiceDefinition {
        name: name.to_string(),
        port: config
            .get("port")
            .and_then(Value::as_i64)
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or_default(),
        image: text("image").unwrap_or_default(),
        subdomain,
        public: flag("public"),
        core: flag("core"),
        internal_only,
        description: text("description").unwrap_or_default(),
        support_images,
        tcp_ports,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(tagged) => is_falsy(&tagged.value),
    }
}

/// Render a scalar for diagnostics and output keys.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_for(yaml: &str) -> Vec<ValidationError> {
        let document = parse_document(yaml).unwrap();
        validate_registry(&document, DEFAULT_REGISTRY_FILE).0
    }

    const VALID: &str = r#"
services:
  redpanda:
    port: 8080
    image: redpandadata/console:latest
    subdomain: kafka
    public: true
    description: Kafka-compatible streaming
    tcp_ports:
      kafka: 9092
      schema_registry: 8081
  postgres:
    port: 5432
    image: postgres:16
    internal_only: true
    core: true
"#;

    #[test]
    fn test_valid_registry_has_no_errors() {
        assert!(errors_for(VALID).is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(
            errors_for(""),
            vec![ValidationError::EmptyRegistry {
                file: "services.yaml".to_string()
            }]
        );
        assert_eq!(errors_for("{}").len(), 1);
    }

    #[test]
    fn test_missing_services_key() {
        let errors = errors_for("other: 1");
        assert_eq!(
            errors,
            vec![ValidationError::MissingServicesKey {
                file: "services.yaml".to_string()
            }]
        );
    }

    #[test]
    fn test_services_not_a_mapping() {
        assert_eq!(
            errors_for("services: [a, b]"),
            vec![ValidationError::ServicesNotMapping]
        );
    }

    #[test]
    fn test_zero_services() {
        assert_eq!(
            errors_for("services: {}"),
            vec![ValidationError::NoServices {
                file: "services.yaml".to_string()
            }]
        );
    }

    #[test]
    fn test_invalid_name_skips_field_checks() {
        let errors = errors_for(
            r#"
services:
  Bad.Name:
    port: 0
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::InvalidServiceName {
                name: "Bad.Name".to_string()
            }]
        );
    }

    #[test]
    fn test_collects_every_error() {
        let errors = errors_for(
            r#"
services:
  broken:
    port: 70000
    public: "yes"
    core: 1
    description: 42
    image: ""
    subdomain: Not_Valid
  also-broken: just-a-string
  missing:
    description: nothing else
"#,
        );

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert!(messages.contains(
            &"Service 'broken': port must be an integer between 1 and 65535, got 70000".to_string()
        ));
        assert!(messages.contains(&"Service 'broken': 'public' must be a boolean".to_string()));
        assert!(messages.contains(&"Service 'broken': 'core' must be a boolean".to_string()));
        assert!(messages.contains(&"Service 'broken': 'description' must be a string".to_string()));
        assert!(messages.contains(&"Service 'broken': 'image' must be a non-empty string".to_string()));
        assert!(messages.contains(
            &"Service 'broken': invalid subdomain 'Not_Valid' (must be valid service name format)"
                .to_string()
        ));
        assert!(messages.contains(&"Service 'also-broken': config must be a dictionary".to_string()));
        assert!(messages.contains(&"Service 'missing': missing required field 'port'".to_string()));
        assert!(messages.contains(&"Service 'missing': missing required field 'image'".to_string()));
        assert!(messages.contains(
            &"Service 'missing': missing required field 'subdomain' (required for non-internal services)"
                .to_string()
        ));
        assert_eq!(errors.len(), 10);
    }

    #[test]
    fn test_internal_only_relaxes_subdomain() {
        let errors = errors_for(
            r#"
services:
  worker:
    port: 9000
    image: worker:1
    internal_only: true
"#,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_port_must_be_integer() {
        let errors = errors_for(
            r#"
services:
  web:
    port: "8080"
    image: web:1
    subdomain: web
"#,
        );
        assert_eq!(
            errors,
            vec![ValidationError::InvalidPort {
                service: "web".to_string(),
                value: "8080".to_string()
            }]
        );
    }

    #[test]
    fn test_support_images_and_tcp_ports_types() {
        let errors = errors_for(
            r#"
services:
  minio:
    port: 9001
    image: minio/minio
    subdomain: minio
    support_images:
      mc: 12
    tcp_ports: [9000]
"#,
        );
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidSupportImage {
                    service: "minio".to_string(),
                    image: "mc".to_string()
                },
                ValidationError::FieldNotMapping {
                    service: "minio".to_string(),
                    field: "tcp_ports".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_load_registry_builds_typed_services() {
        let document = parse_document(VALID).unwrap();
        let registry = load_registry(&document, DEFAULT_REGISTRY_FILE).unwrap();

        assert_eq!(registry.services.len(), 2);
        let redpanda = registry.get("redpanda").unwrap();
        assert_eq!(redpanda.subdomain, "kafka");
        assert!(redpanda.public);
        assert!(redpanda.declares_tcp_port(9092));
        assert!(!redpanda.declares_tcp_port(5432));

        let postgres = registry.get("postgres").unwrap();
        assert_eq!(postgres.subdomain, "");
        assert!(postgres.core);
        assert!(postgres.internal_only);
        assert_eq!(postgres.description, "");
    }

    #[test]
    fn test_load_registry_keeps_support_image_order() {
        let document = parse_document(
            r#"
services:
  jupyter:
    port: 8888
    image: jupyter/pyspark-notebook
    subdomain: jupyter
    support_images:
      zeta: zeta:1
      alpha: alpha:2
"#,
        )
        .unwrap();
        let registry = load_registry(&document, DEFAULT_REGISTRY_FILE).unwrap();
        let names: Vec<&str> = registry.services[0]
            .support_images
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_load_registry_rejects_invalid() {
        let document = parse_document("services: {}").unwrap();
        assert!(load_registry(&document, DEFAULT_REGISTRY_FILE).is_err());
    }
}
