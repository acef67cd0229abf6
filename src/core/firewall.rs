//! Parser for the compact firewall rule string supplied by the state store.
//!
//! Grammar: records separated by `;`, each `service:port[:source_ips[:dns_record]]`
//! with `source_ips` a `,` separated list of CIDRs. Bad records are skipped
//! with a warning, they never fail the run.

use crate::domain::model::{FirewallRuleSpec, Registry};
use crate::utils::validation::{is_valid_port, validate_source_ip};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FirewallWarning {
    #[error("Invalid firewall rule entry: {entry}")]
    InvalidEntry { entry: String },

    #[error("Invalid port in firewall rule: {entry}")]
    InvalidPort { entry: String },

    #[error("Port {port} out of range in firewall rule: {entry}")]
    PortOutOfRange { entry: String, port: i64 },

    #[error("Port {port} not in tcp_ports for {service}, skipping")]
    PortNotDeclared { service: String, port: u16 },

    #[error("Invalid source IP '{token}' in firewall rule: {entry}")]
    InvalidSourceIp { entry: String, token: String },

    #[error("Duplicate firewall rule key '{key}', both rules are emitted")]
    DuplicateKey { key: String },
}

impl FirewallWarning {
    /// Whether the record that raised this warning was dropped.
    pub fn skipped_record(&self) -> bool {
        !matches!(self, Self::DuplicateKey { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallOptions {
    pub validate_source_ips: bool,
    pub warn_duplicate_keys: bool,
}

impl Default for FirewallOptions {
    fn default() -> Self {
        Self {
            validate_source_ips: false,
            warn_duplicate_keys: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirewallParse {
    /// In input order.
    pub rules: Vec<FirewallRuleSpec>,
    pub warnings: Vec<FirewallWarning>,
}

pub fn parse_rules(input: &str, registry: &Registry) -> FirewallParse {
    parse_rules_with(input, registry, FirewallOptions::default())
}

pub fn parse_rules_with(input: &str, registry: &Registry, options: FirewallOptions) -> FirewallParse {
    let mut parsed = FirewallParse::default();
    let mut seen_keys = HashSet::new();

    for entry in input.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        match parse_record(entry, registry, options) {
            Ok(rule) => {
                let key = rule.key();
                if !seen_keys.insert(key.clone()) && options.warn_duplicate_keys {
                    parsed.warnings.push(FirewallWarning::DuplicateKey { key });
                }
                parsed.rules.push(rule);
            }
            Err(warning) => parsed.warnings.push(warning),
        }
    }

    for warning in &parsed.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::debug!(
        "parsed {} firewall rules ({} warnings)",
        parsed.rules.len(),
        parsed.warnings.len()
    );

    parsed
}

fn parse_record(
    entry: &str,
    registry: &Registry,
    options: FirewallOptions,
) -> Result<FirewallRuleSpec, FirewallWarning> {
    let parts: Vec<&str> = entry.split(':').collect();
    if parts.len() < 2 {
        return Err(FirewallWarning::InvalidEntry {
            entry: entry.to_string(),
        });
    }

    let service_name = parts[0];
    let port = parts[1]
        .trim()
        .parse::<i64>()
        .map_err(|_| FirewallWarning::InvalidPort {
            entry: entry.to_string(),
        })?;
    if !is_valid_port(port) {
        return Err(FirewallWarning::PortOutOfRange {
            entry: entry.to_string(),
            port,
        });
    }
    let port = u16::try_from(port).map_err(|_| FirewallWarning::PortOutOfRange {
        entry: entry.to_string(),
        port,
    })?;

    let raw_source_ips = parts.get(2).copied().unwrap_or_default();
    let dns_record = parts.get(3).copied().unwrap_or_default();

    // only services that are known and declare tcp_ports can be checked
    if let Some(service) = registry.get(service_name) {
        if !service.tcp_ports.is_empty() && !service.declares_tcp_port(port) {
            return Err(FirewallWarning::PortNotDeclared {
                service: service_name.to_string(),
                port,
            });
        }
    }

    let source_ips: Vec<String> = raw_source_ips
        .split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect();

    if options.validate_source_ips {
        if let Some(token) = source_ips.iter().find(|ip| !validate_source_ip(ip)) {
            return Err(FirewallWarning::InvalidSourceIp {
                entry: entry.to_string(),
                token: token.clone(),
            });
        }
    }

    Ok(FirewallRuleSpec {
        service_name: service_name.to_string(),
        port,
        source_ips,
        dns_record: dns_record.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ServiceDefinition, TcpPort};

    fn registry() -> Registry {
        let base = ServiceDefinition {
            name: String::new(),
            port: 8080,
            image: "img".to_string(),
            subdomain: String::new(),
            public: false,
            core: false,
            internal_only: false,
            description: String::new(),
            support_images: vec![],
            tcp_ports: vec![],
        };
        Registry {
            services: vec![
                ServiceDefinition {
                    name: "redpanda".to_string(),
                    tcp_ports: vec![TcpPort {
                        name: "kafka".to_string(),
                        port: 9092,
                    }],
                    ..base.clone()
                },
                ServiceDefinition {
                    name: "jupyter".to_string(),
                    ..base
                },
            ],
        }
    }

    #[test]
    fn test_parse_full_record() {
        let parsed = parse_rules("svc:9092:10.0.0.0/8,1.2.3.4/32:kafka.example.com", &registry());
        assert!(parsed.warnings.is_empty());
        assert_eq!(
            parsed.rules,
            vec![FirewallRuleSpec {
                service_name: "svc".to_string(),
                port: 9092,
                source_ips: vec!["10.0.0.0/8".to_string(), "1.2.3.4/32".to_string()],
                dns_record: "kafka.example.com".to_string(),
            }]
        );
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let parsed = parse_rules("svc:5432", &registry());
        assert_eq!(parsed.rules.len(), 1);
        assert!(parsed.rules[0].source_ips.is_empty());
        assert_eq!(parsed.rules[0].dns_record, "");

        let parsed = parse_rules("svc:5432: , ,10.1.0.0/16 :", &registry());
        assert_eq!(parsed.rules[0].source_ips, vec!["10.1.0.0/16".to_string()]);
    }

    #[test]
    fn test_empty_input_and_blank_records() {
        assert_eq!(parse_rules("", &registry()), FirewallParse::default());
        assert_eq!(parse_rules("  ;; ; ", &registry()), FirewallParse::default());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let parsed = parse_rules("justname;svc:notaport;svc:70000;svc:22", &registry());
        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.rules[0].port, 22);
        assert_eq!(
            parsed.warnings,
            vec![
                FirewallWarning::InvalidEntry {
                    entry: "justname".to_string()
                },
                FirewallWarning::InvalidPort {
                    entry: "svc:notaport".to_string()
                },
                FirewallWarning::PortOutOfRange {
                    entry: "svc:70000".to_string(),
                    port: 70000
                },
            ]
        );
    }

    #[test]
    fn test_undeclared_port_for_known_service_is_dropped() {
        let parsed = parse_rules("redpanda:9093::;redpanda:9092::kafka", &registry());
        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.rules[0].port, 9092);
        assert_eq!(
            parsed.warnings,
            vec![FirewallWarning::PortNotDeclared {
                service: "redpanda".to_string(),
                port: 9093
            }]
        );
        assert_eq!(
            parsed.warnings[0].to_string(),
            "Port 9093 not in tcp_ports for redpanda, skipping"
        );
    }

    #[test]
    fn test_unknown_service_and_service_without_tcp_ports_are_kept() {
        let parsed = parse_rules("ghost:1234;jupyter:8888", &registry());
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.rules.len(), 2);
    }

    #[test]
    fn test_duplicate_keys_are_kept_and_flagged() {
        let parsed = parse_rules("redpanda:9092:10.0.0.0/8;redpanda:9092:192.168.0.0/16", &registry());
        assert_eq!(parsed.rules.len(), 2);
        assert_eq!(
            parsed.warnings,
            vec![FirewallWarning::DuplicateKey {
                key: "redpanda-9092".to_string()
            }]
        );
        assert!(!parsed.warnings[0].skipped_record());

        let quiet = parse_rules_with(
            "redpanda:9092;redpanda:9092",
            &registry(),
            FirewallOptions {
                warn_duplicate_keys: false,
                ..FirewallOptions::default()
            },
        );
        assert_eq!(quiet.rules.len(), 2);
        assert!(quiet.warnings.is_empty());
    }

    #[test]
    fn test_strict_source_ips() {
        let options = FirewallOptions {
            validate_source_ips: true,
            ..FirewallOptions::default()
        };
        let parsed = parse_rules_with("svc:22:10.0.0.0/8,not-an-ip;svc:23:10.0.0.1", &registry(), options);
        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.rules[0].port, 23);
        assert_eq!(
            parsed.warnings,
            vec![FirewallWarning::InvalidSourceIp {
                entry: "svc:22:10.0.0.0/8,not-an-ip".to_string(),
                token: "not-an-ip".to_string()
            }]
        );
    }

    #[test]
    fn test_preserves_input_order() {
        let parsed = parse_rules("b:2;a:1;c:3", &registry());
        let keys: Vec<String> = parsed.rules.iter().map(FirewallRuleSpec::key).collect();
        assert_eq!(keys, vec!["b-2", "a-1", "c-3"]);
    }
}
