use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Auxiliary image shipped alongside a service (sidecars, init jobs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportImage {
    pub name: String,
    pub image: String,
}

/// Logical TCP port a service exposes for direct external access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpPort {
    pub name: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub port: u16,
    pub image: String,
    /// Empty for internal-only services that declare none.
    pub subdomain: String,
    pub public: bool,
    pub core: bool,
    pub internal_only: bool,
    pub description: String,
    /// Declaration order is kept.
    pub support_images: Vec<SupportImage>,
    pub tcp_ports: Vec<TcpPort>,
}

impl ServiceDefinition {
    pub fn declares_tcp_port(&self, port: u16) -> bool {
        self.tcp_ports.iter().any(|p| p.port == port)
    }
}

/// Validated registry snapshot, services in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub services: Vec<ServiceDefinition>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Service names the upstream state store reports as enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledSet(BTreeSet<String>);

impl EnabledSet {
    /// Parse the comma-separated form; blank entries are dropped.
    pub fn parse(input: &str) -> Self {
        Self(
            input
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<S> for EnabledSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Which branch of the enablement policy decided a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnablementReason {
    Core,
    Selected,
    NotSelected,
    NoExternalState,
}

impl EnablementReason {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Core | Self::Selected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedService {
    pub service: ServiceDefinition,
    pub enabled: bool,
    pub reason: EnablementReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRuleSpec {
    pub service_name: String,
    pub port: u16,
    pub source_ips: Vec<String>,
    pub dns_record: String,
}

impl FirewallRuleSpec {
    /// Output map key, `{service}-{port}`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.service_name, self.port)
    }
}

/// Outcome of one compiler run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileReport {
    pub services: usize,
    pub enabled_services: usize,
    pub firewall_rules: usize,
    /// Records dropped by the parser; duplicate-key warnings keep their record.
    pub skipped_firewall_records: usize,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_set_parse_trims_and_drops_blanks() {
        let set = EnabledSet::parse(" redpanda, ,postgres,,");
        assert_eq!(set.len(), 2);
        assert!(set.contains("redpanda"));
        assert!(set.contains("postgres"));
        assert!(!set.contains(""));
    }

    #[test]
    fn test_enabled_set_parse_empty() {
        assert!(EnabledSet::parse("").is_empty());
        assert!(EnabledSet::parse(" , ").is_empty());
    }

    #[test]
    fn test_firewall_rule_key() {
        let rule = FirewallRuleSpec {
            service_name: "redpanda".to_string(),
            port: 9092,
            source_ips: vec![],
            dns_record: String::new(),
        };
        assert_eq!(rule.key(), "redpanda-9092");
    }
}
