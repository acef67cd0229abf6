//! Renders resolved services and firewall rules as a tfvars fragment.
//!
//! Field names, alignment and nesting are consumed verbatim by the
//! downstream OpenTofu stack, so the layout here is fixed.

use crate::domain::model::{FirewallRuleSpec, ResolvedService};

pub const SERVICES_HEADER: &str = "# Services (from service registry, enabled state from state store)";
pub const FIREWALL_HEADER: &str = "# Firewall rules for external TCP access (from state store)";

/// Escape a value for use inside a double-quoted HCL string.
///
/// Template openers `${` and `%{` are doubled so OpenTofu reads them literally.
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                escaped.push(c);
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Bare HCL identifiers start with a letter or `_`; anything else is quoted.
fn map_key(name: &str) -> String {
    let bare = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        name.to_string()
    } else {
        quoted(name)
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", escape_string(value))
}

/// Render the `services` and `firewall_rules` blocks.
///
/// Services are sorted by name; firewall rules keep the order they were
/// parsed in. The result starts with a blank line and has no trailing
/// newline so consecutive appends stay separated.
pub fn emit(services: &[ResolvedService], rules: &[FirewallRuleSpec]) -> String {
    let mut lines: Vec<String> = vec![
        String::new(),
        SERVICES_HEADER.to_string(),
        "services = {".to_string(),
    ];

    let mut sorted: Vec<&ResolvedService> = services.iter().collect();
    sorted.sort_by(|a, b| a.service.name.cmp(&b.service.name));

    for resolved in sorted {
        push_service(&mut lines, resolved);
    }
    lines.push("}".to_string());

    lines.push(String::new());
    lines.push(FIREWALL_HEADER.to_string());
    lines.push("firewall_rules = {".to_string());
    for rule in rules {
        push_rule(&mut lines, rule);
    }
    lines.push("}".to_string());

    lines.join("\n")
}

fn push_service(lines: &mut Vec<String>, resolved: &ResolvedService) {
    let service = &resolved.service;

    lines.push(format!("  {} = {{", map_key(&service.name)));
    lines.push(format!("    enabled     = {}", resolved.enabled));
    lines.push(format!("    subdomain   = {}", quoted(&service.subdomain)));
    lines.push(format!("    port        = {}", service.port));
    lines.push(format!("    public      = {}", service.public));
    if service.core {
        lines.push("    core        = true".to_string());
    }
    lines.push(format!("    description = {}", quoted(&service.description)));
    lines.push(format!("    image       = {}", quoted(&service.image)));

    if !service.support_images.is_empty() {
        lines.push("    support_images = {".to_string());
        for image in &service.support_images {
            lines.push(format!("      {} = {}", quoted(&image.name), quoted(&image.image)));
        }
        lines.push("    }".to_string());
    }

    lines.push("  }".to_string());
    lines.push(String::new());
}

fn push_rule(lines: &mut Vec<String>, rule: &FirewallRuleSpec) {
    let source_ips = rule
        .source_ips
        .iter()
        .map(|ip| quoted(ip))
        .collect::<Vec<_>>()
        .join(", ");

    lines.push(format!("  {} = {{", quoted(&rule.key())));
    lines.push(format!("    port       = {}", rule.port));
    lines.push("    protocol   = \"tcp\"".to_string());
    lines.push(format!("    source_ips = [{}]", source_ips));
    lines.push(format!("    dns_record = {}", quoted(&rule.dns_record)));
    lines.push("  }".to_string());
    lines.push(String::new());
}
