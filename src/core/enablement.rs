use crate::domain::model::{EnabledSet, EnablementReason, ResolvedService, ServiceDefinition};

/// Decide which branch of the enablement policy applies to `service`.
///
/// Core services win over any external state. Otherwise a non-empty
/// enabled-set is authoritative, and an empty one means the state store
/// has not reported anything yet.
pub fn resolve_reason(service: &ServiceDefinition, enabled: &EnabledSet) -> EnablementReason {
    if service.core {
        EnablementReason::Core
    } else if !enabled.is_empty() {
        if enabled.contains(&service.name) {
            EnablementReason::Selected
        } else {
            EnablementReason::NotSelected
        }
    } else {
        EnablementReason::NoExternalState
    }
}

pub fn resolve(service: &ServiceDefinition, enabled: &EnabledSet) -> bool {
    resolve_reason(service, enabled).is_enabled()
}

pub fn resolve_all(services: &[ServiceDefinition], enabled: &EnabledSet) -> Vec<ResolvedService> {
    services
        .iter()
        .map(|service| {
            let reason = resolve_reason(service, enabled);
            tracing::debug!("service {} enabled={} ({:?})", service.name, reason.is_enabled(), reason);
            ResolvedService {
                service: service.clone(),
                enabled: reason.is_enabled(),
                reason,
            }
        })
        .collect()
}
