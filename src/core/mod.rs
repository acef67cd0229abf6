pub mod compiler;
pub mod emitter;
pub mod enablement;
pub mod firewall;
pub mod validator;

pub use crate::domain::model::{
    EnabledSet, FirewallRuleSpec, Registry, ResolvedService, ServiceDefinition,
};
pub use crate::domain::ports::{ArtifactSink, Validate};
pub use crate::utils::error::Result;
