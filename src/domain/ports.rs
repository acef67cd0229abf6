use crate::utils::error::Result;

/// Append-only destination for rendered fragments.
///
/// Implementations must never truncate existing content. Concurrent runs
/// against the same artifact have to be serialized by the caller.
pub trait ArtifactSink {
    fn append(&self, fragment: &str) -> Result<()>;

    /// Human readable location, used in logs.
    fn describe(&self) -> String;
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}
