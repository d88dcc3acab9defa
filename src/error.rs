use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnsRecordsError {
    /// A required input was empty or out of range. Raised before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The client or the Cloudflare API failed. Kept as-is for the caller.
    #[error(transparent)]
    Remote(#[from] anyhow::Error),

    /// The provider returned something that breaks its own contract,
    /// e.g. a listed record without an id.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DnsRecordsError>;

pub(crate) fn require(value: &str, field: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DnsRecordsError::InvalidArgument(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}
