//! Semantic configuration checks, run after deserialization.

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug)]
pub enum ValidationError {
    InvalidBindAddress(String),
    InvalidMetricsAddress(String),
    ZeroBodyLimit,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(a) => {
                write!(f, "listener.bind_address {:?} is not a valid socket address", a)
            }
            ValidationError::InvalidMetricsAddress(a) => {
                write!(f, "observability.metrics_address {:?} is not a valid socket address", a)
            }
            ValidationError::ZeroBodyLimit => write!(f, "limits.max_body_bytes must be nonzero"),
        }
    }
}

/// Validate a configuration, collecting all failures.
///
/// Note: `network.internal_cidrs` is intentionally not checked here. Invalid
/// CIDR tokens are skipped (with a warning) when the prefix set is built, so
/// a partially bad range list still starts the gateway.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_bad_bind_address_rejected() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_bad_cidrs_are_not_a_validation_error() {
        let mut config = GatewayConfig::default();
        config.network.internal_cidrs = "definitely, not; cidrs".into();
        assert!(validate_config(&config).is_ok());
    }
}
