//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks semantics and
//! returns every violation it finds rather than stopping at the first.

use std::collections::HashSet;
use std::str::FromStr;

use crate::balancer::backend::{parse_backend_url, BackendUrlError};
use crate::balancer::StrategyKind;
use crate::config::schema::BalancerConfig;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address is not a valid socket address: {0}")]
    InvalidBindAddress(String),

    #[error("backend url is not a valid URL: {0}")]
    InvalidBackendUrl(String),

    #[error("backend url must use the http scheme: {0}")]
    UnsupportedBackendUrl(String),

    #[error("backend url registered twice: {0}")]
    DuplicateBackendUrl(String),

    #[error("backend weight must be >= 1: {0}")]
    ZeroWeight(String),

    #[error("strategy.algorithm is not recognized: {0}")]
    UnknownAlgorithm(String),

    #[error("health_check.interval_secs must be > 0")]
    ZeroProbeInterval,

    #[error("health_check.timeout_secs must be > 0")]
    ZeroProbeTimeout,
}

/// Validate a parsed config, collecting all errors.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        match parse_backend_url(&backend.url) {
            Ok(_) => {}
            Err(BackendUrlError::Parse(_)) => {
                errors.push(ValidationError::InvalidBackendUrl(backend.url.clone()));
            }
            Err(BackendUrlError::UnsupportedScheme(_)) => {
                errors.push(ValidationError::UnsupportedBackendUrl(backend.url.clone()));
            }
        }
        if !seen.insert(backend.url.as_str()) {
            errors.push(ValidationError::DuplicateBackendUrl(backend.url.clone()));
        }
        if backend.weight == 0 {
            errors.push(ValidationError::ZeroWeight(backend.url.clone()));
        }
    }

    if StrategyKind::from_str(&config.strategy.algorithm).is_err() {
        errors.push(ValidationError::UnknownAlgorithm(
            config.strategy.algorithm.clone(),
        ));
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroProbeInterval);
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
