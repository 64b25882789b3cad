//! Store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store configuration error: {0}")]
    Config(String),

    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store operation failed: {0}")]
    Operation(String),

    #[error("Redis error: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}

impl StoreError {
    /// Check if this error is connection-related and might clear on retry.
    ///
    /// The engine itself never retries; callers can use this to decide
    /// whether a failed operation is worth re-submitting.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Pool(_) => true,
            Self::Redis(e) => {
                e.is_io_error()
                    || e.is_timeout()
                    || e.is_connection_refusal()
                    || e.is_connection_dropped()
            }
            Self::Config(_) | Self::Serialization(_) | Self::Operation(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = StoreError::Config("redis_url required".to_string());
        assert_eq!(
            err.to_string(),
            "Store configuration error: redis_url required"
        );
    }

    #[test]
    fn test_connection_error_display() {
        let err = StoreError::Connection("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Store connection error: connection refused"
        );
    }

    #[test]
    fn test_serialization_error_display() {
        let err = StoreError::Serialization("invalid json".to_string());
        assert_eq!(err.to_string(), "Serialization error: invalid json");
    }

    #[test]
    fn test_operation_error_display() {
        let err = StoreError::Operation("hash value is not an integer".to_string());
        assert_eq!(
            err.to_string(),
            "Store operation failed: hash value is not an integer"
        );
    }

    #[test]
    fn test_is_transient() {
        assert!(StoreError::Connection("down".into()).is_transient());
        assert!(!StoreError::Config("bad".into()).is_transient());
        assert!(!StoreError::Serialization("bad".into()).is_transient());
        assert!(!StoreError::Operation("bad".into()).is_transient());
    }

    #[test]
    fn test_error_debug() {
        let err = StoreError::Config("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Config"));
    }
}
