use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("non-canonical signature (high s)")]
    NonCanonicalSignature,

    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_private_key() {
        let err = CryptoError::InvalidPrivateKey("scalar is zero".into());
        assert_eq!(err.to_string(), "invalid private key: scalar is zero");
    }

    #[test]
    fn display_invalid_recovery_id() {
        let err = CryptoError::InvalidRecoveryId(7);
        assert_eq!(err.to_string(), "invalid recovery id: 7");
    }

    #[test]
    fn display_non_canonical() {
        let err = CryptoError::NonCanonicalSignature;
        assert_eq!(err.to_string(), "non-canonical signature (high s)");
    }

    #[test]
    fn display_recovery_failed() {
        let err = CryptoError::RecoveryFailed("point at infinity".into());
        assert_eq!(err.to_string(), "public key recovery failed: point at infinity");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(CryptoError::SigningFailed("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
