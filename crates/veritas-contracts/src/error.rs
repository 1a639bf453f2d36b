//! Runtime error types for the VERITAS decision pipeline.
//!
//! All fallible operations in the VERITAS pipeline return `VeritasResult<T>`.
//! Error variants carry enough context to produce actionable audit entries,
//! but never carry raw internal messages (stack traces, exception reprs)
//! that would leak into a client-facing `detail` field.

use thiserror::Error;

/// The unified error type for the VERITAS runtime.
#[derive(Debug, Error)]
pub enum VeritasError {
    /// A policy rule explicitly denied the action (FUJI Stage C, or a
    /// `veritas-policy` YAML rule).
    #[error("policy denied action: {reason}")]
    PolicyDenied { reason: String },

    /// The FUJI safety gate rejected the request with a registered code.
    #[error("fuji gate rejected request: {code} ({reason})")]
    PolicyRejected { code: String, reason: String },

    /// Request admission (C1) failed: bad signature, stale timestamp,
    /// replayed nonce, oversized body, or missing credentials.
    #[error("admission rejected: {reason}")]
    Admission { reason: String },

    /// The caller exceeded the configured rate limit.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The audit writer could not persist a TrustLog entry.
    ///
    /// Treated as fatal: a decision that cannot be audited cannot be
    /// returned to the caller.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// Ed25519 signing or verification failed.
    #[error("signing failed: {reason}")]
    SigningFailed { reason: String },

    /// TrustLog chain verification found a tampered or inconsistent entry.
    ///
    /// The only error variant permitted to surface as a 5xx without
    /// degradation, per the integrity-failure taxonomy.
    #[error("trust log integrity failure: {reason}")]
    IntegrityFailure { reason: String },

    /// A replay of a persisted decision did not match its recorded output.
    #[error("replay mismatch: {reason}")]
    ReplayMismatch { reason: String },

    /// The pipeline's internal state machine hit an illegal transition.
    #[error("state machine error: {reason}")]
    StateMachineError { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A JSON Schema or registry validation check failed outside of the
    /// normal verification path (e.g. FUJI code registry at startup).
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },

    /// Input failed a data-model integrity check (e.g. an `Option` title
    /// exceeding `MAX_TITLE_LENGTH`, or containing control characters).
    #[error("integrity check failed: {reason}")]
    IntegrityCheckFailed { reason: String },
}

/// Convenience alias used throughout the VERITAS crates.
pub type VeritasResult<T> = Result<T, VeritasError>;
