//! Standalone verification of a Trust Log JSONL file — for an operator
//! running an offline integrity check without constructing a
//! [`crate::file::FileTrustLog`] writer.

use std::fs;
use std::path::Path;

use veritas_contracts::error::{VeritasError, VeritasResult};
use veritas_contracts::trust_log::TrustLogEntry;

use crate::chain::{verify_chain, ChainVerification};

/// Parse every JSONL line in `path` and verify the resulting chain,
/// including signatures when `public_key_b64` is supplied.
pub fn verify_jsonl_file(path: &Path, public_key_b64: Option<&str>) -> VeritasResult<ChainVerification> {
    let content = fs::read_to_string(path).map_err(|e| VeritasError::AuditWriteFailed {
        reason: format!("failed to read trust log file: {e}"),
    })?;

    let mut entries = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: TrustLogEntry = serde_json::from_str(line).map_err(|e| VeritasError::IntegrityFailure {
            reason: format!("malformed entry at line {}: {e}", line_no + 1),
        })?;
        entries.push(entry);
    }

    Ok(verify_chain(&entries, public_key_b64))
}
