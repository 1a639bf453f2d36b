//! File-backed Trust Log: JSONL append log plus a bounded JSON mirror,
//! atomic writes, and line-count rotation with hash-chain continuity.
//!
//! The JSONL file is the durable chain; the JSON mirror keeps only the
//! most recent [`MAX_JSON_ITEMS`] entries for fast dashboard reads.
//! Rotation at [`MAX_LINES`] preserves chain continuity by writing the
//! last hash to a `.last_hash` marker before renaming the file away.
//!
//! Appending a line and rewriting a whole file are deliberately different
//! operations: a line is appended with `O_APPEND|O_CREAT` plus an fsync,
//! which costs one write regardless of how long the file already is; the
//! JSON mirror and the `.last_hash` marker are small, fully-rewritten
//! files, so they use the temp-file-then-rename atomic-write protocol
//! instead.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{info, warn};

use veritas_contracts::error::{VeritasError, VeritasResult};
use veritas_contracts::trust_log::{TrustLogEntry, GENESIS_HASH};
use veritas_core::traits::TrustLogWriter;

use crate::keys::AuditKeypair;

/// JSONL lines per file before rotation.
pub const MAX_LINES: usize = 5000;
/// Entries retained in the bounded JSON mirror.
pub const MAX_JSON_ITEMS: usize = 2000;

const LAST_HASH_MARKER: &str = ".last_hash";

/// A Trust Log backed by an append-only JSONL file under `dir`, with an
/// Ed25519 keypair for signing and a bounded JSON mirror for fast reads.
pub struct FileTrustLog {
    dir: PathBuf,
    keypair: AuditKeypair,
    write_lock: Mutex<()>,
}

impl FileTrustLog {
    pub fn new(dir: impl Into<PathBuf>, keypair: AuditKeypair) -> VeritasResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to create trust log directory: {e}"),
        })?;
        Ok(FileTrustLog {
            dir,
            keypair,
            write_lock: Mutex::new(()),
        })
    }

    fn jsonl_path(&self) -> PathBuf {
        self.dir.join("trust_log.jsonl")
    }

    fn json_path(&self) -> PathBuf {
        self.dir.join("trust_log.json")
    }

    fn shadow_dir(&self) -> PathBuf {
        self.dir.join("DASH")
    }

    fn marker_path(&self) -> PathBuf {
        self.dir.join(LAST_HASH_MARKER)
    }

    fn count_lines(path: &Path) -> usize {
        let Ok(file) = File::open(path) else { return 0 };
        BufReader::new(file).lines().count()
    }

    /// Reject a symlinked log path outright rather than silently following
    /// it — a log directory should never contain a symlink planted by an
    /// attacker with write access to a shared mount.
    fn reject_symlinks(&self) -> VeritasResult<()> {
        for path in [self.jsonl_path(), self.dir.clone()] {
            if path.symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false) {
                return Err(VeritasError::IntegrityFailure {
                    reason: format!("refusing to write through symlink at {}", path.display()),
                });
            }
        }
        Ok(())
    }

    fn last_hash(&self) -> VeritasResult<String> {
        let jsonl_path = self.jsonl_path();
        if !jsonl_path.exists() {
            return Ok(self.load_marker().unwrap_or_else(|| GENESIS_HASH.to_string()));
        }
        let file = File::open(&jsonl_path).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to open trust log for read: {e}"),
        })?;
        let mut last_hash = None;
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<TrustLogEntry>(&line) {
                if let Some(hash) = entry.hash {
                    last_hash = Some(hash);
                }
            }
        }
        Ok(last_hash
            .or_else(|| self.load_marker())
            .unwrap_or_else(|| GENESIS_HASH.to_string()))
    }

    fn load_marker(&self) -> Option<String> {
        fs::read_to_string(self.marker_path())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn save_marker(&self, hash: &str) {
        if let Err(e) = fs::write(self.marker_path(), hash) {
            warn!(error = %e, "failed to persist last-hash rotation marker");
        }
    }

    fn rotate_if_needed(&self) -> VeritasResult<()> {
        let jsonl_path = self.jsonl_path();
        if Self::count_lines(&jsonl_path) < MAX_LINES {
            return Ok(());
        }
        if let Some(last) = self.last_hash_from_tail(&jsonl_path) {
            self.save_marker(&last);
        }
        self.reject_symlinks()?;

        let rotated = self.dir.join("trust_log_old.jsonl");
        let _ = fs::remove_file(&rotated);
        fs::rename(&jsonl_path, &rotated).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to rotate trust log: {e}"),
        })?;
        info!(rotated = %rotated.display(), "trust log rotated");
        Ok(())
    }

    fn last_hash_from_tail(&self, path: &Path) -> Option<String> {
        let content = fs::read_to_string(path).ok()?;
        let last_line = content.lines().rev().find(|l| !l.trim().is_empty())?;
        serde_json::from_str::<TrustLogEntry>(last_line).ok()?.hash
    }

    /// Append one JSONL line with `O_APPEND|O_CREAT` plus an fsync of the
    /// file and the parent directory — one write regardless of how long
    /// the file already is, unlike the temp-file-then-rename protocol
    /// used for files this writer rewrites in full.
    fn append_line(&self, line: &str) -> VeritasResult<()> {
        let jsonl_path = self.jsonl_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&jsonl_path)
            .map_err(|e| VeritasError::AuditWriteFailed {
                reason: format!("failed to open trust log for append: {e}"),
            })?;

        file.write_all(line.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .map_err(|e| VeritasError::AuditWriteFailed {
                reason: format!("failed to append trust log line: {e}"),
            })?;

        if let Ok(dir_file) = File::open(&self.dir) {
            let _ = dir_file.sync_all();
        }
        Ok(())
    }

    /// Write a small out-of-band snapshot of a decision entry under
    /// `DASH/` for dashboard consumption. Independent of the hash chain —
    /// failures here are logged and swallowed rather than propagated,
    /// since losing a dashboard snapshot should never fail the request
    /// that produced the underlying Trust Log entry.
    fn write_shadow_snapshot(&self, entry: &TrustLogEntry) {
        if entry.event_type != "decision" {
            return;
        }
        if let Err(e) = self.try_write_shadow_snapshot(entry) {
            warn!(error = %e, "failed to write dashboard shadow snapshot");
        }
    }

    fn try_write_shadow_snapshot(&self, entry: &TrustLogEntry) -> VeritasResult<()> {
        let shadow_dir = self.shadow_dir();
        fs::create_dir_all(&shadow_dir).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to create shadow snapshot directory: {e}"),
        })?;

        let query = entry
            .payload
            .get("query")
            .or_else(|| entry.payload.get("context").and_then(|c| c.get("query")))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");

        let record = serde_json::json!({
            "request_id": entry.request_id,
            "decision_id": entry.decision_id,
            "created_at": entry.timestamp.to_rfc3339(),
            "query": query,
            "chosen": entry.payload.get("chosen"),
            "telos_score": entry.payload.get("telos_score"),
            "fuji": entry.payload.get("fuji").and_then(|f| f.get("status")),
        });

        let file_name = format!("decide_{}.json", entry.timestamp.format("%Y%m%d_%H%M%S_%3f"));
        let out_path = shadow_dir.join(file_name);
        let serialized = serde_json::to_string_pretty(&record).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to serialize shadow snapshot: {e}"),
        })?;
        fs::write(&out_path, serialized).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to write shadow snapshot: {e}"),
        })
    }

    fn write_json_mirror(&self, entry: &TrustLogEntry) -> VeritasResult<()> {
        let json_path = self.json_path();
        let mut items: Vec<TrustLogEntry> = fs::read_to_string(&json_path)
            .ok()
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
            .and_then(|v| v.get("items").cloned())
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        items.push(entry.clone());
        if items.len() > MAX_JSON_ITEMS {
            let drop_count = items.len() - MAX_JSON_ITEMS;
            items.drain(0..drop_count);
        }

        let wrapped = serde_json::json!({ "items": items });
        let serialized = serde_json::to_string_pretty(&wrapped).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to serialize json mirror: {e}"),
        })?;

        let temp_path = self.dir.join(format!(".trust_log.json.{}.tmp", std::process::id()));
        fs::write(&temp_path, serialized).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to write json mirror temp file: {e}"),
        })?;
        fs::rename(&temp_path, &json_path).map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("failed to install json mirror: {e}"),
        })?;
        Ok(())
    }
}

#[async_trait]
impl TrustLogWriter for FileTrustLog {
    async fn append(&self, mut entry: TrustLogEntry) -> VeritasResult<String> {
        let _guard = self.write_lock.lock().map_err(|e| VeritasError::AuditWriteFailed {
            reason: format!("trust log write lock poisoned: {e}"),
        })?;

        self.reject_symlinks()?;
        self.rotate_if_needed()?;

        entry.prev_hash = self.last_hash()?;
        let payload_hash = entry.compute_payload_hash()?;
        entry.payload_hash = Some(payload_hash.clone());
        entry.signature = Some(self.keypair.sign_hash(&payload_hash));
        let hash = entry.compute_hash()?;
        entry.hash = Some(hash);

        let line = veritas_contracts::canonical::canonical_string_from_value(
            &serde_json::to_value(&entry).map_err(|e| VeritasError::AuditWriteFailed {
                reason: format!("failed to serialize trust log entry: {e}"),
            })?,
        )?;
        self.append_line(&line)?;
        self.write_json_mirror(&entry)?;
        self.write_shadow_snapshot(&entry);

        Ok(entry.entry_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn make_entry(request_id: &str) -> TrustLogEntry {
        TrustLogEntry::new(0, uuid::Uuid::new_v4().to_string(), "decision", request_id, None, json!({"k": "v"}), GENESIS_HASH.to_string())
    }

    #[tokio::test]
    async fn appended_entries_persist_and_chain() {
        let dir = tempdir().unwrap();
        let log = FileTrustLog::new(dir.path(), AuditKeypair::generate()).unwrap();
        log.append(make_entry("r1")).await.unwrap();
        log.append(make_entry("r2")).await.unwrap();

        let content = fs::read_to_string(dir.path().join("trust_log.jsonl")).unwrap();
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines.len(), 2);

        let first: TrustLogEntry = serde_json::from_str(lines[0]).unwrap();
        let second: TrustLogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first.prev_hash, GENESIS_HASH);
        assert_eq!(second.prev_hash, first.hash.unwrap());
    }

    #[tokio::test]
    async fn json_mirror_tracks_appended_entries() {
        let dir = tempdir().unwrap();
        let log = FileTrustLog::new(dir.path(), AuditKeypair::generate()).unwrap();
        log.append(make_entry("r1")).await.unwrap();

        let mirror = fs::read_to_string(dir.path().join("trust_log.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&mirror).unwrap();
        assert_eq!(parsed["items"].as_array().unwrap().len(), 1);
    }
}
