//! Checkpoint - persisted record and rehydration guard
//!
//! The persisted mirror is a single versioned record holding the full
//! `GameState`, the two ledger totals and the random source state.
//!
//! # Critical Invariants
//!
//! - **Integrity**: the record carries a SHA-256 checksum of its canonical
//!   JSON; any mismatch is a corrupt payload
//! - **Never trusted**: a restored record is validated before use and
//!   replaced by a fresh game when it fails
//! - **Determinism**: a restored game continues the saved random sequence

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

use crate::ledger::Ledger;
use crate::models::state::GameState;
use crate::orchestrator::store::SnapshotStore;
use crate::orchestrator::GameError;

/// Current record layout version
pub const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// Persisted Record
// ============================================================================

/// The persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedGame {
    pub version: u32,
    pub state: GameState,
    pub total_revenue: i64,
    pub total_costs: i64,

    /// Random source state; `None` when the source cannot be resumed
    #[serde(default)]
    pub rng_state: Option<u64>,

    /// SHA-256 of the canonical JSON of every other field
    pub checksum: String,
}

impl PersistedGame {
    pub fn ledger(&self) -> Ledger {
        Ledger::from_totals(self.total_revenue, self.total_costs)
    }
}

/// Reasons a persisted record is refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RestoreError {
    #[error("Stored snapshot could not be read: {0}")]
    Unreadable(String),

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("Unsupported snapshot version {found:?} (expected {expected})")]
    VersionMismatch { found: Option<u64>, expected: u32 },

    #[error("Snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("Snapshot has no tasks")]
    EmptyTasks,

    #[error("Snapshot money is missing, not a number or zero")]
    InvalidMoney,

    #[error("Snapshot violates a state invariant: {0}")]
    InvalidState(String),
}

impl RestoreError {
    /// True for load-time failures that require clearing the stored mirror.
    ///
    /// Logically empty snapshots (no tasks, unusable money) are only
    /// replaced.
    pub fn is_corrupt(&self) -> bool {
        !matches!(self, RestoreError::EmptyTasks | RestoreError::InvalidMoney)
    }
}

/// Result of a rehydration attempt
#[derive(Debug)]
pub enum RestoreOutcome {
    /// Nothing was stored
    Missing,

    /// The record passed every check
    Restored(Box<PersistedGame>),

    /// The record was logically empty; a fresh game replaces it
    Discarded(RestoreError),

    /// The record was corrupt; the store was cleared and a fresh game
    /// replaces it
    Cleared(RestoreError),
}

// ============================================================================
// Encoding
// ============================================================================

/// Recursively sort all object keys for canonical representation
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// SHA-256 of a record with its `checksum` field removed
fn compute_checksum(record: &Value) -> Result<String, serde_json::Error> {
    let mut body = record.clone();
    if let Value::Object(map) = &mut body {
        map.remove("checksum");
    }

    let json = serde_json::to_string(&canonicalize(body))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Serialize a game into a checksummed record
pub fn encode(
    state: &GameState,
    ledger: &Ledger,
    rng_state: Option<u64>,
) -> Result<String, GameError> {
    let record = PersistedGame {
        version: SNAPSHOT_VERSION,
        state: state.clone(),
        total_revenue: ledger.total_revenue(),
        total_costs: ledger.total_costs(),
        rng_state,
        checksum: String::new(),
    };

    let mut value = serde_json::to_value(&record)
        .map_err(|e| GameError::Serialization(format!("Snapshot serialization failed: {}", e)))?;
    let checksum = compute_checksum(&value)
        .map_err(|e| GameError::Serialization(format!("Snapshot hashing failed: {}", e)))?;

    if let Value::Object(map) = &mut value {
        map.insert("checksum".to_string(), Value::String(checksum));
    }

    serde_json::to_string(&value)
        .map_err(|e| GameError::Serialization(format!("Snapshot serialization failed: {}", e)))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parse and validate a persisted record
///
/// Checks, in order:
/// - the payload is a JSON object
/// - the version is supported
/// - the task list is present and non-empty, money is a non-zero integer
/// - the checksum matches
/// - the record decodes into typed state
/// - no task has more work left than it required, and task ids are unique
pub fn decode(payload: &str) -> Result<PersistedGame, RestoreError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| RestoreError::Corrupt(e.to_string()))?;
    if !value.is_object() {
        return Err(RestoreError::Corrupt("record is not an object".to_string()));
    }

    let version = value.get("version").and_then(Value::as_u64);
    if version != Some(u64::from(SNAPSHOT_VERSION)) {
        return Err(RestoreError::VersionMismatch {
            found: version,
            expected: SNAPSHOT_VERSION,
        });
    }

    validate_logical(&value)?;

    let stored = value
        .get("checksum")
        .and_then(Value::as_str)
        .ok_or(RestoreError::ChecksumMismatch)?;
    let expected = compute_checksum(&value).map_err(|e| RestoreError::Corrupt(e.to_string()))?;
    if stored != expected {
        return Err(RestoreError::ChecksumMismatch);
    }

    let record: PersistedGame =
        serde_json::from_value(value).map_err(|e| RestoreError::Corrupt(e.to_string()))?;

    validate_invariants(&record.state)?;

    Ok(record)
}

fn validate_logical(value: &Value) -> Result<(), RestoreError> {
    let state = value.get("state");

    let has_tasks = state
        .and_then(|s| s.get("tasks"))
        .and_then(Value::as_array)
        .is_some_and(|tasks| !tasks.is_empty());
    if !has_tasks {
        return Err(RestoreError::EmptyTasks);
    }

    let money = state.and_then(|s| s.get("money")).and_then(Value::as_i64);
    match money {
        Some(m) if m != 0 => Ok(()),
        _ => Err(RestoreError::InvalidMoney),
    }
}

fn validate_invariants(state: &GameState) -> Result<(), RestoreError> {
    let mut seen = std::collections::HashSet::new();

    for task in state.tasks() {
        if !task.progress().within(task.requirements()) {
            return Err(RestoreError::InvalidState(format!(
                "task {} has more work left than it required",
                task.id()
            )));
        }
        if !seen.insert(task.id()) {
            return Err(RestoreError::InvalidState(format!(
                "duplicate task id {}",
                task.id()
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Rehydration
// ============================================================================

/// Load, validate and classify the stored mirror
///
/// A corrupt record (or an unreadable store) is cleared from the store; a
/// logically empty one is left for the caller to overwrite.
pub fn rehydrate(store: &mut dyn SnapshotStore) -> RestoreOutcome {
    let payload = match store.load() {
        Ok(Some(payload)) => payload,
        Ok(None) => return RestoreOutcome::Missing,
        Err(e) => {
            let err = RestoreError::Unreadable(e.to_string());
            clear_store(store, &err);
            return RestoreOutcome::Cleared(err);
        }
    };

    match decode(&payload) {
        Ok(record) => RestoreOutcome::Restored(Box::new(record)),
        Err(err) if err.is_corrupt() => {
            clear_store(store, &err);
            RestoreOutcome::Cleared(err)
        }
        Err(err) => {
            warn!(reason = %err, "stored game is empty, starting a fresh one");
            RestoreOutcome::Discarded(err)
        }
    }
}

fn clear_store(store: &mut dyn SnapshotStore, reason: &RestoreError) {
    warn!(%reason, "stored game is corrupt, clearing it");
    if let Err(e) = store.clear() {
        warn!(error = %e, "failed to clear corrupt stored game");
    }
}
