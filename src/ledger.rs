//! Local record of transfers keyed by their customer transaction id
//!
//! After a transfer is created the full result is written to
//! `<root>/transfers/<token>.json`, so a later run can recover what happened
//! under that token without asking the API again. Records are only ever
//! replaced whole.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::api::Transfer;
use crate::cache::write_atomic;
use crate::config::StorageRoot;

/// Subdirectory of the storage root holding ledger records
const LEDGER_DIR_NAME: &str = "transfers";

/// Errors that can occur when recording or looking up transfers
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No transfer has been recorded under the token
    #[error("Transfer not found: {0}")]
    NotFound(String),

    /// The token cannot be used as a record name
    #[error("Invalid customer transaction id: '{0}'")]
    InvalidToken(String),

    /// The ledger directory or a record file could not be accessed
    #[error("Ledger storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record file exists but cannot be parsed
    #[error("Failed to decode transfer record {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized for writing
    #[error("Failed to encode transfer record {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot of a created transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: i64,
    pub status: String,
    pub source_value: f64,
    pub source_currency: String,
    pub target_value: f64,
    pub target_currency: String,
    pub rate: f64,
    /// Creation time as reported by the API
    pub created: String,
    pub quote_uuid: String,
    pub customer_transaction_id: String,
    pub target_account: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payin_session_id: Option<String>,
    pub has_active_issues: bool,
}

impl From<&Transfer> for TransferRecord {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id: transfer.id,
            status: transfer.status.clone(),
            source_value: transfer.source_value,
            source_currency: transfer.source_currency.clone(),
            target_value: transfer.target_value,
            target_currency: transfer.target_currency.clone(),
            rate: transfer.rate,
            created: transfer.created.clone(),
            quote_uuid: transfer.quote_uuid.clone(),
            customer_transaction_id: transfer.customer_transaction_id.clone(),
            target_account: transfer.target_account,
            reference: transfer.reference.clone(),
            source_account: transfer.source_account,
            payin_session_id: transfer.payin_session_id.clone(),
            has_active_issues: transfer.has_active_issues,
        }
    }
}

/// Returns whether `token` is safe to use as a ledger file name
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && !token.starts_with('.')
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Durable store of transfer records keyed by customer transaction id
#[derive(Debug, Clone)]
pub struct TransferLedger {
    dir: PathBuf,
}

impl TransferLedger {
    pub fn new(root: &StorageRoot) -> Self {
        Self {
            dir: root.subdir(LEDGER_DIR_NAME),
        }
    }

    fn record_path(&self, token: &str) -> Result<PathBuf, LedgerError> {
        if !is_valid_token(token) {
            return Err(LedgerError::InvalidToken(token.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", token)))
    }

    /// Stores `record` under `token`, replacing any earlier record
    pub fn record(&self, token: &str, record: &TransferRecord) -> Result<(), LedgerError> {
        let path = self.record_path(token)?;
        let json = serde_json::to_vec_pretty(record).map_err(|source| LedgerError::Encode {
            path: path.clone(),
            source,
        })?;

        write_atomic(&self.dir, &path, &json)
            .map_err(|source| LedgerError::Storage { path, source })?;

        debug!(token, transfer_id = record.id, "transfer recorded");
        Ok(())
    }

    /// Returns the transfer recorded under `token`
    pub fn lookup(&self, token: &str) -> Result<TransferRecord, LedgerError> {
        let path = self.record_path(token)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LedgerError::NotFound(token.to_string()))
            }
            Err(source) => return Err(LedgerError::Storage { path, source }),
        };

        serde_json::from_str(&content).map_err(|source| LedgerError::Decode { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_ledger() -> (TransferLedger, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let ledger = TransferLedger::new(&StorageRoot::at(temp_dir.path()));
        (ledger, temp_dir)
    }

    fn sample_record(token: &str) -> TransferRecord {
        TransferRecord {
            id: 50500593,
            status: "incoming_payment_waiting".to_string(),
            source_value: 104.17,
            source_currency: "GBP".to_string(),
            target_value: 120.0,
            target_currency: "EUR".to_string(),
            rate: 1.15196,
            created: "2026-10-16 09:12:44".to_string(),
            quote_uuid: "11144c35-9fe8-4c32-b7fd-d05c2a7734bf".to_string(),
            customer_transaction_id: token.to_string(),
            target_account: 13967081,
            reference: Some("rent october".to_string()),
            source_account: None,
            payin_session_id: Some("pis-889".to_string()),
            has_active_issues: false,
        }
    }

    #[test]
    fn test_record_then_lookup_roundtrip() {
        let (ledger, _temp_dir) = create_test_ledger();
        let token = "bd244a95-dcf8-4c31-aac8-bf5e2f3e54c0";
        let record = sample_record(token);

        ledger.record(token, &record).expect("Record should succeed");

        assert_eq!(ledger.lookup(token).unwrap(), record);
    }

    #[test]
    fn test_lookup_unknown_token_is_not_found() {
        let (ledger, _temp_dir) = create_test_ledger();

        let result = ledger.lookup("never-recorded");

        assert!(matches!(result, Err(LedgerError::NotFound(t)) if t == "never-recorded"));
    }

    #[test]
    fn test_lookup_without_root_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = TransferLedger::new(&StorageRoot::at(temp_dir.path().join("missing")));

        assert!(matches!(ledger.lookup("abc"), Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn test_second_record_overwrites_first() {
        let (ledger, _temp_dir) = create_test_ledger();
        let first = sample_record("tok-1");
        let mut second = sample_record("tok-1");
        second.id = 50500600;
        second.status = "processing".to_string();
        second.reference = None;

        ledger.record("tok-1", &first).unwrap();
        ledger.record("tok-1", &second).unwrap();

        assert_eq!(ledger.lookup("tok-1").unwrap(), second);
    }

    #[test]
    fn test_record_is_stored_under_transfers_dir() {
        let (ledger, temp_dir) = create_test_ledger();

        ledger.record("tok-2", &sample_record("tok-2")).unwrap();

        let path = temp_dir.path().join("transfers").join("tok-2.json");
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("\"customerTransactionId\": \"tok-2\""));
        assert!(!content.contains("sourceAccount"));
    }

    #[test]
    fn test_path_like_tokens_are_rejected() {
        let (ledger, _temp_dir) = create_test_ledger();

        for token in ["", "../escape", "a/b", ".hidden", "with space"] {
            assert!(
                matches!(
                    ledger.record(token, &sample_record(token)),
                    Err(LedgerError::InvalidToken(_))
                ),
                "token {:?} should be rejected",
                token
            );
            assert!(matches!(ledger.lookup(token), Err(LedgerError::InvalidToken(_))));
        }
    }

    #[test]
    fn test_corrupt_record_is_decode_error() {
        let (ledger, temp_dir) = create_test_ledger();
        let dir = temp_dir.path().join("transfers");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("tok-3.json"), "{\"id\":").unwrap();

        assert!(matches!(ledger.lookup("tok-3"), Err(LedgerError::Decode { .. })));
    }

    #[test]
    fn test_encode_failure_names_the_record() {
        let tuple_keys = std::collections::HashMap::from([((1u8, 2u8), 0u8)]);
        let source = serde_json::to_vec_pretty(&tuple_keys).unwrap_err();

        let error = LedgerError::Encode {
            path: PathBuf::from("/root/transfers/tok-5.json"),
            source,
        };

        assert!(error
            .to_string()
            .starts_with("Failed to encode transfer record /root/transfers/tok-5.json"));
    }

    #[test]
    fn test_unwritable_root_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("root-file");
        fs::write(&blocker, "x").unwrap();
        let ledger = TransferLedger::new(&StorageRoot::at(&blocker));

        let result = ledger.record("tok-4", &sample_record("tok-4"));

        assert!(matches!(result, Err(LedgerError::Storage { .. })));
    }
}
