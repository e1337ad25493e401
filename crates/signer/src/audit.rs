//! Audit trail for signing requests.
//!
//! Every request that gets past parameter validation produces at most one
//! [`AuditRecord`]: a denial, an internal failure, or a completed signature.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;

use crate::rpm::SigningInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditRecord {
    AccessDenied {
        client: String,
        client_ip: String,
        key: String,
    },
    SignFailed {
        client: String,
        client_ip: String,
        key: String,
        error: String,
    },
    Signed(SigningInfo),
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(line) => f.write_str(&line),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Sink for audit records. Each call writes exactly one line.
pub trait AuditLog: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Writes audit records as `tracing` events on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn record(&self, record: AuditRecord) {
        match &record {
            AuditRecord::AccessDenied { .. } => tracing::warn!(target: "audit", "{record}"),
            AuditRecord::SignFailed { .. } => tracing::error!(target: "audit", "{record}"),
            AuditRecord::Signed(_) => tracing::info!(target: "audit", "{record}"),
        }
    }
}

/// Keeps records in memory; used by tests to assert on the audit trail.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, record: AuditRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_renders_as_one_json_line() {
        let record = AuditRecord::AccessDenied {
            client: "builder".into(),
            client_ip: "10.1.2.3".into(),
            key: "release".into(),
        };
        let line = record.to_string();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "access_denied");
        assert_eq!(value["client"], "builder");
        assert_eq!(value["client_ip"], "10.1.2.3");
        assert_eq!(value["key"], "release");
    }

    #[test]
    fn signed_record_flattens_signing_info() {
        let info = SigningInfo::default().with_identity("release", "builder", "10.1.2.3");
        let value: serde_json::Value =
            serde_json::from_str(&AuditRecord::Signed(info).to_string()).unwrap();
        assert_eq!(value["event"], "signed");
        assert_eq!(value["key_name"], "release");
        assert_eq!(value["client_name"], "builder");
    }

    #[test]
    fn memory_log_keeps_records_in_order() {
        let log = MemoryAuditLog::new();
        log.record(AuditRecord::Signed(SigningInfo::default()));
        log.record(AuditRecord::AccessDenied {
            client: "c".into(),
            client_ip: "a".into(),
            key: "k".into(),
        });
        let records = log.records();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], AuditRecord::Signed(_)));
    }
}
