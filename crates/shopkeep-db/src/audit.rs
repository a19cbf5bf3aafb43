//! # Audit Trail
//!
//! Best-effort structured audit records for mutating operations.
//!
//! ## Fire-and-Forget Contract
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  engine operation                                                │
//! │      │  (transaction committed)                                  │
//! │      ▼                                                           │
//! │  audit.record(...)                                               │
//! │      │                                                           │
//! │      ├── insert ok   → row in audit_log                          │
//! │      └── insert fail → tracing::warn!, swallowed                 │
//! │                                                                  │
//! │  An audit failure NEVER rolls back or fails the operation that   │
//! │  triggered it. The stock movement ledger, not this table, is     │
//! │  the authoritative history for inventory.                        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

/// Best-effort sink for audit records.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    pool: SqlitePool,
}

impl AuditTrail {
    /// Creates a new AuditTrail.
    pub fn new(pool: SqlitePool) -> Self {
        AuditTrail { pool }
    }

    /// Records an audit entry. Failures are logged and swallowed.
    ///
    /// ## Arguments
    /// * `action` - dotted action name, e.g. `sale.created`
    /// * `entity_type` / `entity_id` - what was acted on
    /// * `principal_id` - who acted
    /// * `detail` - structured JSON payload describing the change
    pub async fn record(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        principal_id: &str,
        detail: serde_json::Value,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_log (id, action, entity_type, entity_id, principal_id, detail, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(principal_id)
        .bind(detail.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            warn!(action = %action, entity_id = %entity_id, error = %err, "Audit record dropped");
        }
    }

    /// Counts audit entries for an entity (for diagnostics and tests).
    pub async fn count_for_entity(&self, entity_type: &str, entity_id: &str) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_log WHERE entity_type = ?1 AND entity_id = ?2",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_one(&self.pool)
        .await
        .unwrap_or(0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::testutil::test_db;

    #[tokio::test]
    async fn test_record_and_count() {
        let db = test_db().await;
        let audit = db.audit();

        audit
            .record(
                "sale.created",
                "sale",
                "sale-1",
                "staff-1",
                serde_json::json!({ "total_cents": 2997 }),
            )
            .await;

        assert_eq!(audit.count_for_entity("sale", "sale-1").await, 1);
        assert_eq!(audit.count_for_entity("sale", "sale-2").await, 0);
    }

    #[tokio::test]
    async fn test_record_never_fails_caller() {
        let db = test_db().await;
        let audit = db.audit();
        db.close().await;

        // Pool is closed; the insert fails internally and is swallowed.
        audit
            .record("sale.created", "sale", "sale-1", "staff-1", serde_json::json!({}))
            .await;
    }
}
