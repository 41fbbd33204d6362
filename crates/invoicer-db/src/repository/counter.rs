//! # Counter Repository
//!
//! Durable per-scope sequence counters.
//!
//! ## Increment
//! ```text
//! INSERT INTO sequence_counters (scope_key, seq) VALUES ('2024-05', 1)
//! ON CONFLICT(scope_key) DO UPDATE SET seq = seq + 1
//! RETURNING seq
//!
//!   no row      → row created with 1, returns 1
//!   row seq = n → row updated to n+1, returns n+1
//! ```
//!
//! One statement, so SQLite applies the read and the write under the same
//! write lock. Two connections can never both observe `n`.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use invoicer_core::SequenceScope;

use crate::allocator::CounterStore;
use crate::error::{DbError, DbResult};

/// Repository for sequence counters.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    pool: SqlitePool,
}

impl CounterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CounterRepository { pool }
    }

    /// Atomically bumps the counter for `scope` and returns the new value.
    pub async fn increment(&self, scope: SequenceScope) -> DbResult<u64> {
        let key = scope.key();

        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequence_counters (scope_key, seq)
            VALUES (?1, 1)
            ON CONFLICT(scope_key) DO UPDATE SET
                seq = seq + 1,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            RETURNING seq
            "#,
        )
        .bind(&key)
        .fetch_one(&self.pool)
        .await?;

        debug!(scope = %key, seq, "Counter incremented");
        to_sequence(seq)
    }

    /// Last value handed out for `scope`, or 0 if none yet.
    pub async fn current(&self, scope: SequenceScope) -> DbResult<u64> {
        let seq: Option<i64> =
            sqlx::query_scalar("SELECT seq FROM sequence_counters WHERE scope_key = ?1")
                .bind(scope.key())
                .fetch_optional(&self.pool)
                .await?;

        seq.map(to_sequence).transpose().map(|s| s.unwrap_or(0))
    }
}

fn to_sequence(raw: i64) -> DbResult<u64> {
    u64::try_from(raw).map_err(|e| DbError::decode("sequence_counters.seq", e))
}

#[async_trait]
impl CounterStore for CounterRepository {
    async fn increment(&self, scope: SequenceScope) -> DbResult<u64> {
        CounterRepository::increment(self, scope).await
    }

    async fn current(&self, scope: SequenceScope) -> DbResult<u64> {
        CounterRepository::current(self, scope).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use invoicer_core::SequenceScope;

    #[tokio::test]
    async fn test_first_increment_creates_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let scope = SequenceScope::new(2024, 5).unwrap();

        assert_eq!(db.counters().current(scope).await.unwrap(), 0);
        assert_eq!(db.counters().increment(scope).await.unwrap(), 1);
        assert_eq!(db.counters().increment(scope).await.unwrap(), 2);
        assert_eq!(db.counters().current(scope).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let may = SequenceScope::new(2024, 5).unwrap();
        let june = SequenceScope::new(2024, 6).unwrap();

        db.counters().increment(may).await.unwrap();
        db.counters().increment(may).await.unwrap();

        assert_eq!(db.counters().increment(june).await.unwrap(), 1);
        assert_eq!(db.counters().current(may).await.unwrap(), 2);
    }
}
