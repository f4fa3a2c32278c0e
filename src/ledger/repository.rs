//! Repository layer for the movement log
//!
//! Append happens only inside a transfer/settlement transaction; read
//! operations run against the pool. There are no update or delete
//! operations here by design of the log.

use super::models::{Movement, MovementKind, NewMovement};
use crate::error::LedgerResult;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const MOVEMENT_COLUMNS: &str = "id, from_account_id, to_account_id, amount, kind, note, created_at";

/// Query options for movement listings
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    pub limit: i64,
    pub offset: i64,
    /// Empty means all kinds
    pub kinds: Vec<MovementKind>,
}

impl Default for LedgerQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            kinds: Vec::new(),
        }
    }
}

impl LedgerQuery {
    pub fn with_kinds(kinds: &[MovementKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            ..Default::default()
        }
    }
}

/// Ledger store: append-only movement log
#[derive(Clone)]
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one movement inside the caller's transaction
    ///
    /// Only the transfer protocol and the settlement engine call this, in
    /// the same transaction as the balance updates the movement records.
    pub async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        movement: NewMovement,
    ) -> LedgerResult<Movement> {
        movement.validate()?;

        let row = sqlx::query_as::<_, Movement>(
            r#"INSERT INTO movements (id, from_account_id, to_account_id, amount, kind, note)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, from_account_id, to_account_id, amount, kind, note, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(movement.from_account_id)
        .bind(movement.to_account_id)
        .bind(movement.amount)
        .bind(movement.kind)
        .bind(movement.note)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row)
    }

    /// Movements touching one account (either side), newest first
    pub async fn find_by_account(
        &self,
        account_id: Uuid,
        query: &LedgerQuery,
    ) -> LedgerResult<Vec<Movement>> {
        let rows = sqlx::query_as::<_, Movement>(&format!(
            r#"SELECT {MOVEMENT_COLUMNS} FROM movements
               WHERE (from_account_id = $1 OR to_account_id = $1)
                 AND ($2 OR kind = ANY($3))
               ORDER BY created_at DESC, id DESC
               LIMIT $4 OFFSET $5"#
        ))
        .bind(account_id)
        .bind(query.kinds.is_empty())
        .bind(&query.kinds)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All movements, newest first
    pub async fn find_all(&self, query: &LedgerQuery) -> LedgerResult<Vec<Movement>> {
        let rows = sqlx::query_as::<_, Movement>(&format!(
            r#"SELECT {MOVEMENT_COLUMNS} FROM movements
               WHERE ($1 OR kind = ANY($2))
               ORDER BY created_at DESC, id DESC
               LIMIT $3 OFFSET $4"#
        ))
        .bind(query.kinds.is_empty())
        .bind(&query.kinds)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Number of movements touching one account
    pub async fn count_by_account(&self, account_id: Uuid) -> LedgerResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM movements WHERE from_account_id = $1 OR to_account_id = $1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Total debited from an account across all movements
    pub async fn sum_debits(&self, account_id: Uuid) -> LedgerResult<Decimal> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM movements WHERE from_account_id = $1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    /// Total credited to an account across all movements
    pub async fn sum_credits(&self, account_id: Uuid) -> LedgerResult<Decimal> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM movements WHERE to_account_id = $1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    /// Replay the log for one account: credits minus debits.
    /// Must equal the stored balance at any point in time.
    pub async fn reconcile(&self, account_id: Uuid) -> LedgerResult<Decimal> {
        let credits = self.sum_credits(account_id).await?;
        let debits = self.sum_debits(account_id).await?;
        Ok(credits - debits)
    }
}
