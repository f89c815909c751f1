//! Transaction management utilities for repositories.
//!
//! A transaction that is dropped without [`commit_transaction`] rolls back, so
//! any `?` between begin and commit discards the mutation together with its
//! audit record.

use crate::error::AppError;
use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

/// Begin a read-write transaction at the database default (READ COMMITTED).
pub async fn begin_transaction(db: &PgPool) -> Result<PgTransaction<'static>, AppError> {
    db.begin()
        .await
        .map_err(|e| AppError::Storage(e.into()))
}

/// Begin a read-only REPEATABLE READ transaction so that several SELECTs see
/// one consistent snapshot.
pub async fn begin_read_snapshot(db: &PgPool) -> Result<PgTransaction<'static>, AppError> {
    let mut tx = begin_transaction(db).await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Storage(e.into()))?;
    Ok(tx)
}

/// Commit a transaction. A failed commit leaves nothing applied.
pub async fn commit_transaction(tx: PgTransaction<'static>) -> Result<(), AppError> {
    tx.commit()
        .await
        .map_err(|e| AppError::Storage(e.into()))
}
