//! Consolidation of duplicate reference entities.
//!
//! A merge repoints every registered foreign key from the source row to the
//! target row, deletes the source and writes one MERGE audit record, all in a
//! single transaction.

pub mod registry;

use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{actor::Actor, reference::ReferenceKind},
    repositories::{
        reference::{self as reference_repo, ReferenceEntity},
        transaction::{begin_transaction, commit_transaction},
    },
    services::audit_log::{self, AuditEntry},
    types::AuditLogId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RepointedColumn {
    #[schema(value_type = String)]
    pub table: &'static str,
    #[schema(value_type = String)]
    pub column: &'static str,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MergeOutcome {
    pub kind: ReferenceKind,
    pub kept_id: i64,
    pub merged_id: i64,
    pub repointed: Vec<RepointedColumn>,
    pub audit_log_id: AuditLogId,
}

/// Folds `merge_id` into `keep_id`.
///
/// Both rows are locked in id order before anything is read, so overlapping
/// merges queue behind each other and the later one finds its source gone
/// (`NotFound`) instead of half-applying.
pub async fn merge<T: ReferenceEntity>(
    pool: &PgPool,
    keep_id: i64,
    merge_id: i64,
    actor: &Actor,
) -> Result<MergeOutcome, AppError> {
    let kind = T::KIND;
    if keep_id == merge_id {
        return Err(AppError::Validation(format!(
            "Cannot merge a {} into itself",
            kind.label().to_lowercase()
        )));
    }

    let mut tx = begin_transaction(pool).await?;

    let mut ids = [keep_id, merge_id];
    ids.sort_unstable();
    let locked = reference_repo::lock_references::<T>(&mut tx, &ids).await?;
    let target = locked
        .iter()
        .find(|row| row.id() == keep_id)
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind.label(), keep_id)))?;
    let source = locked
        .iter()
        .find(|row| row.id() == merge_id)
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind.label(), merge_id)))?;
    T::check_mergeable(source, target).map_err(AppError::Validation)?;

    let source_snapshot = audit_log::snapshot(source)?;
    let target_snapshot = audit_log::snapshot(target)?;

    let mut repointed = Vec::new();
    for fk in registry::references_to(kind) {
        let rows = reference_repo::repoint_references(&mut tx, fk, merge_id, keep_id).await?;
        repointed.push(RepointedColumn {
            table: fk.table,
            column: fk.column,
            rows,
        });
    }

    let deleted = reference_repo::delete_reference(&mut tx, kind, merge_id).await?;
    if deleted != 1 {
        return Err(AppError::NotFound(format!(
            "{} {} not found",
            kind.label(),
            merge_id
        )));
    }

    let entry = AuditEntry::merged(kind.audit_table(), keep_id, source_snapshot, target_snapshot);
    let log = audit_log::record(&mut tx, entry, actor).await?;

    commit_transaction(tx).await?;

    tracing::info!(
        kind = %kind,
        kept_id = keep_id,
        merged_id = merge_id,
        repointed_rows = repointed.iter().map(|r| r.rows).sum::<u64>(),
        audit_log_id = %log.id,
        performed_by = %actor.id,
        "reference entities merged"
    );

    Ok(MergeOutcome {
        kind,
        kept_id: keep_id,
        merged_id: merge_id,
        repointed,
        audit_log_id: log.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_kind_as_table_name() {
        let outcome = MergeOutcome {
            kind: ReferenceKind::Location,
            kept_id: 1,
            merged_id: 2,
            repointed: vec![RepointedColumn {
                table: "purchase_orders",
                column: "location_id",
                rows: 3,
            }],
            audit_log_id: AuditLogId::new(40),
        };
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["kind"], "locations");
        assert_eq!(json["repointed"][0]["rows"], 3);
        assert_eq!(json["audit_log_id"], 40);
    }
}
