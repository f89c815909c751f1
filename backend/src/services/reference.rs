//! Create, update, delete and read for sites, locations, stages and
//! suppliers. One generic implementation serves all four kinds.

use sqlx::{PgConnection, PgPool};

use crate::{
    error::AppError,
    models::actor::Actor,
    repositories::{
        reference::{self as reference_repo, ReferenceEntity},
        transaction::{begin_transaction, commit_transaction},
    },
    services::{
        audit_log::{self, AuditEntry},
        merge::registry,
    },
    validation::Validate,
};

pub async fn create<T: ReferenceEntity>(
    pool: &PgPool,
    payload: T::Payload,
    actor: &Actor,
) -> Result<T, AppError> {
    payload.validate()?;

    let mut tx = begin_transaction(pool).await?;
    let created = reference_repo::insert_reference::<T>(&mut tx, &payload).await?;
    let entry = AuditEntry::created(
        T::KIND.audit_table(),
        created.id(),
        audit_log::snapshot(&created)?,
    );
    audit_log::record(&mut tx, entry, actor).await?;
    commit_transaction(tx).await?;
    Ok(created)
}

pub async fn update<T: ReferenceEntity>(
    pool: &PgPool,
    id: i64,
    payload: T::Payload,
    actor: &Actor,
) -> Result<T, AppError> {
    payload.validate()?;

    let mut tx = begin_transaction(pool).await?;
    let existing = reference_repo::lock_reference::<T>(&mut tx, id)
        .await?
        .ok_or_else(|| not_found::<T>(id))?;
    if existing.changes_parent(&payload) {
        let references = count_references::<T>(&mut tx, id).await?;
        if references > 0 {
            return Err(AppError::Conflict(format!(
                "{} {} is referenced by {} record(s) and cannot be moved",
                T::KIND.label(),
                id,
                references
            )));
        }
    }

    let updated = reference_repo::update_reference::<T>(&mut tx, id, &payload).await?;
    let entry = AuditEntry::updated(
        T::KIND.audit_table(),
        id,
        audit_log::snapshot(&existing)?,
        audit_log::snapshot(&updated)?,
    );
    audit_log::record(&mut tx, entry, actor).await?;
    commit_transaction(tx).await?;
    Ok(updated)
}

/// Removes an unreferenced entity. A referenced one has to be merged away
/// instead.
pub async fn delete<T: ReferenceEntity>(
    pool: &PgPool,
    id: i64,
    actor: &Actor,
) -> Result<(), AppError> {
    let mut tx = begin_transaction(pool).await?;
    let existing = reference_repo::lock_reference::<T>(&mut tx, id)
        .await?
        .ok_or_else(|| not_found::<T>(id))?;

    let references = count_references::<T>(&mut tx, id).await?;
    if references > 0 {
        return Err(AppError::Conflict(format!(
            "{} {} is still referenced by {} record(s); merge it instead",
            T::KIND.label(),
            id,
            references
        )));
    }

    reference_repo::delete_reference(&mut tx, T::KIND, id).await?;
    let entry = AuditEntry::deleted(T::KIND.audit_table(), id, audit_log::snapshot(&existing)?);
    audit_log::record(&mut tx, entry, actor).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        kind = %T::KIND,
        id,
        performed_by = %actor.id,
        "reference entity deleted"
    );
    Ok(())
}

pub async fn get<T: ReferenceEntity>(pool: &PgPool, id: i64) -> Result<T, AppError> {
    reference_repo::find_reference::<T, _>(pool, id)
        .await?
        .ok_or_else(|| not_found::<T>(id))
}

pub async fn list<T: ReferenceEntity>(pool: &PgPool) -> Result<Vec<T>, AppError> {
    Ok(reference_repo::list_references::<T, _>(pool).await?)
}

async fn count_references<T: ReferenceEntity>(
    conn: &mut PgConnection,
    id: i64,
) -> Result<i64, AppError> {
    let mut total = 0;
    for fk in registry::references_to(T::KIND) {
        total += reference_repo::count_references_in(&mut *conn, fk, id).await?;
    }
    Ok(total)
}

fn not_found<T: ReferenceEntity>(id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", T::KIND.label(), id))
}
