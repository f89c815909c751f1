//! Storage for sites, locations, stages and suppliers.
//!
//! The four tables share one set of generic queries driven by
//! [`ReferenceEntity`]; table and column names come from compile-time
//! constants only.

use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgConnection, PgExecutor, Postgres, QueryBuilder};
use validator::Validate;

use crate::models::reference::{
    ForeignKeyRef, Location, LocationPayload, ReferenceKind, Site, SitePayload, Stage,
    StagePayload, Supplier, SupplierPayload,
};

pub trait ReferenceEntity:
    for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static
{
    const KIND: ReferenceKind;
    const COLUMNS: &'static str;
    type Payload: DeserializeOwned + Serialize + Validate + Send + Sync + 'static;

    fn id(&self) -> i64;

    /// Appends `(col, ...) VALUES (...)` for an insert.
    fn push_insert_values(builder: &mut QueryBuilder<'_, Postgres>, payload: &Self::Payload);

    /// Appends `col = value, ...` for an update.
    fn push_assignments(builder: &mut QueryBuilder<'_, Postgres>, payload: &Self::Payload);

    /// Extra precondition for folding `source` into `target`.
    fn check_mergeable(_source: &Self, _target: &Self) -> Result<(), String> {
        Ok(())
    }

    /// True when applying `payload` moves the row under a different parent.
    fn changes_parent(&self, _payload: &Self::Payload) -> bool {
        false
    }
}

impl ReferenceEntity for Site {
    const KIND: ReferenceKind = ReferenceKind::Site;
    const COLUMNS: &'static str = "id, name, address, created_at, updated_at";
    type Payload = SitePayload;

    fn id(&self) -> i64 {
        self.id.get()
    }

    fn push_insert_values(builder: &mut QueryBuilder<'_, Postgres>, payload: &SitePayload) {
        builder
            .push("(name, address) VALUES (")
            .push_bind(payload.name.clone())
            .push(", ")
            .push_bind(payload.address.clone())
            .push(")");
    }

    fn push_assignments(builder: &mut QueryBuilder<'_, Postgres>, payload: &SitePayload) {
        builder
            .push("name = ")
            .push_bind(payload.name.clone())
            .push(", address = ")
            .push_bind(payload.address.clone());
    }
}

impl ReferenceEntity for Location {
    const KIND: ReferenceKind = ReferenceKind::Location;
    const COLUMNS: &'static str = "id, site_id, name, created_at, updated_at";
    type Payload = LocationPayload;

    fn id(&self) -> i64 {
        self.id.get()
    }

    fn push_insert_values(builder: &mut QueryBuilder<'_, Postgres>, payload: &LocationPayload) {
        builder
            .push("(site_id, name) VALUES (")
            .push_bind(payload.site_id)
            .push(", ")
            .push_bind(payload.name.clone())
            .push(")");
    }

    fn push_assignments(builder: &mut QueryBuilder<'_, Postgres>, payload: &LocationPayload) {
        builder
            .push("site_id = ")
            .push_bind(payload.site_id)
            .push(", name = ")
            .push_bind(payload.name.clone());
    }

    fn check_mergeable(source: &Self, target: &Self) -> Result<(), String> {
        if source.site_id != target.site_id {
            return Err(format!(
                "locations {} and {} belong to different sites",
                source.id, target.id
            ));
        }
        Ok(())
    }

    fn changes_parent(&self, payload: &LocationPayload) -> bool {
        self.site_id != payload.site_id
    }
}

impl ReferenceEntity for Stage {
    const KIND: ReferenceKind = ReferenceKind::Stage;
    const COLUMNS: &'static str = "id, name, description, created_at, updated_at";
    type Payload = StagePayload;

    fn id(&self) -> i64 {
        self.id.get()
    }

    fn push_insert_values(builder: &mut QueryBuilder<'_, Postgres>, payload: &StagePayload) {
        builder
            .push("(name, description) VALUES (")
            .push_bind(payload.name.clone())
            .push(", ")
            .push_bind(payload.description.clone())
            .push(")");
    }

    fn push_assignments(builder: &mut QueryBuilder<'_, Postgres>, payload: &StagePayload) {
        builder
            .push("name = ")
            .push_bind(payload.name.clone())
            .push(", description = ")
            .push_bind(payload.description.clone());
    }
}

impl ReferenceEntity for Supplier {
    const KIND: ReferenceKind = ReferenceKind::Supplier;
    const COLUMNS: &'static str = "id, name, contact_email, phone, created_at, updated_at";
    type Payload = SupplierPayload;

    fn id(&self) -> i64 {
        self.id.get()
    }

    fn push_insert_values(builder: &mut QueryBuilder<'_, Postgres>, payload: &SupplierPayload) {
        builder
            .push("(name, contact_email, phone) VALUES (")
            .push_bind(payload.name.clone())
            .push(", ")
            .push_bind(payload.contact_email.clone())
            .push(", ")
            .push_bind(payload.phone.clone())
            .push(")");
    }

    fn push_assignments(builder: &mut QueryBuilder<'_, Postgres>, payload: &SupplierPayload) {
        builder
            .push("name = ")
            .push_bind(payload.name.clone())
            .push(", contact_email = ")
            .push_bind(payload.contact_email.clone())
            .push(", phone = ")
            .push_bind(payload.phone.clone());
    }
}

pub async fn find_reference<'e, T, E>(executor: E, id: i64) -> Result<Option<T>, sqlx::Error>
where
    T: ReferenceEntity,
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM {} WHERE id = $1",
        T::COLUMNS,
        T::KIND.table()
    );
    sqlx::query_as::<_, T>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_references<'e, T, E>(executor: E) -> Result<Vec<T>, sqlx::Error>
where
    T: ReferenceEntity,
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM {} ORDER BY name ASC, id ASC",
        T::COLUMNS,
        T::KIND.table()
    );
    sqlx::query_as::<_, T>(&query).fetch_all(executor).await
}

pub async fn lock_reference<T: ReferenceEntity>(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Option<T>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
        T::COLUMNS,
        T::KIND.table()
    );
    sqlx::query_as::<_, T>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Row-locks every listed record in ascending id order, so two transactions
/// locking overlapping pairs queue up instead of deadlocking. Absent ids are
/// simply missing from the result.
pub async fn lock_references<T: ReferenceEntity>(
    conn: &mut PgConnection,
    ids: &[i64],
) -> Result<Vec<T>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM {} WHERE id = ANY($1) ORDER BY id ASC FOR UPDATE",
        T::COLUMNS,
        T::KIND.table()
    );
    sqlx::query_as::<_, T>(&query)
        .bind(ids.to_vec())
        .fetch_all(conn)
        .await
}

pub async fn insert_reference<T: ReferenceEntity>(
    conn: &mut PgConnection,
    payload: &T::Payload,
) -> Result<T, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("INSERT INTO {} ", T::KIND.table()));
    T::push_insert_values(&mut builder, payload);
    builder.push(format!(" RETURNING {}", T::COLUMNS));
    builder.build_query_as::<T>().fetch_one(conn).await
}

pub async fn update_reference<T: ReferenceEntity>(
    conn: &mut PgConnection,
    id: i64,
    payload: &T::Payload,
) -> Result<T, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("UPDATE {} SET ", T::KIND.table()));
    T::push_assignments(&mut builder, payload);
    builder
        .push(", updated_at = now() WHERE id = ")
        .push_bind(id)
        .push(format!(" RETURNING {}", T::COLUMNS));
    builder.build_query_as::<T>().fetch_one(conn).await
}

pub async fn delete_reference(
    conn: &mut PgConnection,
    kind: ReferenceKind,
    id: i64,
) -> Result<u64, sqlx::Error> {
    let query = format!("DELETE FROM {} WHERE id = $1", kind.table());
    let result = sqlx::query(&query).bind(id).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn count_references_in(
    conn: &mut PgConnection,
    fk: &ForeignKeyRef,
    id: i64,
) -> Result<i64, sqlx::Error> {
    let query = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = $1",
        fk.table, fk.column
    );
    sqlx::query_scalar::<_, i64>(&query)
        .bind(id)
        .fetch_one(conn)
        .await
}

/// Moves every `fk` value equal to `from` over to `to`; returns rows touched.
pub async fn repoint_references(
    conn: &mut PgConnection,
    fk: &ForeignKeyRef,
    from: i64,
    to: i64,
) -> Result<u64, sqlx::Error> {
    let query = format!(
        "UPDATE {table} SET {column} = $1 WHERE {column} = $2",
        table = fk.table,
        column = fk.column
    );
    let result = sqlx::query(&query)
        .bind(to)
        .bind(from)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
