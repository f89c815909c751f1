use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    handlers::{parse_filter, parse_path_id},
    models::audit_log::{AuditAction, AuditLogResponse, AuditTable},
    repositories::audit_log::AuditLogFilters,
    services::{
        audit_diff::{diff_snapshots, FieldDiff},
        audit_log::{self, AuditLogPage},
    },
    state::AppState,
    types::{AuditLogId, UserId},
    utils::pagination::PageRequest,
};

/// Raw query values. Kept as strings so paging can fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct AuditLogListQuery {
    pub table: Option<String>,
    pub action: Option<String>,
    pub record_id: Option<String>,
    pub performed_by: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogDiffResponse {
    pub id: AuditLogId,
    pub table_name: AuditTable,
    pub record_id: i64,
    pub action: AuditAction,
    pub fields: Vec<FieldDiff>,
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(q): Query<AuditLogListQuery>,
) -> Result<Json<AuditLogPage>, AppError> {
    let filters = parse_filters(&q)?;
    let page = PageRequest::parse(
        q.page.as_deref(),
        q.limit.as_deref(),
        state.config.audit_log_default_limit,
        state.config.audit_log_max_limit,
    );
    let result = audit_log::query(&state.pool, &filters, page).await?;
    Ok(Json(result))
}

pub async fn get_audit_log_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuditLogResponse>, AppError> {
    let id: AuditLogId = parse_path_id(&id, "audit log")?;
    let log = audit_log::fetch(&state.pool, id).await?;
    Ok(Json(AuditLogResponse::from(log)))
}

pub async fn get_audit_log_diff(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuditLogDiffResponse>, AppError> {
    let id: AuditLogId = parse_path_id(&id, "audit log")?;
    let log = audit_log::fetch(&state.pool, id).await?;
    let fields = diff_snapshots(
        log.old_values.as_ref().map(|value| &value.0),
        log.new_values.as_ref().map(|value| &value.0),
    );
    Ok(Json(AuditLogDiffResponse {
        id: log.id,
        table_name: log.table_name,
        record_id: log.record_id,
        action: log.action,
        fields,
    }))
}

fn parse_filters(q: &AuditLogListQuery) -> Result<AuditLogFilters, AppError> {
    let table = match non_empty(q.table.as_deref()) {
        Some(raw) => Some(raw.parse::<AuditTable>().map_err(|_| {
            AppError::Validation(format!("Unknown table filter: {}", raw))
        })?),
        None => None,
    };
    let action = match non_empty(q.action.as_deref()) {
        Some(raw) => Some(raw.parse::<AuditAction>().map_err(|_| {
            AppError::Validation(format!("Unknown action filter: {}", raw))
        })?),
        None => None,
    };
    Ok(AuditLogFilters {
        table,
        action,
        record_id: parse_filter::<i64>(q.record_id.as_deref(), "record_id")?,
        performed_by: parse_filter::<UserId>(q.performed_by.as_deref(), "performed_by")?,
    })
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_filters_parse() {
        let q = AuditLogListQuery {
            table: Some("purchase_orders".into()),
            action: Some("UPDATE".into()),
            record_id: Some("42".into()),
            ..Default::default()
        };
        let filters = parse_filters(&q).expect("filters");
        assert_eq!(filters.table, Some(AuditTable::PurchaseOrders));
        assert_eq!(filters.action, Some(AuditAction::Update));
        assert_eq!(filters.record_id, Some(42));
        assert_eq!(filters.performed_by, None);
    }

    #[test]
    fn unknown_table_or_action_is_rejected() {
        let q = AuditLogListQuery {
            table: Some("payments".into()),
            ..Default::default()
        };
        assert!(matches!(parse_filters(&q), Err(AppError::Validation(_))));

        for action in ["ARCHIVE", "update", "Merge"] {
            let q = AuditLogListQuery {
                action: Some(action.into()),
                ..Default::default()
            };
            assert!(
                matches!(parse_filters(&q), Err(AppError::Validation(_))),
                "{action}"
            );
        }
    }

    #[test]
    fn empty_filters_are_unrestricted() {
        let q = AuditLogListQuery {
            table: Some("".into()),
            action: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(parse_filters(&q).expect("filters"), AuditLogFilters::default());
    }
}
