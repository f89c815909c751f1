#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    error::ErrorResponse,
    handlers::{
        admin::{
            audit_logs::{AuditLogDiffResponse, AuditLogListQuery},
            merge::{
                MergeLocationsRequest, MergeSitesRequest, MergeStagesRequest,
                MergeSuppliersRequest,
            },
        },
        health::HealthResponse,
        purchase_orders::PurchaseOrderListQuery,
    },
    models::{
        audit_log::{AuditAction, AuditLogResponse, AuditTable},
        invoice::{CreateInvoice, Invoice, UpdateInvoice},
        purchase_order::{
            CreatePurchaseOrder, DocumentStatus, LineItem, PurchaseOrder, PurchaseOrderResponse,
            UpdatePurchaseOrder,
        },
        reconciliation::{BalanceState, Reconciliation},
        reference::{
            ForeignKeyRef, Location, LocationPayload, ReferenceKind, Site, SitePayload, Stage,
            StagePayload, Supplier, SupplierPayload,
        },
    },
    services::{
        audit_diff::FieldDiff,
        audit_log::AuditLogPage,
        merge::{MergeOutcome, RepointedColumn},
        purchase_order::PurchaseOrderPage,
    },
    utils::pagination::Pagination,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_doc,
        list_purchase_orders_doc,
        create_purchase_order_doc,
        get_purchase_order_doc,
        update_purchase_order_doc,
        cancel_purchase_order_doc,
        list_invoices_doc,
        create_invoice_doc,
        update_invoice_doc,
        cancel_invoice_doc,
        list_references_doc,
        create_reference_doc,
        get_reference_doc,
        update_reference_doc,
        delete_reference_doc,
        admin_list_audit_logs_doc,
        admin_audit_log_detail_doc,
        admin_audit_log_diff_doc,
        admin_merge_locations_doc,
        admin_merge_stages_doc,
        admin_merge_sites_doc,
        admin_merge_suppliers_doc
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            Pagination,
            // purchase orders & invoices
            PurchaseOrder,
            PurchaseOrderResponse,
            PurchaseOrderPage,
            CreatePurchaseOrder,
            UpdatePurchaseOrder,
            LineItem,
            DocumentStatus,
            Reconciliation,
            BalanceState,
            Invoice,
            CreateInvoice,
            UpdateInvoice,
            // reference entities
            ReferenceKind,
            ForeignKeyRef,
            Site,
            SitePayload,
            Location,
            LocationPayload,
            Stage,
            StagePayload,
            Supplier,
            SupplierPayload,
            // audit & merge
            AuditTable,
            AuditAction,
            AuditLogResponse,
            AuditLogPage,
            AuditLogListQuery,
            AuditLogDiffResponse,
            FieldDiff,
            MergeLocationsRequest,
            MergeStagesRequest,
            MergeSitesRequest,
            MergeSuppliersRequest,
            MergeOutcome,
            RepointedColumn
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Procurement", description = "Purchase orders and invoices"),
        (name = "References", description = "Sites, locations, stages and suppliers"),
        (name = "Admin", description = "Audit trail and entity merges"),
        (name = "Health", description = "Liveness")
    ),
    security(("ActorId" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "ActorId",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "x-actor-id",
                "User id asserted by the authenticating proxy",
            ))),
        );
    }
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, body = HealthResponse)),
    tag = "Health",
    security(())
)]
fn health_doc() {}

#[utoipa::path(
    get,
    path = "/api/purchase-orders",
    params(PurchaseOrderListQuery),
    responses((status = 200, body = PurchaseOrderPage)),
    tag = "Procurement"
)]
fn list_purchase_orders_doc() {}

#[utoipa::path(
    post,
    path = "/api/purchase-orders",
    request_body = CreatePurchaseOrder,
    responses(
        (status = 201, body = PurchaseOrderResponse),
        (status = 400, body = ErrorResponse),
        (status = 409, description = "Duplicate PO number", body = ErrorResponse)
    ),
    tag = "Procurement"
)]
fn create_purchase_order_doc() {}

#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}",
    params(("id" = i64, Path, description = "Purchase order id")),
    responses(
        (status = 200, body = PurchaseOrderResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Procurement"
)]
fn get_purchase_order_doc() {}

#[utoipa::path(
    put,
    path = "/api/purchase-orders/{id}",
    params(("id" = i64, Path, description = "Purchase order id")),
    request_body = UpdatePurchaseOrder,
    responses(
        (status = 200, body = PurchaseOrderResponse),
        (status = 409, description = "Cancelled order", body = ErrorResponse)
    ),
    tag = "Procurement"
)]
fn update_purchase_order_doc() {}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/cancel",
    params(("id" = i64, Path, description = "Purchase order id")),
    responses(
        (status = 200, body = PurchaseOrderResponse),
        (status = 409, description = "Already cancelled", body = ErrorResponse)
    ),
    tag = "Procurement"
)]
fn cancel_purchase_order_doc() {}

#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}/invoices",
    params(("id" = i64, Path, description = "Purchase order id")),
    responses((status = 200, body = Vec<Invoice>)),
    tag = "Procurement"
)]
fn list_invoices_doc() {}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/invoices",
    params(("id" = i64, Path, description = "Purchase order id")),
    request_body = CreateInvoice,
    responses(
        (status = 201, body = Invoice),
        (status = 404, body = ErrorResponse),
        (status = 409, description = "Order cancelled or duplicate number", body = ErrorResponse)
    ),
    tag = "Procurement"
)]
fn create_invoice_doc() {}

#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    params(("id" = i64, Path, description = "Invoice id")),
    request_body = UpdateInvoice,
    responses((status = 200, body = Invoice)),
    tag = "Procurement"
)]
fn update_invoice_doc() {}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/cancel",
    params(("id" = i64, Path, description = "Invoice id")),
    responses((status = 200, body = Invoice)),
    tag = "Procurement"
)]
fn cancel_invoice_doc() {}

#[utoipa::path(
    get,
    path = "/api/{kind}",
    params(("kind" = ReferenceKind, Path, description = "sites, locations, stages or suppliers")),
    responses((status = 200, description = "All entities of the kind, by name")),
    tag = "References"
)]
fn list_references_doc() {}

#[utoipa::path(
    post,
    path = "/api/{kind}",
    params(("kind" = ReferenceKind, Path)),
    request_body = serde_json::Value,
    responses((status = 201, description = "Created entity")),
    tag = "References"
)]
fn create_reference_doc() {}

#[utoipa::path(
    get,
    path = "/api/{kind}/{id}",
    params(("kind" = ReferenceKind, Path), ("id" = i64, Path)),
    responses((status = 200, description = "Entity"), (status = 404, body = ErrorResponse)),
    tag = "References"
)]
fn get_reference_doc() {}

#[utoipa::path(
    put,
    path = "/api/{kind}/{id}",
    params(("kind" = ReferenceKind, Path), ("id" = i64, Path)),
    request_body = serde_json::Value,
    responses((status = 200, description = "Updated entity")),
    tag = "References"
)]
fn update_reference_doc() {}

#[utoipa::path(
    delete,
    path = "/api/{kind}/{id}",
    params(("kind" = ReferenceKind, Path), ("id" = i64, Path)),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Still referenced; merge instead", body = ErrorResponse)
    ),
    tag = "References"
)]
fn delete_reference_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    params(AuditLogListQuery),
    responses(
        (status = 200, body = AuditLogPage),
        (status = 400, description = "Unknown table or action", body = ErrorResponse)
    ),
    tag = "Admin"
)]
fn admin_list_audit_logs_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs/{id}",
    params(("id" = i64, Path)),
    responses((status = 200, body = AuditLogResponse), (status = 404, body = ErrorResponse)),
    tag = "Admin"
)]
fn admin_audit_log_detail_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs/{id}/diff",
    params(("id" = i64, Path)),
    responses((status = 200, body = AuditLogDiffResponse)),
    tag = "Admin"
)]
fn admin_audit_log_diff_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/merge/locations",
    request_body = MergeLocationsRequest,
    responses(
        (status = 200, body = MergeOutcome),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    tag = "Admin"
)]
fn admin_merge_locations_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/merge/stages",
    request_body = MergeStagesRequest,
    responses((status = 200, body = MergeOutcome)),
    tag = "Admin"
)]
fn admin_merge_stages_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/merge/sites",
    request_body = MergeSitesRequest,
    responses((status = 200, body = MergeOutcome)),
    tag = "Admin"
)]
fn admin_merge_sites_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/merge/suppliers",
    request_body = MergeSuppliersRequest,
    responses((status = 200, body = MergeOutcome)),
    tag = "Admin"
)]
fn admin_merge_suppliers_doc() {}
