use axum::{
    http::{HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    docs::ApiDoc,
    handlers::{
        self,
        admin::{
            self,
            merge::{
                MergeLocationsRequest, MergeSitesRequest, MergeStagesRequest,
                MergeSuppliersRequest,
            },
        },
        references::{
            create_reference, delete_reference, get_reference, list_references, update_reference,
        },
    },
    middleware,
    models::reference::{Location, Site, Stage, Supplier},
    repositories::reference::ReferenceEntity,
    state::AppState,
};

pub fn app_router(state: AppState) -> Router {
    let staff_routes = Router::new()
        .route(
            "/api/purchase-orders",
            get(handlers::purchase_orders::list_purchase_orders)
                .post(handlers::purchase_orders::create_purchase_order),
        )
        .route(
            "/api/purchase-orders/{id}",
            get(handlers::purchase_orders::get_purchase_order)
                .put(handlers::purchase_orders::update_purchase_order),
        )
        .route(
            "/api/purchase-orders/{id}/cancel",
            post(handlers::purchase_orders::cancel_purchase_order),
        )
        .route(
            "/api/purchase-orders/{id}/invoices",
            get(handlers::purchase_orders::list_invoices)
                .post(handlers::purchase_orders::create_invoice),
        )
        .route("/api/invoices/{id}", put(handlers::invoices::update_invoice))
        .route(
            "/api/invoices/{id}/cancel",
            post(handlers::invoices::cancel_invoice),
        )
        .merge(reference_routes::<Site>())
        .merge(reference_routes::<Location>())
        .merge(reference_routes::<Stage>())
        .merge(reference_routes::<Supplier>())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::actor,
        ));

    let admin_routes = Router::new()
        .route("/api/admin/audit-logs", get(admin::list_audit_logs))
        .route("/api/admin/audit-logs/{id}", get(admin::get_audit_log_detail))
        .route(
            "/api/admin/audit-logs/{id}/diff",
            get(admin::get_audit_log_diff),
        )
        .route(
            "/api/admin/merge/locations",
            post(admin::merge_entities::<MergeLocationsRequest>),
        )
        .route(
            "/api/admin/merge/stages",
            post(admin::merge_entities::<MergeStagesRequest>),
        )
        .route(
            "/api/admin/merge/sites",
            post(admin::merge_entities::<MergeSitesRequest>),
        )
        .route(
            "/api/admin/merge/suppliers",
            post(admin::merge_entities::<MergeSuppliersRequest>),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::actor_admin,
        ));

    let cors = cors_layer(&state.config.cors_allow_origins);

    Router::new()
        .route("/api/health", get(handlers::health::health))
        .merge(staff_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http().make_span_with(middleware::request_span))
                .layer(axum_middleware::from_fn(middleware::log_error_responses))
                .layer(cors),
        )
        .with_state(state)
}

fn reference_routes<T: ReferenceEntity>() -> Router<AppState> {
    let collection = format!("/api/{}", T::KIND.table());
    let item = format!("{}/{{id}}", collection);
    Router::new()
        .route(
            &collection,
            get(list_references::<T>).post(create_reference::<T>),
        )
        .route(
            &item,
            get(get_reference::<T>)
                .put(update_reference::<T>)
                .delete(delete_reference::<T>),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(middleware::request_id::REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(24 * 60 * 60));

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}
