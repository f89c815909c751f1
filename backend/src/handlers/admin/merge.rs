use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    handlers::json_body,
    models::{
        actor::Actor,
        reference::{Location, Site, Stage, Supplier},
    },
    repositories::reference::ReferenceEntity,
    services::merge::{self, MergeOutcome},
    state::AppState,
};

/// Body of a merge request: which row survives and which is folded into it.
pub trait MergeRequest: DeserializeOwned + Send + 'static {
    type Entity: ReferenceEntity;

    /// `(keep, merge)`.
    fn ids(&self) -> (i64, i64);
}

macro_rules! merge_request {
    ($name:ident, $entity:ty, $keep:ident, $merge:ident) => {
        #[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
        pub struct $name {
            pub $keep: i64,
            pub $merge: i64,
        }

        impl MergeRequest for $name {
            type Entity = $entity;

            fn ids(&self) -> (i64, i64) {
                (self.$keep, self.$merge)
            }
        }
    };
}

merge_request!(MergeLocationsRequest, Location, keep_location_id, merge_location_id);
merge_request!(MergeStagesRequest, Stage, keep_stage_id, merge_stage_id);
merge_request!(MergeSitesRequest, Site, keep_site_id, merge_site_id);
merge_request!(MergeSuppliersRequest, Supplier, keep_supplier_id, merge_supplier_id);

pub async fn merge_entities<R: MergeRequest>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<R>, JsonRejection>,
) -> Result<Json<MergeOutcome>, AppError> {
    let request = json_body(payload)?;
    let (keep_id, merge_id) = request.ids();
    if keep_id <= 0 || merge_id <= 0 {
        return Err(AppError::Validation("Merge ids must be positive".into()));
    }
    let outcome = merge::merge::<R::Entity>(&state.pool, keep_id, merge_id, &actor).await?;
    Ok(Json(outcome))
}
