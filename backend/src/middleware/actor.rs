//! Resolves the acting user for every `/api` request.
//!
//! Authentication happens upstream: the proxy in front of this service sets
//! `x-actor-id` after verifying the session. Here the id is looked up in
//! `users` and turned into an [`Actor`] request extension.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::actor::{Actor, RequestMeta},
    repositories::user as user_repo,
    state::AppState,
    types::UserId,
};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const REAL_IP_HEADER: &str = "x-real-ip";

pub async fn actor(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let actor = resolve_actor(&state, request.headers()).await?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Same as [`actor`] but rejects anyone without the admin role.
pub async fn actor_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let actor = resolve_actor(&state, request.headers()).await?;
    if !actor.is_admin() {
        tracing::warn!(actor_id = %actor.id, "admin route refused");
        return Err(AppError::Forbidden("Administrator role required".into()));
    }
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

async fn resolve_actor(state: &AppState, headers: &HeaderMap) -> Result<Actor, AppError> {
    let actor_id = parse_actor_id(headers)
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid actor identity".into()))?;
    let user = user_repo::find_user_by_id(&state.pool, actor_id)
        .await
        .map_err(|e| AppError::Storage(e.into()))?
        .ok_or_else(|| AppError::Unauthorized("Unknown actor".into()))?;
    Ok(Actor::from_user(&user, request_meta(headers)))
}

fn parse_actor_id(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(ACTOR_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<UserId>().ok())
        .filter(|id| id.get() > 0)
}

pub fn request_meta(headers: &HeaderMap) -> RequestMeta {
    RequestMeta {
        ip_address: client_ip(headers),
        user_agent: header_string(headers, header::USER_AGENT.as_str()),
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_string(headers, FORWARDED_FOR_HEADER)
        .and_then(|value| {
            value
                .split(',')
                .map(str::trim)
                .find(|hop| !hop.is_empty())
                .map(str::to_string)
        })
        .or_else(|| header_string(headers, REAL_IP_HEADER))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
