use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{
    api::state::AppState,
    domain::{Caller, Role},
    error::AppError,
};

/// The verified requester, inserted into request extensions for handlers.
#[derive(Clone)]
pub struct CurrentUser {
    pub caller: Caller,
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;
    let caller = state.token_verifier.verify(token)?;

    request.extensions_mut().insert(CurrentUser { caller });

    Ok(next.run(request).await)
}

pub async fn require_platform_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;
    let caller = state.token_verifier.verify(token)?;

    if caller.role != Role::PlatformAdmin {
        return Err(AppError::Forbidden("Insufficient permissions".to_string()));
    }

    request.extensions_mut().insert(CurrentUser { caller });

    Ok(next.run(request).await)
}
