use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;
use crate::models::SignInRequest;
use crate::routes::{bearer_token, ApiError, AppState};
use crate::services::AuthError;

/// Configure staff session routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/auth/sign-in", web::post().to(sign_in))
        .route("/auth/sign-out", web::post().to(sign_out))
        .route("/auth/session", web::get().to(session));
}

async fn sign_in(
    state: web::Data<AppState>,
    req: web::Json<SignInRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let session = state
        .auth
        .sign_in(req.email.trim(), &req.password)
        .await
        .map_err(ApiError::auth)?;

    Ok(HttpResponse::Ok().json(session))
}

async fn sign_out(
    state: web::Data<AppState>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&http_req).ok_or_else(|| ApiError::auth(AuthError::MissingToken))?;

    state.auth.sign_out(token).await.map_err(ApiError::auth)?;

    Ok(HttpResponse::NoContent().finish())
}

/// The user behind the bearer token, as the backend sees it
async fn session(
    state: web::Data<AppState>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&http_req).ok_or_else(|| ApiError::auth(AuthError::MissingToken))?;

    let user = state.auth.get_user(token).await.map_err(ApiError::auth)?;

    Ok(HttpResponse::Ok().json(user))
}
