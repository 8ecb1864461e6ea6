// Route exports
pub mod assistant;
pub mod auth;
pub mod evaluations;
pub mod knowledge;
pub mod tickets;

use actix_web::{
    dev::Payload, error, http::header::AUTHORIZATION, http::StatusCode, web, FromRequest,
    HttpRequest, HttpResponse,
};
use std::future::{ready, Ready};
use std::sync::Arc;
use crate::core::{Assistant, Matcher, WorkflowError};
use crate::models::AuthUser;
use crate::services::{
    AuthClient, AuthError, BackendClient, BackendError, ChatClient, ChatError, EmailClient,
    KnowledgeCache, KnowledgeSnapshot, TokenVerifier,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub auth: Arc<AuthClient>,
    pub verifier: Arc<TokenVerifier>,
    pub email: Arc<EmailClient>,
    pub chat: Arc<ChatClient>,
    pub cache: Arc<KnowledgeCache>,
    pub matcher: Matcher,
    pub assistant: Assistant,
    pub options: RouteOptions,
}

/// Per-deployment knobs the handlers need
#[derive(Debug, Clone)]
pub struct RouteOptions {
    pub default_limit: u16,
    pub max_limit: u16,
    pub llm_fallback: bool,
    pub entry_photos_bucket: String,
    pub ticket_images_bucket: String,
    pub max_upload_bytes: usize,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 50,
            llm_fallback: false,
            entry_photos_bucket: "error-photos".to_string(),
            ticket_images_bucket: "ticket-images".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl AppState {
    /// Current knowledge snapshot, loaded from the backend on a cache miss
    pub async fn snapshot(&self) -> Result<Arc<KnowledgeSnapshot>, BackendError> {
        let backend = self.backend.clone();
        self.cache
            .get_or_load(|| async move {
                let (categories, entries) =
                    tokio::try_join!(backend.list_categories(), backend.list_entries())?;
                Ok::<_, BackendError>(KnowledgeSnapshot::new(categories, entries))
            })
            .await
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(assistant::configure)
            .configure(knowledge::configure)
            .configure(tickets::configure)
            .configure(evaluations::configure)
            .configure(auth::configure),
    );
}

/// JSON error returned by every handler and payload extractor
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status_code: status.as_u16(),
        }
    }

    pub fn bad_request(message: impl ToString) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad request", message)
    }

    pub fn validation(errors: validator::ValidationErrors) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation failed", errors)
    }

    pub fn unauthorized(message: impl ToString) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", message)
    }

    pub fn internal(message: impl ToString) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error", message)
    }

    /// Map a backend failure, logging it under `context`
    pub fn backend(context: &str, err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => {
                tracing::info!("{}: not found ({})", context, what);
                Self::new(StatusCode::NOT_FOUND, "Not found", what)
            }
            BackendError::Conflict(what) => {
                tracing::info!("{}: conflict ({})", context, what);
                Self::new(StatusCode::CONFLICT, "Conflict", what)
            }
            BackendError::Unauthorized => {
                tracing::error!("{}: backend rejected credentials", context);
                Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", err)
            }
            BackendError::StorageError(_) => {
                tracing::error!("{}: {}", context, err);
                Self::new(StatusCode::BAD_GATEWAY, context, err)
            }
            other => {
                tracing::error!("{}: {}", context, other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, context, other)
            }
        }
    }

    pub fn auth(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::MissingEmail
            | AuthError::InvalidToken(_) => {
                Self::unauthorized(err)
            }
            other => {
                tracing::error!("Auth service failure: {}", other);
                Self::new(StatusCode::BAD_GATEWAY, "Auth service failure", other)
            }
        }
    }

    pub fn chat(err: ChatError) -> Self {
        match err {
            ChatError::NotConfigured => Self::new(StatusCode::SERVICE_UNAVAILABLE, "Chat unavailable", err),
            ChatError::EmptyConversation => Self::bad_request(err),
            other => {
                tracing::error!("Chat completion failed: {}", other);
                Self::new(StatusCode::BAD_GATEWAY, "Chat completion failed", other)
            }
        }
    }

    pub fn workflow(err: WorkflowError) -> Self {
        Self::new(StatusCode::CONFLICT, "Invalid ticket transition", err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for ApiError {}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::new(StatusCode::BAD_REQUEST, "invalid_json", format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::new(StatusCode::BAD_REQUEST, "invalid_query", format!("Invalid query: {}", err)).into()
}

/// Handle path parameter errors, e.g. a non-numeric id
pub fn handle_path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::new(StatusCode::BAD_REQUEST, "invalid_path", format!("Invalid path: {}", err)).into()
}

/// Staff member identified by the bearer token of the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthUser);

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(ApiError::internal("Application state missing").into()));
        };

        let header = req.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok());

        ready(match state.verifier.verify_header(header) {
            Ok(user) => Ok(AuthenticatedUser(user)),
            Err(e) => {
                tracing::info!("Rejected request to {}: {}", req.path(), e);
                Err(ApiError::auth(e).into())
            }
        })
    }
}

/// Raw bearer token of the request, if any
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
