use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::core::ReplyKind;
use crate::models::{
    AssistantFeedback, AssistantFeedbackRequest, AssistantMessageRequest,
    AssistantMessageResponse, ChatMessage, ChatRequest, ChatResponse, ChatRole, FeedbackResponse,
    HealthResponse, SearchRequest, SearchResponse,
};
use crate::routes::{ApiError, AppState};

/// Configure search, assistant and chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/search", web::post().to(search))
        .route("/assistant/message", web::post().to(assistant_message))
        .route("/assistant/feedback", web::post().to(assistant_feedback))
        .route("/chat", web::post().to(chat));
}

/// Health check endpoint
///
/// Reports `degraded` when the knowledge base cannot be loaded.
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let status = match state.snapshot().await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::warn!("Health check could not load knowledge base: {}", e);
            "degraded"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Search the knowledge base
///
/// POST /api/v1/search
///
/// Request body:
/// ```json
/// {
///   "query": "drucker druckt nicht",
///   "limit": 5
/// }
/// ```
async fn search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(|errors| {
        tracing::info!("Validation failed for search request: {:?}", errors);
        ApiError::validation(errors)
    })?;

    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("Query must not be blank"));
    }

    let limit = usize::from(match req.limit {
        0 => state.options.default_limit,
        limit => limit.min(state.options.max_limit),
    });

    let snapshot = state
        .snapshot()
        .await
        .map_err(|e| ApiError::backend("Failed to load knowledge base", e))?;

    let result = state
        .matcher
        .find_matches(query, &snapshot.categories, &snapshot.entries, limit);

    tracing::info!(
        "Search \"{}\" matched {} categories and {} entries (from {} candidates)",
        query,
        result.categories.len(),
        result.entries.len(),
        result.total_candidates
    );

    Ok(HttpResponse::Ok().json(SearchResponse {
        categories: result.categories,
        entries: result.entries,
        total_candidates: result.total_candidates,
    }))
}

/// One assistant turn
///
/// POST /api/v1/assistant/message
///
/// The client echoes the returned `state` with its next message.
async fn assistant_message(
    state: web::Data<AppState>,
    req: web::Json<AssistantMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message must not be blank"));
    }

    let snapshot = state
        .snapshot()
        .await
        .map_err(|e| ApiError::backend("Failed to load knowledge base", e))?;

    let reply = state
        .assistant
        .respond(&req.state, message, &snapshot.categories, &snapshot.entries);

    let mut text = reply.text;
    if reply.kind == ReplyKind::Fallback && state.options.llm_fallback && state.chat.is_enabled() {
        let mut conversation = req.history.clone();
        conversation.push(ChatMessage::new(ChatRole::User, message));

        match state.chat.complete(&conversation).await {
            Ok(content) => text = content,
            Err(e) => tracing::warn!("Chat fallback failed, using canned answer: {}", e),
        }
    }

    tracing::debug!("Assistant turn {} answered with {:?}", reply.state.turns, reply.kind);

    Ok(HttpResponse::Ok().json(AssistantMessageResponse {
        kind: reply.kind,
        reply: text,
        state: reply.state,
    }))
}

/// Thumbs up/down on an assistant reply
async fn assistant_feedback(
    state: web::Data<AppState>,
    req: web::Json<AssistantFeedbackRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let req = req.into_inner();
    let feedback = AssistantFeedback {
        query: req.query,
        response: req.response,
        is_positive: req.is_positive,
    };

    state
        .backend
        .record_assistant_feedback(&feedback)
        .await
        .map_err(|e| ApiError::backend("Failed to store feedback", e))?;

    Ok(HttpResponse::Ok().json(FeedbackResponse { success: true }))
}

/// Free-form chat with the completion service
async fn chat(
    state: web::Data<AppState>,
    req: web::Json<ChatRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let content = state.chat.complete(&req.messages).await.map_err(ApiError::chat)?;

    Ok(HttpResponse::Ok().json(ChatResponse { content }))
}
