use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;
use crate::core::TicketAction;
use crate::models::{
    CommentRequest, CreateTicketRequest, NewComment, NewTicket, TicketActionResponse,
    UploadQuery, UploadResponse,
};
use crate::routes::knowledge::{check_upload, content_type, object_name};
use crate::routes::{ApiError, AppState, AuthenticatedUser};

/// Configure support ticket routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/tickets", web::post().to(create_ticket))
        .route("/tickets", web::get().to(list_tickets))
        .route("/tickets/images", web::post().to(upload_ticket_image))
        .route("/tickets/counts", web::get().to(ticket_counts))
        .route("/tickets/{id}", web::delete().to(delete_ticket))
        .route("/tickets/{id}/comments", web::get().to(list_comments))
        .route("/tickets/{id}/comments", web::post().to(add_comment))
        .route("/tickets/{id}/read", web::post().to(mark_read))
        .route("/tickets/{id}/take-over", web::post().to(take_over))
        .route("/tickets/{id}/complete", web::post().to(complete));
}

/// File a support ticket
///
/// POST /api/v1/tickets
///
/// Request body:
/// ```json
/// {
///   "name": "Anna Muster",
///   "email": "anna@example.com",
///   "phone": "+49 30 123456",
///   "description": "VPN bricht ständig ab",
///   "imageUrls": ["https://..."]
/// }
/// ```
async fn create_ticket(
    state: web::Data<AppState>,
    req: web::Json<CreateTicketRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(|errors| {
        tracing::info!("Validation failed for ticket request: {:?}", errors);
        ApiError::validation(errors)
    })?;

    let req = req.into_inner();
    let image_url = match req.image_urls.is_empty() {
        true => None,
        false => Some(req.image_urls.join(",")),
    };

    let ticket = NewTicket {
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req.phone.trim().to_string(),
        error_description: req.description,
        image_url,
    };

    let stored = state
        .backend
        .create_ticket(&ticket)
        .await
        .map_err(|e| ApiError::backend("Failed to create ticket", e))?;

    tracing::info!("Created ticket {}", stored.id);

    Ok(HttpResponse::Created().json(stored))
}

/// Upload a screenshot to attach to a ticket that is about to be filed
///
/// POST /api/v1/tickets/images?filename=screenshot.png
async fn upload_ticket_image(
    state: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    http_req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    check_upload(&body, state.options.max_upload_bytes)?;

    let name = object_name("ticket", &query.filename);
    let public_url = state
        .backend
        .upload(
            &state.options.ticket_images_bucket,
            &name,
            body.to_vec(),
            content_type(&http_req),
        )
        .await
        .map_err(|e| ApiError::backend("Failed to upload image", e))?;

    Ok(HttpResponse::Created().json(UploadResponse { public_url }))
}

async fn list_tickets(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let tickets = state
        .backend
        .list_tickets()
        .await
        .map_err(|e| ApiError::backend("Failed to load tickets", e))?;

    Ok(HttpResponse::Ok().json(tickets))
}

/// Unread and new ticket counts
///
/// GET /api/v1/tickets/counts
async fn ticket_counts(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let counts = state
        .backend
        .ticket_counts()
        .await
        .map_err(|e| ApiError::backend("Failed to count tickets", e))?;

    Ok(HttpResponse::Ok().json(counts))
}

async fn delete_ticket(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    state
        .backend
        .delete_ticket(id)
        .await
        .map_err(|e| ApiError::backend("Failed to delete ticket", e))?;

    tracing::info!("{} deleted ticket {}", user.0.email, id);

    Ok(HttpResponse::NoContent().finish())
}

async fn list_comments(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let comments = state
        .backend
        .list_comments(path.into_inner())
        .await
        .map_err(|e| ApiError::backend("Failed to load comments", e))?;

    Ok(HttpResponse::Ok().json(comments))
}

async fn add_comment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let ticket_id = path.into_inner();
    state
        .backend
        .get_ticket(ticket_id)
        .await
        .map_err(|e| ApiError::backend("Failed to load ticket", e))?;

    let comment = NewComment {
        ticket_id,
        text: req.into_inner().text,
        author: user.0.email,
    };

    let stored = state
        .backend
        .add_comment(&comment)
        .await
        .map_err(|e| ApiError::backend("Failed to add comment", e))?;

    Ok(HttpResponse::Created().json(stored))
}

async fn mark_read(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let response = apply_action(&state, path.into_inner(), TicketAction::MarkRead, &user).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Assign the ticket to the calling staff member
///
/// Leaves an audit comment and notifies the assignee by email. A failed
/// email does not fail the request; it is reported in the response.
async fn take_over(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let response = apply_action(&state, path.into_inner(), TicketAction::TakeOver, &user).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn complete(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let response = apply_action(&state, path.into_inner(), TicketAction::Complete, &user).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn apply_action(
    state: &AppState,
    ticket_id: i64,
    action: TicketAction,
    user: &AuthenticatedUser,
) -> Result<TicketActionResponse, ApiError> {
    let actor = user.0.email.as_str();

    let ticket = state
        .backend
        .get_ticket(ticket_id)
        .await
        .map_err(|e| ApiError::backend("Failed to load ticket", e))?;

    let update = action.plan(&ticket, actor).map_err(|e| {
        tracing::info!("Rejected {:?} on ticket {}: {}", action, ticket_id, e);
        ApiError::workflow(e)
    })?;

    let ticket = state
        .backend
        .update_ticket(ticket_id, &update)
        .await
        .map_err(|e| ApiError::backend("Failed to update ticket", e))?;

    let comment = match action.audit_comment(actor) {
        Some(text) => {
            let comment = NewComment {
                ticket_id,
                text,
                author: actor.to_string(),
            };
            let stored = state
                .backend
                .add_comment(&comment)
                .await
                .map_err(|e| ApiError::backend("Failed to add comment", e))?;
            Some(stored)
        }
        None => None,
    };

    let (email_sent, email_error) = match action {
        TicketAction::TakeOver => {
            let outcome = state.email.send_ticket_assignment(actor, ticket_id).await;
            (outcome.success, outcome.error)
        }
        _ => (false, None),
    };

    tracing::info!("{} applied {:?} to ticket {}", actor, action, ticket_id);

    Ok(TicketActionResponse {
        ticket,
        comment,
        email_sent,
        email_error,
    })
}
